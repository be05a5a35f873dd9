//! Convenient re-exports of commonly used types from docdriver.
//!
//! ```ignore
//! use docdriver::prelude::*;
//! ```
//!
//! This provides access to:
//! - The driver contract and its typed helpers
//! - The adapter and backend traits
//! - Records, values and queries
//! - Error types

pub use docdriver_core::{
    adapter::DocumentStoreAdapter,
    backend::{StoreBackend, StoreBackendBuilder},
    driver::{Driver, DriverExt},
    error::{DriverError, DriverResult},
    fields,
    query::{FieldFilter, Query, QueryVisitor},
    record::{CREATED_AT_FIELD, Fields, ID_FIELD, Record, UPDATED_AT_FIELD},
    value::Value,
};
