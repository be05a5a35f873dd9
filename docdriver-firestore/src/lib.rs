//! Firestore document storage backend for docdriver.
//!
//! This crate implements the `StoreBackend` trait over the Firestore REST API v1.
//!
//! # Features
//!
//! - **Service account auth** - Credentials via `gcp_auth`, with cached tokens
//! - **Emulator support** - `FIRESTORE_EMULATOR_HOST` skips credentials entirely
//! - **Structured queries** - Equality queries run server side through `:runQuery`
//! - **Nested collections** - Collection paths such as `users/u1/items`
//!
//! # Quick Start
//!
//! ```ignore
//! use docdriver::{prelude::*, firestore::FirestoreStoreBuilder};
//!
//! // Reads GCP_PROJECT_ID and GOOGLE_APPLICATION_CREDENTIALS when connecting
//! let driver = DocumentStoreAdapter::new(FirestoreStoreBuilder::from_env(), "users");
//! driver.connect().await?;
//!
//! let alice = driver.set(fields! { "name" => "Alice" }).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docdriver_firestore;

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod store;
pub mod token;
pub mod types;

pub use client::FirestoreClient;
pub use config::FirestoreConfig;
pub use error::{FirestoreError, FirestoreResult};
pub use store::{FirestoreStore, FirestoreStoreBuilder};
