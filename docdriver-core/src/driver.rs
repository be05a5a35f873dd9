//! The uniform driver contract applications program against.
//!
//! [`Driver`] is object safe, so an application can hold a `Box<dyn Driver>` and choose
//! the backing store at runtime. [`DriverExt`] adds serde-typed helpers on top of any
//! driver.
//!
//! # Example
//!
//! ```ignore
//! use docdriver::prelude::*;
//!
//! async fn rename(driver: &dyn Driver, id: &str) -> DriverResult<bool> {
//!     let updated = driver
//!         .update(Query::by_id(id), fields! { "name" => "b" })
//!         .await?;
//!
//!     Ok(updated == 1)
//! }
//! ```

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::DriverResult,
    query::Query,
    record::{Fields, Record, to_fields},
};

/// Async CRUD contract over one schema-less collection.
///
/// Every data operation fails with
/// [`DriverError::NotConnected`](crate::error::DriverError::NotConnected) unless
/// [`Driver::connect`] has succeeded and [`Driver::disconnect`] has not been called since.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Establishes the backend session and binds the target collection.
    ///
    /// May be called again to re-bind a fresh session.
    async fn connect(&self) -> DriverResult<()>;

    /// Releases the session. The backend is not notified.
    async fn disconnect(&self) -> DriverResult<()>;

    /// Inserts a new record with a generated `_id` and fresh timestamps.
    ///
    /// Returns the record as persisted, reserved fields included.
    async fn set(&self, data: Fields) -> DriverResult<Record>;

    /// Returns all records matching every predicate of `query`, in backend order.
    async fn get(&self, query: Query) -> DriverResult<Vec<Record>>;

    /// Returns one matching record.
    ///
    /// A query naming `_id` is answered with a point lookup by identifier.
    async fn get_one(&self, query: Query) -> DriverResult<Option<Record>>;

    /// Merges `data` into every matching record and refreshes `_updatedAt`.
    ///
    /// A caller-supplied `_id` is ignored. Returns the number of records updated.
    async fn update(&self, query: Query, data: Fields) -> DriverResult<usize>;

    /// Removes every matching record. Returns the number of records removed.
    async fn delete(&self, query: Query) -> DriverResult<usize>;

    /// True if at least one record matches.
    async fn exists(&self, query: Query) -> DriverResult<bool> {
        Ok(self.get_one(query).await?.is_some())
    }

    /// The number of matching records.
    async fn count(&self, query: Query) -> DriverResult<usize> {
        Ok(self.get(query).await?.len())
    }

    /// Removes every record in the collection. Returns the number of records removed.
    async fn clear(&self) -> DriverResult<usize> {
        self.delete(Query::all()).await
    }
}

/// Serde-typed helpers available on every [`Driver`].
#[async_trait]
pub trait DriverExt: Driver {
    /// Serializes `value` and inserts it. Returns the persisted record.
    async fn set_as<T>(&self, value: &T) -> DriverResult<Record>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.set(to_fields(value)?).await
    }

    /// Like [`Driver::get`], deserializing each record into `T`.
    async fn get_as<T>(&self, query: Query) -> DriverResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.get(query)
            .await?
            .iter()
            .map(Record::deserialize_as)
            .collect()
    }

    /// Like [`Driver::get_one`], deserializing the record into `T`.
    async fn get_one_as<T>(&self, query: Query) -> DriverResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.get_one(query)
            .await?
            .map(|record| record.deserialize_as())
            .transpose()
    }
}

impl<D: Driver + ?Sized> DriverExt for D {}
