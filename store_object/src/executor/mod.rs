//! Database executors
//!
//! The executor is the only part of the store layer that talks to a database.

#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod postgres;
pub mod statement;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockExecutor, MockStatement};
pub use postgres::PgExecutor;
pub use statement::{DeleteStatement, InsertStatement, Row, SelectStatement, UpdateStatement};

use crate::errors::StoreError;
use async_trait::async_trait;

#[async_trait]
pub trait DatabaseExecutor: Send + Sync + std::fmt::Debug {
    /// Rows matched by a select, keyed by column name
    async fn fetch_all(&self, statement: &SelectStatement) -> Result<Vec<Row>, StoreError>;

    /// Number of rows matched by a select
    async fn fetch_count(&self, statement: &SelectStatement) -> Result<i64, StoreError>;

    /// Insert one row and return it as stored
    async fn insert(&self, statement: &InsertStatement) -> Result<Row, StoreError>;

    /// Returns the number of affected rows
    async fn update(&self, statement: &UpdateStatement) -> Result<u64, StoreError>;

    /// Returns the number of affected rows
    async fn delete(&self, statement: &DeleteStatement) -> Result<u64, StoreError>;
}
