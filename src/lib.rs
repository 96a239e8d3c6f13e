//! # SoftHaus
//!
//! Soft deletes for PostgreSQL models: deleting a record stamps a
//! `deleted_at` column instead of removing the row, and ordinary queries skip
//! stamped rows unless asked to include or isolate them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use softhaus::prelude::*;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: Option<i64>,
//!     pub username: String,
//!     #[serde(flatten)]
//!     pub soft_delete: SoftDeleteFields,
//!     #[serde(skip)]
//!     pub state: ModelState,
//! }
//!
//! impl Model for User {
//!     fn model_name() -> &'static str { "User" }
//!     fn table_name() -> &'static str { "users" }
//!     fn columns() -> Vec<ColumnDefinition> {
//!         vec![ColumnDefinition::primary("id"), ColumnDefinition::new("username")]
//!     }
//!     fn boot(definition: &mut ModelDefinition<Self>) {
//!         softhaus::soft_deletes::boot(definition);
//!     }
//!     fn state(&self) -> &ModelState { &self.state }
//!     fn state_mut(&mut self) -> &mut ModelState { &mut self.state }
//! }
//!
//! impl SoftDeletes for User {
//!     fn soft_delete_fields(&self) -> &SoftDeleteFields { &self.soft_delete }
//!     fn soft_delete_fields_mut(&mut self) -> &mut SoftDeleteFields { &mut self.soft_delete }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::new("localhost", "softhaus", "postgres")
//!         .with_password("password")
//!         .with_pool_size(1, 5);
//!
//!     let mut softhaus = SoftHaus::new(config).await?;
//!     let users = softhaus.register::<User>()?;
//!
//!     let mut user = User {
//!         id: None,
//!         username: "virk".to_string(),
//!         soft_delete: SoftDeleteFields::default(),
//!         state: ModelState::default(),
//!     };
//!     users.save(&mut user).await?;
//!     users.delete(&mut user).await?;
//!
//!     assert!(user.trashed());
//!     assert!(users.all().await?.is_empty());
//!     assert_eq!(users.with_trashed().exec().await?.len(), 1);
//!
//!     users.restore(&mut user).await?;
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::SoftHaus;
pub use crate::errors::SoftHausError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig};

// Re-export member crates used in the public API
pub use soft_deletes;
pub use store_object;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
