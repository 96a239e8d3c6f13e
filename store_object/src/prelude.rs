//! Convenience re-exports for common store-object usage

// Core traits
pub use crate::traits::{ColumnDefinition, Model, ModelState};

// Booted metadata and hooks
pub use crate::definition::{DeleteAction, ModelDefinition};
pub use crate::extensions::Extensions;
pub use crate::hooks::{HookPhase, HookRegistry, LifecycleEvent};

// Error types
pub use crate::errors::StoreError;

// Stores and executors
pub use crate::executor::{DatabaseExecutor, PgExecutor, Row};
pub use crate::model_store::ModelStore;

// Query building
pub use crate::query_builder::{GroupLimit, ModelQueryBuilder, Paginator, QueryFilter, SortOrder};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use sqlx::PgPool;
