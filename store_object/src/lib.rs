//! Store Object - model layer for SoftHaus
//!
//! This crate provides model metadata, lifecycle hooks, a model query builder
//! that renders PostgreSQL, and the executor seam the queries run through.

pub mod definition;
pub mod errors;
pub mod executor;
pub mod extensions;
pub mod hooks;
pub mod model_store;
pub mod prelude;
pub mod query_builder;
pub mod traits;
pub mod validation;

pub use definition::{DeleteAction, DeleteResolver, ModelDefinition};
pub use errors::StoreError;
#[cfg(any(test, feature = "mock"))]
pub use executor::{MockExecutor, MockStatement};
pub use executor::{DatabaseExecutor, PgExecutor, Row};
pub use extensions::Extensions;
pub use hooks::{HookPhase, HookRegistry, LifecycleEvent};
pub use model_store::ModelStore;
pub use query_builder::{
    GroupLimit, JoinClause, ModelQueryBuilder, Paginator, QueryFilter, QueryOperator, SortOrder, TableScope,
};
pub use traits::*;
pub use validation::{ValidatedIdentifier, ValidationError};

use sqlx::PgPool;

pub type DbPool = PgPool;
