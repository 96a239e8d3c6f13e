//! Error types for the SoftHaus crate
//!
//! This module contains all error types that can be returned by SoftHaus operations.

use soft_deletes::SoftDeleteError;
use store_object::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoftHausError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    SoftDelete(#[from] SoftDeleteError),

    #[error("Model not registered: {0}")]
    ModelNotRegistered(String),

    #[error("Model already registered: {0}")]
    ModelAlreadyRegistered(String),

    #[error("No database pool: SoftHaus was created over a custom executor")]
    NoDatabasePool,
}
