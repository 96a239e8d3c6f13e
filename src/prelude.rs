//! Convenience re-exports for common SoftHaus usage
//!
//! # Example
//!
//! ```rust
//! use softhaus::prelude::*;
//!
//! // Models, stores, queries and the soft delete extensions are now in scope
//! ```

// Core SoftHaus components
pub use crate::core::SoftHaus;
pub use crate::errors::SoftHausError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig};

// Re-export commonly used store-object types for convenience
pub use store_object::prelude::*;

// Soft delete mixin and query extension
pub use soft_deletes::prelude::*;

// Common external dependencies
pub use async_trait;
pub use chrono::{DateTime, Utc};
pub use sqlx;
pub use tokio;
