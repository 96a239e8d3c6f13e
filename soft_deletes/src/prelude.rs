//! Convenience re-exports for soft-deletable models

pub use crate::errors::SoftDeleteError;
pub use crate::mixin::{SoftDeleteFields, SoftDeleteStoreExt, SoftDeletes};
pub use crate::query::SoftDeleteQueryExt;
pub use crate::visibility::{disable_ignore, TrashedVisibility};
