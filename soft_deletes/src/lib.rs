//! Soft deletes for SoftHaus models
//!
//! Deleting a soft-deletable model stamps its `deleted_at` column instead of
//! removing the row. Queries hide stamped rows unless they opt in with
//! `with_trashed` or `only_trashed`, and stamped rows can be restored. A force
//! delete removes the row for good.

pub mod errors;
pub mod mixin;
pub mod prelude;
pub mod query;
pub mod visibility;

#[cfg(test)]
mod testing;

pub use errors::SoftDeleteError;
pub use mixin::{
    boot, SoftDeleteCapability, SoftDeleteFields, SoftDeleteStoreExt, SoftDeletes,
    DELETED_AT_ATTRIBUTE,
};
pub use query::{ensure_soft_deletes, SoftDeleteQueryExt};
pub use visibility::{
    disable_ignore, ignore_deleted, ignore_deleted_paginate, set_visibility, visibility,
    TrashedVisibility,
};
