//! Soft delete behaviour for models
//!
//! A model opts in by embedding [`SoftDeleteFields`], implementing
//! [`SoftDeletes`] and calling [`boot`] from its `Model::boot`:
//!
//! ```ignore
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
//!     // ...
//!     fn boot(definition: &mut ModelDefinition<Self>) {
//!         soft_deletes::boot(definition);
//!     }
//! }
//!
//! impl SoftDeletes for User {
//!     fn soft_delete_fields(&self) -> &SoftDeleteFields { &self.soft_delete }
//!     fn soft_delete_fields_mut(&mut self) -> &mut SoftDeleteFields { &mut self.soft_delete }
//! }
//! ```
//!
//! Once booted, `ModelStore::delete` sets `deleted_at` instead of removing the
//! row, and find/fetch/paginate queries hide rows whose `deleted_at` is set.

use crate::errors::SoftDeleteError;
use crate::visibility::{
    deleted_at_column, ignore_deleted, ignore_deleted_paginate, set_visibility, TrashedVisibility,
};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use store_object::{ColumnDefinition, DeleteAction, Model, ModelDefinition, ModelQueryBuilder, ModelStore};

/// Attribute holding the deletion timestamp
pub const DELETED_AT_ATTRIBUTE: &str = "deleted_at";

/// Marker recorded on a model definition booted with soft deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftDeleteCapability;

/// Soft delete state embedded in a model with `#[serde(flatten)]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDeleteFields {
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    force_delete: bool,
}

impl SoftDeleteFields {
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn set_deleted_at(&mut self, deleted_at: Option<DateTime<Utc>>) {
        self.deleted_at = deleted_at;
    }

    /// Whether the next delete removes the row
    pub fn is_force_deleting(&self) -> bool {
        self.force_delete
    }
}

pub trait SoftDeletes: Model {
    fn soft_delete_fields(&self) -> &SoftDeleteFields;

    fn soft_delete_fields_mut(&mut self) -> &mut SoftDeleteFields;

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.soft_delete_fields().deleted_at()
    }

    /// True iff the instance carries a deletion timestamp
    fn trashed(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Timestamps are stored with microsecond precision
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn resolve_delete<M: SoftDeletes>(model: &mut M) -> DeleteAction {
    if model.soft_delete_fields().force_delete {
        return DeleteAction::Remove;
    }
    model.soft_delete_fields_mut().deleted_at = Some(now());
    DeleteAction::Save
}

/// Install soft deletes on a model definition
///
/// Adds the `deleted_at` column unless the model declared it (possibly under
/// another column name), records [`SoftDeleteCapability`], registers the
/// visibility hooks and takes over instance deletes. Booting twice is a no-op.
pub fn boot<M: SoftDeletes>(definition: &mut ModelDefinition<M>) {
    if definition.has_capability::<SoftDeleteCapability>() {
        return;
    }

    if !definition.has_column(DELETED_AT_ATTRIBUTE) {
        definition.add_column(ColumnDefinition::new(DELETED_AT_ATTRIBUTE));
    }
    definition.insert_capability(SoftDeleteCapability);

    definition
        .hooks_mut()
        .before_find(ignore_deleted::<M>)
        .before_fetch(ignore_deleted::<M>)
        .before_paginate(ignore_deleted_paginate::<M>);

    definition.set_delete_resolver(resolve_delete::<M>);

    tracing::debug!(
        model = M::model_name(),
        column = %deleted_at_column(definition),
        "soft deletes enabled"
    );
}

/// Soft delete operations on a model's store
#[async_trait]
pub trait SoftDeleteStoreExt<M: SoftDeletes> {
    /// Query that returns trashed rows alongside live ones
    fn with_trashed(&self) -> ModelQueryBuilder<M>;

    /// Query that returns trashed rows only
    fn only_trashed(&self) -> ModelQueryBuilder<M>;

    /// Clear `deleted_at` and save; no-op for an instance that is not trashed
    async fn restore(&self, model: &mut M) -> Result<(), SoftDeleteError>;

    /// Delete the row for good
    async fn force_delete(&self, model: &mut M) -> Result<(), SoftDeleteError>;
}

#[async_trait]
impl<M: SoftDeletes> SoftDeleteStoreExt<M> for ModelStore<M> {
    fn with_trashed(&self) -> ModelQueryBuilder<M> {
        let mut query = self.query();
        set_visibility(&mut query, TrashedVisibility::Include);
        query
    }

    fn only_trashed(&self) -> ModelQueryBuilder<M> {
        let mut query = self.with_trashed();
        let column = deleted_at_column(self.definition());
        query.table_scope().where_not_null(&column);
        query
    }

    async fn restore(&self, model: &mut M) -> Result<(), SoftDeleteError> {
        if model.state().is_deleted() {
            return Err(SoftDeleteError::force_deleted(M::model_name()));
        }
        if !model.trashed() {
            return Ok(());
        }

        model.soft_delete_fields_mut().deleted_at = None;
        self.save(model).await?;
        Ok(())
    }

    async fn force_delete(&self, model: &mut M) -> Result<(), SoftDeleteError> {
        model.soft_delete_fields_mut().force_delete = true;
        if let Err(err) = self.delete(model).await {
            // a later plain delete must still soft delete
            model.soft_delete_fields_mut().force_delete = false;
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{store, Note};
    use store_object::{HookPhase, LifecycleEvent};

    #[test]
    fn test_boot_adds_column_capability_and_hooks() {
        let (store, _) = store::<Note>();
        let definition = store.definition();

        assert!(definition.has_column(DELETED_AT_ATTRIBUTE));
        assert!(definition.has_capability::<SoftDeleteCapability>());

        let hooks = definition.hooks();
        assert_eq!(hooks.len(), 3);
        assert_eq!(hooks.count(HookPhase::Before, LifecycleEvent::Find), 1);
        assert_eq!(hooks.count(HookPhase::Before, LifecycleEvent::Fetch), 1);
        assert_eq!(hooks.count(HookPhase::Before, LifecycleEvent::Paginate), 1);
    }

    #[test]
    fn test_boot_twice_registers_once() {
        let mut definition = ModelDefinition::<Note>::boot().unwrap();
        boot(&mut definition);
        assert_eq!(definition.hooks().len(), 3);
        assert_eq!(definition.columns().len(), 4);
    }

    #[test]
    fn test_resolver_soft_deletes_unless_forced() {
        let mut note = Note::new(1, "resolver");
        assert_eq!(resolve_delete(&mut note), DeleteAction::Save);
        assert!(note.trashed());

        let stamp = note.deleted_at().unwrap();
        assert_eq!(stamp.timestamp_subsec_nanos() % 1_000, 0);

        note.soft_delete_fields_mut().force_delete = true;
        assert_eq!(resolve_delete(&mut note), DeleteAction::Remove);
    }

    #[test]
    fn test_fields_serialize_flat_without_force_flag() {
        let mut note = Note::new(7, "flat");
        note.soft_delete_fields_mut().force_delete = true;
        let value = serde_json::to_value(&note).unwrap();

        assert!(value.get("deleted_at").unwrap().is_null());
        assert!(value.get("force_delete").is_none());

        let decoded: Note = serde_json::from_value(value).unwrap();
        assert!(!decoded.soft_delete_fields().is_force_deleting());
    }

    #[tokio::test]
    async fn test_force_delete_then_restore_fails() {
        let (store, executor) = store::<Note>();
        let mut note = Note::new(1, "doomed");
        store.save(&mut note).await.unwrap();

        store.force_delete(&mut note).await.unwrap();
        assert!(note.state().is_deleted());
        assert!(executor.rows("notes").is_empty());

        let err = store.restore(&mut note).await.unwrap_err();
        assert_eq!(err.code(), Some("E_MODEL_FORCE_DELETED"));
    }

    #[tokio::test]
    async fn test_failed_force_delete_keeps_soft_delete() {
        let (store, executor) = store::<Note>();
        let mut note = Note::new(1, "draft");

        // never saved, so the delete is rejected
        assert!(store.force_delete(&mut note).await.is_err());
        assert!(!note.soft_delete_fields().is_force_deleting());

        store.save(&mut note).await.unwrap();
        store.delete(&mut note).await.unwrap();
        assert!(note.trashed());
        assert!(!note.state().is_deleted());
        assert_eq!(executor.rows("notes").len(), 1);
    }

    #[tokio::test]
    async fn test_restore_untrashed_is_noop() {
        let (store, executor) = store::<Note>();
        let mut note = Note::new(1, "alive");
        store.save(&mut note).await.unwrap();
        executor.drain_transaction_log();

        store.restore(&mut note).await.unwrap();
        assert!(executor.transaction_log().is_empty());
    }
}
