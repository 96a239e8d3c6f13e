//! Soft delete operations on a query in progress

use crate::errors::SoftDeleteError;
use crate::mixin::{SoftDeleteCapability, DELETED_AT_ATTRIBUTE};
use crate::visibility::{deleted_at_column, disable_ignore};
use async_trait::async_trait;
use serde_json::Value;
use store_object::{Model, ModelDefinition, ModelQueryBuilder, Row};

/// Fail unless the model was booted with soft deletes
pub fn ensure_soft_deletes<M: Model>(definition: &ModelDefinition<M>) -> Result<(), SoftDeleteError> {
    if definition.has_capability::<SoftDeleteCapability>() {
        Ok(())
    } else {
        Err(SoftDeleteError::unsupported_model(M::model_name()))
    }
}

#[async_trait]
pub trait SoftDeleteQueryExt: Sized {
    /// Keep existing predicates and stop hiding trashed rows
    fn with_trashed(self) -> Result<Self, SoftDeleteError>;

    /// Keep existing predicates and return trashed rows only
    fn only_trashed(self) -> Result<Self, SoftDeleteError>;

    /// Clear `deleted_at` on every matched row, trashed or not
    ///
    /// Returns the number of rows updated.
    async fn restore(self) -> Result<u64, SoftDeleteError>;
}

#[async_trait]
impl<M: Model> SoftDeleteQueryExt for ModelQueryBuilder<M> {
    fn with_trashed(mut self) -> Result<Self, SoftDeleteError> {
        ensure_soft_deletes(self.definition())?;
        disable_ignore(&mut self);
        Ok(self)
    }

    fn only_trashed(mut self) -> Result<Self, SoftDeleteError> {
        ensure_soft_deletes(self.definition())?;
        disable_ignore(&mut self);
        let column = deleted_at_column(self.definition());
        self.table_scope().where_not_null(&column);
        Ok(self)
    }

    async fn restore(self) -> Result<u64, SoftDeleteError> {
        ensure_soft_deletes(self.definition())?;

        let Some(column) = self
            .definition()
            .get_column(DELETED_AT_ATTRIBUTE)
            .map(|c| c.column_name.clone())
        else {
            return Ok(0);
        };

        let mut values = Row::new();
        values.insert(column, Value::Null);
        let restored = self.update(values).await?;

        tracing::debug!(model = M::model_name(), restored, "restored trashed rows");
        Ok(restored)
    }
}
