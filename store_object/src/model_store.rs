//! Per-model store
//!
//! A [`ModelStore`] pairs a booted [`ModelDefinition`] with an executor and
//! handles instance persistence. Set-based work goes through
//! [`ModelStore::query`].

use crate::definition::{DeleteAction, ModelDefinition};
use crate::errors::StoreError;
use crate::executor::{DatabaseExecutor, DeleteStatement, InsertStatement, UpdateStatement};
use crate::hooks::{HookPhase, LifecycleEvent};
use crate::query_builder::{ModelQueryBuilder, QueryFilter};
use crate::traits::{ColumnDefinition, Model};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub struct ModelStore<M: Model> {
    definition: Arc<ModelDefinition<M>>,
    executor: Arc<dyn DatabaseExecutor>,
}

impl<M: Model> Clone for ModelStore<M> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<M: Model> fmt::Debug for ModelStore<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelStore")
            .field("model", &M::model_name())
            .field("table", &M::table_name())
            .field("executor", &self.executor)
            .finish()
    }
}

impl<M: Model> ModelStore<M> {
    pub fn new(definition: Arc<ModelDefinition<M>>, executor: Arc<dyn DatabaseExecutor>) -> Self {
        Self {
            definition,
            executor,
        }
    }

    /// Boot the model's definition and build a store around it
    pub fn boot(executor: Arc<dyn DatabaseExecutor>) -> Result<Self, StoreError> {
        let definition = ModelDefinition::<M>::boot()?;
        Ok(Self::new(Arc::new(definition), executor))
    }

    pub fn definition(&self) -> &Arc<ModelDefinition<M>> {
        &self.definition
    }

    pub fn executor(&self) -> &Arc<dyn DatabaseExecutor> {
        &self.executor
    }

    /// Fresh query with default extensions
    pub fn query(&self) -> ModelQueryBuilder<M> {
        ModelQueryBuilder::new(Arc::clone(&self.definition), Arc::clone(&self.executor))
    }

    pub async fn all(&self) -> Result<Vec<M>, StoreError> {
        self.query().exec().await
    }

    fn primary_key(&self) -> Result<&ColumnDefinition, StoreError> {
        self.definition
            .primary_key()
            .ok_or_else(|| StoreError::validation(M::model_name(), "no primary key column"))
    }

    /// Look up by primary key; find hooks apply
    pub async fn find(&self, id: impl Into<Value>) -> Result<Option<M>, StoreError> {
        let column = self.primary_key()?;
        let field = format!("{}.{}", M::table_name(), column.column_name);
        self.query()
            .filter(QueryFilter::eq(&field, id))
            .first()
            .await
    }

    pub async fn find_or_fail(&self, id: impl Into<Value>) -> Result<M, StoreError> {
        let id = id.into();
        self.find(id.clone()).await?.ok_or_else(|| {
            StoreError::NotFound(format!("{} with primary key {}", M::model_name(), id))
        })
    }

    fn primary_key_value(&self, model: &M) -> Result<(String, Value), StoreError> {
        let column = self.primary_key()?.column_name.clone();
        let row = self.definition.to_row(model)?;
        match row.get(&column) {
            Some(value) if !value.is_null() => Ok((column, value.clone())),
            _ => Err(StoreError::validation(
                M::model_name(),
                "persisted instance has no primary key value",
            )),
        }
    }

    /// Insert a new instance or update a persisted one
    ///
    /// After an insert the instance is replaced by the stored row, so
    /// database defaults such as the primary key are visible to the caller.
    pub async fn save(&self, model: &mut M) -> Result<(), StoreError> {
        if model.state().is_deleted() {
            return Err(StoreError::validation(
                M::model_name(),
                "cannot save a deleted instance",
            ));
        }

        let hooks = self.definition.hooks();
        hooks.run_instance(HookPhase::Before, LifecycleEvent::Save, model);

        let primary_key = self.primary_key()?.column_name.clone();
        let mut row = self.definition.to_row(model)?;

        if model.state().is_persisted() {
            let (_, id) = self.primary_key_value(model)?;
            row.remove(&primary_key);

            if !row.is_empty() {
                let statement = UpdateStatement {
                    table: M::table_name().to_string(),
                    values: row,
                    conditions: vec![QueryFilter::eq(&primary_key, id.clone())],
                };
                let affected = self.executor.update(&statement).await?;
                if affected == 0 {
                    return Err(StoreError::NotFound(format!(
                        "{} with primary key {}",
                        M::model_name(),
                        id
                    )));
                }
            }
        } else {
            let statement = InsertStatement {
                table: M::table_name().to_string(),
                primary_key,
                values: row,
            };
            let stored = self.executor.insert(&statement).await?;
            *model = self.definition.hydrate(stored)?;
        }

        model.state_mut().set_persisted(true);
        tracing::trace!(model = M::model_name(), "saved instance");

        hooks.run_instance(HookPhase::After, LifecycleEvent::Save, model);
        Ok(())
    }

    /// Delete an instance
    ///
    /// A model with a delete resolver may turn the delete into a save; the
    /// instance is only marked deleted when its row is removed.
    pub async fn delete(&self, model: &mut M) -> Result<(), StoreError> {
        if model.state().is_deleted() {
            return Err(StoreError::validation(
                M::model_name(),
                "instance is already deleted",
            ));
        }
        if !model.state().is_persisted() {
            return Err(StoreError::validation(
                M::model_name(),
                "cannot delete an instance that was never saved",
            ));
        }

        let hooks = self.definition.hooks();
        hooks.run_instance(HookPhase::Before, LifecycleEvent::Delete, model);

        match self.definition.resolve_delete(model) {
            DeleteAction::Save => self.save(model).await?,
            DeleteAction::Remove => {
                let (column, id) = self.primary_key_value(model)?;
                let statement = DeleteStatement {
                    table: M::table_name().to_string(),
                    conditions: vec![QueryFilter::eq(&column, id)],
                };
                self.executor.delete(&statement).await?;
                model.state_mut().set_deleted(true);
            }
        }

        hooks.run_instance(HookPhase::After, LifecycleEvent::Delete, model);
        Ok(())
    }

    /// Remove every row of the model's table
    pub async fn truncate(&self) -> Result<u64, StoreError> {
        let statement = DeleteStatement {
            table: M::table_name().to_string(),
            conditions: Vec::new(),
        };
        let removed = self.executor.delete(&statement).await?;
        tracing::debug!(table = M::table_name(), removed, "truncated table");
        Ok(removed)
    }
}
