//! Booted model metadata
//!
//! A [`ModelDefinition`] is built once per model type, when the model is
//! registered, and shared immutably by every store and query afterwards.

use crate::errors::StoreError;
use crate::executor::Row;
use crate::hooks::HookRegistry;
use crate::traits::{ColumnDefinition, Model};
use crate::validation::ValidatedIdentifier;
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// How `ModelStore::delete` persists the removal of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAction {
    /// Remove the row
    Remove,
    /// Keep the row and save the instance as it is now
    Save,
}

/// Decides the delete path for an instance; may mutate it before it is saved
pub type DeleteResolver<M> = fn(&mut M) -> DeleteAction;

pub struct ModelDefinition<M: Model> {
    columns: Vec<ColumnDefinition>,
    hooks: HookRegistry<M>,
    capabilities: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    delete_resolver: Option<DeleteResolver<M>>,
}

impl<M: Model> fmt::Debug for ModelDefinition<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDefinition")
            .field("model", &M::model_name())
            .field("table", &M::table_name())
            .field("columns", &self.columns)
            .field("hooks", &self.hooks)
            .field("capability_count", &self.capabilities.len())
            .field("has_delete_resolver", &self.delete_resolver.is_some())
            .finish()
    }
}

impl<M: Model> ModelDefinition<M> {
    /// Build the definition from the model's columns and run its boot hook
    pub fn boot() -> Result<Self, StoreError> {
        let mut definition = Self {
            columns: M::columns(),
            hooks: HookRegistry::new(),
            capabilities: HashMap::new(),
            delete_resolver: None,
        };

        M::boot(&mut definition);
        definition.validate()?;

        tracing::debug!(
            model = M::model_name(),
            table = M::table_name(),
            columns = definition.columns.len(),
            hooks = definition.hooks.len(),
            "booted model definition"
        );

        Ok(definition)
    }

    fn validate(&self) -> Result<(), StoreError> {
        ValidatedIdentifier::new(M::table_name())
            .map_err(|e| StoreError::validation(M::model_name(), e))?;

        for column in &self.columns {
            ValidatedIdentifier::new(&column.column_name)
                .map_err(|e| StoreError::validation(M::model_name(), e))?;
        }

        let primary_keys = self.columns.iter().filter(|c| c.is_primary).count();
        if primary_keys != 1 {
            return Err(StoreError::validation(
                M::model_name(),
                format!("expected exactly one primary key column, found {}", primary_keys),
            ));
        }

        Ok(())
    }

    pub fn model_name(&self) -> &'static str {
        M::model_name()
    }

    pub fn table_name(&self) -> &'static str {
        M::table_name()
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Look up a column by attribute name
    pub fn get_column(&self, attribute: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.attribute == attribute)
    }

    pub fn has_column(&self, attribute: &str) -> bool {
        self.get_column(attribute).is_some()
    }

    /// Add a column, replacing any column declared for the same attribute
    pub fn add_column(&mut self, column: ColumnDefinition) {
        match self.columns.iter_mut().find(|c| c.attribute == column.attribute) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    pub fn primary_key(&self) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.is_primary)
    }

    /// `table.column` for an attribute, as used in predicates
    pub fn qualified_column(&self, attribute: &str) -> Option<String> {
        self.get_column(attribute)
            .map(|c| format!("{}.{}", M::table_name(), c.column_name))
    }

    pub fn hooks(&self) -> &HookRegistry<M> {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry<M> {
        &mut self.hooks
    }

    /// Record a capability marker; looked up by type
    pub fn insert_capability<C: Any + Send + Sync>(&mut self, capability: C) {
        self.capabilities
            .insert(TypeId::of::<C>(), Box::new(capability));
    }

    pub fn capability<C: Any + Send + Sync>(&self) -> Option<&C> {
        self.capabilities
            .get(&TypeId::of::<C>())
            .and_then(|capability| capability.downcast_ref::<C>())
    }

    pub fn has_capability<C: Any + Send + Sync>(&self) -> bool {
        self.capabilities.contains_key(&TypeId::of::<C>())
    }

    /// Override how instances of this model are deleted
    pub fn set_delete_resolver(&mut self, resolver: DeleteResolver<M>) {
        self.delete_resolver = Some(resolver);
    }

    pub(crate) fn resolve_delete(&self, model: &mut M) -> DeleteAction {
        match self.delete_resolver {
            Some(resolver) => resolver(model),
            None => DeleteAction::Remove,
        }
    }

    /// Serialize a model into a row keyed by column name
    pub(crate) fn to_row(&self, model: &M) -> Result<Row, StoreError> {
        let attributes = match serde_json::to_value(model)? {
            Value::Object(attributes) => attributes,
            other => {
                return Err(StoreError::validation(
                    M::model_name(),
                    format!("model must serialize to an object, got {}", other),
                ))
            }
        };

        let mut row = Map::new();
        for column in &self.columns {
            let value = attributes
                .get(&column.attribute)
                .cloned()
                .unwrap_or(Value::Null);
            row.insert(column.column_name.clone(), value);
        }
        Ok(row)
    }

    /// Deserialize a row keyed by column name into a persisted model
    pub(crate) fn hydrate(&self, mut row: Row) -> Result<M, StoreError> {
        let mut attributes = Map::new();
        for column in &self.columns {
            if let Some(value) = row.remove(&column.column_name) {
                attributes.insert(column.attribute.clone(), value);
            }
        }

        let mut model: M = serde_json::from_value(Value::Object(attributes))?;
        model.state_mut().set_persisted(true);
        Ok(model)
    }
}
