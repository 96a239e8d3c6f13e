//! Models shared by the unit tests

use crate::mixin::{SoftDeleteFields, SoftDeletes};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store_object::{ColumnDefinition, MockExecutor, Model, ModelDefinition, ModelState, ModelStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Option<i64>,
    pub owner_id: i64,
    pub body: String,
    #[serde(flatten)]
    pub soft_delete: SoftDeleteFields,
    #[serde(skip)]
    pub state: ModelState,
}

impl Note {
    pub fn new(owner_id: i64, body: &str) -> Self {
        Self {
            id: None,
            owner_id,
            body: body.to_string(),
            soft_delete: SoftDeleteFields::default(),
            state: ModelState::default(),
        }
    }
}

impl Model for Note {
    fn model_name() -> &'static str {
        "Note"
    }

    fn table_name() -> &'static str {
        "notes"
    }

    fn columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::primary("id"),
            ColumnDefinition::new("owner_id"),
            ColumnDefinition::new("body"),
        ]
    }

    fn boot(definition: &mut ModelDefinition<Self>) {
        crate::boot(definition);
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

impl SoftDeletes for Note {
    fn soft_delete_fields(&self) -> &SoftDeleteFields {
        &self.soft_delete
    }

    fn soft_delete_fields_mut(&mut self) -> &mut SoftDeleteFields {
        &mut self.soft_delete
    }
}

/// A model without soft deletes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<i64>,
    pub label: String,
    #[serde(skip)]
    pub state: ModelState,
}

impl Model for Tag {
    fn model_name() -> &'static str {
        "Tag"
    }

    fn table_name() -> &'static str {
        "tags"
    }

    fn columns() -> Vec<ColumnDefinition> {
        vec![ColumnDefinition::primary("id"), ColumnDefinition::new("label")]
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

pub fn store<M: Model>() -> (ModelStore<M>, Arc<MockExecutor>) {
    let executor = Arc::new(MockExecutor::new());
    let store = ModelStore::<M>::boot(executor.clone()).unwrap();
    (store, executor)
}
