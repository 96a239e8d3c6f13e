//! Trait definitions
//!
//! This module defines the model contract consumed by stores and query builders.

use crate::definition::ModelDefinition;
use crate::traits::column::ColumnDefinition;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A persistable model
///
/// Serde is the attribute codec: every declared column must match a serde
/// field name on the struct. Transient bookkeeping lives in [`ModelState`],
/// which should be marked `#[serde(skip)]`.
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Company {
///     pub id: Option<i64>,
///     pub name: String,
///     #[serde(skip)]
///     pub state: ModelState,
/// }
///
/// impl Model for Company {
///     fn model_name() -> &'static str { "Company" }
///     fn table_name() -> &'static str { "companies" }
///     fn columns() -> Vec<ColumnDefinition> {
///         vec![ColumnDefinition::primary("id"), ColumnDefinition::new("name")]
///     }
///     fn state(&self) -> &ModelState { &self.state }
///     fn state_mut(&mut self) -> &mut ModelState { &mut self.state }
/// }
/// ```
pub trait Model: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static {
    /// Name used in errors and logs
    fn model_name() -> &'static str;

    /// The table name in the database
    fn table_name() -> &'static str;

    /// Columns declared by the model itself
    fn columns() -> Vec<ColumnDefinition>;

    /// Called once when the model definition is built. Mixins register their
    /// columns, hooks and capabilities here.
    fn boot(_definition: &mut ModelDefinition<Self>) {}

    fn state(&self) -> &ModelState;

    fn state_mut(&mut self) -> &mut ModelState;
}

/// Transient, never persisted, lifecycle flags of a model instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelState {
    persisted: bool,
    deleted: bool,
}

impl ModelState {
    /// Whether the instance has a row in the database
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Whether the row behind this instance has been removed for good
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn set_persisted(&mut self, persisted: bool) {
        self.persisted = persisted;
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}
