//! Trait definitions
//!
//! This module contains the traits a model implements to be stored and queried.

pub mod column;
pub mod model;

pub use column::ColumnDefinition;
pub use model::{Model, ModelState};
