//! Structured statements handed to a [`DatabaseExecutor`](super::DatabaseExecutor)
//!
//! Executors receive statements rather than SQL text so that a non-SQL
//! backend (the mock) can evaluate them directly. `to_sql` renders the
//! PostgreSQL form.

use crate::query_builder::filter::QueryFilter;
use crate::query_builder::group_limit::GroupLimit;
use crate::query_builder::join::JoinClause;
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::sql_generation::SqlGenerator;
use serde_json::{Map, Value};

/// A row keyed by column name
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table: String,
    pub joins: Vec<JoinClause>,
    /// Predicates on the table itself (and its joins)
    pub conditions: Vec<QueryFilter>,
    pub group_limit: Option<GroupLimit>,
    /// Predicates on the grouped wrapper; only rendered with a group limit
    pub wrapper_conditions: Vec<QueryFilter>,
    pub order_by: Vec<(String, SortOrder)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SelectStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            joins: Vec::new(),
            conditions: Vec::new(),
            group_limit: None,
            wrapper_conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn to_sql(&self) -> (String, Vec<Value>) {
        SqlGenerator::select(self)
    }

    /// `SELECT COUNT(*) AS total` over the same rows, ignoring ordering and paging
    pub fn to_count_sql(&self) -> (String, Vec<Value>) {
        SqlGenerator::count(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub primary_key: String,
    pub values: Row,
}

impl InsertStatement {
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        SqlGenerator::insert(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: String,
    pub values: Row,
    pub conditions: Vec<QueryFilter>,
}

impl UpdateStatement {
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        SqlGenerator::update(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: String,
    pub conditions: Vec<QueryFilter>,
}

impl DeleteStatement {
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        SqlGenerator::delete(self)
    }
}
