//! Query predicates
//!
//! Field names are used verbatim in generated SQL; qualify them as
//! `table.column` when a query may involve more than one table.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    /// Case-insensitive LIKE
    ILike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl QueryOperator {
    /// Infix SQL for operators that compare a field with one bound value
    pub fn binary_sql(self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::Ne => Some("!="),
            Self::Gt => Some(">"),
            Self::Gte => Some(">="),
            Self::Lt => Some("<"),
            Self::Lte => Some("<="),
            Self::Like => Some("LIKE"),
            Self::ILike => Some("ILIKE"),
            Self::In | Self::NotIn | Self::IsNull | Self::IsNotNull => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    /// `None` for IS NULL / IS NOT NULL
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// A condition, or a nested AND/OR group of filters
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
}

impl QueryFilter {
    pub fn condition(field: &str, operator: QueryOperator, value: Option<Value>) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    fn binary(field: &str, operator: QueryOperator, value: impl Into<Value>) -> Self {
        Self::condition(field, operator, Some(value.into()))
    }

    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    /// `eq(field, Value::Null)` renders as `IS NULL`
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::binary(field, QueryOperator::Eq, value)
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Self::binary(field, QueryOperator::Ne, value)
    }

    pub fn gt(field: &str, value: impl Into<Value>) -> Self {
        Self::binary(field, QueryOperator::Gt, value)
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Self::binary(field, QueryOperator::Gte, value)
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Self::binary(field, QueryOperator::Lt, value)
    }

    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Self::binary(field, QueryOperator::Lte, value)
    }

    pub fn like(field: &str, pattern: &str) -> Self {
        Self::binary(field, QueryOperator::Like, pattern)
    }

    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::binary(field, QueryOperator::ILike, pattern)
    }

    pub fn in_values(field: &str, values: Vec<Value>) -> Self {
        Self::binary(field, QueryOperator::In, values)
    }

    pub fn not_in_values(field: &str, values: Vec<Value>) -> Self {
        Self::binary(field, QueryOperator::NotIn, values)
    }

    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }

    /// Every field referenced by this filter, nested groups included
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Condition(condition) => vec![condition.field.as_str()],
            Self::Group { filters, .. } => filters.iter().flat_map(Self::fields).collect(),
        }
    }
}
