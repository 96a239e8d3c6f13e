//! Per-group row limits
//!
//! A group-limited select ranks the table's rows with `ROW_NUMBER()` inside a
//! subquery and keeps the first `limit` rows of every partition:
//!
//! ```sql
//! SELECT * FROM (
//!     SELECT *, ROW_NUMBER() OVER (PARTITION BY posts.user_id ORDER BY posts.id ASC)
//!         AS store_group_limit_counter
//!     FROM posts WHERE ...
//! ) AS store_group_limit_query
//! WHERE store_group_limit_counter <= 2
//! ```
//!
//! The base table is only visible inside the subquery, so predicates that
//! reference it must be added through `ModelQueryBuilder::table_scope`.

use crate::query_builder::ordering::SortOrder;

/// Alias of the ranked subquery
pub const GROUP_LIMIT_ALIAS: &str = "store_group_limit_query";

/// Column holding each row's rank inside its partition
pub const GROUP_LIMIT_COUNTER: &str = "store_group_limit_counter";

#[derive(Debug, Clone, PartialEq)]
pub struct GroupLimit {
    pub partition_by: String,
    pub limit: i64,
    pub order_by: Vec<(String, SortOrder)>,
}

impl GroupLimit {
    pub fn new(partition_by: impl Into<String>, limit: i64) -> Self {
        Self {
            partition_by: partition_by.into(),
            limit,
            order_by: Vec::new(),
        }
    }

    /// Ordering used to rank rows inside each partition
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by.push((field.to_string(), order));
        self
    }
}
