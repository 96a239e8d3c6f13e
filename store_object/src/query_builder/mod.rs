//! Query building for model stores
//!
//! Filters and ordering are plain data; [`ModelQueryBuilder`] ties them to a
//! booted model and an executor.

pub mod builder;
pub mod filter;
pub mod group_limit;
pub mod join;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;

#[cfg(test)]
mod tests;

pub use builder::{ModelQueryBuilder, TableScope};
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use group_limit::{GroupLimit, GROUP_LIMIT_ALIAS, GROUP_LIMIT_COUNTER};
pub use join::JoinClause;
pub use ordering::SortOrder;
pub use pagination::{Pagination, Paginator};
pub use sql_generation::SqlGenerator;
