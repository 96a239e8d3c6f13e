//! Per-query trashed-row visibility
//!
//! The flag lives in the query's [`Extensions`](store_object::Extensions), so
//! it travels with one query instance and its clones and nowhere else. A
//! query without the flag hides trashed rows.

use crate::mixin::DELETED_AT_ATTRIBUTE;
use store_object::{Model, ModelDefinition, ModelQueryBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrashedVisibility {
    /// Trashed rows are filtered out
    #[default]
    Exclude,
    /// Trashed rows are returned alongside live ones
    Include,
}

pub fn visibility<M: Model>(query: &ModelQueryBuilder<M>) -> TrashedVisibility {
    query
        .extensions()
        .get::<TrashedVisibility>()
        .copied()
        .unwrap_or_default()
}

pub fn set_visibility<M: Model>(query: &mut ModelQueryBuilder<M>, visibility: TrashedVisibility) {
    query.extensions_mut().insert(visibility);
}

/// Stop the query from hiding trashed rows
pub fn disable_ignore<M: Model>(query: &mut ModelQueryBuilder<M>) {
    set_visibility(query, TrashedVisibility::Include);
}

/// Qualified deletion timestamp column, resolved from the booted columns
pub fn deleted_at_column<M: Model>(definition: &ModelDefinition<M>) -> String {
    definition
        .qualified_column(DELETED_AT_ATTRIBUTE)
        .unwrap_or_else(|| format!("{}.{}", M::table_name(), DELETED_AT_ATTRIBUTE))
}

/// Find/fetch hook: restrict the query to live rows unless told otherwise
pub fn ignore_deleted<M: Model>(query: &mut ModelQueryBuilder<M>) {
    if visibility(query) == TrashedVisibility::Include {
        return;
    }
    let Some(column) = query.definition().qualified_column(DELETED_AT_ATTRIBUTE) else {
        return;
    };

    tracing::trace!(model = M::model_name(), column = %column, "excluding trashed rows");
    query.table_scope().where_null(&column);
}

/// Paginate hook: the count query follows the main query's visibility
pub fn ignore_deleted_paginate<M: Model>(
    count_query: &mut ModelQueryBuilder<M>,
    query: &mut ModelQueryBuilder<M>,
) {
    set_visibility(count_query, visibility(query));
    ignore_deleted(count_query);
}
