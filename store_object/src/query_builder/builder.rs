//! Model query builder
//!
//! A [`ModelQueryBuilder`] is created per call, carries its own predicates and
//! [`Extensions`], and runs the model's hooks when it executes.

use crate::definition::ModelDefinition;
use crate::errors::StoreError;
use crate::executor::{DatabaseExecutor, DeleteStatement, Row, SelectStatement, UpdateStatement};
use crate::extensions::Extensions;
use crate::hooks::{HookPhase, LifecycleEvent};
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::group_limit::GroupLimit;
use crate::query_builder::join::JoinClause;
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::pagination::{Pagination, Paginator};
use crate::traits::Model;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub struct ModelQueryBuilder<M: Model> {
    definition: Arc<ModelDefinition<M>>,
    executor: Arc<dyn DatabaseExecutor>,
    joins: Vec<JoinClause>,
    conditions: Vec<QueryFilter>,
    wrapper_conditions: Vec<QueryFilter>,
    order_by: Vec<(String, SortOrder)>,
    limit: Option<i64>,
    offset: Option<i64>,
    group_limit: Option<GroupLimit>,
    extensions: Extensions,
}

impl<M: Model> Clone for ModelQueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            executor: Arc::clone(&self.executor),
            joins: self.joins.clone(),
            conditions: self.conditions.clone(),
            wrapper_conditions: self.wrapper_conditions.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
            group_limit: self.group_limit.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

impl<M: Model> fmt::Debug for ModelQueryBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelQueryBuilder")
            .field("model", &M::model_name())
            .field("joins", &self.joins)
            .field("conditions", &self.conditions)
            .field("wrapper_conditions", &self.wrapper_conditions)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("group_limit", &self.group_limit)
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl<M: Model> ModelQueryBuilder<M> {
    pub fn new(definition: Arc<ModelDefinition<M>>, executor: Arc<dyn DatabaseExecutor>) -> Self {
        Self {
            definition,
            executor,
            joins: Vec::new(),
            conditions: Vec::new(),
            wrapper_conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            group_limit: None,
            extensions: Extensions::new(),
        }
    }

    /// Add a filter condition
    ///
    /// Once a group limit is set, filters apply to the grouped result rather
    /// than the table. Use [`table_scope`](Self::table_scope) to reach the table.
    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.add_filter(filter);
        self
    }

    /// In-place variant of [`filter`](Self::filter), for use inside hooks
    pub fn add_filter(&mut self, filter: QueryFilter) {
        if self.group_limit.is_some() {
            self.wrapper_conditions.push(filter);
        } else {
            self.conditions.push(filter);
        }
    }

    /// Inner join another table; rows are still the model's own
    pub fn join(mut self, table: &str, left_field: &str, right_field: &str) -> Self {
        self.joins.push(JoinClause::inner(table, left_field, right_field));
        self
    }

    pub fn where_null(self, field: &str) -> Self {
        self.filter(QueryFilter::is_null(field))
    }

    pub fn where_not_null(self, field: &str) -> Self {
        self.filter(QueryFilter::is_not_null(field))
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by.push((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// LIMIT/OFFSET for a 1-based page
    pub fn for_page(self, page: i64, per_page: i64) -> Self {
        let pagination = Pagination::new(page, per_page);
        self.limit(pagination.limit()).offset(pagination.offset())
    }

    /// Keep at most `group.limit` rows per partition
    pub fn group_limit(mut self, group: GroupLimit) -> Self {
        self.group_limit = Some(group);
        self
    }

    pub fn is_group_limited(&self) -> bool {
        self.group_limit.is_some()
    }

    /// Predicates on the model's own table, inside the grouped subquery when
    /// the query is group-limited
    pub fn table_scope(&mut self) -> TableScope<'_> {
        TableScope {
            table: M::table_name(),
            conditions: &mut self.conditions,
        }
    }

    pub fn definition(&self) -> &ModelDefinition<M> {
        &self.definition
    }

    pub fn model_name(&self) -> &'static str {
        M::model_name()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn conditions(&self) -> &[QueryFilter] {
        &self.conditions
    }

    pub fn wrapper_conditions(&self) -> &[QueryFilter] {
        &self.wrapper_conditions
    }

    /// Companion query counting the rows this query matches
    ///
    /// Predicates and grouping are copied; ordering, paging and extensions
    /// are not.
    pub fn count_query(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            executor: Arc::clone(&self.executor),
            joins: self.joins.clone(),
            conditions: self.conditions.clone(),
            wrapper_conditions: self.wrapper_conditions.clone(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            group_limit: self.group_limit.clone(),
            extensions: Extensions::new(),
        }
    }

    pub fn to_statement(&self) -> SelectStatement {
        SelectStatement {
            table: M::table_name().to_string(),
            joins: self.joins.clone(),
            conditions: self.conditions.clone(),
            group_limit: self.group_limit.clone(),
            wrapper_conditions: self.wrapper_conditions.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }

    /// SQL and parameters as the query stands, without running hooks
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        self.to_statement().to_sql()
    }

    fn hydrate_all(&self, rows: Vec<Row>) -> Result<Vec<M>, StoreError> {
        rows.into_iter()
            .map(|row| self.definition.hydrate(row))
            .collect()
    }

    /// Run fetch hooks and return every matching model
    pub async fn exec(mut self) -> Result<Vec<M>, StoreError> {
        let definition = Arc::clone(&self.definition);
        definition.hooks().run_query(LifecycleEvent::Fetch, &mut self);

        let statement = self.to_statement();
        tracing::trace!(model = M::model_name(), sql = %statement.to_sql().0, "fetch");

        let rows = self.executor.fetch_all(&statement).await?;
        let models = self.hydrate_all(rows)?;

        definition.hooks().run_results(LifecycleEvent::Fetch, &models);
        Ok(models)
    }

    pub async fn all(self) -> Result<Vec<M>, StoreError> {
        self.exec().await
    }

    /// Run find hooks and return the first matching model
    pub async fn first(mut self) -> Result<Option<M>, StoreError> {
        let definition = Arc::clone(&self.definition);
        definition.hooks().run_query(LifecycleEvent::Find, &mut self);
        self.limit = Some(1);

        let statement = self.to_statement();
        tracing::trace!(model = M::model_name(), sql = %statement.to_sql().0, "find");

        let rows = self.executor.fetch_all(&statement).await?;
        let model = match rows.into_iter().next() {
            Some(row) => definition.hydrate(row)?,
            None => return Ok(None),
        };

        definition
            .hooks()
            .run_instance(HookPhase::After, LifecycleEvent::Find, &model);
        Ok(Some(model))
    }

    /// Fetch one page plus the total number of matching rows
    ///
    /// Paginate hooks see the count query first and the main query second;
    /// fetch hooks then run on the main query only.
    pub async fn paginate(self, page: i64, per_page: i64) -> Result<Paginator<M>, StoreError> {
        let definition = Arc::clone(&self.definition);
        let pagination = Pagination::new(page, per_page);

        let mut count_query = self.count_query();
        let mut query = self.for_page(pagination.page, pagination.per_page);

        definition.hooks().run_paginate(&mut count_query, &mut query);
        definition.hooks().run_query(LifecycleEvent::Fetch, &mut query);

        let total = query
            .executor
            .fetch_count(&count_query.to_statement())
            .await?;
        let rows = query.executor.fetch_all(&query.to_statement()).await?;
        let models = query.hydrate_all(rows)?;

        tracing::trace!(
            model = M::model_name(),
            page = pagination.page,
            total,
            "paginate"
        );

        definition.hooks().run_results(LifecycleEvent::Paginate, &models);
        Ok(Paginator::new(models, total, pagination))
    }

    /// Run fetch hooks and count the matching rows
    pub async fn count(mut self) -> Result<i64, StoreError> {
        let definition = Arc::clone(&self.definition);
        definition.hooks().run_query(LifecycleEvent::Fetch, &mut self);
        self.executor.fetch_count(&self.to_statement()).await
    }

    fn ensure_plain(&self, operation: &str) -> Result<(), StoreError> {
        let shape = if self.group_limit.is_some() {
            "group-limited"
        } else if !self.joins.is_empty() {
            "joined"
        } else {
            return Ok(());
        };
        Err(StoreError::validation(
            M::model_name(),
            format!("{} is not supported on a {} query", operation, shape),
        ))
    }

    /// Bulk update of the matched rows; values are keyed by column name
    ///
    /// No hooks run, so every row matching the explicit predicates is updated.
    pub async fn update(self, values: Row) -> Result<u64, StoreError> {
        self.ensure_plain("update")?;
        if values.is_empty() {
            return Err(StoreError::validation(
                M::model_name(),
                "update requires at least one column",
            ));
        }

        let statement = UpdateStatement {
            table: M::table_name().to_string(),
            values,
            conditions: self.conditions,
        };
        self.executor.update(&statement).await
    }

    /// Bulk delete of the matched rows; no hooks run
    pub async fn delete(self) -> Result<u64, StoreError> {
        self.ensure_plain("delete")?;

        let statement = DeleteStatement {
            table: M::table_name().to_string(),
            conditions: self.conditions,
        };
        self.executor.delete(&statement).await
    }
}

/// Predicate access to a query's table clause
pub struct TableScope<'a> {
    table: &'static str,
    conditions: &'a mut Vec<QueryFilter>,
}

impl TableScope<'_> {
    pub fn table_name(&self) -> &'static str {
        self.table
    }

    pub fn filter(&mut self, filter: QueryFilter) -> &mut Self {
        self.conditions.push(filter);
        self
    }

    pub fn where_null(&mut self, field: &str) -> &mut Self {
        self.filter(QueryFilter::is_null(field))
    }

    pub fn where_not_null(&mut self, field: &str) -> &mut Self {
        self.filter(QueryFilter::is_not_null(field))
    }
}
