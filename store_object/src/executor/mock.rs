//! In-memory executor for tests
//!
//! `MockExecutor` keeps rows per table and evaluates statements directly,
//! recording the PostgreSQL each statement renders to. Column references are
//! checked against the scope Postgres would use: inside a group-limited select
//! the base table is only visible in the ranked subquery, so qualifying a
//! wrapper predicate with the table name fails here as it would there. In a
//! joined select every joined table is visible, and an unqualified column
//! present in more than one of them is ambiguous.

use crate::errors::StoreError;
use crate::executor::statement::{
    DeleteStatement, InsertStatement, Row, SelectStatement, UpdateStatement,
};
use crate::executor::DatabaseExecutor;
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::group_limit::{GroupLimit, GROUP_LIMIT_ALIAS, GROUP_LIMIT_COUNTER};
use crate::query_builder::ordering::SortOrder;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A statement as it was sent to the executor
#[derive(Debug, Clone, PartialEq)]
pub struct MockStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl MockStatement {
    fn new((sql, values): (String, Vec<Value>)) -> Self {
        Self { sql, values }
    }
}

#[derive(Debug, Default)]
struct MockState {
    tables: HashMap<String, Vec<Row>>,
    sequences: HashMap<String, i64>,
    transaction_log: Vec<MockStatement>,
}

#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<MockState>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Default::default()
    }

    /// Seed a table with rows keyed by column name
    pub fn with_rows(self, table: &str, rows: Vec<Row>) -> Self {
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raw stored rows, trashed or not
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn transaction_log(&self) -> Vec<MockStatement> {
        self.lock().transaction_log.clone()
    }

    pub fn drain_transaction_log(&self) -> Vec<MockStatement> {
        std::mem::take(&mut self.lock().transaction_log)
    }

    fn select_rows(
        state: &MockState,
        statement: &SelectStatement,
        paged: bool,
    ) -> Result<Vec<Row>, StoreError> {
        let joined = !statement.joins.is_empty();
        let base_scope = if joined {
            let mut tables = vec![statement.table.as_str()];
            tables.extend(statement.joins.iter().map(|join| join.table.as_str()));
            Scope::Joined(tables)
        } else {
            Scope::Table(&statement.table)
        };

        for join in &statement.joins {
            resolve_column(&join.left_field, &base_scope)?;
            resolve_column(&join.right_field, &base_scope)?;
        }
        check_scope(&statement.conditions, &base_scope)?;

        let source = if joined {
            join_rows(state, statement, &base_scope)?
        } else {
            table_rows(state, &statement.table).to_vec()
        };
        let mut rows = filter_rows(source.into_iter(), &statement.conditions, &base_scope)?;

        let outer_scope = match &statement.group_limit {
            Some(group) => {
                check_scope(&statement.wrapper_conditions, &Scope::Grouped)?;
                // the window is evaluated over the model table's columns
                if joined {
                    rows = rows.into_iter().map(|row| project(row, &statement.table)).collect();
                }
                rows = rank_rows(rows, group, &Scope::Table(&statement.table))?;
                rows = filter_rows(rows.into_iter(), &statement.wrapper_conditions, &Scope::Grouped)?;
                Scope::Grouped
            }
            None => base_scope,
        };

        if !paged {
            return Ok(rows);
        }

        let rows = sort_rows(rows, &statement.order_by, &outer_scope)?;
        let offset = statement.offset.unwrap_or(0).max(0) as usize;
        let limit = statement.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        let page = rows.into_iter().skip(offset).take(limit);

        if joined && statement.group_limit.is_none() {
            Ok(page.map(|row| project(row, &statement.table)).collect())
        } else {
            Ok(page.collect())
        }
    }
}

fn table_rows<'s>(state: &'s MockState, table: &str) -> &'s [Row] {
    state.tables.get(table).map(Vec::as_slice).unwrap_or_default()
}

/// Key every column as `table.column`
fn qualify(row: &Row, table: &str) -> Row {
    row.iter()
        .map(|(column, value)| (format!("{}.{}", table, column), value.clone()))
        .collect()
}

/// Keep one table's columns of a joined row, unqualified
fn project(row: Row, table: &str) -> Row {
    let prefix = format!("{}.", table);
    row.into_iter()
        .filter_map(|(key, value)| key.strip_prefix(&prefix).map(|column| (column.to_string(), value)))
        .collect()
}

/// Nested-loop inner join over qualified rows
fn join_rows(
    state: &MockState,
    statement: &SelectStatement,
    scope: &Scope<'_>,
) -> Result<Vec<Row>, StoreError> {
    let mut rows: Vec<Row> = table_rows(state, &statement.table)
        .iter()
        .map(|row| qualify(row, &statement.table))
        .collect();

    for join in &statement.joins {
        let mut next = Vec::new();
        for left in &rows {
            for right in table_rows(state, &join.table) {
                let mut combined = left.clone();
                combined.extend(qualify(right, &join.table));
                let left_value = lookup(&combined, &join.left_field, scope)?;
                let right_value = lookup(&combined, &join.right_field, scope)?;
                if compare(left_value, right_value) == Some(Ordering::Equal) {
                    next.push(combined);
                }
            }
        }
        rows = next;
    }
    Ok(rows)
}

#[async_trait]
impl DatabaseExecutor for MockExecutor {
    async fn fetch_all(&self, statement: &SelectStatement) -> Result<Vec<Row>, StoreError> {
        let mut state = self.lock();
        state.transaction_log.push(MockStatement::new(statement.to_sql()));
        Self::select_rows(&state, statement, true)
    }

    async fn fetch_count(&self, statement: &SelectStatement) -> Result<i64, StoreError> {
        let mut state = self.lock();
        state
            .transaction_log
            .push(MockStatement::new(statement.to_count_sql()));
        Ok(Self::select_rows(&state, statement, false)?.len() as i64)
    }

    async fn insert(&self, statement: &InsertStatement) -> Result<Row, StoreError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.transaction_log.push(MockStatement::new(statement.to_sql()));

        let pk = &statement.primary_key;
        let mut row = statement.values.clone();
        let existing = state.tables.get(&statement.table).map(Vec::as_slice).unwrap_or_default();

        match row.get(pk).filter(|value| !value.is_null()) {
            Some(id) => {
                if existing.iter().any(|r| r.get(pk) == Some(id)) {
                    return Err(StoreError::Execution(format!(
                        "duplicate key value violates unique constraint on {}.{}",
                        statement.table, pk
                    )));
                }
            }
            None => {
                let highest = existing
                    .iter()
                    .filter_map(|r| r.get(pk).and_then(Value::as_i64))
                    .max()
                    .unwrap_or(0);
                let sequence = state.sequences.entry(statement.table.clone()).or_insert(0);
                *sequence = (*sequence).max(highest) + 1;
                row.insert(pk.clone(), Value::from(*sequence));
            }
        }

        state
            .tables
            .entry(statement.table.clone())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, statement: &UpdateStatement) -> Result<u64, StoreError> {
        let mut state = self.lock();
        state.transaction_log.push(MockStatement::new(statement.to_sql()));

        let scope = Scope::Table(&statement.table);
        check_scope(&statement.conditions, &scope)?;
        let Some(rows) = state.tables.get_mut(&statement.table) else {
            return Ok(0);
        };

        let matched = matching_flags(rows, &statement.conditions, &scope)?;
        let mut affected = 0;
        for (row, _) in rows.iter_mut().zip(&matched).filter(|(_, m)| **m) {
            for (column, value) in &statement.values {
                row.insert(column.clone(), value.clone());
            }
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete(&self, statement: &DeleteStatement) -> Result<u64, StoreError> {
        let mut state = self.lock();
        state.transaction_log.push(MockStatement::new(statement.to_sql()));

        let scope = Scope::Table(&statement.table);
        check_scope(&statement.conditions, &scope)?;
        let Some(rows) = state.tables.get_mut(&statement.table) else {
            return Ok(0);
        };

        let matched = matching_flags(rows, &statement.conditions, &scope)?;
        let mut flags = matched.iter();
        rows.retain(|_| !flags.next().copied().unwrap_or(false));
        Ok(matched.iter().filter(|m| **m).count() as u64)
    }
}

/// Which relation names a column reference may be qualified with
enum Scope<'a> {
    Table(&'a str),
    /// Model table first, then joined tables; rows are keyed `table.column`
    Joined(Vec<&'a str>),
    Grouped,
}

/// Row key a reference reads, or `None` when an unqualified reference in a
/// joined scope has to be resolved against the row itself
fn resolve_column<'f>(field: &'f str, scope: &Scope<'_>) -> Result<Option<&'f str>, StoreError> {
    let Some((qualifier, column)) = field.split_once('.') else {
        return Ok(match scope {
            Scope::Joined(_) => None,
            Scope::Table(_) | Scope::Grouped => Some(field),
        });
    };

    let key = match scope {
        Scope::Table(table) if qualifier == *table => Some(column),
        Scope::Grouped if qualifier == GROUP_LIMIT_ALIAS => Some(column),
        Scope::Joined(tables) if tables.contains(&qualifier) => Some(field),
        _ => None,
    };
    key.map(Some).ok_or_else(|| {
        StoreError::Execution(format!(
            "missing FROM-clause entry for table \"{}\"",
            qualifier
        ))
    })
}

/// Reject out-of-scope references even when no row would be evaluated
fn check_scope(conditions: &[QueryFilter], scope: &Scope<'_>) -> Result<(), StoreError> {
    for field in conditions.iter().flat_map(QueryFilter::fields) {
        resolve_column(field, scope)?;
    }
    Ok(())
}

fn lookup<'r>(row: &'r Row, field: &str, scope: &Scope<'_>) -> Result<&'r Value, StoreError> {
    let value = match resolve_column(field, scope)? {
        Some(key) => row.get(key),
        None => {
            let suffix = format!(".{}", field);
            let mut candidates = row.iter().filter(|(key, _)| key.ends_with(&suffix));
            let first = candidates.next();
            if candidates.next().is_some() {
                return Err(StoreError::Execution(format!(
                    "column reference \"{}\" is ambiguous",
                    field
                )));
            }
            first.map(|(_, value)| value)
        }
    };
    value.ok_or_else(|| StoreError::Execution(format!("column \"{}\" does not exist", field)))
}

fn filter_rows(
    rows: impl Iterator<Item = Row>,
    conditions: &[QueryFilter],
    scope: &Scope<'_>,
) -> Result<Vec<Row>, StoreError> {
    let mut kept = Vec::new();
    for row in rows {
        if matches_all(conditions, &row, scope)? {
            kept.push(row);
        }
    }
    Ok(kept)
}

/// Match flag per row, computed before any row is modified
fn matching_flags(
    rows: &[Row],
    conditions: &[QueryFilter],
    scope: &Scope<'_>,
) -> Result<Vec<bool>, StoreError> {
    rows.iter()
        .map(|row| matches_all(conditions, row, scope))
        .collect()
}

fn matches_all(conditions: &[QueryFilter], row: &Row, scope: &Scope<'_>) -> Result<bool, StoreError> {
    for condition in conditions {
        if !matches_filter(condition, row, scope)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_filter(filter: &QueryFilter, row: &Row, scope: &Scope<'_>) -> Result<bool, StoreError> {
    match filter {
        QueryFilter::Condition(condition) => matches_condition(condition, row, scope),
        QueryFilter::Group { operator, filters } => {
            for filter in filters {
                let matched = matches_filter(filter, row, scope)?;
                match operator {
                    LogicalOperator::And if !matched => return Ok(false),
                    LogicalOperator::Or if matched => return Ok(true),
                    _ => {}
                }
            }
            Ok(*operator == LogicalOperator::And)
        }
    }
}

fn matches_condition(
    condition: &QueryCondition,
    row: &Row,
    scope: &Scope<'_>,
) -> Result<bool, StoreError> {
    let actual = lookup(row, &condition.field, scope)?;
    let expected = condition.value.as_ref().unwrap_or(&Value::Null);

    let matched = match condition.operator {
        QueryOperator::Eq if expected.is_null() => actual.is_null(),
        QueryOperator::Ne if expected.is_null() => !actual.is_null(),
        QueryOperator::Eq => compare(actual, expected) == Some(Ordering::Equal),
        QueryOperator::Ne => matches!(compare(actual, expected), Some(o) if o != Ordering::Equal),
        QueryOperator::Gt => compare(actual, expected) == Some(Ordering::Greater),
        QueryOperator::Gte => matches!(
            compare(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        QueryOperator::Lt => compare(actual, expected) == Some(Ordering::Less),
        QueryOperator::Lte => matches!(
            compare(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        QueryOperator::Like => like(actual, expected, false),
        QueryOperator::ILike => like(actual, expected, true),
        QueryOperator::In => match expected {
            Value::Array(items) => items
                .iter()
                .any(|item| compare(actual, item) == Some(Ordering::Equal)),
            _ => false,
        },
        QueryOperator::NotIn => match expected {
            Value::Array(items) if !items.is_empty() => {
                !actual.is_null()
                    && items
                        .iter()
                        .all(|item| matches!(compare(actual, item), Some(o) if o != Ordering::Equal))
            }
            _ => true,
        },
        QueryOperator::IsNull => actual.is_null(),
        QueryOperator::IsNotNull => !actual.is_null(),
    };
    Ok(matched)
}

/// SQL comparison; `None` when the values are not comparable (including NULL)
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => {
            match (
                chrono::DateTime::parse_from_rfc3339(l),
                chrono::DateTime::parse_from_rfc3339(r),
            ) {
                (Ok(l), Ok(r)) => Some(l.cmp(&r)),
                _ => Some(l.cmp(r)),
            }
        }
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn like(actual: &Value, pattern: &Value, case_insensitive: bool) -> bool {
    let (Value::String(text), Value::String(pattern)) = (actual, pattern) else {
        return false;
    };
    let (text, pattern) = if case_insensitive {
        (text.to_lowercase(), pattern.to_lowercase())
    } else {
        (text.clone(), pattern.clone())
    };
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    like_match(&text, &pattern)
}

fn like_match(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((&'%', rest)) => (0..=text.len()).any(|skip| like_match(&text[skip..], rest)),
        Some((&'_', rest)) => !text.is_empty() && like_match(&text[1..], rest),
        Some((c, rest)) => text.first() == Some(c) && like_match(&text[1..], rest),
    }
}

/// Ordering used by ORDER BY: NULLs sort after every value in ascending order
fn sort_cmp(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
    }
}

fn sort_rows(
    rows: Vec<Row>,
    order_by: &[(String, SortOrder)],
    scope: &Scope<'_>,
) -> Result<Vec<Row>, StoreError> {
    if order_by.is_empty() {
        return Ok(rows);
    }

    let mut keyed = rows
        .into_iter()
        .map(|row| {
            let keys = order_by
                .iter()
                .map(|(field, _)| lookup(&row, field, scope).cloned())
                .collect::<Result<Vec<_>, _>>()?;
            Ok((keys, row))
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    keyed.sort_by(|(left, _), (right, _)| {
        for ((l, r), (_, order)) in left.iter().zip(right).zip(order_by) {
            let ordering = match order {
                SortOrder::Asc => sort_cmp(l, r),
                SortOrder::Desc => sort_cmp(l, r).reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

/// Number rows within each partition and keep the first `group.limit`
fn rank_rows(rows: Vec<Row>, group: &GroupLimit, scope: &Scope<'_>) -> Result<Vec<Row>, StoreError> {
    let mut partitions: Vec<(Value, Vec<Row>)> = Vec::new();
    for row in rows {
        let key = lookup(&row, &group.partition_by, scope)?.clone();
        match partitions.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(row),
            None => partitions.push((key, vec![row])),
        }
    }

    let mut ranked = Vec::new();
    for (_, members) in partitions {
        let members = sort_rows(members, &group.order_by, scope)?;
        for (index, mut row) in members.into_iter().enumerate() {
            let counter = index as i64 + 1;
            if counter > group.limit {
                break;
            }
            row.insert(GROUP_LIMIT_COUNTER.to_string(), Value::from(counter));
            ranked.push(row);
        }
    }
    Ok(ranked)
}
