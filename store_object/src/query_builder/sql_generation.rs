//! SQL rendering for PostgreSQL
//!
//! Values are always bound as `$n` parameters, numbered in the order they
//! appear in the statement. JSON `null` in SET/VALUES lists is written as a
//! literal `NULL` so that it takes the column's type instead of the type of a
//! bound parameter.

use crate::executor::statement::{
    DeleteStatement, InsertStatement, SelectStatement, UpdateStatement,
};
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::group_limit::{GROUP_LIMIT_ALIAS, GROUP_LIMIT_COUNTER};
use crate::query_builder::ordering::SortOrder;
use serde_json::Value;

const COUNT_ALIAS: &str = "store_count_query";

pub struct SqlGenerator;

impl SqlGenerator {
    fn placeholder(values: &mut Vec<Value>, value: Value) -> String {
        values.push(value);
        format!("${}", values.len())
    }

    /// Join conditions with AND, without the `WHERE` keyword
    pub fn build_where_clause(conditions: &[QueryFilter], values: &mut Vec<Value>) -> String {
        conditions
            .iter()
            .map(|condition| Self::build_condition_sql(condition, values))
            .filter(|sql| !sql.is_empty())
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn build_condition_sql(filter: &QueryFilter, values: &mut Vec<Value>) -> String {
        match filter {
            QueryFilter::Condition(condition) => Self::build_single_condition_sql(condition, values),
            QueryFilter::Group { operator, filters } => {
                if filters.is_empty() {
                    return match operator {
                        LogicalOperator::And => "1=1".to_string(),
                        LogicalOperator::Or => "1=0".to_string(),
                    };
                }

                let operator_str = match operator {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };

                let group_conditions = filters
                    .iter()
                    .map(|f| Self::build_condition_sql(f, values))
                    .collect::<Vec<_>>()
                    .join(operator_str);

                format!("({})", group_conditions)
            }
        }
    }

    fn build_single_condition_sql(condition: &QueryCondition, values: &mut Vec<Value>) -> String {
        let field = &condition.field;

        match condition.operator {
            QueryOperator::Eq | QueryOperator::Ne => match &condition.value {
                Some(value) if !value.is_null() => {
                    let param = Self::placeholder(values, value.clone());
                    let symbol = condition.operator.binary_sql().unwrap_or("=");
                    format!("{} {} {}", field, symbol, param)
                }
                _ if condition.operator == QueryOperator::Eq => format!("{} IS NULL", field),
                _ => format!("{} IS NOT NULL", field),
            },
            QueryOperator::Gt
            | QueryOperator::Gte
            | QueryOperator::Lt
            | QueryOperator::Lte
            | QueryOperator::Like
            | QueryOperator::ILike => match (&condition.value, condition.operator.binary_sql()) {
                (Some(value), Some(symbol)) if !value.is_null() => {
                    let param = Self::placeholder(values, value.clone());
                    format!("{} {} {}", field, symbol, param)
                }
                // comparing with NULL is never true
                _ => "1=0".to_string(),
            },
            QueryOperator::In | QueryOperator::NotIn => {
                let negated = matches!(condition.operator, QueryOperator::NotIn);
                match &condition.value {
                    Some(Value::Array(items)) if !items.is_empty() => {
                        let placeholders = items
                            .iter()
                            .map(|item| Self::placeholder(values, item.clone()))
                            .collect::<Vec<_>>()
                            .join(", ");
                        let keyword = if negated { "NOT IN" } else { "IN" };
                        format!("{} {} ({})", field, keyword, placeholders)
                    }
                    // IN () matches nothing, NOT IN () matches everything
                    _ if negated => "1=1".to_string(),
                    _ => "1=0".to_string(),
                }
            }
            QueryOperator::IsNull => format!("{} IS NULL", field),
            QueryOperator::IsNotNull => format!("{} IS NOT NULL", field),
        }
    }

    pub fn build_order_clause(order_by: &[(String, SortOrder)]) -> String {
        if order_by.is_empty() {
            return String::new();
        }

        let order_items: Vec<String> = order_by
            .iter()
            .map(|(field, order)| format!("{} {}", field, order.to_sql()))
            .collect();

        format!("ORDER BY {}", order_items.join(", "))
    }

    pub fn build_limit_clause(limit: Option<i64>, offset: Option<i64>) -> String {
        let mut clauses = Vec::new();

        if let Some(limit) = limit {
            clauses.push(format!("LIMIT {}", limit));
        }

        if let Some(offset) = offset {
            clauses.push(format!("OFFSET {}", offset));
        }

        clauses.join(" ")
    }

    /// Joined selects return the model table's columns only
    fn projection(statement: &SelectStatement) -> String {
        if statement.joins.is_empty() {
            "*".to_string()
        } else {
            format!("{}.*", statement.table)
        }
    }

    fn from_clause(statement: &SelectStatement) -> String {
        let mut from = statement.table.clone();
        for join in &statement.joins {
            from.push(' ');
            from.push_str(&join.to_sql());
        }
        from
    }

    /// Rows of the statement without ordering or paging
    fn select_body(statement: &SelectStatement, values: &mut Vec<Value>) -> String {
        let table_where = Self::build_where_clause(&statement.conditions, values);

        let projection = Self::projection(statement);
        let from = Self::from_clause(statement);

        let mut table_select = match &statement.group_limit {
            None => format!("SELECT {} FROM {}", projection, from),
            Some(group) => {
                let mut window = format!("PARTITION BY {}", group.partition_by);
                let window_order = Self::build_order_clause(&group.order_by);
                if !window_order.is_empty() {
                    window.push(' ');
                    window.push_str(&window_order);
                }
                format!(
                    "SELECT {}, ROW_NUMBER() OVER ({}) AS {} FROM {}",
                    projection, window, GROUP_LIMIT_COUNTER, from
                )
            }
        };
        if !table_where.is_empty() {
            table_select.push_str(" WHERE ");
            table_select.push_str(&table_where);
        }

        match &statement.group_limit {
            None => table_select,
            Some(group) => {
                let mut outer = vec![format!("{} <= {}", GROUP_LIMIT_COUNTER, group.limit)];
                let wrapper_where = Self::build_where_clause(&statement.wrapper_conditions, values);
                if !wrapper_where.is_empty() {
                    outer.push(wrapper_where);
                }
                format!(
                    "SELECT * FROM ({}) AS {} WHERE {}",
                    table_select,
                    GROUP_LIMIT_ALIAS,
                    outer.join(" AND ")
                )
            }
        }
    }

    pub fn select(statement: &SelectStatement) -> (String, Vec<Value>) {
        let mut values = Vec::new();
        let mut sql = Self::select_body(statement, &mut values);

        let order_clause = Self::build_order_clause(&statement.order_by);
        if !order_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&order_clause);
        }
        let limit_clause = Self::build_limit_clause(statement.limit, statement.offset);
        if !limit_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&limit_clause);
        }

        (sql, values)
    }

    pub fn count(statement: &SelectStatement) -> (String, Vec<Value>) {
        let mut values = Vec::new();

        if statement.group_limit.is_some() {
            let body = Self::select_body(statement, &mut values);
            let sql = format!("SELECT COUNT(*) AS total FROM ({}) AS {}", body, COUNT_ALIAS);
            return (sql, values);
        }

        let mut sql = format!("SELECT COUNT(*) AS total FROM {}", Self::from_clause(statement));
        let where_clause = Self::build_where_clause(&statement.conditions, &mut values);
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }
        (sql, values)
    }

    pub fn insert(statement: &InsertStatement) -> (String, Vec<Value>) {
        let mut values = Vec::new();
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();

        for (column, value) in &statement.values {
            // A missing primary key is left to the column default
            if column == &statement.primary_key && value.is_null() {
                continue;
            }
            columns.push(column.as_str());
            placeholders.push(if value.is_null() {
                "NULL".to_string()
            } else {
                Self::placeholder(&mut values, value.clone())
            });
        }

        if columns.is_empty() {
            return (format!("INSERT INTO {} DEFAULT VALUES", statement.table), values);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            statement.table,
            columns.join(", "),
            placeholders.join(", ")
        );
        (sql, values)
    }

    pub fn update(statement: &UpdateStatement) -> (String, Vec<Value>) {
        let mut values = Vec::new();

        let assignments = statement
            .values
            .iter()
            .map(|(column, value)| {
                if value.is_null() {
                    format!("{} = NULL", column)
                } else {
                    format!("{} = {}", column, Self::placeholder(&mut values, value.clone()))
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("UPDATE {} SET {}", statement.table, assignments);
        let where_clause = Self::build_where_clause(&statement.conditions, &mut values);
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }
        (sql, values)
    }

    pub fn delete(statement: &DeleteStatement) -> (String, Vec<Value>) {
        let mut values = Vec::new();
        let mut sql = format!("DELETE FROM {}", statement.table);
        let where_clause = Self::build_where_clause(&statement.conditions, &mut values);
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }
        (sql, values)
    }
}
