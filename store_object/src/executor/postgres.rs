//! PostgreSQL executor backed by a `sqlx` pool
//!
//! Rows come back as JSON objects built by `row_to_json`, so the executor
//! does not need to know column types.

use crate::errors::StoreError;
use crate::executor::statement::{
    DeleteStatement, InsertStatement, Row, SelectStatement, UpdateStatement,
};
use crate::executor::DatabaseExecutor;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPool};
use sqlx::query::Query;
use sqlx::{Postgres, Row as _};

// Shared parameter binding logic
macro_rules! bind_json_param {
    ($query:expr, $param:expr) => {
        match $param {
            Value::String(s) => {
                // Try to parse as RFC3339 timestamp first
                if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                    $query.bind(dt.with_timezone(&chrono::Utc))
                // Try to parse as UUID
                } else if let Ok(uuid) = uuid::Uuid::parse_str(&s) {
                    $query.bind(uuid)
                } else {
                    $query.bind(s)
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        $query.bind(i as i32)
                    } else {
                        $query.bind(i)
                    }
                } else if let Some(f) = n.as_f64() {
                    $query.bind(f)
                } else {
                    $query.bind(n.to_string())
                }
            }
            Value::Bool(b) => $query.bind(b),
            Value::Null => $query.bind(Option::<String>::None),
            other => $query.bind(other.to_string()),
        }
    };
}

#[derive(Clone)]
pub struct PgExecutor {
    db_pool: PgPool,
}

impl std::fmt::Debug for PgExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgExecutor")
            .field("pool_size", &self.db_pool.size())
            .finish()
    }
}

impl PgExecutor {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db_pool
    }

    fn bind_params<'q>(
        mut query: Query<'q, Postgres, PgArguments>,
        params: Vec<Value>,
    ) -> Query<'q, Postgres, PgArguments> {
        for param in params {
            query = bind_json_param!(query, param);
        }
        query
    }

    fn decode_row(table: &str, row: &sqlx::postgres::PgRow) -> Result<Row, StoreError> {
        let value: Value = row
            .try_get("row")
            .map_err(|e| StoreError::database_operation(table, "decode", e))?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Execution(format!(
                "expected a JSON object row from {}, got {}",
                table, other
            ))),
        }
    }
}

#[async_trait]
impl DatabaseExecutor for PgExecutor {
    async fn fetch_all(&self, statement: &SelectStatement) -> Result<Vec<Row>, StoreError> {
        let (sql, params) = statement.to_sql();
        let full_sql = format!(
            "SELECT row_to_json(store_rows)::jsonb AS row FROM ({}) AS store_rows",
            sql
        );
        tracing::debug!("[FETCH] Table: {}, SQL: {}", statement.table, full_sql);

        let rows = Self::bind_params(sqlx::query(&full_sql), params)
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| StoreError::database_operation(&statement.table, "fetch", e))?;

        rows.iter()
            .map(|row| Self::decode_row(&statement.table, row))
            .collect()
    }

    async fn fetch_count(&self, statement: &SelectStatement) -> Result<i64, StoreError> {
        let (sql, params) = statement.to_count_sql();
        tracing::debug!("[COUNT] Table: {}, SQL: {}", statement.table, sql);

        let row = Self::bind_params(sqlx::query(&sql), params)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| StoreError::database_operation(&statement.table, "count", e))?;

        row.try_get::<i64, _>("total")
            .map_err(|e| StoreError::database_operation(&statement.table, "count", e))
    }

    async fn insert(&self, statement: &InsertStatement) -> Result<Row, StoreError> {
        let (sql, params) = statement.to_sql();
        let full_sql = format!(
            "WITH inserted AS ({} RETURNING *) SELECT row_to_json(inserted)::jsonb AS row FROM inserted",
            sql
        );
        tracing::debug!("[INSERT] Table: {}, SQL: {}", statement.table, full_sql);

        let row = Self::bind_params(sqlx::query(&full_sql), params)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| StoreError::database_operation(&statement.table, "insert", e))?;

        Self::decode_row(&statement.table, &row)
    }

    async fn update(&self, statement: &UpdateStatement) -> Result<u64, StoreError> {
        let (sql, params) = statement.to_sql();
        tracing::debug!("[UPDATE] Table: {}, SQL: {}", statement.table, sql);

        let result = Self::bind_params(sqlx::query(&sql), params)
            .execute(&self.db_pool)
            .await
            .map_err(|e| StoreError::database_operation(&statement.table, "update", e))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, statement: &DeleteStatement) -> Result<u64, StoreError> {
        let (sql, params) = statement.to_sql();
        tracing::debug!("[DELETE] Table: {}, SQL: {}", statement.table, sql);

        let result = Self::bind_params(sqlx::query(&sql), params)
            .execute(&self.db_pool)
            .await
            .map_err(|e| StoreError::database_operation(&statement.table, "delete", e))?;

        Ok(result.rows_affected())
    }
}
