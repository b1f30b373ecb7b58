//! sqlx-backed Postgres implementation of the executor capability.

use std::sync::Arc;
use std::time::Duration;

use async_lock::RwLock;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgDatabaseError, PgErrorPosition, PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Postgres, Row, TypeInfo, ValueRef};

use crate::error::DbError;
use crate::executor::{ExecOutcome, Params, QueryExecutor, Transaction};

/// SQLSTATE for "canceling statement due to user request".
const QUERY_CANCELED: &str = "57014";

/// Pooled Postgres connection manager plus the `QueryExecutor`
/// implementation on top of it.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: Arc<RwLock<Option<PgPool>>>,
}

impl PgExecutor {
    pub fn new() -> Self {
        Self {
            pool: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn connect_with_options(&self, options: PgConnectOptions) -> anyhow::Result<()> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await;

        match pool {
            Ok(p) => {
                let mut pool_guard = self.pool.write().await;
                *pool_guard = Some(p);
                Ok(())
            }
            Err(e) => {
                tracing::error!("error connecting: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn disconnect(&self) -> anyhow::Result<()> {
        let mut pool_guard = self.pool.write().await;
        if let Some(pool) = pool_guard.take() {
            pool.close().await;
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "no active database connection to disconnect"
            ))
        }
    }

    pub async fn is_connected(&self) -> bool {
        let pool_guard = self.pool.read().await;
        if let Some(pool) = pool_guard.as_ref() {
            sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
        } else {
            false
        }
    }

    async fn pool(&self) -> Result<PgPool, DbError> {
        let pool_guard = self.pool.read().await;
        pool_guard.as_ref().cloned().ok_or(DbError::NotConnected)
    }
}

impl Default for PgExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn execute(&self, sql: &str, params: &Params) -> Result<ExecOutcome, DbError> {
        let pool = self.pool().await?;
        let query = bind_params(sqlx::query(sql), params);

        if is_result_set_query(sql) {
            let rows = query.fetch_all(&pool).await.map_err(db_error)?;
            Ok(outcome_from_rows(&rows))
        } else {
            let result = query.execute(&pool).await.map_err(db_error)?;
            Ok(ExecOutcome {
                rows_affected: result.rows_affected(),
                ..ExecOutcome::default()
            })
        }
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, DbError> {
        let pool = self.pool().await?;
        let tx = pool.begin().await.map_err(db_error)?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn backend_pid(&self) -> Result<i32, DbError> {
        let pool = self.pool().await?;
        let row = sqlx::query("SELECT pg_backend_pid()")
            .fetch_one(&pool)
            .await
            .map_err(db_error)?;
        row.try_get(0).map_err(db_error)
    }

    async fn cancel(&self, backend_pid: i32) -> Result<bool, DbError> {
        let pool = self.pool().await?;
        let row = sqlx::query("SELECT pg_cancel_backend($1)")
            .bind(backend_pid)
            .fetch_one(&pool)
            .await
            .map_err(db_error)?;
        row.try_get(0).map_err(db_error)
    }
}

struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn execute(&mut self, sql: &str, params: &Params) -> Result<ExecOutcome, DbError> {
        let query = bind_params(sqlx::query(sql), params);
        if is_result_set_query(sql) {
            let rows = query.fetch_all(&mut *self.tx).await.map_err(db_error)?;
            Ok(outcome_from_rows(&rows))
        } else {
            let result = query.execute(&mut *self.tx).await.map_err(db_error)?;
            Ok(ExecOutcome {
                rows_affected: result.rows_affected(),
                ..ExecOutcome::default()
            })
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        self.tx.commit().await.map_err(db_error)
    }

    // Dropping a sqlx transaction also rolls back, so the connection is
    // released on every exit path.
    async fn rollback(self: Box<Self>) -> Result<(), DbError> {
        self.tx.rollback().await.map_err(db_error)
    }
}

fn bind_params<'q>(
    query: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    params: &'q Params,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    let mut query = query;
    for param in params {
        query = query.bind(param.as_deref());
    }
    query
}

fn is_result_set_query(sql: &str) -> bool {
    let lower = sql.trim_start().to_lowercase();
    lower.starts_with("select") || lower.starts_with("with") || lower.starts_with("show")
}

fn outcome_from_rows(rows: &[PgRow]) -> ExecOutcome {
    let columns = match rows.first() {
        Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
        None => Vec::new(),
    };
    let converted: Vec<Vec<Option<String>>> = rows
        .iter()
        .map(|row| (0..row.columns().len()).map(|i| cell_value(row, i)).collect())
        .collect();
    ExecOutcome {
        columns,
        rows_affected: converted.len() as u64,
        rows: converted,
    }
}

fn cell_value(row: &PgRow, index: usize) -> Option<String> {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => None,
        Ok(_) => decode_cell(row, index),
        Err(_) => None,
    }
}

/// Text rendering first; Postgres converts most types to text. Typed
/// fallbacks for the common numeric types that refuse the text path.
fn decode_cell(row: &PgRow, index: usize) -> Option<String> {
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Some(v);
    }

    match row.column(index).type_info().name() {
        "BOOL" => row.try_get::<bool, _>(index).ok().map(|v| v.to_string()),
        "INT2" | "INT4" => row.try_get::<i32, _>(index).ok().map(|v| v.to_string()),
        "INT8" => row.try_get::<i64, _>(index).ok().map(|v| v.to_string()),
        "FLOAT4" => row.try_get::<f32, _>(index).ok().map(|v| v.to_string()),
        "FLOAT8" => row.try_get::<f64, _>(index).ok().map(|v| v.to_string()),
        "NUMERIC" => row
            .try_get::<rust_decimal::Decimal, _>(index)
            .ok()
            .map(|v| v.to_string()),
        _ => None,
    }
}

fn db_error(e: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(db) = &e {
        let code = db.code().map(|c| c.to_string());
        if code.as_deref() == Some(QUERY_CANCELED) {
            return DbError::Cancelled;
        }
        let pg = db.try_downcast_ref::<PgDatabaseError>();
        return DbError::Query {
            message: db.message().to_string(),
            detail: pg.and_then(|p| p.detail().map(str::to_string)),
            code,
            position: pg.and_then(|p| match p.position() {
                Some(PgErrorPosition::Original(n)) => Some(n),
                _ => None,
            }),
        };
    }
    DbError::query(e.to_string())
}
