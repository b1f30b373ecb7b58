//! Query-execution capability consumed by the core.
//!
//! The core is agnostic to transport; it only needs parameterized
//! execution, transactions with real BEGIN/COMMIT/ROLLBACK semantics,
//! and an out-of-band cancel keyed on the connection's backend id.
//! `src/postgres.rs` provides the sqlx-backed implementation.

use async_trait::async_trait;

use crate::error::DbError;

/// Result of a single statement execution.
///
/// `rows` cells are the engine's text rendering, `None` for SQL NULL.
/// `rows_affected` is the engine-reported count for DML; for result-set
/// statements it equals the number of rows returned.
#[derive(Debug, Clone, Default)]
pub struct ExecOutcome {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    pub rows_affected: u64,
}

/// Bound parameter values. `None` binds SQL NULL.
pub type Params = [Option<String>];

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str, params: &Params) -> Result<ExecOutcome, DbError>;

    /// Opens a transaction. Dropping the handle without committing must
    /// roll back and release the underlying connection.
    async fn begin(&self) -> Result<Box<dyn Transaction>, DbError>;

    /// Backend process id of the current connection, captured for the
    /// cancellation side channel.
    async fn backend_pid(&self) -> Result<i32, DbError>;

    /// Requests cancellation of whatever `backend_pid` is running.
    /// Advisory: the in-flight statement may still complete normally.
    async fn cancel(&self, backend_pid: i32) -> Result<bool, DbError>;
}

#[async_trait]
pub trait Transaction: Send {
    async fn execute(&mut self, sql: &str, params: &Params) -> Result<ExecOutcome, DbError>;
    async fn commit(self: Box<Self>) -> Result<(), DbError>;
    async fn rollback(self: Box<Self>) -> Result<(), DbError>;
}
