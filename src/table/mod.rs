//! Paged table reads and transactional row edits.

mod applier;
mod loader;
mod metadata;
mod types;

pub use types::{
    CellUpdate, ColumnDescriptor, PageRequest, RowLocator, SaveOutcome, SaveRequest, SortSpec,
    TableChange, TablePage, TableRef, TableRow,
};

use std::sync::Arc;

use crate::dialect::SqlDialect;
use crate::executor::QueryExecutor;

/// Loads pages of table data and applies batches of row edits.
///
/// Holds no page state between calls: every save re-supplies the column
/// list and row locators, because the server side may have changed since
/// the page was loaded.
#[derive(Clone)]
pub struct TableDataService {
    pub(crate) executor: Arc<dyn QueryExecutor>,
    pub(crate) dialect: Arc<dyn SqlDialect>,
}

impl TableDataService {
    pub fn new(executor: Arc<dyn QueryExecutor>, dialect: Arc<dyn SqlDialect>) -> Self {
        Self { executor, dialect }
    }

    pub(crate) fn qualified_table(&self, table: &TableRef) -> String {
        format!(
            "{}.{}",
            self.dialect.quote_identifier(&table.schema),
            self.dialect.quote_identifier(&table.name)
        )
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted in-memory executor for loader/applier tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::error::DbError;
    use crate::executor::{ExecOutcome, Params, QueryExecutor, Transaction};

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub sql: String,
        pub params: Vec<Option<String>>,
    }

    /// Pool-level fake. Responses are routed by SQL shape so the two
    /// concurrent metadata lookups stay deterministic regardless of
    /// completion order.
    #[derive(Default)]
    pub struct FakeExecutor {
        pub calls: Mutex<Vec<RecordedCall>>,
        pub page_response: Mutex<Option<Result<ExecOutcome, DbError>>>,
        pub types_response: Mutex<Option<Result<ExecOutcome, DbError>>>,
        pub enums_response: Mutex<Option<Result<ExecOutcome, DbError>>>,
        pub tx: Arc<Mutex<TxState>>,
    }

    #[derive(Default)]
    pub struct TxState {
        pub statements: Vec<RecordedCall>,
        pub responses: VecDeque<Result<ExecOutcome, DbError>>,
        pub committed: bool,
        pub rolled_back: bool,
    }

    impl FakeExecutor {
        pub fn with_page(outcome: ExecOutcome) -> Self {
            let fake = Self::default();
            *fake.page_response.lock().unwrap() = Some(Ok(outcome));
            fake
        }

        pub fn recorded(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn push_tx_response(&self, response: Result<ExecOutcome, DbError>) {
            self.tx.lock().unwrap().responses.push_back(response);
        }

        pub fn affected(n: u64) -> ExecOutcome {
            ExecOutcome {
                rows_affected: n,
                ..ExecOutcome::default()
            }
        }
    }

    pub fn result_set(columns: &[&str], rows: Vec<Vec<Option<String>>>) -> ExecOutcome {
        ExecOutcome {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows_affected: rows.len() as u64,
            rows,
        }
    }

    #[async_trait]
    impl QueryExecutor for FakeExecutor {
        async fn execute(&self, sql: &str, params: &Params) -> Result<ExecOutcome, DbError> {
            self.calls.lock().unwrap().push(RecordedCall {
                sql: sql.to_string(),
                params: params.to_vec(),
            });
            let slot = if sql.contains("information_schema.columns") {
                &self.types_response
            } else if sql.contains("pg_enum") {
                &self.enums_response
            } else {
                &self.page_response
            };
            slot.lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(ExecOutcome::default()))
        }

        async fn begin(&self) -> Result<Box<dyn Transaction>, DbError> {
            Ok(Box::new(FakeTransaction {
                state: Arc::clone(&self.tx),
            }))
        }

        async fn backend_pid(&self) -> Result<i32, DbError> {
            Ok(4242)
        }

        async fn cancel(&self, _backend_pid: i32) -> Result<bool, DbError> {
            Ok(true)
        }
    }

    pub struct FakeTransaction {
        state: Arc<Mutex<TxState>>,
    }

    #[async_trait]
    impl Transaction for FakeTransaction {
        async fn execute(&mut self, sql: &str, params: &Params) -> Result<ExecOutcome, DbError> {
            let mut state = self.state.lock().unwrap();
            state.statements.push(RecordedCall {
                sql: sql.to_string(),
                params: params.to_vec(),
            });
            state
                .responses
                .pop_front()
                .unwrap_or_else(|| Ok(FakeExecutor::affected(1)))
        }

        async fn commit(self: Box<Self>) -> Result<(), DbError> {
            self.state.lock().unwrap().committed = true;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), DbError> {
            self.state.lock().unwrap().rolled_back = true;
            Ok(())
        }
    }
}
