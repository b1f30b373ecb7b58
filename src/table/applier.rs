//! Translates a batch of row edits into per-row DML inside one
//! transaction.

use crate::error::DbError;
use crate::table::types::{CellUpdate, SaveOutcome, SaveRequest, TableChange, TableRef};
use crate::table::TableDataService;

struct BoundStatement {
    sql: String,
    params: Vec<Option<String>>,
}

impl TableDataService {
    /// Applies `request.changes` in order, one statement each, inside a
    /// single transaction.
    ///
    /// All identifiers are quoted through the dialect and every value is
    /// bound, never interpolated. A change that cannot be translated
    /// into a statement is silently skipped. Any statement failure rolls
    /// the whole transaction back and propagates the error unmodified;
    /// a committed save returns the engine-reported tallies, which may be
    /// lower than the number of changes when a locator went stale.
    pub async fn save_changes(&self, request: &SaveRequest) -> Result<SaveOutcome, DbError> {
        let mut outcome = SaveOutcome::default();
        if request.changes.is_empty() || request.columns.is_empty() {
            return Ok(outcome);
        }
        if !self.dialect.supports_row_locator()
            && request
                .changes
                .iter()
                .any(|c| matches!(c, TableChange::Update { .. } | TableChange::Delete { .. }))
        {
            return Err(DbError::Unsupported(
                "dialect has no stable row locator; update/delete edits are not available".into(),
            ));
        }

        let mut tx = self.executor.begin().await?;
        for change in &request.changes {
            let Some(statement) = self.build_statement(&request.table, &request.columns, change)
            else {
                continue;
            };
            match tx.execute(&statement.sql, &statement.params).await {
                Ok(result) => match change {
                    TableChange::Update { .. } => outcome.updated_rows += result.rows_affected,
                    TableChange::Insert { .. } => outcome.inserted_rows += result.rows_affected,
                    TableChange::Delete { .. } => outcome.deleted_rows += result.rows_affected,
                },
                Err(e) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::error!("rollback failed after statement error: {}", rollback_err);
                    }
                    return Err(e);
                }
            }
        }
        tx.commit().await?;
        Ok(outcome)
    }

    fn build_statement(
        &self,
        table: &TableRef,
        columns: &[String],
        change: &TableChange,
    ) -> Option<BoundStatement> {
        match change {
            TableChange::Update { locator, cells } => {
                if locator.is_empty() {
                    return None;
                }
                // duplicate indices: the last occurrence wins
                let cells = dedupe_cells(cells, columns.len(), true);
                if cells.is_empty() {
                    return None;
                }
                let assignments: Vec<String> = cells
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        format!(
                            "{} = {}",
                            self.dialect.quote_identifier(&columns[cell.column_index]),
                            self.dialect.placeholder(i + 1)
                        )
                    })
                    .collect();
                let mut params: Vec<Option<String>> = cells.iter().map(|c| c.param()).collect();
                let sql = format!(
                    "UPDATE {} SET {} WHERE {} = {}",
                    self.qualified_table(table),
                    assignments.join(", "),
                    self.dialect.row_locator_expression(),
                    self.dialect.row_locator_parameter(params.len() + 1)
                );
                params.push(Some(locator.as_str().to_string()));
                Some(BoundStatement { sql, params })
            }
            TableChange::Insert { cells } => {
                // duplicate indices: the first occurrence wins
                let cells = dedupe_cells(cells, columns.len(), false);
                if cells.is_empty() {
                    return None;
                }
                let names: Vec<String> = cells
                    .iter()
                    .map(|c| self.dialect.quote_identifier(&columns[c.column_index]))
                    .collect();
                let placeholders: Vec<String> = (1..=cells.len())
                    .map(|i| self.dialect.placeholder(i))
                    .collect();
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    self.qualified_table(table),
                    names.join(", "),
                    placeholders.join(", ")
                );
                let params = cells.iter().map(|c| c.param()).collect();
                Some(BoundStatement { sql, params })
            }
            TableChange::Delete { locator } => {
                if locator.is_empty() {
                    return None;
                }
                let sql = format!(
                    "DELETE FROM {} WHERE {} = {}",
                    self.qualified_table(table),
                    self.dialect.row_locator_expression(),
                    self.dialect.row_locator_parameter(1)
                );
                Some(BoundStatement {
                    sql,
                    params: vec![Some(locator.as_str().to_string())],
                })
            }
        }
    }
}

/// Drops cells whose index does not resolve against the supplied column
/// list and collapses duplicate indices, keeping first-seen order. With
/// `last_wins` a later duplicate replaces the earlier value (update
/// semantics); otherwise later duplicates are dropped (insert
/// semantics).
fn dedupe_cells(cells: &[CellUpdate], column_count: usize, last_wins: bool) -> Vec<CellUpdate> {
    let mut out: Vec<CellUpdate> = Vec::new();
    for cell in cells.iter().filter(|c| c.column_index < column_count) {
        match out.iter_mut().find(|c| c.column_index == cell.column_index) {
            Some(existing) => {
                if last_wins {
                    *existing = cell.clone();
                }
            }
            None => out.push(cell.clone()),
        }
    }
    out
}
