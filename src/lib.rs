//! Statement-aware SQL editing core.
//!
//! Two load-bearing pieces behind an editor-style database client: a
//! lexical scanner that finds statement boundaries in raw SQL (so "run
//! current statement" works with strings, comments and dollar quotes in
//! play), and a paged table data-edit engine that turns grid edits into
//! transactionally applied DML keyed on an opaque per-row locator.
//!
//! The surrounding application supplies a [`QueryExecutor`] and a
//! [`SqlDialect`]; [`PgExecutor`] and [`PostgresDialect`] are the
//! Postgres implementations.

pub mod dialect;
pub mod error;
pub mod executor;
pub mod postgres;
pub mod resolver;
pub mod scanner;
pub mod schema;
pub mod table;

pub use dialect::{PostgresDialect, SqlDialect};
pub use error::DbError;
pub use executor::{ExecOutcome, QueryExecutor, Transaction};
pub use postgres::PgExecutor;
pub use resolver::{resolve_selection, resolve_whole_document, statement_at_cursor, statements};
pub use scanner::{scan, StatementSegment};
pub use schema::{ColumnInfo, SchemaService, TableInfo};
pub use table::{
    CellUpdate, ColumnDescriptor, PageRequest, RowLocator, SaveOutcome, SaveRequest, SortSpec,
    TableChange, TableDataService, TablePage, TableRef, TableRow,
};
