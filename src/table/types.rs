use serde::{Deserialize, Serialize};

/// A schema-qualified table. Equality is by field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

/// Opaque token for a row's current physical storage position.
///
/// Minted when a page is loaded, consumed by at most one update/delete
/// targeting that row, and invalidated by any write that moves the row.
/// Calling code must never parse or interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLocator(String);

impl RowLocator {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One column of a loaded page; order defines the row value ordering.
/// `data_type` and `enum_values` are best-effort enrichment and may be
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub enum_values: Vec<String>,
}

/// One row of a loaded page. `values` cells are `None` for SQL NULL and
/// always match the page's column count. `locator` is absent when the
/// dialect has no physical row locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub locator: Option<RowLocator>,
    pub values: Vec<Option<String>>,
}

/// One offset-based slice of a table's rows.
///
/// `has_next_page` is derived from fetching one row past the page size,
/// never from a count query. Owned by the caller between load and save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePage {
    pub table: TableRef,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<TableRow>,
    pub page_size: usize,
    pub page_index: usize,
    pub has_next_page: bool,
    pub sort: Option<SortSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    pub table: TableRef,
    pub page_size: usize,
    pub page_index: usize,
    pub sort: Option<SortSpec>,
}

/// One edited cell, addressed by positional index into the column list
/// supplied at save time. `is_null` binds SQL NULL regardless of `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub column_index: usize,
    pub value: String,
    pub is_null: bool,
}

impl CellUpdate {
    pub fn set(column_index: usize, value: impl Into<String>) -> Self {
        Self {
            column_index,
            value: value.into(),
            is_null: false,
        }
    }

    pub fn set_null(column_index: usize) -> Self {
        Self {
            column_index,
            value: String::new(),
            is_null: true,
        }
    }

    /// The value as a bound parameter; `None` binds SQL NULL.
    pub(crate) fn param(&self) -> Option<String> {
        if self.is_null {
            None
        } else {
            Some(self.value.clone())
        }
    }
}

/// One row-level edit captured against a previously loaded page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableChange {
    Update {
        locator: RowLocator,
        cells: Vec<CellUpdate>,
    },
    Insert {
        cells: Vec<CellUpdate>,
    },
    Delete {
        locator: RowLocator,
    },
}

/// A batch of edits plus the column list the page was loaded with.
///
/// Columns are re-supplied on every save because the applier retains no
/// page state; cell indices resolve against this list and must match the
/// list the edits were captured against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub changes: Vec<TableChange>,
}

/// Engine-reported affected-row tallies for a committed save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub updated_rows: u64,
    pub inserted_rows: u64,
    pub deleted_rows: u64,
}
