//! Paged, optionally sorted reads of one table.

use crate::error::DbError;
use crate::table::metadata;
use crate::table::types::{ColumnDescriptor, PageRequest, RowLocator, TablePage, TableRow};
use crate::table::TableDataService;

/// Synthetic alias for the locator column; stripped from the exposed
/// column list before the page is handed back.
const LOCATOR_ALIAS: &str = "__row_locator";

impl TableDataService {
    /// Loads one page of `request.table`.
    ///
    /// Issues a single query for `page_size + 1` rows; the surplus row
    /// only drives `has_next_page` and is trimmed off. `SELECT *` keeps
    /// the exposed column order equal to the table's ordinal column
    /// order. Column types and enum labels are fetched afterwards, the
    /// two lookups running concurrently with each other, and degrade to
    /// empty values on failure.
    pub async fn load_page(&self, request: &PageRequest) -> Result<TablePage, DbError> {
        let with_locator = self.dialect.supports_row_locator();
        let sql = self.page_query(request, with_locator);
        let outcome = self.executor.execute(&sql, &[]).await?;

        let locator_index = outcome.columns.iter().position(|c| c == LOCATOR_ALIAS);
        let names: Vec<String> = outcome
            .columns
            .into_iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != locator_index)
            .map(|(_, name)| name)
            .collect();

        let raw_count = outcome.rows.len();
        let rows: Vec<TableRow> = outcome
            .rows
            .into_iter()
            .take(request.page_size)
            .map(|mut values| {
                let locator = locator_index.and_then(|i| {
                    if i < values.len() {
                        values.remove(i).map(RowLocator::new)
                    } else {
                        None
                    }
                });
                TableRow { locator, values }
            })
            .collect();

        let (types, enums) = futures::join!(
            metadata::column_types(self.executor.as_ref(), &request.table),
            metadata::enum_labels(self.executor.as_ref(), &request.table),
        );

        let columns = names
            .into_iter()
            .map(|name| ColumnDescriptor {
                data_type: types.get(&name).cloned().unwrap_or_default(),
                enum_values: enums.get(&name).cloned().unwrap_or_default(),
                name,
            })
            .collect();

        Ok(TablePage {
            table: request.table.clone(),
            columns,
            rows,
            page_size: request.page_size,
            page_index: request.page_index,
            has_next_page: raw_count > request.page_size,
            sort: request.sort.clone(),
        })
    }

    fn page_query(&self, request: &PageRequest, with_locator: bool) -> String {
        let mut sql = String::from("SELECT *");
        if with_locator {
            sql.push_str(&format!(
                ", {} AS {}",
                self.dialect.row_locator_select_expression(),
                self.dialect.quote_identifier(LOCATOR_ALIAS)
            ));
        }
        sql.push_str(&format!(" FROM {}", self.qualified_table(&request.table)));

        let mut order = Vec::new();
        if let Some(sort) = &request.sort {
            order.push(format!(
                "{} {}",
                self.dialect.quote_identifier(&sort.column),
                if sort.descending { "DESC" } else { "ASC" }
            ));
        }
        if with_locator {
            // stable tiebreak so paging never reorders between requests
            order.push(self.dialect.row_locator_expression());
        }
        if !order.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
        }

        sql.push_str(&format!(
            " LIMIT {} OFFSET {}",
            request.page_size + 1,
            request.page_index * request.page_size
        ));
        sql
    }
}
