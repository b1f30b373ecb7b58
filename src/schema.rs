//! Schema browsing: the table and column listings a tree view is built
//! from.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DbError;
use crate::executor::QueryExecutor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table_name: String,
    pub table_schema: String,
    pub table_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub column_default: Option<String>,
    pub ordinal_position: usize,
}

#[derive(Clone)]
pub struct SchemaService {
    executor: Arc<dyn QueryExecutor>,
}

impl SchemaService {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// All user tables and views, system schemas excluded.
    pub async fn list_tables(&self) -> Result<Vec<TableInfo>, DbError> {
        let sql = r#"
            SELECT table_name, table_schema, table_type
            FROM information_schema.tables
            WHERE table_schema NOT IN ('information_schema', 'pg_catalog')
            ORDER BY table_schema, table_name
        "#;

        let outcome = self.executor.execute(sql, &[]).await?;
        Ok(outcome
            .rows
            .into_iter()
            .filter_map(|row| {
                Some(TableInfo {
                    table_name: row.first().cloned().flatten()?,
                    table_schema: row.get(1).cloned().flatten()?,
                    table_type: row.get(2).cloned().flatten()?,
                })
            })
            .collect())
    }

    /// Columns of one table in ordinal order.
    pub async fn table_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnInfo>, DbError> {
        let sql = r#"
            SELECT column_name, data_type, is_nullable, column_default, ordinal_position
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
        "#;

        let params = [Some(schema.to_string()), Some(table.to_string())];
        let outcome = self.executor.execute(sql, &params).await?;
        Ok(outcome
            .rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, row)| {
                Some(ColumnInfo {
                    column_name: row.first().cloned().flatten()?,
                    data_type: row.get(1).cloned().flatten()?,
                    is_nullable: row.get(2).cloned().flatten()? == "YES",
                    column_default: row.get(3).cloned().flatten(),
                    ordinal_position: row
                        .get(4)
                        .cloned()
                        .flatten()
                        .and_then(|p| p.parse().ok())
                        .unwrap_or(i + 1),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::fake::{result_set, FakeExecutor};

    #[test]
    fn list_tables_maps_rows_and_excludes_nothing_client_side() {
        smol::block_on(async {
            let fake = FakeExecutor::default();
            *fake.page_response.lock().unwrap() = Some(Ok(result_set(
                &["table_name", "table_schema", "table_type"],
                vec![
                    vec![Some("users".into()), Some("public".into()), Some("BASE TABLE".into())],
                    vec![Some("v_users".into()), Some("public".into()), Some("VIEW".into())],
                ],
            )));
            let executor = Arc::new(fake);
            let service = SchemaService::new(executor.clone());

            let tables = service.list_tables().await.unwrap();
            assert_eq!(tables.len(), 2);
            assert_eq!(tables[0].table_name, "users");
            assert_eq!(tables[1].table_type, "VIEW");

            // filtering happens in the query, not in code
            let sql = &executor.recorded()[0].sql;
            assert!(sql.contains("NOT IN ('information_schema', 'pg_catalog')"));
        });
    }

    #[test]
    fn table_columns_parses_nullability_and_ordinals() {
        smol::block_on(async {
            let fake = FakeExecutor::default();
            *fake.types_response.lock().unwrap() = Some(Ok(result_set(
                &["column_name", "data_type", "is_nullable", "column_default", "ordinal_position"],
                vec![
                    vec![
                        Some("id".into()),
                        Some("integer".into()),
                        Some("NO".into()),
                        Some("nextval('users_id_seq')".into()),
                        Some("1".into()),
                    ],
                    vec![
                        Some("name".into()),
                        Some("text".into()),
                        Some("YES".into()),
                        None,
                        Some("2".into()),
                    ],
                ],
            )));
            let service = SchemaService::new(Arc::new(fake));

            let columns = service.table_columns("public", "users").await.unwrap();
            assert_eq!(columns.len(), 2);
            assert!(!columns[0].is_nullable);
            assert!(columns[1].is_nullable);
            assert_eq!(columns[1].column_default, None);
            assert_eq!(columns[1].ordinal_position, 2);
        });
    }
}
