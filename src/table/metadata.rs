//! Best-effort column metadata for a loaded page.
//!
//! Both lookups are strictly cosmetic enrichment: a failure degrades to
//! empty values and never blocks the page load.

use std::collections::HashMap;

use crate::executor::QueryExecutor;
use crate::table::TableRef;

/// Column name -> data type string, empty on lookup failure.
pub(crate) async fn column_types(
    executor: &dyn QueryExecutor,
    table: &TableRef,
) -> HashMap<String, String> {
    let sql = r#"
        SELECT column_name, data_type
        FROM information_schema.columns
        WHERE table_schema = $1 AND table_name = $2
        ORDER BY ordinal_position
    "#;

    let params = [Some(table.schema.clone()), Some(table.name.clone())];
    match executor.execute(sql, &params).await {
        Ok(outcome) => outcome
            .rows
            .into_iter()
            .filter_map(|row| match (row.first().cloned(), row.get(1).cloned()) {
                (Some(Some(name)), Some(Some(data_type))) => Some((name, data_type)),
                _ => None,
            })
            .collect(),
        Err(e) => {
            tracing::debug!("column type lookup failed for {}.{}: {}", table.schema, table.name, e);
            HashMap::new()
        }
    }
}

/// Column name -> ordered enum labels, for columns backed by an
/// enumerated type. Empty on lookup failure.
pub(crate) async fn enum_labels(
    executor: &dyn QueryExecutor,
    table: &TableRef,
) -> HashMap<String, Vec<String>> {
    let sql = r#"
        SELECT a.attname, e.enumlabel
        FROM pg_attribute a
        JOIN pg_class c ON c.oid = a.attrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_type t ON t.oid = a.atttypid
        JOIN pg_enum e ON e.enumtypid = t.oid
        WHERE n.nspname = $1 AND c.relname = $2
        ORDER BY a.attnum, e.enumsortorder
    "#;

    let params = [Some(table.schema.clone()), Some(table.name.clone())];
    match executor.execute(sql, &params).await {
        Ok(outcome) => {
            let mut labels: HashMap<String, Vec<String>> = HashMap::new();
            for row in outcome.rows {
                if let (Some(Some(column)), Some(Some(label))) =
                    (row.first().cloned(), row.get(1).cloned())
                {
                    labels.entry(column).or_default().push(label);
                }
            }
            labels
        }
        Err(e) => {
            tracing::debug!("enum label lookup failed for {}.{}: {}", table.schema, table.name, e);
            HashMap::new()
        }
    }
}
