//! Shared fixture builders for constructing test `Row`/`ArrayDataSource`
//! values across the workspace's crates. Grounded on the teacher's
//! `test-utils` crate's role as a small shared testing helper crate.

use esql_datasource::ArrayDataSource;
use esql_ir::{Cell, Row, SqlValue};

/// Builds a [`Row`] from `(name, value)` pairs.
pub fn row(cells: Vec<(&str, SqlValue)>) -> Row {
    let mut r = Row::new();
    for (name, value) in cells {
        r.push(name, Cell::value(value));
    }
    r
}

/// Builds an [`ArrayDataSource`] from a column-name header and row tuples,
/// e.g. `table(&["id", "name"], vec![vec![SqlValue::Int64(1), SqlValue::String("a".into())]])`.
pub fn table(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> ArrayDataSource {
    let rows = rows
        .into_iter()
        .map(|values| {
            let mut r = Row::new();
            for (name, value) in columns.iter().zip(values) {
                r.push(*name, Cell::value(value));
            }
            r
        })
        .collect();
    ArrayDataSource::new(rows)
}

pub async fn cell_value(row: &Row, name: &str) -> SqlValue {
    row.get(name).expect("column present").get().await.expect("cell resolves")
}
