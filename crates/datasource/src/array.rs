//! In-memory array adapter. Grounded on `catalog/src/static.rs`'s
//! `StaticCatalog` role ("used for the playground and testing"), except
//! here it doubles as the production adapter for in-process arrays (the
//! spec's "arrays are adapted to a trivial DataSource").

use async_trait::async_trait;
use esql_ir::Row;

use crate::error::DataSourceResult;
use crate::scan::{ScanOptions, ScanResult};
use crate::DataSource;

#[derive(Debug, Clone, Default)]
pub struct ArrayDataSource {
    rows: Vec<Row>,
}

impl ArrayDataSource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl DataSource for ArrayDataSource {
    async fn scan(&self, options: ScanOptions<'_>) -> DataSourceResult<ScanResult> {
        let _ = options;
        // The array source never pushes anything down: it always returns
        // every row and lets the executor apply where/limit/offset. This
        // makes it the reference "naive source" the spec's pushdown
        // equivalence property is checked against.
        Ok(ScanResult::new(self.rows.clone()))
    }

    fn num_rows(&self) -> Option<u64> {
        Some(self.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esql_ir::{Cell, SqlValue};

    fn row(id: i64) -> Row {
        let mut r = Row::new();
        r.push("id", Cell::value(SqlValue::Int64(id)));
        r
    }

    #[tokio::test]
    async fn scan_returns_all_rows_unfiltered() {
        let src = ArrayDataSource::new(vec![row(1), row(2), row(3)]);
        let result = src.scan(ScanOptions::default()).await.unwrap();
        assert_eq!(result.rows.len(), 3);
        assert!(!result.applied_where);
        assert!(!result.applied_limit_offset);
    }

    #[tokio::test]
    async fn num_rows_matches_len() {
        let src = ArrayDataSource::new(vec![row(1), row(2)]);
        assert_eq!(src.num_rows(), Some(2));
    }
}
