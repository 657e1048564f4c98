//! Base table scan: reads from a `DataSource`, validates its scan
//! contract, and exposes every column twice — once bare, once qualified
//! as `alias.column` — so both unqualified and qualified references
//! resolve later without the evaluator needing table-membership
//! knowledge.

use async_trait::async_trait;
use esql_datasource::{validate_scan_contract, DataSource, ScanOptions};
use esql_ir::{Cell, ExecutionError, ExecutionResult, Row, ScanHints};

use crate::context::ExecContext;
use crate::stream::{check_cancelled, RowStream, VecStream};

pub async fn scan_rows(
    table: &str,
    alias: &str,
    hints: &ScanHints,
    ctx: &ExecContext,
) -> ExecutionResult<Vec<Row>> {
    let (rows, _) = scan_rows_with_meta(table, alias, hints, ctx).await?;
    Ok(rows)
}

/// Like [`scan_rows`], but also reports whether the source actually
/// applied the `limit`/`offset` hint, so a caller wrapping the scan
/// directly in a `Limit` operator can tell whether re-slicing is needed.
async fn scan_rows_with_meta(
    table: &str,
    alias: &str,
    hints: &ScanHints,
    ctx: &ExecContext,
) -> ExecutionResult<(Vec<Row>, bool)> {
    let source = ctx
        .tables
        .get(alias)
        .or_else(|| ctx.tables.get(table))
        .ok_or_else(|| ExecutionError::TableNotFound(table.to_string()))?;

    let options = ScanOptions {
        columns: &hints.columns,
        where_predicate: hints.where_predicate.as_ref(),
        limit: hints.limit,
        offset: hints.offset,
    };
    let result = source
        .scan(options.clone())
        .await
        .map_err(|e| ExecutionError::DataSource(e.to_string()))?;
    validate_scan_contract(&options, &result).map_err(|e| ExecutionError::DataSource(e.to_string()))?;
    tracing::trace!(table, alias, rows = result.rows.len(), "scanned table");
    let limit_already_applied =
        result.applied_limit_offset && (hints.limit.is_some() || hints.offset.is_some());

    let mut out = Vec::with_capacity(result.rows.len());
    for source_row in result.rows {
        out.push(requalify(source_row, alias));
    }
    Ok((out, limit_already_applied))
}

/// Rewrites a source-native row (bare column names only) into the
/// bare-plus-qualified shape every downstream operator expects.
fn requalify(source_row: Row, alias: &str) -> Row {
    let mut out = Row::new();
    for (name, cell) in source_row.iter() {
        out.push(name.to_string(), cell.clone());
        out.push(format!("{alias}.{name}"), cell.clone());
    }
    out
}

pub struct ScanStream {
    rows: std::vec::IntoIter<Row>,
    limit_already_applied: bool,
}

impl ScanStream {
    pub async fn build(table: &str, alias: &str, hints: &ScanHints, ctx: &ExecContext) -> ExecutionResult<Self> {
        let (rows, limit_already_applied) = scan_rows_with_meta(table, alias, hints, ctx).await?;
        Ok(Self { rows: rows.into_iter(), limit_already_applied })
    }
}

#[async_trait]
impl RowStream for ScanStream {
    async fn next(&mut self) -> ExecutionResult<Option<Row>> {
        Ok(self.rows.next())
    }

    fn limit_already_applied(&self) -> bool {
        self.limit_already_applied
    }
}

/// `COUNT(*)` fast path: prefers `DataSource::num_rows`, falling back to a
/// full scan only when the source cannot answer the count directly.
pub async fn count_stream(table: &str, alias: &str, columns: &[String], ctx: &ExecContext) -> ExecutionResult<Box<dyn RowStream>> {
    check_cancelled(&ctx.cancel)?;
    let source = ctx
        .tables
        .get(alias)
        .or_else(|| ctx.tables.get(table))
        .ok_or_else(|| ExecutionError::TableNotFound(table.to_string()))?;
    let n = match source.num_rows() {
        Some(n) => n as i64,
        None => {
            let hints = ScanHints::default();
            scan_rows(table, alias, &hints, ctx).await?.len() as i64
        }
    };
    let label = columns.first().cloned().unwrap_or_else(|| "COUNT(*)".to_string());
    let mut row = Row::new();
    row.push(label, Cell::value(esql_ir::SqlValue::Int64(n)));
    Ok(Box::new(VecStream::new(vec![row])))
}
