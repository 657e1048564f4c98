//! `DISTINCT`. Materializes and deduplicates by each row's `stringify_key`
//! tuple, preserving first-occurrence order.

use std::collections::HashSet;

use esql_ir::{ExecutionResult, Row};

use crate::context::ExecContext;
use crate::stream::{drain, RowStream};

pub async fn distinct_rows(input: Box<dyn RowStream>, ctx: &ExecContext) -> ExecutionResult<Vec<Row>> {
    let mut input = input;
    let rows = drain(input.as_mut(), &ctx.cancel).await?;

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in rows {
        let resolved = row.resolve_all().await?;
        let key: Vec<String> = resolved.iter().map(|(_, v)| v.stringify_key()).collect();
        if seen.insert(key) {
            out.push(row);
        }
    }
    Ok(out)
}
