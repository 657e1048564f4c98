//! Join operators. All three materialize both sides before emitting —
//! simplest correct implementation of the join row-merge rule (`Row::merge`)
//! and its LEFT/RIGHT/FULL NULL-padding, at the cost of true row-at-a-time
//! laziness for the join step itself. Every other operator in the tree
//! stays pull-based.

use std::collections::{HashMap, HashSet};

use esql_ir::{Cell, ExecutionResult, Expr, JoinType, Row, SqlValue};

use crate::context::ExecContext;
use crate::eval::eval_expr;
use crate::stream::{drain, RowStream};

async fn materialize(mut stream: Box<dyn RowStream>, ctx: &ExecContext) -> ExecutionResult<Vec<Row>> {
    drain(stream.as_mut(), &ctx.cancel).await
}

/// Builds a NULL-valued row with the same column names as `template`,
/// used to pad the unmatched side of an outer join.
fn null_padding(template: &Row) -> Row {
    let mut out = Row::new();
    for name in template.names() {
        out.push(name.to_string(), Cell::value(SqlValue::Null));
    }
    out
}

pub async fn hash_join_rows(
    left: Box<dyn RowStream>,
    right: Box<dyn RowStream>,
    left_key: &Expr,
    right_key: &Expr,
    join_type: JoinType,
    ctx: &ExecContext,
) -> ExecutionResult<Vec<Row>> {
    let left_rows = materialize(left, ctx).await?;
    let right_rows = materialize(right, ctx).await?;

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in right_rows.iter().enumerate() {
        let key = eval_expr(right_key, row, ctx).await?;
        if key.is_null() {
            continue;
        }
        index.entry(key.stringify_key()).or_default().push(i);
    }
    tracing::trace!(buckets = index.len(), build_side_rows = right_rows.len(), "built hash join index");

    let right_template = right_rows.first().map(null_padding);
    let left_template = left_rows.first().map(null_padding);
    let mut matched_right = HashSet::new();
    let mut out = Vec::new();

    for left_row in &left_rows {
        let key = eval_expr(left_key, left_row, ctx).await?;
        let matches = if key.is_null() { Vec::new() } else { index.get(&key.stringify_key()).cloned().unwrap_or_default() };
        if matches.is_empty() {
            if matches!(join_type, JoinType::Left | JoinType::Full) {
                let padding = right_template.clone().unwrap_or_default();
                out.push(left_row.clone().merge(padding));
            }
            continue;
        }
        for idx in matches {
            matched_right.insert(idx);
            out.push(left_row.clone().merge(right_rows[idx].clone()));
        }
    }

    if matches!(join_type, JoinType::Right | JoinType::Full) {
        for (i, right_row) in right_rows.iter().enumerate() {
            if matched_right.contains(&i) {
                continue;
            }
            let padding = left_template.clone().unwrap_or_default();
            out.push(padding.merge(right_row.clone()));
        }
    }

    Ok(out)
}

pub async fn nested_loop_join_rows(
    left: Box<dyn RowStream>,
    right: Box<dyn RowStream>,
    condition: &Expr,
    join_type: JoinType,
    ctx: &ExecContext,
) -> ExecutionResult<Vec<Row>> {
    let left_rows = materialize(left, ctx).await?;
    let right_rows = materialize(right, ctx).await?;

    let right_template = right_rows.first().map(null_padding);
    let left_template = left_rows.first().map(null_padding);
    let mut matched_right = vec![false; right_rows.len()];
    let mut out = Vec::new();

    for left_row in &left_rows {
        let mut any_match = false;
        for (i, right_row) in right_rows.iter().enumerate() {
            let merged = left_row.clone().merge(right_row.clone());
            let cond = eval_expr(condition, &merged, ctx).await?;
            if cond.is_truthy() {
                any_match = true;
                matched_right[i] = true;
                out.push(merged);
            }
        }
        if !any_match && matches!(join_type, JoinType::Left | JoinType::Full) {
            let padding = right_template.clone().unwrap_or_default();
            out.push(left_row.clone().merge(padding));
        }
    }

    if matches!(join_type, JoinType::Right | JoinType::Full) {
        for (i, right_row) in right_rows.iter().enumerate() {
            if matched_right[i] {
                continue;
            }
            let padding = left_template.clone().unwrap_or_default();
            out.push(padding.merge(right_row.clone()));
        }
    }

    Ok(out)
}

/// `POSITIONAL JOIN`: advances both inputs in lockstep and stops at the
/// shorter side — no `ON` condition, no NULL-padding for the leftover tail
/// of the longer side.
pub async fn positional_join_rows(left: Box<dyn RowStream>, right: Box<dyn RowStream>, ctx: &ExecContext) -> ExecutionResult<Vec<Row>> {
    let left_rows = materialize(left, ctx).await?;
    let right_rows = materialize(right, ctx).await?;
    let len = left_rows.len().min(right_rows.len());
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(left_rows[i].clone().merge(right_rows[i].clone()));
    }
    Ok(out)
}
