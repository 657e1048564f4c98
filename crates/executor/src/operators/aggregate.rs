//! `GROUP BY` and whole-input aggregation. Both build groups eagerly (an
//! aggregate must see every row in its group before it can finish), keyed
//! by `indexmap::IndexMap` so groups are emitted in first-seen order —
//! matching the engine's general "preserve arrival order unless asked to
//! sort" stance.

use esql_ir::{is_aggregate_name, ExecutionError, ExecutionResult, Expr, Row, SelectItem, SqlValue};
use indexmap::IndexMap;

use crate::context::ExecContext;
use crate::eval::{apply_unary_value, eval_binary_values, eval_expr};
use crate::stream::{check_cancelled, drain, BoxFuture, RowStream};

/// Evaluates `expr` against a finished group: aggregate calls are fed
/// every member row; everything else falls back to evaluating against the
/// group's representative (first) row. Handles the common shapes a
/// projection or `HAVING` clause actually uses — a bare aggregate call, or
/// a comparison/arithmetic/`NOT` combining one or more aggregate calls —
/// and otherwise evaluates the whole expression against the representative
/// row, which is correct as long as it does not itself contain an
/// aggregate nested under something this function does not special-case.
pub fn eval_group_expr<'a>(
    expr: &'a Expr,
    members: &'a [Row],
    representative: &'a Row,
    ctx: &'a ExecContext,
) -> BoxFuture<'a, ExecutionResult<SqlValue>> {
    Box::pin(async move {
        match &expr.kind {
            esql_ir::ExprKind::Function { name, args, distinct, filter } if is_aggregate_name(name) => {
                compute_aggregate(name, args, *distinct, filter.as_deref(), members, ctx).await
            }
            esql_ir::ExprKind::Binary { op, left, right } => {
                let l = eval_group_expr(left, members, representative, ctx).await?;
                let r = eval_group_expr(right, members, representative, ctx).await?;
                eval_binary_values(*op, l, r)
            }
            esql_ir::ExprKind::Unary { op, expr: inner } => {
                let v = eval_group_expr(inner, members, representative, ctx).await?;
                apply_unary_value(*op, v)
            }
            _ => eval_expr(expr, representative, ctx).await,
        }
    })
}

async fn compute_aggregate(
    name: &str,
    args: &[Expr],
    distinct: bool,
    filter: Option<&Expr>,
    members: &[Row],
    ctx: &ExecContext,
) -> ExecutionResult<SqlValue> {
    if name.eq_ignore_ascii_case("COUNT") && args.len() == 1 && args[0].is_wildcard() {
        let mut n = 0i64;
        for row in members {
            if !passes_filter(filter, row, ctx).await? {
                continue;
            }
            n += 1;
        }
        return Ok(SqlValue::Int64(n));
    }
    let mut agg = esql_functions::make_aggregate(name, distinct)?;
    let arg = args.first().ok_or_else(|| ExecutionError::InvalidArguments {
        function: name.to_string(),
        reason: "expects exactly one argument".to_string(),
    })?;
    for row in members {
        if !passes_filter(filter, row, ctx).await? {
            continue;
        }
        let v = eval_expr(arg, row, ctx).await?;
        agg.feed(v);
    }
    Ok(agg.finish())
}

async fn passes_filter(filter: Option<&Expr>, row: &Row, ctx: &ExecContext) -> ExecutionResult<bool> {
    match filter {
        None => Ok(true),
        Some(f) => Ok(eval_expr(f, row, ctx).await?.is_truthy()),
    }
}

async fn group_key(group_by: &[Expr], row: &Row, ctx: &ExecContext) -> ExecutionResult<String> {
    let mut parts = Vec::with_capacity(group_by.len());
    for g in group_by {
        parts.push(eval_expr(g, row, ctx).await?.stringify_key());
    }
    Ok(parts.join("\u{1}"))
}

pub async fn hash_aggregate_rows(
    input: Box<dyn RowStream>,
    group_by: &[Expr],
    columns: &[SelectItem],
    having: Option<&Expr>,
    ctx: &ExecContext,
) -> ExecutionResult<Vec<Row>> {
    let mut input = input;
    let rows = drain(input.as_mut(), &ctx.cancel).await?;

    let mut groups: IndexMap<String, (Row, Vec<Row>)> = IndexMap::new();
    for row in rows {
        check_cancelled(&ctx.cancel)?;
        let key = group_key(group_by, &row, ctx).await?;
        let entry = groups.entry(key).or_insert_with(|| (row.clone(), Vec::new()));
        entry.1.push(row);
    }

    let mut out = Vec::with_capacity(groups.len());
    for (representative, members) in groups.into_values() {
        let projected = project_group(columns, &members, &representative, ctx).await?;
        if let Some(h) = having {
            if !having_keeps(h, &members, &representative, &projected, ctx).await? {
                continue;
            }
        }
        out.push(projected);
    }
    Ok(out)
}

pub async fn scalar_aggregate_rows(
    input: Box<dyn RowStream>,
    columns: &[SelectItem],
    having: Option<&Expr>,
    ctx: &ExecContext,
) -> ExecutionResult<Vec<Row>> {
    let mut input = input;
    let members = drain(input.as_mut(), &ctx.cancel).await?;
    let representative = members.first().cloned().unwrap_or_default();
    let projected = project_group(columns, &members, &representative, ctx).await?;
    if let Some(h) = having {
        if !having_keeps(h, &members, &representative, &projected, ctx).await? {
            return Ok(Vec::new());
        }
    }
    Ok(vec![projected])
}

/// Evaluates a `HAVING` clause against the group's projected row (so a
/// reference to a `SELECT` alias resolves) augmented with the group's
/// representative row (so a reference to a raw, unprojected column still
/// resolves); aggregate calls within the clause still see every member row.
async fn having_keeps(having: &Expr, members: &[Row], representative: &Row, projected: &Row, ctx: &ExecContext) -> ExecutionResult<bool> {
    let augmented = representative.clone().merge(projected.clone());
    let keep = eval_group_expr(having, members, &augmented, ctx).await?;
    Ok(keep.is_truthy())
}

async fn project_group(columns: &[SelectItem], members: &[Row], representative: &Row, ctx: &ExecContext) -> ExecutionResult<Row> {
    let mut out = Row::new();
    for item in columns {
        let SelectItem::Expr { expr, alias } = item else {
            return Err(ExecutionError::InvalidArguments {
                function: "SELECT".to_string(),
                reason: "`*` is not allowed alongside GROUP BY/aggregates".to_string(),
            });
        };
        let value = eval_group_expr(expr, members, representative, ctx).await?;
        let name = alias.clone().unwrap_or_else(|| match &expr.kind {
            esql_ir::ExprKind::Column(col) => col.column.clone(),
            esql_ir::ExprKind::Function { name, .. } => name.clone(),
            _ => "?column?".to_string(),
        });
        out.push(name, esql_ir::Cell::value(value));
    }
    Ok(out)
}
