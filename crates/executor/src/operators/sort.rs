//! `ORDER BY`. Materializes its input (a sort must see every row before it
//! can emit the first one) and does a single stable sort across every key,
//! so ties on earlier keys fall back to later ones in the order given.

use esql_ir::{ExecutionResult, NullsOrder, OrderByTerm, Row, SortDirection, SqlValue};

use crate::context::ExecContext;
use crate::eval::eval_expr;
use crate::stream::{drain, RowStream};

pub async fn sort_rows(input: Box<dyn RowStream>, order_by: &[OrderByTerm], ctx: &ExecContext) -> ExecutionResult<Vec<Row>> {
    let mut input = input;
    let rows = drain(input.as_mut(), &ctx.cancel).await?;

    let mut keyed: Vec<(Vec<SqlValue>, Row)> = Vec::with_capacity(rows.len());
    for row in rows {
        let mut keys = Vec::with_capacity(order_by.len());
        for term in order_by {
            keys.push(eval_expr(&term.expr, &row, ctx).await?);
        }
        keyed.push((keys, row));
    }

    keyed.sort_by(|(a_keys, _), (b_keys, _)| {
        for (i, term) in order_by.iter().enumerate() {
            let ord = compare_with_nulls(&a_keys[i], &b_keys[i], term);
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });

    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

/// Default NULL ordering treats `NULL` as the lowest possible value — see
/// DESIGN.md's Open Question decision — so it sorts first under `ASC` and
/// last under `DESC` unless the term explicitly requests `NULLS
/// FIRST`/`NULLS LAST`, which always wins regardless of direction.
fn compare_with_nulls(a: &SqlValue, b: &SqlValue, term: &OrderByTerm) -> std::cmp::Ordering {
    use std::cmp::Ordering::*;
    let nulls_first = match term.nulls {
        Some(NullsOrder::First) => true,
        Some(NullsOrder::Last) => false,
        None => term.direction == SortDirection::Asc,
    };
    match (a.is_null(), b.is_null()) {
        (true, true) => Equal,
        (true, false) => if nulls_first { Less } else { Greater },
        (false, true) => if nulls_first { Greater } else { Less },
        (false, false) => {
            let ord = a.partial_cmp(b).unwrap_or(Equal);
            if term.direction == SortDirection::Desc { ord.reverse() } else { ord }
        }
    }
}
