//! Parse-time validations that do not need a catalog: aggregate-placement
//! rejection. Grounded on `semantic/src/error.rs`'s
//! `NonAggregateColumnInHaving`/`FilterOnNonAggregateFunction` variants,
//! reframed here as a parser-owned check since this engine has no separate
//! semantic-analysis pass — `WHERE`/`JOIN ON`/`GROUP BY` reject aggregates
//! outright rather than deferring to a later validator.

use esql_ir::{is_aggregate_name, Expr, ExprKind, ParseError};

pub fn check_no_aggregate(expr: &Expr, clause: &str) -> Result<(), ParseError> {
    let mut found: Option<(String, esql_ir::Span)> = None;
    expr.walk(&mut |node| {
        if found.is_some() {
            return;
        }
        if let ExprKind::Function { name, .. } = &node.kind {
            if is_aggregate_name(name) {
                found = Some((name.clone(), node.span));
            }
        }
    });
    if let Some((name, span)) = found {
        return Err(ParseError::new(
            format!("aggregate function {} not allowed in {clause}", name.to_uppercase()),
            span,
        ));
    }
    Ok(())
}
