//! Join strategy selection: a pure-equality `ON` whose two sides reference
//! exactly one (and different) table each becomes a [`esql_ir::PlanNode::HashJoin`];
//! anything else falls back to [`esql_ir::PlanNode::NestedLoopJoin`].

use esql_ir::{BinaryOp, ColumnRef, Expr, ExprKind};

pub enum EqualityKey {
    Hashable { left_key: Expr, right_key: Expr },
    NotHashable,
}

/// `left_table`/`right_table` are the aliases/names the two join sides are
/// addressed by downstream.
pub fn classify(condition: &Expr, left_table: &str, right_table: &str) -> EqualityKey {
    let ExprKind::Binary { op: BinaryOp::Eq, left, right } = &condition.kind else {
        return EqualityKey::NotHashable;
    };
    match (side_of(left, left_table, right_table), side_of(right, left_table, right_table)) {
        (Some(Side::Left), Some(Side::Right)) => {
            EqualityKey::Hashable { left_key: (**left).clone(), right_key: (**right).clone() }
        }
        (Some(Side::Right), Some(Side::Left)) => {
            EqualityKey::Hashable { left_key: (**right).clone(), right_key: (**left).clone() }
        }
        _ => EqualityKey::NotHashable,
    }
}

enum Side {
    Left,
    Right,
}

fn side_of(expr: &Expr, left_table: &str, right_table: &str) -> Option<Side> {
    let mut table_ref: Option<String> = None;
    let mut single_table = true;
    expr.walk(&mut |node| {
        if let ExprKind::Column(ColumnRef { table: Some(t), .. }) = &node.kind {
            match &table_ref {
                None => table_ref = Some(t.clone()),
                Some(existing) if existing != t => single_table = false,
                _ => {}
            }
        }
    });
    if !single_table {
        return None;
    }
    match table_ref.as_deref() {
        Some(t) if t == left_table => Some(Side::Left),
        Some(t) if t == right_table => Some(Side::Right),
        _ => None,
    }
}
