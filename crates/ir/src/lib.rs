//! Core types shared across the embeddable SQL engine: [`SqlValue`],
//! [`Row`], the expression/statement AST, and the physical [`plan::PlanNode`]
//! tree.
//!
//! This crate has no knowledge of tokenizing, parsing, planning, or
//! executing SQL — it only defines the shapes those stages pass between
//! each other.

pub mod error;
pub mod expr;
pub mod plan;
pub mod row;
pub mod span;
pub mod stmt;
pub mod value;

pub use error::{ExecutionError, ExecutionErrorAtRow, ParseError};
pub use expr::{
    is_aggregate_name, BinaryOp, CaseWhen, ColumnRef, Expr, ExprKind, IntervalUnit, Literal,
    SharedExpr, UnaryOp, AGGREGATE_FUNCTION_NAMES,
};
pub use plan::{PlanNode, ScanHints};
pub use row::{Cell, ExecutionResult, Row};
pub use span::Span;
pub use stmt::{
    CommonTableExpr, Join, JoinCondition, JoinType, NullsOrder, OrderByTerm, SelectItem,
    SelectStatement, SortDirection, TableRef,
};
pub use value::{promote_numeric, NumericPair, SqlValue};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_cover_takes_the_union() {
        let a = Span::new(2, 5);
        let b = Span::new(0, 3);
        assert_eq!(a.cover(b), Span::new(0, 5));
    }

    #[test]
    fn sql_value_comparison_treats_null_as_unordered() {
        assert_eq!(SqlValue::Null.partial_cmp(&SqlValue::Int64(1)), None);
        assert!(SqlValue::Int64(1) < SqlValue::Int64(2));
        assert!(SqlValue::Int64(1) == SqlValue::Float64(1.0));
    }

    #[tokio::test]
    async fn row_get_prefers_last_write_on_name_collision() {
        let mut row = Row::new();
        row.push("id", Cell::value(SqlValue::Int64(1)));
        row.push("id", Cell::value(SqlValue::Int64(2)));
        let v = row.get("id").unwrap().get().await.unwrap();
        assert_eq!(v, SqlValue::Int64(2));
    }
}
