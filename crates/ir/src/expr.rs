//! # Expression AST
//!
//! Every node is wrapped in [`Expr`], which pairs an [`ExprKind`] with the
//! [`Span`] of source text it was parsed from. Grounded on
//! `ir/src/expr.rs`'s `Expr`/`ColumnRef`/`Literal` shape, generalized with
//! the full node set a SQL `WHERE`/`SELECT` expression grammar needs.
//!
//! ```
//! use esql_ir::{Expr, ExprKind, Span};
//!
//! let lit = Expr::new(ExprKind::Literal(esql_ir::Literal::Int64(1)), Span::new(0, 1));
//! assert_eq!(lit.span, Span::new(0, 1));
//! ```

use std::sync::Arc;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::stmt::SelectStatement;

/// A column reference, optionally qualified with a table/alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn bare(column: impl Into<String>) -> Self {
        Self { table: None, column: column.into() }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self { table: Some(table.into()), column: column.into() }
    }

    /// `true` for the unqualified wildcard `*`.
    pub fn is_wildcard(&self) -> bool {
        self.column == "*"
    }

    pub fn display_name(&self) -> String {
        match &self.table {
            Some(t) => format!("{t}.{}", self.column),
            None => self.column.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Literal {
    Null,
    Bool(bool),
    Int64(i64),
    BigInt(BigInt),
    Float64(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Like,
    NotLike,
    Concat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

/// One `WHEN ... THEN ...` arm of a `CASE` expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseWhen {
    pub condition: Expr,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ExprKind {
    Literal(Literal),
    Column(ColumnRef),
    Unary { op: UnaryOp, expr: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Between { expr: Box<Expr>, low: Box<Expr>, high: Box<Expr>, negated: bool },
    InList { expr: Box<Expr>, list: Vec<Expr>, negated: bool },
    InSubquery { expr: Box<Expr>, subquery: Box<SelectStatement>, negated: bool },
    Exists { subquery: Box<SelectStatement>, negated: bool },
    /// `CASE expr WHEN ... END` (simple) when `operand` is `Some`, or
    /// `CASE WHEN cond THEN ... END` (searched) when `operand` is `None`.
    Case { operand: Option<Box<Expr>>, whens: Vec<CaseWhen>, else_result: Option<Box<Expr>> },
    Cast { expr: Box<Expr>, target_type: String },
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
        filter: Option<Box<Expr>>,
    },
    Interval { value: Box<Expr>, unit: IntervalUnit },
    Subquery(Box<SelectStatement>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn literal(lit: Literal, span: Span) -> Self {
        Self::new(ExprKind::Literal(lit), span)
    }

    pub fn column(col: ColumnRef, span: Span) -> Self {
        Self::new(ExprKind::Column(col), span)
    }

    /// `true` for a bare `*` or `table.*` wildcard reference.
    pub fn is_wildcard(&self) -> bool {
        matches!(&self.kind, ExprKind::Column(c) if c.is_wildcard())
    }

    /// `true` if this node is a call to an aggregate-registry function name.
    /// The parser uses this (together with the aggregate name set it is
    /// configured with) to reject aggregates in `WHERE`/`ON`/`GROUP BY`.
    pub fn is_function_named(&self, name: &str) -> bool {
        matches!(&self.kind, ExprKind::Function { name: n, .. } if n.eq_ignore_ascii_case(name))
    }

    /// Walks this expression and every descendant, depth-first.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        f(self);
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Column(_) => {}
            ExprKind::Unary { expr, .. } => expr.walk(f),
            ExprKind::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            ExprKind::Between { expr, low, high, .. } => {
                expr.walk(f);
                low.walk(f);
                high.walk(f);
            }
            ExprKind::InList { expr, list, .. } => {
                expr.walk(f);
                for e in list {
                    e.walk(f);
                }
            }
            ExprKind::InSubquery { expr, .. } => expr.walk(f),
            ExprKind::Exists { .. } => {}
            ExprKind::Case { operand, whens, else_result } => {
                if let Some(o) = operand {
                    o.walk(f);
                }
                for w in whens {
                    w.condition.walk(f);
                    w.result.walk(f);
                }
                if let Some(e) = else_result {
                    e.walk(f);
                }
            }
            ExprKind::Cast { expr, .. } => expr.walk(f),
            ExprKind::Function { args, filter, .. } => {
                for a in args {
                    a.walk(f);
                }
                if let Some(fi) = filter {
                    fi.walk(f);
                }
            }
            ExprKind::Interval { value, .. } => value.walk(f),
            ExprKind::Subquery(_) => {}
        }
    }
}

/// Names recognized as aggregate functions by both the parser (to reject
/// them in `WHERE`/`JOIN ON`/`GROUP BY`) and the planner (to decide whether
/// a projection needs a `HashAggregate`/`ScalarAggregate` node).
pub const AGGREGATE_FUNCTION_NAMES: &[&str] =
    &["COUNT", "SUM", "AVG", "MIN", "MAX", "STDDEV_SAMP", "STDDEV_POP", "JSON_ARRAYAGG"];

pub fn is_aggregate_name(name: &str) -> bool {
    AGGREGATE_FUNCTION_NAMES.iter().any(|a| a.eq_ignore_ascii_case(name))
}

/// Shared, cheaply-cloneable expression handle used inside plan nodes where
/// the same projection list is referenced by several downstream operators
/// (e.g. `HAVING` re-evaluating an aggregate already computed for
/// projection).
pub type SharedExpr = Arc<Expr>;
