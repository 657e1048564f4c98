//! # `SELECT` statement AST
//!
//! Grounded on `ir/src/query.rs`'s `SelectStatement`/`TableRef`/`Join`/
//! `OrderBy` builder-pattern types, trimmed of multi-dialect/window-function
//! fields this engine does not support and extended with `Span`s throughout.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByTerm {
    pub expr: Expr,
    pub direction: SortDirection,
    /// `None` means "use the engine default" (NULLs sort lowest, i.e.
    /// `First` for `Asc`/`Last` for `Desc`) — see DESIGN.md's Open Question
    /// decision on default NULL ordering.
    pub nulls: Option<NullsOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItem {
    /// Unqualified `*`.
    Wildcard,
    /// `table.*`.
    QualifiedWildcard(String),
    /// A derived column, optionally aliased.
    Expr { expr: Expr, alias: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinCondition {
    On(Expr),
    /// `POSITIONAL JOIN`: pairs rows by index, no `ON` clause.
    Positional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
    pub span: Span,
}

impl TableRef {
    /// The name this table's columns/rows are addressed by downstream —
    /// the alias if present, otherwise the table name itself.
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    pub condition: JoinCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonTableExpr {
    pub name: String,
    pub query: Box<SelectStatement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    pub ctes: Vec<CommonTableExpr>,
    pub distinct: bool,
    pub projection: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderByTerm>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub span: Span,
}
