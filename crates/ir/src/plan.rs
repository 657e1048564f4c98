//! # Physical plan
//!
//! The planner always produces the fixed operator-tree shape described in
//! the engine's design notes:
//!
//! ```text
//! Scan(base) -> [HashJoin|NestedLoopJoin|PositionalJoin]*
//!            -> Filter(where)?
//!            -> [HashAggregate|ScalarAggregate]?
//!            -> Project(columns)
//!            -> Sort(order_by)?
//!            -> Distinct?
//!            -> Limit(limit, offset)?
//! ```

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::stmt::{JoinType, OrderByTerm, SelectItem};

/// Column/predicate/limit hints a [`PlanNode::Scan`] passes down to the
/// `DataSource`, computed by the planner from the whole query (see
/// SPEC_FULL.md §4.3). A data source is free to ignore any hint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanHints {
    /// Deduplicated column names the query actually references from this
    /// table. Empty means "no hint was computed" (treat as all columns) —
    /// distinct from an explicit empty projection, which cannot occur.
    pub columns: Vec<String>,
    /// The portion of `WHERE` that references only this table's columns,
    /// safe to push down.
    pub where_predicate: Option<Expr>,
    /// Only populated when no `Sort`/`Distinct`/aggregate/post-join filter
    /// sits above this scan in the plan.
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlanNode {
    Scan {
        table: String,
        alias: String,
        hints: ScanHints,
    },
    /// `COUNT(*)` fast path: reads `DataSource::num_rows` if available
    /// instead of materializing a full scan.
    Count {
        table: String,
        alias: String,
        columns: Vec<String>,
    },
    Filter {
        input: Box<PlanNode>,
        predicate: Expr,
    },
    Project {
        input: Box<PlanNode>,
        columns: Vec<SelectItem>,
    },
    HashJoin {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        left_key: Expr,
        right_key: Expr,
        join_type: JoinType,
        left_table: String,
        right_table: String,
    },
    NestedLoopJoin {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        condition: Expr,
        join_type: JoinType,
        left_table: String,
        right_table: String,
    },
    PositionalJoin {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        left_table: String,
        right_table: String,
    },
    HashAggregate {
        input: Box<PlanNode>,
        group_by: Vec<Expr>,
        columns: Vec<SelectItem>,
        having: Option<Expr>,
    },
    ScalarAggregate {
        input: Box<PlanNode>,
        columns: Vec<SelectItem>,
        having: Option<Expr>,
    },
    Sort {
        input: Box<PlanNode>,
        order_by: Vec<OrderByTerm>,
    },
    Distinct {
        input: Box<PlanNode>,
    },
    Limit {
        input: Box<PlanNode>,
        limit: Option<u64>,
        offset: Option<u64>,
    },
}

impl PlanNode {
    /// Convenience used by tests/tracing to name a plan node without
    /// matching on every variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PlanNode::Scan { .. } => "Scan",
            PlanNode::Count { .. } => "Count",
            PlanNode::Filter { .. } => "Filter",
            PlanNode::Project { .. } => "Project",
            PlanNode::HashJoin { .. } => "HashJoin",
            PlanNode::NestedLoopJoin { .. } => "NestedLoopJoin",
            PlanNode::PositionalJoin { .. } => "PositionalJoin",
            PlanNode::HashAggregate { .. } => "HashAggregate",
            PlanNode::ScalarAggregate { .. } => "ScalarAggregate",
            PlanNode::Sort { .. } => "Sort",
            PlanNode::Distinct { .. } => "Distinct",
            PlanNode::Limit { .. } => "Limit",
        }
    }
}
