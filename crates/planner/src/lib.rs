//! # Planner
//!
//! Lowers a parsed [`SelectStatement`] into the engine's fixed physical
//! plan shape:
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
//!
//! New code; grounded structurally on how `ir/src/query.rs` keeps a
//! declarative `Query` separate from execution concerns — the same
//! "syntax IR vs. execution IR" split the teacher draws between its CST
//! and its lowered `ir` crate, carried here as AST-to-plan instead of
//! CST-to-AST.

pub mod hints;
pub mod join_strategy;

use esql_ir::{is_aggregate_name, ExprKind, PlanNode, SelectItem, SelectStatement};

/// Builds the physical plan for a single `SELECT` statement. CTE
/// substitution (if any) is expected to have already happened — by the
/// time this runs, every `FROM`/`JOIN` table name must be resolvable by
/// the caller's `DataSource` map, whether it names a real table or a
/// materialized CTE result.
#[tracing::instrument(level = "debug", skip(stmt))]
pub fn plan_sql(stmt: &SelectStatement) -> PlanNode {
    if let Some(count_plan) = try_count_star_fast_path(stmt) {
        tracing::debug!("took COUNT(*) fast path");
        return count_plan;
    }

    let all_tables: Vec<String> = std::iter::once(stmt.from.effective_name().to_string())
        .chain(stmt.joins.iter().map(|j| j.table.effective_name().to_string()))
        .collect();

    let allow_limit_on_base =
        stmt.joins.is_empty() && !needs_sort_distinct_or_aggregate(stmt) && stmt.having.is_none();

    let mut plan = PlanNode::Scan {
        table: stmt.from.name.clone(),
        alias: stmt.from.effective_name().to_string(),
        hints: hints::build_hints(stmt, stmt.from.effective_name(), &all_tables, allow_limit_on_base),
    };

    for join in &stmt.joins {
        let right_table = join.table.effective_name().to_string();
        let right_scan = PlanNode::Scan {
            table: join.table.name.clone(),
            alias: right_table.clone(),
            hints: hints::build_hints(stmt, &right_table, &all_tables, false),
        };
        let left_table_name = current_left_label(&plan, &stmt.from);

        plan = match &join.condition {
            esql_ir::JoinCondition::Positional => PlanNode::PositionalJoin {
                left: Box::new(plan),
                right: Box::new(right_scan),
                left_table: left_table_name,
                right_table,
            },
            esql_ir::JoinCondition::On(condition) => {
                match join_strategy::classify(condition, &left_table_name, &right_table) {
                    join_strategy::EqualityKey::Hashable { left_key, right_key } => PlanNode::HashJoin {
                        left: Box::new(plan),
                        right: Box::new(right_scan),
                        left_key,
                        right_key,
                        join_type: join.join_type,
                        left_table: left_table_name,
                        right_table,
                    },
                    join_strategy::EqualityKey::NotHashable => PlanNode::NestedLoopJoin {
                        left: Box::new(plan),
                        right: Box::new(right_scan),
                        condition: condition.clone(),
                        join_type: join.join_type,
                        left_table: left_table_name,
                        right_table,
                    },
                }
            }
        };
    }

    if let Some(where_clause) = &stmt.where_clause {
        plan = PlanNode::Filter { input: Box::new(plan), predicate: where_clause.clone() };
    }

    let has_group_by = !stmt.group_by.is_empty();
    let has_aggregate_projection = projection_has_aggregate(&stmt.projection);

    if has_group_by {
        plan = PlanNode::HashAggregate {
            input: Box::new(plan),
            group_by: stmt.group_by.clone(),
            columns: stmt.projection.clone(),
            having: stmt.having.clone(),
        };
    } else if has_aggregate_projection {
        plan = PlanNode::ScalarAggregate {
            input: Box::new(plan),
            columns: stmt.projection.clone(),
            having: stmt.having.clone(),
        };
    } else {
        plan = PlanNode::Project { input: Box::new(plan), columns: stmt.projection.clone() };
    }

    if !stmt.order_by.is_empty() {
        plan = PlanNode::Sort { input: Box::new(plan), order_by: stmt.order_by.clone() };
    }
    if stmt.distinct {
        plan = PlanNode::Distinct { input: Box::new(plan) };
    }
    if stmt.limit.is_some() || stmt.offset.is_some() {
        plan = PlanNode::Limit { input: Box::new(plan), limit: stmt.limit, offset: stmt.offset };
    }

    tracing::debug!(root = plan.kind_name(), "built plan");
    plan
}

fn current_left_label(plan: &PlanNode, base: &esql_ir::TableRef) -> String {
    match plan {
        PlanNode::Scan { alias, .. } => alias.clone(),
        _ => base.effective_name().to_string(),
    }
}

fn needs_sort_distinct_or_aggregate(stmt: &SelectStatement) -> bool {
    !stmt.order_by.is_empty() || stmt.distinct || !stmt.group_by.is_empty() || projection_has_aggregate(&stmt.projection)
}

fn projection_has_aggregate(projection: &[SelectItem]) -> bool {
    projection.iter().any(|item| match item {
        SelectItem::Expr { expr, .. } => {
            let mut found = false;
            expr.walk(&mut |node| {
                if let ExprKind::Function { name, .. } = &node.kind {
                    if is_aggregate_name(name) {
                        found = true;
                    }
                }
            });
            found
        }
        _ => false,
    })
}

/// `SELECT COUNT(*) FROM table` with no other clauses goes straight to
/// `PlanNode::Count`, letting the executor use `DataSource::num_rows`
/// instead of materializing a full scan.
fn try_count_star_fast_path(stmt: &SelectStatement) -> Option<PlanNode> {
    if stmt.projection.len() != 1
        || !stmt.joins.is_empty()
        || stmt.where_clause.is_some()
        || !stmt.group_by.is_empty()
        || stmt.having.is_some()
        || !stmt.order_by.is_empty()
        || stmt.distinct
        || stmt.limit.is_some()
        || stmt.offset.is_some()
    {
        return None;
    }
    let SelectItem::Expr { expr, .. } = &stmt.projection[0] else { return None };
    let ExprKind::Function { name, args, distinct, filter } = &expr.kind else { return None };
    if !name.eq_ignore_ascii_case("COUNT") || *distinct || filter.is_some() || args.len() != 1 {
        return None;
    }
    if !args[0].is_wildcard() {
        return None;
    }
    Some(PlanNode::Count {
        table: stmt.from.name.clone(),
        alias: stmt.from.effective_name().to_string(),
        columns: vec!["COUNT(*)".to_string()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_star_alone_takes_the_fast_path() {
        let stmt = esql_parser::parse_sql("SELECT COUNT(*) FROM t").unwrap();
        let plan = plan_sql(&stmt);
        assert!(matches!(plan, PlanNode::Count { .. }));
    }

    #[test]
    fn equality_join_on_distinct_tables_becomes_a_hash_join() {
        let stmt = esql_parser::parse_sql("SELECT * FROM t JOIN u ON t.id = u.id").unwrap();
        let plan = plan_sql(&stmt);
        assert!(matches!(plan, PlanNode::Project { .. }));
        if let PlanNode::Project { input, .. } = plan {
            assert!(matches!(*input, PlanNode::HashJoin { .. }));
        }
    }

    #[test]
    fn non_equality_join_condition_falls_back_to_nested_loop() {
        let stmt = esql_parser::parse_sql("SELECT * FROM t JOIN u ON t.id > u.id").unwrap();
        let plan = plan_sql(&stmt);
        if let PlanNode::Project { input, .. } = plan {
            assert!(matches!(*input, PlanNode::NestedLoopJoin { .. }));
        } else {
            panic!("expected Project at root");
        }
    }

    #[test]
    fn group_by_produces_hash_aggregate() {
        let stmt = esql_parser::parse_sql("SELECT a, COUNT(*) FROM t GROUP BY a").unwrap();
        let plan = plan_sql(&stmt);
        assert!(matches!(plan, PlanNode::HashAggregate { .. }));
    }

    #[test]
    fn scalar_aggregate_without_group_by_emits_one_row_shape() {
        let stmt = esql_parser::parse_sql("SELECT COUNT(*) FROM t WHERE a > 1").unwrap();
        let plan = plan_sql(&stmt);
        assert!(matches!(plan, PlanNode::ScalarAggregate { .. }));
    }

    #[test]
    fn plan_ends_with_sort_distinct_limit_in_order() {
        let stmt =
            esql_parser::parse_sql("SELECT DISTINCT a FROM t ORDER BY a LIMIT 10 OFFSET 2").unwrap();
        let plan = plan_sql(&stmt);
        let PlanNode::Limit { input, limit, offset } = plan else { panic!("expected Limit root") };
        assert_eq!(limit, Some(10));
        assert_eq!(offset, Some(2));
        let PlanNode::Distinct { input } = *input else { panic!("expected Distinct") };
        assert!(matches!(*input, PlanNode::Sort { .. }));
    }
}
