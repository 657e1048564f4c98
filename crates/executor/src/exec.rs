//! Lowers a physical [`PlanNode`] into a running [`RowStream`], and the
//! subquery entry point ([`execute_to_rows`]) the evaluator calls back
//! into for `IN (SELECT ...)`/`EXISTS`/scalar subqueries.

use esql_ir::{ExecutionResult, PlanNode, Row, SelectStatement};

use crate::context::ExecContext;
use crate::operators::aggregate::{hash_aggregate_rows, scalar_aggregate_rows};
use crate::operators::distinct::distinct_rows;
use crate::operators::filter::FilterStream;
use crate::operators::join::{hash_join_rows, nested_loop_join_rows, positional_join_rows};
use crate::operators::limit::LimitStream;
use crate::operators::project::ProjectStream;
use crate::operators::scan::{count_stream, ScanStream};
use crate::operators::sort::sort_rows;
use crate::stream::{BoxFuture, RowStream, VecStream};

/// Builds the running stream for a physical plan. Recursive calls are
/// boxed (the idiom every recursive `async fn` in Rust needs) since a
/// join's two sides, and every operator's single input, are each another
/// full plan subtree.
pub fn build_stream<'a>(plan: &'a PlanNode, ctx: &'a ExecContext) -> BoxFuture<'a, ExecutionResult<Box<dyn RowStream>>> {
    Box::pin(async move {
        match plan {
            PlanNode::Scan { table, alias, hints } => {
                let stream = ScanStream::build(table, alias, hints, ctx).await?;
                Ok(Box::new(stream) as Box<dyn RowStream>)
            }
            PlanNode::Count { table, alias, columns } => count_stream(table, alias, columns, ctx).await,
            PlanNode::Filter { input, predicate } => {
                let inner = build_stream(input, ctx).await?;
                Ok(Box::new(FilterStream::new(inner, predicate.clone(), ctx.clone())) as Box<dyn RowStream>)
            }
            PlanNode::Project { input, columns } => {
                let inner = build_stream(input, ctx).await?;
                Ok(Box::new(ProjectStream::new(inner, columns.clone(), ctx.clone())) as Box<dyn RowStream>)
            }
            PlanNode::HashJoin { left, right, left_key, right_key, join_type, .. } => {
                let left_stream = build_stream(left, ctx).await?;
                let right_stream = build_stream(right, ctx).await?;
                let rows = hash_join_rows(left_stream, right_stream, left_key, right_key, *join_type, ctx).await?;
                Ok(Box::new(VecStream::new(rows)) as Box<dyn RowStream>)
            }
            PlanNode::NestedLoopJoin { left, right, condition, join_type, .. } => {
                let left_stream = build_stream(left, ctx).await?;
                let right_stream = build_stream(right, ctx).await?;
                let rows = nested_loop_join_rows(left_stream, right_stream, condition, *join_type, ctx).await?;
                Ok(Box::new(VecStream::new(rows)) as Box<dyn RowStream>)
            }
            PlanNode::PositionalJoin { left, right, .. } => {
                let left_stream = build_stream(left, ctx).await?;
                let right_stream = build_stream(right, ctx).await?;
                let rows = positional_join_rows(left_stream, right_stream, ctx).await?;
                Ok(Box::new(VecStream::new(rows)) as Box<dyn RowStream>)
            }
            PlanNode::HashAggregate { input, group_by, columns, having } => {
                let inner = build_stream(input, ctx).await?;
                let rows = hash_aggregate_rows(inner, group_by, columns, having.as_ref(), ctx).await?;
                Ok(Box::new(VecStream::new(rows)) as Box<dyn RowStream>)
            }
            PlanNode::ScalarAggregate { input, columns, having } => {
                let inner = build_stream(input, ctx).await?;
                let rows = scalar_aggregate_rows(inner, columns, having.as_ref(), ctx).await?;
                Ok(Box::new(VecStream::new(rows)) as Box<dyn RowStream>)
            }
            PlanNode::Sort { input, order_by } => {
                let inner = build_stream(input, ctx).await?;
                let rows = sort_rows(inner, order_by, ctx).await?;
                Ok(Box::new(VecStream::new(rows)) as Box<dyn RowStream>)
            }
            PlanNode::Distinct { input } => {
                let inner = build_stream(input, ctx).await?;
                let rows = distinct_rows(inner, ctx).await?;
                Ok(Box::new(VecStream::new(rows)) as Box<dyn RowStream>)
            }
            PlanNode::Limit { input, limit, offset } => {
                let inner = build_stream(input, ctx).await?;
                if inner.limit_already_applied() {
                    Ok(inner)
                } else {
                    Ok(Box::new(LimitStream::new(inner, *limit, *offset, ctx.clone())) as Box<dyn RowStream>)
                }
            }
        }
    })
}

/// Plans and fully drains a (sub)query, used by the evaluator for scalar
/// subqueries, `IN (SELECT ...)`, and `EXISTS`.
pub fn execute_to_rows<'a>(stmt: &'a SelectStatement, ctx: &'a ExecContext) -> BoxFuture<'a, ExecutionResult<Vec<Row>>> {
    Box::pin(async move {
        tracing::debug!(depth = ctx.subquery_depth, "executing query to completion");
        let plan = esql_planner::plan_sql(stmt);
        let mut stream = build_stream(&plan, ctx).await?;
        let rows = crate::stream::drain(stream.as_mut(), &ctx.cancel).await?;
        tracing::debug!(rows = rows.len(), "query drained");
        Ok(rows)
    })
}
