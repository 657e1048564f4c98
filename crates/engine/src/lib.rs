//! Public facade for the embeddable SQL engine: [`execute_sql`] is the one
//! function most callers need. Grounded on `usql/src/lib.rs`'s thin
//! facade-crate pattern (`pub use` re-exports of the sub-crates, no logic
//! of its own beyond wiring), extended here with the one real piece of
//! orchestration the facade owns: CTE materialization ahead of planning.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

pub use esql_datasource::{ArrayDataSource, DataSource, DataSourceError};
pub use esql_executor::{CancellationHandle, ExecContext, RowStream};
pub use esql_functions::FunctionRegistry;
pub use esql_ir::{ExecutionError, ParseError, Row, SqlValue};

/// Top-level error any stage of `execute_sql` can surface, wrapping the
/// layer-specific error it came from.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
    #[error("data source error: {0}")]
    DataSource(#[from] DataSourceError),
}

/// Caller-tunable limits and overrides. An embeddable library reads these
/// from its constructor arguments, not environment variables or a config
/// file — there is no process environment to read from once embedded.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Guards against runaway or circular subquery nesting. Matches
    /// [`esql_executor::ExecContext`]'s own default of 16.
    pub max_subquery_depth: u32,
    /// Fixed clock used for `CURRENT_DATE`/`CURRENT_TIME`/`CURRENT_TIMESTAMP`
    /// so the same query is reproducible across runs. `None` reads the
    /// system clock once, at the start of `execute_sql`.
    pub clock: Option<NaiveDateTime>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { max_subquery_depth: 16, clock: None }
    }
}

/// Parses, plans, and lazily executes a SQL query against the supplied
/// table map, returning a [`RowStream`] the caller pulls from at its own
/// pace — nothing beyond `WITH` materialization runs before the first
/// `next()` call.
///
/// `functions`, when supplied, replaces the engine's default
/// [`FunctionRegistry`] wholesale; callers that only want to add a UDF on
/// top of the built-ins should build their own registry with
/// [`FunctionRegistry::register_udf`] and pass it here.
pub async fn execute_sql(
    tables: HashMap<String, Arc<dyn DataSource>>,
    query: &str,
    functions: Option<Arc<FunctionRegistry>>,
    signal: Option<CancellationHandle>,
    options: EngineOptions,
) -> Result<Box<dyn RowStream>, EngineError> {
    let stmt = esql_parser::parse_sql(query)?;
    let functions = functions.unwrap_or_else(|| Arc::new(FunctionRegistry::new()));
    let now = options.clock.unwrap_or_else(|| chrono::Utc::now().naive_utc());
    let cancel = signal.unwrap_or_default();

    let tables = materialize_ctes(&stmt, tables, &functions, now, &cancel, options.max_subquery_depth).await?;

    let mut ctx = ExecContext::new(tables, functions, now).with_cancel(cancel);
    ctx.max_subquery_depth = options.max_subquery_depth;

    let plan = esql_planner::plan_sql(&stmt);
    debug!(plan = ?plan, "built physical plan");
    let stream = esql_executor::build_stream(&plan, &ctx).await?;
    Ok(stream)
}

/// Eagerly executes every `WITH` CTE (in order, so a later CTE may
/// reference an earlier one) and registers each result as an
/// [`ArrayDataSource`] under its name, shadowing any real table of the
/// same name — this is what "substituting the CTE body wherever its name
/// is referenced as a table" (DESIGN.md) means in practice. Only the
/// outermost statement's `WITH` is processed: a CTE's own query may
/// declare further CTEs of its own, but those are out of scope (recursive
/// CTEs are a stated Non-goal, and nested non-recursive ones are rare
/// enough not to be worth the added recursion here).
async fn materialize_ctes(
    stmt: &esql_ir::SelectStatement,
    mut tables: HashMap<String, Arc<dyn DataSource>>,
    functions: &Arc<FunctionRegistry>,
    now: NaiveDateTime,
    cancel: &CancellationHandle,
    max_subquery_depth: u32,
) -> Result<HashMap<String, Arc<dyn DataSource>>, EngineError> {
    for cte in &stmt.ctes {
        debug!(name = %cte.name, "materializing CTE");
        let mut ctx = ExecContext::new(tables.clone(), functions.clone(), now).with_cancel(cancel.clone());
        ctx.max_subquery_depth = max_subquery_depth;
        let rows = esql_executor::execute_to_rows(&cte.query, &ctx).await?;
        tables.insert(cte.name.clone(), Arc::new(ArrayDataSource::new(rows)));
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use esql_test_utils::table;

    use super::*;

    fn tables_with(name: &str, columns: &[&str], rows: Vec<Vec<SqlValue>>) -> HashMap<String, Arc<dyn DataSource>> {
        let mut tables: HashMap<String, Arc<dyn DataSource>> = HashMap::new();
        tables.insert(name.to_string(), Arc::new(table(columns, rows)));
        tables
    }

    async fn drain(stream: Box<dyn RowStream>) -> Vec<Row> {
        let mut stream = stream;
        let mut out = Vec::new();
        while let Some(row) = stream.next().await.unwrap() {
            out.push(row);
        }
        out
    }

    #[tokio::test]
    async fn simple_select_where_order_by_limit() {
        let tables = tables_with(
            "orders",
            &["id", "amount"],
            vec![
                vec![SqlValue::Int64(1), SqlValue::Int64(30)],
                vec![SqlValue::Int64(2), SqlValue::Int64(10)],
                vec![SqlValue::Int64(3), SqlValue::Int64(20)],
            ],
        );
        let stream = execute_sql(
            tables,
            "SELECT id FROM orders WHERE amount >= 20 ORDER BY amount LIMIT 1",
            None,
            None,
            EngineOptions::default(),
        )
        .await
        .unwrap();
        let rows = drain(stream).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id").unwrap().get().await.unwrap(), SqlValue::Int64(3));
    }

    #[tokio::test]
    async fn with_cte_is_substituted_as_a_table() {
        let tables = tables_with(
            "orders",
            &["id", "amount"],
            vec![vec![SqlValue::Int64(1), SqlValue::Int64(100)], vec![SqlValue::Int64(2), SqlValue::Int64(5)]],
        );
        let stream = execute_sql(
            tables,
            "WITH big AS (SELECT id FROM orders WHERE amount > 50) SELECT id FROM big",
            None,
            None,
            EngineOptions::default(),
        )
        .await
        .unwrap();
        let rows = drain(stream).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id").unwrap().get().await.unwrap(), SqlValue::Int64(1));
    }

    #[tokio::test]
    async fn cancellation_before_run_yields_no_rows() {
        let tables = tables_with("t", &["id"], vec![vec![SqlValue::Int64(1)], vec![SqlValue::Int64(2)]]);
        let signal = CancellationHandle::new();
        signal.cancel();
        let result = execute_sql(tables, "SELECT id FROM t", None, Some(signal), EngineOptions::default()).await;
        assert!(matches!(result, Err(EngineError::Execution(_))));
    }

    #[tokio::test]
    async fn parse_error_surfaces_as_engine_error() {
        let tables = HashMap::new();
        let result = execute_sql(tables, "SELECT FROM", None, None, EngineOptions::default()).await;
        assert!(matches!(result, Err(EngineError::Parse(_))));
    }

    #[tokio::test]
    async fn group_by_having_end_to_end() {
        let tables = tables_with(
            "sales",
            &["region", "amount"],
            vec![
                vec![SqlValue::String("east".into()), SqlValue::Int64(10)],
                vec![SqlValue::String("east".into()), SqlValue::Int64(40)],
                vec![SqlValue::String("west".into()), SqlValue::Int64(5)],
            ],
        );
        let stream = execute_sql(
            tables,
            "SELECT region, SUM(amount) AS total FROM sales GROUP BY region HAVING total > 20",
            None,
            None,
            EngineOptions::default(),
        )
        .await
        .unwrap();
        let rows = drain(stream).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("region").unwrap().get().await.unwrap(), SqlValue::String("east".into()));
        assert_eq!(rows[0].get("total").unwrap().get().await.unwrap(), SqlValue::Float64(50.0));
    }

    #[tokio::test]
    async fn inner_join_across_two_tables() {
        let mut tables = tables_with("customers", &["id", "name"], vec![vec![SqlValue::Int64(1), SqlValue::String("ann".into())]]);
        tables.insert(
            "orders".to_string(),
            Arc::new(table(&["customer_id", "total"], vec![vec![SqlValue::Int64(1), SqlValue::Int64(99)]])),
        );
        let stream = execute_sql(
            tables,
            "SELECT customers.name, orders.total FROM customers JOIN orders ON customers.id = orders.customer_id",
            None,
            None,
            EngineOptions::default(),
        )
        .await
        .unwrap();
        let rows = drain(stream).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name").unwrap().get().await.unwrap(), SqlValue::String("ann".into()));
        assert_eq!(rows[0].get("total").unwrap().get().await.unwrap(), SqlValue::Int64(99));
    }
}
