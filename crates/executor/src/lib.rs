//! Pull-based operator tree and expression evaluator: turns a physical
//! [`esql_ir::PlanNode`] into rows.
//!
//! New code — nothing in the teacher executes a query, it only analyzes
//! one. Grounded on `catalog/src/trait.rs`'s async-trait-over-`Arc<dyn _>`
//! style for how the table/function registries are threaded through, and
//! on `semantic`'s column-resolution walk for qualified/bare lookup.

pub mod context;
pub mod eval;
pub mod exec;
pub mod operators;
pub mod stream;

pub use context::{CancellationHandle, ExecContext};
pub use eval::eval_expr;
pub use exec::{build_stream, execute_to_rows};
pub use stream::RowStream;

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use esql_datasource::{ArrayDataSource, DataSource, DataSourceResult, ScanOptions, ScanResult};
    use esql_functions::FunctionRegistry;
    use esql_ir::{Cell, Row, SqlValue};

    use super::*;

    /// A source that actually honors `limit`/`offset` pushdown, unlike
    /// [`ArrayDataSource`] which never does — exists only to exercise the
    /// executor's "don't re-slice a stream that already sliced itself" path.
    struct PushdownHonoringSource {
        rows: Vec<Row>,
    }

    #[async_trait::async_trait]
    impl DataSource for PushdownHonoringSource {
        async fn scan(&self, options: ScanOptions<'_>) -> DataSourceResult<ScanResult> {
            let offset = options.offset.unwrap_or(0) as usize;
            let mut rows: Vec<Row> = self.rows.iter().skip(offset).cloned().collect();
            if let Some(limit) = options.limit {
                rows.truncate(limit as usize);
            }
            let mut result = ScanResult::new(rows);
            result.applied_limit_offset = options.limit.is_some() || options.offset.is_some();
            Ok(result)
        }
    }

    fn row(pairs: &[(&str, SqlValue)]) -> Row {
        let mut r = Row::new();
        for (name, value) in pairs {
            r.push(*name, Cell::value(value.clone()));
        }
        r
    }

    fn ctx(tables: HashMap<String, Arc<dyn DataSource>>) -> ExecContext {
        ExecContext::new(tables, Arc::new(FunctionRegistry::new()), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    fn one_table(name: &str, rows: Vec<Row>) -> HashMap<String, Arc<dyn DataSource>> {
        let mut tables: HashMap<String, Arc<dyn DataSource>> = HashMap::new();
        tables.insert(name.to_string(), Arc::new(ArrayDataSource::new(rows)));
        tables
    }

    async fn run(sql: &str, tables: HashMap<String, Arc<dyn DataSource>>) -> Vec<Row> {
        let stmt = esql_parser::parse_sql(sql).unwrap();
        let plan = esql_planner::plan_sql(&stmt);
        let ctx = ctx(tables);
        let mut stream = build_stream(&plan, &ctx).await.unwrap();
        crate::stream::drain(stream.as_mut(), &ctx.cancel).await.unwrap()
    }

    #[tokio::test]
    async fn select_with_where_filters_rows() {
        let tables = one_table(
            "t",
            vec![
                row(&[("id", SqlValue::Int64(1)), ("n", SqlValue::Int64(10))]),
                row(&[("id", SqlValue::Int64(2)), ("n", SqlValue::Int64(20))]),
            ],
        );
        let rows = run("SELECT id FROM t WHERE n > 10", tables).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id").unwrap().get().await.unwrap(), SqlValue::Int64(2));
    }

    #[tokio::test]
    async fn count_star_uses_fast_path() {
        let tables = one_table(
            "t",
            vec![row(&[("id", SqlValue::Int64(1))]), row(&[("id", SqlValue::Int64(2))])],
        );
        let rows = run("SELECT COUNT(*) FROM t", tables).await;
        assert_eq!(rows.len(), 1);
        let (_, cell) = rows[0].iter().next().unwrap();
        assert_eq!(cell.get().await.unwrap(), SqlValue::Int64(2));
    }

    #[tokio::test]
    async fn group_by_aggregates_per_group_in_first_seen_order() {
        let tables = one_table(
            "t",
            vec![
                row(&[("k", SqlValue::String("a".into())), ("n", SqlValue::Int64(1))]),
                row(&[("k", SqlValue::String("b".into())), ("n", SqlValue::Int64(2))]),
                row(&[("k", SqlValue::String("a".into())), ("n", SqlValue::Int64(3))]),
            ],
        );
        let rows = run("SELECT k, SUM(n) FROM t GROUP BY k", tables).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("k").unwrap().get().await.unwrap(), SqlValue::String("a".into()));
        assert_eq!(rows[0].get("SUM").unwrap().get().await.unwrap(), SqlValue::Float64(4.0));
    }

    #[tokio::test]
    async fn null_comparisons_are_false_not_rows() {
        let tables = one_table("t", vec![row(&[("n", SqlValue::Null)]), row(&[("n", SqlValue::Int64(5))])]);
        let rows = run("SELECT n FROM t WHERE n = 5", tables).await;
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn inner_join_merges_matching_rows() {
        let mut tables = one_table("t", vec![row(&[("id", SqlValue::Int64(1))])]);
        tables.insert(
            "u".to_string(),
            Arc::new(ArrayDataSource::new(vec![row(&[("t_id", SqlValue::Int64(1)), ("label", SqlValue::String("x".into()))])])),
        );
        let rows = run("SELECT u.label FROM t JOIN u ON t.id = u.t_id", tables).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("label").unwrap().get().await.unwrap(), SqlValue::String("x".into()));
    }

    #[tokio::test]
    async fn limit_and_offset_slice_sorted_output() {
        let tables = one_table(
            "t",
            vec![
                row(&[("n", SqlValue::Int64(3))]),
                row(&[("n", SqlValue::Int64(1))]),
                row(&[("n", SqlValue::Int64(2))]),
            ],
        );
        let rows = run("SELECT n FROM t ORDER BY n LIMIT 1 OFFSET 1", tables).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("n").unwrap().get().await.unwrap(), SqlValue::Int64(2));
    }

    #[tokio::test]
    async fn limit_is_not_reapplied_when_the_source_already_sliced_it() {
        let mut tables: HashMap<String, Arc<dyn DataSource>> = HashMap::new();
        tables.insert(
            "t".to_string(),
            Arc::new(PushdownHonoringSource {
                rows: vec![
                    row(&[("n", SqlValue::Int64(1))]),
                    row(&[("n", SqlValue::Int64(2))]),
                    row(&[("n", SqlValue::Int64(3))]),
                    row(&[("n", SqlValue::Int64(4))]),
                    row(&[("n", SqlValue::Int64(5))]),
                ],
            }),
        );
        // Double-application would skip 1/take 2 from the already-sliced
        // [2, 3], leaving only [3]. The fix keeps both rows.
        let rows = run("SELECT n FROM t LIMIT 2 OFFSET 1", tables).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("n").unwrap().get().await.unwrap(), SqlValue::Int64(2));
        assert_eq!(rows[1].get("n").unwrap().get().await.unwrap(), SqlValue::Int64(3));
    }

    #[tokio::test]
    async fn order_by_qualified_column_resolves_against_bare_aggregate_output() {
        let tables = one_table(
            "u",
            vec![
                row(&[("name", SqlValue::String("bea".into()))]),
                row(&[("name", SqlValue::String("ann".into()))]),
            ],
        );
        let rows = run("SELECT u.name FROM u GROUP BY u.name ORDER BY u.name", tables).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name").unwrap().get().await.unwrap(), SqlValue::String("ann".into()));
        assert_eq!(rows[1].get("name").unwrap().get().await.unwrap(), SqlValue::String("bea".into()));
    }

    #[tokio::test]
    async fn cast_of_non_numeric_string_to_int_yields_null_not_an_error() {
        let tables = one_table("t", vec![row(&[("s", SqlValue::String("abc".into()))])]);
        let rows = run("SELECT CAST(s AS INTEGER) AS v FROM t", tables).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("v").unwrap().get().await.unwrap(), SqlValue::Null);
    }

    #[tokio::test]
    async fn cast_of_numeric_string_to_bigint_parses_exactly() {
        let tables = one_table("t", vec![row(&[("s", SqlValue::String("123456789012345678901234567890".into()))])]);
        let rows = run("SELECT CAST(s AS BIGINT) AS v FROM t", tables).await;
        assert_eq!(rows.len(), 1);
        let expected: num_bigint::BigInt = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(rows[0].get("v").unwrap().get().await.unwrap(), SqlValue::BigInt(expected));
    }

    #[tokio::test]
    async fn scalar_aggregate_having_sees_projected_alias_with_no_group_by() {
        let tables = one_table(
            "t",
            vec![row(&[("n", SqlValue::Int64(3))]), row(&[("n", SqlValue::Int64(4))])],
        );
        let rows = run("SELECT SUM(n) AS total FROM t HAVING total > 5", tables).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("total").unwrap().get().await.unwrap(), SqlValue::Float64(7.0));
    }

    #[tokio::test]
    async fn positional_join_stops_at_the_shorter_side() {
        let mut tables = one_table(
            "a",
            vec![row(&[("x", SqlValue::Int64(1))]), row(&[("x", SqlValue::Int64(2))]), row(&[("x", SqlValue::Int64(3))])],
        );
        tables.insert(
            "b".to_string(),
            Arc::new(ArrayDataSource::new(vec![row(&[("y", SqlValue::Int64(10))]), row(&[("y", SqlValue::Int64(20))])])),
        );
        let rows = run("SELECT x, y FROM a POSITIONAL JOIN b", tables).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("x").unwrap().get().await.unwrap(), SqlValue::Int64(1));
        assert_eq!(rows[0].get("y").unwrap().get().await.unwrap(), SqlValue::Int64(10));
        assert_eq!(rows[1].get("x").unwrap().get().await.unwrap(), SqlValue::Int64(2));
        assert_eq!(rows[1].get("y").unwrap().get().await.unwrap(), SqlValue::Int64(20));
    }
}
