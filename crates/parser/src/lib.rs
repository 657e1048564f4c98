//! Recursive-descent SQL parser producing the `esql-ir` AST directly,
//! without an intermediate CST. Grounded structurally on `usql-parser`'s
//! precedence-climbing expression parser.

pub mod cursor;
pub mod expr;
pub mod select;
pub mod validate;

pub use esql_ir::{is_aggregate_name, AGGREGATE_FUNCTION_NAMES};
pub use expr::parse_expr;
pub use select::parse_query;

use esql_ir::{ParseError, SelectStatement};

/// Tokenizes and parses a full `SELECT`/`WITH` query. This is the engine's
/// single parse entry point: it fails fast on the first error, whether from
/// tokenization or from parsing.
#[tracing::instrument(level = "debug", skip(source), fields(len = source.len()))]
pub fn parse_sql(source: &str) -> Result<SelectStatement, ParseError> {
    let tokens =
        esql_lexer::Lexer::tokenize(source).map_err(|e| ParseError::new(e.message, e.span))?;
    let stmt = parse_query(&tokens)?;
    tracing::debug!(ctes = stmt.ctes.len(), joins = stmt.joins.len(), "parsed query");
    Ok(stmt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_select() {
        let stmt = parse_sql("SELECT a, b FROM t WHERE a = 1").unwrap();
        assert_eq!(stmt.projection.len(), 2);
        assert!(stmt.where_clause.is_some());
    }

    #[test]
    fn rejects_queries_not_starting_with_select_or_with() {
        let err = parse_sql("DELETE FROM t").unwrap_err();
        assert!(err.message.contains("SELECT or WITH"));
    }

    #[test]
    fn rejects_aggregate_in_where_with_position_covering_the_call() {
        let src = "SELECT * FROM t WHERE COUNT(*) > 1";
        let err = parse_sql(src).unwrap_err();
        assert!(err.message.contains("aggregate function COUNT not allowed in WHERE"));
        assert_eq!(&src[err.span.start..err.span.end], "COUNT(*)");
    }

    #[test]
    fn parses_joins_and_group_by_and_order_by() {
        let stmt = parse_sql(
            "SELECT t.a, COUNT(*) FROM t JOIN u ON t.id = u.id GROUP BY t.a ORDER BY t.a DESC NULLS LAST LIMIT 10 OFFSET 5",
        )
        .unwrap();
        assert_eq!(stmt.joins.len(), 1);
        assert_eq!(stmt.group_by.len(), 1);
        assert_eq!(stmt.order_by.len(), 1);
        assert_eq!(stmt.limit, Some(10));
        assert_eq!(stmt.offset, Some(5));
    }

    #[test]
    fn parses_case_cast_between_in_and_subquery() {
        let stmt = parse_sql(
            "SELECT CASE WHEN a BETWEEN 1 AND 2 THEN CAST(a AS TEXT) ELSE b END FROM t WHERE a IN (SELECT id FROM u)",
        )
        .unwrap();
        assert_eq!(stmt.projection.len(), 1);
    }

    #[test]
    fn filter_clause_rejected_on_non_aggregate_function() {
        let err = parse_sql("SELECT UPPER(a) FILTER (WHERE a > 1) FROM t").unwrap_err();
        assert!(err.message.contains("FILTER"));
    }
}
