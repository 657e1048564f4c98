//! `SELECT` statement parsing: `FROM`, joins, `WHERE`, `GROUP BY`,
//! `HAVING`, `ORDER BY`, `LIMIT`/`OFFSET`, and simple `WITH` CTEs.

use esql_ir::{
    CommonTableExpr, Join, JoinCondition, JoinType, NullsOrder, OrderByTerm, ParseError,
    SelectItem, SelectStatement, SortDirection, TableRef,
};

use crate::cursor::Cursor;
use crate::expr::parse_expr;
use crate::validate::check_no_aggregate;

pub fn parse_select_body(cur: &mut Cursor) -> Result<SelectStatement, ParseError> {
    let start = cur.span();
    let mut ctes = Vec::new();
    if cur.eat_keyword("WITH") {
        loop {
            let name = cur.expect_identifier()?.ident_text().to_string();
            cur.expect_keyword("AS")?;
            cur.expect_symbol("(")?;
            let query = parse_select_body(cur)?;
            cur.expect_symbol(")")?;
            ctes.push(CommonTableExpr { name, query: Box::new(query) });
            if !cur.eat_symbol(",") {
                break;
            }
        }
    }

    cur.expect_keyword("SELECT")?;
    let distinct = cur.eat_keyword("DISTINCT");
    if distinct {
        // ALL is the default and accepted-but-ignored counterpart to DISTINCT.
    } else {
        cur.eat_keyword("ALL");
    }

    let projection = parse_projection(cur)?;

    cur.expect_keyword("FROM")?;
    let from = parse_table_ref(cur)?;

    let mut joins = Vec::new();
    loop {
        let join_type = if cur.eat_keyword("INNER") {
            cur.eat_keyword("JOIN");
            Some(JoinType::Inner)
        } else if cur.eat_keyword("LEFT") {
            cur.eat_keyword("OUTER");
            cur.expect_keyword("JOIN")?;
            Some(JoinType::Left)
        } else if cur.eat_keyword("RIGHT") {
            cur.eat_keyword("OUTER");
            cur.expect_keyword("JOIN")?;
            Some(JoinType::Right)
        } else if cur.eat_keyword("FULL") {
            cur.eat_keyword("OUTER");
            cur.expect_keyword("JOIN")?;
            Some(JoinType::Full)
        } else if cur.eat_keyword("JOIN") {
            Some(JoinType::Inner)
        } else if cur.eat_keyword("POSITIONAL") {
            cur.expect_keyword("JOIN")?;
            let table = parse_table_ref(cur)?;
            joins.push(Join { join_type: JoinType::Inner, table, condition: JoinCondition::Positional });
            continue;
        } else {
            None
        };

        let Some(join_type) = join_type else { break };
        let table = parse_table_ref(cur)?;
        cur.expect_keyword("ON")?;
        let condition = parse_expr(cur)?;
        check_no_aggregate(&condition, "JOIN ON")?;
        joins.push(Join { join_type, table, condition: JoinCondition::On(condition) });
    }

    let where_clause = if cur.eat_keyword("WHERE") {
        let expr = parse_expr(cur)?;
        check_no_aggregate(&expr, "WHERE")?;
        Some(expr)
    } else {
        None
    };

    let mut group_by = Vec::new();
    if cur.eat_keyword("GROUP") {
        cur.expect_keyword("BY")?;
        group_by.push(parse_expr(cur)?);
        while cur.eat_symbol(",") {
            group_by.push(parse_expr(cur)?);
        }
        for g in &group_by {
            check_no_aggregate(g, "GROUP BY")?;
        }
    }

    let having = if cur.eat_keyword("HAVING") { Some(parse_expr(cur)?) } else { None };

    let mut order_by = Vec::new();
    if cur.eat_keyword("ORDER") {
        cur.expect_keyword("BY")?;
        order_by.push(parse_order_by_term(cur)?);
        while cur.eat_symbol(",") {
            order_by.push(parse_order_by_term(cur)?);
        }
    }

    let limit = if cur.eat_keyword("LIMIT") { Some(parse_u64_literal(cur)?) } else { None };
    let offset = if cur.eat_keyword("OFFSET") { Some(parse_u64_literal(cur)?) } else { None };

    let end = cur.span();
    Ok(SelectStatement {
        ctes,
        distinct,
        projection,
        from,
        joins,
        where_clause,
        group_by,
        having,
        order_by,
        limit,
        offset,
        span: start.cover(end),
    })
}

fn parse_projection(cur: &mut Cursor) -> Result<Vec<SelectItem>, ParseError> {
    let mut items = vec![parse_select_item(cur)?];
    while cur.eat_symbol(",") {
        items.push(parse_select_item(cur)?);
    }
    Ok(items)
}

fn parse_select_item(cur: &mut Cursor) -> Result<SelectItem, ParseError> {
    if cur.peek().is_symbol("*") {
        cur.advance();
        return Ok(SelectItem::Wildcard);
    }
    if (cur.peek().kind == esql_lexer::TokenKind::Identifier
        || cur.peek().kind == esql_lexer::TokenKind::QuotedIdentifier)
        && cur.peek_at(1).is_symbol(".")
        && cur.peek_at(2).is_symbol("*")
    {
        let table = cur.advance().ident_text().to_string();
        cur.advance(); // .
        cur.advance(); // *
        return Ok(SelectItem::QualifiedWildcard(table));
    }

    let expr = parse_expr(cur)?;
    let alias = if cur.eat_keyword("AS") {
        Some(cur.expect_identifier()?.ident_text().to_string())
    } else if cur.peek().kind == esql_lexer::TokenKind::Identifier
        || cur.peek().kind == esql_lexer::TokenKind::QuotedIdentifier
    {
        Some(cur.advance().ident_text().to_string())
    } else {
        None
    };
    Ok(SelectItem::Expr { expr, alias })
}

fn parse_table_ref(cur: &mut Cursor) -> Result<TableRef, ParseError> {
    let name_tok = cur.expect_identifier()?;
    let name = name_tok.ident_text().to_string();
    let mut span = name_tok.span;
    let alias = if cur.eat_keyword("AS") {
        let a = cur.expect_identifier()?;
        span = span.cover(a.span);
        Some(a.ident_text().to_string())
    } else if cur.peek().kind == esql_lexer::TokenKind::Identifier
        || cur.peek().kind == esql_lexer::TokenKind::QuotedIdentifier
    {
        let a = cur.advance();
        span = span.cover(a.span);
        Some(a.ident_text().to_string())
    } else {
        None
    };
    Ok(TableRef { name, alias, span })
}

fn parse_order_by_term(cur: &mut Cursor) -> Result<OrderByTerm, ParseError> {
    let expr = parse_expr(cur)?;
    let direction = if cur.eat_keyword("DESC") {
        SortDirection::Desc
    } else {
        cur.eat_keyword("ASC");
        SortDirection::Asc
    };
    let nulls = if cur.eat_keyword("NULLS") {
        if cur.eat_keyword("FIRST") {
            Some(NullsOrder::First)
        } else if cur.eat_keyword("LAST") {
            Some(NullsOrder::Last)
        } else {
            return Err(cur.expected("FIRST or LAST after NULLS"));
        }
    } else {
        None
    };
    Ok(OrderByTerm { expr, direction, nulls })
}

fn parse_u64_literal(cur: &mut Cursor) -> Result<u64, ParseError> {
    let tok = cur.peek().clone();
    if tok.kind != esql_lexer::TokenKind::Number {
        return Err(cur.expected("a numeric literal"));
    }
    cur.advance();
    match tok.number {
        Some(esql_lexer::NumberValue::Int64(i)) if i >= 0 => Ok(i as u64),
        _ => Err(ParseError::new("expected a non-negative integer literal", tok.span)),
    }
}

/// Entry point for a top-level query: requires the whole token stream to be
/// consumed, rejecting trailing garbage after the statement.
pub fn parse_query(tokens: &[esql_lexer::Token]) -> Result<SelectStatement, ParseError> {
    let mut cur = Cursor::new(tokens);
    if !(cur.peek().is_keyword("SELECT") || cur.peek().is_keyword("WITH")) {
        return Err(ParseError::new(
            "queries must start with SELECT or WITH",
            cur.span(),
        ));
    }
    let stmt = parse_select_body(&mut cur)?;
    if !cur.is_eof() {
        return Err(cur.expected("end of input"));
    }
    Ok(stmt)
}
