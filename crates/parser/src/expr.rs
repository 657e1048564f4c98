//! # Expression parsing
//!
//! Precedence-climbing parser grounded on `usql-parser`'s
//! `parse_expr`/`parse_subexpr`/`next_precedence`/`parse_infix` shape.

use esql_ir::{
    is_aggregate_name, BinaryOp, CaseWhen, ColumnRef, Expr, ExprKind, IntervalUnit, Literal,
    ParseError, Span, UnaryOp, AGGREGATE_FUNCTION_NAMES,
};
use esql_lexer::{NumberValue, TokenKind};

use crate::cursor::Cursor;
use crate::select::parse_select_body;

const UNARY_NOT_PREC: u8 = 15;
const COMPARISON_PREC: u8 = 20;
const BETWEEN_PREC: u8 = 20;
const CONCAT_PREC: u8 = 25;
const PLUS_MINUS_PREC: u8 = 30;
const MUL_DIV_PREC: u8 = 40;
const UNARY_MINUS_PREC: u8 = 50;

pub fn parse_expr(cur: &mut Cursor) -> Result<Expr, ParseError> {
    parse_subexpr(cur, 0)
}

fn parse_subexpr(cur: &mut Cursor, precedence: u8) -> Result<Expr, ParseError> {
    let mut expr = parse_prefix(cur)?;
    loop {
        let next_prec = next_precedence(cur);
        if precedence >= next_prec {
            break;
        }
        expr = parse_infix(cur, expr, next_prec)?;
    }
    Ok(expr)
}

fn next_precedence(cur: &Cursor) -> u8 {
    let tok = cur.peek();
    if tok.is_keyword("OR") {
        5
    } else if tok.is_keyword("AND") {
        10
    } else if tok.is_keyword("BETWEEN") || tok.is_keyword("IN") || tok.is_keyword("LIKE") {
        BETWEEN_PREC
    } else if tok.is_keyword("NOT") {
        // `NOT BETWEEN` / `NOT IN` / `NOT LIKE` — same binding as the
        // positive form; a bare infix `NOT` never appears here.
        BETWEEN_PREC
    } else if tok.is_keyword("IS") {
        COMPARISON_PREC
    } else if tok.is_symbol("=")
        || tok.is_symbol("<>")
        || tok.is_symbol("!=")
        || tok.is_symbol("<")
        || tok.is_symbol("<=")
        || tok.is_symbol(">")
        || tok.is_symbol(">=")
    {
        COMPARISON_PREC
    } else if tok.is_symbol("||") {
        CONCAT_PREC
    } else if tok.is_symbol("+") || tok.is_symbol("-") {
        PLUS_MINUS_PREC
    } else if tok.is_symbol("*") || tok.is_symbol("/") || tok.is_symbol("%") {
        MUL_DIV_PREC
    } else {
        0
    }
}

fn parse_prefix(cur: &mut Cursor) -> Result<Expr, ParseError> {
    let tok = cur.peek().clone();

    if tok.is_keyword("NOT") {
        cur.advance();
        let expr = parse_subexpr(cur, UNARY_NOT_PREC)?;
        let span = tok.span.cover(expr.span);
        return Ok(Expr::new(ExprKind::Unary { op: UnaryOp::Not, expr: Box::new(expr) }, span));
    }
    if tok.is_symbol("-") {
        cur.advance();
        let expr = parse_subexpr(cur, UNARY_MINUS_PREC)?;
        let span = tok.span.cover(expr.span);
        return Ok(Expr::new(ExprKind::Unary { op: UnaryOp::Neg, expr: Box::new(expr) }, span));
    }
    if tok.is_symbol("(") {
        cur.advance();
        if cur.peek().is_keyword("SELECT") || cur.peek().is_keyword("WITH") {
            let stmt = parse_select_body(cur)?;
            let end = cur.expect_symbol(")")?.span;
            let span = tok.span.cover(end);
            return Ok(Expr::new(ExprKind::Subquery(Box::new(stmt)), span));
        }
        let inner = parse_expr(cur)?;
        let end = cur.expect_symbol(")")?.span;
        return Ok(Expr::new(inner.kind, tok.span.cover(end)));
    }
    if tok.is_keyword("EXISTS") {
        cur.advance();
        cur.expect_symbol("(")?;
        let stmt = parse_select_body(cur)?;
        let end = cur.expect_symbol(")")?.span;
        return Ok(Expr::new(
            ExprKind::Exists { subquery: Box::new(stmt), negated: false },
            tok.span.cover(end),
        ));
    }
    if tok.is_keyword("CASE") {
        return parse_case(cur, tok.span);
    }
    if tok.is_keyword("CAST") {
        return parse_cast(cur, tok.span);
    }
    if tok.is_keyword("INTERVAL") {
        return parse_interval(cur, tok.span);
    }
    if tok.is_keyword("NULL") {
        cur.advance();
        return Ok(Expr::literal(Literal::Null, tok.span));
    }
    if tok.is_keyword("TRUE") {
        cur.advance();
        return Ok(Expr::literal(Literal::Bool(true), tok.span));
    }
    if tok.is_keyword("FALSE") {
        cur.advance();
        return Ok(Expr::literal(Literal::Bool(false), tok.span));
    }
    if tok.kind == TokenKind::Number {
        cur.advance();
        let lit = match tok.number.clone().unwrap() {
            NumberValue::Int64(i) => Literal::Int64(i),
            NumberValue::BigInt(b) => Literal::BigInt(b),
            NumberValue::Float64(f) => Literal::Float64(f),
        };
        return Ok(Expr::literal(lit, tok.span));
    }
    if tok.kind == TokenKind::StringLiteral {
        cur.advance();
        return Ok(Expr::literal(Literal::String(tok.ident_text().to_string()), tok.span));
    }
    if tok.kind == TokenKind::Identifier || tok.kind == TokenKind::QuotedIdentifier {
        return parse_identifier_or_call(cur);
    }
    if tok.is_symbol("*") {
        cur.advance();
        return Ok(Expr::column(ColumnRef::bare("*"), tok.span));
    }

    Err(cur.expected("an expression"))
}

fn parse_identifier_or_call(cur: &mut Cursor) -> Result<Expr, ParseError> {
    let first = cur.expect_identifier()?;
    let name = first.ident_text().to_string();
    let mut span = first.span;

    if cur.eat_symbol(".") {
        if cur.peek().is_symbol("*") {
            let star = cur.advance();
            span = span.cover(star.span);
            return Ok(Expr::column(ColumnRef::qualified(name, "*"), span));
        }
        let second = cur.expect_identifier()?;
        span = span.cover(second.span);
        return Ok(Expr::column(
            ColumnRef::qualified(name, second.ident_text().to_string()),
            span,
        ));
    }

    if cur.peek().is_symbol("(") {
        return parse_function_call(cur, name, span);
    }

    Ok(Expr::column(ColumnRef::bare(name), span))
}

fn parse_function_call(cur: &mut Cursor, name: String, name_span: Span) -> Result<Expr, ParseError> {
    cur.expect_symbol("(")?;
    let mut distinct = false;
    let mut args = Vec::new();
    if cur.eat_keyword("DISTINCT") {
        distinct = true;
    }
    if !cur.peek().is_symbol(")") {
        if cur.peek().is_symbol("*") {
            let star = cur.advance();
            args.push(Expr::column(ColumnRef::bare("*"), star.span));
        } else {
            args.push(parse_expr(cur)?);
        }
        while cur.eat_symbol(",") {
            args.push(parse_expr(cur)?);
        }
    }
    let close = cur.expect_symbol(")")?;
    let mut span = name_span.cover(close.span);

    let mut filter = None;
    if cur.peek().is_keyword("FILTER") {
        if !is_aggregate_name(&name) {
            return Err(ParseError::new(
                format!("FILTER clause is only allowed on aggregate functions, found on '{name}'"),
                span,
            ));
        }
        let filter_tok = cur.advance();
        cur.expect_symbol("(")?;
        cur.expect_keyword("WHERE")?;
        let cond = parse_expr(cur)?;
        let close = cur.expect_symbol(")")?;
        span = span.cover(filter_tok.span).cover(close.span);
        filter = Some(Box::new(cond));
    }

    Ok(Expr::new(ExprKind::Function { name, args, distinct, filter }, span))
}

fn parse_case(cur: &mut Cursor, start: Span) -> Result<Expr, ParseError> {
    cur.advance(); // CASE
    let operand = if !cur.peek().is_keyword("WHEN") {
        Some(Box::new(parse_expr(cur)?))
    } else {
        None
    };
    let mut whens = Vec::new();
    while cur.eat_keyword("WHEN") {
        let condition = parse_expr(cur)?;
        cur.expect_keyword("THEN")?;
        let result = parse_expr(cur)?;
        whens.push(CaseWhen { condition, result });
    }
    if whens.is_empty() {
        return Err(cur.expected("WHEN"));
    }
    let else_result = if cur.eat_keyword("ELSE") { Some(Box::new(parse_expr(cur)?)) } else { None };
    let end = cur.expect_keyword("END")?.span;
    Ok(Expr::new(
        ExprKind::Case { operand, whens, else_result },
        start.cover(end),
    ))
}

fn parse_cast(cur: &mut Cursor, start: Span) -> Result<Expr, ParseError> {
    cur.advance(); // CAST
    cur.expect_symbol("(")?;
    let expr = parse_expr(cur)?;
    cur.expect_keyword("AS")?;
    let type_tok = cur.expect_identifier()?;
    let target_type = type_tok.ident_text().to_uppercase();
    let end = cur.expect_symbol(")")?.span;
    Ok(Expr::new(
        ExprKind::Cast { expr: Box::new(expr), target_type },
        start.cover(end),
    ))
}

fn parse_interval(cur: &mut Cursor, start: Span) -> Result<Expr, ParseError> {
    cur.advance(); // INTERVAL
    let value = parse_subexpr(cur, UNARY_MINUS_PREC)?;
    let unit_tok = cur.peek().clone();
    let unit = if unit_tok.is_keyword("YEAR") {
        IntervalUnit::Year
    } else if unit_tok.is_keyword("MONTH") {
        IntervalUnit::Month
    } else if unit_tok.is_keyword("DAY") {
        IntervalUnit::Day
    } else if unit_tok.is_keyword("HOUR") {
        IntervalUnit::Hour
    } else if unit_tok.is_keyword("MINUTE") {
        IntervalUnit::Minute
    } else if unit_tok.is_keyword("SECOND") {
        IntervalUnit::Second
    } else {
        return Err(cur.expected("an interval unit (YEAR/MONTH/DAY/HOUR/MINUTE/SECOND)"));
    };
    cur.advance();
    let span = start.cover(unit_tok.span);
    Ok(Expr::new(ExprKind::Interval { value: Box::new(value), unit }, span))
}

fn parse_infix(cur: &mut Cursor, left: Expr, precedence: u8) -> Result<Expr, ParseError> {
    let tok = cur.peek().clone();

    if tok.is_keyword("IS") {
        cur.advance();
        let negated = cur.eat_keyword("NOT");
        cur.expect_keyword("NULL")?;
        let op = if negated { UnaryOp::IsNotNull } else { UnaryOp::IsNull };
        let span = left.span.cover(tok.span);
        return Ok(Expr::new(ExprKind::Unary { op, expr: Box::new(left) }, span));
    }

    if tok.is_keyword("NOT") {
        cur.advance();
        return parse_negated_infix(cur, left);
    }
    if tok.is_keyword("BETWEEN") {
        cur.advance();
        return parse_between(cur, left, false);
    }
    if tok.is_keyword("IN") {
        cur.advance();
        return parse_in(cur, left, false);
    }
    if tok.is_keyword("LIKE") {
        cur.advance();
        let right = parse_subexpr(cur, BETWEEN_PREC)?;
        let span = left.span.cover(right.span);
        return Ok(Expr::new(
            ExprKind::Binary { op: BinaryOp::Like, left: Box::new(left), right: Box::new(right) },
            span,
        ));
    }

    let op = if tok.is_keyword("AND") {
        BinaryOp::And
    } else if tok.is_keyword("OR") {
        BinaryOp::Or
    } else if tok.is_symbol("=") {
        BinaryOp::Eq
    } else if tok.is_symbol("<>") || tok.is_symbol("!=") {
        BinaryOp::NotEq
    } else if tok.is_symbol("<") {
        BinaryOp::Lt
    } else if tok.is_symbol("<=") {
        BinaryOp::LtEq
    } else if tok.is_symbol(">") {
        BinaryOp::Gt
    } else if tok.is_symbol(">=") {
        BinaryOp::GtEq
    } else if tok.is_symbol("+") {
        BinaryOp::Add
    } else if tok.is_symbol("-") {
        BinaryOp::Sub
    } else if tok.is_symbol("*") {
        BinaryOp::Mul
    } else if tok.is_symbol("/") {
        BinaryOp::Div
    } else if tok.is_symbol("%") {
        BinaryOp::Mod
    } else if tok.is_symbol("||") {
        BinaryOp::Concat
    } else {
        return Err(cur.expected("an operator"));
    };
    cur.advance();
    let right = parse_subexpr(cur, precedence)?;
    let span = left.span.cover(right.span);
    Ok(Expr::new(ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) }, span))
}

fn parse_negated_infix(cur: &mut Cursor, left: Expr) -> Result<Expr, ParseError> {
    if cur.eat_keyword("BETWEEN") {
        return parse_between(cur, left, true);
    }
    if cur.eat_keyword("IN") {
        return parse_in(cur, left, true);
    }
    if cur.eat_keyword("LIKE") {
        let right = parse_subexpr(cur, BETWEEN_PREC)?;
        let span = left.span.cover(right.span);
        return Ok(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::NotLike,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        ));
    }
    Err(cur.expected("BETWEEN, IN, or LIKE after NOT"))
}

fn parse_between(cur: &mut Cursor, expr: Expr, negated: bool) -> Result<Expr, ParseError> {
    let low = parse_subexpr(cur, BETWEEN_PREC)?;
    cur.expect_keyword("AND")?;
    let high = parse_subexpr(cur, BETWEEN_PREC)?;
    let span = expr.span.cover(high.span);
    Ok(Expr::new(
        ExprKind::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
            negated,
        },
        span,
    ))
}

fn parse_in(cur: &mut Cursor, expr: Expr, negated: bool) -> Result<Expr, ParseError> {
    cur.expect_symbol("(")?;
    if cur.peek().is_keyword("SELECT") {
        let stmt = parse_select_body(cur)?;
        let end = cur.expect_symbol(")")?.span;
        let span = expr.span.cover(end);
        return Ok(Expr::new(
            ExprKind::InSubquery { expr: Box::new(expr), subquery: Box::new(stmt), negated },
            span,
        ));
    }
    let mut list = vec![parse_expr(cur)?];
    while cur.eat_symbol(",") {
        list.push(parse_expr(cur)?);
    }
    let end = cur.expect_symbol(")")?.span;
    let span = expr.span.cover(end);
    Ok(Expr::new(ExprKind::InList { expr: Box::new(expr), list, negated }, span))
}
