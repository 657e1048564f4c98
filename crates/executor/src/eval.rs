//! Expression evaluator: three-valued-NULL arithmetic/comparison,
//! `CASE`/`CAST`/`INTERVAL`, function dispatch, and subquery evaluation.
//!
//! New code — `esql-parser`/`esql-ir` only describe the AST; nothing in the
//! teacher evaluates one, since its job stopped at analysis. Grounded on
//! the shape of `semantic/src/context.rs`'s column-resolution walk for how
//! a qualified-or-bare lookup should fall back, generalized into a full
//! recursive evaluator.

use esql_ir::{
    BinaryOp, CaseWhen, ColumnRef, ExecutionError, ExecutionResult, Expr, ExprKind, Literal,
    NumericPair, Row, SqlValue, UnaryOp,
};

use crate::context::ExecContext;
use crate::exec::execute_to_rows;
use crate::stream::BoxFuture;

pub fn eval_expr<'a>(expr: &'a Expr, row: &'a Row, ctx: &'a ExecContext) -> BoxFuture<'a, ExecutionResult<SqlValue>> {
    Box::pin(async move {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal_value(lit)),
            ExprKind::Column(col) => resolve_column(row, col).await,
            ExprKind::Unary { op, expr } => eval_unary(*op, expr, row, ctx).await,
            ExprKind::Binary { op, left, right } => eval_binary(*op, left, right, row, ctx).await,
            ExprKind::Between { expr, low, high, negated } => {
                let v = eval_expr(expr, row, ctx).await?;
                let lo = eval_expr(low, row, ctx).await?;
                let hi = eval_expr(high, row, ctx).await?;
                if v.is_null() || lo.is_null() || hi.is_null() {
                    return Ok(SqlValue::Null);
                }
                let between = v.partial_cmp(&lo).map(|o| o.is_ge()).unwrap_or(false)
                    && v.partial_cmp(&hi).map(|o| o.is_le()).unwrap_or(false);
                Ok(SqlValue::Bool(between != *negated))
            }
            ExprKind::InList { expr, list, negated } => {
                let v = eval_expr(expr, row, ctx).await?;
                if v.is_null() {
                    return Ok(SqlValue::Null);
                }
                let mut found = false;
                let mut saw_null = false;
                for item in list {
                    let iv = eval_expr(item, row, ctx).await?;
                    if iv.is_null() {
                        saw_null = true;
                        continue;
                    }
                    if v.partial_cmp(&iv) == Some(std::cmp::Ordering::Equal) {
                        found = true;
                        break;
                    }
                }
                if found {
                    Ok(SqlValue::Bool(!*negated))
                } else if saw_null {
                    Ok(SqlValue::Null)
                } else {
                    Ok(SqlValue::Bool(*negated))
                }
            }
            ExprKind::InSubquery { expr, subquery, negated } => {
                let v = eval_expr(expr, row, ctx).await?;
                if v.is_null() {
                    return Ok(SqlValue::Null);
                }
                let nested = ctx.nested().ok_or_else(too_deep)?;
                let rows = execute_to_rows(subquery, &nested).await?;
                let mut found = false;
                for r in &rows {
                    let Some((_, cell)) = r.iter().next() else { continue };
                    let rv = cell.get().await?;
                    if !rv.is_null() && v.partial_cmp(&rv) == Some(std::cmp::Ordering::Equal) {
                        found = true;
                        break;
                    }
                }
                Ok(SqlValue::Bool(found != *negated))
            }
            ExprKind::Exists { subquery, negated } => {
                let nested = ctx.nested().ok_or_else(too_deep)?;
                let rows = execute_to_rows(subquery, &nested).await?;
                Ok(SqlValue::Bool(!rows.is_empty() != *negated))
            }
            ExprKind::Case { operand, whens, else_result } => {
                eval_case(operand.as_deref(), whens, else_result.as_deref(), row, ctx).await
            }
            ExprKind::Cast { expr, target_type } => {
                let v = eval_expr(expr, row, ctx).await?;
                cast_value(v, target_type)
            }
            ExprKind::Function { name, args, distinct, filter } => {
                eval_function(name, args, *distinct, filter.as_deref(), row, ctx).await
            }
            ExprKind::Interval { value, .. } => eval_expr(value, row, ctx).await,
            ExprKind::Subquery(stmt) => {
                let nested = ctx.nested().ok_or_else(too_deep)?;
                let rows = execute_to_rows(stmt, &nested).await?;
                match rows.first() {
                    None => Ok(SqlValue::Null),
                    Some(r) => match r.iter().next() {
                        Some((_, cell)) => cell.get().await,
                        None => Ok(SqlValue::Null),
                    },
                }
            }
        }
    })
}

fn too_deep() -> ExecutionError {
    ExecutionError::InvalidArguments {
        function: "subquery".to_string(),
        reason: "maximum subquery nesting depth exceeded".to_string(),
    }
}

fn literal_value(lit: &Literal) -> SqlValue {
    match lit {
        Literal::Null => SqlValue::Null,
        Literal::Bool(b) => SqlValue::Bool(*b),
        Literal::Int64(i) => SqlValue::Int64(*i),
        Literal::BigInt(b) => SqlValue::BigInt(b.clone()),
        Literal::Float64(f) => SqlValue::Float64(*f),
        Literal::String(s) => SqlValue::String(s.clone()),
    }
}

async fn resolve_column(row: &Row, col: &ColumnRef) -> ExecutionResult<SqlValue> {
    let cell = match &col.table {
        Some(table) => row
            .get_qualified_or_bare(&format!("{table}.{}", col.column), &col.column)
            .ok_or_else(|| ExecutionError::ColumnNotFound(col.display_name()))?,
        None => {
            let bare_matches = row.names().filter(|n| *n == col.column).count();
            let qualified_matches = row.names().filter(|n| n.ends_with(&format!(".{}", col.column))).count();
            if bare_matches == 0 && qualified_matches > 1 {
                return Err(ExecutionError::AmbiguousColumn(col.column.clone()));
            }
            row.get(&col.column).ok_or_else(|| ExecutionError::ColumnNotFound(col.column.clone()))?
        }
    };
    cell.get().await
}

async fn eval_unary<'a>(op: UnaryOp, expr: &'a Expr, row: &'a Row, ctx: &'a ExecContext) -> ExecutionResult<SqlValue> {
    match op {
        UnaryOp::IsNull => {
            let v = eval_expr(expr, row, ctx).await?;
            Ok(SqlValue::Bool(v.is_null()))
        }
        UnaryOp::IsNotNull => {
            let v = eval_expr(expr, row, ctx).await?;
            Ok(SqlValue::Bool(!v.is_null()))
        }
        UnaryOp::Not => {
            let v = eval_expr(expr, row, ctx).await?;
            if v.is_null() {
                return Ok(SqlValue::Null);
            }
            Ok(SqlValue::Bool(!v.is_truthy()))
        }
        UnaryOp::Neg => {
            let v = eval_expr(expr, row, ctx).await?;
            match v {
                SqlValue::Null => Ok(SqlValue::Null),
                SqlValue::Int64(i) => Ok(SqlValue::Int64(-i)),
                SqlValue::BigInt(b) => Ok(SqlValue::BigInt(-b)),
                SqlValue::Float64(f) => Ok(SqlValue::Float64(-f)),
                other => Err(ExecutionError::InvalidArguments {
                    function: "-".to_string(),
                    reason: format!("cannot negate {}", other.type_name()),
                }),
            }
        }
    }
}

async fn eval_binary<'a>(
    op: BinaryOp,
    left: &'a Expr,
    right: &'a Expr,
    row: &'a Row,
    ctx: &'a ExecContext,
) -> ExecutionResult<SqlValue> {
    if matches!(op, BinaryOp::Add | BinaryOp::Sub) {
        if let ExprKind::Interval { value, unit } = &right.kind {
            let base = eval_expr(left, row, ctx).await?;
            let amount_val = eval_expr(value, row, ctx).await?;
            let Some(amount) = amount_val.as_f64() else { return Ok(SqlValue::Null) };
            let signed = if op == BinaryOp::Sub { -(amount as i64) } else { amount as i64 };
            return esql_functions::scalar::datetime::add_interval(&base, signed, *unit);
        }
    }

    match op {
        BinaryOp::And => {
            let l = eval_expr(left, row, ctx).await?;
            if let SqlValue::Bool(false) = l {
                return Ok(SqlValue::Bool(false));
            }
            let r = eval_expr(right, row, ctx).await?;
            if let SqlValue::Bool(false) = r {
                return Ok(SqlValue::Bool(false));
            }
            if l.is_null() || r.is_null() {
                return Ok(SqlValue::Null);
            }
            Ok(SqlValue::Bool(l.is_truthy() && r.is_truthy()))
        }
        BinaryOp::Or => {
            let l = eval_expr(left, row, ctx).await?;
            if let SqlValue::Bool(true) = l {
                return Ok(SqlValue::Bool(true));
            }
            let r = eval_expr(right, row, ctx).await?;
            if let SqlValue::Bool(true) = r {
                return Ok(SqlValue::Bool(true));
            }
            if l.is_null() || r.is_null() {
                return Ok(SqlValue::Null);
            }
            Ok(SqlValue::Bool(l.is_truthy() || r.is_truthy()))
        }
        _ => {
            let l = eval_expr(left, row, ctx).await?;
            let r = eval_expr(right, row, ctx).await?;
            eval_binary_values(op, l, r)
        }
    }
}

pub(crate) fn apply_unary_value(op: UnaryOp, v: SqlValue) -> ExecutionResult<SqlValue> {
    match op {
        UnaryOp::IsNull => Ok(SqlValue::Bool(v.is_null())),
        UnaryOp::IsNotNull => Ok(SqlValue::Bool(!v.is_null())),
        UnaryOp::Not => {
            if v.is_null() {
                Ok(SqlValue::Null)
            } else {
                Ok(SqlValue::Bool(!v.is_truthy()))
            }
        }
        UnaryOp::Neg => match v {
            SqlValue::Null => Ok(SqlValue::Null),
            SqlValue::Int64(i) => Ok(SqlValue::Int64(-i)),
            SqlValue::BigInt(b) => Ok(SqlValue::BigInt(-b)),
            SqlValue::Float64(f) => Ok(SqlValue::Float64(-f)),
            other => Err(ExecutionError::InvalidArguments {
                function: "-".to_string(),
                reason: format!("cannot negate {}", other.type_name()),
            }),
        },
    }
}

pub(crate) fn eval_binary_values(op: BinaryOp, l: SqlValue, r: SqlValue) -> ExecutionResult<SqlValue> {
    use BinaryOp::*;
    match op {
        Eq | NotEq | Lt | LtEq | Gt | GtEq => {
            // Three-valued comparison collapses to `FALSE`, not `UNKNOWN`,
            // whenever either side is `NULL` — a deliberate simplification
            // over standard SQL (DESIGN.md's Open Question decision), so
            // `WHERE` never needs a tri-state boolean type of its own.
            if l.is_null() || r.is_null() {
                return Ok(SqlValue::Bool(false));
            }
            let cmp = l.partial_cmp(&r);
            let result = match (op, cmp) {
                (Eq, Some(std::cmp::Ordering::Equal)) => true,
                (Eq, _) => false,
                (NotEq, Some(std::cmp::Ordering::Equal)) => false,
                (NotEq, _) => true,
                (Lt, Some(o)) => o.is_lt(),
                (LtEq, Some(o)) => o.is_le(),
                (Gt, Some(o)) => o.is_gt(),
                (GtEq, Some(o)) => o.is_ge(),
                _ => false,
            };
            Ok(SqlValue::Bool(result))
        }
        Add | Sub | Mul | Div | Mod => {
            if l.is_null() || r.is_null() {
                return Ok(SqlValue::Null);
            }
            arithmetic(op, &l, &r)
        }
        Like | NotLike => {
            if l.is_null() || r.is_null() {
                return Ok(SqlValue::Null);
            }
            let pattern = r.to_string();
            let re = esql_functions::like_to_regex(&pattern)?;
            let matched = re.is_match(&l.to_string());
            Ok(SqlValue::Bool(matched != (op == NotLike)))
        }
        Concat => {
            if l.is_null() || r.is_null() {
                return Ok(SqlValue::Null);
            }
            Ok(SqlValue::String(format!("{l}{r}")))
        }
        And | Or => unreachable!("short-circuited above"),
    }
}

fn arithmetic(op: BinaryOp, l: &SqlValue, r: &SqlValue) -> ExecutionResult<SqlValue> {
    let Some(pair) = esql_ir::promote_numeric(l, r) else {
        return Err(ExecutionError::InvalidArguments {
            function: format!("{op:?}"),
            reason: format!("cannot apply {op:?} to {} and {}", l.type_name(), r.type_name()),
        });
    };
    match pair {
        NumericPair::Int(a, b) => match op {
            BinaryOp::Add => Ok(SqlValue::Int64(a.wrapping_add(b))),
            BinaryOp::Sub => Ok(SqlValue::Int64(a.wrapping_sub(b))),
            BinaryOp::Mul => Ok(SqlValue::Int64(a.wrapping_mul(b))),
            BinaryOp::Div => {
                if b == 0 {
                    Ok(SqlValue::Null)
                } else {
                    Ok(SqlValue::Int64(a / b))
                }
            }
            BinaryOp::Mod => {
                if b == 0 {
                    Ok(SqlValue::Null)
                } else {
                    Ok(SqlValue::Int64(a % b))
                }
            }
            _ => unreachable!(),
        },
        NumericPair::Float(a, b) => match op {
            BinaryOp::Add => Ok(SqlValue::Float64(a + b)),
            BinaryOp::Sub => Ok(SqlValue::Float64(a - b)),
            BinaryOp::Mul => Ok(SqlValue::Float64(a * b)),
            BinaryOp::Div => {
                if b == 0.0 {
                    Ok(SqlValue::Null)
                } else {
                    Ok(SqlValue::Float64(a / b))
                }
            }
            BinaryOp::Mod => {
                if b == 0.0 {
                    Ok(SqlValue::Null)
                } else {
                    Ok(SqlValue::Float64(a % b))
                }
            }
            _ => unreachable!(),
        },
        NumericPair::BigInt(a, b) => match op {
            BinaryOp::Add => Ok(SqlValue::BigInt(a + b)),
            BinaryOp::Sub => Ok(SqlValue::BigInt(a - b)),
            BinaryOp::Mul => Ok(SqlValue::BigInt(a * b)),
            BinaryOp::Div => {
                if b == num_bigint::BigInt::from(0) {
                    Ok(SqlValue::Null)
                } else {
                    Ok(SqlValue::BigInt(a / b))
                }
            }
            BinaryOp::Mod => {
                if b == num_bigint::BigInt::from(0) {
                    Ok(SqlValue::Null)
                } else {
                    Ok(SqlValue::BigInt(a % b))
                }
            }
            _ => unreachable!(),
        },
    }
}

async fn eval_case<'a>(
    operand: Option<&'a Expr>,
    whens: &'a [CaseWhen],
    else_result: Option<&'a Expr>,
    row: &'a Row,
    ctx: &'a ExecContext,
) -> ExecutionResult<SqlValue> {
    let operand_val = match operand {
        Some(e) => Some(eval_expr(e, row, ctx).await?),
        None => None,
    };
    for when in whens {
        let matched = match &operand_val {
            Some(o) => {
                let cond = eval_expr(&when.condition, row, ctx).await?;
                !o.is_null() && !cond.is_null() && o.partial_cmp(&cond) == Some(std::cmp::Ordering::Equal)
            }
            None => {
                let cond = eval_expr(&when.condition, row, ctx).await?;
                cond.is_truthy()
            }
        };
        if matched {
            return eval_expr(&when.result, row, ctx).await;
        }
    }
    match else_result {
        Some(e) => eval_expr(e, row, ctx).await,
        None => Ok(SqlValue::Null),
    }
}

fn cast_value(v: SqlValue, target: &str) -> ExecutionResult<SqlValue> {
    if v.is_null() {
        return Ok(SqlValue::Null);
    }
    let value_str = v.to_string();
    let invalid = || ExecutionError::InvalidCast { value: value_str.clone(), target: target.to_string() };
    match target.to_ascii_uppercase().as_str() {
        "TEXT" | "STRING" | "VARCHAR" => Ok(SqlValue::String(v.to_string())),
        "INT" | "INT64" | "INTEGER" => match v {
            SqlValue::Int64(i) => Ok(SqlValue::Int64(i)),
            SqlValue::BigInt(b) => Ok(match b.to_string().parse::<f64>() {
                Ok(f) if f.is_finite() => SqlValue::Int64(f as i64),
                _ => SqlValue::Null,
            }),
            SqlValue::Float64(f) => Ok(if f.is_finite() { SqlValue::Int64(f as i64) } else { SqlValue::Null }),
            SqlValue::String(s) => Ok(match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => SqlValue::Int64(f as i64),
                _ => SqlValue::Null,
            }),
            SqlValue::Bool(b) => Ok(SqlValue::Int64(b as i64)),
            _ => Err(invalid()),
        },
        "BIGINT" => match v {
            SqlValue::Int64(i) => Ok(SqlValue::BigInt(num_bigint::BigInt::from(i))),
            SqlValue::BigInt(b) => Ok(SqlValue::BigInt(b)),
            SqlValue::Float64(f) => Ok(bigint_from_f64(f).map(SqlValue::BigInt).unwrap_or(SqlValue::Null)),
            SqlValue::String(s) => {
                let s = s.trim();
                if let Ok(b) = s.parse::<num_bigint::BigInt>() {
                    Ok(SqlValue::BigInt(b))
                } else if let Ok(f) = s.parse::<f64>() {
                    Ok(bigint_from_f64(f).map(SqlValue::BigInt).unwrap_or(SqlValue::Null))
                } else {
                    Ok(SqlValue::Null)
                }
            }
            SqlValue::Bool(b) => Ok(SqlValue::BigInt(num_bigint::BigInt::from(b as i64))),
            _ => Err(invalid()),
        },
        "FLOAT" | "FLOAT64" | "DOUBLE" => match v {
            SqlValue::Int64(i) => Ok(SqlValue::Float64(i as f64)),
            SqlValue::BigInt(b) => Ok(SqlValue::Float64(b.to_string().parse::<f64>().unwrap_or(f64::NAN))),
            SqlValue::Float64(f) => Ok(SqlValue::Float64(f)),
            SqlValue::String(s) => Ok(match s.trim().parse::<f64>() {
                Ok(f) => SqlValue::Float64(f),
                Err(_) => SqlValue::Null,
            }),
            _ => Err(invalid()),
        },
        "BOOL" | "BOOLEAN" => match v {
            SqlValue::Bool(b) => Ok(SqlValue::Bool(b)),
            SqlValue::Int64(i) => Ok(SqlValue::Bool(i != 0)),
            SqlValue::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(SqlValue::Bool(true)),
                "false" | "f" | "0" => Ok(SqlValue::Bool(false)),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        },
        "JSON" => match v {
            SqlValue::Json(j) => Ok(SqlValue::Json(j)),
            SqlValue::String(s) => serde_json::from_str(&s).map(SqlValue::Json).map_err(|_| invalid()),
            other => Ok(SqlValue::Json(serde_json::Value::String(other.to_string()))),
        },
        "DATE" => match v {
            SqlValue::Date(s) => Ok(SqlValue::Date(s)),
            SqlValue::Timestamp(s) => Ok(SqlValue::Date(s.split('T').next().unwrap_or(&s).to_string())),
            SqlValue::String(s) => Ok(SqlValue::Date(s)),
            _ => Err(invalid()),
        },
        "TIMESTAMP" => match v {
            SqlValue::Timestamp(s) => Ok(SqlValue::Timestamp(s)),
            SqlValue::Date(s) => Ok(SqlValue::Timestamp(format!("{s}T00:00:00"))),
            SqlValue::String(s) => Ok(SqlValue::Timestamp(s)),
            _ => Err(invalid()),
        },
        other => Err(ExecutionError::InvalidCast { value: value_str, target: other.to_string() }),
    }
}

/// Truncates a finite `f64` towards zero and converts it to an arbitrary-
/// precision integer via its exact decimal expansion, so magnitudes beyond
/// `i64`/`i128` round-trip without precision loss.
fn bigint_from_f64(f: f64) -> Option<num_bigint::BigInt> {
    if !f.is_finite() {
        return None;
    }
    format!("{:.0}", f.trunc()).parse::<num_bigint::BigInt>().ok()
}

async fn eval_function<'a>(
    name: &'a str,
    args: &'a [Expr],
    _distinct: bool,
    filter: Option<&'a Expr>,
    row: &'a Row,
    ctx: &'a ExecContext,
) -> ExecutionResult<SqlValue> {
    if let Some(f) = filter {
        let cond = eval_expr(f, row, ctx).await?;
        if !cond.is_truthy() {
            return Ok(SqlValue::Null);
        }
    }

    let upper = name.to_ascii_uppercase();
    match upper.as_str() {
        "CURRENT_DATE" => return Ok(esql_functions::scalar::datetime::current_date(ctx.now)),
        "CURRENT_TIME" => return Ok(esql_functions::scalar::datetime::current_time(ctx.now)),
        "CURRENT_TIMESTAMP" => return Ok(esql_functions::scalar::datetime::current_timestamp(ctx.now)),
        _ => {}
    }

    let mut values = Vec::with_capacity(args.len());
    for a in args {
        values.push(eval_expr(a, row, ctx).await?);
    }

    match upper.as_str() {
        "DATE_TRUNC" => return esql_functions::scalar::datetime::date_trunc(&values),
        "EXTRACT" => return esql_functions::scalar::datetime::extract(&values),
        _ => {}
    }

    if let Some(f) = ctx.functions.get_scalar(&upper) {
        return f(&values);
    }
    if let Some(udf) = ctx.functions.get_udf(&upper) {
        return udf.apply(&values).await;
    }
    if let Some(spatial) = ctx.functions.get_spatial(&upper) {
        return spatial.evaluate(&values).await;
    }
    Err(ExecutionError::UnknownFunction(name.to_string()))
}
