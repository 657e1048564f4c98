//! Math scalar function family.

use esql_ir::{ExecutionError, SqlValue};

fn as_f64(v: &SqlValue, func: &str) -> Result<f64, ExecutionError> {
    v.as_f64().ok_or_else(|| ExecutionError::InvalidArguments {
        function: func.to_string(),
        reason: format!("expected a numeric argument, found {}", v.type_name()),
    })
}

pub fn abs(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    match &args[0] {
        SqlValue::Null => Ok(SqlValue::Null),
        SqlValue::Int64(i) => Ok(SqlValue::Int64(i.abs())),
        v => Ok(SqlValue::Float64(as_f64(v, "ABS")?.abs())),
    }
}

pub fn ceil(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::Float64(as_f64(&args[0], "CEIL")?.ceil()))
}

pub fn floor(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::Float64(as_f64(&args[0], "FLOOR")?.floor()))
}

pub fn round(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let v = as_f64(&args[0], "ROUND")?;
    let digits = args.get(1).map(|d| as_f64(d, "ROUND")).transpose()?.unwrap_or(0.0) as i32;
    let factor = 10f64.powi(digits);
    Ok(SqlValue::Float64((v * factor).round() / factor))
}

pub fn power(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::Float64(as_f64(&args[0], "POWER")?.powf(as_f64(&args[1], "POWER")?)))
}

pub fn sqrt(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::Float64(as_f64(&args[0], "SQRT")?.sqrt()))
}

pub fn modulo(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let a = as_f64(&args[0], "MOD")?;
    let b = as_f64(&args[1], "MOD")?;
    if b == 0.0 {
        return Ok(SqlValue::Null);
    }
    if let (SqlValue::Int64(x), SqlValue::Int64(y)) = (&args[0], &args[1]) {
        return Ok(SqlValue::Int64(x % y));
    }
    Ok(SqlValue::Float64(a % b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_keeps_integers_integral() {
        assert_eq!(abs(&[SqlValue::Int64(-5)]).unwrap(), SqlValue::Int64(5));
        assert_eq!(abs(&[SqlValue::Float64(-2.5)]).unwrap(), SqlValue::Float64(2.5));
    }

    #[test]
    fn round_respects_digit_argument() {
        let v = round(&[SqlValue::Float64(3.14159), SqlValue::Int64(2)]).unwrap();
        assert_eq!(v, SqlValue::Float64(3.14));
    }

    #[test]
    fn modulo_by_zero_is_null() {
        assert_eq!(modulo(&[SqlValue::Int64(7), SqlValue::Int64(0)]).unwrap(), SqlValue::Null);
    }

    #[test]
    fn power_and_sqrt_agree() {
        let squared = power(&[SqlValue::Float64(3.0), SqlValue::Float64(2.0)]).unwrap();
        assert_eq!(squared, SqlValue::Float64(9.0));
        assert_eq!(sqrt(&[squared]).unwrap(), SqlValue::Float64(3.0));
    }
}
