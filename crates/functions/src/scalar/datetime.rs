//! Date/time scalar function family, `chrono`-backed.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use esql_ir::{ExecutionError, SqlValue};

/// `CURRENT_DATE`/`CURRENT_TIME`/`CURRENT_TIMESTAMP` take their instant
/// from the caller rather than the system clock, since a deterministic
/// engine must not observe wall-clock time on its own — see
/// `esql-engine::EngineOptions::clock`.
pub fn current_date(now: NaiveDateTime) -> SqlValue {
    SqlValue::Date(now.date().format("%Y-%m-%d").to_string())
}

pub fn current_time(now: NaiveDateTime) -> SqlValue {
    SqlValue::Time(now.time().format("%H:%M:%S").to_string())
}

pub fn current_timestamp(now: NaiveDateTime) -> SqlValue {
    SqlValue::Timestamp(now.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn parse_datetime(v: &SqlValue, func: &str) -> Result<NaiveDateTime, ExecutionError> {
    let text = match v {
        SqlValue::Timestamp(s) => s.clone(),
        SqlValue::Date(s) => format!("{s}T00:00:00"),
        SqlValue::String(s) => s.clone(),
        other => {
            return Err(ExecutionError::InvalidArguments {
                function: func.to_string(),
                reason: format!("expected a date/time value, found {}", other.type_name()),
            })
        }
    };
    let normalized = text.trim_end_matches('Z').replace('T', " ");
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").map(|d| d.and_hms_opt(0, 0, 0).unwrap()))
        .map_err(|e| ExecutionError::InvalidArguments { function: func.to_string(), reason: e.to_string() })
}

pub fn date_trunc(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let unit = match &args[0] {
        SqlValue::String(s) => s.to_uppercase(),
        other => other.to_string().to_uppercase(),
    };
    let dt = parse_datetime(&args[1], "DATE_TRUNC")?;
    let truncated = match unit.as_str() {
        "YEAR" => NaiveDate::from_ymd_opt(dt.year(), 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        "MONTH" => NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        "DAY" => dt.date().and_hms_opt(0, 0, 0).unwrap(),
        "HOUR" => dt.date().and_hms_opt(dt.hour(), 0, 0).unwrap(),
        "MINUTE" => dt.date().and_hms_opt(dt.hour(), dt.minute(), 0).unwrap(),
        other => {
            return Err(ExecutionError::InvalidArguments {
                function: "DATE_TRUNC".to_string(),
                reason: format!("unsupported truncation unit '{other}'"),
            })
        }
    };
    Ok(SqlValue::Timestamp(truncated.format("%Y-%m-%dT%H:%M:%S").to_string()))
}

pub fn extract(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let field = match &args[0] {
        SqlValue::String(s) => s.to_uppercase(),
        other => other.to_string().to_uppercase(),
    };
    let dt = parse_datetime(&args[1], "EXTRACT")?;
    let value = match field.as_str() {
        "YEAR" => dt.year() as i64,
        "MONTH" => dt.month() as i64,
        "DAY" => dt.day() as i64,
        "HOUR" => dt.hour() as i64,
        "MINUTE" => dt.minute() as i64,
        "SECOND" => dt.second() as i64,
        other => {
            return Err(ExecutionError::InvalidArguments {
                function: "EXTRACT".to_string(),
                reason: format!("unsupported field '{other}'"),
            })
        }
    };
    Ok(SqlValue::Int64(value))
}

/// `INTERVAL <n> <unit>` arithmetic: adds a UTC-normalized offset to a
/// `Date`/`Timestamp`, preserving the input's shape (a `Date` input yields
/// a `Date` output; a `Timestamp` input yields a `Timestamp` output).
pub fn add_interval(
    base: &SqlValue,
    amount: i64,
    unit: esql_ir::IntervalUnit,
) -> Result<SqlValue, ExecutionError> {
    use esql_ir::IntervalUnit::*;
    if base.is_null() {
        return Ok(SqlValue::Null);
    }
    let is_date_only = matches!(base, SqlValue::Date(_));
    let dt = parse_datetime(base, "INTERVAL")?;
    let result = match unit {
        Year => dt.with_year(dt.year() + amount as i32),
        Month => {
            let total_months = dt.month0() as i64 + amount;
            let year = dt.year() + total_months.div_euclid(12) as i32;
            let month0 = total_months.rem_euclid(12) as u32;
            NaiveDate::from_ymd_opt(year, month0 + 1, dt.day().min(28))
                .map(|d| d.and_time(dt.time()))
        }
        Day => Some(dt + chrono::Duration::days(amount)),
        Hour => Some(dt + chrono::Duration::hours(amount)),
        Minute => Some(dt + chrono::Duration::minutes(amount)),
        Second => Some(dt + chrono::Duration::seconds(amount)),
    };
    let result = result.ok_or_else(|| ExecutionError::InvalidArguments {
        function: "INTERVAL".to_string(),
        reason: "resulting date is out of range".to_string(),
    })?;
    if is_date_only {
        Ok(SqlValue::Date(result.date().format("%Y-%m-%d").to_string()))
    } else {
        Ok(SqlValue::Timestamp(result.format("%Y-%m-%dT%H:%M:%S").to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esql_ir::IntervalUnit;

    #[test]
    fn date_trunc_to_month_zeroes_the_day_and_time() {
        let ts = SqlValue::Timestamp("2024-03-17T10:30:00".to_string());
        let v = date_trunc(&[SqlValue::String("MONTH".into()), ts]).unwrap();
        assert_eq!(v, SqlValue::Timestamp("2024-03-01T00:00:00".to_string()));
    }

    #[test]
    fn extract_reads_the_requested_field() {
        let ts = SqlValue::Timestamp("2024-03-17T10:30:45".to_string());
        assert_eq!(extract(&[SqlValue::String("YEAR".into()), ts.clone()]).unwrap(), SqlValue::Int64(2024));
        assert_eq!(extract(&[SqlValue::String("SECOND".into()), ts]).unwrap(), SqlValue::Int64(45));
    }

    #[test]
    fn add_interval_preserves_date_only_shape() {
        let d = SqlValue::Date("2024-01-31".to_string());
        let v = add_interval(&d, 1, IntervalUnit::Month).unwrap();
        assert_eq!(v, SqlValue::Date("2024-02-28".to_string()));
    }

    #[test]
    fn add_interval_on_null_is_null() {
        assert_eq!(add_interval(&SqlValue::Null, 1, IntervalUnit::Day).unwrap(), SqlValue::Null);
    }

    #[test]
    fn current_functions_read_from_the_supplied_clock_not_the_system() {
        let now = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(current_date(now), SqlValue::Date("2024-06-01".to_string()));
        assert_eq!(current_time(now), SqlValue::Time("12:00:00".to_string()));
    }
}
