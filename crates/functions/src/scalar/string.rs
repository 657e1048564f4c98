//! String scalar function family.

use esql_ir::{ExecutionError, SqlValue};

fn as_str(v: &SqlValue, _func: &str) -> Result<String, ExecutionError> {
    match v {
        SqlValue::String(s) => Ok(s.clone()),
        SqlValue::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

pub fn upper(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if let SqlValue::Null = args[0] {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::String(as_str(&args[0], "UPPER")?.to_uppercase()))
}

pub fn lower(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if let SqlValue::Null = args[0] {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::String(as_str(&args[0], "LOWER")?.to_lowercase()))
}

pub fn length(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if let SqlValue::Null = args[0] {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::Int64(as_str(&args[0], "LENGTH")?.chars().count() as i64))
}

pub fn substring(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if let SqlValue::Null = args[0] {
        return Ok(SqlValue::Null);
    }
    let s = as_str(&args[0], "SUBSTRING")?;
    let start = as_i64(&args[1], "SUBSTRING")?.max(1) as usize - 1;
    let len = args.get(2).map(|v| as_i64(v, "SUBSTRING")).transpose()?;
    let chars: Vec<char> = s.chars().collect();
    let end = match len {
        Some(l) => (start + l.max(0) as usize).min(chars.len()),
        None => chars.len(),
    };
    if start >= chars.len() {
        return Ok(SqlValue::String(String::new()));
    }
    Ok(SqlValue::String(chars[start..end].iter().collect()))
}

pub fn trim(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if let SqlValue::Null = args[0] {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::String(as_str(&args[0], "TRIM")?.trim().to_string()))
}

pub fn ltrim(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if let SqlValue::Null = args[0] {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::String(as_str(&args[0], "LTRIM")?.trim_start().to_string()))
}

pub fn rtrim(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if let SqlValue::Null = args[0] {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::String(as_str(&args[0], "RTRIM")?.trim_end().to_string()))
}

pub fn concat(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let mut out = String::new();
    for a in args {
        out.push_str(&as_str(a, "CONCAT")?);
    }
    Ok(SqlValue::String(out))
}

pub fn replace(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let s = as_str(&args[0], "REPLACE")?;
    let from = as_str(&args[1], "REPLACE")?;
    let to = as_str(&args[2], "REPLACE")?;
    Ok(SqlValue::String(s.replace(&from, &to)))
}

pub fn split_part(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let s = as_str(&args[0], "SPLIT_PART")?;
    let delim = as_str(&args[1], "SPLIT_PART")?;
    let n = as_i64(&args[2], "SPLIT_PART")?;
    if n < 1 {
        return Err(ExecutionError::InvalidArguments {
            function: "SPLIT_PART".to_string(),
            reason: "field index must be >= 1".to_string(),
        });
    }
    let part = s.split(&delim).nth(n as usize - 1).unwrap_or("");
    Ok(SqlValue::String(part.to_string()))
}

pub fn position(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let needle = as_str(&args[0], "POSITION")?;
    let haystack = as_str(&args[1], "POSITION")?;
    let pos = haystack.find(&needle).map(|b| haystack[..b].chars().count() as i64 + 1).unwrap_or(0);
    Ok(SqlValue::Int64(pos))
}

pub fn lpad(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    pad(args, true)
}

pub fn rpad(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    pad(args, false)
}

fn pad(args: &[SqlValue], left: bool) -> Result<SqlValue, ExecutionError> {
    if args.iter().take(2).any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let s = as_str(&args[0], "PAD")?;
    let len = as_i64(&args[1], "PAD")?.max(0) as usize;
    let fill = args.get(2).map(|v| as_str(v, "PAD")).transpose()?.unwrap_or_else(|| " ".to_string());
    let chars: Vec<char> = s.chars().collect();
    if chars.len() >= len || fill.is_empty() {
        return Ok(SqlValue::String(chars.into_iter().take(len).collect()));
    }
    let fill_chars: Vec<char> = fill.chars().collect();
    let mut padding = String::new();
    while padding.chars().count() < len - chars.len() {
        padding.extend(fill_chars.iter());
    }
    let padding: String = padding.chars().take(len - chars.len()).collect();
    let result = if left { format!("{padding}{s}") } else { format!("{s}{padding}") };
    Ok(SqlValue::String(result))
}

fn as_i64(v: &SqlValue, func: &str) -> Result<i64, ExecutionError> {
    match v {
        SqlValue::Int64(i) => Ok(*i),
        SqlValue::Float64(f) => Ok(*f as i64),
        _ => Err(ExecutionError::InvalidArguments {
            function: func.to_string(),
            reason: "expected an integer argument".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_and_lower_round_trip() {
        assert_eq!(upper(&[SqlValue::String("mix".into())]).unwrap(), SqlValue::String("MIX".into()));
        assert_eq!(lower(&[SqlValue::String("MIX".into())]).unwrap(), SqlValue::String("mix".into()));
    }

    #[test]
    fn null_propagates_through_every_function() {
        assert_eq!(upper(&[SqlValue::Null]).unwrap(), SqlValue::Null);
        assert_eq!(length(&[SqlValue::Null]).unwrap(), SqlValue::Null);
        assert_eq!(concat(&[SqlValue::String("a".into()), SqlValue::Null]).unwrap(), SqlValue::Null);
    }

    #[test]
    fn substring_is_one_indexed() {
        let v = substring(&[SqlValue::String("hello".into()), SqlValue::Int64(2), SqlValue::Int64(3)]).unwrap();
        assert_eq!(v, SqlValue::String("ell".into()));
    }

    #[test]
    fn split_part_rejects_non_positive_index() {
        let err = split_part(&[SqlValue::String("a,b".into()), SqlValue::String(",".into()), SqlValue::Int64(0)]);
        assert!(err.is_err());
    }

    #[test]
    fn lpad_fills_to_requested_length() {
        let v = lpad(&[SqlValue::String("7".into()), SqlValue::Int64(3), SqlValue::String("0".into())]).unwrap();
        assert_eq!(v, SqlValue::String("007".into()));
    }
}
