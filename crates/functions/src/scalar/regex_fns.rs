//! Regex scalar function family, and the `LIKE` pattern translator.

use esql_ir::{ExecutionError, SqlValue};
use regex::{escape, Regex};

/// Translates a SQL `LIKE` pattern (`%`/`_`/backslash-escaped metachars)
/// into an anchored, case-insensitive `regex::Regex`.
///
/// `LIKE` is specified as case-insensitive by this engine (an explicit
/// dialect choice, see DESIGN.md).
pub fn like_to_regex(pattern: &str) -> Result<Regex, ExecutionError> {
    let mut out = String::from("(?is)^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push_str(&escape(&next.to_string()));
                }
            }
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&escape(&other.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out)
        .map_err(|e| ExecutionError::InvalidArguments { function: "LIKE".to_string(), reason: e.to_string() })
}

fn as_str(v: &SqlValue) -> String {
    match v {
        SqlValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn regexp_like(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let re = compile(&as_str(&args[1]), "REGEXP_LIKE")?;
    Ok(SqlValue::Bool(re.is_match(&as_str(&args[0]))))
}

pub fn regexp_replace(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let re = compile(&as_str(&args[1]), "REGEXP_REPLACE")?;
    let replacement = as_str(&args[2]);
    Ok(SqlValue::String(re.replace_all(&as_str(&args[0]), replacement.as_str()).to_string()))
}

pub fn regexp_extract(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.iter().any(|v| v.is_null()) {
        return Ok(SqlValue::Null);
    }
    let re = compile(&as_str(&args[1]), "REGEXP_EXTRACT")?;
    let group = args.get(2).and_then(|v| v.as_f64()).map(|f| f as usize).unwrap_or(0);
    match re.captures(&as_str(&args[0])) {
        Some(caps) => Ok(caps
            .get(group)
            .map(|m| SqlValue::String(m.as_str().to_string()))
            .unwrap_or(SqlValue::Null)),
        None => Ok(SqlValue::Null),
    }
}

fn compile(pattern: &str, func: &str) -> Result<Regex, ExecutionError> {
    Regex::new(pattern).map_err(|e| ExecutionError::InvalidArguments {
        function: func.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_translates_wildcards_and_escapes_metachars() {
        let re = like_to_regex("a%b_c").unwrap();
        assert!(re.is_match("aXXbYc"));
        assert!(!re.is_match("aXXbc"));
        let re = like_to_regex("100\\%").unwrap();
        assert!(re.is_match("100%"));
    }

    #[test]
    fn like_is_case_insensitive() {
        let re = like_to_regex("HELLO").unwrap();
        assert!(re.is_match("hello"));
    }
}
