//! JSON scalar function family.

use esql_ir::{ExecutionError, SqlValue};
use serde_json::Value as Json;

fn to_json(v: &SqlValue) -> Json {
    match v {
        SqlValue::Null => Json::Null,
        SqlValue::Bool(b) => Json::Bool(*b),
        SqlValue::Int64(i) => Json::from(*i),
        SqlValue::Float64(f) => serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        SqlValue::Json(j) => j.clone(),
        other => Json::String(other.to_string()),
    }
}

/// `JSON_OBJECT(key1, value1, key2, value2, ...)`.
pub fn json_object(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args.len() % 2 != 0 {
        return Err(ExecutionError::InvalidArguments {
            function: "JSON_OBJECT".to_string(),
            reason: "expects an even number of key/value arguments".to_string(),
        });
    }
    let mut map = serde_json::Map::new();
    for pair in args.chunks(2) {
        let key = match &pair[0] {
            SqlValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        map.insert(key, to_json(&pair[1]));
    }
    Ok(SqlValue::Json(Json::Object(map)))
}

fn parse_json(v: &SqlValue) -> Result<Json, ExecutionError> {
    match v {
        SqlValue::Json(j) => Ok(j.clone()),
        SqlValue::String(s) => {
            serde_json::from_str(s).map_err(|e| ExecutionError::InvalidJson(e.to_string()))
        }
        other => Err(ExecutionError::InvalidJson(format!("not JSON: {other}"))),
    }
}

fn path_get<'a>(value: &'a Json, path: &str) -> Option<&'a Json> {
    let mut cur = value;
    for segment in path.trim_start_matches('$').trim_start_matches('.').split('.') {
        if segment.is_empty() {
            continue;
        }
        cur = cur.as_object()?.get(segment)?;
    }
    Some(cur)
}

/// `JSON_VALUE(doc, path)` — extracts a scalar, returning `NULL` for
/// missing paths or non-scalar results.
pub fn json_value(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let doc = parse_json(&args[0])?;
    let path = match &args[1] {
        SqlValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    match path_get(&doc, &path) {
        Some(Json::String(s)) => Ok(SqlValue::String(s.clone())),
        Some(Json::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Int64(i))
            } else {
                Ok(SqlValue::Float64(n.as_f64().unwrap_or_default()))
            }
        }
        Some(Json::Bool(b)) => Ok(SqlValue::Bool(*b)),
        _ => Ok(SqlValue::Null),
    }
}

/// `JSON_QUERY(doc, path)` — extracts an object/array sub-document.
pub fn json_query(args: &[SqlValue]) -> Result<SqlValue, ExecutionError> {
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let doc = parse_json(&args[0])?;
    let path = match &args[1] {
        SqlValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    match path_get(&doc, &path) {
        Some(v @ (Json::Object(_) | Json::Array(_))) => Ok(SqlValue::Json(v.clone())),
        _ => Ok(SqlValue::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_object_builds_from_key_value_pairs() {
        let v = json_object(&[SqlValue::String("a".into()), SqlValue::Int64(1)]).unwrap();
        assert_eq!(v, SqlValue::Json(serde_json::json!({"a": 1})));
    }

    #[test]
    fn json_object_rejects_odd_argument_count() {
        assert!(json_object(&[SqlValue::String("a".into())]).is_err());
    }

    #[test]
    fn json_value_extracts_a_scalar_by_path() {
        let doc = SqlValue::String(r#"{"user": {"name": "ann"}}"#.to_string());
        let v = json_value(&[doc, SqlValue::String("user.name".into())]).unwrap();
        assert_eq!(v, SqlValue::String("ann".into()));
    }

    #[test]
    fn json_value_missing_path_is_null() {
        let doc = SqlValue::String(r#"{"a": 1}"#.to_string());
        let v = json_value(&[doc, SqlValue::String("b".into())]).unwrap();
        assert_eq!(v, SqlValue::Null);
    }

    #[test]
    fn json_query_extracts_sub_documents_only() {
        let doc = SqlValue::String(r#"{"a": {"b": 2}}"#.to_string());
        let v = json_query(&[doc, SqlValue::String("a".into())]).unwrap();
        assert_eq!(v, SqlValue::Json(serde_json::json!({"b": 2})));
    }
}
