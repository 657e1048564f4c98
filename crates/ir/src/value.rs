//! # SQL values
//!
//! [`SqlValue`] is the tagged union every cell, literal, and expression
//! result is represented as. Numeric variants are kept unboxed so that the
//! common `Int64`/`Float64` path never allocates.
//!
//! ```
//! use esql_ir::SqlValue;
//!
//! let v = SqlValue::Int64(42);
//! assert!(v.is_truthy());
//! ```

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// A single SQL value.
///
/// `#[non_exhaustive]` because the spatial function family (see
/// `esql-functions`) may add opaque payloads without this becoming a
/// breaking change for callers who already match exhaustively with a
/// wildcard arm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int64(i64),
    BigInt(BigInt),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// ISO-8601 `YYYY-MM-DD`.
    Date(String),
    /// ISO-8601 `HH:MM:SS[.ffffff]`.
    Time(String),
    /// ISO-8601 `YYYY-MM-DDTHH:MM:SS[.ffffff][Z]`.
    Timestamp(String),
    Json(serde_json::Value),
    /// Opaque geometry payload; the core never inspects this, it only
    /// round-trips it for the benefit of a registered spatial predicate.
    Geometry(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// SQL truthiness used by `WHERE <expr>` (equivalent to `<expr> = TRUE`)
    /// and by short-circuiting `AND`/`OR`.
    pub fn is_truthy(&self) -> bool {
        matches!(self, SqlValue::Bool(true))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SqlValue::Int64(_) | SqlValue::BigInt(_) | SqlValue::Float64(_))
    }

    /// Best-effort numeric widening to `f64`, used by comparisons and
    /// arithmetic once both operands are known numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Int64(i) => Some(*i as f64),
            SqlValue::BigInt(b) => bigint_to_f64(b),
            SqlValue::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Stable textual form used for GROUP BY / DISTINCT / hash-join key
    /// canonicalization (`stringify` in the spec's wording).
    pub fn stringify_key(&self) -> String {
        match self {
            SqlValue::Null => "null".to_string(),
            SqlValue::Bool(b) => b.to_string(),
            SqlValue::Int64(i) => i.to_string(),
            SqlValue::BigInt(b) => b.to_string(),
            SqlValue::Float64(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            SqlValue::String(s) => format!("s:{s}"),
            SqlValue::Bytes(b) => format!("b:{b:02x?}"),
            SqlValue::Date(s) | SqlValue::Time(s) | SqlValue::Timestamp(s) => format!("t:{s}"),
            SqlValue::Json(v) => format!("j:{v}"),
            SqlValue::Geometry(g) => format!("g:{g:02x?}"),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Bool(_) => "BOOL",
            SqlValue::Int64(_) => "INT64",
            SqlValue::BigInt(_) => "BIGINT",
            SqlValue::Float64(_) => "FLOAT64",
            SqlValue::String(_) => "STRING",
            SqlValue::Bytes(_) => "BYTES",
            SqlValue::Date(_) => "DATE",
            SqlValue::Time(_) => "TIME",
            SqlValue::Timestamp(_) => "TIMESTAMP",
            SqlValue::Json(_) => "JSON",
            SqlValue::Geometry(_) => "GEOMETRY",
        }
    }
}

fn bigint_to_f64(b: &BigInt) -> Option<f64> {
    use num_bigint::ToBigInt;
    let _ = b.to_bigint();
    b.to_string().parse::<f64>().ok()
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int64(i) => write!(f, "{i}"),
            SqlValue::BigInt(b) => write!(f, "{b}"),
            SqlValue::Float64(v) => write!(f, "{v}"),
            SqlValue::String(s) => write!(f, "{s}"),
            SqlValue::Bytes(b) => write!(f, "{b:02x?}"),
            SqlValue::Date(s) | SqlValue::Time(s) | SqlValue::Timestamp(s) => write!(f, "{s}"),
            SqlValue::Json(v) => write!(f, "{v}"),
            SqlValue::Geometry(_) => write!(f, "<geometry>"),
        }
    }
}

impl PartialEq for SqlValue {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

/// Ordering used by `ORDER BY`, `MIN`/`MAX`, and `BETWEEN`. `NULL` is
/// handled by the caller (sort/compare code), never compares equal/less
/// here except to itself.
impl PartialOrd for SqlValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use SqlValue::*;
        match (self, other) {
            (Null, Null) => Some(Ordering::Equal),
            (Null, _) | (_, Null) => None,
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (String(a), String(b)) => a.partial_cmp(b),
            (Bytes(a), Bytes(b)) => a.partial_cmp(b),
            (Date(a), Date(b)) | (Time(a), Time(b)) | (Timestamp(a), Timestamp(b)) => {
                a.partial_cmp(b)
            }
            (a, b) if a.is_numeric() && b.is_numeric() => match (a, b) {
                (Int64(x), Int64(y)) => x.partial_cmp(y),
                (BigInt(x), BigInt(y)) => x.partial_cmp(y),
                _ => a.as_f64().and_then(|x| b.as_f64().map(|y| (x, y))).and_then(
                    |(x, y)| x.partial_cmp(&y),
                ),
            },
            // Mixed, non-numeric types fall back to string coercion per
            // the engine's permissive comparison semantics.
            (a, b) => a.to_string().partial_cmp(&b.to_string()),
        }
    }
}

/// Numeric promotion for arithmetic: two `Int64`s stay `Int64`; any `Float64`
/// operand promotes the result to `Float64`; a `BigInt` operand is
/// preserved unless mixed with `Float64`, in which case it also widens.
pub fn promote_numeric(a: &SqlValue, b: &SqlValue) -> Option<NumericPair> {
    use SqlValue::*;
    match (a, b) {
        (Int64(x), Int64(y)) => Some(NumericPair::Int(*x, *y)),
        (Float64(_), _) | (_, Float64(_)) => {
            Some(NumericPair::Float(a.as_f64()?, b.as_f64()?))
        }
        (BigInt(x), BigInt(y)) => Some(NumericPair::BigInt(x.clone(), y.clone())),
        (BigInt(x), Int64(y)) => Some(NumericPair::BigInt(x.clone(), BigInt::from(*y))),
        (Int64(x), BigInt(y)) => Some(NumericPair::BigInt(BigInt::from(*x), y.clone())),
        _ => None,
    }
}

pub enum NumericPair {
    Int(i64, i64),
    Float(f64, f64),
    BigInt(BigInt, BigInt),
}
