//! # Aggregate functions
//!
//! Each aggregate is a small stateful accumulator fed one `SqlValue` per
//! group row (after its `FILTER` clause, if any, has already excluded
//! rows) and finalized once per group.

use std::collections::HashSet;

use esql_ir::{ExecutionError, SqlValue};
use serde_json::Value as Json;

pub trait Aggregate: Send {
    /// `COUNT(*)` is special-cased by the caller (it never calls `feed`
    /// with a value, it just counts rows in the group); every other
    /// aggregate is fed one value per row.
    fn feed(&mut self, value: SqlValue);
    fn finish(self: Box<Self>) -> SqlValue;
}

pub fn make_aggregate(name: &str, distinct: bool) -> Result<Box<dyn Aggregate>, ExecutionError> {
    match name.to_ascii_uppercase().as_str() {
        "COUNT" => Ok(Box::new(Count::new(distinct))),
        "SUM" => Ok(Box::new(SumAvg::new(distinct, false))),
        "AVG" => Ok(Box::new(SumAvg::new(distinct, true))),
        "MIN" => Ok(Box::new(MinMax::new(true))),
        "MAX" => Ok(Box::new(MinMax::new(false))),
        "STDDEV_SAMP" => Ok(Box::new(Stddev::new(true))),
        "STDDEV_POP" => Ok(Box::new(Stddev::new(false))),
        "JSON_ARRAYAGG" => Ok(Box::new(JsonArrayAgg::new(distinct))),
        other => Err(ExecutionError::UnknownFunction(other.to_string())),
    }
}

struct Count {
    distinct: bool,
    seen: HashSet<String>,
    n: i64,
}

impl Count {
    fn new(distinct: bool) -> Self {
        Self { distinct, seen: HashSet::new(), n: 0 }
    }
}

impl Aggregate for Count {
    fn feed(&mut self, value: SqlValue) {
        if value.is_null() {
            return;
        }
        if self.distinct {
            if self.seen.insert(value.stringify_key()) {
                self.n += 1;
            }
        } else {
            self.n += 1;
        }
    }

    fn finish(self: Box<Self>) -> SqlValue {
        SqlValue::Int64(self.n)
    }
}

struct SumAvg {
    distinct: bool,
    average: bool,
    seen: HashSet<String>,
    sum: f64,
    count: i64,
}

impl SumAvg {
    fn new(distinct: bool, average: bool) -> Self {
        Self { distinct, average, seen: HashSet::new(), sum: 0.0, count: 0 }
    }
}

impl Aggregate for SumAvg {
    fn feed(&mut self, value: SqlValue) {
        let Some(f) = value.as_f64() else { return };
        if !f.is_finite() {
            return;
        }
        if self.distinct && !self.seen.insert(value.stringify_key()) {
            return;
        }
        self.sum += f;
        self.count += 1;
    }

    fn finish(self: Box<Self>) -> SqlValue {
        if self.count == 0 {
            // SUM/AVG over an empty (post-NULL-filter) group is NULL, not
            // zero — an explicit spec choice, see DESIGN.md.
            return SqlValue::Null;
        }
        if self.average {
            SqlValue::Float64(self.sum / self.count as f64)
        } else {
            SqlValue::Float64(self.sum)
        }
    }
}

struct MinMax {
    want_min: bool,
    best: Option<SqlValue>,
}

impl MinMax {
    fn new(want_min: bool) -> Self {
        Self { want_min, best: None }
    }
}

impl Aggregate for MinMax {
    fn feed(&mut self, value: SqlValue) {
        if value.is_null() {
            return;
        }
        self.best = match self.best.take() {
            None => Some(value),
            Some(current) => {
                let replace = if self.want_min {
                    value.partial_cmp(&current) == Some(std::cmp::Ordering::Less)
                } else {
                    value.partial_cmp(&current) == Some(std::cmp::Ordering::Greater)
                };
                Some(if replace { value } else { current })
            }
        };
    }

    fn finish(self: Box<Self>) -> SqlValue {
        self.best.unwrap_or(SqlValue::Null)
    }
}

struct Stddev {
    sample: bool,
    values: Vec<f64>,
}

impl Stddev {
    fn new(sample: bool) -> Self {
        Self { sample, values: Vec::new() }
    }
}

impl Aggregate for Stddev {
    fn feed(&mut self, value: SqlValue) {
        if let Some(f) = value.as_f64() {
            if f.is_finite() {
                self.values.push(f);
            }
        }
    }

    fn finish(self: Box<Self>) -> SqlValue {
        let n = self.values.len();
        if self.sample && n < 2 {
            return SqlValue::Null;
        }
        if !self.sample && n == 0 {
            return SqlValue::Null;
        }
        let mean = self.values.iter().sum::<f64>() / n as f64;
        let sum_sq = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        let divisor = if self.sample { (n - 1) as f64 } else { n as f64 };
        SqlValue::Float64((sum_sq / divisor).sqrt())
    }
}

struct JsonArrayAgg {
    distinct: bool,
    seen: HashSet<String>,
    items: Vec<Json>,
}

impl JsonArrayAgg {
    fn new(distinct: bool) -> Self {
        Self { distinct, seen: HashSet::new(), items: Vec::new() }
    }
}

impl Aggregate for JsonArrayAgg {
    fn feed(&mut self, value: SqlValue) {
        if self.distinct && !self.seen.insert(value.stringify_key()) {
            return;
        }
        let json = match value {
            SqlValue::Null => Json::Null,
            SqlValue::Bool(b) => Json::Bool(b),
            SqlValue::Int64(i) => Json::from(i),
            SqlValue::Float64(f) => serde_json::Number::from_f64(f).map(Json::Number).unwrap_or(Json::Null),
            SqlValue::Json(j) => j,
            other => Json::String(other.to_string()),
        };
        self.items.push(json);
    }

    fn finish(self: Box<Self>) -> SqlValue {
        SqlValue::Json(Json::Array(self.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_over_empty_group_is_null_not_zero() {
        let agg = make_aggregate("SUM", false).unwrap();
        assert_eq!(agg.finish(), SqlValue::Null);
    }

    #[test]
    fn count_ignores_nulls_and_dedupes_when_distinct() {
        let mut agg = make_aggregate("COUNT", true).unwrap();
        agg.feed(SqlValue::Int64(1));
        agg.feed(SqlValue::Int64(1));
        agg.feed(SqlValue::Null);
        agg.feed(SqlValue::Int64(2));
        assert_eq!(agg.finish(), SqlValue::Int64(2));
    }

    #[test]
    fn stddev_samp_is_null_for_fewer_than_two_values() {
        let mut agg = make_aggregate("STDDEV_SAMP", false).unwrap();
        agg.feed(SqlValue::Int64(5));
        assert_eq!(agg.finish(), SqlValue::Null);
    }

    #[test]
    fn min_max_ignore_nulls() {
        let mut min = make_aggregate("MIN", false).unwrap();
        min.feed(SqlValue::Null);
        min.feed(SqlValue::Int64(3));
        min.feed(SqlValue::Int64(1));
        assert_eq!(min.finish(), SqlValue::Int64(1));
    }
}
