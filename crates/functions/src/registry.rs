//! # Scalar function registry
//!
//! Grounded on `function-registry/src/registry.rs`'s `FunctionRegistry`
//! (case-insensitive lookup via `eq_ignore_ascii_case`), rebuilt here to
//! hold callable closures instead of metadata so it can actually dispatch
//! calls rather than just describe them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use esql_ir::{ExecutionError, SqlValue};

use crate::scalar::{json, math, regex_fns, string};
use crate::udf::UserDefinedFunction;

pub type ScalarFn = Arc<dyn Fn(&[SqlValue]) -> Result<SqlValue, ExecutionError> + Send + Sync>;

/// Registration interface for a dialect/domain-specific predicate family
/// that the core engine does not ship a concrete implementation of (the
/// spec's "pluggable function pack" — spatial predicates live outside this
/// crate).
#[async_trait]
pub trait SpatialPredicate: Send + Sync {
    fn name(&self) -> &str;
    async fn evaluate(&self, args: &[SqlValue]) -> Result<SqlValue, ExecutionError>;
}

pub struct FunctionRegistry {
    scalars: HashMap<String, ScalarFn>,
    udfs: HashMap<String, Arc<dyn UserDefinedFunction>>,
    spatial: HashMap<String, Arc<dyn SpatialPredicate>>,
}

fn wrap(f: fn(&[SqlValue]) -> Result<SqlValue, ExecutionError>) -> ScalarFn {
    Arc::new(f)
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut scalars: HashMap<String, ScalarFn> = HashMap::new();
        scalars.insert("UPPER".into(), wrap(string::upper));
        scalars.insert("LOWER".into(), wrap(string::lower));
        scalars.insert("LENGTH".into(), wrap(string::length));
        scalars.insert("SUBSTRING".into(), wrap(string::substring));
        scalars.insert("TRIM".into(), wrap(string::trim));
        scalars.insert("LTRIM".into(), wrap(string::ltrim));
        scalars.insert("RTRIM".into(), wrap(string::rtrim));
        scalars.insert("CONCAT".into(), wrap(string::concat));
        scalars.insert("REPLACE".into(), wrap(string::replace));
        scalars.insert("SPLIT_PART".into(), wrap(string::split_part));
        scalars.insert("POSITION".into(), wrap(string::position));
        scalars.insert("LPAD".into(), wrap(string::lpad));
        scalars.insert("RPAD".into(), wrap(string::rpad));

        scalars.insert("ABS".into(), wrap(math::abs));
        scalars.insert("CEIL".into(), wrap(math::ceil));
        scalars.insert("FLOOR".into(), wrap(math::floor));
        scalars.insert("ROUND".into(), wrap(math::round));
        scalars.insert("POWER".into(), wrap(math::power));
        scalars.insert("SQRT".into(), wrap(math::sqrt));
        scalars.insert("MOD".into(), wrap(math::modulo));

        scalars.insert("REGEXP_LIKE".into(), wrap(regex_fns::regexp_like));
        scalars.insert("REGEXP_REPLACE".into(), wrap(regex_fns::regexp_replace));
        scalars.insert("REGEXP_EXTRACT".into(), wrap(regex_fns::regexp_extract));

        scalars.insert("JSON_OBJECT".into(), wrap(json::json_object));
        scalars.insert("JSON_VALUE".into(), wrap(json::json_value));
        scalars.insert("JSON_QUERY".into(), wrap(json::json_query));

        Self { scalars, udfs: HashMap::new(), spatial: HashMap::new() }
    }

    pub fn register_udf(&mut self, udf: Arc<dyn UserDefinedFunction>) {
        self.udfs.insert(udf.name().to_ascii_uppercase(), udf);
    }

    pub fn register_spatial(&mut self, predicate: Arc<dyn SpatialPredicate>) {
        self.spatial.insert(predicate.name().to_ascii_uppercase(), predicate);
    }

    pub fn get_scalar(&self, name: &str) -> Option<&ScalarFn> {
        self.scalars.get(&name.to_ascii_uppercase())
    }

    pub fn get_udf(&self, name: &str) -> Option<&Arc<dyn UserDefinedFunction>> {
        self.udfs.get(&name.to_ascii_uppercase())
    }

    pub fn get_spatial(&self, name: &str) -> Option<&Arc<dyn SpatialPredicate>> {
        self.spatial.get(&name.to_ascii_uppercase())
    }

    pub fn has_function(&self, name: &str) -> bool {
        let upper = name.to_ascii_uppercase();
        self.scalars.contains_key(&upper) || self.udfs.contains_key(&upper) || self.spatial.contains_key(&upper)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let reg = FunctionRegistry::new();
        assert!(reg.get_scalar("upper").is_some());
        assert!(reg.get_scalar("Upper").is_some());
        assert!(reg.get_scalar("nonexistent").is_none());
    }

    #[test]
    fn has_function_covers_scalars() {
        let reg = FunctionRegistry::new();
        assert!(reg.has_function("CONCAT"));
        assert!(!reg.has_function("DOES_NOT_EXIST"));
    }
}
