//! User-defined scalar functions. Grounded on `catalog/src/trait.rs`'s
//! `async_trait`-based trait shape.

use async_trait::async_trait;
use esql_ir::{ExecutionError, SqlValue};

#[derive(Debug, Clone, Copy)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub fn exact(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    pub fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && self.max.map(|max| n <= max).unwrap_or(true)
    }
}

#[async_trait]
pub trait UserDefinedFunction: Send + Sync {
    fn name(&self) -> &str;
    fn arguments(&self) -> Arity;
    async fn apply(&self, args: &[SqlValue]) -> Result<SqlValue, ExecutionError>;
}
