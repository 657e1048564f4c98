//! Shared, cheaply-cloneable execution context threaded through every
//! operator and every expression evaluation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use esql_datasource::DataSource;
use esql_functions::FunctionRegistry;

/// Cooperative cancellation flag. Checked by every operator before it emits
/// a row; a query that never pulls past its last row (e.g. one wrapped in a
/// `Limit` the caller stopped consuming) never needs one set to stop
/// promptly — but a long aggregate or sort over a large scan does.
#[derive(Clone, Default)]
pub struct CancellationHandle(Arc<AtomicBool>);

impl CancellationHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything an operator or expression evaluator needs that isn't part of
/// the row it is currently looking at: the table catalog, the function
/// registry, the deterministic clock, cancellation, and a subquery nesting
/// depth guard.
#[derive(Clone)]
pub struct ExecContext {
    pub tables: Arc<HashMap<String, Arc<dyn DataSource>>>,
    pub functions: Arc<FunctionRegistry>,
    pub now: NaiveDateTime,
    pub cancel: CancellationHandle,
    pub subquery_depth: u32,
    pub max_subquery_depth: u32,
}

impl ExecContext {
    pub fn new(
        tables: HashMap<String, Arc<dyn DataSource>>,
        functions: Arc<FunctionRegistry>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            tables: Arc::new(tables),
            functions,
            now,
            cancel: CancellationHandle::new(),
            subquery_depth: 0,
            max_subquery_depth: 16,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns a context for evaluating one nested subquery, or `None` if
    /// the nesting guard has been hit — correlated or runaway subqueries
    /// cannot recurse forever.
    pub fn nested(&self) -> Option<Self> {
        if self.subquery_depth >= self.max_subquery_depth {
            return None;
        }
        let mut next = self.clone();
        next.subquery_depth += 1;
        Some(next)
    }
}
