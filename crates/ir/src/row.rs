//! Row representation: ordered named cells, each a possibly-deferred thunk.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ExecutionError;
use crate::value::SqlValue;

pub type ExecutionResult<T> = Result<T, ExecutionError>;
type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single cell in a [`Row`]: either an already-known value or a closure
/// that produces one, possibly asynchronously. Data sources that can afford
/// to materialize eagerly (e.g. an in-memory array) should use
/// [`Cell::value`]; sources that stream from somewhere expensive should use
/// [`Cell::thunk`] so unreferenced columns are never evaluated.
#[derive(Clone)]
pub struct Cell(Arc<dyn Fn() -> BoxFuture<'static, ExecutionResult<SqlValue>> + Send + Sync>);

impl Cell {
    pub fn value(v: SqlValue) -> Self {
        Cell(Arc::new(move || {
            let v = v.clone();
            Box::pin(async move { Ok(v) })
        }))
    }

    pub fn thunk<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ExecutionResult<SqlValue>> + Send + 'static,
    {
        Cell(Arc::new(move || Box::pin(f())))
    }

    /// Invokes the cell's accessor. The spec requires each cell be invoked
    /// at most once per logical access; callers that need to reuse a value
    /// should cache the result themselves (operators do this by resolving
    /// cells into owned `SqlValue`s as soon as a row enters their scope).
    pub async fn get(&self) -> ExecutionResult<SqlValue> {
        (self.0)().await
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cell(..)")
    }
}

/// An ordered sequence of `(name, Cell)` pairs produced by a scan or
/// operator. Column order is preserved because `SELECT *` expansion,
/// `DISTINCT` canonicalization, and NULL-padding on joins all depend on it.
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    pub fn from_cells(cells: Vec<(String, Cell)>) -> Self {
        Self { cells }
    }

    pub fn from_values(names: &[&str], values: Vec<SqlValue>) -> Self {
        let cells = names
            .iter()
            .zip(values)
            .map(|(n, v)| (n.to_string(), Cell::value(v)))
            .collect();
        Self { cells }
    }

    pub fn push(&mut self, name: impl Into<String>, cell: Cell) {
        self.cells.push((name.into(), cell));
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Looks up a cell by exact name, preferring the last match so that a
    /// bare unqualified name inserted after a qualified one wins (per the
    /// spec's "bare=last-write-wins" row-merge rule).
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.cells.iter().rev().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Looks up by qualified (`table.column`) or bare column name,
    /// whichever is present; used by identifier resolution in the evaluator.
    pub fn get_qualified_or_bare(&self, qualified: &str, bare: &str) -> Option<&Cell> {
        self.get(qualified).or_else(|| self.get(bare))
    }

    pub async fn resolve_all(&self) -> ExecutionResult<Vec<(String, SqlValue)>> {
        let mut out = Vec::with_capacity(self.cells.len());
        for (name, cell) in &self.cells {
            out.push((name.clone(), cell.get().await?));
        }
        Ok(out)
    }

    /// Merges `right` into `self` following the join row-merge rule: every
    /// column from `right` is appended qualified (the caller has already
    /// prefixed names as `"table.column"`), and any bare name collision is
    /// resolved by the later (right) side winning.
    pub fn merge(mut self, right: Row) -> Row {
        for (name, cell) in right.cells {
            self.cells.push((name, cell));
        }
        self
    }
}
