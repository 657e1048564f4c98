//! The pull-based row producer every physical operator implements.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use esql_ir::{ExecutionError, ExecutionResult, Row};

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A lazily-pulled sequence of rows. Every plan node lowers to one of
/// these; a caller that only wants the first few rows (e.g. a `LIMIT`)
/// never forces the rest of the tree to run past what it asked for,
/// beyond whatever a `DataSource`'s own (bulk) `scan` already read.
#[async_trait]
pub trait RowStream: Send {
    /// Returns the next row, or `Ok(None)` once the stream is exhausted.
    async fn next(&mut self) -> ExecutionResult<Option<Row>>;

    /// True when this stream (or the chain feeding it) already applied
    /// `LIMIT`/`OFFSET` itself — a `Scan` backed by a `DataSource` that
    /// honored the pushdown hint sets this, and the pass-through operators
    /// between a base scan and a top-level `Limit` (`Filter`, `Project`)
    /// forward their input's answer. A `Limit` operator above a stream that
    /// answers `true` here must not re-slice, since the hint was already
    /// honored once and slicing again would drop the wrong rows.
    fn limit_already_applied(&self) -> bool {
        false
    }
}

/// Cancellation check every operator runs before producing a row.
pub(crate) fn check_cancelled(cancel: &crate::context::CancellationHandle) -> ExecutionResult<()> {
    if cancel.is_cancelled() {
        tracing::debug!("cancellation observed, stopping before next row");
        return Err(ExecutionError::DataSource("query was cancelled".to_string()));
    }
    Ok(())
}

/// A stream backed by an already-materialized `Vec<Row>`, used by every
/// operator that must see its whole input before it can emit anything
/// (aggregates, sort, distinct, and both join sides).
pub struct VecStream {
    rows: std::vec::IntoIter<Row>,
}

impl VecStream {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows: rows.into_iter() }
    }
}

#[async_trait]
impl RowStream for VecStream {
    async fn next(&mut self) -> ExecutionResult<Option<Row>> {
        Ok(self.rows.next())
    }
}

/// Drains a stream into a `Vec`, checking cancellation between rows.
pub(crate) async fn drain(
    stream: &mut (dyn RowStream + Send),
    cancel: &crate::context::CancellationHandle,
) -> ExecutionResult<Vec<Row>> {
    let mut out = Vec::new();
    loop {
        check_cancelled(cancel)?;
        match stream.next().await? {
            Some(row) => out.push(row),
            None => break,
        }
    }
    Ok(out)
}
