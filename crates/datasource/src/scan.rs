//! Scan contract types: the hints a plan passes down, and what a source
//! reports it actually honored.

use esql_ir::{Expr, Row};

#[derive(Debug, Clone, Default)]
pub struct ScanOptions<'a> {
    /// Columns the query needs from this table; empty means "no hint, all
    /// columns".
    pub columns: &'a [String],
    /// Predicate portion referencing only this table, offered for
    /// pushdown.
    pub where_predicate: Option<&'a Expr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub rows: Vec<Row>,
    /// Whether the source actually applied `where_predicate` itself. If
    /// `false`, the executor re-applies the predicate over every returned
    /// row.
    pub applied_where: bool,
    /// Whether the source already applied `limit`/`offset`. A source that
    /// sets this `true` while `applied_where` is `false` (when a predicate
    /// was supplied) violates the scan contract — the executor would have
    /// no way to tell how many rows were dropped by limiting before the
    /// predicate was evaluated.
    pub applied_limit_offset: bool,
}

impl ScanResult {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, applied_where: false, applied_limit_offset: false }
    }
}
