//! Error taxonomy shared by the parser and the executor.
//!
//! Grounded on `LoweringError`'s `thiserror`-derived shape and
//! `SemanticError`'s fine-grained variant list, collapsed to the two
//! layers this engine actually surfaces to callers (see spec §4.7/§7):
//! parse-time errors and execution-time errors. Neither layer retries or
//! produces partial results; every error is terminal for the query.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::Span;

/// A syntax, tokenization, or static-validation error discovered before
/// execution begins (unknown tokens, unbalanced parens, wrong function
/// arity, an aggregate used somewhere it is not allowed).
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span }
    }
}

/// An error raised while pulling rows through the plan: missing
/// table/column, an invalid cast, malformed JSON, a data source that
/// violated its scan contract, or a user-defined function rejecting its
/// arguments.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ExecutionError {
    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("column reference '{0}' is ambiguous")]
    AmbiguousColumn(String),

    #[error("cannot cast {value} to {target}")]
    InvalidCast { value: String, target: String },

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("invalid arguments to {function}: {reason}")]
    InvalidArguments { function: String, reason: String },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("data source violated its scan contract: {0}")]
    DataSourceContractViolation(String),

    #[error("data source error: {0}")]
    DataSource(String),
}

impl ExecutionError {
    /// Row index (1-based) this error occurred at, when known; attached by
    /// the operator that caught it, not by this constructor.
    pub fn at_row(self, row_index: usize) -> ExecutionErrorAtRow {
        ExecutionErrorAtRow { error: self, row_index: Some(row_index) }
    }
}

/// An [`ExecutionError`] annotated with the 1-based row index it occurred
/// at, when the failing operator could determine one.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{error}")]
pub struct ExecutionErrorAtRow {
    #[source]
    pub error: ExecutionError,
    pub row_index: Option<usize>,
}
