//! Source position tracking.

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into the original query text.
///
/// Every token and every AST node carries one of these so that parse errors
/// and tooling built on top of the engine can point back at the offending
/// source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// A zero-width span at a single offset, used for synthesized nodes.
    pub fn at(offset: usize) -> Self {
        Self { start: offset, end: offset }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span { start: self.start.min(other.start), end: self.end.max(other.end) }
    }
}
