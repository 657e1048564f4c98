//! Token types produced by the tokenizer.

use esql_ir::Span;
use num_bigint::BigInt;

/// A parsed numeric literal value, kept alongside the token's raw text so
/// the parser never has to re-parse it.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberValue {
    Int64(i64),
    BigInt(BigInt),
    Float64(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    /// A delimited identifier, e.g. `"my column"` or `` `my column` ``.
    QuotedIdentifier,
    Number,
    StringLiteral,
    /// `(` `)` `,` `.` `*` `+` `-` `/` `%` `=` `<>` `!=` `<` `<=` `>` `>=`
    Symbol,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Normalized text: keywords/identifiers upper-cased for keyword
    /// matching convenience; the original casing is kept in
    /// `original_case` for identifiers that must round-trip exactly.
    pub text: String,
    pub original_case: Option<String>,
    pub number: Option<NumberValue>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self { kind, text: text.into(), original_case: None, number: None, span }
    }

    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(kw)
    }

    pub fn is_symbol(&self, sym: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == sym
    }

    /// The identifier text to use downstream: original casing if the
    /// source preserved one (quoted identifiers), otherwise the raw token
    /// text as written.
    pub fn ident_text(&self) -> &str {
        self.original_case.as_deref().unwrap_or(&self.text)
    }
}
