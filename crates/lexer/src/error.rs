use esql_ir::Span;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct LexerError {
    pub message: String,
    pub span: Span,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span }
    }
}
