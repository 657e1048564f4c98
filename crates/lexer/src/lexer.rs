//! # Tokenizer
//!
//! Hand-rolled, grounded on `usql-lexer`'s `Peekable<Chars>` + location
//! tracking design, collapsed to the single flat [`Token`] shape this
//! engine's parser expects. Whitespace and both comment styles (`--` and
//! `/* */`, including nesting) are skipped rather than retained as tokens.

use std::iter::Peekable;
use std::str::Chars;

use esql_ir::Span;
use num_bigint::BigInt;

use crate::error::LexerError;
use crate::token::{NumberValue, Token, TokenKind};

const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "NOT", "AS", "JOIN", "INNER", "LEFT", "RIGHT", "FULL",
    "OUTER", "ON", "POSITIONAL", "GROUP", "BY", "HAVING", "ORDER", "ASC", "DESC", "NULLS",
    "FIRST", "LAST", "LIMIT", "OFFSET", "DISTINCT", "CASE", "WHEN", "THEN", "ELSE", "END", "CAST",
    "IS", "NULL", "TRUE", "FALSE", "IN", "BETWEEN", "LIKE", "EXISTS", "INTERVAL", "YEAR", "MONTH",
    "DAY", "HOUR", "MINUTE", "SECOND", "FILTER", "WITH", "ALL", "INTO",
];

pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, chars: source.chars().peekable(), pos: 0 }
    }

    #[tracing::instrument(level = "trace", skip(source), fields(len = source.len()))]
    pub fn tokenize(source: &'a str) -> Result<Vec<Token>, LexerError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tracing::trace!(count = tokens.len(), "tokenized");
        Ok(tokens)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_trivia(&mut self) -> Result<(), LexerError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('-') => {
                    if self.source[self.pos..].starts_with("--") {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    } else {
                        break;
                    }
                }
                Some('/') => {
                    if self.source[self.pos..].starts_with("/*") {
                        let start = self.pos;
                        self.advance();
                        self.advance();
                        let mut depth = 1;
                        while depth > 0 {
                            match self.advance() {
                                Some('*') if self.peek() == Some('/') => {
                                    self.advance();
                                    depth -= 1;
                                }
                                Some('/') if self.peek() == Some('*') => {
                                    self.advance();
                                    depth += 1;
                                }
                                Some(_) => {}
                                None => {
                                    return Err(LexerError::new(
                                        "unterminated block comment",
                                        Span::new(start, self.pos),
                                    ));
                                }
                            }
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", Span::at(start)));
        };

        if c == '\'' {
            return self.lex_string('\'', start);
        }
        if c == '"' || c == '`' {
            return self.lex_quoted_identifier(c, start);
        }
        if c.is_ascii_digit() {
            return self.lex_number(start);
        }
        if c == '_' || c.is_alphabetic() {
            return self.lex_ident_or_keyword(start);
        }
        self.lex_symbol(start)
    }

    fn lex_string(&mut self, quote: char, start: usize) -> Result<Token, LexerError> {
        self.advance();
        let mut text = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.advance();
                        text.push(quote);
                    } else {
                        break;
                    }
                }
                Some(c) => text.push(c),
                None => {
                    return Err(LexerError::new(
                        "unterminated string literal",
                        Span::new(start, self.pos),
                    ));
                }
            }
        }
        let mut tok = Token::new(TokenKind::StringLiteral, text, Span::new(start, self.pos));
        tok.original_case = Some(tok.text.clone());
        Ok(tok)
    }

    fn lex_quoted_identifier(&mut self, quote: char, start: usize) -> Result<Token, LexerError> {
        self.advance();
        let mut text = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some(c) => text.push(c),
                None => {
                    return Err(LexerError::new(
                        "unterminated quoted identifier",
                        Span::new(start, self.pos),
                    ));
                }
            }
        }
        let mut tok =
            Token::new(TokenKind::QuotedIdentifier, text.clone(), Span::new(start, self.pos));
        tok.original_case = Some(text);
        Ok(tok)
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, LexerError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let mut is_float = false;
        if self.peek() == Some('.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some(d) if d.is_ascii_digit()) {
                is_float = true;
                text.push('.');
                self.advance();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let next_ok = matches!(lookahead.peek(), Some(d) if d.is_ascii_digit())
                || matches!(lookahead.peek(), Some('+') | Some('-'));
            if next_ok {
                is_float = true;
                text.push(self.advance().unwrap());
                if matches!(self.peek(), Some('+') | Some('-')) {
                    text.push(self.advance().unwrap());
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        // `n` suffix marks an arbitrary-precision BigInt literal.
        if self.peek() == Some('n') && !is_float {
            self.advance();
            let big: BigInt = text.parse().map_err(|_| {
                LexerError::new(
                    format!("invalid bigint literal '{text}n'"),
                    Span::new(start, self.pos),
                )
            })?;
            let mut tok =
                Token::new(TokenKind::Number, format!("{text}n"), Span::new(start, self.pos));
            tok.number = Some(NumberValue::BigInt(big));
            return Ok(tok);
        }

        let span = Span::new(start, self.pos);
        let number = if is_float {
            text.parse::<f64>().map(NumberValue::Float64).map_err(|_| {
                LexerError::new(format!("invalid numeric literal '{text}'"), span)
            })?
        } else {
            match text.parse::<i64>() {
                Ok(i) => NumberValue::Int64(i),
                Err(_) => {
                    let big: BigInt = text.parse().map_err(|_| {
                        LexerError::new(format!("invalid numeric literal '{text}'"), span)
                    })?;
                    NumberValue::BigInt(big)
                }
            }
        };
        let mut tok = Token::new(TokenKind::Number, text, span);
        tok.number = Some(number);
        Ok(tok)
    }

    fn lex_ident_or_keyword(&mut self, start: usize) -> Result<Token, LexerError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let span = Span::new(start, self.pos);
        let upper = text.to_ascii_uppercase();
        if KEYWORDS.contains(&upper.as_str()) {
            Ok(Token::new(TokenKind::Keyword, upper, span))
        } else {
            let mut tok = Token::new(TokenKind::Identifier, text.clone(), span);
            tok.original_case = Some(text);
            Ok(tok)
        }
    }

    fn lex_symbol(&mut self, start: usize) -> Result<Token, LexerError> {
        let c = self.advance().unwrap();
        let two_char = |this: &mut Self, second: char, sym: &str| -> Option<Token> {
            if this.peek() == Some(second) {
                this.advance();
                Some(Token::new(TokenKind::Symbol, sym, Span::new(start, this.pos)))
            } else {
                None
            }
        };
        let tok = match c {
            '<' => two_char(self, '=', "<=")
                .or_else(|| two_char(self, '>', "<>"))
                .unwrap_or_else(|| Token::new(TokenKind::Symbol, "<", Span::new(start, self.pos))),
            '>' => two_char(self, '=', ">=")
                .unwrap_or_else(|| Token::new(TokenKind::Symbol, ">", Span::new(start, self.pos))),
            '!' => {
                two_char(self, '=', "!=").ok_or_else(|| {
                    LexerError::new("unexpected character '!'", Span::new(start, self.pos))
                })?
            }
            '|' => two_char(self, '|', "||").ok_or_else(|| {
                LexerError::new("unexpected character '|'", Span::new(start, self.pos))
            })?,
            '(' | ')' | ',' | '.' | '*' | '+' | '-' | '/' | '%' | '=' => {
                Token::new(TokenKind::Symbol, c.to_string(), Span::new(start, self.pos))
            }
            other => {
                return Err(LexerError::new(
                    format!("unexpected character '{other}'"),
                    Span::new(start, self.pos),
                ));
            }
        };
        Ok(tok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_simple_select() {
        let toks = Lexer::tokenize("SELECT a, b FROM t WHERE a = 1").unwrap();
        assert_eq!(toks.first().unwrap().kind, TokenKind::Keyword);
        assert_eq!(toks.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn token_spans_are_half_open_and_cover_exact_text() {
        let toks = Lexer::tokenize("SELECT  id").unwrap();
        let id_tok = &toks[1];
        assert_eq!(&"SELECT  id"[id_tok.span.start..id_tok.span.end], "id");
    }

    #[test]
    fn skips_both_comment_styles_including_nesting() {
        let toks = Lexer::tokenize("SELECT 1 -- trailing\n/* /* nested */ */ FROM t").unwrap();
        assert_eq!(kinds("SELECT 1 -- trailing\n/* /* nested */ */ FROM t"), kinds("SELECT 1 FROM t"));
        assert!(toks.iter().any(|t| t.is_keyword("FROM")));
    }

    #[test]
    fn parses_bigint_suffix() {
        let toks = Lexer::tokenize("123456789012345678901234n").unwrap();
        match &toks[0].number {
            Some(NumberValue::BigInt(_)) => {}
            other => panic!("expected bigint, got {other:?}"),
        }
    }

    #[test]
    fn quoted_identifier_preserves_original_case() {
        let toks = Lexer::tokenize(r#""MixedCase""#).unwrap();
        assert_eq!(toks[0].ident_text(), "MixedCase");
    }

    #[test]
    fn unterminated_string_is_a_lexer_error() {
        let err = Lexer::tokenize("'abc").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }
}
