//! Parsers for the two expression languages found in table cells.
//!
//! ## Architecture
//!
//! ```text
//! Cell inlines
//!     ↓
//! render_expression_text → "<<ref,Label>> & !Feature"
//!     ↓
//! Lexer (logos) → Tokens with TokenKind
//!     ↓
//! Recursive descent → Conformance / Constraint tree
//! ```
//!
//! Neither parser fails: text outside the grammar comes back as a generic
//! node holding the raw text, and the builder turns that into a warning.

mod conformance;
mod constraint;
mod lexer;


pub use conformance::parse_conformance;
pub use constraint::parse_constraint;
pub use lexer::{Lexer, Token, TokenKind, tokenize};

use smol_str::SmolStr;
use text_size::TextSize;
use thiserror::Error;

use crate::doc::CrossReference;

/// Why an expression fell back to its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {}", u32::from(*.offset))]
pub struct ParseError {
    pub message: String,
    pub offset: TextSize,
}

pub(crate) type ParseResult<T> = Result<T, ParseError>;

/// Non-trivia tokens with a cursor.
pub(crate) struct TokenStream<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    end: TextSize,
}

impl<'a> TokenStream<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            tokens: Lexer::new(input)
                .filter(|t| !t.kind.is_trivia())
                .collect(),
            pos: 0,
            end: TextSize::of(input),
        }
    }

    pub(crate) fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + n)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    /// Current token is an identifier spelled `keyword` (case-sensitive).
    pub(crate) fn at_keyword(&self, keyword: &str) -> bool {
        self.peek()
            .is_some_and(|t| t.kind == TokenKind::Ident && t.text == keyword)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<Token<'a>> {
        if self.at(kind) {
            if let Some(token) = self.bump() {
                return Ok(token);
            }
        }
        Err(self.error(format!("expected {kind:?}")))
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        let (found, offset) = match self.peek() {
            Some(t) => (format!(", found `{}`", t.text), t.offset),
            None => (", found end of text".to_string(), self.end),
        };
        ParseError {
            message: format!("{}{found}", message.into()),
            offset,
        }
    }

    /// `.ident` segments following an identifier or reference.
    pub(crate) fn field_path(&mut self) -> ParseResult<Vec<SmolStr>> {
        let mut path = Vec::new();
        while self.at(TokenKind::Dot)
            && self
                .peek_nth(1)
                .is_some_and(|t| t.kind == TokenKind::Ident)
        {
            self.bump();
            let segment = self.expect(TokenKind::Ident)?;
            path.push(SmolStr::from(segment.text));
        }
        Ok(path)
    }
}

/// Split a `<<id>>` / `<<id,label>>` token into a cross-reference.
pub(crate) fn reference_from_token(text: &str) -> CrossReference {
    let body = text
        .strip_prefix("<<")
        .and_then(|t| t.strip_suffix(">>"))
        .unwrap_or(text);
    match body.split_once(',') {
        Some((id, label)) => CrossReference::new(id.trim()).with_label(label.trim()),
        None => CrossReference::new(body.trim()),
    }
}

/// Parse `0x..` text into (value, digit count).
pub(crate) fn parse_hex(text: &str) -> Option<(u64, usize)> {
    let digits: String = text[2..].chars().filter(|c| *c != '_').collect();
    let value = u64::from_str_radix(&digits, 16).ok()?;
    Some((value, digits.len()))
}
