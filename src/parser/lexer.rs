//! Logos-based lexer shared by the conformance and constraint parsers.

use logos::Logos;
use text_size::TextSize;

/// A token with its kind, text, and byte offset in the cell text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: TextSize,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(input),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = result.unwrap_or(TokenKind::Error);
        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string, trivia included
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n\x{a0}]+")]
    Whitespace,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"0[xX][0-9a-fA-F_]+")]
    Hex,

    /// `<<id>>` or `<<id,label>>` emitted by expression rendering.
    #[regex(r"<<[^>]*>>")]
    Reference,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("..")]
    DotDot,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("°C")]
    Celsius,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    /// Any character the grammars do not use.
    Error,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn test_reference_is_one_token() {
        let tokens = tokenize("<<ref_Foo,Foo>>.Bar");
        assert_eq!(tokens[0].kind, TokenKind::Reference);
        assert_eq!(tokens[0].text, "<<ref_Foo,Foo>>");
        assert_eq!(tokens[1].kind, TokenKind::Dot);
        assert_eq!(tokens[2].offset, TextSize::new(16));
    }

    #[test]
    fn test_range_and_decimal_punctuation() {
        assert_eq!(
            kinds("1..4"),
            vec![TokenKind::Integer, TokenKind::DotDot, TokenKind::Integer]
        );
        assert_eq!(
            kinds("1.5%"),
            vec![
                TokenKind::Integer,
                TokenKind::Dot,
                TokenKind::Integer,
                TokenKind::Percent
            ]
        );
        assert_eq!(kinds("-27.3°C")[4], TokenKind::Celsius);
    }

    #[test]
    fn test_hex_and_unknown_characters() {
        assert_eq!(kinds("0x00FF"), vec![TokenKind::Hex]);
        assert_eq!(kinds("a ~ b")[1], TokenKind::Error);
    }
}
