//! Token definitions shared by every analysis phase.
//!
//! A [`Token`] records what was read ([`TokenKind`]), its coarse
//! [`TokenCategory`] (the part reported externally), the exact source text
//! and the position where it starts.
//!
//! ## Design Notes
//!
//! Most of the scanner is hand written because comment markers, quotes and
//! operator sets change with the language. Number literals are the same
//! everywhere, so their shapes are recognized by a small `logos` lexer
//! ([`NumberShape`]) which gives longest-match semantics for free.

use logos::Logos;
use serde::Serialize;
use std::fmt;

use crate::diagnostics::Position;

/// A token with its location in the source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Fine-grained kind
    pub kind: TokenKind,
    /// Reported category
    #[serde(rename = "type")]
    pub category: TokenCategory,
    /// The original text of the token
    #[serde(rename = "value")]
    pub text: String,
    pub line: u32,
    pub column: u32,
    /// Byte offset of the first character
    #[serde(rename = "position")]
    pub offset: u32,
}

impl Token {
    /// Create a token whose category follows from its kind.
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            category: kind.category(),
            text: text.into(),
            line: position.line,
            column: position.column,
            offset: position.offset,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    /// Byte offset just past the token.
    pub fn end_offset(&self) -> u32 {
        let len = u32::try_from(self.text.len()).unwrap_or(u32::MAX);
        self.offset.saturating_add(len)
    }

    /// True for a delimiter or operator with exactly this text.
    pub fn is_punct(&self, text: &str) -> bool {
        matches!(
            self.category,
            TokenCategory::Delimiter | TokenCategory::Operator
        ) && self.text == text
    }

    /// True for a reserved word equal to `word`, ignoring ASCII case.
    ///
    /// Case-sensitive languages never produce keyword tokens with the wrong
    /// case, so ignoring case here is safe for all of them.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.category == TokenCategory::ReservedWord && self.text.eq_ignore_ascii_case(word)
    }

    /// True for any of the given reserved words.
    pub fn is_any_keyword(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.is_keyword(w))
    }

    pub fn is_identifier(&self) -> bool {
        self.category == TokenCategory::Identifier
    }

    /// True for an identifier or reserved word with this text, ignoring case.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(
            self.category,
            TokenCategory::Identifier | TokenCategory::ReservedWord
        ) && self.text.eq_ignore_ascii_case(word)
    }

    pub fn is_comment(&self) -> bool {
        self.category == TokenCategory::Comment
    }

    /// True for number, string and character literals.
    pub fn is_literal(&self) -> bool {
        matches!(
            self.category,
            TokenCategory::Number | TokenCategory::String
        )
    }
}

/// Coarse token classification, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenCategory {
    #[serde(rename = "KEYWORD")]
    ReservedWord,
    #[serde(rename = "IDENTIFIER")]
    Identifier,
    #[serde(rename = "NUMBER")]
    Number,
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "OPERATOR")]
    Operator,
    #[serde(rename = "DELIMITER")]
    Delimiter,
    #[serde(rename = "COMMENT")]
    Comment,
    #[serde(rename = "SYMBOL")]
    Symbol,
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenCategory::ReservedWord => "KEYWORD",
            TokenCategory::Identifier => "IDENTIFIER",
            TokenCategory::Number => "NUMBER",
            TokenCategory::String => "STRING",
            TokenCategory::Operator => "OPERATOR",
            TokenCategory::Delimiter => "DELIMITER",
            TokenCategory::Comment => "COMMENT",
            TokenCategory::Symbol => "SYMBOL",
        })
    }
}

/// Every token kind the scanner produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Keyword,
    Identifier,

    // ==================== Literals ====================
    IntegerLiteral,
    FloatLiteral,
    HexLiteral,
    BinaryLiteral,
    OctalLiteral,
    StringLiteral,
    CharLiteral,
    /// Backtick string, may span lines
    TemplateLiteral,

    // ==================== Punctuation ====================
    Operator,
    Delimiter,

    // ==================== Trivia and specials ====================
    LineComment,
    BlockComment,
    /// A whole preprocessor line such as `#include <iostream>`
    Directive,
    /// Printable character no other rule claims
    Symbol,
}

impl TokenKind {
    /// The category a token of this kind is reported under.
    pub fn category(self) -> TokenCategory {
        match self {
            TokenKind::Keyword | TokenKind::Directive => TokenCategory::ReservedWord,
            TokenKind::Identifier => TokenCategory::Identifier,
            TokenKind::IntegerLiteral
            | TokenKind::FloatLiteral
            | TokenKind::HexLiteral
            | TokenKind::BinaryLiteral
            | TokenKind::OctalLiteral => TokenCategory::Number,
            TokenKind::StringLiteral | TokenKind::CharLiteral | TokenKind::TemplateLiteral => {
                TokenCategory::String
            }
            TokenKind::Operator => TokenCategory::Operator,
            TokenKind::Delimiter => TokenCategory::Delimiter,
            TokenKind::LineComment | TokenKind::BlockComment => TokenCategory::Comment,
            TokenKind::Symbol => TokenCategory::Symbol,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Shapes of numeric literals, longest match wins.
///
/// The scanner only runs this on input that starts with a digit.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberShape {
    #[regex(r"0[xX][0-9a-fA-F]+(_[0-9a-fA-F]+)*")]
    Hex,

    #[regex(r"0[bB][01]+(_[01]+)*")]
    Binary,

    #[regex(r"0[oO][0-7]+")]
    Octal,

    #[regex(r"[0-9]+(_[0-9]+)*")]
    Decimal,

    #[regex(r"[0-9]+(_[0-9]+)*\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+(_[0-9]+)*[eE][+-]?[0-9]+")]
    Float,
}

impl NumberShape {
    pub fn token_kind(self) -> TokenKind {
        match self {
            NumberShape::Hex => TokenKind::HexLiteral,
            NumberShape::Binary => TokenKind::BinaryLiteral,
            NumberShape::Octal => TokenKind::OctalLiteral,
            NumberShape::Decimal => TokenKind::IntegerLiteral,
            NumberShape::Float => TokenKind::FloatLiteral,
        }
    }

    /// Recognizes the number at the start of `input`, returning its shape
    /// and byte length.
    pub fn recognize(input: &str) -> Option<(NumberShape, usize)> {
        let mut lexer = NumberShape::lexer(input);
        match lexer.next() {
            Some(Ok(shape)) if lexer.span().start == 0 => Some((shape, lexer.span().end)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_shapes() {
        assert_eq!(NumberShape::recognize("42"), Some((NumberShape::Decimal, 2)));
        assert_eq!(NumberShape::recognize("0xFF;"), Some((NumberShape::Hex, 4)));
        assert_eq!(NumberShape::recognize("0b1010"), Some((NumberShape::Binary, 6)));
        assert_eq!(NumberShape::recognize("0o17"), Some((NumberShape::Octal, 4)));
        assert_eq!(NumberShape::recognize("3.14)"), Some((NumberShape::Float, 4)));
        assert_eq!(NumberShape::recognize("1e10"), Some((NumberShape::Float, 4)));
        assert_eq!(NumberShape::recognize("2.5E-3"), Some((NumberShape::Float, 6)));
        assert_eq!(NumberShape::recognize("1_000"), Some((NumberShape::Decimal, 5)));
    }

    #[test]
    fn test_range_is_not_float() {
        // Pascal `1..10` must stop before the first dot.
        assert_eq!(NumberShape::recognize("1..10"), Some((NumberShape::Decimal, 1)));
    }

    #[test]
    fn test_categories() {
        assert_eq!(TokenKind::Directive.category(), TokenCategory::ReservedWord);
        assert_eq!(TokenKind::CharLiteral.category(), TokenCategory::String);
        assert_eq!(TokenKind::HexLiteral.category(), TokenCategory::Number);
    }

    #[test]
    fn test_keyword_match_ignores_case() {
        let token = Token::new(TokenKind::Keyword, "BEGIN", Position::START);
        assert!(token.is_keyword("begin"));
        assert!(!token.is_identifier());
    }
}
