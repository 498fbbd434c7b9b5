//! Token navigation utilities for the parser.
//!
//! This module provides the low-level token stream operations that form
//! the foundation of every statement routine:
//! - Peeking at tokens without consuming them
//! - Advancing through the token stream
//! - Matching and expecting specific punctuation or keywords
//! - Error recovery (synchronization)

use crate::diagnostics::Position;
use crate::language::Language;
use crate::lexer::{Token, TokenCategory};

use super::{Parser, SyntaxError};

impl<'a> Parser<'a> {
    // ==================== Token Navigation ====================

    /// Returns the current token without consuming it.
    pub(super) fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.current).copied()
    }

    /// Looks ahead n tokens (0 = current token).
    pub(super) fn peek_ahead(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.current + n).copied()
    }

    /// The most recently consumed token.
    pub(super) fn previous(&self) -> Option<&'a Token> {
        self.current
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i).copied())
    }

    /// Consumes and returns the current token.
    pub(super) fn advance(&mut self) -> Option<&'a Token> {
        let token = self.peek();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    /// Returns true if we've reached the end of the token stream.
    pub(super) fn is_at_end(&self) -> bool {
        self.aborted || self.current >= self.tokens.len()
    }

    /// Checks for a delimiter or operator with this exact text.
    pub(super) fn check_punct(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(text))
    }

    /// Checks for a reserved word, ignoring case.
    pub(super) fn check_keyword(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(word))
    }

    /// Checks for a word (reserved or not), ignoring case.
    pub(super) fn check_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_word(word))
    }

    pub(super) fn check_identifier(&self) -> bool {
        self.peek().is_some_and(Token::is_identifier)
    }

    /// Consumes the punctuation if present.
    pub(super) fn match_punct(&mut self, text: &str) -> bool {
        if self.check_punct(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the word if present.
    pub(super) fn match_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the first of `words` that is present.
    pub(super) fn match_any_word(&mut self, words: &[&str]) -> bool {
        words.iter().any(|w| self.match_word(w))
    }

    /// Expects the punctuation, or records an error.
    pub(super) fn expect_punct(&mut self, text: &str, expected_desc: &str) -> Result<&'a Token, ()> {
        if self.check_punct(text) {
            self.advance().ok_or(())
        } else {
            self.error_here(expected_desc);
            Err(())
        }
    }

    /// Expects the word, or records an error.
    pub(super) fn expect_word(&mut self, word: &str, expected_desc: &str) -> Result<&'a Token, ()> {
        if self.check_word(word) {
            self.advance().ok_or(())
        } else {
            self.error_here(expected_desc);
            Err(())
        }
    }

    /// Expects an identifier, or records an error.
    pub(super) fn expect_identifier(&mut self, expected_desc: &str) -> Result<&'a Token, ()> {
        if self.check_identifier() {
            self.advance().ok_or(())
        } else {
            self.error_here(expected_desc);
            Err(())
        }
    }

    /// Expects a name: an identifier, or a reserved word where the language
    /// tolerates keywords as names (SQL columns, Pascal fields).
    pub(super) fn expect_name(&mut self, expected_desc: &str) -> Result<&'a Token, ()> {
        match self.peek() {
            Some(t) if matches!(t.category, TokenCategory::Identifier | TokenCategory::ReservedWord) => {
                self.advance().ok_or(())
            }
            _ => {
                self.error_here(expected_desc);
                Err(())
            }
        }
    }

    /// Consumes an optional terminator, warning when it is missing.
    ///
    /// A missing terminator is inferred rather than treated as fatal; the
    /// parser carries on either way.
    pub(super) fn expect_terminator(&mut self, text: &str, after: &str) {
        if self.match_punct(text) {
            return;
        }
        let position = self
            .previous()
            .map(Token::position)
            .unwrap_or(Position::START);
        self.errors.push(SyntaxError::missing(text, after, position));
    }

    // ==================== Positions ====================

    /// Position of the current token, or of the last token at end of input.
    pub(super) fn current_position(&self) -> Position {
        self.peek()
            .or_else(|| self.tokens.last().copied())
            .map(Token::position)
            .unwrap_or(Position::START)
    }

    /// True when the current token starts a new line relative to the
    /// previously consumed token.
    pub(super) fn at_line_start(&self) -> bool {
        match (self.previous(), self.peek()) {
            (Some(prev), Some(next)) => next.line > prev.line,
            _ => true,
        }
    }

    // ==================== Errors and Recovery ====================

    /// Records "expected X, found Y" at the current token.
    pub(super) fn error_here(&mut self, expected_desc: &str) {
        let error = match self.peek() {
            Some(token) => SyntaxError::unexpected(expected_desc, token.text.clone(), token.position()),
            None => SyntaxError::UnexpectedEof {
                expected: expected_desc.to_string(),
                position: self.current_position(),
            },
        };
        self.errors.push(error);
    }

    /// Attempts to recover from an error by skipping to a synchronization point.
    ///
    /// Synchronization points are:
    /// - Just after a `;`
    /// - A statement-starting keyword, or any reserved word
    /// - A new line, in line-oriented languages
    /// - A `}` or `<` that ends the enclosing construct
    pub(super) fn synchronize(&mut self) {
        let Some(start) = self.advance() else {
            return;
        };
        if start.is_punct(";") {
            return;
        }

        while let Some(token) = self.peek() {
            if self.previous().is_some_and(|t| t.is_punct(";")) {
                return;
            }
            if token.category == TokenCategory::ReservedWord
                || self.profile.is_statement_keyword(&token.text)
            {
                return;
            }
            if self.language == Language::Python && self.at_line_start() {
                return;
            }
            match self.language {
                Language::Html if token.is_punct("<") || token.is_punct("</") => return,
                _ if token.is_punct("}") => return,
                _ => {}
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::language::Language;
    use crate::lexer::lex;
    use crate::parser::Parser;

    #[test]
    fn test_synchronize_stops_after_semicolon() {
        let tokens = lex("x y z ; w", Language::JavaScript);
        let mut parser = Parser::new(&tokens, Language::JavaScript);
        parser.synchronize();
        assert_eq!(parser.peek().map(|t| t.text.as_str()), Some("w"));
    }

    #[test]
    fn test_synchronize_stops_at_keyword() {
        let tokens = lex("x y if", Language::JavaScript);
        let mut parser = Parser::new(&tokens, Language::JavaScript);
        parser.synchronize();
        assert!(parser.check_keyword("if"));
    }

    #[test]
    fn test_synchronize_python_line() {
        let tokens = lex("x y\nz", Language::Python);
        let mut parser = Parser::new(&tokens, Language::Python);
        parser.synchronize();
        assert_eq!(parser.peek().map(|t| t.text.as_str()), Some("z"));
    }

    #[test]
    fn test_expect_reports_eof() {
        let tokens = lex("(", Language::JavaScript);
        let mut parser = Parser::new(&tokens, Language::JavaScript);
        parser.advance();
        assert!(parser.expect_punct(")", "`)`").is_err());
        assert!(parser.errors[0].to_string().contains("end of input"));
    }
}
