//! Syntax error types.
//!
//! Syntax errors capture what went wrong and where. The parser collects
//! them instead of stopping at the first one. Severity depends on the
//! check: structural mismatches block later phases, while missing but
//! inferable punctuation and layout remarks are warnings.

use crate::diagnostics::{Diagnostic, Phase, Position, Severity};
use thiserror::Error;

/// A syntax problem with location and description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// Expected one thing, found another.
    #[error("expected {expected}, found `{found}`")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: Position,
    },

    /// Input ended while a construct was still open.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String, position: Position },

    /// Punctuation the parser could infer, such as a statement's `;`.
    #[error("missing `{expected}` after {after}")]
    MissingPunctuation {
        expected: String,
        after: String,
        position: Position,
    },

    /// A closing delimiter with nothing open.
    #[error("unmatched closing `{delimiter}`")]
    UnmatchedCloser { delimiter: char, position: Position },

    /// A closing delimiter of the wrong kind.
    #[error("`{closer}` does not match `{opener}` opened at {opened_at}")]
    MismatchedDelimiter {
        opener: char,
        closer: char,
        opened_at: Position,
        position: Position,
    },

    /// An opening delimiter that is never closed.
    #[error("unclosed `{delimiter}`")]
    UnclosedDelimiter { delimiter: char, position: Position },

    /// Further delimiter problems were left out of the report.
    #[error("{omitted} more delimiter problems not shown")]
    DelimiterReportTruncated { omitted: usize, position: Position },

    /// BEGIN/END style block words do not pair up.
    #[error("{opened} block openers (BEGIN/CASE) but {closed} END")]
    BlockImbalance {
        opened: usize,
        closed: usize,
        position: Position,
    },

    /// C++ translation unit without a `main` function.
    #[error("no `main` function found")]
    MissingMain { position: Position },

    /// Document without a root element.
    #[error("missing root `<{tag}>` element")]
    MissingRootElement { tag: String, position: Position },

    /// Python statement indented without an enclosing block.
    #[error("unexpected indentation")]
    UnexpectedIndent { position: Position },

    /// Python block header with no indented body.
    #[error("expected an indented block after {after}")]
    MissingIndentedBlock { after: String, position: Position },

    /// Markup element never closed.
    #[error("element `<{tag}>` is never closed")]
    UnclosedElement { tag: String, position: Position },

    /// Closing tag that matches no open element.
    #[error("closing tag `</{tag}>` has no matching opening tag")]
    StrayClosingTag { tag: String, position: Position },

    /// CREATE TABLE without a column list.
    #[error("CREATE TABLE `{table}` is missing its column definitions")]
    MissingColumnDefinitions { table: String, position: Position },

    /// Blocks nested beyond the configured limit.
    #[error("nesting deeper than {limit} levels; inner blocks were skipped")]
    NestingTooDeep { limit: usize, position: Position },

    /// The statement ceiling was reached.
    #[error("syntax analysis aborted for safety")]
    Aborted { position: Position },
}

impl SyntaxError {
    /// Returns the location of this error.
    pub fn position(&self) -> Position {
        match self {
            SyntaxError::UnexpectedToken { position, .. }
            | SyntaxError::UnexpectedEof { position, .. }
            | SyntaxError::MissingPunctuation { position, .. }
            | SyntaxError::UnmatchedCloser { position, .. }
            | SyntaxError::MismatchedDelimiter { position, .. }
            | SyntaxError::UnclosedDelimiter { position, .. }
            | SyntaxError::DelimiterReportTruncated { position, .. }
            | SyntaxError::BlockImbalance { position, .. }
            | SyntaxError::MissingMain { position }
            | SyntaxError::MissingRootElement { position, .. }
            | SyntaxError::UnexpectedIndent { position }
            | SyntaxError::MissingIndentedBlock { position, .. }
            | SyntaxError::UnclosedElement { position, .. }
            | SyntaxError::StrayClosingTag { position, .. }
            | SyntaxError::MissingColumnDefinitions { position, .. }
            | SyntaxError::NestingTooDeep { position, .. }
            | SyntaxError::Aborted { position } => *position,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SyntaxError::MissingPunctuation { .. }
            | SyntaxError::BlockImbalance { .. }
            | SyntaxError::MissingMain { .. }
            | SyntaxError::MissingRootElement { .. }
            | SyntaxError::UnexpectedIndent { .. }
            | SyntaxError::UnclosedElement { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            SyntaxError::UnexpectedToken { found, .. } => Some(found.clone()),
            SyntaxError::UnmatchedCloser { delimiter, .. }
            | SyntaxError::UnclosedDelimiter { delimiter, .. } => Some(delimiter.to_string()),
            SyntaxError::MismatchedDelimiter { closer, .. } => Some(closer.to_string()),
            SyntaxError::MissingColumnDefinitions { table, .. } => Some(table.clone()),
            _ => None,
        }
    }

    /// Creates an "unexpected token" error.
    pub fn unexpected(
        expected: impl Into<String>,
        found: impl Into<String>,
        position: Position,
    ) -> Self {
        SyntaxError::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            position,
        }
    }

    /// Creates a "missing punctuation" warning.
    pub fn missing(expected: impl Into<String>, after: impl Into<String>, position: Position) -> Self {
        SyntaxError::MissingPunctuation {
            expected: expected.into(),
            after: after.into(),
            position,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let diagnostic = Diagnostic::new(
            Phase::Syntactic,
            self.severity(),
            self.to_string(),
            self.position(),
        );
        match self.context() {
            Some(context) => diagnostic.with_context(context),
            None => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_message() {
        let err = SyntaxError::unexpected("`(` after `if`", "x", Position::new(1, 4, 3));
        assert_eq!(err.to_string(), "expected `(` after `if`, found `x`");
        assert_eq!(err.position(), Position::new(1, 4, 3));
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn test_missing_punctuation_is_warning() {
        let err = SyntaxError::missing(";", "statement", Position::START);
        assert_eq!(err.severity(), Severity::Warning);
        assert!(err.to_string().contains("missing `;`"));
    }

    #[test]
    fn test_unclosed_delimiter_diagnostic() {
        let diag = SyntaxError::UnclosedDelimiter {
            delimiter: '(',
            position: Position::new(2, 7, 12),
        }
        .into_diagnostic();
        assert_eq!(diag.phase, Phase::Syntactic);
        assert_eq!((diag.line, diag.column), (2, 7));
        assert!(diag.message.contains("unclosed `(`"));
    }
}
