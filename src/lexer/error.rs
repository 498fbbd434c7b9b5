//! Lexical error types.

use crate::diagnostics::{Diagnostic, Phase, Position, Severity};
use thiserror::Error;

/// A problem found while scanning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexicalError {
    /// String literal reached end of line (or input) without its quote.
    #[error("unterminated string literal")]
    UnterminatedString { position: Position, text: String },

    /// Character literal without its closing quote.
    #[error("unterminated character literal")]
    UnterminatedChar { position: Position, text: String },

    /// Block comment that runs to end of input.
    #[error("unterminated block comment")]
    UnterminatedComment { position: Position },

    /// Digits run straight into letters, or a second decimal point.
    #[error("malformed number literal `{text}`")]
    MalformedNumber { position: Position, text: String },

    /// A character that no rule accepts.
    #[error("unrecognized character `{character}`")]
    UnrecognizedCharacter { position: Position, character: char },

    /// Unknown-language input that does not look like a word.
    #[error("`{word}` does not look like a valid identifier")]
    NoiseWord { position: Position, word: String },

    /// Python line indented with both tabs and spaces.
    #[error("indentation mixes tabs and spaces")]
    MixedIndentation { position: Position },

    /// The iteration ceiling was reached.
    #[error("lexical analysis aborted for safety after {iterations} iterations")]
    Aborted { position: Position, iterations: usize },

    /// The input is larger than the configured limit; nothing was scanned.
    #[error("source is {size} bytes, larger than the {limit} byte limit")]
    SourceTooLarge { size: usize, limit: usize },
}

impl LexicalError {
    /// Returns where the problem starts.
    pub fn position(&self) -> Position {
        match self {
            LexicalError::UnterminatedString { position, .. }
            | LexicalError::UnterminatedChar { position, .. }
            | LexicalError::UnterminatedComment { position }
            | LexicalError::MalformedNumber { position, .. }
            | LexicalError::UnrecognizedCharacter { position, .. }
            | LexicalError::NoiseWord { position, .. }
            | LexicalError::MixedIndentation { position }
            | LexicalError::Aborted { position, .. } => *position,
            LexicalError::SourceTooLarge { .. } => Position::START,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            LexicalError::UnterminatedComment { .. } | LexicalError::MixedIndentation { .. } => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            LexicalError::UnterminatedString { text, .. }
            | LexicalError::UnterminatedChar { text, .. }
            | LexicalError::MalformedNumber { text, .. } => Some(text.clone()),
            LexicalError::NoiseWord { word, .. } => Some(word.clone()),
            LexicalError::UnrecognizedCharacter { character, .. } => Some(character.to_string()),
            _ => None,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let diagnostic = Diagnostic::new(
            Phase::Lexical,
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
    fn test_severity_policy() {
        let warn = LexicalError::UnterminatedComment {
            position: Position::START,
        };
        assert_eq!(warn.severity(), Severity::Warning);

        let err = LexicalError::UnterminatedString {
            position: Position::START,
            text: "\"abc".into(),
        };
        assert_eq!(err.severity(), Severity::Error);
        let diag = err.into_diagnostic();
        assert!(diag.message.contains("unterminated"));
        assert_eq!(diag.context.as_deref(), Some("\"abc"));
    }
}
