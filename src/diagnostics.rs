//! Phase-tagged diagnostics shared by every stage of the pipeline.
//!
//! Each phase has its own `thiserror` enum (`LexicalError`, `SyntaxError`,
//! `SemanticError`) carrying the details of one problem. Before leaving the
//! phase, those are flattened into [`Diagnostic`] values: a copy of the
//! position plus a rendered message. Diagnostics never borrow tokens, so the
//! token stream can be dropped independently.
//!
//! Internal failures that are not about the user's code travel as
//! [`AnalysisFault`] in `Result`s and are turned into a single
//! "critical compiler error" diagnostic by the pipeline.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A location in the source text.
///
/// `line` and `column` are 1-based; `column` counts characters. `offset` is
/// the byte offset of the first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    /// Start of the input.
    pub const START: Position = Position {
        line: 1,
        column: 1,
        offset: 0,
    };

    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The analysis stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    #[serde(rename = "lexico")]
    Lexical,
    #[serde(rename = "sintactico")]
    Syntactic,
    #[serde(rename = "semantico")]
    Semantic,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Lexical => "lexical",
            Phase::Syntactic => "syntax",
            Phase::Semantic => "semantic",
        })
    }
}

/// How serious a diagnostic is. Only `Error` blocks later phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    #[serde(rename = "type")]
    pub phase: Phase,
    pub message: String,
    pub line: u32,
    pub column: u32,
    #[serde(rename = "position")]
    pub offset: u32,
    pub severity: Severity,
    /// The offending lexeme, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(
        phase: Phase,
        severity: Severity,
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            phase,
            message: message.into(),
            line: position.line,
            column: position.column,
            offset: position.offset,
            severity,
            context: None,
        }
    }

    /// Attaches the offending lexeme.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Converts to an editor marker spanning the offending lexeme.
    ///
    /// The end column is estimated from the context length, or one
    /// character when there is no context.
    pub fn to_marker(&self) -> EditorMarker {
        let width = self
            .context
            .as_deref()
            .and_then(|c| c.lines().next())
            .map(|c| c.chars().count())
            .unwrap_or(1)
            .max(1);
        let width = u32::try_from(width).unwrap_or(u32::MAX);
        EditorMarker {
            start_line: self.line,
            start_column: self.column,
            end_line: self.line,
            end_column: self.column.saturating_add(width),
            severity: self.severity,
            message: self.message.clone(),
            source: self.phase,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} {}: {}",
            self.line, self.column, self.phase, self.severity, self.message
        )
    }
}

/// An inline editor marker, one per diagnostic. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorMarker {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub severity: Severity,
    pub message: String,
    pub source: Phase,
}

/// Counts diagnostics of one severity.
pub fn count_severity(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}

/// An internal failure, as opposed to a problem in the analyzed code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisFault {
    /// A position no longer fits the report's 32-bit offsets.
    #[error("source offset {0} exceeds the supported range")]
    OffsetOverflow(usize),

    /// A token index computed by a check fell outside the token stream.
    #[error("token index {index} is out of range")]
    TokenOutOfRange { index: usize },

    /// A scope id that the arena never allocated.
    #[error("scope #{0} does not exist")]
    MissingScope(usize),

    /// A symbol id that the table never allocated.
    #[error("symbol #{0} does not exist")]
    MissingSymbol(usize),

    /// An output call whose argument list never closes.
    #[error("call to `{callee}` at line {line} has no closing parenthesis")]
    UnterminatedCall { callee: String, line: u32 },

    /// A phase hit its safety ceiling.
    #[error("{phase} analysis aborted: {reason}")]
    Aborted { phase: Phase, reason: String },

    /// A panic caught at the pipeline boundary.
    #[error("internal panic: {0}")]
    Panic(String),
}

impl AnalysisFault {
    /// The single diagnostic the pipeline reports for this fault.
    pub fn to_diagnostic(&self, position: Position) -> Diagnostic {
        Diagnostic::new(
            Phase::Semantic,
            Severity::Error,
            format!("critical compiler error: {self}"),
            position,
        )
    }
}

/// Converts a byte offset to the report's 32-bit offset.
pub(crate) fn offset_u32(offset: usize) -> Result<u32, AnalysisFault> {
    u32::try_from(offset).map_err(|_| AnalysisFault::OffsetOverflow(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_width_from_context() {
        let diag = Diagnostic::new(
            Phase::Semantic,
            Severity::Error,
            "undeclared",
            Position::new(3, 5, 20),
        )
        .with_context("total");
        let marker = diag.to_marker();
        assert_eq!(marker.start_line, 3);
        assert_eq!(marker.start_column, 5);
        assert_eq!(marker.end_column, 10);
    }

    #[test]
    fn test_marker_without_context() {
        let diag = Diagnostic::new(Phase::Lexical, Severity::Warning, "x", Position::START);
        assert_eq!(diag.to_marker().end_column, 2);
    }

    #[test]
    fn test_fault_message() {
        let fault = AnalysisFault::TokenOutOfRange { index: 7 };
        let diag = fault.to_diagnostic(Position::START);
        assert!(diag.message.starts_with("critical compiler error:"));
        assert_eq!(diag.phase, Phase::Semantic);
        assert!(diag.is_error());
    }

    #[test]
    fn test_external_names() {
        let diag = Diagnostic::new(Phase::Syntactic, Severity::Info, "m", Position::START);
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["type"], "sintactico");
        assert_eq!(json["severity"], "info");
        assert_eq!(json["position"], 0);
    }
}
