//! Semantic analysis error types.
//!
//! These errors represent problems found during symbol resolution and
//! checking that aren't syntax errors. Several of them take their
//! severity from language policy (an undeclared name is an error in C++
//! but only a warning in Python), so those variants carry it.

use thiserror::Error;

use crate::diagnostics::{Diagnostic, Phase, Position, Severity};
use crate::semantic::types::ValueType;

/// A semantic problem with location and description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    // === Resolution ===
    /// Use of a name that no visible scope declares.
    #[error("`{name}` is not declared")]
    Undeclared {
        name: String,
        severity: Severity,
        position: Position,
    },

    /// Use of a name that is only declared further down.
    #[error("`{name}` is used before its declaration on line {declared_line}")]
    UsedBeforeDeclaration {
        name: String,
        declared_line: u32,
        severity: Severity,
        position: Position,
    },

    /// Assignment to a name that was never declared.
    #[error("assignment to undeclared `{name}`")]
    AssignmentToUndeclared { name: String, position: Position },

    /// Name declared twice in one scope.
    #[error("`{name}` is already declared in this scope (line {previous_line})")]
    Redeclared {
        name: String,
        previous_line: u32,
        severity: Severity,
        position: Position,
    },

    // === Assignments ===
    /// Attempting to assign to a constant.
    #[error("cannot assign to constant `{name}`")]
    AssignmentToConstant { name: String, position: Position },

    /// Literal whose type cannot be stored in the target.
    #[error("cannot assign a value of type {found} to `{name}` of type {expected}")]
    TypeMismatch {
        name: String,
        expected: ValueType,
        found: ValueType,
        position: Position,
    },

    // === Usage ===
    /// Variable that is declared but never read.
    #[error("variable `{name}` is declared but never used")]
    UnusedVariable { name: String, position: Position },

    /// Variable read before anything was stored in it.
    #[error("variable `{name}` is used before it is initialized")]
    Uninitialized { name: String, position: Position },

    // === Language rules ===
    /// Finding of a language rule set (naming, conventions, shape checks).
    #[error("{message}")]
    Rule {
        message: String,
        severity: Severity,
        position: Position,
    },

    /// A check that could not complete.
    #[error("check `{check}` could not complete: {reason}")]
    CheckFailed {
        check: &'static str,
        reason: String,
        position: Position,
    },
}

impl SemanticError {
    /// Returns the location of this error.
    pub fn position(&self) -> Position {
        match self {
            SemanticError::Undeclared { position, .. }
            | SemanticError::UsedBeforeDeclaration { position, .. }
            | SemanticError::AssignmentToUndeclared { position, .. }
            | SemanticError::Redeclared { position, .. }
            | SemanticError::AssignmentToConstant { position, .. }
            | SemanticError::TypeMismatch { position, .. }
            | SemanticError::UnusedVariable { position, .. }
            | SemanticError::Uninitialized { position, .. }
            | SemanticError::Rule { position, .. }
            | SemanticError::CheckFailed { position, .. } => *position,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SemanticError::Undeclared { severity, .. }
            | SemanticError::UsedBeforeDeclaration { severity, .. }
            | SemanticError::Redeclared { severity, .. }
            | SemanticError::Rule { severity, .. } => *severity,
            SemanticError::AssignmentToUndeclared { .. }
            | SemanticError::AssignmentToConstant { .. }
            | SemanticError::TypeMismatch { .. } => Severity::Error,
            SemanticError::UnusedVariable { .. } | SemanticError::Uninitialized { .. } => {
                Severity::Warning
            }
            SemanticError::CheckFailed { .. } => Severity::Info,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            SemanticError::Undeclared { name, .. }
            | SemanticError::UsedBeforeDeclaration { name, .. }
            | SemanticError::AssignmentToUndeclared { name, .. }
            | SemanticError::Redeclared { name, .. }
            | SemanticError::AssignmentToConstant { name, .. }
            | SemanticError::TypeMismatch { name, .. }
            | SemanticError::UnusedVariable { name, .. }
            | SemanticError::Uninitialized { name, .. } => Some(name),
            SemanticError::Rule { .. } | SemanticError::CheckFailed { .. } => None,
        }
    }

    /// Creates a rule-set finding.
    pub fn rule(severity: Severity, message: impl Into<String>, position: Position) -> Self {
        SemanticError::Rule {
            message: message.into(),
            severity,
            position,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let diagnostic = Diagnostic::new(
            Phase::Semantic,
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
    fn test_policy_severity() {
        let err = SemanticError::Undeclared {
            name: "total".to_string(),
            severity: Severity::Warning,
            position: Position::new(2, 5, 12),
        };
        assert_eq!(err.severity(), Severity::Warning);
        assert_eq!(err.to_string(), "`total` is not declared");
        assert_eq!(err.position(), Position::new(2, 5, 12));
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = SemanticError::TypeMismatch {
            name: "count".to_string(),
            expected: ValueType::Integer,
            found: ValueType::String,
            position: Position::START,
        };
        assert_eq!(err.to_string(), "cannot assign a value of type string to `count` of type integer");
        assert_eq!(err.severity(), Severity::Error);

        let err = SemanticError::TypeMismatch {
            name: "label".to_string(),
            expected: ValueType::String,
            found: ValueType::Integer,
            position: Position::START,
        };
        assert_eq!(err.to_string(), "cannot assign a value of type integer to `label` of type string");
    }

    #[test]
    fn test_diagnostic_carries_name() {
        let diag = SemanticError::UnusedVariable {
            name: "tmp".to_string(),
            position: Position::new(4, 9, 40),
        }
        .into_diagnostic();
        assert_eq!(diag.phase, Phase::Semantic);
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.context.as_deref(), Some("tmp"));
        assert_eq!(diag.to_marker().end_column, 12);
    }

    #[test]
    fn test_failed_check_is_info() {
        let err = SemanticError::CheckFailed {
            check: "naming",
            reason: "token index 3 is out of range".to_string(),
            position: Position::START,
        };
        assert_eq!(err.severity(), Severity::Info);
        assert!(err.to_string().starts_with("check `naming`"));
    }
}
