//! The serialized result of one analysis.

use serde::Serialize;

use crate::ast::ParseNode;
use crate::diagnostics::{Diagnostic, EditorMarker, Phase, Severity};
use crate::language::Language;
use crate::lexer::Token;
use crate::semantic::SymbolEntry;
use crate::trace::ExecutionTrace;

/// Everything one run of the pipeline produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub language: Language,
    pub tokens: Vec<Token>,
    pub parse_tree: Vec<ParseNode>,
    pub symbol_table: Vec<SymbolEntry>,
    /// Diagnostics of every phase, in phase order.
    pub errors: Vec<Diagnostic>,
    pub can_execute: bool,
    pub analysis_phases: PhaseSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_result: Option<ExecutionResult>,
    /// Wall-clock milliseconds.
    pub processing_time: f64,
    pub summary: ReportSummary,
}

/// Completion and counts per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PhaseSummary {
    pub lexical: LexicalPhase,
    pub syntax: SyntaxPhase,
    pub semantic: SemanticPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LexicalPhase {
    pub completed: bool,
    pub tokens_found: usize,
    pub errors_found: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxPhase {
    pub completed: bool,
    /// Recursive node count.
    pub nodes_generated: usize,
    pub errors_found: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticPhase {
    pub completed: bool,
    pub symbols_found: usize,
    pub errors_found: usize,
}

/// Diagnostic totals by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_errors: usize,
    pub total_warnings: usize,
    pub total_infos: usize,
}

impl ReportSummary {
    pub fn of(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Self::default();
        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Error => summary.total_errors += 1,
                Severity::Warning => summary.total_warnings += 1,
                Severity::Info => summary.total_infos += 1,
            }
        }
        summary
    }
}

/// The externally visible form of an [`ExecutionTrace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ExecutionTrace> for ExecutionResult {
    fn from(trace: ExecutionTrace) -> Self {
        let error = (!trace.errors.is_empty()).then(|| trace.errors.join("; "));
        Self {
            success: trace.success,
            output: trace.output,
            error,
        }
    }
}

impl AnalysisReport {
    /// An empty report for `language`; the pipeline fills it in phase by
    /// phase.
    pub fn new(language: Language) -> Self {
        Self {
            language,
            tokens: Vec::new(),
            parse_tree: Vec::new(),
            symbol_table: Vec::new(),
            errors: Vec::new(),
            can_execute: false,
            analysis_phases: PhaseSummary::default(),
            execution_result: None,
            processing_time: 0.0,
            summary: ReportSummary::default(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(Diagnostic::is_error)
    }

    /// Diagnostics produced by one phase.
    pub fn diagnostics_of(&self, phase: Phase) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().filter(move |d| d.phase == phase)
    }

    /// One editor marker per diagnostic.
    pub fn markers(&self) -> Vec<EditorMarker> {
        self.errors.iter().map(Diagnostic::to_marker).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Position;

    #[test]
    fn test_field_names() {
        let mut report = AnalysisReport::new(Language::TSql);
        report.errors.push(Diagnostic::new(
            Phase::Syntactic,
            Severity::Error,
            "missing column definitions",
            Position::new(1, 8, 7),
        ));
        report.summary = ReportSummary::of(&report.errors);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["language"], "tsql");
        assert_eq!(value["canExecute"], false);
        assert_eq!(value["analysisPhases"]["lexical"]["tokensFound"], 0);
        assert_eq!(value["analysisPhases"]["syntax"]["nodesGenerated"], 0);
        assert_eq!(value["analysisPhases"]["semantic"]["symbolsFound"], 0);
        assert_eq!(value["errors"][0]["type"], "sintactico");
        assert_eq!(value["errors"][0]["position"], 7);
        assert_eq!(value["summary"]["totalErrors"], 1);
        assert!(value.get("executionResult").is_none());
        assert!(value.get("parseTree").is_some());
        assert!(value.get("symbolTable").is_some());
    }

    #[test]
    fn test_execution_result_from_trace() {
        let trace = ExecutionTrace {
            success: false,
            output: String::new(),
            errors: vec!["a".to_string(), "b".to_string()],
        };
        let result = ExecutionResult::from(trace);
        assert_eq!(result.error.as_deref(), Some("a; b"));
    }
}
