//! The analysis pipeline.
//!
//! Runs the phases in order and decides which later phases may run:
//!
//! ```text
//! Source → Lexer ──(lexical errors < 5)──→ Parser ──(no syntax errors)──→ Semantic
//!                                                                          │
//!                        can_execute = no errors in any phase ─────────────┘
//!                                          │
//!                                          └──→ Execution trace
//! ```
//!
//! Only `Error`-severity diagnostics count for gating. The pipeline never
//! fails: internal faults and panics become one "critical compiler error"
//! diagnostic on a (possibly partial) report.
//!
//! # Usage
//!
//! ```
//! use polyglot_analyzer::language::Language;
//! use polyglot_analyzer::pipeline::analyze;
//!
//! let report = analyze("console.log(\"hi\");", Language::JavaScript);
//! assert!(report.can_execute);
//! assert!(report.execution_result.unwrap().output.contains("hi"));
//! ```

pub mod config;
pub mod report;

pub use config::AnalyzerConfig;
pub use report::{
    AnalysisReport, ExecutionResult, LexicalPhase, PhaseSummary, ReportSummary, SemanticPhase,
    SyntaxPhase,
};

use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Instant;

use log::{debug, warn};

use crate::ast::count_nodes;
use crate::diagnostics::{AnalysisFault, Position, Severity, count_severity};
use crate::language::Language;
use crate::lexer::{Lexer, LexicalError, Token};
use crate::parser::Parser;
use crate::semantic::SemanticAnalyzer;
use crate::trace::Simulator;

/// Stack for the analysis thread. Parsing recurses once per nesting level.
const ANALYSIS_STACK_BYTES: usize = 32 * 1024 * 1024;

/// Runs the phases with one configuration. Holds no per-run state, so
/// one analyzer can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes `code` as `language`. Always returns a report.
    pub fn analyze(&self, code: &str, language: Language) -> AnalysisReport {
        let started = Instant::now();
        let mut report = AnalysisReport::new(language);

        if let Err(fault) = self.run_guarded(code, language, &mut report) {
            warn!("analysis of {language} input failed: {fault}");
            let position = report.tokens.first().map_or(Position::START, Token::position);
            report.errors.push(fault.to_diagnostic(position));
            report.analysis_phases.semantic.errors_found += 1;
            report.can_execute = false;
            report.execution_result = None;
        }

        report.summary = ReportSummary::of(&report.errors);
        report.processing_time = started.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "{language} analysis finished in {:.3} ms: {} errors, can_execute={}",
            report.processing_time, report.summary.total_errors, report.can_execute
        );
        report
    }

    /// Runs the phases on a thread with a large stack, converting a panic
    /// into a fault. Falls back to the calling thread if no thread can be
    /// spawned.
    fn run_guarded(
        &self,
        code: &str,
        language: Language,
        report: &mut AnalysisReport,
    ) -> Result<(), AnalysisFault> {
        let run = |report: &mut AnalysisReport| {
            panic::catch_unwind(AssertUnwindSafe(|| self.run(code, language, report)))
                .unwrap_or_else(|payload| Err(AnalysisFault::Panic(panic_message(payload.as_ref()))))
        };

        let spawned = thread::scope(|scope| {
            let handle = thread::Builder::new()
                .name("polyglot-analysis".into())
                .stack_size(ANALYSIS_STACK_BYTES)
                .spawn_scoped(scope, || run(report));
            match handle {
                Ok(handle) => Some(
                    handle
                        .join()
                        .unwrap_or_else(|payload| Err(AnalysisFault::Panic(panic_message(payload.as_ref())))),
                ),
                Err(error) => {
                    warn!("could not spawn the analysis thread: {error}");
                    None
                }
            }
        });
        match spawned {
            Some(outcome) => outcome,
            None => run(report),
        }
    }

    fn run(&self, code: &str, language: Language, report: &mut AnalysisReport) -> Result<(), AnalysisFault> {
        let config = &self.config;

        if code.len() > config.max_source_bytes {
            warn!("rejecting {} byte input (limit {})", code.len(), config.max_source_bytes);
            let error = LexicalError::SourceTooLarge {
                size: code.len(),
                limit: config.max_source_bytes,
            };
            report.errors.push(error.into_diagnostic());
            report.analysis_phases.lexical.errors_found = 1;
            return Ok(());
        }

        // Phase 1: Lexical analysis
        let (tokens, lexical) = Lexer::new(code, language)
            .with_iteration_factor(config.lexer_iteration_factor)
            .analyze();
        let lexical_errors = count_severity(&lexical, Severity::Error);
        debug!("lexical: {} tokens, {lexical_errors} errors", tokens.len());
        report.analysis_phases.lexical = LexicalPhase {
            completed: true,
            tokens_found: tokens.len(),
            errors_found: lexical_errors,
        };
        report.tokens = tokens;
        report.errors.extend(lexical);

        // Phase 2: Syntax analysis
        if lexical_errors >= config.lexical_continuation_threshold {
            debug!(
                "skipping syntax analysis: {lexical_errors} lexical errors (threshold {})",
                config.lexical_continuation_threshold
            );
            return Ok(());
        }
        let (nodes, syntax) = Parser::new(&report.tokens, language)
            .with_max_depth(config.max_nesting_depth)
            .with_cosmetic_threshold(config.cosmetic_token_threshold)
            .parse();
        let syntax_errors = count_severity(&syntax, Severity::Error);
        debug!("syntax: {} nodes, {syntax_errors} errors", count_nodes(&nodes));
        report.analysis_phases.syntax = SyntaxPhase {
            completed: true,
            nodes_generated: count_nodes(&nodes),
            errors_found: syntax_errors,
        };
        report.parse_tree = nodes;
        report.errors.extend(syntax);

        // Phase 3: Semantic analysis
        if syntax_errors > 0 {
            debug!("skipping semantic analysis: {syntax_errors} syntax errors");
            return Ok(());
        }
        let mut analyzer = SemanticAnalyzer::new(&report.tokens, &report.parse_tree, language)
            .with_rule_error_limit(config.semantic_rule_error_limit);
        let outcome = analyzer.analyze();
        let (semantic, symbols) = analyzer.into_results();
        let semantic_errors = count_severity(&semantic, Severity::Error);
        debug!("semantic: {} symbols, {semantic_errors} errors", symbols.len());
        report.analysis_phases.semantic = SemanticPhase {
            completed: outcome.is_ok(),
            symbols_found: symbols.len(),
            errors_found: semantic_errors,
        };
        report.symbol_table = symbols;
        report.errors.extend(semantic);
        outcome?;

        // Phase 4: Execution trace
        report.can_execute = lexical_errors == 0 && syntax_errors == 0 && semantic_errors == 0;
        if report.can_execute {
            let trace = Simulator::new(&report.tokens, &report.symbol_table, language)
                .with_max_lines(config.max_trace_lines)
                .run();
            report.execution_result = Some(trace.into());
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Analyzes `code` with the default configuration.
pub fn analyze(code: &str, language: Language) -> AnalysisReport {
    Analyzer::default().analyze(code, language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Phase;

    #[test]
    fn test_clean_input_runs_every_phase() {
        let report = analyze("let total = 1;\nconsole.log(total);\n", Language::JavaScript);
        let phases = report.analysis_phases;
        assert!(phases.lexical.completed && phases.syntax.completed && phases.semantic.completed);
        assert_eq!(phases.semantic.symbols_found, 1);
        assert!(report.can_execute);
        let result = report.execution_result.unwrap();
        assert!(result.success);
        assert!(result.output.starts_with("total"));
    }

    #[test]
    fn test_few_lexical_errors_still_parse() {
        let report = analyze("let a = 1; é ü\nconsole.log(a);\n", Language::JavaScript);
        assert_eq!(report.analysis_phases.lexical.errors_found, 2);
        assert!(report.analysis_phases.syntax.completed);
        assert!(!report.can_execute);
        assert!(report.execution_result.is_none());
    }

    #[test]
    fn test_many_lexical_errors_stop_parsing() {
        let report = analyze("é é é é é", Language::JavaScript);
        assert_eq!(report.analysis_phases.lexical.errors_found, 5);
        assert!(!report.analysis_phases.syntax.completed);
        assert!(report.parse_tree.is_empty());
    }

    #[test]
    fn test_syntax_errors_stop_semantic_analysis() {
        let report = analyze("(a, b", Language::JavaScript);
        assert!(report.analysis_phases.syntax.completed);
        assert!(!report.analysis_phases.semantic.completed);
        assert!(report.diagnostics_of(Phase::Semantic).next().is_none());
        assert!(!report.can_execute);
    }

    #[test]
    fn test_warnings_do_not_block_execution() {
        let report = analyze("console.log(total);\n", Language::JavaScript);
        assert_eq!(report.summary.total_warnings, 1);
        assert!(report.can_execute);
        assert!(report.execution_result.is_some());
    }

    #[test]
    fn test_source_size_limit() {
        let config = AnalyzerConfig {
            max_source_bytes: 10,
            ..AnalyzerConfig::default()
        };
        let report = Analyzer::new(config).analyze("let value = 12345;", Language::JavaScript);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].phase, Phase::Lexical);
        assert!(report.errors[0].is_error());
        assert!(report.tokens.is_empty());
        assert!(!report.analysis_phases.lexical.completed);
    }

    #[test]
    fn test_configured_trace_lines() {
        let config = AnalyzerConfig {
            max_trace_lines: 2,
            ..AnalyzerConfig::default()
        };
        let source = "print(1)\nprint(2)\nprint(3)\n";
        let report = Analyzer::new(config).analyze(source, Language::Python);
        let output = report.execution_result.unwrap().output;
        assert_eq!(output.lines().count(), 3);
        assert!(output.ends_with("(1 more)"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
