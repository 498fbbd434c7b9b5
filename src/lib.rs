//! # polyglot-analyzer
//!
//! An educational compiler front end for several languages: JavaScript,
//! Python, C++, HTML, Pascal, T-SQL and PL/SQL.
//!
//! ## Architecture
//!
//! Every language goes through the same pipeline:
//!
//! ```text
//! Source → Lexer → Tokens → Parser → Parse tree → Semantic Analysis → Symbols
//!                                                                       │
//!                                         Execution trace ←─────────────┘
//! ```
//!
//! Each phase is implemented as a separate module:
//!
//! - [`language`] - Supported languages and their static tables
//! - [`lexer`] - Tokenizes source code into a stream of tokens
//! - [`parser`] - Builds a shallow parse tree and checks structure
//! - [`ast`] - Parse tree node definitions
//! - [`semantic`] - Scopes, symbol resolution and per-language rules
//! - [`trace`] - Simulated program output
//! - [`diagnostics`] - Phase-tagged diagnostics shared by every phase
//! - [`pipeline`] - Runs the phases and builds the report
//! - [`lsp`] - Language Server Protocol implementation for IDE integration
//!
//! Problems in the analyzed code never fail a phase. They are collected as
//! [`Diagnostic`](diagnostics::Diagnostic)s and returned with whatever the
//! phase produced.
//!
//! ## Example
//!
//! ```
//! use polyglot_analyzer::analyze;
//! use polyglot_analyzer::language::Language;
//!
//! let source = r#"
//! def greet(name):
//!     print("Hello", name)
//!
//! greet("world")
//! "#;
//!
//! let report = analyze(source, Language::Python);
//! assert!(report.can_execute);
//! println!("Found {} symbols", report.symbol_table.len());
//! ```

pub mod ast;
pub mod diagnostics;
pub mod language;
pub mod lexer;
pub mod lsp;
pub mod parser;
pub mod pipeline;
pub mod semantic;
pub mod trace;

pub use pipeline::analyze;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::ast::{NodeKind, ParseNode};
    pub use crate::diagnostics::{AnalysisFault, Diagnostic, EditorMarker, Phase, Position, Severity};
    pub use crate::language::Language;
    pub use crate::lexer::{Lexer, Token, TokenCategory, TokenKind};
    pub use crate::parser::{Parser, SyntaxError};
    pub use crate::pipeline::{AnalysisReport, Analyzer, AnalyzerConfig, analyze};
    pub use crate::semantic::{SemanticAnalyzer, SemanticError, SymbolEntry, SymbolKind};
    pub use crate::trace::{ExecutionTrace, simulate};
}
