//! Semantic analysis.
//!
//! This phase runs after parsing, and only when parsing reported no
//! errors. It handles:
//!
//! - **Symbol collection**: every declaration the language allows, in the
//!   scope it belongs to
//! - **Name resolution**: linking identifier uses to their declarations
//! - **Assignment checks**: constants, literal type compatibility and
//!   initialization
//! - **Language rules**: naming conventions and per-language shape checks
//!
//! # Architecture
//!
//! The analyzer uses a **two-pass** approach over the token stream (with
//! comments removed):
//!
//! 1. **Pass 1 (Declaration Collection)**: walks the tokens once, opening a
//!    scope whenever a function, class or block starts and defining every
//!    declared name. Each scope records the byte range it covers.
//!
//! 2. **Pass 2 (Verification)**: walks the tokens again, replaying scope
//!    entry and exit from those ranges, and resolves each identifier use.
//!    This pass only runs when pass 1 produced a non-empty table.
//!
//! The language rules run last, and are skipped when the earlier checks
//! already found more errors than the configured limit.
//!
//! # Output
//!
//! Diagnostics in discovery order and the table of declared symbols
//! (built-ins excluded).
//!
//! # Usage
//!
//! ```
//! use polyglot_analyzer::language::Language;
//! use polyglot_analyzer::{lexer, parser, semantic};
//!
//! let tokens = lexer::lex("int main() { return total; }", Language::Cpp);
//! let (nodes, _) = parser::analyze(&tokens, Language::Cpp);
//! let (diagnostics, symbols) = semantic::analyze(&tokens, &nodes, Language::Cpp);
//! assert!(diagnostics[0].message.contains("total"));
//! assert_eq!(symbols[0].name, "main");
//! ```

mod declarations;
pub mod error;
mod resolve;
mod rules;
pub mod symbols;
pub mod types;

pub use error::SemanticError;
pub use symbols::{ParamInfo, ScopeId, ScopeKind, SymbolEntry, SymbolKind, SymbolTable};
pub use types::ValueType;

use log::debug;
use std::collections::HashSet;
use std::ops::Range;

use crate::ast::ParseNode;
use crate::diagnostics::{AnalysisFault, Diagnostic, Position, Severity};
use crate::language::{Language, LanguageProfile};
use crate::lexer::Token;
use crate::parser::expressions::{is_closer, is_opener};
use symbols::SymbolId;

/// Semantic errors tolerated before the language rules are skipped.
pub const DEFAULT_RULE_ERROR_LIMIT: usize = 3;

/// Main entry point for semantic analysis.
pub struct SemanticAnalyzer<'a> {
    /// Non-comment tokens.
    tokens: Vec<&'a Token>,
    nodes: &'a [ParseNode],
    language: Language,
    profile: &'static dyn LanguageProfile,
    /// The symbol table for this input.
    table: SymbolTable,
    /// Accumulated errors.
    errors: Vec<SemanticError>,
    /// Offsets of tokens that declare a name rather than use it.
    declaration_sites: HashSet<u32>,
    /// Source ranges whose identifiers are not name uses (type
    /// expressions, record fields, import paths, column lists).
    opaque: Vec<Range<u32>>,
    /// Indices of braces already owned by a function or class scope.
    claimed: HashSet<usize>,
    /// C++ class, struct, enum and alias names seen so far.
    type_names: HashSet<String>,
    /// C++ pointer and reference variables declared without a value.
    bare_declarations: Vec<SymbolId>,
    rule_error_limit: usize,
}

impl<'a> SemanticAnalyzer<'a> {
    /// Creates an analyzer over the parser's input. Comment tokens are
    /// dropped here.
    pub fn new(tokens: &'a [Token], nodes: &'a [ParseNode], language: Language) -> Self {
        Self {
            tokens: tokens.iter().filter(|t| !t.is_comment()).collect(),
            nodes,
            language,
            profile: language.profile(),
            table: SymbolTable::new(language),
            errors: Vec::new(),
            declaration_sites: HashSet::new(),
            opaque: Vec::new(),
            claimed: HashSet::new(),
            type_names: HashSet::new(),
            bare_declarations: Vec::new(),
            rule_error_limit: DEFAULT_RULE_ERROR_LIMIT,
        }
    }

    pub fn with_rule_error_limit(mut self, limit: usize) -> Self {
        self.rule_error_limit = limit;
        self
    }

    /// Runs both passes and the language rules.
    ///
    /// Problems in the analyzed code are collected as diagnostics; an
    /// `Err` means the analyzer itself failed.
    pub fn analyze(&mut self) -> Result<(), AnalysisFault> {
        self.table = SymbolTable::with_builtins(self.language);

        // Pass 1: Collect declarations
        self.collect_declarations()?;

        // Pass 2: Resolve uses
        if self.table.is_empty() {
            debug!("symbol table is empty; skipping name resolution");
        } else {
            self.verify()?;
        }

        let errors = self.error_count();
        if errors > self.rule_error_limit {
            debug!(
                "skipping {} rules: {errors} semantic errors exceed the limit of {}",
                self.language, self.rule_error_limit
            );
        } else {
            self.apply_rules();
        }
        Ok(())
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors
            .iter()
            .cloned()
            .map(SemanticError::into_diagnostic)
            .collect()
    }

    /// Declared symbols, built-ins excluded.
    pub fn symbols(&self) -> Vec<SymbolEntry> {
        self.table.user_symbols()
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn into_results(self) -> (Vec<Diagnostic>, Vec<SymbolEntry>) {
        let symbols = self.table.user_symbols();
        let diagnostics = self
            .errors
            .into_iter()
            .map(SemanticError::into_diagnostic)
            .collect();
        (diagnostics, symbols)
    }

    fn error_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.severity() == Severity::Error)
            .count()
    }

    fn report(&mut self, error: SemanticError) {
        self.errors.push(error);
    }

    // ==================== Token Helpers ====================

    fn tok(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index).copied()
    }

    fn token(&self, index: usize) -> Result<&'a Token, AnalysisFault> {
        self.tok(index).ok_or(AnalysisFault::TokenOutOfRange { index })
    }

    fn previous(&self, index: usize) -> Option<&'a Token> {
        index.checked_sub(1).and_then(|p| self.tok(p))
    }

    /// True when the token starts a source line.
    fn at_line_start(&self, index: usize) -> bool {
        match (self.previous(index), self.tok(index)) {
            (Some(previous), Some(token)) => previous.line < token.line,
            _ => true,
        }
    }

    fn is_punct_at(&self, index: usize, text: &str) -> bool {
        self.tok(index).is_some_and(|t| t.is_punct(text))
    }

    fn is_keyword_at(&self, index: usize, word: &str) -> bool {
        self.tok(index).is_some_and(|t| t.is_keyword(word))
    }

    /// Index of the bracket closing the one at `open`.
    fn group_end(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(open) {
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Index of the bracket opening the one at `close`.
    fn group_start(&self, close: usize) -> Option<usize> {
        let mut depth = 0usize;
        for i in (0..=close).rev() {
            let token = self.tok(i)?;
            if is_closer(token) {
                depth += 1;
            } else if is_opener(token) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// First index at or after `from` where `stop` holds outside any
    /// bracket group. Returns the token count when nothing matches.
    fn find_at_depth<F>(&self, from: usize, stop: F) -> usize
    where
        F: Fn(&Token) -> bool,
    {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(from) {
            if depth == 0 && stop(token) {
                return i;
            }
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                if depth == 0 {
                    return i;
                }
                depth -= 1;
            }
        }
        self.tokens.len()
    }

    /// Byte range from the start of one token to the end of another.
    fn span(&self, first: usize, last: usize) -> Range<u32> {
        let start = self.tok(first).map_or(0, |t| t.offset);
        let end = self
            .tok(last)
            .or_else(|| self.tokens.last().copied())
            .map_or(start, |t| t.end_offset());
        start..end.max(start)
    }

    /// Source text of `tokens[start..end]`.
    fn text_between(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        if start >= end {
            return String::new();
        }
        crate::parser::expressions::span_text(&self.tokens[start..end])
    }

    fn mark_opaque(&mut self, first: usize, last: usize) {
        if first <= last && first < self.tokens.len() {
            let range = self.span(first, last);
            self.opaque.push(range);
        }
    }

    fn is_opaque(&self, offset: u32) -> bool {
        self.opaque.iter().any(|r| r.contains(&offset))
    }

    fn position_of(&self, index: usize) -> Position {
        self.tok(index).map_or(Position::START, |t| t.position())
    }
}

/// Runs semantic analysis and returns its diagnostics and declared
/// symbols. An internal failure is reported as one more diagnostic.
pub fn analyze(tokens: &[Token], nodes: &[ParseNode], language: Language) -> (Vec<Diagnostic>, Vec<SymbolEntry>) {
    let mut analyzer = SemanticAnalyzer::new(tokens, nodes, language);
    let outcome = analyzer.analyze();
    let (mut diagnostics, symbols) = analyzer.into_results();
    if let Err(fault) = outcome {
        let position = tokens.first().map_or(Position::START, Token::position);
        diagnostics.push(fault.to_diagnostic(position));
    }
    (diagnostics, symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser;

    pub(super) fn run(source: &str, language: Language) -> (Vec<Diagnostic>, Vec<SymbolEntry>) {
        let tokens = lex(source, language);
        let (nodes, syntax) = parser::analyze(&tokens, language);
        assert!(
            syntax.iter().all(|d| !d.is_error()),
            "unexpected syntax errors: {syntax:?}"
        );
        analyze(&tokens, &nodes, language)
    }

    #[test]
    fn test_comments_are_ignored() {
        let (diags, symbols) = run("// total is set below\nlet total = 1;\nconsole.log(total);\n", Language::JavaScript);
        assert!(diags.iter().all(|d| !d.message.contains("total")), "{diags:?}");
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn test_builtins_are_not_reported() {
        let (_, symbols) = run("print(len([1, 2]))\n", Language::Python);
        assert!(symbols.is_empty());
    }

    #[test]
    fn test_rules_skipped_past_error_limit() {
        let source = "void main() {\n  a = 1;\n  b = 2;\n  c = 3;\n  d = 4;\n}\n";
        let (diags, _) = run(source, Language::Cpp);
        assert_eq!(diags.iter().filter(|d| d.is_error()).count(), 4);
        assert!(!diags.iter().any(|d| d.message.contains("should return `int`")));
    }

    #[test]
    fn test_rule_limit_is_configurable() {
        let source = "void main() {\n  a = 1;\n  b = 2;\n  c = 3;\n  d = 4;\n}\n";
        let tokens = lex(source, Language::Cpp);
        let (nodes, _) = parser::analyze(&tokens, Language::Cpp);
        let mut analyzer = SemanticAnalyzer::new(&tokens, &nodes, Language::Cpp).with_rule_error_limit(10);
        analyzer.analyze().unwrap();
        assert!(analyzer.diagnostics().iter().any(|d| d.message.contains("should return `int`")));
    }

    #[test]
    fn test_group_helpers() {
        let tokens = lex("f(a, (b), [c]) + 1", Language::JavaScript);
        let nodes = Vec::new();
        let analyzer = SemanticAnalyzer::new(&tokens, &nodes, Language::JavaScript);
        assert_eq!(analyzer.group_end(1), Some(11));
        assert_eq!(analyzer.group_start(11), Some(1));
        assert_eq!(analyzer.find_at_depth(2, |t| t.is_punct(",")), 3);
        assert_eq!(analyzer.text_between(4, 7), "(b)");
    }
}
