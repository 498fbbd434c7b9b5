//! Syntax analysis for every supported language.
//!
//! The parser turns the token stream into a forest of [`ParseNode`]s, one
//! per top-level statement, and collects syntax diagnostics along the way.
//! Each language gets its own statement routine; all of them share the
//! token navigation in [`tokens`] and the shallow expression reader in
//! [`expressions`].
//!
//! # Example
//!
//! ```
//! use polyglot_analyzer::language::Language;
//! use polyglot_analyzer::lexer::lex;
//! use polyglot_analyzer::parser::Parser;
//!
//! let tokens = lex("let x = 5;\nconsole.log(x);", Language::JavaScript);
//! let mut parser = Parser::new(&tokens, Language::JavaScript);
//! let (nodes, diagnostics) = parser.parse();
//!
//! assert_eq!(nodes.len(), 2);
//! assert!(diagnostics.is_empty());
//! ```
//!
//! # Module Structure
//!
//! - [`tokens`] - Token navigation utilities (peek, advance, match, expect)
//! - [`expressions`] - Shallow expressions, parameter lists, bracket groups
//! - [`c_family`] - Brace blocks and control flow shared by JavaScript and
//!   C++, plus the JavaScript and generic statement routines
//! - [`cpp`] - C++ declarations
//! - [`python`] - Indentation-based statements
//! - [`pascal`] - Sections, routines and BEGIN/END blocks
//! - [`sql`] - T-SQL and PL/SQL statements
//! - [`markup`] - HTML elements
//! - [`structure`] - Whole-input checks run after parsing
//! - [`error`] - Syntax error types
//!
//! # Error Recovery
//!
//! Errors are collected rather than returned early. After a failed
//! statement the parser skips to a synchronization point and continues,
//! so one input can report several independent problems. Every loop is
//! bounded: nesting stops at a depth limit and the total number of
//! statement attempts is capped relative to the token count.

mod c_family;
mod cpp;
mod error;
pub(crate) mod expressions;
mod markup;
mod pascal;
mod python;
mod sql;
mod structure;
mod tokens;

pub use error::SyntaxError;

use log::debug;
use std::collections::HashSet;

use crate::ast::ParseNode;
use crate::diagnostics::{Diagnostic, Severity};
use crate::language::{Language, LanguageProfile};
use crate::lexer::Token;

/// Default maximum block nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Below this many tokens, warnings are not reported.
pub const DEFAULT_COSMETIC_THRESHOLD: usize = 10;

/// Statement attempts allowed per token, plus a fixed allowance.
const STATEMENT_CEILING_FACTOR: usize = 4;
const STATEMENT_CEILING_BASE: usize = 16;

/// Result of a statement routine. `Ok(None)` means tokens were consumed
/// without producing a node (empty statements, labels, stray closers).
/// `Err(())` means an error was recorded and recovery is needed.
pub(crate) type StatementResult = Result<Option<ParseNode>, ()>;

/// Syntax analyzer over a token slice.
///
/// Comment tokens are dropped up front; every other token is visible to
/// the statement routines.
pub struct Parser<'a> {
    /// Tokens to parse, comments removed.
    tokens: Vec<&'a Token>,
    /// Current position in the token stream.
    current: usize,
    /// Collected syntax errors and warnings.
    errors: Vec<SyntaxError>,
    language: Language,
    profile: &'static dyn LanguageProfile,
    depth: usize,
    max_depth: usize,
    nesting_reported: bool,
    iterations: usize,
    ceiling: usize,
    aborted: bool,
    cosmetic_threshold: usize,
    /// C++ class, struct and typedef names seen so far.
    type_names: HashSet<String>,
    /// Inside a class body, where functions are methods.
    in_class: bool,
    /// Currently open markup elements, innermost last.
    open_elements: Vec<String>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given tokens.
    pub fn new(tokens: &'a [Token], language: Language) -> Self {
        let tokens: Vec<&Token> = tokens.iter().filter(|t| !t.is_comment()).collect();
        let ceiling = tokens
            .len()
            .saturating_mul(STATEMENT_CEILING_FACTOR)
            .saturating_add(STATEMENT_CEILING_BASE);
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            language,
            profile: language.profile(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            nesting_reported: false,
            iterations: 0,
            ceiling,
            aborted: false,
            cosmetic_threshold: DEFAULT_COSMETIC_THRESHOLD,
            type_names: HashSet::new(),
            in_class: false,
            open_elements: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Inputs with fewer tokens than this only report errors.
    pub fn with_cosmetic_threshold(mut self, threshold: usize) -> Self {
        self.cosmetic_threshold = threshold;
        self
    }

    /// Parses the token stream into a node forest and its diagnostics.
    ///
    /// Whole-input structure checks only run when parsing itself found at
    /// most one error, so a badly broken input is not buried under
    /// follow-on reports.
    pub fn parse(&mut self) -> (Vec<ParseNode>, Vec<Diagnostic>) {
        let nodes = self.parse_program();

        let critical = self
            .errors
            .iter()
            .filter(|e| e.severity() == Severity::Error)
            .count();
        if critical <= 1 {
            self.check_structure(&nodes);
        }

        let report_cosmetic = self.tokens.len() >= self.cosmetic_threshold;
        let diagnostics: Vec<Diagnostic> = std::mem::take(&mut self.errors)
            .into_iter()
            .filter(|e| report_cosmetic || e.severity() == Severity::Error)
            .map(SyntaxError::into_diagnostic)
            .collect();

        debug!(
            "parsed {} {} tokens into {} statements ({} diagnostics, {} attempts)",
            self.tokens.len(),
            self.language,
            nodes.len(),
            diagnostics.len(),
            self.iterations
        );
        (nodes, diagnostics)
    }

    /// Parses a complete program (sequence of statements).
    fn parse_program(&mut self) -> Vec<ParseNode> {
        let mut nodes = Vec::new();
        while !self.is_at_end() {
            if let Some(node) = self.statement() {
                nodes.push(node);
            }
        }
        nodes
    }

    // ==================== Statement Driver ====================

    /// Parses one statement with recovery and progress guarantees.
    ///
    /// Always consumes at least one token unless the input is exhausted or
    /// the statement ceiling was reached.
    pub(super) fn statement(&mut self) -> Option<ParseNode> {
        if self.is_at_end() {
            return None;
        }
        self.iterations += 1;
        if self.iterations > self.ceiling {
            self.abort();
            return None;
        }

        let before = self.current;
        match self.dispatch_statement() {
            Ok(node) => {
                if self.current == before {
                    self.advance();
                }
                node
            }
            Err(()) => {
                self.synchronize();
                None
            }
        }
    }

    fn dispatch_statement(&mut self) -> StatementResult {
        match self.language {
            Language::JavaScript => self.script_statement(),
            Language::Python => self.python_statement(),
            Language::Cpp => self.cpp_statement(),
            Language::Html => self.markup_node(),
            Language::Pascal => self.pascal_statement(),
            Language::TSql => self.tsql_statement(),
            Language::PlSql => self.plsql_statement(),
            Language::Unknown => self.generic_statement(),
        }
    }

    /// Parses statements until `stop` matches the current token or input
    /// runs out. The stopping token is not consumed.
    pub(super) fn statements_until<F>(&mut self, stop: F) -> Vec<ParseNode>
    where
        F: Fn(&Token) -> bool,
    {
        let mut nodes = Vec::new();
        while let Some(token) = self.peek() {
            if self.aborted || stop(token) {
                break;
            }
            if let Some(node) = self.statement() {
                nodes.push(node);
            }
        }
        nodes
    }

    /// Parses a single statement one nesting level down.
    ///
    /// Past the depth limit the statement is skipped instead: a brace
    /// group is consumed whole, anything else up to the next `;`.
    pub(super) fn nested_statement(&mut self) -> Option<ParseNode> {
        if !self.enter_nested() {
            if self.check_punct("{") {
                self.skip_balanced("{", "}");
            } else {
                while let Some(token) = self.advance() {
                    if token.is_punct(";") {
                        break;
                    }
                }
            }
            return None;
        }
        let node = self.statement();
        self.leave_nested();
        node
    }

    // ==================== Limits ====================

    /// Enters one nesting level. Returns false past the limit, reporting
    /// the first time only.
    pub(super) fn enter_nested(&mut self) -> bool {
        if self.depth >= self.max_depth {
            if !self.nesting_reported {
                self.nesting_reported = true;
                self.errors.push(SyntaxError::NestingTooDeep {
                    limit: self.max_depth,
                    position: self.current_position(),
                });
            }
            return false;
        }
        self.depth += 1;
        true
    }

    pub(super) fn leave_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn abort(&mut self) {
        if !self.aborted {
            debug!("syntax analysis stopped after {} statement attempts", self.iterations);
            self.errors.push(SyntaxError::Aborted {
                position: self.current_position(),
            });
            self.aborted = true;
        }
    }
}

/// Parses `tokens` with default limits.
pub fn analyze(tokens: &[Token], language: Language) -> (Vec<ParseNode>, Vec<Diagnostic>) {
    Parser::new(tokens, language).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::diagnostics::Phase;
    use crate::lexer::lex;

    fn parse(source: &str, language: Language) -> (Vec<ParseNode>, Vec<Diagnostic>) {
        let tokens = lex(source, language);
        analyze(&tokens, language)
    }

    fn errors(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
        diagnostics.iter().filter(|d| d.is_error()).collect()
    }

    #[test]
    fn test_parse_console_log() {
        let (nodes, diagnostics) = parse("console.log(\"hi\")", Language::JavaScript);
        assert_eq!(nodes.len(), 1);
        assert!(diagnostics.is_empty());
        let calls = nodes[0].find_all(NodeKind::Call);
        assert_eq!(calls[0].value(), Some("console.log"));
    }

    #[test]
    fn test_unclosed_paren_single_error() {
        let (_, diagnostics) = parse("(a, b", Language::JavaScript);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].phase, Phase::Syntactic);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!((diagnostics[0].line, diagnostics[0].column), (1, 1));
    }

    #[test]
    fn test_empty_input() {
        let (nodes, diagnostics) = parse("", Language::Python);
        assert!(nodes.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_deep_parens_terminate() {
        let source = "(".repeat(10_000);
        let (_, diagnostics) = parse(&source, Language::JavaScript);
        // Capped delimiter report plus its summary line.
        assert_eq!(diagnostics.len(), 26);
    }

    #[test]
    fn test_deep_blocks_report_nesting_once() {
        let source = format!("{}{}", "{".repeat(100), "}".repeat(100));
        let tokens = lex(&source, Language::JavaScript);
        let (_, diagnostics) = Parser::new(&tokens, Language::JavaScript)
            .with_max_depth(32)
            .parse();
        let nesting: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.message.contains("nesting"))
            .collect();
        assert_eq!(nesting.len(), 1);
    }

    #[test]
    fn test_recovery_reports_multiple_errors() {
        let source = "let = 1;\nlet ok = 2;\nclass { }\n";
        let (nodes, diagnostics) = parse(source, Language::JavaScript);
        assert_eq!(errors(&diagnostics).len(), 2);
        assert!(nodes.iter().any(|n| n.kind == NodeKind::VariableDeclaration));
    }

    #[test]
    fn test_cosmetic_suppressed_for_short_input() {
        let (_, diagnostics) = parse("int x = 1", Language::Cpp);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_generic_statements() {
        let (nodes, diagnostics) = parse("total = 1 + 2\nshow(total)", Language::Unknown);
        assert_eq!(nodes.len(), 2);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let source = "def f(x):\n    return x + 1\nprint(f(2))\n";
        assert_eq!(parse(source, Language::Python), parse(source, Language::Python));
    }
}
