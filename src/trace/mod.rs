//! Simulated execution trace.
//!
//! This is the last stage of the pipeline and only runs for inputs that
//! passed every analysis phase. Nothing is executed: the trace is built by
//! recognizing output primitives in the token stream and echoing their
//! arguments, by describing SQL statements, and by listing the declared
//! symbols.
//!
//! # Architecture
//!
//! ```text
//! Tokens + Symbols → Simulator → ExecutionTrace
//!                       ↑
//!          output primitives (script, C++, Pascal, PL/SQL)
//!          statement descriptions (SQL, HTML)
//! ```
//!
//! | Language   | Recognized output                                   |
//! |------------|-----------------------------------------------------|
//! | JavaScript | `console.log/info/warn/error`, `alert`, `document.write` |
//! | Python     | `print(...)`, keyword arguments skipped             |
//! | C++        | `cout <<` chains, `printf`, `puts`                  |
//! | Pascal     | `write`, `writeln`                                  |
//! | T-SQL      | `PRINT`                                             |
//! | PL/SQL     | `dbms_output.put_line`, `dbms_output.put`           |
//!
//! The simulator never fails the pipeline: an internal fault becomes a
//! trace with `success: false` and the fault text.

mod output;
mod statements;

use log::{debug, warn};
use serde::Serialize;

use crate::diagnostics::AnalysisFault;
use crate::language::Language;
use crate::lexer::Token;
use crate::parser::expressions::{is_closer, is_opener};
use crate::semantic::{SymbolEntry, SymbolKind};

/// Default cap on the number of output lines.
pub const DEFAULT_MAX_TRACE_LINES: usize = 200;

/// Result of a simulated run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExecutionTrace {
    pub success: bool,
    pub output: String,
    pub errors: Vec<String>,
}

impl ExecutionTrace {
    fn failed(output: String, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output,
            errors: vec![error.into()],
        }
    }
}

/// Builds an [`ExecutionTrace`] from analyzed tokens and symbols.
pub struct Simulator<'a> {
    /// Non-comment tokens.
    tokens: Vec<&'a Token>,
    symbols: &'a [SymbolEntry],
    language: Language,
    max_lines: usize,
    lines: Vec<String>,
    /// Lines produced past `max_lines`.
    dropped: usize,
    /// Text written since the last line break.
    pending: String,
}

impl<'a> Simulator<'a> {
    pub fn new(tokens: &'a [Token], symbols: &'a [SymbolEntry], language: Language) -> Self {
        Self {
            tokens: tokens.iter().filter(|t| !t.is_comment()).collect(),
            symbols,
            language,
            max_lines: DEFAULT_MAX_TRACE_LINES,
            lines: Vec::new(),
            dropped: 0,
            pending: String::new(),
        }
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Produces the trace.
    pub fn run(mut self) -> ExecutionTrace {
        if self.language == Language::Unknown {
            return ExecutionTrace::failed(
                String::new(),
                "execution trace not available for unknown language",
            );
        }
        match self.collect() {
            Ok(()) => {
                debug!("trace produced {} lines", self.lines.len() + self.dropped);
                ExecutionTrace {
                    success: true,
                    output: self.render(),
                    errors: Vec::new(),
                }
            }
            Err(fault) => {
                warn!("execution trace failed: {fault}");
                self.flush();
                ExecutionTrace::failed(self.render(), fault.to_string())
            }
        }
    }

    fn collect(&mut self) -> Result<(), AnalysisFault> {
        match self.language {
            Language::JavaScript => self.script_output()?,
            Language::Python => self.python_output()?,
            Language::Cpp => self.cpp_output()?,
            Language::Pascal => self.pascal_output()?,
            Language::TSql | Language::PlSql => self.sql_statements()?,
            Language::Html => self.markup_summary(),
            Language::Unknown => {}
        }
        self.flush();
        self.declared_symbols();
        Ok(())
    }

    // ==================== Output Buffer ====================

    fn push_line(&mut self, line: String) {
        if self.lines.len() < self.max_lines {
            self.lines.push(line);
        } else {
            self.dropped += 1;
        }
    }

    /// Appends text to the current line. Embedded newlines end lines.
    fn write(&mut self, text: &str) {
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.pending.push_str(first);
        }
        for part in parts {
            let line = std::mem::replace(&mut self.pending, part.to_string());
            self.push_line(line);
        }
    }

    /// Ends the current line, even when it is empty.
    fn end_line(&mut self) {
        let line = std::mem::take(&mut self.pending);
        self.push_line(line);
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.end_line();
        }
    }

    /// Emits a whole line after finishing any partial one.
    fn emit(&mut self, line: impl Into<String>) {
        self.flush();
        self.push_line(line.into());
    }

    fn render(&self) -> String {
        let mut output = self.lines.join("\n");
        if self.dropped > 0 {
            output.push_str(&format!(
                "\n... output truncated after {} lines ({} more)",
                self.max_lines, self.dropped
            ));
        }
        output
    }

    // ==================== Token Helpers ====================

    fn tok(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index).copied()
    }

    /// True when the token starts a source line.
    fn at_line_start(&self, index: usize) -> bool {
        match (index.checked_sub(1).and_then(|p| self.tok(p)), self.tok(index)) {
            (Some(previous), Some(token)) => previous.line < token.line,
            _ => true,
        }
    }

    /// Index of the first `;` outside brackets at or after `from`, or the
    /// token count.
    fn statement_end(&self, from: usize) -> usize {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(from) {
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && token.is_punct(";") {
                return i;
            }
        }
        self.tokens.len()
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

    /// Argument list of the call whose `(` is at `open`, split on
    /// top-level commas. Returns the arguments and the index of `)`.
    fn call_arguments(
        &self,
        callee: &str,
        open: usize,
    ) -> Result<(Vec<Vec<&'a Token>>, usize), AnalysisFault> {
        let close = self.group_end(open).ok_or_else(|| AnalysisFault::UnterminatedCall {
            callee: callee.to_string(),
            line: self.tok(open).map_or(0, |t| t.line),
        })?;
        Ok((self.split_top_level(open + 1, close, ","), close))
    }

    /// Splits `tokens[start..end]` on `separator` outside brackets.
    fn split_top_level(&self, start: usize, end: usize, separator: &str) -> Vec<Vec<&'a Token>> {
        let Some(tokens) = self.tokens.get(start..end) else {
            return Vec::new();
        };
        split_tokens(tokens, &[separator])
    }

    // ==================== Symbols ====================

    fn declared_symbols(&mut self) {
        let groups = [
            ("variables", &[SymbolKind::Variable, SymbolKind::Constant][..]),
            ("functions", &[SymbolKind::Function, SymbolKind::Method][..]),
            ("classes", &[SymbolKind::Class][..]),
        ];
        for (label, kinds) in groups {
            let mut names: Vec<&str> = Vec::new();
            for symbol in self.symbols.iter().filter(|s| kinds.contains(&s.kind)) {
                if !names.contains(&symbol.name.as_str()) {
                    names.push(&symbol.name);
                }
            }
            if !names.is_empty() {
                let line = format!("declared {label}: {}", names.join(", "));
                self.emit(line);
            }
        }
    }
}

/// Splits `tokens` on any of `separators` outside brackets. Empty input
/// yields no parts.
fn split_tokens<'t>(tokens: &[&'t Token], separators: &[&str]) -> Vec<Vec<&'t Token>> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if is_opener(token) {
            depth += 1;
        } else if is_closer(token) {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && separators.iter().any(|s| token.is_punct(s)) {
            parts.push(tokens[start..i].to_vec());
            start = i + 1;
        }
    }
    parts.push(tokens[start..].to_vec());
    parts
}

/// Runs the simulator with the default line cap.
pub fn simulate(tokens: &[Token], symbols: &[SymbolEntry], language: Language) -> ExecutionTrace {
    Simulator::new(tokens, symbols, language).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::{parser, semantic};

    pub(super) fn trace(source: &str, language: Language) -> ExecutionTrace {
        let tokens = lex(source, language);
        simulate(&tokens, &[], language)
    }

    #[test]
    fn test_console_log() {
        let result = trace("console.log(\"hi\");\n", Language::JavaScript);
        assert!(result.success);
        assert_eq!(result.output, "hi");
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_unknown_language() {
        let result = trace("anything at all", Language::Unknown);
        assert!(!result.success);
        assert!(result.errors[0].contains("not available"));
    }

    #[test]
    fn test_unterminated_call_fails() {
        let result = trace("console.log(\"hi\";\n", Language::JavaScript);
        assert!(!result.success);
        assert!(result.errors[0].contains("no closing parenthesis"), "{result:?}");
    }

    #[test]
    fn test_output_is_capped() {
        let source = "print('x')\n".repeat(300);
        let tokens = lex(&source, Language::Python);
        let result = Simulator::new(&tokens, &[], Language::Python)
            .with_max_lines(200)
            .run();
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines.len(), 201);
        assert!(lines[200].contains("truncated after 200 lines (100 more)"));
    }

    #[test]
    fn test_declared_symbols_are_listed() {
        let source = "function add(a, b) {\n  return a + b;\n}\nconst total = add(1, 2);\nconsole.log(total);\n";
        let tokens = lex(source, Language::JavaScript);
        let (nodes, _) = parser::analyze(&tokens, Language::JavaScript);
        let (_, symbols) = semantic::analyze(&tokens, &nodes, Language::JavaScript);
        let result = simulate(&tokens, &symbols, Language::JavaScript);
        assert!(result.success);
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines, ["total", "declared variables: total", "declared functions: add"]);
    }

    #[test]
    fn test_split_tokens() {
        let tokens = lex("a, f(b, c), [d, e]", Language::JavaScript);
        let refs: Vec<&Token> = tokens.iter().collect();
        let parts = split_tokens(&refs, &[","]);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 6);
    }
}
