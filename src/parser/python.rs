//! Python statements.
//!
//! Blocks are found by indentation: after a header's `:`, the body is
//! every following statement that starts on a new line at a column right
//! of the header keyword. A body on the same line as its header holds the
//! remaining statements of that line.

use crate::ast::{NodeKind, ParseNode};
use crate::lexer::{Token, TokenCategory};

use super::expressions::{is_closer, span_text};
use super::{Parser, StatementResult, SyntaxError};

/// Headers whose condition runs up to the `:`.
const CONDITIONAL_HEADERS: &[&str] = &["if", "elif", "while", "for", "with", "except"];

/// Headers with no condition.
const BARE_HEADERS: &[&str] = &["else", "try", "finally"];

const SIMPLE_STATEMENTS: &[&str] = &[
    "pass", "break", "continue", "raise", "del", "assert", "global", "nonlocal", "yield",
    "await",
];

impl<'a> Parser<'a> {
    pub(super) fn python_statement(&mut self) -> StatementResult {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        if self.depth == 0 && token.column > 1 && self.at_line_start() {
            self.errors.push(SyntaxError::UnexpectedIndent {
                position: token.position(),
            });
        }
        if token.is_punct(";") || is_closer(token) {
            self.advance();
            return Ok(None);
        }
        if token.is_punct("@") {
            self.advance();
            let mut node = ParseNode::leaf(NodeKind::Statement, "decorator", token.position());
            if let Some(target) = self.expression(&[]) {
                node.push(target);
            }
            return Ok(Some(node));
        }

        if token.category == TokenCategory::ReservedWord {
            let word = token.text.as_str();
            match word {
                "def" => return self.python_def(token).map(Some),
                "async" => {
                    self.advance();
                    return if self.check_keyword("def") {
                        self.python_def(token).map(Some)
                    } else {
                        self.python_statement()
                    };
                }
                "class" => return self.python_class().map(Some),
                "return" => {
                    self.advance();
                    let mut node = ParseNode::leaf(NodeKind::Return, word, token.position());
                    if !self.at_line_start()
                        && let Some(value) = self.expression(&[])
                    {
                        node.push(value);
                    }
                    self.match_punct(";");
                    return Ok(Some(node));
                }
                "import" | "from" => return self.python_import().map(Some),
                _ if CONDITIONAL_HEADERS.contains(&word) || BARE_HEADERS.contains(&word) => {
                    return self.python_compound().map(Some);
                }
                _ if SIMPLE_STATEMENTS.contains(&word) => {
                    self.advance();
                    let mut node = ParseNode::leaf(NodeKind::Statement, word, token.position());
                    if !self.at_line_start()
                        && let Some(value) = self.expression_list(&[])
                    {
                        node.push(value);
                    }
                    self.match_punct(";");
                    return Ok(Some(node));
                }
                _ => {}
            }
        }

        if token.is_punct(":") || token.is_punct(",") {
            self.error_here("statement");
            return Err(());
        }
        self.python_simple()
    }

    /// An expression statement or an assignment, tuple targets included.
    fn python_simple(&mut self) -> StatementResult {
        let Some(first) = self.peek() else {
            return Ok(None);
        };
        let start = self.current;
        let Some(expr) = self.expression_list(&[]) else {
            self.error_here("statement");
            return Err(());
        };
        self.match_punct(";");

        let tokens = &self.tokens[start..self.current];
        let assignment = tokens
            .iter()
            .position(|t| t.category == TokenCategory::Operator && super::expressions::is_assignment_operator(t));
        let node = match assignment {
            Some(i) if i > 0 && first.is_identifier() => {
                let target = span_text(&tokens[..i]);
                ParseNode::leaf(NodeKind::Assignment, target, first.position()).with_child(expr)
            }
            _ => ParseNode::new(NodeKind::Statement, first.position()).with_child(expr),
        };
        Ok(Some(node))
    }

    fn python_def(&mut self, header: &'a Token) -> Result<ParseNode, ()> {
        self.expect_word("def", "`def`")?;
        let name = self.expect_identifier("function name")?;
        let kind = if self.in_class {
            NodeKind::MethodDeclaration
        } else {
            NodeKind::FunctionDeclaration
        };
        let mut node = ParseNode::leaf(kind, name.text.clone(), header.position());
        node.push(self.parameter_list()?);
        if self.match_punct("->") {
            self.expression(&[]);
        }
        self.expect_terminator(":", "function header");

        // Methods of a class body are plain functions inside them.
        let outer = std::mem::replace(&mut self.in_class, false);
        let body = self.python_suite(header, "function header");
        self.in_class = outer;
        node.push(body);
        Ok(node)
    }

    fn python_class(&mut self) -> Result<ParseNode, ()> {
        let header = self.expect_word("class", "`class`")?;
        let name = self.expect_identifier("class name")?;
        let mut node = ParseNode::leaf(NodeKind::ClassDeclaration, name.text.clone(), header.position());
        if self.check_punct("(")
            && let Some(bases) = self.parenthesized("class name")?
        {
            node.push(bases);
        }
        self.expect_terminator(":", "class header");

        let outer = std::mem::replace(&mut self.in_class, true);
        let body = self.python_suite(header, "class header");
        self.in_class = outer;
        node.push(body);
        Ok(node)
    }

    fn python_compound(&mut self) -> Result<ParseNode, ()> {
        let Some(header) = self.advance() else {
            return Err(());
        };
        let word = header.text.as_str();
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, word, header.position());

        if CONDITIONAL_HEADERS.contains(&word) && !self.check_punct(":") {
            let position = self.current_position();
            let Some(condition) = self.expression_list(&[]) else {
                self.error_here(&format!("condition after `{word}`"));
                return Err(());
            };
            node.push(ParseNode::new(NodeKind::Condition, position).with_child(condition));
        }
        self.expect_terminator(":", &format!("`{word}` header"));
        node.push(self.python_suite(header, &format!("`{word}`")));
        Ok(node)
    }

    /// Parses the body of a block whose header keyword is `header`.
    fn python_suite(&mut self, header: &'a Token, after: &str) -> ParseNode {
        let mut body = ParseNode::new(NodeKind::Body, self.current_position());
        let Some(next) = self.peek() else {
            self.errors.push(SyntaxError::MissingIndentedBlock {
                after: after.to_string(),
                position: header.position(),
            });
            return body;
        };

        if !self.at_line_start() {
            // `if x: return 1` keeps its body on the header line.
            let line = self.previous().map_or(next.line, |t| t.line);
            if !self.enter_nested() {
                while self.peek().is_some_and(|t| t.line == line) {
                    self.advance();
                }
                return body;
            }
            while self.peek().is_some_and(|t| t.line == line) && !self.aborted {
                if let Some(statement) = self.statement() {
                    body.push(statement);
                }
            }
            self.leave_nested();
            return body;
        }

        if next.column <= header.column {
            self.errors.push(SyntaxError::MissingIndentedBlock {
                after: after.to_string(),
                position: next.position(),
            });
            return body;
        }

        if !self.enter_nested() {
            while self.peek().is_some_and(|t| t.column > header.column || !self.at_line_start()) {
                self.advance();
            }
            return body;
        }
        while let Some(token) = self.peek() {
            if self.aborted || (self.at_line_start() && token.column <= header.column) {
                break;
            }
            if let Some(statement) = self.statement() {
                body.push(statement);
            }
        }
        self.leave_nested();
        body
    }

    fn python_import(&mut self) -> Result<ParseNode, ()> {
        let Some(keyword) = self.advance() else {
            return Err(());
        };
        let start = self.current;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && (self.at_line_start() || token.is_punct(";")) {
                break;
            }
            if token.is_punct("(") {
                depth += 1;
            } else if token.is_punct(")") {
                depth = depth.saturating_sub(1);
            }
            self.advance();
        }
        let consumed = self.current > start;
        let Some(module) = self.tokens.get(start).copied().filter(|_| consumed) else {
            self.error_here("module name");
            return Err(());
        };
        self.match_punct(";");
        Ok(ParseNode::leaf(NodeKind::Import, module.text.clone(), keyword.position())
            .with_child(ParseNode::leaf(
                NodeKind::Expression,
                span_text(&self.tokens[start..self.current]),
                module.position(),
            )))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{NodeKind, ParseNode};
    use crate::diagnostics::{Diagnostic, Severity};
    use crate::language::Language;
    use crate::lexer::lex;
    use crate::parser::analyze;

    fn parse(source: &str) -> (Vec<ParseNode>, Vec<Diagnostic>) {
        let tokens = lex(source, Language::Python);
        analyze(&tokens, Language::Python)
    }

    #[test]
    fn test_function_body_by_indentation() {
        let source = "def add(a, b):\n    total = a + b\n    return total\n\nprint(add(1, 2))\n";
        let (nodes, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(nodes.len(), 2);
        let body = nodes[0].child(NodeKind::Body).unwrap();
        assert_eq!(body.children.len(), 2);
        assert_eq!(body.children[1].kind, NodeKind::Return);
    }

    #[test]
    fn test_class_methods() {
        let source = "class Greeter:\n    def __init__(self, name):\n        self.name = name\n\n    def greet(self):\n        print('hi', self.name)\n";
        let (nodes, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(nodes[0].find_all(NodeKind::MethodDeclaration).len(), 2);
    }

    #[test]
    fn test_inline_suite_and_elif() {
        let source = "x = 3\nif x > 2: y = 1\nelif x > 1:\n    y = 2\nelse:\n    y = 3\nfor i in range(3):\n    pass\n";
        let (nodes, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(nodes.len(), 5);
    }

    #[test]
    fn test_missing_colon_is_warning() {
        let source = "def f(x)\n    return x * 2\n\nvalue = f(2)\n";
        let (_, diagnostics) = parse(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].message.contains("missing `:`"));
    }

    #[test]
    fn test_missing_block_is_error() {
        let (_, diagnostics) = parse("while True:\nprint('x')\n");
        assert!(diagnostics.iter().any(|d| d.is_error() && d.message.contains("indented block")));
    }

    #[test]
    fn test_unexpected_indent_warning() {
        let source = "a = 1\n    b = 2\nc = a + b\nprint(c)\n";
        let (_, diagnostics) = parse(source);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("unexpected indentation"));
        assert_eq!(diagnostics[0].line, 2);
    }

    #[test]
    fn test_imports() {
        let (nodes, _) = parse("import os, sys\nfrom math import (sqrt,\n    pi)\n");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].value(), Some("math"));
    }
}
