//! Brace-delimited languages: blocks and control flow shared by JavaScript
//! and C++, the JavaScript statement routine, and the generic routine used
//! when the language is unknown.

use crate::ast::{NodeKind, ParseNode};
use crate::language::Language;
use crate::lexer::{Token, TokenCategory, TokenKind};

use super::expressions::{is_assignment_operator, is_closer, span_text};
use super::{Parser, StatementResult};

/// Keywords that start control statements in C-like languages.
pub(super) const CONTROL_KEYWORDS: &[&str] = &[
    "if", "while", "for", "do", "switch", "try", "return", "throw", "break", "continue", "case",
    "default",
];

/// Member modifiers allowed before a JavaScript class member.
const JS_MEMBER_MODIFIERS: &[&str] = &["static", "async", "get", "set"];

impl<'a> Parser<'a> {
    // ==================== Blocks ====================

    /// Parses `{ statements }`.
    pub(super) fn brace_block(&mut self) -> Result<ParseNode, ()> {
        let open = self.expect_punct("{", "`{`")?;
        let mut block = ParseNode::new(NodeKind::Block, open.position());

        if !self.enter_nested() {
            // Skip the rest of this group, the opening brace already taken.
            self.current -= 1;
            self.skip_balanced("{", "}");
            return Ok(block);
        }
        block.children = self.statements_until(|t| t.is_punct("}"));
        self.leave_nested();
        self.match_punct("}");
        Ok(block)
    }

    /// Ends a statement: `;` is required in C++ (a warning when missing)
    /// and optional elsewhere.
    pub(super) fn end_statement(&mut self, after: &str) {
        if self.language == Language::Cpp {
            if !self.check_punct("}") {
                self.expect_terminator(";", after);
            }
        } else {
            self.match_punct(";");
        }
    }

    /// Wraps the next statement as a body node.
    fn body(&mut self, label: Option<&str>) -> ParseNode {
        let position = self.current_position();
        let mut body = ParseNode::new(NodeKind::Body, position);
        if let Some(label) = label {
            body.value = Some(label.to_string());
        }
        if let Some(statement) = self.nested_statement() {
            body.push(statement);
        }
        body
    }

    fn condition(&mut self, after: &str) -> Result<ParseNode, ()> {
        let position = self.current_position();
        let mut condition = ParseNode::new(NodeKind::Condition, position);
        if let Some(expr) = self.parenthesized(after)? {
            condition.push(expr);
        }
        Ok(condition)
    }

    // ==================== Control Flow ====================

    /// Parses `if`, loops, `switch`, `try`, jumps and `case` labels.
    pub(super) fn c_control(&mut self) -> StatementResult {
        let Some(keyword) = self.advance() else {
            return Ok(None);
        };
        let word = keyword.text.as_str();
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, word, keyword.position());

        match word {
            "if" => {
                node.push(self.condition("`if`")?);
                node.push(self.body(None));
                if self.match_word("else") {
                    node.push(self.body(Some("else")));
                }
            }
            "while" => {
                node.push(self.condition("`while`")?);
                node.push(self.body(None));
            }
            "for" => {
                self.match_word("await");
                node.push(self.condition("`for`")?);
                node.push(self.body(None));
            }
            "do" => {
                node.push(self.body(None));
                self.expect_word("while", "`while` after `do` body")?;
                node.push(self.condition("`while`")?);
                self.end_statement("`do ... while`");
            }
            "switch" => {
                node.push(self.condition("`switch`")?);
                node.push(self.brace_block()?);
            }
            "try" => {
                node.push(self.brace_block()?);
                while self.check_word("catch") {
                    let catch = self.advance().map(Token::position).unwrap_or(keyword.position());
                    let mut handler = ParseNode::leaf(NodeKind::Body, "catch", catch);
                    if self.check_punct("(") {
                        handler.push(self.condition("`catch`")?);
                    }
                    handler.push(self.brace_block()?);
                    node.push(handler);
                }
                if self.match_word("finally") {
                    let mut finally = ParseNode::leaf(NodeKind::Body, "finally", self.current_position());
                    finally.push(self.brace_block()?);
                    node.push(finally);
                }
            }
            "return" | "throw" => {
                let mut node = ParseNode::leaf(NodeKind::Return, word, keyword.position());
                if !self.check_punct(";") && !self.check_punct("}") && !self.at_line_start()
                    && let Some(value) = self.expression(&[])
                {
                    node.push(value);
                }
                self.end_statement(&format!("`{word}`"));
                return Ok(Some(node));
            }
            "break" | "continue" => {
                self.end_statement(&format!("`{word}`"));
                return Ok(Some(ParseNode::leaf(NodeKind::Statement, word, keyword.position())));
            }
            "case" | "default" => {
                if word == "case" {
                    let Some(label) = self.expression(&[]) else {
                        self.error_here("`case` label");
                        return Err(());
                    };
                    node.push(label);
                }
                self.expect_punct(":", &format!("`:` after `{word}` label"))?;
                return Ok(None);
            }
            _ => {
                self.error_here("statement");
                return Err(());
            }
        }
        Ok(Some(node))
    }

    // ==================== Expression Statements ====================

    /// Parses an assignment or a bare expression.
    pub(super) fn expression_statement(&mut self) -> StatementResult {
        if let (Some(target), Some(op)) = (self.peek(), self.peek_ahead(1))
            && target.is_identifier()
            && is_assignment_operator(op)
        {
            self.advance();
            self.advance();
            let mut node = ParseNode::leaf(NodeKind::Assignment, target.text.clone(), target.position());
            node.push(ParseNode::leaf(NodeKind::Operator, op.text.clone(), op.position()));
            match self.expression(&[]) {
                Some(value) => node.push(value),
                None => {
                    self.error_here(&format!("value after `{}`", op.text));
                    return Err(());
                }
            }
            self.end_statement("assignment");
            return Ok(Some(node));
        }

        let position = self.current_position();
        let Some(expr) = self.expression(&[]) else {
            self.error_here("statement");
            return Err(());
        };
        self.end_statement("expression");
        Ok(Some(ParseNode::new(NodeKind::Statement, position).with_child(expr)))
    }

    // ==================== JavaScript ====================

    pub(super) fn script_statement(&mut self) -> StatementResult {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        if token.is_punct(";") || is_closer(token) {
            // Stray closers are reported once by the balance check.
            self.advance();
            return Ok(None);
        }
        if token.is_punct("{") {
            return self.brace_block().map(Some);
        }

        if token.category == TokenCategory::ReservedWord {
            match token.text.as_str() {
                "function" => return self.js_function().map(Some),
                "async" if self.peek_ahead(1).is_some_and(|t| t.is_keyword("function")) => {
                    self.advance();
                    return self.js_function().map(Some);
                }
                "var" | "let" | "const" => return self.js_variables().map(Some),
                "class" => return self.js_class().map(Some),
                "import" => return self.js_import().map(Some),
                "export" => {
                    self.advance();
                    self.match_word("default");
                    return self.script_statement();
                }
                word if CONTROL_KEYWORDS.contains(&word) => return self.c_control(),
                _ => {}
            }
        }
        self.expression_statement()
    }

    fn js_function(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("function", "`function`")?;
        self.match_punct("*");
        let mut node = ParseNode::new(NodeKind::FunctionDeclaration, keyword.position());
        if self.check_identifier() {
            node.value = self.advance().map(|t| t.text.clone());
        } else if !self.check_punct("(") {
            self.error_here("function name");
            return Err(());
        }
        node.push(self.parameter_list()?);
        node.push(self.brace_block()?);
        Ok(node)
    }

    fn js_variables(&mut self) -> Result<ParseNode, ()> {
        let Some(keyword) = self.advance() else {
            return Err(());
        };
        let mut node = ParseNode::leaf(NodeKind::VariableDeclaration, keyword.text.clone(), keyword.position());

        loop {
            match self.peek() {
                Some(name) if name.is_identifier() => {
                    self.advance();
                    node.push(ParseNode::leaf(NodeKind::Identifier, name.text.clone(), name.position()));
                }
                Some(pattern) if pattern.is_punct("{") || pattern.is_punct("[") => {
                    // Destructuring: every identifier in the pattern is bound.
                    let close = if pattern.is_punct("{") { "}" } else { "]" };
                    let start = self.current;
                    self.skip_balanced(&pattern.text, close);
                    for token in &self.tokens[start..self.current] {
                        if token.is_identifier() {
                            node.push(ParseNode::leaf(NodeKind::Identifier, token.text.clone(), token.position()));
                        }
                    }
                }
                _ => {
                    self.error_here("variable name");
                    return Err(());
                }
            }
            if self.match_punct("=") {
                match self.expression(&[]) {
                    Some(value) => node.push(value),
                    None => {
                        self.error_here("initial value");
                        return Err(());
                    }
                }
            }
            if !self.match_punct(",") {
                break;
            }
        }
        // `for (let x of xs)` headers are read as groups, so `of`/`in` never
        // reach here; only the terminator remains.
        self.end_statement("declaration");
        Ok(node)
    }

    fn js_class(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("class", "`class`")?;
        let name = self.expect_identifier("class name")?;
        let mut node = ParseNode::leaf(NodeKind::ClassDeclaration, name.text.clone(), keyword.position());

        if self.match_word("extends") {
            let start = self.current;
            while !self.is_at_end() && !self.check_punct("{") {
                self.advance();
            }
            if let Some(first) = self.tokens.get(start) {
                let base = span_text(&self.tokens[start..self.current]);
                node.push(ParseNode::leaf(NodeKind::Identifier, base, first.position()));
            }
        }

        let open = self.expect_punct("{", "`{` to start the class body")?;
        let mut body = ParseNode::new(NodeKind::Block, open.position());
        if !self.enter_nested() {
            self.current -= 1;
            self.skip_balanced("{", "}");
            node.push(body);
            return Ok(node);
        }
        while let Some(token) = self.peek() {
            if token.is_punct("}") || self.aborted {
                break;
            }
            match self.js_member() {
                Ok(Some(member)) => body.push(member),
                Ok(None) => {}
                Err(()) => self.synchronize(),
            }
        }
        self.leave_nested();
        self.match_punct("}");
        node.push(body);
        Ok(node)
    }

    fn js_member(&mut self) -> StatementResult {
        if self.match_punct(";") {
            return Ok(None);
        }
        while self
            .peek_ahead(1)
            .is_some_and(|next| next.is_identifier() || next.category == TokenCategory::ReservedWord)
            && self.match_any_word(JS_MEMBER_MODIFIERS)
        {}
        self.match_punct("*");
        if self.peek().is_some_and(|t| t.text == "#") {
            self.advance();
        }

        let Some(name) = self.peek() else {
            return Ok(None);
        };
        if !matches!(name.category, TokenCategory::Identifier | TokenCategory::ReservedWord) {
            self.error_here("class member");
            return Err(());
        }
        self.advance();

        if self.check_punct("(") {
            let mut method = ParseNode::leaf(NodeKind::MethodDeclaration, name.text.clone(), name.position());
            method.push(self.parameter_list()?);
            method.push(self.brace_block()?);
            return Ok(Some(method));
        }

        let mut field = ParseNode::leaf(NodeKind::VariableDeclaration, "field", name.position());
        field.push(ParseNode::leaf(NodeKind::Identifier, name.text.clone(), name.position()));
        if self.match_punct("=")
            && let Some(value) = self.expression(&[])
        {
            field.push(value);
        }
        self.match_punct(";");
        Ok(Some(field))
    }

    fn js_import(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("import", "`import`")?;
        let start = self.current;
        while let Some(token) = self.peek() {
            if token.is_punct(";") {
                break;
            }
            if self.at_line_start()
                && (token.category == TokenCategory::ReservedWord
                    || self.previous().is_some_and(|p| p.kind == TokenKind::StringLiteral))
            {
                break;
            }
            if token.is_punct("{") {
                self.skip_balanced("{", "}");
                continue;
            }
            self.advance();
        }
        let clause = &self.tokens[start..self.current];
        let module = clause
            .iter()
            .rev()
            .find(|t| t.kind == TokenKind::StringLiteral)
            .map(|t| t.text.trim_matches(|c| c == '"' || c == '\'').to_string())
            .unwrap_or_else(|| span_text(clause));
        self.match_punct(";");
        Ok(ParseNode::leaf(NodeKind::Import, module, keyword.position()))
    }

    // ==================== Unknown Language ====================

    /// Blocks and expression statements only; no keyword carries meaning
    /// when the language is unknown.
    pub(super) fn generic_statement(&mut self) -> StatementResult {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        if token.is_punct(";") || token.is_punct(",") || token.is_punct(":") || is_closer(token) {
            self.advance();
            return Ok(None);
        }
        if token.is_punct("{") {
            return self.brace_block().map(Some);
        }
        self.expression_statement()
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::NodeKind;
    use crate::language::Language;
    use crate::lexer::lex;
    use crate::parser::analyze;

    fn kinds(source: &str) -> Vec<NodeKind> {
        let tokens = lex(source, Language::JavaScript);
        let (nodes, diagnostics) = analyze(&tokens, Language::JavaScript);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        nodes.iter().map(|n| n.kind).collect()
    }

    #[test]
    fn test_function_and_call() {
        let source = "function greet(name) {\n  return 'Hi ' + name;\n}\ngreet('Ann');";
        assert_eq!(
            kinds(source),
            [NodeKind::FunctionDeclaration, NodeKind::Statement]
        );
    }

    #[test]
    fn test_asi_without_semicolons() {
        let source = "let a = 1\nlet b = a + 2\nconsole.log(b)";
        assert_eq!(
            kinds(source),
            [
                NodeKind::VariableDeclaration,
                NodeKind::VariableDeclaration,
                NodeKind::Statement
            ]
        );
    }

    #[test]
    fn test_control_flow() {
        let source = "for (let i = 0; i < 3; i++) { if (i == 1) { continue; } else { x = i; } }\n\
                      while (x > 0) x--;\ndo { x++ } while (x < 5);\n\
                      switch (x) { case 1: break; default: x = 0; }\n\
                      try { f(); } catch (e) { g(e); } finally { h(); }";
        let found = kinds(source);
        assert_eq!(found.len(), 5);
        assert!(found.iter().all(|k| *k == NodeKind::ControlStructure));
    }

    #[test]
    fn test_class_members() {
        let source = "class Dog extends Animal {\n  constructor(name) { this.name = name; }\n  static create() { return new Dog('x'); }\n  legs = 4;\n}";
        let tokens = lex(source, Language::JavaScript);
        let (nodes, diagnostics) = analyze(&tokens, Language::JavaScript);
        assert!(diagnostics.is_empty());
        assert_eq!(nodes[0].find_all(NodeKind::MethodDeclaration).len(), 2);
    }

    #[test]
    fn test_import_module_name() {
        let tokens = lex("import { a, b } from './lib';", Language::JavaScript);
        let (nodes, _) = analyze(&tokens, Language::JavaScript);
        assert_eq!(nodes[0].kind, NodeKind::Import);
        assert_eq!(nodes[0].value(), Some("./lib"));
    }

    #[test]
    fn test_if_without_paren_is_error() {
        let tokens = lex("if x > 1 { y = 2; }", Language::JavaScript);
        let (_, diagnostics) = analyze(&tokens, Language::JavaScript);
        assert!(diagnostics[0].message.contains("`(` after `if`"));
    }
}
