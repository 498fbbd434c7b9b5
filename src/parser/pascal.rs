//! Pascal statements.
//!
//! A program is a header, declaration sections (`uses`, `var`, `const`,
//! `type`, routines) and a main `begin ... end.` block. Statements inside
//! a block are separated by `;`; a missing separator between two
//! statements is inferred with a warning.

use crate::ast::{NodeKind, ParseNode};
use crate::diagnostics::Position;
use crate::lexer::{Token, TokenCategory};

use super::expressions::{is_closer, span_text};
use super::{Parser, StatementResult, SyntaxError};

/// Words that end an expression inside a statement.
const STOPS: &[&str] = &[
    "then", "do", "to", "downto", "of", "else", "end", "until", "begin", "except", "finally",
];

/// Words that end a statement list.
const LIST_ENDS: &[&str] = &["end", "until", "except", "finally"];

const ROUTINE_WORDS: &[&str] = &["procedure", "function", "constructor", "destructor"];

const ROUTINE_DIRECTIVES: &[&str] = &[
    "forward", "overload", "virtual", "override", "abstract", "cdecl", "stdcall", "inline",
    "static", "reintroduce", "external",
];

impl<'a> Parser<'a> {
    pub(super) fn pascal_statement(&mut self) -> StatementResult {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        if token.is_punct(";") || token.is_punct(".") || is_closer(token) {
            self.advance();
            return Ok(None);
        }

        if token.category == TokenCategory::ReservedWord {
            let word = token.text.to_ascii_lowercase();
            match word.as_str() {
                "program" | "unit" | "library" => return self.pascal_header().map(Some),
                "uses" => return self.pascal_uses().map(Some),
                "interface" | "implementation" => {
                    self.advance();
                    return Ok(None);
                }
                "var" => return self.pascal_var_section().map(Some),
                "const" => return self.pascal_const_section().map(Some),
                "type" => return self.pascal_type_section().map(Some),
                "begin" => {
                    let block = self.pascal_compound()?;
                    self.match_punct(".");
                    return Ok(Some(block));
                }
                "if" => return self.pascal_if().map(Some),
                "while" | "with" => return self.pascal_while().map(Some),
                "for" => return self.pascal_for().map(Some),
                "repeat" => return self.pascal_repeat().map(Some),
                "case" => return self.pascal_case().map(Some),
                "try" => return self.pascal_try().map(Some),
                "exit" | "break" | "continue" | "goto" | "raise" | "inherited" => {
                    self.advance();
                    let mut node = ParseNode::leaf(NodeKind::Statement, word.clone(), token.position());
                    if let Some(args) = self.expression(STOPS) {
                        node.push(args);
                    }
                    return Ok(Some(node));
                }
                "end" => {
                    // Unpaired `end`; the BEGIN/END balance check reports it.
                    self.advance();
                    return Ok(None);
                }
                w if ROUTINE_WORDS.contains(&w) => return self.pascal_routine().map(Some),
                _ => {
                    self.error_here("statement");
                    return Err(());
                }
            }
        }
        self.pascal_assignment_or_call()
    }

    // ==================== Declarations ====================

    fn pascal_header(&mut self) -> Result<ParseNode, ()> {
        let Some(keyword) = self.advance() else {
            return Err(());
        };
        let name = self.expect_identifier("program name")?;
        if self.check_punct("(") {
            self.skip_balanced("(", ")");
        }
        self.expect_terminator(";", "program header");
        Ok(ParseNode::leaf(NodeKind::ProgramDeclaration, name.text.clone(), keyword.position()))
    }

    fn pascal_uses(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("uses", "`uses`")?;
        let mut node = ParseNode::new(NodeKind::UsesClause, keyword.position());
        let mut names = Vec::new();
        loop {
            let unit = self.expect_identifier("unit name")?;
            names.push(unit.text.clone());
            node.push(ParseNode::leaf(NodeKind::Identifier, unit.text.clone(), unit.position()));
            if !self.match_punct(",") {
                break;
            }
        }
        node.value = Some(names.join(", "));
        self.expect_terminator(";", "`uses` clause");
        Ok(node)
    }

    /// `var a, b: integer; s: string;`
    fn pascal_var_section(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("var", "`var`")?;
        let mut section = ParseNode::leaf(NodeKind::Block, "var", keyword.position());
        if !self.check_identifier() {
            self.error_here("variable name after `var`");
            return Err(());
        }
        while self.check_identifier() && !self.aborted {
            let first = self.peek();
            let mut names = Vec::new();
            loop {
                let name = self.expect_identifier("variable name")?;
                names.push(ParseNode::leaf(NodeKind::Identifier, name.text.clone(), name.position()));
                if !self.match_punct(",") {
                    break;
                }
            }
            self.expect_punct(":", "`:` after variable names")?;
            let data_type = self.pascal_type_text()?;
            let mut decl = ParseNode::leaf(NodeKind::VariableDeclaration, data_type, first.map_or(keyword.position(), Token::position));
            decl.children = names;
            if self.match_punct("=")
                && let Some(value) = self.expression(STOPS)
            {
                decl.push(value);
            }
            self.expect_terminator(";", "variable declaration");
            section.push(decl);
        }
        Ok(section)
    }

    /// `const Max = 10; Name: string = 'x';`
    fn pascal_const_section(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("const", "`const`")?;
        let mut section = ParseNode::leaf(NodeKind::Block, "const", keyword.position());
        if !self.check_identifier() {
            self.error_here("constant name after `const`");
            return Err(());
        }
        while self.check_identifier() && !self.aborted {
            let name = self.expect_identifier("constant name")?;
            let mut decl = ParseNode::leaf(NodeKind::ConstantDeclaration, name.text.clone(), name.position());
            if self.match_punct(":") {
                let data_type = self.pascal_type_text()?;
                decl.push(ParseNode::leaf(NodeKind::Identifier, data_type, name.position()));
            }
            self.expect_punct("=", "`=` after constant name")?;
            match self.expression(STOPS) {
                Some(value) => decl.push(value),
                None => {
                    self.error_here("constant value");
                    return Err(());
                }
            }
            self.expect_terminator(";", "constant declaration");
            section.push(decl);
        }
        Ok(section)
    }

    /// `type TPoint = record x, y: integer; end;`
    fn pascal_type_section(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("type", "`type`")?;
        let mut section = ParseNode::leaf(NodeKind::Block, "type", keyword.position());
        while self.check_identifier() && !self.aborted {
            let name = self.expect_identifier("type name")?;
            self.expect_punct("=", "`=` after type name")?;
            let mut decl = ParseNode::leaf(NodeKind::TypeDeclaration, name.text.clone(), name.position());

            let structured = self.check_word("record")
                || ((self.check_word("class") || self.check_word("object") || self.check_word("interface"))
                    && !self.peek_ahead(1).is_some_and(|t| t.is_punct(";") || t.is_word("of")));
            if structured {
                let start = self.current;
                self.skip_to_matching_end();
                if let Some(first) = self.tokens.get(start) {
                    decl.push(ParseNode::leaf(
                        NodeKind::Identifier,
                        first.text.to_ascii_lowercase(),
                        first.position(),
                    ));
                }
            } else {
                let data_type = self.pascal_type_text()?;
                decl.push(ParseNode::leaf(NodeKind::Identifier, data_type, name.position()));
            }
            self.expect_terminator(";", "type declaration");
            section.push(decl);
        }
        Ok(section)
    }

    /// Reads a type up to `;`, `=` or `)` at depth zero.
    fn pascal_type_text(&mut self) -> Result<String, ()> {
        let text = self.skip_clause(|t| t.is_punct("=") || t.is_keyword("begin"));
        if text.is_empty() {
            self.error_here("type name");
            return Err(());
        }
        Ok(text)
    }

    /// Consumes `record ... end` (or `class ... end`), nested ones included.
    fn skip_to_matching_end(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            if token.is_any_keyword(&["record", "class", "object", "interface", "begin", "try"])
                || (token.is_keyword("case") && depth == 0)
            {
                depth += 1;
            } else if token.is_keyword("end") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    fn pascal_routine(&mut self) -> Result<ParseNode, ()> {
        let Some(keyword) = self.advance() else {
            return Err(());
        };
        let first = self.expect_identifier("routine name")?;
        let mut name = first.text.clone();
        while self.check_punct(".") {
            self.advance();
            let part = self.expect_identifier("method name")?;
            name.push('.');
            name.push_str(&part.text);
        }
        let kind = if name.contains('.') {
            NodeKind::MethodDeclaration
        } else {
            NodeKind::FunctionDeclaration
        };
        let mut node = ParseNode::leaf(kind, name, keyword.position());
        if self.check_punct("(") {
            node.push(self.parameter_list()?);
        } else {
            node.push(ParseNode::new(NodeKind::Parameters, self.current_position()));
        }
        if self.match_punct(":") {
            let result = self.expect_name("result type")?;
            node.push(ParseNode::leaf(NodeKind::Identifier, result.text.clone(), result.position()));
        }
        self.expect_terminator(";", "routine header");

        while let Some(directive) = self.peek()
            && ROUTINE_DIRECTIVES.iter().any(|d| directive.is_word(d))
        {
            self.advance();
            self.match_punct(";");
            if directive.is_word("forward") || directive.is_word("external") {
                return Ok(node);
            }
        }

        if !self.enter_nested() {
            self.skip_to_matching_end();
            return Ok(node);
        }
        let mut body = ParseNode::new(NodeKind::Body, self.current_position());
        loop {
            let local = match self.peek() {
                Some(t) if t.is_any_keyword(&["var", "const", "type"]) => self.statement(),
                Some(t) if ROUTINE_WORDS.iter().any(|w| t.is_keyword(w)) => self.statement(),
                _ => break,
            };
            if let Some(local) = local {
                body.push(local);
            }
            if self.aborted {
                break;
            }
        }
        if self.check_keyword("begin") {
            match self.pascal_compound() {
                Ok(block) => body.push(block),
                Err(()) => {
                    self.leave_nested();
                    return Err(());
                }
            }
            self.match_punct(";");
        } else {
            self.error_here("`begin` to start the routine body");
            self.leave_nested();
            return Err(());
        }
        self.leave_nested();
        node.push(body);
        Ok(node)
    }

    // ==================== Statements ====================

    /// `begin statements end`
    fn pascal_compound(&mut self) -> Result<ParseNode, ()> {
        let begin = self.expect_word("begin", "`begin`")?;
        let mut block = ParseNode::new(NodeKind::Block, begin.position());
        if !self.enter_nested() {
            self.current -= 1;
            self.skip_to_matching_end();
            return Ok(block);
        }
        block.children = self.pascal_statement_list();
        self.leave_nested();
        self.match_word("end");
        Ok(block)
    }

    /// Statements up to a list-ending word, inferring missing `;`.
    fn pascal_statement_list(&mut self) -> Vec<ParseNode> {
        let mut statements = Vec::new();
        while let Some(token) = self.peek() {
            if self.aborted || LIST_ENDS.iter().any(|w| token.is_keyword(w)) {
                break;
            }
            if let Some(statement) = self.statement() {
                statements.push(statement);
                if let Some(next) = self.peek()
                    && !next.is_punct(";")
                    && !next.is_punct(".")
                    && !LIST_ENDS.iter().any(|w| next.is_keyword(w))
                    && !next.is_keyword("else")
                {
                    self.errors.push(SyntaxError::missing(
                        ";",
                        "statement",
                        self.previous().map_or(next.position(), Token::position),
                    ));
                }
            }
        }
        statements
    }

    /// A nested statement; an empty one is allowed before `else`/`;`.
    fn pascal_branch(&mut self, label: Option<&str>) -> ParseNode {
        let mut body = ParseNode::new(NodeKind::Body, self.current_position());
        body.value = label.map(str::to_string);
        let empty = self.peek().is_none_or(|t| {
            t.is_punct(";") || LIST_ENDS.iter().any(|w| t.is_keyword(w)) || t.is_keyword("else")
        });
        if !empty && let Some(statement) = self.nested_statement() {
            body.push(statement);
        }
        body
    }

    fn pascal_condition(&mut self, after: &str) -> Result<ParseNode, ()> {
        let position = self.current_position();
        match self.expression(STOPS) {
            Some(expr) => Ok(ParseNode::new(NodeKind::Condition, position).with_child(expr)),
            None => {
                self.error_here(&format!("condition after `{after}`"));
                Err(())
            }
        }
    }

    fn pascal_if(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("if", "`if`")?;
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, "if", keyword.position());
        node.push(self.pascal_condition("if")?);
        self.expect_word("then", "`then`")?;
        node.push(self.pascal_branch(None));
        if self.match_word("else") {
            node.push(self.pascal_branch(Some("else")));
        }
        Ok(node)
    }

    /// `while cond do stmt` and `with expr do stmt`.
    fn pascal_while(&mut self) -> Result<ParseNode, ()> {
        let Some(keyword) = self.advance() else {
            return Err(());
        };
        let word = keyword.text.to_ascii_lowercase();
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, word.as_str(), keyword.position());
        node.push(self.pascal_condition(&word)?);
        self.expect_word("do", "`do`")?;
        node.push(self.pascal_branch(None));
        Ok(node)
    }

    fn pascal_for(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("for", "`for`")?;
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, "for", keyword.position());
        let control = self.expect_identifier("loop variable")?;
        let mut condition = ParseNode::new(NodeKind::Condition, control.position());
        condition.push(ParseNode::leaf(NodeKind::Identifier, control.text.clone(), control.position()));

        if self.match_word("in") {
            if let Some(collection) = self.expression(STOPS) {
                condition.push(collection);
            }
        } else {
            self.expect_punct(":=", "`:=` after loop variable")?;
            let Some(from) = self.expression(STOPS) else {
                self.error_here("start value");
                return Err(());
            };
            condition.push(from);
            if !self.match_any_word(&["to", "downto"]) {
                self.error_here("`to` or `downto`");
                return Err(());
            }
            let Some(to) = self.expression(STOPS) else {
                self.error_here("end value");
                return Err(());
            };
            condition.push(to);
        }
        node.push(condition);
        self.expect_word("do", "`do`")?;
        node.push(self.pascal_branch(None));
        Ok(node)
    }

    fn pascal_repeat(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("repeat", "`repeat`")?;
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, "repeat", keyword.position());
        let mut body = ParseNode::new(NodeKind::Body, self.current_position());
        if self.enter_nested() {
            body.children = self.pascal_statement_list();
            self.leave_nested();
        }
        node.push(body);
        self.expect_word("until", "`until`")?;
        node.push(self.pascal_condition("until")?);
        Ok(node)
    }

    /// `case x of 1: a; 2, 3: b; else c; end`
    fn pascal_case(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("case", "`case`")?;
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, "case", keyword.position());
        node.push(self.pascal_condition("case")?);
        self.expect_word("of", "`of`")?;

        if !self.enter_nested() {
            self.current -= 1;
            self.skip_to_matching_end();
            return Ok(node);
        }
        while let Some(token) = self.peek() {
            if self.aborted || token.is_keyword("end") {
                break;
            }
            if token.is_punct(";") {
                self.advance();
                continue;
            }
            if self.match_any_word(&["else", "otherwise"]) {
                let mut fallback = ParseNode::leaf(NodeKind::Body, "else", token.position());
                fallback.children = self.pascal_statement_list();
                node.push(fallback);
                continue;
            }
            let Some(label) = self.expression_list(&["else", "end"]) else {
                self.error_here("case label");
                self.leave_nested();
                return Err(());
            };
            if self.expect_punct(":", "`:` after case label").is_err() {
                self.leave_nested();
                return Err(());
            }
            let mut branch = ParseNode::new(NodeKind::Body, Position::new(label.line, label.column, 0));
            branch.push(label);
            if let Some(statement) = self.statement() {
                branch.push(statement);
            }
            node.push(branch);
        }
        self.leave_nested();
        self.expect_word("end", "`end` to close `case`")?;
        Ok(node)
    }

    fn pascal_try(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("try", "`try`")?;
        let mut node = ParseNode::leaf(NodeKind::ControlStructure, "try", keyword.position());
        if !self.enter_nested() {
            self.current -= 1;
            self.skip_to_matching_end();
            return Ok(node);
        }
        let mut body = ParseNode::new(NodeKind::Body, self.current_position());
        body.children = self.pascal_statement_list();
        node.push(body);
        if let Some(handler) = self.peek().filter(|t| t.is_any_keyword(&["except", "finally"])) {
            self.advance();
            let mut section = ParseNode::leaf(NodeKind::Body, handler.text.to_ascii_lowercase(), handler.position());
            section.children = self.pascal_statement_list();
            node.push(section);
        }
        self.leave_nested();
        self.expect_word("end", "`end` to close `try`")?;
        Ok(node)
    }

    /// `x := expr`, `a[i].f := expr`, `writeln(x)` or a bare call.
    fn pascal_assignment_or_call(&mut self) -> StatementResult {
        let Some(first) = self.peek() else {
            return Ok(None);
        };
        if !first.is_identifier() {
            self.error_here("statement");
            return Err(());
        }

        let start = self.current;
        self.advance();
        loop {
            if self.check_punct(".") && self.peek_ahead(1).is_some_and(Token::is_identifier) {
                self.advance();
                self.advance();
            } else if self.check_punct("[") {
                self.skip_balanced("[", "]");
            } else if !self.match_punct("^") {
                break;
            }
        }
        let target = span_text(&self.tokens[start..self.current]);

        if let Some(op) = self.peek().filter(|t| t.is_punct(":=") || t.is_punct("+=") || t.is_punct("-=")) {
            self.advance();
            let mut node = ParseNode::leaf(NodeKind::Assignment, target, first.position());
            node.push(ParseNode::leaf(NodeKind::Operator, op.text.clone(), op.position()));
            match self.expression(STOPS) {
                Some(value) => node.push(value),
                None => {
                    self.error_here("value after `:=`");
                    return Err(());
                }
            }
            return Ok(Some(node));
        }
        if self.check_punct("=") {
            self.error_here("`:=` for assignment");
            return Err(());
        }

        let mut call = ParseNode::leaf(NodeKind::Call, target, first.position());
        if self.check_punct("(")
            && let Some(args) = self.parenthesized("routine name")?
        {
            call.push(args);
        }
        Ok(Some(ParseNode::new(NodeKind::Statement, first.position()).with_child(call)))
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
        let tokens = lex(source, Language::Pascal);
        analyze(&tokens, Language::Pascal)
    }

    const PROGRAM: &str = "program Demo;\nuses crt;\nconst Max = 10;\nvar i, total: integer;\n    name: string;\n\nfunction Double(x: integer): integer;\nbegin\n  Double := x * 2;\nend;\n\nbegin\n  total := 0;\n  for i := 1 to Max do\n    total := total + Double(i);\n  if total > 50 then\n    writeln('big')\n  else\n    writeln('small');\n  repeat\n    total := total - 1\n  until total < 0;\nend.\n";

    #[test]
    fn test_full_program() {
        let (nodes, diagnostics) = parse(PROGRAM);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let kinds: Vec<_> = nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            [
                NodeKind::ProgramDeclaration,
                NodeKind::UsesClause,
                NodeKind::Block,
                NodeKind::Block,
                NodeKind::FunctionDeclaration,
                NodeKind::Block,
            ]
        );
        let vars = nodes[3].find_all(NodeKind::VariableDeclaration);
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].children.len(), 2);
    }

    #[test]
    fn test_missing_then_is_error() {
        let (_, diagnostics) = parse("begin\n  if x > 1\n    y := 2;\nend.");
        assert!(diagnostics.iter().any(|d| d.is_error() && d.message.contains("`then`")));
    }

    #[test]
    fn test_missing_separator_is_warning() {
        let source = "program P;\nvar a, b: integer;\nbegin\n  a := 1\n  b := 2;\nend.\n";
        let (_, diagnostics) = parse(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].line, 4);
    }

    #[test]
    fn test_record_type_and_case() {
        let source = "type TPoint = record\n  x, y: integer;\nend;\nvar p: TPoint;\nbegin\n  case p.x of\n    1, 2: writeln('low');\n    3: writeln('three');\n  else\n    writeln('other');\n  end;\nend.\n";
        let (nodes, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(nodes[0].find_all(NodeKind::TypeDeclaration).len(), 1);
    }

    #[test]
    fn test_equals_instead_of_assign() {
        let (_, diagnostics) = parse("begin\n  x = 5;\nend.");
        assert!(diagnostics.iter().any(|d| d.message.contains("`:=`")));
    }
}
