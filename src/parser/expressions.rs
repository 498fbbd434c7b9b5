//! Shallow expression reading.
//!
//! Expressions are not parsed into precedence trees. The reader consumes
//! tokens up to the end of the expression, tracking bracket depth so that
//! nested groups are taken whole, and records a flat list of terms:
//! identifiers (with member chains such as `console.log` folded in),
//! calls, literals and operators.
//!
//! An expression ends at bracket depth zero on:
//! - `;`, `,` (unless reading a list) or any closing bracket
//! - `:` that does not close a `? :` conditional
//! - one of the caller's stop words
//! - a line break, where the language ends statements at line ends
//! - a statement keyword, in SQL

use crate::ast::{NodeKind, ParseNode};
use crate::language::Language;
use crate::lexer::{Token, TokenCategory};

use super::Parser;

/// Reserved words that denote literal values.
const LITERAL_WORDS: &[&str] = &[
    "true", "false", "null", "nullptr", "undefined", "none", "nil", "NaN",
];

pub(crate) fn is_opener(token: &Token) -> bool {
    token.category == TokenCategory::Delimiter && matches!(token.text.as_str(), "(" | "[" | "{")
}

pub(crate) fn is_closer(token: &Token) -> bool {
    token.category == TokenCategory::Delimiter && matches!(token.text.as_str(), ")" | "]" | "}")
}

pub(super) fn is_assignment_operator(token: &Token) -> bool {
    token.category == TokenCategory::Operator
        && matches!(
            token.text.as_str(),
            "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "**=" | "//=" | "&=" | "|=" | "^=" | "<<="
                | ">>=" | "&&=" | "||=" | "??=" | ":="
        )
}

/// Operators and member access carry an expression across a line break.
fn continues_expression(token: &Token) -> bool {
    (token.category == TokenCategory::Operator && !matches!(token.text.as_str(), "++" | "--"))
        || token.is_punct(".")
        || token.is_punct(",")
}

/// Source-like text for a token run: tokens that touched in the source
/// stay joined, others are separated by one space.
pub(crate) fn span_text(tokens: &[&Token]) -> String {
    let mut text = String::new();
    let mut previous_end = None;
    for token in tokens {
        if let Some(end) = previous_end
            && token.offset > end
        {
            text.push(' ');
        }
        text.push_str(&token.text);
        previous_end = Some(token.end_offset());
    }
    text
}

/// Builds an expression node from its tokens.
pub(super) fn expression_node(tokens: &[&Token]) -> Option<ParseNode> {
    let first = tokens.first()?;
    let mut node = ParseNode::leaf(NodeKind::Expression, span_text(tokens), first.position());

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        if token.is_identifier() {
            let mut name = token.text.clone();
            let mut j = i + 1;
            while j + 1 < tokens.len()
                && (tokens[j].is_punct(".") || tokens[j].is_punct("->") || tokens[j].is_punct("::"))
                && matches!(
                    tokens[j + 1].category,
                    TokenCategory::Identifier | TokenCategory::ReservedWord
                )
            {
                name.push_str(&tokens[j].text);
                name.push_str(&tokens[j + 1].text);
                j += 2;
            }
            let kind = if tokens.get(j).is_some_and(|t| t.is_punct("(")) {
                NodeKind::Call
            } else {
                NodeKind::Identifier
            };
            node.push(ParseNode::leaf(kind, name, token.position()));
            i = j;
            continue;
        }

        if token.is_literal()
            || (token.category == TokenCategory::ReservedWord
                && LITERAL_WORDS.iter().any(|w| token.text.eq_ignore_ascii_case(w)))
        {
            node.push(ParseNode::leaf(NodeKind::Literal, token.text.clone(), token.position()));
        } else if token.category == TokenCategory::Operator {
            node.push(ParseNode::leaf(NodeKind::Operator, token.text.clone(), token.position()));
        }
        i += 1;
    }
    Some(node)
}

impl<'a> Parser<'a> {
    // ==================== Expressions ====================

    /// Reads one expression, or returns `None` if the current token cannot
    /// start one. Consumes nothing in that case.
    pub(super) fn expression(&mut self, stop_words: &[&str]) -> Option<ParseNode> {
        self.read_expression(stop_words, false)
    }

    /// Reads a comma-separated list of expressions as one node.
    pub(super) fn expression_list(&mut self, stop_words: &[&str]) -> Option<ParseNode> {
        self.read_expression(stop_words, true)
    }

    fn read_expression(&mut self, stop_words: &[&str], list: bool) -> Option<ParseNode> {
        let start = self.current;
        let mut depth = 0usize;
        let mut pending_conditionals = 0usize;

        while let Some(token) = self.peek() {
            if depth == 0 {
                if self.current > start && self.ends_at_line_break(token) {
                    break;
                }
                if is_closer(token) || token.is_punct(";") || (!list && token.is_punct(",")) {
                    break;
                }
                if token.is_punct("?") {
                    pending_conditionals += 1;
                } else if token.is_punct(":") {
                    if pending_conditionals == 0 {
                        break;
                    }
                    pending_conditionals -= 1;
                }
                if stop_words.iter().any(|w| token.is_word(w)) {
                    break;
                }
                if self.language.is_sql()
                    && self.current > start
                    && token.category == TokenCategory::ReservedWord
                    && self.profile.is_statement_keyword(&token.text)
                {
                    break;
                }
            }

            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth -= 1;
            }
            self.advance();
        }

        expression_node(&self.tokens[start..self.current])
    }

    /// Whether a line break before `next` ends the expression.
    fn ends_at_line_break(&self, next: &Token) -> bool {
        let Some(previous) = self.previous() else {
            return false;
        };
        if next.line == previous.line {
            return false;
        }
        match self.language {
            Language::Python => true,
            Language::JavaScript | Language::Unknown => {
                !(continues_expression(previous) || continues_expression(next))
            }
            Language::Pascal => {
                (next.category == TokenCategory::ReservedWord
                    && self.profile.is_statement_keyword(&next.text))
                    || (next.is_identifier()
                        && self.peek_ahead(1).is_some_and(|t| t.is_punct(":=")))
            }
            _ => {
                next.category == TokenCategory::ReservedWord
                    && self.profile.is_statement_keyword(&next.text)
            }
        }
    }

    // ==================== Groups ====================

    /// Reads a parenthesized group after `after`, returning its contents as
    /// an expression (`None` when empty).
    ///
    /// A missing `)` is left for the delimiter balance check.
    pub(super) fn parenthesized(&mut self, after: &str) -> Result<Option<ParseNode>, ()> {
        self.expect_punct("(", &format!("`(` after {after}"))?;
        let start = self.current;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            self.advance();
        }
        let inner = expression_node(&self.tokens[start..self.current]);
        self.match_punct(")");
        Ok(inner)
    }

    /// Consumes a balanced `open ... close` group, starting at `open`.
    ///
    /// Only `open` and `close` are counted; other brackets inside are
    /// taken as they come.
    pub(super) fn skip_balanced(&mut self, open: &str, close: &str) {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Consumes tokens up to (not including) a `;` at bracket depth zero,
    /// a closing bracket, or a token matching `stop`. Returns their text.
    pub(super) fn skip_clause<F>(&mut self, stop: F) -> String
    where
        F: Fn(&Token) -> bool,
    {
        let start = self.current;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && (token.is_punct(";") || is_closer(token) || stop(token)) {
                break;
            }
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth -= 1;
            }
            self.advance();
        }
        span_text(&self.tokens[start..self.current])
    }

    // ==================== Parameters ====================

    /// Parses a parenthesized parameter list.
    ///
    /// Parameters are split at top-level commas (and `;` in Pascal). The
    /// name is chosen per language: the first identifier for dynamic
    /// languages and SQL, the last identifier before a default value for
    /// C++, every identifier before the `:` for Pascal.
    pub(super) fn parameter_list(&mut self) -> Result<ParseNode, ()> {
        let open = self.expect_punct("(", "`(` to start the parameter list")?;
        let mut params = ParseNode::new(NodeKind::Parameters, open.position());

        let mut segment: Vec<&'a Token> = Vec::new();
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && is_closer(token) {
                break;
            }
            let separator = token.is_punct(";")
                || (token.is_punct(",") && self.language != Language::Pascal);
            if depth == 0 && separator {
                self.push_parameters(&mut params, &segment);
                segment.clear();
                self.advance();
                continue;
            }
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth -= 1;
            }
            segment.push(token);
            self.advance();
        }
        self.push_parameters(&mut params, &segment);
        self.match_punct(")");
        Ok(params)
    }

    fn push_parameters(&self, params: &mut ParseNode, segment: &[&'a Token]) {
        if segment.is_empty() {
            return;
        }
        let is_name = |t: &&&Token| t.is_identifier();
        match self.language {
            Language::Pascal => {
                let colon = segment.iter().position(|t| t.is_punct(":"));
                let (names, data_type) = match colon {
                    Some(i) => (&segment[..i], Some(&segment[i + 1..])),
                    None => (segment, None),
                };
                for name in names.iter().filter(is_name) {
                    let mut param = ParseNode::leaf(NodeKind::Parameter, name.text.clone(), name.position());
                    if let Some(data_type) = data_type
                        && let Some(first) = data_type.first()
                    {
                        param.push(ParseNode::leaf(
                            NodeKind::Identifier,
                            span_text(data_type),
                            first.position(),
                        ));
                    }
                    params.push(param);
                }
            }
            Language::Cpp => {
                let end = segment
                    .iter()
                    .position(|t| t.is_punct("=") || t.is_punct("["))
                    .unwrap_or(segment.len());
                let declarator = &segment[..end];
                if declarator.len() < 2 {
                    // A bare type such as `void` or `int` names nothing.
                    return;
                }
                if let Some(index) = declarator.iter().rposition(|t| t.is_identifier())
                    && index > 0
                {
                    let name = declarator[index];
                    let mut param = ParseNode::leaf(NodeKind::Parameter, name.text.clone(), name.position());
                    param.push(ParseNode::leaf(
                        NodeKind::Identifier,
                        span_text(&declarator[..index]),
                        declarator[0].position(),
                    ));
                    params.push(param);
                }
            }
            _ => {
                if let Some(name) = segment.iter().find(is_name) {
                    params.push(ParseNode::leaf(NodeKind::Parameter, name.text.clone(), name.position()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn test_member_chain_becomes_call() {
        let tokens = lex("console.log(\"hi\", x + 1)", Language::JavaScript);
        let mut parser = Parser::new(&tokens, Language::JavaScript);
        let expr = parser.expression(&[]).unwrap();
        assert_eq!(expr.value(), Some("console.log(\"hi\", x + 1)"));
        assert_eq!(expr.children[0].kind, NodeKind::Call);
        assert_eq!(expr.children[0].value(), Some("console.log"));
        assert!(parser.is_at_end());
    }

    #[test]
    fn test_stops_at_stop_word() {
        let tokens = lex("x > 1 then y", Language::Pascal);
        let mut parser = Parser::new(&tokens, Language::Pascal);
        let expr = parser.expression(&["then"]).unwrap();
        assert_eq!(expr.value(), Some("x > 1"));
        assert!(parser.check_keyword("then"));
    }

    #[test]
    fn test_conditional_colon_is_consumed() {
        let tokens = lex("a ? b : c; d", Language::JavaScript);
        let mut parser = Parser::new(&tokens, Language::JavaScript);
        let expr = parser.expression(&[]).unwrap();
        assert_eq!(expr.value(), Some("a ? b : c"));
        assert!(parser.check_punct(";"));
    }

    #[test]
    fn test_python_stops_at_line_break() {
        let tokens = lex("x + 1\ny = (2,\n 3)", Language::Python);
        let mut parser = Parser::new(&tokens, Language::Python);
        assert_eq!(parser.expression(&[]).unwrap().value(), Some("x + 1"));
        parser.advance();
        parser.advance();
        assert_eq!(parser.expression(&[]).unwrap().value(), Some("(2, 3)"));
    }

    #[test]
    fn test_list_keeps_commas() {
        let tokens = lex("a, b FROM t", Language::TSql);
        let mut parser = Parser::new(&tokens, Language::TSql);
        let expr = parser.expression_list(&["from"]).unwrap();
        assert_eq!(expr.value(), Some("a, b"));
    }

    #[test]
    fn test_cpp_parameters() {
        let tokens = lex("(const std::string& name, int count = 3, void)", Language::Cpp);
        let mut parser = Parser::new(&tokens, Language::Cpp);
        let params = parser.parameter_list().unwrap();
        let names: Vec<_> = params.children.iter().filter_map(|p| p.value()).collect();
        assert_eq!(names, ["name", "count"]);
    }

    #[test]
    fn test_pascal_parameters() {
        let tokens = lex("(a, b: integer; var s: string)", Language::Pascal);
        let mut parser = Parser::new(&tokens, Language::Pascal);
        let params = parser.parameter_list().unwrap();
        let names: Vec<_> = params.children.iter().filter_map(|p| p.value()).collect();
        assert_eq!(names, ["a", "b", "s"]);
    }
}
