//! HTML documents.
//!
//! Elements are matched by name. A closing tag that belongs to an outer
//! element implicitly closes everything opened inside it (each of those
//! gets a warning); a closing tag that matches nothing open is an error.
//! The contents of `<script>` and `<style>` are kept as raw text.

use crate::ast::{NodeKind, ParseNode};
use crate::lexer::{Token, TokenCategory, TokenKind};

use super::expressions::span_text;
use super::{Parser, StatementResult, SyntaxError};

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

fn is_name(token: &Token) -> bool {
    matches!(
        token.category,
        TokenCategory::Identifier | TokenCategory::ReservedWord
    )
}

impl<'a> Parser<'a> {
    pub(super) fn markup_node(&mut self) -> StatementResult {
        let Some(token) = self.peek() else {
            return Ok(None);
        };

        if token.is_punct("</") {
            let Some(name) = self.closing_tag_name() else {
                return Ok(Some(self.markup_text()));
            };
            // Closing tags that match an open element are consumed by it.
            self.errors.push(SyntaxError::StrayClosingTag {
                tag: name,
                position: token.position(),
            });
            self.skip_tag();
            return Ok(None);
        }

        if token.is_punct("<") {
            if self.peek_ahead(1).is_some_and(|t| t.is_punct("!")) {
                return Ok(Some(self.markup_doctype()));
            }
            if self.peek_ahead(1).is_some_and(is_name) {
                return self.markup_element().map(Some);
            }
        }
        Ok(Some(self.markup_text()))
    }

    /// `<!DOCTYPE html>` and other `<!...>` declarations.
    fn markup_doctype(&mut self) -> ParseNode {
        let position = self.current_position();
        self.advance();
        self.advance();
        let start = self.current;
        while let Some(token) = self.peek() {
            if token.is_punct(">") {
                break;
            }
            self.advance();
        }
        let text = span_text(&self.tokens[start..self.current]);
        self.match_punct(">");
        ParseNode::leaf(NodeKind::Doctype, text, position)
    }

    fn markup_element(&mut self) -> Result<ParseNode, ()> {
        let open = self.expect_punct("<", "`<`")?;
        let name = self.expect_name("tag name")?;
        let tag = name.text.to_ascii_lowercase();
        let mut element = ParseNode::leaf(NodeKind::Element, tag.as_str(), open.position());

        let self_closing = self.markup_attributes(&mut element)?;
        if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
            return Ok(element);
        }

        if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
            if let Some(text) = self.raw_text_until_close(&tag) {
                element.push(text);
            }
            return Ok(element);
        }

        if !self.enter_nested() {
            self.skip_element_content(&tag);
            return Ok(element);
        }
        self.open_elements.push(tag.clone());
        self.markup_children(&mut element, &tag, open);
        self.open_elements.pop();
        self.leave_nested();
        Ok(element)
    }

    /// Reads attributes up to `>` or `/>`. Returns true for `/>`.
    fn markup_attributes(&mut self, element: &mut ParseNode) -> Result<bool, ()> {
        loop {
            let Some(token) = self.peek() else {
                self.error_here("`>` to close the tag");
                return Err(());
            };
            if token.is_punct(">") {
                self.advance();
                return Ok(false);
            }
            if token.is_punct("/>") {
                self.advance();
                return Ok(true);
            }
            if token.is_punct("<") || token.is_punct("</") {
                self.error_here("`>` to close the tag");
                return Err(());
            }
            self.advance();
            if !is_name(token) {
                continue;
            }

            let mut attribute = ParseNode::leaf(
                NodeKind::Attribute,
                token.text.to_ascii_lowercase(),
                token.position(),
            );
            if self.match_punct("=") {
                match self.peek() {
                    Some(value) if !value.is_punct(">") && !value.is_punct("/>") => {
                        self.advance();
                        let text = if value.kind == TokenKind::StringLiteral {
                            unquote(&value.text)
                        } else {
                            value.text.clone()
                        };
                        attribute.push(ParseNode::leaf(NodeKind::Literal, text, value.position()));
                    }
                    _ => {
                        self.error_here("attribute value after `=`");
                    }
                }
            }
            element.push(attribute);
        }
    }

    /// Parses content until the element's closing tag.
    fn markup_children(&mut self, element: &mut ParseNode, tag: &str, open: &'a Token) {
        while let Some(token) = self.peek() {
            if self.aborted {
                return;
            }
            if token.is_punct("</")
                && let Some(name) = self.closing_tag_name()
            {
                if name == tag {
                    self.skip_tag();
                    return;
                }
                if self.open_elements.iter().rev().skip(1).any(|outer| *outer == name) {
                    // An ancestor closes; this element ends here.
                    self.errors.push(SyntaxError::UnclosedElement {
                        tag: tag.to_string(),
                        position: open.position(),
                    });
                    return;
                }
                self.errors.push(SyntaxError::StrayClosingTag {
                    tag: name,
                    position: token.position(),
                });
                self.skip_tag();
                continue;
            }
            if let Some(child) = self.statement() {
                element.push(child);
            }
        }
        self.errors.push(SyntaxError::UnclosedElement {
            tag: tag.to_string(),
            position: open.position(),
        });
    }

    /// Name in a `</name` at the cursor, lowercased.
    fn closing_tag_name(&self) -> Option<String> {
        self.peek_ahead(1)
            .filter(|t| is_name(t))
            .map(|t| t.text.to_ascii_lowercase())
    }

    /// Consumes one tag through its `>`.
    fn skip_tag(&mut self) {
        while let Some(token) = self.advance() {
            if token.is_punct(">") || token.is_punct("/>") {
                return;
            }
            if self.peek().is_some_and(|t| t.is_punct("<") || t.is_punct("</")) {
                return;
            }
        }
    }

    /// Consecutive tokens that are not tags.
    fn markup_text(&mut self) -> ParseNode {
        let position = self.current_position();
        let start = self.current;
        self.advance();
        while let Some(token) = self.peek() {
            let tag_start = (token.is_punct("<")
                && self
                    .peek_ahead(1)
                    .is_some_and(|t| is_name(t) || t.is_punct("!")))
                || token.is_punct("</");
            if tag_start {
                break;
            }
            self.advance();
        }
        ParseNode::leaf(NodeKind::Text, span_text(&self.tokens[start..self.current]), position)
    }

    /// Script or style content up to `</tag>`, which is consumed.
    fn raw_text_until_close(&mut self, tag: &str) -> Option<ParseNode> {
        let start = self.current;
        while let Some(token) = self.peek() {
            if token.is_punct("</") && self.closing_tag_name().as_deref() == Some(tag) {
                break;
            }
            self.advance();
        }
        let end = self.current;
        if self.is_at_end() {
            if let Some(open) = self.tokens.get(start.saturating_sub(1)) {
                self.errors.push(SyntaxError::UnclosedElement {
                    tag: tag.to_string(),
                    position: open.position(),
                });
            }
        } else {
            self.skip_tag();
        }
        let first = self.tokens.get(start).filter(|_| end > start)?;
        Some(ParseNode::leaf(
            NodeKind::Text,
            span_text(&self.tokens[start..end]),
            first.position(),
        ))
    }

    /// Skips nested content past the depth limit, up to the matching close.
    fn skip_element_content(&mut self, tag: &str) {
        let mut depth = 1usize;
        while let Some(token) = self.advance() {
            let name = self.peek().filter(|t| is_name(t));
            if token.is_punct("<") && name.is_some_and(|t| t.text.eq_ignore_ascii_case(tag)) {
                depth += 1;
            } else if token.is_punct("</") && name.is_some_and(|t| t.text.eq_ignore_ascii_case(tag)) {
                depth -= 1;
                if depth == 0 {
                    self.skip_tag();
                    return;
                }
            }
        }
    }
}

/// Strips the surrounding quotes of an attribute value.
fn unquote(text: &str) -> String {
    let trimmed = text
        .strip_prefix(['"', '\''])
        .unwrap_or(text);
    trimmed
        .strip_suffix(['"', '\''])
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::unquote;
    use crate::ast::{NodeKind, ParseNode};
    use crate::diagnostics::{Diagnostic, Severity};
    use crate::language::Language;
    use crate::lexer::lex;
    use crate::parser::analyze;

    fn parse(source: &str) -> (Vec<ParseNode>, Vec<Diagnostic>) {
        let tokens = lex(source, Language::Html);
        analyze(&tokens, Language::Html)
    }

    #[test]
    fn test_document_tree() {
        let source = "<!DOCTYPE html>\n<html>\n<head><title>Demo</title></head>\n<body>\n<p class=\"intro\">Hello <b>world</b></p>\n<img src=\"a.png\" alt=\"logo\">\n<br/>\n</body>\n</html>\n";
        let (nodes, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(nodes[0].kind, NodeKind::Doctype);
        assert_eq!(nodes[1].value(), Some("html"));

        let elements: Vec<_> = nodes[1]
            .find_all(NodeKind::Element)
            .iter()
            .filter_map(|e| e.value())
            .collect();
        assert_eq!(elements, ["html", "head", "title", "body", "p", "b", "img", "br"]);

        let attributes = nodes[1].find_all(NodeKind::Attribute);
        assert_eq!(attributes[0].value(), Some("class"));
        assert_eq!(attributes[0].children[0].value(), Some("intro"));
    }

    #[test]
    fn test_unclosed_element_is_warning() {
        let source = "<html>\n<body>\n<div>\n<p>text\n</div>\n</body>\n</html>\n";
        let (_, diagnostics) = parse(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].message.contains("<p>"));
        assert_eq!(diagnostics[0].line, 4);
    }

    #[test]
    fn test_stray_closing_tag_is_error() {
        let (_, diagnostics) = parse("<html><body></span></body></html>");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
        assert!(diagnostics[0].message.contains("</span>"));
    }

    #[test]
    fn test_script_content_is_raw() {
        let source = "<html><script>if (a < b) { x = \"</p>\"; }</script></html>";
        let (nodes, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let script = &nodes[0].find_all(NodeKind::Element)[1];
        assert_eq!(script.value(), Some("script"));
        assert_eq!(script.children[0].kind, NodeKind::Text);
    }

    #[test]
    fn test_missing_root_is_warning() {
        let (_, diagnostics) = parse("<div>\n  <p>one</p>\n  <p>two</p>\n</div>\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].message.contains("<html>"));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("plain"), "plain");
    }
}
