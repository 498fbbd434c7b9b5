//! Output primitives of the print-oriented languages.
//!
//! Arguments are echoed, not evaluated: a string or character literal is
//! printed without its quotes, a concatenation of literals is joined, and
//! anything else is printed as written.

use crate::diagnostics::AnalysisFault;
use crate::language::Language;
use crate::lexer::{Token, TokenKind};
use crate::parser::expressions::span_text;

use super::{Simulator, split_tokens};

const CONSOLE_METHODS: &[&str] = &["log", "info", "warn", "error", "debug"];

const DOCUMENT_METHODS: &[&str] = &["write", "writeln"];

/// Text of a string or character literal without prefixes, quotes or
/// escapes.
pub(super) fn literal_text(token: &Token, language: Language) -> Option<String> {
    if !matches!(
        token.kind,
        TokenKind::StringLiteral | TokenKind::CharLiteral | TokenKind::TemplateLiteral
    ) {
        return None;
    }
    let text = token.text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let body = ["\"\"\"", "'''", "\"", "'", "`"].iter().find_map(|quote| {
        text.strip_prefix(quote)
            .map(|rest| rest.strip_suffix(quote).unwrap_or(rest))
    })?;
    Some(match language {
        Language::Pascal | Language::TSql | Language::PlSql => body.replace("''", "'"),
        _ => unescape(body),
    })
}

fn unescape(body: &str) -> String {
    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('r' | '0') => {}
            Some(other) => text.push(other),
            None => text.push('\\'),
        }
    }
    text
}

/// Renders one argument expression.
pub(super) fn render(tokens: &[&Token], language: Language) -> String {
    if let [token] = tokens {
        return literal_text(token, language).unwrap_or_else(|| token.text.clone());
    }
    let concat = if language == Language::PlSql { "||" } else { "+" };
    let parts = split_tokens(tokens, &[concat]);
    let joins_literals = parts.len() > 1
        && parts
            .iter()
            .any(|p| matches!(p.as_slice(), [t] if literal_text(t, language).is_some()));
    if joins_literals {
        return parts.iter().map(|p| render(p, language)).collect();
    }
    span_text(tokens)
}

/// Expands `printf` conversions with the rendered arguments. Conversions
/// without an argument are kept as written.
fn format_printf(format: &str, args: &[String]) -> String {
    let mut text = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            text.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            text.push('%');
            continue;
        }
        let mut conversion = String::from('%');
        while let Some(&next) = chars.peek() {
            conversion.push(next);
            chars.next();
            if next.is_ascii_alphabetic() && !matches!(next, 'l' | 'h' | 'z') {
                break;
            }
        }
        match args.next() {
            Some(arg) => text.push_str(arg),
            None => text.push_str(&conversion),
        }
    }
    text
}

impl<'a> Simulator<'a> {
    pub(super) fn after_dot(&self, index: usize) -> bool {
        index
            .checked_sub(1)
            .and_then(|p| self.tok(p))
            .is_some_and(|p| p.is_punct("."))
    }

    pub(super) fn is_punct_at(&self, index: usize, text: &str) -> bool {
        self.tok(index).is_some_and(|t| t.is_punct(text))
    }

    fn render_all(&self, args: &[Vec<&'a Token>]) -> Vec<String> {
        args.iter().map(|a| render(a, self.language)).collect()
    }

    // ==================== JavaScript ====================

    /// Callee text and `(` index of an output call starting at `index`.
    fn script_call_at(&self, index: usize) -> Option<(String, usize)> {
        let token = self.tok(index)?;
        if !token.is_identifier() || self.after_dot(index) {
            return None;
        }
        match token.text.as_str() {
            "console" | "document" => {
                let method = self.tok(index + 2)?;
                let methods = if token.text == "console" {
                    CONSOLE_METHODS
                } else {
                    DOCUMENT_METHODS
                };
                let call = self.is_punct_at(index + 1, ".")
                    && methods.contains(&method.text.as_str())
                    && self.is_punct_at(index + 3, "(");
                call.then(|| (format!("{}.{}", token.text, method.text), index + 3))
            }
            "alert" if self.is_punct_at(index + 1, "(") => Some(("alert".to_string(), index + 1)),
            _ => None,
        }
    }

    pub(super) fn script_output(&mut self) -> Result<(), AnalysisFault> {
        let mut i = 0;
        while i < self.tokens.len() {
            let Some((callee, open)) = self.script_call_at(i) else {
                i += 1;
                continue;
            };
            let (args, close) = self.call_arguments(&callee, open)?;
            let text = self.render_all(&args).join(" ");
            self.emit(text);
            i = close + 1;
        }
        Ok(())
    }

    // ==================== Python ====================

    pub(super) fn python_output(&mut self) -> Result<(), AnalysisFault> {
        let mut i = 0;
        while i < self.tokens.len() {
            let call = self.tok(i).is_some_and(|t| t.is_word("print"))
                && self.is_punct_at(i + 1, "(")
                && !self.after_dot(i)
                && !i
                    .checked_sub(1)
                    .and_then(|p| self.tok(p))
                    .is_some_and(|p| p.is_keyword("def"));
            if !call {
                i += 1;
                continue;
            }
            let (args, close) = self.call_arguments("print", i + 1)?;

            let mut separator = " ".to_string();
            let mut end = "\n".to_string();
            let mut values = Vec::new();
            for arg in &args {
                match arg.as_slice() {
                    [name, eq, rest @ ..] if name.is_identifier() && eq.is_punct("=") => {
                        let value = render(rest, self.language);
                        match name.text.as_str() {
                            "sep" => separator = value,
                            "end" => end = value,
                            _ => {}
                        }
                    }
                    _ => values.push(render(arg, self.language)),
                }
            }
            let text = values.join(&separator);
            self.write(&text);
            self.write(&end);
            i = close + 1;
        }
        Ok(())
    }

    // ==================== C++ ====================

    pub(super) fn cpp_output(&mut self) -> Result<(), AnalysisFault> {
        let mut i = 0;
        while i < self.tokens.len() {
            let Some(token) = self.tok(i) else {
                break;
            };
            if !token.is_identifier() || self.after_dot(i) {
                i += 1;
                continue;
            }
            match token.text.as_str() {
                "cout" | "cerr" | "clog" if self.is_punct_at(i + 1, "<<") => {
                    let end = self.statement_end(i);
                    let chain = self.tokens.get(i + 1..end).unwrap_or_default();
                    let pieces = split_tokens(chain, &["<<"]);
                    for piece in pieces.iter().filter(|p| !p.is_empty()) {
                        if piece.last().is_some_and(|t| t.text == "endl") {
                            self.end_line();
                        } else {
                            let text = render(piece, self.language);
                            self.write(&text);
                        }
                    }
                    i = end + 1;
                }
                "printf" if self.is_punct_at(i + 1, "(") => {
                    let (args, close) = self.call_arguments("printf", i + 1)?;
                    let rendered = self.render_all(&args);
                    if let Some((format, rest)) = rendered.split_first() {
                        let text = format_printf(format, rest);
                        self.write(&text);
                    }
                    i = close + 1;
                }
                "puts" if self.is_punct_at(i + 1, "(") => {
                    let (args, close) = self.call_arguments("puts", i + 1)?;
                    let text = self.render_all(&args).join("");
                    self.write(&text);
                    self.end_line();
                    i = close + 1;
                }
                _ => i += 1,
            }
        }
        Ok(())
    }

    // ==================== Pascal ====================

    pub(super) fn pascal_output(&mut self) -> Result<(), AnalysisFault> {
        let mut i = 0;
        while i < self.tokens.len() {
            let Some(token) = self.tok(i) else {
                break;
            };
            let line_break = token.is_word("writeln");
            if !(line_break || token.is_word("write")) || self.after_dot(i) {
                i += 1;
                continue;
            }
            if self.is_punct_at(i + 1, "(") {
                let (args, close) = self.call_arguments(&token.text, i + 1)?;
                // `value:width:decimals` prints the value only.
                let text: String = args
                    .iter()
                    .map(|arg| {
                        let value = split_tokens(arg, &[":"]).into_iter().next().unwrap_or_default();
                        render(&value, self.language)
                    })
                    .collect();
                self.write(&text);
                i = close + 1;
            } else {
                i += 1;
            }
            if line_break {
                self.end_line();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::trace::tests::trace;

    #[test]
    fn test_literal_text() {
        let tokens = lex("f\"a\\tb\" \"\"\"doc\"\"\" x", Language::Python);
        assert_eq!(literal_text(&tokens[0], Language::Python).as_deref(), Some("a\tb"));
        assert_eq!(literal_text(&tokens[1], Language::Python).as_deref(), Some("doc"));
        assert_eq!(literal_text(&tokens[2], Language::Python), None);

        let tokens = lex("'it''s'", Language::Pascal);
        assert_eq!(literal_text(&tokens[0], Language::Pascal).as_deref(), Some("it's"));
    }

    #[test]
    fn test_printf_format() {
        let args = ["3".to_string(), "apples".to_string()];
        assert_eq!(format_printf("%d %s, 100%%", &args), "3 apples, 100%");
        assert_eq!(format_printf("%5.2f and %d", &args[..1]), "3 and %d");
    }

    #[test]
    fn test_javascript_primitives() {
        let source = "console.log(\"a\", 1 + 2);\nalert('done');\ndocument.write(\"x\" + \"y\");\n";
        let result = trace(source, Language::JavaScript);
        assert_eq!(result.output, "a 1 + 2\ndone\nxy");
    }

    #[test]
    fn test_python_print_arguments() {
        let source = "print(\"x\", 5, sep=\"-\")\nprint(\"a\", end=\"\")\nprint(\"b\")\n";
        let result = trace(source, Language::Python);
        assert_eq!(result.output, "x-5\nab");
    }

    #[test]
    fn test_cout_chain_and_printf() {
        let source = "int main() {\n    std::cout << \"Hello\" << \", \" << name << std::endl;\n    printf(\"%d items\\n\", 3);\n    puts(\"bye\");\n}\n";
        let result = trace(source, Language::Cpp);
        assert!(result.success, "{result:?}");
        assert_eq!(result.output, "Hello, name\n3 items\nbye");
    }

    #[test]
    fn test_pascal_write_and_writeln() {
        let source = "begin\n  write('a');\n  writeln('b', 1:3);\n  writeln;\n  writeln('it''s');\nend.\n";
        let result = trace(source, Language::Pascal);
        assert_eq!(result.output, "ab1\n\nit's");
    }
}
