//! Lexical analysis.
//!
//! This module converts source text into a stream of [`Token`]s for any
//! supported [`Language`]. It handles:
//!
//! - Language-specific comment markers (`//`, `#`, `--`, `{ }`, `(* *)`, `<!-- -->`)
//! - String and character literals with escapes, triple quotes and prefixes
//! - Hex, binary, octal, decimal and scientific number literals
//! - Multi-character operators from the language's operator table
//! - C++ preprocessor lines as single directive tokens
//! - A stricter word check when the language is unknown
//!
//! ## Example
//!
//! ```
//! use polyglot_analyzer::language::Language;
//! use polyglot_analyzer::lexer::{Lexer, TokenCategory};
//!
//! let mut lexer = Lexer::new("let x = 42;", Language::JavaScript);
//!
//! let first = lexer.next_token().unwrap();
//! assert_eq!(first.category, TokenCategory::ReservedWord);
//! assert_eq!(first.text, "let");
//! ```
//!
//! ## Design Notes
//!
//! The scanner tries rules in a fixed priority order at every position:
//! comment, string, number, operator, delimiter, identifier/keyword,
//! directive, and finally the fallback for unclaimed characters. Problems
//! never stop the scan: they are recorded as [`LexicalError`]s and the
//! cursor moves on. An iteration ceiling of `source length × factor`
//! guarantees termination even if a rule fails to advance.

mod error;
mod token;
mod words;

pub use error::LexicalError;
pub use token::{NumberShape, Token, TokenCategory, TokenKind};
pub use words::looks_like_word;

use crate::diagnostics::{Diagnostic, Position};
use crate::language::{CommentStyle, Language, LanguageProfile};

/// Default multiplier for the iteration ceiling.
pub const DEFAULT_ITERATION_FACTOR: usize = 3;

/// Language-parameterized scanner.
///
/// Tokens are pulled with [`Lexer::next_token`] (or by iterating);
/// problems accumulate and are returned by [`Lexer::finish`].
pub struct Lexer<'source> {
    source: &'source str,
    language: Language,
    profile: &'static dyn LanguageProfile,
    /// Byte position of the cursor
    pos: usize,
    line: u32,
    column: u32,
    /// Only whitespace seen since the last newline
    at_line_start: bool,
    /// Inside `<...>` (markup only)
    in_tag: bool,
    iterations: usize,
    ceiling: usize,
    aborted: bool,
    errors: Vec<LexicalError>,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source and language.
    pub fn new(source: &'source str, language: Language) -> Self {
        Self {
            source,
            language,
            profile: language.profile(),
            pos: 0,
            line: 1,
            column: 1,
            at_line_start: true,
            in_tag: false,
            iterations: 0,
            ceiling: source.len().saturating_mul(DEFAULT_ITERATION_FACTOR).max(1),
            aborted: false,
            errors: Vec::new(),
        }
    }

    /// Overrides the iteration ceiling multiplier.
    pub fn with_iteration_factor(mut self, factor: usize) -> Self {
        self.ceiling = self.source.len().saturating_mul(factor);
        self
    }

    /// Scans the whole input.
    pub fn analyze(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        log::trace!(
            "lexed {} tokens ({} problems) as {}",
            tokens.len(),
            self.errors.len(),
            self.language
        );
        (tokens, self.finish())
    }

    /// Consumes the lexer and returns the problems found so far.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.errors
            .into_iter()
            .map(LexicalError::into_diagnostic)
            .collect()
    }

    /// Get the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            if self.aborted || self.pos >= self.source.len() {
                return None;
            }

            self.iterations += 1;
            if self.iterations > self.ceiling {
                self.aborted = true;
                log::warn!("lexer hit its iteration ceiling at byte {}", self.pos);
                self.errors.push(LexicalError::Aborted {
                    position: self.here(),
                    iterations: self.ceiling,
                });
                return None;
            }

            let before = self.pos;
            let token = self.scan();
            if self.pos == before {
                // A rule that does not move the cursor would loop forever.
                self.bump();
            }
            if token.is_some() {
                self.at_line_start = false;
                return token;
            }
        }
    }

    // ==================== Cursor ====================

    fn rest(&self) -> &'source str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn here(&self) -> Position {
        Position::new(
            self.line,
            self.column,
            u32::try_from(self.pos).unwrap_or(u32::MAX),
        )
    }

    /// Advances one character, keeping line and column current.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
            self.at_line_start = true;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_bytes(&mut self, len: usize) {
        let target = (self.pos + len).min(self.source.len());
        while self.pos < target {
            if self.bump().is_none() {
                break;
            }
        }
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn token_from(&self, kind: TokenKind, start: Position) -> Token {
        let text = &self.source[start.offset as usize..self.pos];
        Token::new(kind, text, start)
    }

    // ==================== Rules ====================

    /// Applies the first matching rule. Returns `None` for skipped input.
    fn scan(&mut self) -> Option<Token> {
        let c = self.peek()?;

        if c.is_whitespace() {
            self.skip_whitespace();
            return None;
        }
        if c.is_control() {
            self.bump();
            return None;
        }

        if let Some(token) = self.scan_comment() {
            return Some(token);
        }
        if let Some(token) = self.scan_string(None) {
            return Some(token);
        }
        if c.is_ascii_digit() {
            return Some(self.scan_number());
        }
        if let Some(token) = self.scan_operator() {
            return Some(token);
        }
        if self.profile.delimiters().contains(c) {
            let start = self.here();
            self.bump();
            return Some(self.token_from(TokenKind::Delimiter, start));
        }
        if self.is_identifier_start(c) {
            return self.scan_word();
        }
        if c == '#' && self.language == Language::Cpp && self.at_line_start {
            return Some(self.scan_directive());
        }

        self.scan_unclaimed(c)
    }

    fn skip_whitespace(&mut self) {
        let mut indenting = self.at_line_start && self.column == 1;
        let mut indent_start = self.here();
        let mut tabs = false;
        let mut spaces = false;
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
            match c {
                '\n' => {
                    indenting = true;
                    indent_start = self.here();
                    tabs = false;
                    spaces = false;
                }
                '\t' => tabs = true,
                ' ' => spaces = true,
                _ => {}
            }
        }
        if self.language == Language::Python
            && indenting
            && tabs
            && spaces
            && self.peek().is_some()
        {
            self.errors.push(LexicalError::MixedIndentation {
                position: indent_start,
            });
        }
    }

    fn scan_comment(&mut self) -> Option<Token> {
        let rest = self.rest();
        let style = self
            .profile
            .comment_styles()
            .iter()
            .find(|style| match style {
                CommentStyle::Line(marker) => rest.starts_with(marker),
                CommentStyle::Block { open, .. } => rest.starts_with(open),
            })
            .copied()?;

        let start = self.here();
        match style {
            CommentStyle::Line(_) => {
                self.bump_while(|c| c != '\n');
                Some(self.token_from(TokenKind::LineComment, start))
            }
            CommentStyle::Block { open, close } => {
                self.bump_bytes(open.len());
                match self.rest().find(close) {
                    Some(idx) => self.bump_bytes(idx + close.len()),
                    None => {
                        self.bump_bytes(self.rest().len());
                        self.errors
                            .push(LexicalError::UnterminatedComment { position: start });
                    }
                }
                Some(self.token_from(TokenKind::BlockComment, start))
            }
        }
    }

    /// Scans a string or character literal at the cursor.
    ///
    /// `prefix_start` is set when an identifier prefix (`f`, `r`, `N`, ...)
    /// has already been consumed and belongs to the literal.
    fn scan_string(&mut self, prefix_start: Option<Position>) -> Option<Token> {
        let rules = self.profile.string_rules();
        let quote = self.peek()?;
        let is_char = rules.char_quote == Some(quote);
        if !is_char && !rules.quotes.contains(&quote) {
            return None;
        }
        if self.language == Language::Html && !self.in_tag {
            return None;
        }

        let start = prefix_start.unwrap_or_else(|| self.here());
        let triple = rules.triple_quotes
            && self.peek_nth(1) == Some(quote)
            && self.peek_nth(2) == Some(quote);
        let multiline = triple || rules.multiline_quotes.contains(&quote);

        self.bump_bytes(if triple { 3 } else { 1 });

        let mut closed = false;
        while let Some(c) = self.peek() {
            if triple {
                if c == quote && self.peek_nth(1) == Some(quote) && self.peek_nth(2) == Some(quote)
                {
                    self.bump_bytes(3);
                    closed = true;
                    break;
                }
            } else if c == quote {
                if rules.doubled_quote_escape && self.peek_nth(1) == Some(quote) {
                    self.bump_bytes(2);
                    continue;
                }
                self.bump();
                closed = true;
                break;
            }

            if c == '\\' && rules.backslash_escapes {
                self.bump();
                self.bump();
                continue;
            }
            if c == '\n' && !multiline {
                break;
            }
            self.bump();
        }

        let kind = if is_char {
            TokenKind::CharLiteral
        } else if quote == '`' {
            TokenKind::TemplateLiteral
        } else {
            TokenKind::StringLiteral
        };
        let token = self.token_from(kind, start);

        if !closed {
            let text = token.text.clone();
            self.errors.push(if is_char {
                LexicalError::UnterminatedChar {
                    position: start,
                    text,
                }
            } else {
                LexicalError::UnterminatedString {
                    position: start,
                    text,
                }
            });
        }
        Some(token)
    }

    fn scan_number(&mut self) -> Token {
        let start = self.here();
        let (shape, len) = NumberShape::recognize(self.rest())
            .unwrap_or((NumberShape::Decimal, 1));
        self.bump_bytes(len);

        let suffixes: &str = match self.language {
            Language::Cpp => "uUlLfF",
            Language::Python => "jJ",
            _ => "",
        };
        if shape != NumberShape::Hex {
            self.bump_while(|c| suffixes.contains(c));
        }

        let mut malformed = false;
        if self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.bump_while(|c| c.is_ascii_alphanumeric() || c == '_');
            malformed = true;
        }
        if shape == NumberShape::Float
            && self.peek() == Some('.')
            && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.bump_while(|c| c.is_ascii_digit() || c == '.');
            malformed = true;
        }

        let token = self.token_from(shape.token_kind(), start);
        if malformed {
            self.errors.push(LexicalError::MalformedNumber {
                position: start,
                text: token.text.clone(),
            });
        }
        token
    }

    fn scan_operator(&mut self) -> Option<Token> {
        let rest = self.rest();
        let start = self.here();

        if let Some(op) = self
            .profile
            .operators()
            .iter()
            .find(|op| rest.starts_with(*op))
        {
            self.bump_bytes(op.len());
            self.track_tag(op);
            return Some(self.token_from(TokenKind::Operator, start));
        }

        let c = self.peek()?;
        if self.profile.single_operators().contains(c) {
            self.bump();
            self.track_tag(&self.source[start.offset as usize..self.pos]);
            return Some(self.token_from(TokenKind::Operator, start));
        }
        None
    }

    /// Markup only: quotes start strings inside tags, not in text.
    fn track_tag(&mut self, op: &str) {
        if self.language != Language::Html {
            return;
        }
        match op {
            "<" | "</" => self.in_tag = true,
            ">" | "/>" => self.in_tag = false,
            _ => {}
        }
    }

    fn is_identifier_start(&self, c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_' || self.profile.identifier_chars().start.contains(c)
    }

    fn is_identifier_continue(&self, c: char) -> bool {
        c.is_ascii_alphanumeric()
            || c == '_'
            || self.profile.identifier_chars().continuing.contains(c)
            || self.profile.identifier_chars().start.contains(c)
    }

    fn scan_word(&mut self) -> Option<Token> {
        let start = self.here();
        while let Some(c) = self.peek() {
            if !self.is_identifier_continue(c) {
                break;
            }
            self.bump();
        }
        let word = &self.source[start.offset as usize..self.pos];

        let rules = self.profile.string_rules();
        if rules.prefixes.iter().any(|p| p.eq_ignore_ascii_case(word))
            && let Some(token) = self.scan_string(Some(start))
        {
            return Some(token);
        }

        if self.profile.is_keyword(word) {
            return Some(Token::new(TokenKind::Keyword, word, start));
        }

        if self.language == Language::Unknown && !looks_like_word(word) {
            self.errors.push(LexicalError::NoiseWord {
                position: start,
                word: word.to_string(),
            });
            return None;
        }

        Some(Token::new(TokenKind::Identifier, word, start))
    }

    fn scan_directive(&mut self) -> Token {
        let start = self.here();
        loop {
            self.bump_while(|c| c != '\n' && c != '\\');
            match self.peek() {
                // Backslash-newline continues the directive.
                Some('\\') => {
                    self.bump();
                    if self.peek() == Some('\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
        let text = self.source[start.offset as usize..self.pos].trim_end();
        Token::new(TokenKind::Directive, text, start)
    }

    fn scan_unclaimed(&mut self, c: char) -> Option<Token> {
        let start = self.here();
        self.bump();
        if c.is_ascii_graphic() {
            return Some(self.token_from(TokenKind::Symbol, start));
        }
        self.errors.push(LexicalError::UnrecognizedCharacter {
            position: start,
            character: c,
        });
        None
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Scans `source` and returns its tokens and lexical diagnostics.
pub fn analyze(source: &str, language: Language) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source, language).analyze()
}

/// Convenience function to tokenize source, dropping diagnostics.
pub fn lex(source: &str, language: Language) -> Vec<Token> {
    Lexer::new(source, language).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    fn kinds(source: &str, language: Language) -> Vec<TokenKind> {
        lex(source, language).into_iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str, language: Language) -> Vec<String> {
        lex(source, language).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_console_log() {
        let (tokens, errors) = analyze("console.log(\"hi\")", Language::JavaScript);
        assert!(errors.is_empty());
        assert_eq!(
            tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["console", ".", "log", "(", "\"hi\"", ")"]
        );
        assert_eq!(tokens[0].category, TokenCategory::Identifier);
        assert_eq!(tokens[1].category, TokenCategory::Delimiter);
        assert_eq!(tokens[4].category, TokenCategory::String);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = analyze("\"unterminated", Language::JavaScript);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unterminated"));
        assert_eq!(errors[0].severity, Severity::Error);
    }

    #[test]
    fn test_unterminated_string_stops_at_newline() {
        let (tokens, errors) = analyze("x = 'abc\ny = 1", Language::Python);
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens[2].text, "'abc");
        assert_eq!(tokens[3].text, "y");
        assert_eq!(tokens[3].line, 2);
    }

    #[test]
    fn test_positions() {
        let tokens = lex("int x;\n  x = 5;", Language::Cpp);
        let x2 = &tokens[3];
        assert_eq!(x2.text, "x");
        assert_eq!((x2.line, x2.column, x2.offset), (2, 3, 9));
        assert!(tokens.windows(2).all(|w| w[0].offset <= w[1].offset));
    }

    #[test]
    fn test_multiline_lexemes_advance_lines() {
        let tokens = lex("/* a\nb */ x", Language::Cpp);
        assert_eq!(tokens[0].kind, TokenKind::BlockComment);
        assert_eq!((tokens[1].line, tokens[1].column), (2, 6));

        let tokens = lex("s = \"\"\"one\ntwo\"\"\"\nz", Language::Python);
        assert_eq!(tokens[2].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[3].line, 3);
    }

    #[test]
    fn test_comment_styles_per_language() {
        assert_eq!(kinds("# note", Language::Python), vec![TokenKind::LineComment]);
        assert_eq!(kinds("-- note", Language::TSql), vec![TokenKind::LineComment]);
        assert_eq!(
            kinds("{ note } (* more *)", Language::Pascal),
            vec![TokenKind::BlockComment, TokenKind::BlockComment]
        );
        assert_eq!(kinds("<!-- x -->", Language::Html), vec![TokenKind::BlockComment]);
        // `--` is an operator in C-like languages.
        assert_eq!(
            kinds("i--", Language::JavaScript),
            vec![TokenKind::Identifier, TokenKind::Operator]
        );
    }

    #[test]
    fn test_unterminated_block_comment_is_warning() {
        let (tokens, errors) = analyze("x /* never closed", Language::JavaScript);
        assert_eq!(tokens.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, Severity::Warning);
    }

    #[test]
    fn test_language_operators() {
        assert_eq!(texts("a ** b // c", Language::Python), vec!["a", "**", "b", "//", "c"]);
        assert_eq!(texts("std::cout", Language::Cpp), vec!["std", "::", "cout"]);
        assert_eq!(texts("p->x", Language::Cpp), vec!["p", "->", "x"]);
        assert_eq!(texts("a === b", Language::JavaScript), vec!["a", "===", "b"]);
        assert_eq!(texts("x := 1..5", Language::Pascal), vec!["x", ":=", "1", "..", "5"]);
    }

    #[test]
    fn test_case_sensitivity_of_keywords() {
        let tokens = lex("BEGIN End", Language::Pascal);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Keyword));

        let tokens = lex("If if", Language::JavaScript);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Keyword);
    }

    #[test]
    fn test_directive() {
        let tokens = lex("#include <iostream>\nint main() {}", Language::Cpp);
        assert_eq!(tokens[0].kind, TokenKind::Directive);
        assert_eq!(tokens[0].text, "#include <iostream>");
        assert_eq!(tokens[0].category, TokenCategory::ReservedWord);
        assert_eq!(tokens[1].text, "int");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("0xFF 0b101 3.5e2 42", Language::Cpp),
            vec![
                TokenKind::HexLiteral,
                TokenKind::BinaryLiteral,
                TokenKind::FloatLiteral,
                TokenKind::IntegerLiteral
            ]
        );
        assert_eq!(texts("1.5f 10UL", Language::Cpp), vec!["1.5f", "10UL"]);
    }

    #[test]
    fn test_malformed_numbers() {
        let (tokens, errors) = analyze("x = 123abc", Language::Python);
        assert_eq!(tokens[2].text, "123abc");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("malformed"));

        let (_, errors) = analyze("1.2.3", Language::JavaScript);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_string_rules() {
        let tokens = lex("'it''s'", Language::Pascal);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "'it''s'");

        let tokens = lex("f\"{x}\" r'\\d'", Language::Python);
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::StringLiteral));

        let tokens = lex("'a' \"s\"", Language::Cpp);
        assert_eq!(tokens[0].kind, TokenKind::CharLiteral);
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);

        let tokens = lex("`a\nb`", Language::JavaScript);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::TemplateLiteral);
    }

    #[test]
    fn test_sql_identifiers() {
        let tokens = lex("DECLARE @total INT", Language::TSql);
        assert_eq!(tokens[1].text, "@total");
        assert_eq!(tokens[1].category, TokenCategory::Identifier);
    }

    #[test]
    fn test_markup_text_quotes_are_symbols() {
        let (tokens, errors) = analyze("<p class=\"x\">Don't</p>", Language::Html);
        assert!(errors.is_empty());
        assert!(tokens.iter().any(|t| t.text == "\"x\"" && t.kind == TokenKind::StringLiteral));
        assert!(tokens.iter().any(|t| t.text == "'" && t.kind == TokenKind::Symbol));
    }

    #[test]
    fn test_unclaimed_characters() {
        let (tokens, errors) = analyze("a $ b", Language::Python);
        assert_eq!(tokens[1].kind, TokenKind::Symbol);
        assert!(errors.is_empty());

        let (tokens, errors) = analyze("a € b", Language::Python);
        assert_eq!(tokens.len(), 2);
        assert_eq!(errors.len(), 1);

        let (tokens, errors) = analyze("a\u{0007}b", Language::Python);
        assert_eq!(tokens.len(), 2);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_mixed_indentation_warning() {
        let (_, errors) = analyze("if x:\n\t  y = 1\n", Language::Python);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, Severity::Warning);
        assert_eq!(errors[0].line, 2);
    }

    #[test]
    fn test_unknown_language_rejects_noise() {
        let (tokens, errors) = analyze("total xqzvbn", Language::Unknown);
        assert_eq!(tokens.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("xqzvbn"));
    }

    #[test]
    fn test_iteration_ceiling_terminates() {
        let source = "(".repeat(10_000);
        let (tokens, errors) = analyze(&source, Language::JavaScript);
        assert_eq!(tokens.len(), 10_000);
        assert!(errors.is_empty());

        let (_, errors) = Lexer::new("a b c d e", Language::JavaScript)
            .with_iteration_factor(0)
            .analyze();
        assert!(errors.iter().any(|e| e.message.contains("aborted")));
    }
}
