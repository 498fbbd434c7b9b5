//! Language selection and per-language lexical/semantic tables.
//!
//! Every phase of the analyzer is parameterized by a [`Language`]. The
//! language is chosen once, at the pipeline boundary, and from then on the
//! phases consult its [`LanguageProfile`] instead of switching on tag strings.
//!
//! # Architecture
//!
//! ```text
//! "py" / "python" ──► Language::Python ──► &'static dyn LanguageProfile
//!                                              │
//!                       keywords, operators, comment styles, string rules,
//!                       built-in symbols, type-conversion table, ...
//! ```
//!
//! The tables live in [`profiles`] as immutable statics, so any number of
//! concurrent analyses can share them without locking.
//!
//! # Example
//!
//! ```
//! use polyglot_analyzer::language::Language;
//!
//! let lang = Language::from_tag("c++");
//! assert_eq!(lang, Language::Cpp);
//! assert!(lang.profile().is_keyword("int"));
//! assert!(!Language::Pascal.profile().case_sensitive());
//! ```

mod profiles;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::semantic::{SymbolKind, ValueType};

/// A supported source language.
///
/// `Unknown` is a real variant, not an error: analysis still runs, with a
/// stricter lexer and no language-specific rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    Cpp,
    Html,
    Pascal,
    TSql,
    PlSql,
    Unknown,
}

impl Language {
    /// Every language, `Unknown` last.
    pub const ALL: [Language; 8] = [
        Language::JavaScript,
        Language::Python,
        Language::Cpp,
        Language::Html,
        Language::Pascal,
        Language::TSql,
        Language::PlSql,
        Language::Unknown,
    ];

    /// Maps an external tag (or a common alias) to a language.
    ///
    /// Matching is case-insensitive and never fails: unrecognized tags map
    /// to [`Language::Unknown`].
    pub fn from_tag(tag: &str) -> Language {
        match tag.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" | "node" => Language::JavaScript,
            "python" | "py" | "python3" => Language::Python,
            "cpp" | "c++" | "cxx" => Language::Cpp,
            "html" | "htm" => Language::Html,
            "pascal" | "pas" => Language::Pascal,
            "tsql" | "t-sql" | "sql" | "mssql" => Language::TSql,
            "plsql" | "pl/sql" | "oracle" => Language::PlSql,
            _ => Language::Unknown,
        }
    }

    /// The canonical external tag.
    pub fn tag(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::Html => "html",
            Language::Pascal => "pascal",
            Language::TSql => "tsql",
            Language::PlSql => "plsql",
            Language::Unknown => "unknown",
        }
    }

    /// Returns the static profile for this language.
    pub fn profile(self) -> &'static dyn LanguageProfile {
        match self {
            Language::JavaScript => &profiles::JAVASCRIPT,
            Language::Python => &profiles::PYTHON,
            Language::Cpp => &profiles::CPP,
            Language::Html => &profiles::HTML,
            Language::Pascal => &profiles::PASCAL,
            Language::TSql => &profiles::TSQL,
            Language::PlSql => &profiles::PLSQL,
            Language::Unknown => &profiles::UNKNOWN,
        }
    }

    /// True for the two SQL dialects.
    pub fn is_sql(self) -> bool {
        matches!(self, Language::TSql | Language::PlSql)
    }

    /// True for languages that bind names at run time.
    pub fn is_dynamic(self) -> bool {
        matches!(self, Language::JavaScript | Language::Python)
    }

    /// True for languages whose blocks are delimited by `{ }`.
    pub fn uses_braces(self) -> bool {
        matches!(
            self,
            Language::JavaScript | Language::Cpp | Language::Unknown
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Language::from_tag(s))
    }
}

/// A comment delimiter recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// Runs from the marker to end of line.
    Line(&'static str),
    /// Runs from `open` to the first `close`, possibly across lines.
    Block {
        open: &'static str,
        close: &'static str,
    },
}

/// How string and character literals are written.
#[derive(Debug, Clone, Copy)]
pub struct StringRules {
    /// Characters that open (and close) a string literal.
    pub quotes: &'static [char],
    /// Quotes whose literals may span lines (template literals).
    pub multiline_quotes: &'static [char],
    /// Python-style `"""` / `'''` strings.
    pub triple_quotes: bool,
    /// `\x` escapes the next character.
    pub backslash_escapes: bool,
    /// `''` inside a `'...'` literal is an escaped quote.
    pub doubled_quote_escape: bool,
    /// Quote that produces a character literal instead of a string.
    pub char_quote: Option<char>,
    /// Identifier-shaped prefixes glued to a string (`f"..."`, `r'...'`).
    pub prefixes: &'static [&'static str],
}

/// Extra characters allowed in identifiers beyond `[A-Za-z_][A-Za-z0-9_]*`.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierChars {
    pub start: &'static str,
    pub continuing: &'static str,
}

/// A symbol the language provides without a declaration.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub kind: SymbolKind,
    pub data_type: Option<&'static str>,
}

impl Builtin {
    pub(crate) const fn function(name: &'static str) -> Self {
        Self {
            name,
            kind: SymbolKind::Function,
            data_type: None,
        }
    }

    pub(crate) const fn object(name: &'static str) -> Self {
        Self {
            name,
            kind: SymbolKind::Variable,
            data_type: Some("object"),
        }
    }

    pub(crate) const fn type_name(name: &'static str) -> Self {
        Self {
            name,
            kind: SymbolKind::Class,
            data_type: Some("type"),
        }
    }

    pub(crate) const fn constant(name: &'static str, data_type: &'static str) -> Self {
        Self {
            name,
            kind: SymbolKind::Constant,
            data_type: Some(data_type),
        }
    }
}

/// Static description of one language.
///
/// All tables are `'static` and never mutated. Lookups that depend on case
/// sensitivity are provided as default methods.
pub trait LanguageProfile: Send + Sync {
    /// The language this profile describes.
    fn language(&self) -> Language;

    /// Reserved words.
    fn keywords(&self) -> &'static [&'static str];

    /// Multi-character operators, longest first.
    fn operators(&self) -> &'static [&'static str];

    /// Single-character operators.
    fn single_operators(&self) -> &'static str;

    /// Delimiter characters.
    fn delimiters(&self) -> &'static str;

    /// Comment delimiters, tried in order.
    fn comment_styles(&self) -> &'static [CommentStyle];

    /// String and character literal rules.
    fn string_rules(&self) -> &StringRules;

    /// Identifier character extensions.
    fn identifier_chars(&self) -> &IdentifierChars;

    /// Names available without declaration.
    fn builtin_symbols(&self) -> &'static [Builtin];

    /// Implicit conversions `(from, to)` accepted on assignment.
    fn type_conversions(&self) -> &'static [(ValueType, ValueType)];

    /// Keywords that begin a statement; used for error recovery.
    fn statement_keywords(&self) -> &'static [&'static str];

    /// Whether identifiers and keywords are case sensitive.
    fn case_sensitive(&self) -> bool;

    /// Whether any value may be assigned to any binding.
    fn coerces_freely(&self) -> bool {
        false
    }

    /// Normalizes a name for table lookups.
    fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.case_sensitive() {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(name.to_ascii_lowercase())
        }
    }

    /// Compares two names under this language's case rule.
    fn same_name(&self, a: &str, b: &str) -> bool {
        if self.case_sensitive() {
            a == b
        } else {
            a.eq_ignore_ascii_case(b)
        }
    }

    fn is_keyword(&self, word: &str) -> bool {
        self.keywords().iter().any(|k| self.same_name(k, word))
    }

    fn is_statement_keyword(&self, word: &str) -> bool {
        self.statement_keywords()
            .iter()
            .any(|k| self.same_name(k, word))
    }

    fn builtin(&self, name: &str) -> Option<&'static Builtin> {
        self.builtin_symbols()
            .iter()
            .find(|b| self.same_name(b.name, name))
    }

    /// Whether a value of type `from` may be stored in a binding of type `to`.
    fn allows_conversion(&self, from: ValueType, to: ValueType) -> bool {
        from == to
            || from == ValueType::Unknown
            || to == ValueType::Unknown
            || self.coerces_freely()
            || self.type_conversions().contains(&(from, to))
    }
}

/// Table-driven [`LanguageProfile`] implementation used by every language.
#[derive(Debug)]
pub struct StaticProfile {
    pub(crate) language: Language,
    pub(crate) keywords: &'static [&'static str],
    pub(crate) operators: &'static [&'static str],
    pub(crate) single_operators: &'static str,
    pub(crate) delimiters: &'static str,
    pub(crate) comment_styles: &'static [CommentStyle],
    pub(crate) strings: StringRules,
    pub(crate) identifiers: IdentifierChars,
    pub(crate) builtins: &'static [Builtin],
    pub(crate) conversions: &'static [(ValueType, ValueType)],
    pub(crate) statement_keywords: &'static [&'static str],
    pub(crate) case_sensitive: bool,
    pub(crate) coerces_freely: bool,
}

impl LanguageProfile for StaticProfile {
    fn language(&self) -> Language {
        self.language
    }

    fn keywords(&self) -> &'static [&'static str] {
        self.keywords
    }

    fn operators(&self) -> &'static [&'static str] {
        self.operators
    }

    fn single_operators(&self) -> &'static str {
        self.single_operators
    }

    fn delimiters(&self) -> &'static str {
        self.delimiters
    }

    fn comment_styles(&self) -> &'static [CommentStyle] {
        self.comment_styles
    }

    fn string_rules(&self) -> &StringRules {
        &self.strings
    }

    fn identifier_chars(&self) -> &IdentifierChars {
        &self.identifiers
    }

    fn builtin_symbols(&self) -> &'static [Builtin] {
        self.builtins
    }

    fn type_conversions(&self) -> &'static [(ValueType, ValueType)] {
        self.conversions
    }

    fn statement_keywords(&self) -> &'static [&'static str] {
        self.statement_keywords
    }

    fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn coerces_freely(&self) -> bool {
        self.coerces_freely
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_aliases() {
        assert_eq!(Language::from_tag("JS"), Language::JavaScript);
        assert_eq!(Language::from_tag("py"), Language::Python);
        assert_eq!(Language::from_tag("C++"), Language::Cpp);
        assert_eq!(Language::from_tag("pl/sql"), Language::PlSql);
        assert_eq!(Language::from_tag("cobol"), Language::Unknown);
        assert_eq!("tsql".parse::<Language>(), Ok(Language::TSql));
    }

    #[test]
    fn test_tag_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_tag(lang.tag()), lang);
        }
    }

    #[test]
    fn test_keyword_case_rules() {
        let pascal = Language::Pascal.profile();
        assert!(pascal.is_keyword("BEGIN"));
        assert!(pascal.is_keyword("begin"));

        assert!(!pascal.is_keyword("Integer"));
        assert!(pascal.builtin("INTEGER").is_some_and(|b| b.kind == SymbolKind::Class));

        let python = Language::Python.profile();
        assert!(python.is_keyword("True"));
        assert!(!python.is_keyword("true"));
    }

    #[test]
    fn test_builtins() {
        assert!(Language::JavaScript.profile().builtin("console").is_some());
        assert!(Language::Python.profile().builtin("print").is_some());
        assert!(Language::TSql.profile().builtin("GETDATE").is_some());
        assert!(Language::Html.profile().builtin_symbols().is_empty());
    }

    #[test]
    fn test_conversions() {
        let pascal = Language::Pascal.profile();
        assert!(pascal.allows_conversion(ValueType::Integer, ValueType::Real));
        assert!(!pascal.allows_conversion(ValueType::Real, ValueType::Integer));
        assert!(!pascal.allows_conversion(ValueType::String, ValueType::Integer));

        let js = Language::JavaScript.profile();
        assert!(js.allows_conversion(ValueType::String, ValueType::Integer));
    }

    #[test]
    fn test_operators_longest_first() {
        for lang in Language::ALL {
            let ops = lang.profile().operators();
            for (i, op) in ops.iter().enumerate() {
                for later in &ops[i + 1..] {
                    assert!(
                        !(later.len() > op.len() && later.starts_with(op)),
                        "{lang}: `{later}` is shadowed by `{op}`"
                    );
                }
            }
        }
    }
}
