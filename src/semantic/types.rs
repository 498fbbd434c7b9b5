//! Value types used by assignment checks.
//!
//! The analyzer does not model each language's type system. It maps
//! declared type names and literal tokens onto a handful of coarse
//! categories and asks the language profile which conversions between
//! them are allowed.
//!
//! # Mapping
//!
//! | Category | Declared as |
//! |---|---|
//! | `Integer` | `int`, `long`, `integer`, `smallint`, `pls_integer`, ... |
//! | `Real` | `float`, `double`, `real`, `decimal`, `number`, ... |
//! | `String` | `string`, `varchar`, `text`, SQL `char(n)`, ... |
//! | `Char` | C++ and Pascal `char` |
//! | `Boolean` | `bool`, `boolean`, `bit` |
//! | `Pointer` | anything ending in `*` |
//!
//! Everything else (classes, records, dates, ...) is `Unknown`, which is
//! compatible with every other category.

use serde::Serialize;
use std::fmt;

use crate::language::Language;
use crate::lexer::{Token, TokenCategory, TokenKind};

/// Coarse type category of a binding or literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Real,
    String,
    Char,
    Boolean,
    Pointer,
    Null,
    Unknown,
}

impl ValueType {
    /// Category of a declared type name such as `unsigned int`,
    /// `VARCHAR(50)` or `std::string`.
    pub fn from_declared(name: &str, language: Language) -> ValueType {
        let lower = name.trim().to_ascii_lowercase();
        if lower.ends_with('*') {
            return ValueType::Pointer;
        }
        if lower.ends_with('&') || lower.ends_with(']') || lower.starts_with("array") {
            return ValueType::Unknown;
        }
        let base = lower
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_start_matches("std::");
        let last = base.split_whitespace().last().unwrap_or_default();

        match last {
            "int" | "long" | "short" | "unsigned" | "signed" | "size_t" | "integer" | "byte"
            | "word" | "longint" | "shortint" | "cardinal" | "smallint" | "bigint" | "tinyint"
            | "pls_integer" | "binary_integer" | "natural" | "positive" => ValueType::Integer,
            "float" | "double" | "real" | "single" | "extended" | "decimal" | "numeric"
            | "money" | "number" => ValueType::Real,
            "string" | "varchar" | "varchar2" | "nvarchar" | "nchar" | "text" | "ntext"
            | "clob" | "wstring" => ValueType::String,
            "char" | "wchar_t" if language.is_sql() => ValueType::String,
            "char" | "wchar_t" => ValueType::Char,
            "bool" | "boolean" | "bit" => ValueType::Boolean,
            _ => ValueType::Unknown,
        }
    }

    /// Category of a literal token, or `None` when the token is not a
    /// literal.
    pub fn of_literal(token: &Token, language: Language) -> Option<ValueType> {
        match token.kind {
            TokenKind::IntegerLiteral
            | TokenKind::HexLiteral
            | TokenKind::BinaryLiteral
            | TokenKind::OctalLiteral => Some(ValueType::Integer),
            TokenKind::FloatLiteral => Some(ValueType::Real),
            TokenKind::CharLiteral => Some(ValueType::Char),
            TokenKind::StringLiteral if language == Language::Pascal => {
                // Pascal writes characters as one-character strings.
                let inner = token.text.trim_matches('\'');
                if inner.chars().count() == 1 {
                    Some(ValueType::Char)
                } else {
                    Some(ValueType::String)
                }
            }
            TokenKind::StringLiteral | TokenKind::TemplateLiteral => Some(ValueType::String),
            _ if token.category == TokenCategory::ReservedWord => {
                match token.text.to_ascii_lowercase().as_str() {
                    "true" | "false" => Some(ValueType::Boolean),
                    "null" | "nullptr" | "none" | "nil" | "undefined" => Some(ValueType::Null),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Real => "real",
            ValueType::String => "string",
            ValueType::Char => "char",
            ValueType::Boolean => "boolean",
            ValueType::Pointer => "pointer",
            ValueType::Null => "null",
            ValueType::Unknown => "unknown",
        }
    }

    /// True for the categories that hold a single scalar value.
    pub fn is_scalar(self) -> bool {
        !matches!(self, ValueType::Unknown | ValueType::Null)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn test_declared_names() {
        assert_eq!(ValueType::from_declared("unsigned int", Language::Cpp), ValueType::Integer);
        assert_eq!(ValueType::from_declared("double", Language::Cpp), ValueType::Real);
        assert_eq!(ValueType::from_declared("std::string", Language::Cpp), ValueType::String);
        assert_eq!(ValueType::from_declared("int*", Language::Cpp), ValueType::Pointer);
        assert_eq!(ValueType::from_declared("int&", Language::Cpp), ValueType::Unknown);
        assert_eq!(ValueType::from_declared("VARCHAR(50)", Language::TSql), ValueType::String);
        assert_eq!(ValueType::from_declared("NUMBER(10,2)", Language::PlSql), ValueType::Real);
        assert_eq!(ValueType::from_declared("Integer", Language::Pascal), ValueType::Integer);
        assert_eq!(ValueType::from_declared("TPoint", Language::Pascal), ValueType::Unknown);
    }

    #[test]
    fn test_char_depends_on_language() {
        assert_eq!(ValueType::from_declared("char", Language::Cpp), ValueType::Char);
        assert_eq!(ValueType::from_declared("CHAR(10)", Language::TSql), ValueType::String);
    }

    #[test]
    fn test_literals() {
        let tokens = lex("42 3.5 \"hi\" 'c' true nullptr", Language::Cpp);
        let types: Vec<_> = tokens
            .iter()
            .map(|t| ValueType::of_literal(t, Language::Cpp))
            .collect();
        assert_eq!(
            types,
            [
                Some(ValueType::Integer),
                Some(ValueType::Real),
                Some(ValueType::String),
                Some(ValueType::Char),
                Some(ValueType::Boolean),
                Some(ValueType::Null),
            ]
        );
    }

    #[test]
    fn test_pascal_single_character_string() {
        let tokens = lex("'a' 'abc' x", Language::Pascal);
        assert_eq!(ValueType::of_literal(&tokens[0], Language::Pascal), Some(ValueType::Char));
        assert_eq!(ValueType::of_literal(&tokens[1], Language::Pascal), Some(ValueType::String));
        assert_eq!(ValueType::of_literal(&tokens[2], Language::Pascal), None);
    }
}
