//! C++ statements.
//!
//! Declarations are recognized by shape: an optional run of specifiers, a
//! type (built-in words, a known class name, or a qualified and templated
//! name), pointer or reference markers, then a declarator name. A `(`
//! after the name makes a function; anything else is a variable list.
//! Input that does not fit is rewound and read as an expression
//! statement.

use crate::ast::{NodeKind, ParseNode};
use crate::lexer::{Token, TokenCategory, TokenKind};

use super::c_family::CONTROL_KEYWORDS;
use super::expressions::{is_closer, span_text};
use super::{Parser, StatementResult};

const SPECIFIERS: &[&str] = &[
    "const", "static", "inline", "virtual", "extern", "constexpr", "mutable", "volatile",
    "register", "explicit", "friend", "typename",
];

const BUILTIN_TYPES: &[&str] = &[
    "int", "float", "double", "char", "bool", "void", "auto", "wchar_t", "long", "short",
    "unsigned", "signed",
];

const LIBRARY_TYPES: &[&str] = &[
    "string", "wstring", "vector", "map", "set", "pair", "list", "deque", "array", "queue",
    "stack", "unordered_map", "unordered_set", "size_t", "shared_ptr", "unique_ptr",
    "ostream", "istream",
];

/// Words that may follow a function's parameter list.
const TRAILING_QUALIFIERS: &[&str] = &["const", "noexcept", "override", "final", "volatile"];

impl<'a> Parser<'a> {
    pub(super) fn cpp_statement(&mut self) -> StatementResult {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        if token.kind == TokenKind::Directive {
            self.advance();
            return Ok(Some(ParseNode::leaf(NodeKind::Directive, token.text.trim(), token.position())));
        }
        if token.is_punct(";") || is_closer(token) {
            self.advance();
            return Ok(None);
        }
        if token.is_punct("{") {
            return self.brace_block().map(Some);
        }

        if token.category == TokenCategory::ReservedWord {
            match token.text.as_str() {
                "using" => return self.cpp_using().map(Some),
                "namespace" => return self.cpp_namespace().map(Some),
                "template" => {
                    self.advance();
                    if self.check_punct("<") {
                        self.skip_angles();
                    }
                    return self.cpp_statement();
                }
                "class" | "struct" | "union" => return self.cpp_class().map(Some),
                "enum" => return self.cpp_enum().map(Some),
                "typedef" => return self.cpp_typedef().map(Some),
                "public" | "private" | "protected"
                    if self.peek_ahead(1).is_some_and(|t| t.is_punct(":")) =>
                {
                    self.advance();
                    self.advance();
                    return Ok(None);
                }
                word if CONTROL_KEYWORDS.contains(&word) => return self.c_control(),
                _ => {}
            }
        }

        if self.looks_like_definition() {
            return self.cpp_function(None, token).map(Some);
        }
        if let Some(node) = self.cpp_declaration()? {
            return Ok(Some(node));
        }
        self.expression_statement()
    }

    // ==================== Declarations ====================

    /// Tries a type-led declaration. Rewinds and returns `Ok(None)` when
    /// the tokens do not have that shape.
    fn cpp_declaration(&mut self) -> StatementResult {
        let start = self.current;
        let Some(first) = self.peek() else {
            return Ok(None);
        };
        let Some(mut type_text) = self.cpp_type() else {
            self.current = start;
            return Ok(None);
        };
        while let Some(marker) = self.peek()
            && (marker.is_punct("*") || marker.is_punct("&") || marker.is_punct("&&"))
        {
            type_text.push_str(&marker.text);
            self.advance();
        }

        if self.check_word("operator") || self.check_punct("~") {
            return self.cpp_function(Some(type_text), first).map(Some);
        }
        let Some(name) = self.peek().filter(|t| t.is_identifier()) else {
            self.current = start;
            return Ok(None);
        };

        // `Point p(1, 2);` constructs a variable; `int f(int a)` declares a function.
        if self.peek_ahead(1).is_some_and(|t| t.is_punct("("))
            && !self.peek_ahead(2).is_some_and(|t| t.is_literal())
        {
            return self.cpp_function(Some(type_text), first).map(Some);
        }
        if self.peek_ahead(1).is_some_and(|t| t.is_punct("::")) {
            return self.cpp_function(Some(type_text), first).map(Some);
        }

        let mut node = ParseNode::leaf(NodeKind::VariableDeclaration, type_text, first.position());
        self.advance();
        self.cpp_declarator(&mut node, name);
        while self.match_punct(",") {
            while self.match_punct("*") || self.match_punct("&") {}
            let name = self.expect_identifier("variable name")?;
            self.cpp_declarator(&mut node, name);
        }
        self.end_statement("declaration");
        Ok(Some(node))
    }

    /// Records a declared name with its array bounds and initializer.
    fn cpp_declarator(&mut self, node: &mut ParseNode, name: &'a Token) {
        node.push(ParseNode::leaf(NodeKind::Identifier, name.text.clone(), name.position()));
        while self.check_punct("[") {
            self.skip_balanced("[", "]");
        }
        if self.match_punct("=") {
            if self.check_punct("{") {
                let start = self.current;
                self.skip_balanced("{", "}");
                if let Some(first) = self.tokens.get(start) {
                    let text = span_text(&self.tokens[start..self.current]);
                    node.push(ParseNode::leaf(NodeKind::Expression, text, first.position()));
                }
            } else if let Some(value) = self.expression(&[]) {
                node.push(value);
            }
        } else if self.check_punct("{") {
            self.skip_balanced("{", "}");
        } else if self.check_punct("(")
            && let Ok(Some(args)) = self.parenthesized("variable name")
        {
            node.push(args);
        }
    }

    /// Reads a type, returning its text. Leaves the cursor after it.
    fn cpp_type(&mut self) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();
        while let Some(token) = self.peek()
            && token.category == TokenCategory::ReservedWord
            && SPECIFIERS.contains(&token.text.as_str())
        {
            parts.push(token.text.clone());
            self.advance();
        }

        let mut has_base = false;
        while let Some(token) = self.peek()
            && token.category == TokenCategory::ReservedWord
            && BUILTIN_TYPES.contains(&token.text.as_str())
        {
            parts.push(token.text.clone());
            self.advance();
            has_base = true;
        }

        if !has_base {
            if !self.identifier_starts_type() {
                return None;
            }
            let start = self.current;
            self.advance();
            while self.check_punct("::") && self.peek_ahead(1).is_some_and(Token::is_identifier) {
                self.advance();
                self.advance();
            }
            if self.check_punct("<") {
                self.skip_angles();
            }
            parts.push(span_text(&self.tokens[start..self.current]));
        }

        while self.check_word("const") {
            self.advance();
            parts.push("const".to_string());
        }
        Some(parts.join(" "))
    }

    /// Whether the identifier at the cursor begins a type.
    ///
    /// Known class and library type names always do. Any other name does
    /// when a declarator name follows it directly, or after a qualified
    /// path or template arguments.
    fn identifier_starts_type(&self) -> bool {
        let Some(token) = self.peek().filter(|t| t.is_identifier()) else {
            return false;
        };
        let known = self.type_names.contains(&token.text)
            || LIBRARY_TYPES.contains(&token.text.as_str());

        let mut n = 1;
        while self.peek_ahead(n).is_some_and(|t| t.is_punct("::"))
            && self.peek_ahead(n + 1).is_some_and(Token::is_identifier)
        {
            n += 2;
        }
        match self.peek_ahead(n) {
            Some(next) if next.is_identifier() => true,
            Some(next) if next.is_punct("<") => known || n > 1,
            Some(next) if next.is_punct("*") || next.is_punct("&") || next.is_punct("&&") => {
                known && self.peek_ahead(n + 1).is_some_and(Token::is_identifier)
            }
            _ => false,
        }
    }

    /// Consumes `< ... >`, counting `>>` as two closers.
    fn skip_angles(&mut self) {
        let mut depth = 0isize;
        while let Some(token) = self.peek() {
            if token.is_punct(";") || token.is_punct("{") {
                return;
            }
            self.advance();
            match token.text.as_str() {
                "<" => depth += 1,
                ">" => depth -= 1,
                ">>" => depth -= 2,
                _ => {}
            }
            if depth <= 0 {
                return;
            }
        }
    }

    /// Looks ahead for `Name(...) {` or `A::B(...) :` with no return type:
    /// constructors, destructors and out-of-class definitions.
    fn looks_like_definition(&self) -> bool {
        let mut n = 0;
        if self.peek_ahead(n).is_some_and(|t| t.is_punct("~")) {
            n += 1;
        }
        if !self.peek_ahead(n).is_some_and(Token::is_identifier) {
            return false;
        }
        n += 1;
        while self.peek_ahead(n).is_some_and(|t| t.is_punct("::")) {
            n += 1;
            if self.peek_ahead(n).is_some_and(|t| t.is_punct("~")) {
                n += 1;
            }
            if !self.peek_ahead(n).is_some_and(Token::is_identifier) {
                return false;
            }
            n += 1;
        }
        if !self.peek_ahead(n).is_some_and(|t| t.is_punct("(")) {
            return false;
        }
        let mut depth = 0usize;
        while let Some(token) = self.peek_ahead(n) {
            n += 1;
            if token.is_punct("(") {
                depth += 1;
            } else if token.is_punct(")") {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else if token.is_punct(";") || token.is_punct("{") {
                return false;
            }
        }
        while self
            .peek_ahead(n)
            .is_some_and(|t| TRAILING_QUALIFIERS.iter().any(|q| t.is_word(q)))
        {
            n += 1;
        }
        // `:` after the parameter list opens a member initializer list.
        self.peek_ahead(n)
            .is_some_and(|t| t.is_punct("{") || t.is_punct(":"))
    }

    /// Parses a function from its name onwards.
    fn cpp_function(&mut self, return_type: Option<String>, first: &'a Token) -> Result<ParseNode, ()> {
        let name_start = self.current;
        if self.match_word("operator") {
            while let Some(token) = self.peek() {
                if token.is_punct("(") && self.current > name_start + 1 {
                    break;
                }
                self.advance();
            }
        } else {
            self.match_punct("~");
            self.expect_identifier("function name")?;
            while self.check_punct("::") {
                self.advance();
                self.match_punct("~");
                self.expect_identifier("name after `::`")?;
            }
        }
        let name = span_text(&self.tokens[name_start..self.current]);
        let is_method = self.in_class || name.contains("::");
        let kind = if is_method {
            NodeKind::MethodDeclaration
        } else {
            NodeKind::FunctionDeclaration
        };
        let mut node = ParseNode::leaf(kind, name, first.position());
        if let Some(return_type) = return_type {
            node.push(ParseNode::leaf(NodeKind::Identifier, return_type, first.position()));
        }
        node.push(self.parameter_list()?);

        while self.match_any_word(TRAILING_QUALIFIERS) {}
        if self.match_punct("->") {
            self.skip_clause(|t| t.is_punct("{"));
        }
        if self.match_punct(":") {
            // Member initializer list.
            while let Some(token) = self.peek() {
                if token.is_punct("{") || token.is_punct(";") {
                    break;
                }
                if token.is_punct("(") {
                    self.skip_balanced("(", ")");
                } else {
                    self.advance();
                }
            }
        }

        if self.check_punct("{") {
            node.push(self.brace_block()?);
        } else if self.match_punct("=") {
            // `= 0`, `= default`, `= delete`
            self.advance();
            self.end_statement("function declaration");
        } else {
            self.end_statement("function declaration");
        }
        Ok(node)
    }

    fn cpp_class(&mut self) -> Result<ParseNode, ()> {
        let Some(keyword) = self.advance() else {
            return Err(());
        };
        let name = self.expect_identifier("class name")?;
        self.type_names.insert(name.text.clone());
        let mut node = ParseNode::leaf(NodeKind::ClassDeclaration, name.text.clone(), keyword.position());

        self.match_word("final");
        if self.match_punct(":") {
            let bases = self.skip_clause(|t| t.is_punct("{"));
            node.push(ParseNode::leaf(NodeKind::Identifier, bases, name.position()));
        }
        if self.match_punct(";") {
            return Ok(node);
        }

        let outer = std::mem::replace(&mut self.in_class, true);
        let body = self.brace_block();
        self.in_class = outer;
        node.push(body?);

        if self.check_identifier() {
            // `struct P { ... } origin;`
            let instance = self.advance().map(|t| t.text.clone()).unwrap_or_default();
            node.push(ParseNode::leaf(NodeKind::Identifier, instance, name.position()));
        }
        self.expect_terminator(";", "class definition");
        Ok(node)
    }

    fn cpp_enum(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("enum", "`enum`")?;
        self.match_any_word(&["class", "struct"]);
        let mut node = ParseNode::new(NodeKind::TypeDeclaration, keyword.position());
        if let Some(name) = self.peek().filter(|t| t.is_identifier()) {
            self.advance();
            self.type_names.insert(name.text.clone());
            node.value = Some(name.text.clone());
        }
        if self.match_punct(":") {
            self.skip_clause(|t| t.is_punct("{"));
        }
        if self.check_punct("{") {
            let start = self.current;
            self.skip_balanced("{", "}");
            let body = &self.tokens[start..self.current];
            for (i, token) in body.iter().enumerate() {
                let before = i.checked_sub(1).and_then(|j| body.get(j));
                if token.is_identifier() && before.is_some_and(|b| b.is_punct("{") || b.is_punct(",")) {
                    node.push(ParseNode::leaf(NodeKind::Identifier, token.text.clone(), token.position()));
                }
            }
        }
        self.expect_terminator(";", "enum definition");
        Ok(node)
    }

    fn cpp_typedef(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("typedef", "`typedef`")?;
        let start = self.current;
        let text = self.skip_clause(|_| false);
        if let Some(alias) = self.tokens[start..self.current]
            .iter()
            .rev()
            .find(|t| t.is_identifier())
        {
            self.type_names.insert(alias.text.clone());
        }
        self.expect_terminator(";", "typedef");
        Ok(ParseNode::leaf(NodeKind::TypeDeclaration, text, keyword.position()))
    }

    fn cpp_using(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("using", "`using`")?;
        let text = self.skip_clause(|_| false);
        if text.is_empty() {
            self.error_here("name after `using`");
            return Err(());
        }
        self.expect_terminator(";", "`using` declaration");
        Ok(ParseNode::leaf(NodeKind::Import, text, keyword.position()))
    }

    fn cpp_namespace(&mut self) -> Result<ParseNode, ()> {
        let keyword = self.expect_word("namespace", "`namespace`")?;
        let name = if self.check_identifier() {
            self.advance().map(|t| t.text.clone()).unwrap_or_default()
        } else {
            String::new()
        };
        let mut block = self.brace_block()?;
        block.value = Some(name);
        block.line = keyword.line;
        block.column = keyword.column;
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::NodeKind;
    use crate::diagnostics::Severity;
    use crate::language::Language;
    use crate::lexer::lex;
    use crate::parser::analyze;

    fn parse(source: &str) -> (Vec<crate::ast::ParseNode>, Vec<crate::diagnostics::Diagnostic>) {
        let tokens = lex(source, Language::Cpp);
        analyze(&tokens, Language::Cpp)
    }

    #[test]
    fn test_hello_world() {
        let source = "#include <iostream>\nusing namespace std;\n\nint main() {\n    cout << \"Hello\" << endl;\n    return 0;\n}\n";
        let (nodes, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let kinds: Vec<_> = nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            [NodeKind::Directive, NodeKind::Import, NodeKind::FunctionDeclaration]
        );
        assert_eq!(nodes[2].value(), Some("main"));
    }

    #[test]
    fn test_missing_semicolon_is_warning() {
        let source = "int main() {\n    int x = 5\n    int y = 6;\n    return x + y;\n}\n";
        let (nodes, diagnostics) = parse(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].message.contains("missing `;`"));
        let decls = nodes[0].find_all(NodeKind::VariableDeclaration);
        assert_eq!(decls.len(), 2);
    }

    #[test]
    fn test_class_with_constructor() {
        let source = "class Point {\npublic:\n    Point(int x, int y) : x_(x), y_(y) {}\n    int getX() const { return x_; }\nprivate:\n    int x_, y_;\n};\nint main() { Point p(1, 2); return 0; }";
        let (nodes, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(nodes[0].kind, NodeKind::ClassDeclaration);
        assert_eq!(nodes[0].find_all(NodeKind::MethodDeclaration).len(), 2);
        let main_decls = nodes[1].find_all(NodeKind::VariableDeclaration);
        assert_eq!(main_decls[0].value(), Some("Point"));
    }

    #[test]
    fn test_templates_and_qualified_types() {
        let source = "std::vector<int> values = {1, 2, 3};\nstd::map<std::string, int> counts;\nconst char* name = \"x\";\nint main() { return 0; }";
        let (nodes, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(
            nodes
                .iter()
                .filter(|n| n.kind == NodeKind::VariableDeclaration)
                .count(),
            3
        );
    }

    #[test]
    fn test_stream_expression_is_not_declaration() {
        let (nodes, _) = parse("std::cout << x;");
        assert_eq!(nodes[0].kind, NodeKind::Statement);
    }
}
