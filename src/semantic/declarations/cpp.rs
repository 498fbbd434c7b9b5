//! C++ declarations.
//!
//! A declaration is recognized in statement position when it starts with
//! a type: qualifiers, built-in type keywords, library types such as
//! `string` or `std::vector<int>`, and class names seen earlier in the
//! file. Each declarator may add `*`/`&` markers and array brackets.
//!
//! `Type name(` at namespace or class level is a function. A prototype
//! (ending in `;`) is recorded as a forward declaration that the later
//! definition completes. Out-of-class definitions (`A::f`) get a scope
//! below the class scope so that members resolve.

use crate::diagnostics::{AnalysisFault, Position, offset_u32};
use crate::lexer::{TokenCategory, TokenKind};
use crate::semantic::{ScopeId, ScopeKind, SemanticAnalyzer, SymbolEntry, SymbolKind};

/// Standard library names usable as types without `std::`.
const LIBRARY_TYPES: &[&str] = &[
    "string", "vector", "map", "set", "pair", "size_t", "list", "deque", "array", "queue",
    "stack", "priority_queue", "unordered_map", "unordered_set", "multimap", "multiset",
    "ifstream", "ofstream", "fstream", "istream", "ostream", "stringstream", "istringstream",
    "ostringstream", "unique_ptr", "shared_ptr", "weak_ptr", "optional", "tuple", "function",
    "string_view", "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t",
    "uint32_t", "uint64_t", "FILE",
];

const QUALIFIERS: &[&str] = &[
    "static", "inline", "virtual", "extern", "mutable", "volatile", "register", "explicit",
    "typename",
];

const BASE_TYPES: &[&str] = &[
    "int", "float", "double", "char", "bool", "void", "auto", "wchar_t", "long", "short",
    "signed", "unsigned",
];

/// A type written at the start of a declaration.
struct CppType {
    text: String,
    constant: bool,
    /// Index just past the type.
    end: usize,
}

impl<'a> SemanticAnalyzer<'a> {
    pub(super) fn cpp_declaration(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let token = self.token(i)?;
        if token.kind == TokenKind::Directive {
            self.cpp_directive(i)?;
            return Ok(i + 1);
        }
        if token.category == TokenCategory::ReservedWord {
            match token.text.as_str() {
                "class" | "struct" | "union" if self.cpp_statement_start(i) => return self.cpp_class(i),
                "enum" => return self.cpp_enum(i),
                "template" if self.is_punct_at(i + 1, "<") => return self.cpp_template(i),
                "using" => return self.cpp_using(i),
                "typedef" => return self.cpp_typedef(i),
                "for" | "catch" if self.is_punct_at(i + 1, "(") => return self.header_block(i),
                _ => {}
            }
        }
        if token.is_punct("{") {
            self.open_block(i);
            return Ok(i + 1);
        }
        if token.is_punct("[") && self.cpp_lambda_start(i) {
            return self.cpp_lambda(i);
        }
        if !self.cpp_statement_start(i) {
            return Ok(i + 1);
        }
        if let Some(next) = self.cpp_constructor(i)? {
            return Ok(next);
        }
        self.cpp_typed_declaration(i)
    }

    fn cpp_statement_start(&self, i: usize) -> bool {
        let Some(previous) = self.previous(i) else {
            return true;
        };
        previous.is_punct(";")
            || previous.is_punct("{")
            || previous.is_punct("}")
            || previous.is_punct(":")
            || previous.kind == TokenKind::Directive
            || (previous.is_punct("(")
                && i.checked_sub(2)
                    .and_then(|k| self.tok(k))
                    .is_some_and(|t| t.is_any_keyword(&["for", "if", "while", "switch"])))
            || self.resyncs_after_missing_semicolon(i)
    }

    /// A line opening with `Type name` after a line that ended without
    /// `;` still starts a declaration.
    fn resyncs_after_missing_semicolon(&self, i: usize) -> bool {
        let (Some(token), Some(previous)) = (self.tok(i), self.previous(i)) else {
            return false;
        };
        if previous.line >= token.line
            || previous.category == TokenCategory::Operator
            || previous.is_punct(",")
            || previous.is_punct("(")
        {
            return false;
        }
        let Some(cpp_type) = self.cpp_type_at(i) else {
            return false;
        };
        let mut j = cpp_type.end;
        while self.tok(j).is_some_and(|t| t.is_punct("*") || t.is_punct("&")) {
            j += 1;
        }
        self.tok(j).is_some_and(|t| t.is_identifier())
    }

    // ==================== Types ====================

    fn is_type_name(&self, index: usize) -> bool {
        let Some(token) = self.tok(index) else {
            return false;
        };
        token.is_identifier()
            && (self.type_names.contains(&token.text)
                || LIBRARY_TYPES.contains(&token.text.as_str())
                || (token.text == "std" && self.is_punct_at(index + 1, "::")))
    }

    /// Index of the `>` closing a template argument list at `open`.
    fn angle_end(&self, open: usize) -> Option<usize> {
        let mut depth = 0i32;
        for k in open..self.tokens.len() {
            let token = self.tokens[k];
            match token.text.as_str() {
                "<" => depth += 1,
                ">" => depth -= 1,
                ">>" => depth -= 2,
                ";" | "{" | "}" => return None,
                _ => {}
            }
            if depth <= 0 {
                return Some(k);
            }
        }
        None
    }

    fn cpp_type_at(&self, start: usize) -> Option<CppType> {
        let mut j = start;
        let mut constant = false;
        let mut base = false;
        while let Some(token) = self.tok(j) {
            if token.category == TokenCategory::ReservedWord {
                let word = token.text.as_str();
                if word == "const" || word == "constexpr" {
                    constant = true;
                } else if BASE_TYPES.contains(&word) {
                    base = true;
                } else if matches!(word, "struct" | "class" | "enum") && self.is_type_name(j + 1) {
                    // Elaborated names such as `struct Node`.
                } else if !QUALIFIERS.contains(&word) {
                    break;
                }
                j += 1;
                continue;
            }
            if base || !self.is_type_name(j) {
                break;
            }
            j += 1;
            loop {
                if self.is_punct_at(j, "::") && self.tok(j + 1).is_some_and(|t| t.is_identifier()) {
                    j += 2;
                } else if self.is_punct_at(j, "<") {
                    j = self.angle_end(j)? + 1;
                } else {
                    break;
                }
            }
            base = true;
        }
        base.then(|| CppType {
            text: self.text_between(start, j),
            constant,
            end: j,
        })
    }

    // ==================== Declarations ====================

    /// Variables, functions and methods that start with a type.
    fn cpp_typed_declaration(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let Some(cpp_type) = self.cpp_type_at(i) else {
            return Ok(i + 1);
        };
        let mut j = cpp_type.end;
        let mut resume = None;
        let mut first = true;
        loop {
            let mut markers = String::new();
            while let Some(token) = self.tok(j) {
                if token.is_punct("*") || token.is_punct("&") || token.is_punct("&&") {
                    markers.push_str(&token.text);
                } else if !token.is_keyword("const") {
                    break;
                }
                j += 1;
            }

            if self.is_keyword_at(j, "operator") && first {
                let Some(open) = (j + 2..self.tokens.len()).find(|&k| self.is_punct_at(k, "(")) else {
                    break;
                };
                self.mark_opaque(i, cpp_type.end.saturating_sub(1));
                let return_type = format!("{}{markers}", cpp_type.text);
                return self.cpp_function(j, open, Some(return_type), None);
            }
            if !self.tok(j).is_some_and(|t| t.is_identifier()) {
                break;
            }
            let mut name = j;
            let mut owner = None;
            while self.is_punct_at(name + 1, "::") && self.tok(name + 2).is_some_and(|t| t.is_identifier()) {
                owner = Some(name);
                name += 2;
            }
            if first {
                self.mark_opaque(i, cpp_type.end.saturating_sub(1));
            }

            let declared = format!("{}{markers}", cpp_type.text);
            if first
                && self.is_punct_at(name + 1, "(")
                && (owner.is_some() || matches!(self.current_kind(), ScopeKind::Global | ScopeKind::Class))
            {
                return self.cpp_function(name, name + 1, Some(declared), owner);
            }

            let mut data_type = declared;
            j = name + 1;
            while self.is_punct_at(j, "[") {
                data_type.push_str("[]");
                j = self.group_end(j).map_or(self.tokens.len(), |e| e + 1);
            }
            let by_assignment = self.is_punct_at(j, "=");
            let by_construction = self.is_punct_at(j, "(") || self.is_punct_at(j, "{");
            let by_range = self.is_punct_at(j, ":");
            let initialized = by_assignment || by_construction || by_range;

            let kind = if cpp_type.constant && markers.is_empty() {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            };
            let entry = self
                .entry_at(name, kind)?
                .with_type(data_type.as_str())
                .initialized(initialized);
            if by_assignment {
                self.check_initializer(&entry.name, entry.position(), &data_type, j + 1);
            }
            let member = self.current_kind() == ScopeKind::Class;
            if let Some(id) = self.declare(entry)
                && !initialized
                && !member
                && (data_type.ends_with('*') || data_type.ends_with('&'))
            {
                self.bare_declarations.push(id);
            }
            resume.get_or_insert(j);

            let next = if by_assignment {
                self.find_at_depth(j + 1, |t| t.is_punct(",") || t.is_punct(";"))
            } else if by_construction {
                self.group_end(j).map_or(self.tokens.len(), |e| e + 1)
            } else {
                j
            };
            if !self.is_punct_at(next, ",") {
                break;
            }
            j = next + 1;
            first = false;
        }
        Ok(resume.unwrap_or(i + 1))
    }

    /// Declares a function or method whose name is at `name` and whose
    /// parameter list opens at `open`, and enters its scope.
    fn cpp_function(
        &mut self,
        name: usize,
        open: usize,
        return_type: Option<String>,
        owner: Option<usize>,
    ) -> Result<usize, AnalysisFault> {
        let Some(close) = self.group_end(open) else {
            return Ok(open + 1);
        };

        // Trailing qualifiers, `= 0`, and constructor initializer lists.
        let mut body = None;
        let mut j = close + 1;
        while let Some(token) = self.tok(j) {
            if token.is_punct("{") {
                body = Some(j);
                break;
            }
            if token.is_punct(";") || token.is_punct("}") {
                break;
            }
            if token.is_punct("=") {
                j = self.find_at_depth(j, |t| t.is_punct(";"));
                break;
            }
            if token.is_punct(":") {
                j += 1;
                while self.tok(j).is_some_and(|t| t.is_identifier()) {
                    while self.is_punct_at(j + 1, "::") {
                        j += 2;
                    }
                    j += 1;
                    if self.is_punct_at(j, "(") || self.is_punct_at(j, "{") {
                        j = self.group_end(j).map_or(self.tokens.len(), |e| e + 1);
                    }
                    if !self.is_punct_at(j, ",") {
                        break;
                    }
                    j += 1;
                }
                continue;
            }
            j += 1;
        }

        let current = self.table.current_scope();
        let class_scope = match owner {
            Some(index) => {
                let owner_name = self.token(index)?.text.clone();
                self.table
                    .find_child_scope(current, &owner_name)
                    .or_else(|| self.table.find_child_scope(ScopeId::GLOBAL, &owner_name))
            }
            None => None,
        };
        let kind = if class_scope.is_some() || owner.is_some() || self.current_kind() == ScopeKind::Class {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };

        let params = self.cpp_params(open, close)?;
        let function_name = self.text_between(name, open);
        let mut entry = SymbolEntry::new(function_name.as_str(), kind, self.position_of(name));
        entry.parameters = self.param_infos(&params);
        entry.data_type = return_type.clone();
        entry.return_type = return_type;
        entry.forward = body.is_none();
        self.declare_in(class_scope.unwrap_or(current), entry);

        let end = match body {
            Some(brace) => {
                self.claimed.insert(brace);
                self.group_end(brace)
                    .unwrap_or(self.tokens.len().saturating_sub(1))
            }
            None => j,
        };
        let range = self.span(open, end);
        self.table
            .enter_scope_under(class_scope.unwrap_or(current), function_name, ScopeKind::Function, range);
        self.declare_params(&params)?;
        Ok(close + 1)
    }

    /// Parameters in `tokens[open + 1..close]` with their declared types.
    /// Parameters without a name are left out.
    pub(super) fn cpp_params(
        &mut self,
        open: usize,
        close: usize,
    ) -> Result<Vec<(usize, Option<String>)>, AnalysisFault> {
        let mut params = Vec::new();
        let mut k = open + 1;
        while k < close {
            let segment_end = self.find_at_depth(k, |t| t.is_punct(",")).min(close);
            let declarator_end = self
                .find_at_depth(k, |t| t.is_punct(",") || t.is_punct("=") || t.is_punct("["))
                .min(segment_end);

            let name = match self.cpp_type_at(k) {
                Some(cpp_type) => {
                    let mut m = cpp_type.end;
                    while self
                        .tok(m)
                        .is_some_and(|t| t.is_punct("*") || t.is_punct("&") || t.is_punct("&&") || t.is_keyword("const"))
                    {
                        m += 1;
                    }
                    Some(m).filter(|&m| m < declarator_end && self.token(m).is_ok_and(|t| t.is_identifier()))
                }
                // Types this file never declared, such as `Node* next`.
                None => declarator_end
                    .checked_sub(1)
                    .filter(|&m| m > k && self.token(m).is_ok_and(|t| t.is_identifier())),
            };
            if let Some(name) = name {
                let mut data_type = self.text_between(k, name);
                if self.is_punct_at(name + 1, "[") {
                    data_type.push_str("[]");
                }
                self.mark_opaque(k, name - 1);
                params.push((name, Some(data_type)));
            }
            k = segment_end + 1;
        }
        Ok(params)
    }

    /// Constructors and destructors, in the class body or out of it.
    fn cpp_constructor(&mut self, i: usize) -> Result<Option<usize>, AnalysisFault> {
        let token = self.token(i)?;
        if self.current_kind() == ScopeKind::Class {
            if token.is_identifier()
                && self.is_punct_at(i + 1, "(")
                && self.current_scope_name() == Some(token.text.as_str())
            {
                return self.cpp_function(i, i + 1, None, None).map(Some);
            }
            if token.is_punct("~") && self.tok(i + 1).is_some_and(|t| t.is_identifier()) && self.is_punct_at(i + 2, "(") {
                return self.cpp_function(i, i + 2, None, None).map(Some);
            }
        }
        if token.is_identifier() && self.is_punct_at(i + 1, "::") {
            if self.tok(i + 2).is_some_and(|t| t.text == token.text) && self.is_punct_at(i + 3, "(") {
                return self.cpp_function(i + 2, i + 3, None, Some(i)).map(Some);
            }
            if self.is_punct_at(i + 2, "~") && self.is_punct_at(i + 4, "(") {
                return self.cpp_function(i + 2, i + 4, None, Some(i)).map(Some);
            }
        }
        Ok(None)
    }

    // ==================== Classes and Types ====================

    fn cpp_class(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let keyword = self.token(i)?.text.clone();
        let name = self.tok(i + 1).filter(|t| t.is_identifier()).map(|_| i + 1);
        if let Some(index) = name {
            let text = self.token(index)?.text.clone();
            self.type_names.insert(text);
            // `struct Point p;` declares a variable.
            if self
                .tok(index + 1)
                .is_some_and(|t| t.is_identifier() || t.is_punct("*"))
            {
                return self.cpp_typed_declaration(i);
            }
        }

        let j = self.find_at_depth(i + 1, |t| t.is_punct("{") || t.is_punct(";"));
        let body = self.is_punct_at(j, "{");
        let scope_name = match name {
            Some(index) => {
                let mut entry = self.entry_at(index, SymbolKind::Class)?.with_type(keyword.as_str());
                entry.forward = !body;
                let scope_name = entry.name.clone();
                self.declare(entry);
                scope_name
            }
            None => keyword,
        };
        if !body {
            return Ok(j + 1);
        }
        let end = self
            .group_end(j)
            .unwrap_or(self.tokens.len().saturating_sub(1));
        self.claimed.insert(j);
        let range = self.span(j, end);
        self.table.enter_scope(scope_name, ScopeKind::Class, range);
        Ok(j + 1)
    }

    /// `enum [class] Name { A, B = 2 }`: enumerators are constants.
    fn cpp_enum(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let mut j = i + 1;
        if self.is_keyword_at(j, "class") || self.is_keyword_at(j, "struct") {
            j += 1;
        }
        let name = self.tok(j).filter(|t| t.is_identifier()).map(|_| j);
        let mut enum_type = "int".to_string();
        if let Some(index) = name {
            let entry = self.entry_at(index, SymbolKind::Class)?.with_type("enum");
            enum_type = entry.name.clone();
            self.type_names.insert(entry.name.clone());
            self.declare(entry);
        }
        let brace = self.find_at_depth(j, |t| t.is_punct("{") || t.is_punct(";"));
        if !self.is_punct_at(brace, "{") {
            return Ok(brace + 1);
        }
        let end = self
            .group_end(brace)
            .unwrap_or(self.tokens.len().saturating_sub(1));
        let mut k = brace + 1;
        while k < end {
            if self.token(k)?.is_identifier() {
                let entry = self
                    .entry_at(k, SymbolKind::Constant)?
                    .with_type(enum_type.as_str())
                    .initialized(true);
                self.declare(entry);
            }
            k = self.find_at_depth(k, |t| t.is_punct(",")).min(end) + 1;
        }
        Ok(end + 1)
    }

    /// `template<typename T, int N>`: the parameters are hidden names
    /// visible to the rest of the file.
    fn cpp_template(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let Some(close) = self.angle_end(i + 1) else {
            return Ok(i + 1);
        };
        for k in i + 2..close {
            let token = self.token(k)?;
            let Some(previous) = self.previous(k) else {
                continue;
            };
            if !token.is_identifier() {
                continue;
            }
            let kind = if previous.is_any_keyword(&["typename", "class"]) {
                self.type_names.insert(token.text.clone());
                SymbolKind::Class
            } else if previous.category == TokenCategory::ReservedWord {
                SymbolKind::Constant
            } else {
                continue;
            };
            let mut entry = self.entry_at(k, kind)?.initialized(true);
            entry.builtin = true;
            self.declaration_sites.insert(entry.offset);
            // Template parameters may repeat across templates.
            let _ = self.table.define_in(ScopeId::GLOBAL, entry);
        }

        let after = close + 1;
        if self.is_keyword_at(after, "class") || self.is_keyword_at(after, "struct") {
            return self.cpp_class(after);
        }
        if let Some(next) = self.cpp_constructor(after)? {
            return Ok(next);
        }
        self.cpp_typed_declaration(after)
    }

    /// `using namespace x;`, `using std::cout;` and `using Alias = T;`.
    fn cpp_using(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let semicolon = self.find_at_depth(i, |t| t.is_punct(";"));
        if self.tok(i + 1).is_some_and(|t| t.is_identifier()) && self.is_punct_at(i + 2, "=") {
            let entry = self
                .entry_at(i + 1, SymbolKind::Class)?
                .with_type(self.text_between(i + 3, semicolon));
            self.type_names.insert(entry.name.clone());
            self.declare(entry);
            self.mark_opaque(i + 3, semicolon.saturating_sub(1));
        } else {
            self.mark_opaque(i, semicolon);
        }
        Ok(semicolon + 1)
    }

    /// `typedef <type> Name;`
    fn cpp_typedef(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let semicolon = self.find_at_depth(i, |t| t.is_punct(";"));
        let name = (i + 1..semicolon)
            .rev()
            .find(|&k| self.token(k).is_ok_and(|t| t.is_identifier()));
        if let Some(index) = name {
            self.mark_opaque(i + 1, index.saturating_sub(1));
            let entry = self.entry_at(index, SymbolKind::Class)?.with_type("typedef");
            self.type_names.insert(entry.name.clone());
            self.declare(entry);
        }
        Ok(semicolon + 1)
    }

    // ==================== Preprocessor ====================

    /// `#define NAME value` declares a constant, `#define NAME(x) ...` a
    /// function-like macro.
    fn cpp_directive(&mut self, i: usize) -> Result<(), AnalysisFault> {
        let token = self.token(i)?;
        let body = token.text.trim_start_matches('#').trim_start();
        let Some(rest) = body.strip_prefix("define") else {
            return Ok(());
        };
        let definition = rest.trim_start();
        if definition.len() == rest.len() {
            return Ok(());
        }
        let name_len = definition
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(definition.len());
        let name = &definition[..name_len];
        if name.is_empty() {
            return Ok(());
        }
        let function_like = definition[name_len..].starts_with('(');
        let value = if function_like {
            definition.find(')').map_or("", |p| &definition[p + 1..])
        } else {
            &definition[name_len..]
        }
        .trim();

        let column_offset = offset_u32(token.text.len() - definition.len())?;
        let position = Position::new(
            token.line,
            token.column + column_offset,
            token.offset + column_offset,
        );
        let kind = if function_like {
            SymbolKind::Function
        } else {
            SymbolKind::Constant
        };
        let mut entry = SymbolEntry::new(name, kind, position).initialized(true);
        entry.data_type = if value.parse::<i64>().is_ok() {
            Some("int".to_string())
        } else if value.parse::<f64>().is_ok() {
            Some("double".to_string())
        } else if value.starts_with('"') {
            Some("string".to_string())
        } else {
            None
        };
        self.declare_in(ScopeId::GLOBAL, entry);
        Ok(())
    }

    // ==================== Lambdas ====================

    fn cpp_lambda_start(&self, i: usize) -> bool {
        let after_capture = self.group_end(i).map(|close| close + 1);
        self.previous(i).is_some_and(|p| {
            p.is_punct("=") || p.is_punct("(") || p.is_punct(",") || p.is_keyword("return")
        }) && after_capture.is_some_and(|k| self.is_punct_at(k, "(") || self.is_punct_at(k, "{"))
    }

    fn cpp_lambda(&mut self, i: usize) -> Result<usize, AnalysisFault> {
        let Some(capture_end) = self.group_end(i) else {
            return Ok(i + 1);
        };
        let (params, header_end) = if self.is_punct_at(capture_end + 1, "(") {
            match self.group_end(capture_end + 1) {
                Some(close) => (self.cpp_params(capture_end + 1, close)?, close),
                None => return Ok(i + 1),
            }
        } else {
            (Vec::new(), capture_end)
        };
        let brace = self.find_at_depth(header_end + 1, |t| t.is_punct("{") || t.is_punct(";"));
        if !self.is_punct_at(brace, "{") {
            return Ok(header_end + 1);
        }
        let end = self
            .group_end(brace)
            .unwrap_or(self.tokens.len().saturating_sub(1));
        self.claimed.insert(brace);
        let range = self.span(i, end);
        self.table.enter_scope("lambda", ScopeKind::Function, range);
        self.declare_params(&params)?;
        Ok(header_end + 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::language::Language;
    use crate::semantic::tests::run;
    use crate::semantic::SymbolKind;

    #[test]
    fn test_functions_and_locals() {
        let source = "#include <iostream>\nusing namespace std;\n\nint add(int a, int b) {\n    return a + b;\n}\n\nint main() {\n    int x = 5, y = 10;\n    cout << add(x, y) << endl;\n    return 0;\n}\n";
        let (diags, symbols) = run(source, Language::Cpp);
        assert!(diags.is_empty(), "{diags:?}");
        let names: Vec<_> = symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            names,
            [
                ("add", SymbolKind::Function),
                ("a", SymbolKind::Parameter),
                ("b", SymbolKind::Parameter),
                ("main", SymbolKind::Function),
                ("x", SymbolKind::Variable),
                ("y", SymbolKind::Variable),
            ]
        );
        assert_eq!(symbols[0].return_type.as_deref(), Some("int"));
        assert_eq!(symbols[0].parameters[1].data_type.as_deref(), Some("int"));
        assert_eq!(symbols[4].scope, "main");
    }

    #[test]
    fn test_declaration_after_missing_semicolon() {
        let source = "int main() {\n    int x = 5\n    int y = 6;\n    return x + y;\n}\n";
        let (diags, symbols) = run(source, Language::Cpp);
        assert!(diags.iter().all(|d| !d.is_error()), "{diags:?}");
        assert!(symbols.iter().any(|s| s.name == "y" && s.scope == "main"));
    }

    #[test]
    fn test_prototype_then_definition() {
        let source = "int square(int n);\n\nint main() {\n    return square(3);\n}\n\nint square(int n) {\n    return n * n;\n}\n";
        let (diags, symbols) = run(source, Language::Cpp);
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(symbols.iter().filter(|s| s.name == "square").count(), 1);
    }

    #[test]
    fn test_class_with_out_of_class_method() {
        let source = "class Counter {\npublic:\n    Counter();\n    void bump();\nprivate:\n    int count;\n};\n\nCounter::Counter() : count(0) {}\n\nvoid Counter::bump() {\n    count++;\n}\n\nint main() {\n    Counter c;\n    c.bump();\n    return 0;\n}\n";
        let (diags, symbols) = run(source, Language::Cpp);
        assert!(diags.is_empty(), "{diags:?}");
        let bump = symbols.iter().find(|s| s.name == "bump").unwrap();
        assert_eq!(bump.kind, SymbolKind::Method);
        assert_eq!(bump.scope, "Counter");
        let c = symbols.iter().find(|s| s.name == "c").unwrap();
        assert_eq!(c.data_type.as_deref(), Some("Counter"));
    }

    #[test]
    fn test_define_and_enum_constants() {
        let source = "#define LIMIT 10\nenum Color { RED, GREEN = 2 };\n\nint main() {\n    Color c = GREEN;\n    return LIMIT + c + RED;\n}\n";
        let (diags, symbols) = run(source, Language::Cpp);
        assert!(diags.is_empty(), "{diags:?}");
        let limit = &symbols[0];
        assert_eq!(limit.name, "LIMIT");
        assert_eq!(limit.kind, SymbolKind::Constant);
        assert_eq!(limit.data_type.as_deref(), Some("int"));
        assert_eq!((limit.line, limit.column), (1, 9));
        let green = symbols.iter().find(|s| s.name == "GREEN").unwrap();
        assert_eq!(green.data_type.as_deref(), Some("Color"));
    }

    #[test]
    fn test_pointer_and_reference_types() {
        let source = "int main() {\n    int value = 1;\n    int* p = &value;\n    int& r = value;\n    return *p + r;\n}\n";
        let (diags, symbols) = run(source, Language::Cpp);
        assert!(diags.is_empty(), "{diags:?}");
        let types: Vec<_> = symbols.iter().filter_map(|s| s.data_type.as_deref()).collect();
        assert_eq!(types, ["int", "int", "int*", "int&"]);
    }

    #[test]
    fn test_range_for_and_library_types() {
        let source = "#include <iostream>\n#include <vector>\nint main() {\n    std::vector<int> items = {1, 2};\n    for (int item : items) {\n        std::cout << item;\n    }\n    return 0;\n}\n";
        let (diags, symbols) = run(source, Language::Cpp);
        assert!(diags.is_empty(), "{diags:?}");
        let items = symbols.iter().find(|s| s.name == "items").unwrap();
        assert_eq!(items.data_type.as_deref(), Some("std::vector<int>"));
        let item = symbols.iter().find(|s| s.name == "item").unwrap();
        assert_eq!(item.scope, "for");
    }
}
