//! Symbol table for semantic analysis.
//!
//! The symbol table tracks every declared name and the scope it lives in.
//! It supports:
//!
//! - **Nested scopes**: an arena of scopes, global first, each pointing at
//!   its parent by index
//! - **Source ranges**: each scope knows the byte range it covers, so the
//!   verification pass can replay scope entry and exit in token order
//! - **Case rules**: lookups follow the language's case sensitivity
//! - **Built-ins**: names the language provides, stored in the global
//!   scope but left out of the reported table
//!
//! # Scope Rules
//!
//! Scopes are only ever created below an existing scope, so a parent
//! index is always smaller than its child's and the tree cannot contain
//! a cycle. The global scope is index 0 and is never left.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use crate::diagnostics::{AnalysisFault, Position};
use crate::language::{Builtin, Language};

/// Unique identifier for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    /// The global scope ID (always 0).
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a symbol in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

/// What introduced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    /// A function, method, procedure or lambda.
    Function,
    /// A class, struct or record body.
    Class,
    /// Any other block (`{ }`, loop headers, `catch`, comprehensions).
    Block,
}

/// The kind of symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Variable,
    Function,
    Class,
    Constant,
    Parameter,
    Method,
    Keyword,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Constant => "constant",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Method => "method",
            SymbolKind::Keyword => "keyword",
        }
    }

    /// Functions, methods and classes.
    pub fn is_callable(self) -> bool {
        matches!(
            self,
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Class
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parameter of a function symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// A declared name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolEntry {
    /// The name as written at the declaration.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub data_type: Option<String>,
    /// Name of the declaring scope.
    pub scope: String,
    pub line: u32,
    pub column: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParamInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    pub is_initialized: bool,
    pub is_used: bool,
    pub is_constant: bool,

    /// Byte offset of the declaring token.
    #[serde(skip)]
    pub offset: u32,
    /// Uses at or after this offset see the declaration.
    #[serde(skip)]
    pub visible_from: u32,
    #[serde(skip)]
    pub scope_id: ScopeId,
    /// Provided by the language rather than declared.
    #[serde(skip)]
    pub builtin: bool,
    /// A prototype or forward declaration still waiting for its body.
    #[serde(skip)]
    pub forward: bool,
}

impl SymbolEntry {
    pub fn new(name: impl Into<String>, kind: SymbolKind, position: Position) -> Self {
        Self {
            name: name.into(),
            kind,
            data_type: None,
            scope: String::new(),
            line: position.line,
            column: position.column,
            parameters: Vec::new(),
            return_type: None,
            is_initialized: matches!(kind, SymbolKind::Parameter) || kind.is_callable(),
            is_used: false,
            is_constant: kind == SymbolKind::Constant,
            offset: position.offset,
            visible_from: position.offset,
            scope_id: ScopeId::GLOBAL,
            builtin: false,
            forward: false,
        }
    }

    pub fn with_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn initialized(mut self, initialized: bool) -> Self {
        self.is_initialized = self.is_initialized || initialized;
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn from_builtin(builtin: &Builtin) -> Self {
        let mut entry = SymbolEntry::new(builtin.name, builtin.kind, Position::START);
        entry.data_type = builtin.data_type.map(str::to_string);
        entry.scope = GLOBAL_NAME.to_string();
        entry.is_initialized = true;
        entry.is_used = true;
        entry.builtin = true;
        entry.visible_from = 0;
        entry
    }
}

const GLOBAL_NAME: &str = "global";

/// A single scope.
#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Nesting depth, 0 for the global scope.
    pub level: u32,
    /// Byte range of the source covered by this scope.
    pub range: Range<u32>,
    /// Symbols declared here, keyed by normalized name.
    symbols: HashMap<String, SymbolId>,
}

impl Scope {
    pub fn contains(&self, offset: u32) -> bool {
        self.range.contains(&offset)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// The complete symbol table for one analysis run.
///
/// Entries are append-only: they are flagged as used or initialized in
/// place but never removed.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    entries: Vec<SymbolEntry>,
    current: ScopeId,
    case_sensitive: bool,
    /// Names a scope rebinds in the global scope (Python `global x`).
    global_names: HashMap<ScopeId, Vec<String>>,
}

impl SymbolTable {
    /// Creates a table with only the global scope.
    pub fn new(language: Language) -> Self {
        Self {
            scopes: vec![Scope {
                name: GLOBAL_NAME.to_string(),
                kind: ScopeKind::Global,
                parent: None,
                level: 0,
                range: 0..u32::MAX,
                symbols: HashMap::new(),
            }],
            entries: Vec::new(),
            current: ScopeId::GLOBAL,
            case_sensitive: language.profile().case_sensitive(),
            global_names: HashMap::new(),
        }
    }

    /// Creates a table whose global scope holds the language's built-ins.
    pub fn with_builtins(language: Language) -> Self {
        let mut table = Self::new(language);
        for builtin in language.profile().builtin_symbols() {
            // Built-in tables do not repeat names, and a repeat is harmless.
            let _ = table.define_in(ScopeId::GLOBAL, SymbolEntry::from_builtin(builtin));
        }
        table
    }

    fn key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        }
    }

    // ==================== Scopes ====================

    /// Enters a new scope below the current one and returns its ID.
    pub fn enter_scope(&mut self, name: impl Into<String>, kind: ScopeKind, range: Range<u32>) -> ScopeId {
        self.enter_scope_under(self.current, name, kind, range)
    }

    /// Enters a new scope below `parent`, which need not be the current
    /// scope (C++ `Class::method` bodies see the class members).
    pub fn enter_scope_under(
        &mut self,
        parent: ScopeId,
        name: impl Into<String>,
        kind: ScopeKind,
        range: Range<u32>,
    ) -> ScopeId {
        let level = self.scopes.get(parent.0).map_or(0, |s| s.level + 1);
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.into(),
            kind,
            parent: Some(parent),
            level,
            range,
            symbols: HashMap::new(),
        });
        self.current = id;
        id
    }

    /// Exits the current scope, returning to its parent.
    ///
    /// Does nothing at global scope.
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes.get(self.current.0).and_then(|s| s.parent) {
            self.current = parent;
        }
    }

    /// Leaves every scope whose range ends at or before `offset`.
    pub fn exit_scopes_ending_by(&mut self, offset: u32) {
        while self.current != ScopeId::GLOBAL
            && self
                .scopes
                .get(self.current.0)
                .is_some_and(|s| s.range.end <= offset)
        {
            self.exit_scope();
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn set_current_scope(&mut self, id: ScopeId) {
        self.current = id;
    }

    pub fn scope(&self, id: ScopeId) -> Result<&Scope, AnalysisFault> {
        self.scopes.get(id.0).ok_or(AnalysisFault::MissingScope(id.0))
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Moves the end of a scope's range, for scopes whose extent is only
    /// known after their contents were read.
    pub fn set_scope_end(&mut self, id: ScopeId, end: u32) -> Result<(), AnalysisFault> {
        let scope = self
            .scopes
            .get_mut(id.0)
            .ok_or(AnalysisFault::MissingScope(id.0))?;
        scope.range.end = end.max(scope.range.start);
        Ok(())
    }

    /// The innermost function (or the global scope) enclosing `id`.
    pub fn enclosing_function(&self, id: ScopeId) -> ScopeId {
        let mut cursor = Some(id);
        while let Some(scope_id) = cursor {
            match self.scopes.get(scope_id.0) {
                Some(scope) if matches!(scope.kind, ScopeKind::Function | ScopeKind::Global) => {
                    return scope_id;
                }
                Some(scope) => cursor = scope.parent,
                None => break,
            }
        }
        ScopeId::GLOBAL
    }

    /// Finds a scope by name below `parent` (used to attach out-of-class
    /// method bodies to their class).
    pub fn find_child_scope(&self, parent: ScopeId, name: &str) -> Option<ScopeId> {
        let key = self.key(name);
        self.scopes
            .iter()
            .enumerate()
            .find(|(_, s)| s.parent == Some(parent) && self.key(&s.name) == key)
            .map(|(i, _)| ScopeId(i))
    }

    // ==================== Symbols ====================

    /// Defines a symbol in the current scope.
    ///
    /// Returns `Err(existing)` if the scope already has this name.
    pub fn define(&mut self, entry: SymbolEntry) -> Result<SymbolId, SymbolId> {
        self.define_in(self.current, entry)
    }

    /// Defines a symbol in a specific scope.
    ///
    /// A declaration replaces a built-in of the same name, and completes
    /// a forward declaration of the same kind.
    pub fn define_in(&mut self, scope_id: ScopeId, mut entry: SymbolEntry) -> Result<SymbolId, SymbolId> {
        let key = self.key(&entry.name);
        let Some(scope) = self.scopes.get_mut(scope_id.0) else {
            return Err(SymbolId(usize::MAX));
        };
        if let Some(&existing) = scope.symbols.get(&key) {
            match self.entries.get_mut(existing.0) {
                Some(prior) if prior.builtin => {}
                Some(prior) if prior.forward && prior.kind == entry.kind => {
                    prior.forward = entry.forward;
                    return Ok(existing);
                }
                _ => return Err(existing),
            }
        }
        let id = SymbolId(self.entries.len());
        scope.symbols.insert(key, id);
        entry.scope_id = scope_id;
        entry.scope = scope.name.clone();
        self.entries.push(entry);
        Ok(id)
    }

    /// Looks up a name in one scope only.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let key = self.key(name);
        self.scopes.get(scope.0)?.symbols.get(&key).copied()
    }

    /// Looks up a name from `scope` outwards through its parents.
    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.chain(scope).find_map(|s| self.lookup_local(s, name))
    }

    /// Looks up a name from the current scope outwards.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.lookup_from(self.current, name)
    }

    /// The scope and its ancestors, innermost first.
    pub fn chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), |s| self.scopes.get(s.0).and_then(|s| s.parent))
            .filter(|s| s.0 < self.scopes.len())
    }

    pub fn get(&self, id: SymbolId) -> Result<&SymbolEntry, AnalysisFault> {
        self.entries.get(id.0).ok_or(AnalysisFault::MissingSymbol(id.0))
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Result<&mut SymbolEntry, AnalysisFault> {
        self.entries.get_mut(id.0).ok_or(AnalysisFault::MissingSymbol(id.0))
    }

    /// All entries, built-ins included, in declaration order.
    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    /// Declared symbols, without built-ins, in declaration order.
    pub fn user_symbols(&self) -> Vec<SymbolEntry> {
        self.entries.iter().filter(|e| !e.builtin).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records that assignments to `name` inside `scope` bind the global.
    pub fn add_global_name(&mut self, scope: ScopeId, name: &str) {
        let key = self.key(name);
        self.global_names.entry(scope).or_default().push(key);
    }

    pub fn is_global_name(&self, scope: ScopeId, name: &str) -> bool {
        let key = self.key(name);
        self.global_names
            .get(&scope)
            .is_some_and(|names| names.contains(&key))
    }
}

/// Replays scope entry and exit in token order.
///
/// Scopes are visited by the start of their range; a scope becomes
/// current when the walk reaches its start and is left once the walk
/// passes its end.
#[derive(Debug)]
pub struct ScopeWalker {
    order: Vec<ScopeId>,
    next: usize,
    stack: Vec<ScopeId>,
}

impl ScopeWalker {
    pub fn new(table: &SymbolTable) -> Self {
        let mut order: Vec<ScopeId> = (1..table.scopes.len()).map(ScopeId).collect();
        order.sort_by_key(|id| {
            let scope = &table.scopes[id.0];
            (scope.range.start, scope.level)
        });
        Self {
            order,
            next: 0,
            stack: Vec::new(),
        }
    }

    /// Returns the innermost open scope at `offset`. Offsets must be
    /// passed in non-decreasing order.
    pub fn advance(&mut self, table: &SymbolTable, offset: u32) -> ScopeId {
        while let Some(top) = self.stack.last() {
            if table.scopes[top.0].range.end <= offset {
                self.stack.pop();
            } else {
                break;
            }
        }
        while let Some(&id) = self.order.get(self.next) {
            let scope = &table.scopes[id.0];
            if scope.range.start > offset {
                break;
            }
            self.next += 1;
            if scope.range.end > offset {
                self.stack.push(id);
            }
        }
        self.stack.last().copied().unwrap_or(ScopeId::GLOBAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str, offset: u32) -> SymbolEntry {
        SymbolEntry::new(name, SymbolKind::Variable, Position::new(1, offset + 1, offset))
    }

    #[test]
    fn test_define_and_lookup_symbol() {
        let mut table = SymbolTable::new(Language::Cpp);
        let id = table.define(variable("x", 0).with_type("int")).unwrap();
        let found = table.lookup("x").unwrap();
        assert_eq!(found, id);
        assert_eq!(table.get(found).unwrap().data_type.as_deref(), Some("int"));
        assert_eq!(table.get(found).unwrap().scope, "global");
    }

    #[test]
    fn test_case_rules() {
        let mut pascal = SymbolTable::new(Language::Pascal);
        pascal.define(variable("MyVar", 0)).unwrap();
        assert!(pascal.lookup("MYVAR").is_some());
        assert!(pascal.lookup("myvar").is_some());

        let mut js = SymbolTable::new(Language::JavaScript);
        js.define(variable("myVar", 0)).unwrap();
        assert!(js.lookup("MyVar").is_none());
    }

    #[test]
    fn test_duplicate_symbol_error() {
        let mut table = SymbolTable::new(Language::Pascal);
        let first = table.define(variable("x", 0)).unwrap();
        let result = table.define(variable("X", 10));
        assert_eq!(result, Err(first));
    }

    #[test]
    fn test_declaration_shadows_builtin() {
        let mut table = SymbolTable::with_builtins(Language::Python);
        let builtin = table.lookup("list").unwrap();
        let user = table.define(variable("list", 4)).unwrap();
        assert_ne!(builtin, user);
        assert_eq!(table.lookup("list"), Some(user));
        assert!(!table.get(user).unwrap().builtin);
    }

    #[test]
    fn test_prototype_is_completed() {
        let mut table = SymbolTable::new(Language::Cpp);
        let mut prototype = SymbolEntry::new("add", SymbolKind::Function, Position::new(1, 5, 4));
        prototype.forward = true;
        let first = table.define(prototype).unwrap();
        let definition = SymbolEntry::new("add", SymbolKind::Function, Position::new(5, 5, 60));
        assert_eq!(table.define(definition.clone()), Ok(first));
        assert!(!table.get(first).unwrap().forward);
        assert_eq!(table.define(definition), Err(first));
    }

    #[test]
    fn test_scope_nesting() {
        let mut table = SymbolTable::new(Language::JavaScript);
        table.define(variable("g", 0)).unwrap();

        let function = table.enter_scope("f", ScopeKind::Function, 10..50);
        table.define(variable("l", 12)).unwrap();
        assert!(table.lookup("l").is_some());
        assert!(table.lookup("g").is_some());
        assert_eq!(table.scope(function).unwrap().level, 1);

        table.exit_scope();
        assert!(table.lookup("g").is_some());
        assert!(table.lookup("l").is_none());

        // Leaving global is a no-op.
        table.exit_scope();
        assert_eq!(table.current_scope(), ScopeId::GLOBAL);
    }

    #[test]
    fn test_exit_scopes_by_offset() {
        let mut table = SymbolTable::new(Language::Cpp);
        table.enter_scope("outer", ScopeKind::Function, 0..100);
        table.enter_scope("inner", ScopeKind::Block, 10..20);
        table.exit_scopes_ending_by(15);
        assert_eq!(table.scope(table.current_scope()).unwrap().name, "inner");
        table.exit_scopes_ending_by(20);
        assert_eq!(table.scope(table.current_scope()).unwrap().name, "outer");
        table.exit_scopes_ending_by(200);
        assert_eq!(table.current_scope(), ScopeId::GLOBAL);
    }

    #[test]
    fn test_builtins_are_not_reported() {
        let mut table = SymbolTable::with_builtins(Language::JavaScript);
        assert!(table.lookup("console").is_some());
        table.define(variable("x", 0)).unwrap();
        let reported = table.user_symbols();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].name, "x");
    }

    #[test]
    fn test_enclosing_function() {
        let mut table = SymbolTable::new(Language::JavaScript);
        let function = table.enter_scope("f", ScopeKind::Function, 0..100);
        let block = table.enter_scope("block", ScopeKind::Block, 10..20);
        assert_eq!(table.enclosing_function(block), function);
        assert_eq!(table.enclosing_function(ScopeId::GLOBAL), ScopeId::GLOBAL);
    }

    #[test]
    fn test_walker_replays_ranges() {
        let mut table = SymbolTable::new(Language::JavaScript);
        let f = table.enter_scope("f", ScopeKind::Function, 10..50);
        let b = table.enter_scope("block", ScopeKind::Block, 20..30);
        table.exit_scope();
        table.exit_scope();
        let g = table.enter_scope("g", ScopeKind::Function, 60..70);

        let mut walker = ScopeWalker::new(&table);
        assert_eq!(walker.advance(&table, 0), ScopeId::GLOBAL);
        assert_eq!(walker.advance(&table, 12), f);
        assert_eq!(walker.advance(&table, 25), b);
        assert_eq!(walker.advance(&table, 30), f);
        assert_eq!(walker.advance(&table, 55), ScopeId::GLOBAL);
        assert_eq!(walker.advance(&table, 65), g);
    }

    #[test]
    fn test_missing_ids_are_faults() {
        let table = SymbolTable::new(Language::Python);
        assert_eq!(
            table.scope(ScopeId(9)).unwrap_err(),
            AnalysisFault::MissingScope(9)
        );
        assert!(table.get(SymbolId(3)).is_err());
    }

    #[test]
    fn test_global_names() {
        let mut table = SymbolTable::new(Language::Python);
        let f = table.enter_scope("f", ScopeKind::Function, 0..10);
        table.add_global_name(f, "counter");
        assert!(table.is_global_name(f, "counter"));
        assert!(!table.is_global_name(ScopeId::GLOBAL, "counter"));
    }
}
