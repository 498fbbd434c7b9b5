//! Parse tree definitions.
//!
//! The parse tree is a loose, language-neutral structure: one [`ParseNode`]
//! per recognized construct, with a [`NodeKind`], an optional value (a name,
//! an operator, a literal) and owned children.
//!
//! # Structure
//!
//! ```text
//! Vec<ParseNode>                       (one per top-level statement)
//! ├── FunctionDeclaration "greet"
//! │   ├── Parameters
//! │   │   └── Parameter "name"
//! │   └── Block
//! │       └── Expression
//! │           ├── Call "console.log"
//! │           └── ...
//! └── VariableDeclaration "let"
//!     ├── Identifier "x"
//!     └── Expression
//! ```
//!
//! # Design Decisions
//!
//! - **Owned nodes**: each node owns its children. There are no parent
//!   pointers; the tree is built once and read afterwards.
//! - **Position on every node**: the line and column of the first token of
//!   the construct.
//! - **Shallow expressions**: expressions are flat lists of terms, not
//!   precedence trees.

use serde::Serialize;
use std::fmt;

use crate::diagnostics::Position;

/// What construct a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    // Declarations
    FunctionDeclaration,
    MethodDeclaration,
    ClassDeclaration,
    VariableDeclaration,
    ConstantDeclaration,
    TypeDeclaration,
    ProgramDeclaration,
    UsesClause,
    Import,
    Directive,

    // Statements
    Statement,
    Assignment,
    ControlStructure,
    Block,
    Return,

    // Parts
    Parameters,
    Parameter,
    Condition,
    Body,

    // Expressions
    Expression,
    Call,
    Identifier,
    Literal,
    Operator,

    // SQL
    SelectStatement,
    CreateStatement,
    ColumnDefinitions,
    ColumnDefinition,
    DataManipulation,

    // Markup
    Doctype,
    Element,
    Attribute,
    Text,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::FunctionDeclaration => "FunctionDeclaration",
            NodeKind::MethodDeclaration => "MethodDeclaration",
            NodeKind::ClassDeclaration => "ClassDeclaration",
            NodeKind::VariableDeclaration => "VariableDeclaration",
            NodeKind::ConstantDeclaration => "ConstantDeclaration",
            NodeKind::TypeDeclaration => "TypeDeclaration",
            NodeKind::ProgramDeclaration => "ProgramDeclaration",
            NodeKind::UsesClause => "UsesClause",
            NodeKind::Import => "Import",
            NodeKind::Directive => "Directive",
            NodeKind::Statement => "Statement",
            NodeKind::Assignment => "Assignment",
            NodeKind::ControlStructure => "ControlStructure",
            NodeKind::Block => "Block",
            NodeKind::Return => "Return",
            NodeKind::Parameters => "Parameters",
            NodeKind::Parameter => "Parameter",
            NodeKind::Condition => "Condition",
            NodeKind::Body => "Body",
            NodeKind::Expression => "Expression",
            NodeKind::Call => "Call",
            NodeKind::Identifier => "Identifier",
            NodeKind::Literal => "Literal",
            NodeKind::Operator => "Operator",
            NodeKind::SelectStatement => "SelectStatement",
            NodeKind::CreateStatement => "CreateStatement",
            NodeKind::ColumnDefinitions => "ColumnDefinitions",
            NodeKind::ColumnDefinition => "ColumnDefinition",
            NodeKind::DataManipulation => "DataManipulation",
            NodeKind::Doctype => "Doctype",
            NodeKind::Element => "Element",
            NodeKind::Attribute => "Attribute",
            NodeKind::Text => "Text",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of the parse tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParseNode>,
    pub line: u32,
    pub column: u32,
}

impl ParseNode {
    /// Creates a node with no value and no children.
    pub fn new(kind: NodeKind, position: Position) -> Self {
        Self {
            kind,
            value: None,
            children: Vec::new(),
            line: position.line,
            column: position.column,
        }
    }

    /// Creates a node carrying a value.
    pub fn leaf(kind: NodeKind, value: impl Into<String>, position: Position) -> Self {
        Self::new(kind, position).with_value(value)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_child(mut self, child: ParseNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: ParseNode) {
        self.children.push(child);
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Number of nodes in this subtree, itself included.
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.children.iter());
        }
        total
    }

    /// All nodes of `kind` in this subtree, in pre-order.
    pub fn find_all(&self, kind: NodeKind) -> Vec<&ParseNode> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.kind == kind {
                found.push(node);
            }
            stack.extend(node.children.iter().rev());
        }
        found
    }

    pub fn child(&self, kind: NodeKind) -> Option<&ParseNode> {
        self.children.iter().find(|c| c.kind == kind)
    }
}

/// Total node count of a forest.
pub fn count_nodes(nodes: &[ParseNode]) -> usize {
    nodes.iter().map(ParseNode::count).sum()
}

/// All nodes of `kind` across a forest, in pre-order.
pub fn find_all(nodes: &[ParseNode], kind: NodeKind) -> Vec<&ParseNode> {
    nodes.iter().flat_map(|n| n.find_all(kind)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParseNode {
        ParseNode::leaf(NodeKind::FunctionDeclaration, "f", Position::START)
            .with_child(
                ParseNode::new(NodeKind::Parameters, Position::START).with_child(ParseNode::leaf(
                    NodeKind::Parameter,
                    "a",
                    Position::START,
                )),
            )
            .with_child(ParseNode::new(NodeKind::Block, Position::START))
    }

    #[test]
    fn test_count() {
        assert_eq!(sample().count(), 4);
        assert_eq!(count_nodes(&[sample(), sample()]), 8);
    }

    #[test]
    fn test_find_all() {
        let tree = [sample()];
        let params = find_all(&tree, NodeKind::Parameter);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].value(), Some("a"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "FunctionDeclaration");
        assert_eq!(json["value"], "f");
        assert_eq!(json["children"][0]["type"], "Parameters");
        assert!(json["children"][1].get("children").is_none());
    }
}
