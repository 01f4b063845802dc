//! AST node definitions and the owning arena.

use crate::{BinaryOp, UnaryOp};
use la_arena::{Arena, Idx};
use sigh_common::Span;

/// Index of a node inside its [`Ast`] arena.
pub type NodeId = Idx<Node>;

/// A single syntax node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// What kind of built-in a synthetic declaration stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticKind {
    /// A primitive type name (`Int`, `Float`, ...).
    Type,
    /// A predefined constant (`true`, `false`, `null`).
    Variable,
    /// A built-in function (`print`).
    Function,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    // Roots and statements
    Root {
        statements: Vec<NodeId>,
    },
    Block {
        statements: Vec<NodeId>,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    If {
        condition: NodeId,
        true_branch: NodeId,
        false_branch: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    Return {
        expression: Option<NodeId>,
    },
    /// `born(f)` or `born(f, v)`; both children are references.
    Born {
        function: NodeId,
        variable: Option<NodeId>,
    },

    // Declarations
    VarDeclaration {
        name: String,
        ty: NodeId,
        initializer: NodeId,
    },
    /// A struct field: `var x: Int` with no initializer.
    FieldDeclaration {
        name: String,
        ty: NodeId,
    },
    Parameter {
        name: String,
        ty: NodeId,
    },
    /// Functions and methods; `is_method` is true for declarations inside a
    /// class body. The analyzer renames a method matching its class name to
    /// `<constructor>`.
    FunDeclaration {
        name: String,
        parameters: Vec<NodeId>,
        return_type: NodeId,
        body: NodeId,
        is_method: bool,
    },
    StructDeclaration {
        name: String,
        fields: Vec<NodeId>,
    },
    ClassDeclaration {
        name: String,
        parent: Option<String>,
        body: Vec<NodeId>,
    },
    /// A built-in installed into the root scope by the analyzer.
    Synthetic {
        name: String,
        kind: SyntheticKind,
    },

    // Types
    SimpleType {
        name: String,
    },
    ArrayType {
        element: NodeId,
    },
    UnbornType {
        inner: NodeId,
    },

    // Expressions
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    Reference {
        name: String,
    },
    /// `$Ref`: a struct constructor value.
    Constructor {
        reference: NodeId,
    },
    ArrayLiteral {
        elements: Vec<NodeId>,
    },
    Parenthesized {
        expression: NodeId,
    },
    FieldAccess {
        stem: NodeId,
        field: String,
    },
    ArrayAccess {
        array: NodeId,
        index: NodeId,
    },
    FunCall {
        function: NodeId,
        arguments: Vec<NodeId>,
    },
    /// `Daddy(args)`: call of the overridden parent method.
    DaddyCall {
        arguments: Vec<NodeId>,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Assignment {
        left: NodeId,
        right: NodeId,
    },
}

/// The syntax tree: an arena of nodes plus the root index.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Arena<Node>,
    pub root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.nodes.alloc(Node { kind, span })
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id].span
    }

    /// The name a declaration node introduces, if it is one.
    pub fn decl_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::VarDeclaration { name, .. }
            | NodeKind::FieldDeclaration { name, .. }
            | NodeKind::Parameter { name, .. }
            | NodeKind::FunDeclaration { name, .. }
            | NodeKind::StructDeclaration { name, .. }
            | NodeKind::ClassDeclaration { name, .. }
            | NodeKind::Synthetic { name, .. } => Some(name),
            _ => None,
        }
    }

    /// A short word for the kind of thing a declaration declares, used in
    /// resolution error messages.
    pub fn declared_thing(&self, id: NodeId) -> &'static str {
        match &self.nodes[id].kind {
            NodeKind::VarDeclaration { .. } => "variable",
            NodeKind::FieldDeclaration { .. } => "field",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::FunDeclaration { is_method: true, .. } => "method",
            NodeKind::FunDeclaration { .. } => "function",
            NodeKind::StructDeclaration { .. } => "struct",
            NodeKind::ClassDeclaration { .. } => "class",
            NodeKind::Synthetic { kind, .. } => match kind {
                SyntheticKind::Type => "type",
                SyntheticKind::Variable => "variable",
                SyntheticKind::Function => "function",
            },
            _ => "expression",
        }
    }

    /// Child nodes in source order, for tree walkers.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.nodes[id].kind {
            NodeKind::Root { statements }
            | NodeKind::Block { statements } => statements.clone(),
            NodeKind::ExpressionStatement { expression } => vec![*expression],
            NodeKind::If {
                condition,
                true_branch,
                false_branch,
            } => {
                let mut out = vec![*condition, *true_branch];
                out.extend(*false_branch);
                out
            }
            NodeKind::While { condition, body } => vec![*condition, *body],
            NodeKind::Return { expression } => expression.iter().copied().collect(),
            NodeKind::Born { function, variable } => {
                let mut out = vec![*function];
                out.extend(*variable);
                out
            }
            NodeKind::VarDeclaration { ty, initializer, .. } => vec![*ty, *initializer],
            NodeKind::FieldDeclaration { ty, .. } | NodeKind::Parameter { ty, .. } => vec![*ty],
            NodeKind::FunDeclaration {
                parameters,
                return_type,
                body,
                ..
            } => {
                let mut out = parameters.clone();
                out.push(*return_type);
                out.push(*body);
                out
            }
            NodeKind::StructDeclaration { fields, .. } => fields.clone(),
            NodeKind::ClassDeclaration { body, .. } => body.clone(),
            NodeKind::Synthetic { .. } => vec![],
            NodeKind::SimpleType { .. } => vec![],
            NodeKind::ArrayType { element } => vec![*element],
            NodeKind::UnbornType { inner } => vec![*inner],
            NodeKind::IntLiteral(_)
            | NodeKind::FloatLiteral(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::Reference { .. } => vec![],
            NodeKind::Constructor { reference } => vec![*reference],
            NodeKind::ArrayLiteral { elements } => elements.clone(),
            NodeKind::Parenthesized { expression } => vec![*expression],
            NodeKind::FieldAccess { stem, .. } => vec![*stem],
            NodeKind::ArrayAccess { array, index } => vec![*array, *index],
            NodeKind::FunCall {
                function,
                arguments,
            } => {
                let mut out = vec![*function];
                out.extend(arguments.iter().copied());
                out
            }
            NodeKind::DaddyCall { arguments } => arguments.clone(),
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Binary { left, right, .. } => vec![*left, *right],
            NodeKind::Assignment { left, right } => vec![*left, *right],
        }
    }

    /// A compact, source-like rendering of a node for error messages.
    pub fn describe(&self, id: NodeId) -> String {
        match &self.nodes[id].kind {
            NodeKind::IntLiteral(v) => v.to_string(),
            NodeKind::FloatLiteral(v) => v.to_string(),
            NodeKind::StringLiteral(s) => format!("\"{}\"", s),
            NodeKind::Reference { name } => name.clone(),
            NodeKind::Constructor { reference } => format!("${}", self.describe(*reference)),
            NodeKind::FieldAccess { stem, field } => {
                format!("{}.{}", self.describe(*stem), field)
            }
            NodeKind::ArrayAccess { array, .. } => format!("{}[…]", self.describe(*array)),
            NodeKind::FunCall { function, .. } => format!("{}(…)", self.describe(*function)),
            NodeKind::DaddyCall { .. } => "Daddy(…)".to_string(),
            NodeKind::Parenthesized { expression } => format!("({})", self.describe(*expression)),
            NodeKind::SimpleType { name } => name.clone(),
            NodeKind::ArrayType { element } => format!("{}[]", self.describe(*element)),
            NodeKind::UnbornType { inner } => format!("Unborn<{}>", self.describe(*inner)),
            other => self
                .decl_name(id)
                .map(str::to_owned)
                .unwrap_or_else(|| kind_word(other).to_string()),
        }
    }
}

fn kind_word(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::ArrayLiteral { .. } => "array literal",
        NodeKind::Binary { .. } => "binary expression",
        NodeKind::Unary { .. } => "unary expression",
        NodeKind::Assignment { .. } => "assignment",
        NodeKind::Block { .. } => "block",
        NodeKind::If { .. } => "if statement",
        NodeKind::While { .. } => "while statement",
        NodeKind::Return { .. } => "return statement",
        NodeKind::Born { .. } => "born statement",
        _ => "expression",
    }
}
