//! The semantic analyzer.
//!
//! A two-phase walk over the AST. Pre-visits build scopes, declare names,
//! and install reactor rules; post-visits pop the scope stack. All typing
//! constraints between nodes go through the reactor so declaration order
//! (beyond lexical scoping) does not matter.
//!
//! The walk maintains three pieces of state besides the scope stack:
//! - the *inference context*, the innermost variable declaration or call
//!   whose expected type disambiguates an empty array literal;
//! - the *thread index*, `0` on the main path and the declaring function's
//!   stable index inside an asynchronous function body;
//! - the *argument index* published on each call argument, which the empty
//!   array rule uses to pick the right parameter type.

use crate::reactor::{attr, Attr, AttrValue, Attribute, Reactor};
use crate::scopes::{DeclarationContext, ScopeArena, ScopeId, ScopeKind};
use sigh_common::Span;
use sigh_diagnostic::{Diagnostic, DiagnosticKind};
use sigh_syntax::{Ast, BinaryOp, NodeId, NodeKind, SyntheticKind};
use sigh_types::{
    common_supertype, is_assignable_to, is_comparable_to, AddField, ClassType, StructType, Type,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The decorated result of analysis: the scope graph, the attribute store,
/// and every collected diagnostic.
pub struct Analysis {
    pub scopes: ScopeArena,
    pub diagnostics: Vec<Diagnostic>,
    attrs: HashMap<Attribute, AttrValue>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn ty(&self, node: NodeId) -> Option<&Type> {
        match self.attrs.get(&attr(node, Attr::Type)) {
            Some(AttrValue::Type(ty)) => Some(ty),
            _ => None,
        }
    }

    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        match self.attrs.get(&attr(node, Attr::Scope)) {
            Some(AttrValue::Scope(scope)) => Some(*scope),
            _ => None,
        }
    }

    pub fn decl_of(&self, node: NodeId) -> Option<NodeId> {
        match self.attrs.get(&attr(node, Attr::Decl)) {
            Some(AttrValue::Node(decl)) => Some(*decl),
            _ => None,
        }
    }

    /// Thread index of a statement or expression; `0` means the main thread.
    pub fn thread_index(&self, node: NodeId) -> u64 {
        match self.attrs.get(&attr(node, Attr::ThreadIndex)) {
            Some(AttrValue::ThreadIndex(index)) => *index,
            _ => 0,
        }
    }

    /// The overridden method a method (or Daddy call) resolves to.
    pub fn parent_method(&self, node: NodeId) -> Option<NodeId> {
        match self.attrs.get(&attr(node, Attr::Parent)) {
            Some(AttrValue::MaybeNode(parent)) => *parent,
            Some(AttrValue::Node(parent)) => Some(*parent),
            _ => None,
        }
    }
}

/// Analyze a program. The AST is mutated in one place only: a method named
/// like its class is renamed to `<constructor>`.
pub fn analyze(ast: &mut Ast) -> Analysis {
    let mut analyzer = SemanticAnalyzer {
        reactor: Reactor::new(),
        scopes: ScopeArena::new(),
        scope: None,
        inference_context: None,
        thread_index: 0,
    };

    if let Some(root) = ast.root {
        analyzer.walk(ast, root);
    }

    let SemanticAnalyzer {
        mut reactor, scopes, ..
    } = analyzer;
    reactor.run(ast, &scopes);

    let (attrs, errors) = reactor.into_parts();
    let diagnostics = errors
        .into_iter()
        .map(|error| {
            Diagnostic::error(DiagnosticKind::Analysis, ast.span(error.node), error.message)
        })
        .collect();

    Analysis {
        scopes,
        attrs,
        diagnostics,
    }
}

/// Stable thread index derived from an async function declaration.
pub fn declaration_thread_index(node: NodeId) -> u64 {
    u32::from(node.into_raw()) as u64 + 1
}

struct SemanticAnalyzer {
    reactor: Reactor,
    scopes: ScopeArena,
    /// Current scope during the walk.
    scope: Option<ScopeId>,
    /// Innermost node able to give an empty array literal its type.
    inference_context: Option<NodeId>,
    /// Thread index tagged onto nodes; non-zero inside async functions.
    thread_index: u64,
}

impl SemanticAnalyzer {
    fn walk(&mut self, ast: &mut Ast, node: NodeId) {
        self.pre_visit(ast, node);
        for child in ast.children(node) {
            self.walk(ast, child);
        }
        self.post_visit(ast, node);
    }

    fn current_scope(&self) -> ScopeId {
        self.scope.expect("the walk establishes a scope at the root")
    }

    fn pre_visit(&mut self, ast: &mut Ast, node: NodeId) {
        let kind = ast.kind(node).clone();
        match kind {
            NodeKind::Root { .. } => self.root(ast, node),
            NodeKind::Block { statements } => self.block(ast, node, &statements),
            NodeKind::VarDeclaration {
                name,
                ty,
                initializer,
            } => self.var_decl(ast, node, name, ty, initializer),
            NodeKind::FieldDeclaration { ty, .. } => self.field_decl(node, ty),
            NodeKind::Parameter { name, ty } => self.parameter(node, name, ty),
            NodeKind::FunDeclaration {
                name,
                parameters,
                return_type,
                body,
                is_method,
            } => self.fun_decl(ast, node, name, parameters, return_type, body, is_method),
            NodeKind::StructDeclaration { name, .. } => self.struct_decl(node, name),
            NodeKind::ClassDeclaration { name, parent, .. } => {
                self.class_decl(node, name, parent)
            }
            NodeKind::ExpressionStatement { .. } => {}
            NodeKind::If {
                condition,
                true_branch,
                false_branch,
            } => self.if_stmt(ast, node, condition, true_branch, false_branch),
            NodeKind::While { condition, .. } => self.while_stmt(node, condition),
            NodeKind::Return { expression } => self.return_stmt(ast, node, expression),
            NodeKind::Born { function, variable } => self.born_stmt(ast, node, function, variable),

            NodeKind::IntLiteral(_) => {
                self.reactor.set(attr(node, Attr::Type), AttrValue::Type(Type::Int));
            }
            NodeKind::FloatLiteral(_) => {
                self.reactor.set(attr(node, Attr::Type), AttrValue::Type(Type::Float));
            }
            NodeKind::StringLiteral(_) => {
                self.reactor
                    .set(attr(node, Attr::Type), AttrValue::Type(Type::String));
            }
            NodeKind::Reference { name } => self.reference(ast, node, name),
            NodeKind::Constructor { reference } => self.constructor(node, reference),
            NodeKind::ArrayLiteral { elements } => self.array_literal(ast, node, &elements),
            NodeKind::Parenthesized { expression } => {
                self.copy_rule(attr(node, Attr::Type), attr(expression, Attr::Type));
            }
            NodeKind::FieldAccess { stem, field } => self.field_access(node, stem, field),
            NodeKind::ArrayAccess { array, index } => self.array_access(node, array, index),
            NodeKind::FunCall {
                function,
                arguments,
            } => self.fun_call(ast, node, function, arguments),
            NodeKind::DaddyCall { arguments } => self.daddy_call(node, arguments),
            NodeKind::Unary { operand, .. } => self.unary(node, operand),
            NodeKind::Binary { op, left, right } => self.binary(node, op, left, right),
            NodeKind::Assignment { left, right } => self.assignment(node, left, right),

            NodeKind::SimpleType { name } => self.simple_type(node, name),
            NodeKind::ArrayType { element } => {
                self.reactor
                    .rule(vec![attr(node, Attr::Value)])
                    .using(vec![attr(element, Attr::Value)])
                    .by(move |cx| {
                        let element_ty = cx.ty(0);
                        cx.set(0, AttrValue::Type(Type::array(element_ty)));
                    });
            }
            NodeKind::UnbornType { inner } => {
                self.reactor
                    .rule(vec![attr(node, Attr::Value)])
                    .using(vec![attr(inner, Attr::Value)])
                    .by(move |cx| {
                        let inner_ty = cx.ty(0);
                        cx.set(0, AttrValue::Type(Type::unborn(inner_ty)));
                    });
            }
            NodeKind::Synthetic { .. } => {}
        }
    }

    fn post_visit(&mut self, ast: &mut Ast, node: NodeId) {
        match ast.kind(node) {
            NodeKind::Root { .. }
            | NodeKind::Block { .. }
            | NodeKind::ClassDeclaration { .. } => {
                self.scope = self.scopes.get(self.current_scope()).parent;
            }
            NodeKind::FunDeclaration { .. } => {
                self.scope = self.scopes.get(self.current_scope()).parent;
                self.thread_index = 0;
            }
            _ => {}
        }
    }

    /// Install a rule copying one attribute slot into another.
    fn copy_rule(&mut self, output: Attribute, input: Attribute) {
        self.reactor.rule(vec![output]).using(vec![input]).by(|cx| {
            let value = cx.get(0).clone();
            cx.set(0, value);
        });
    }

    // ── Scopes, declarations, statements ────────────────────────────

    fn root(&mut self, ast: &mut Ast, node: NodeId) {
        let scope = self.scopes.new_scope(node, None, ScopeKind::Root);
        self.scope = Some(scope);
        self.install_builtins(ast, scope);
        self.reactor
            .set(attr(node, Attr::Scope), AttrValue::Scope(scope));
    }

    /// The default scope: primitive type names, the boolean and null
    /// constants, and `print`.
    fn install_builtins(&mut self, ast: &mut Ast, scope: ScopeId) {
        let types = [
            ("Int", Type::Int),
            ("Float", Type::Float),
            ("Bool", Type::Bool),
            ("String", Type::String),
            ("Void", Type::Void),
            ("Type", Type::Type),
            ("Auto", Type::Auto),
        ];
        for (name, ty) in types {
            let decl = ast.alloc(
                NodeKind::Synthetic {
                    name: name.into(),
                    kind: SyntheticKind::Type,
                },
                Span::DUMMY,
            );
            self.scopes.declare(scope, name, decl);
            self.reactor
                .set(attr(decl, Attr::Type), AttrValue::Type(Type::Type));
            self.reactor
                .set(attr(decl, Attr::Declared), AttrValue::Type(ty));
        }

        let constants = [
            ("true", Type::Bool),
            ("false", Type::Bool),
            ("null", Type::Null),
        ];
        for (name, ty) in constants {
            let decl = ast.alloc(
                NodeKind::Synthetic {
                    name: name.into(),
                    kind: SyntheticKind::Variable,
                },
                Span::DUMMY,
            );
            self.scopes.declare(scope, name, decl);
            self.reactor
                .set(attr(decl, Attr::Type), AttrValue::Type(ty));
        }

        let print = ast.alloc(
            NodeKind::Synthetic {
                name: "print".into(),
                kind: SyntheticKind::Function,
            },
            Span::DUMMY,
        );
        self.scopes.declare(scope, "print", print);
        self.reactor.set(
            attr(print, Attr::Type),
            AttrValue::Type(Type::fun(Type::String, vec![Type::String])),
        );
    }

    fn block(&mut self, ast: &Ast, node: NodeId, statements: &[NodeId]) {
        let scope = self
            .scopes
            .new_scope(node, Some(self.current_scope()), ScopeKind::Ordinary);
        self.scope = Some(scope);
        self.reactor
            .set(attr(node, Attr::Scope), AttrValue::Scope(scope));
        self.reactor.set(
            attr(node, Attr::ThreadIndex),
            AttrValue::ThreadIndex(self.thread_index),
        );

        let deps = self.returns_dependencies(ast, statements);
        let count = deps.len();
        self.reactor
            .rule(vec![attr(node, Attr::Returns)])
            .using(deps)
            .by(move |cx| {
                let any = (0..count).any(|i| cx.boolean(i));
                cx.set(0, AttrValue::Bool(count != 0 && any));
            });
    }

    /// The statements whose `returns` attribute feeds a parent's `returns`.
    fn returns_dependencies(&self, ast: &Ast, statements: &[NodeId]) -> Vec<Attribute> {
        statements
            .iter()
            .filter(|&&stmt| {
                matches!(
                    ast.kind(stmt),
                    NodeKind::Block { .. } | NodeKind::If { .. } | NodeKind::Return { .. }
                )
            })
            .map(|&stmt| attr(stmt, Attr::Returns))
            .collect()
    }

    fn var_decl(&mut self, ast: &Ast, node: NodeId, name: String, ty: NodeId, initializer: NodeId) {
        self.inference_context = Some(node);
        self.reactor.set(
            attr(node, Attr::ThreadIndex),
            AttrValue::ThreadIndex(self.thread_index),
        );

        let scope = self.current_scope();
        self.scopes.declare(scope, &name, node);
        self.reactor
            .set(attr(node, Attr::Scope), AttrValue::Scope(scope));

        if matches!(ast.kind(initializer), NodeKind::ArrayLiteral { .. }) {
            // An array initializer may need the declared type to type itself
            // (empty literal), so the declaration type cannot wait on it.
            self.copy_rule(attr(node, Attr::Type), attr(ty, Attr::Value));
        } else {
            self.reactor
                .rule(vec![attr(node, Attr::Type)])
                .using(vec![attr(ty, Attr::Value), attr(initializer, Attr::Type)])
                .by(move |cx| {
                    let expected = cx.ty(0);
                    let actual = cx.ty(1);
                    let resolved = if matches!(expected, Type::Auto) {
                        actual
                    } else {
                        expected
                    };
                    cx.set(0, AttrValue::Type(resolved));
                });
        }

        self.reactor
            .rule(vec![])
            .using(vec![attr(ty, Attr::Value), attr(initializer, Attr::Type)])
            .by(move |cx| {
                let expected = cx.ty(0);
                let actual = cx.ty(1);

                if matches!(expected, Type::Auto) && matches!(actual, Type::Auto) {
                    cx.report(
                        format!("Cannot infer the type of variable `{}`: the initializer is also Auto", name),
                        node,
                    );
                }
                if matches!(expected, Type::Auto) && matches!(actual, Type::Array(_)) {
                    cx.report("Auto is not allowed for array variables", node);
                }

                if let Type::Class(class) = &expected {
                    let mut error = String::new();
                    if !class.can_be_assigned_with(&actual, &mut error) {
                        cx.report(error, initializer);
                    }
                } else if !is_assignable_to(&actual, &expected) {
                    cx.report(
                        format!(
                            "incompatible initializer type provided for variable `{}`: expected {} but got {}",
                            name, expected, actual
                        ),
                        initializer,
                    );
                }
            });
    }

    fn field_decl(&mut self, node: NodeId, ty: NodeId) {
        self.copy_rule(attr(node, Attr::Type), attr(ty, Attr::Value));
    }

    fn parameter(&mut self, node: NodeId, name: String, ty: NodeId) {
        let scope = self.current_scope(); // pushed by the function declaration
        self.reactor
            .set(attr(node, Attr::Scope), AttrValue::Scope(scope));
        self.scopes.declare(scope, &name, node);
        self.copy_rule(attr(node, Attr::Type), attr(ty, Attr::Value));
    }

    #[allow(clippy::too_many_arguments)]
    fn fun_decl(
        &mut self,
        ast: &mut Ast,
        node: NodeId,
        name: String,
        parameters: Vec<NodeId>,
        return_type: NodeId,
        body: NodeId,
        is_method: bool,
    ) {
        let declaring_scope = self.current_scope();

        // A method named after its class is the constructor.
        let mut name = name;
        if let NodeKind::ClassDeclaration {
            name: class_name, ..
        } = ast.kind(self.scopes.get(declaring_scope).node)
        {
            if *class_name == name {
                name = "<constructor>".to_string();
                if let NodeKind::FunDeclaration { name: n, .. } = &mut ast.node_mut(node).kind {
                    *n = name.clone();
                }
            }
        }

        if name == "Daddy" {
            self.reactor
                .error("Functions and methods can't be named 'Daddy'", node);
        }

        // Everything lexically inside an async function runs on its thread.
        if matches!(ast.kind(return_type), NodeKind::UnbornType { .. }) {
            self.thread_index = declaration_thread_index(node);
        }

        self.scopes.declare(declaring_scope, &name, node);
        let fn_scope = self
            .scopes
            .new_scope(node, Some(declaring_scope), ScopeKind::Ordinary);
        self.scope = Some(fn_scope);
        self.reactor
            .set(attr(node, Attr::Scope), AttrValue::Scope(fn_scope));
        self.reactor.set(
            attr(node, Attr::ThreadIndex),
            AttrValue::ThreadIndex(self.thread_index),
        );

        if is_method {
            self.resolve_parent_method(ast, node, fn_scope, &name);
        }

        let mut deps = vec![attr(return_type, Attr::Value)];
        deps.extend(parameters.iter().map(|&p| attr(p, Attr::Type)));
        let param_count = parameters.len();
        let fn_name = name.clone();
        self.reactor
            .rule(vec![attr(node, Attr::Type)])
            .using(deps)
            .by(move |cx| {
                let ret = cx.ty(0);
                let params: Vec<Type> = (1..=param_count).map(|i| cx.ty(i)).collect();
                if fn_name == "<constructor>" && !matches!(ret, Type::Void) {
                    cx.error("constructor must return void", return_type);
                } else {
                    cx.set(0, AttrValue::Type(Type::fun(ret, params)));
                }
            });

        self.reactor
            .rule(vec![])
            .using(vec![attr(body, Attr::Returns), attr(return_type, Attr::Value)])
            .by(move |cx| {
                let returns = cx.boolean(0);
                let mut ret = cx.ty(1);
                if let Type::Unborn(inner) = &ret {
                    ret = (**inner).clone();
                }
                if !returns && !matches!(ret, Type::Void) {
                    cx.report("Missing return in function.", node);
                }
            });
    }

    /// Point a method at the declaration it overrides (or at nothing).
    fn resolve_parent_method(&mut self, ast: &Ast, node: NodeId, fn_scope: ScopeId, name: &str) {
        let class_decl = {
            let mut current = Some(fn_scope);
            loop {
                let Some(id) = current else { break None };
                let scope = self.scopes.get(id);
                if matches!(ast.kind(scope.node), NodeKind::ClassDeclaration { .. }) {
                    break Some(scope.node);
                }
                current = scope.parent;
            }
        };

        let parent_class = class_decl.and_then(|decl| match ast.kind(decl) {
            NodeKind::ClassDeclaration {
                parent: Some(parent_name),
                ..
            } => self
                .scopes
                .lookup(ast, fn_scope, parent_name)
                .filter(|ctx| {
                    matches!(ast.kind(ctx.declaration), NodeKind::ClassDeclaration { .. })
                })
                .map(|ctx| ctx.declaration),
            _ => None,
        });

        match parent_class {
            None => {
                self.reactor
                    .set(attr(node, Attr::Parent), AttrValue::MaybeNode(None));
            }
            Some(parent_class) => {
                let method_name = name.to_string();
                self.reactor
                    .rule(vec![attr(node, Attr::Parent)])
                    .using(vec![attr(parent_class, Attr::Scope)])
                    .by(move |cx| {
                        let parent_scope = cx.scope(0);
                        let parent = cx
                            .scopes
                            .class_lookup(cx.ast, parent_scope, &method_name)
                            .filter(|ctx| {
                                matches!(
                                    cx.ast.kind(ctx.declaration),
                                    NodeKind::FunDeclaration { is_method: true, .. }
                                )
                            })
                            .map(|ctx| ctx.declaration);
                        cx.set(0, AttrValue::MaybeNode(parent));
                    });
            }
        }
    }

    fn struct_decl(&mut self, node: NodeId, name: String) {
        let scope = self.current_scope();
        self.scopes.declare(scope, &name, node);
        self.reactor
            .set(attr(node, Attr::Type), AttrValue::Type(Type::Type));
        self.reactor.set(
            attr(node, Attr::Declared),
            AttrValue::Type(Type::Struct(Arc::new(StructType { name, decl: node }))),
        );
    }

    fn class_decl(&mut self, node: NodeId, name: String, parent: Option<String>) {
        let declaring_scope = self.current_scope();
        self.scopes.declare(declaring_scope, &name, node);

        let class_scope = self.scopes.new_class_scope(node, declaring_scope, &name);
        self.scope = Some(class_scope);
        self.reactor
            .set(attr(node, Attr::Scope), AttrValue::Scope(class_scope));

        if !name.chars().next().is_some_and(char::is_uppercase) {
            self.reactor
                .error("Class name must start with a capital letter.", node);
        }

        // Resolve the ancestor chain once all classes are declared.
        let self_context = DeclarationContext {
            scope: declaring_scope,
            declaration: node,
        };
        let parent_name = parent;
        let class_name = name.clone();
        self.reactor
            .rule(vec![attr(node, Attr::Ancestors)])
            .by(move |cx| {
                let mut ancestors = vec![self_context];
                if let Some(parent_name) = parent_name {
                    match cx.scopes.lookup(cx.ast, class_scope, &parent_name) {
                        None => {
                            cx.report(format!("Undeclared ancestor `{}`.", parent_name), node);
                        }
                        Some(ctx)
                            if !matches!(
                                cx.ast.kind(ctx.declaration),
                                NodeKind::ClassDeclaration { .. }
                            ) =>
                        {
                            cx.report(format!("Parent `{}` is not a class.", parent_name), node);
                        }
                        Some(mut current) => {
                            let mut visited = HashSet::from([class_name.clone()]);
                            let mut path = class_name.clone();
                            loop {
                                let NodeKind::ClassDeclaration {
                                    name: ancestor_name,
                                    parent: ancestor_parent,
                                    ..
                                } = cx.ast.kind(current.declaration)
                                else {
                                    break;
                                };
                                path.push_str(&format!(" <- {}", ancestor_name));
                                if !visited.insert(ancestor_name.clone()) {
                                    cx.report(
                                        format!("Cyclic inheritance detected: {}", path),
                                        node,
                                    );
                                    break;
                                }
                                ancestors.push(current);
                                match ancestor_parent.as_ref().and_then(|grand| {
                                    cx.scopes.lookup(cx.ast, class_scope, grand)
                                }) {
                                    Some(next) => current = next,
                                    None => break,
                                }
                            }
                        }
                    }
                }
                cx.set(0, AttrValue::Ancestors(ancestors));
            });

        // The class type gathers every member along the ancestor chain, own
        // members first so overrides win.
        let type_class_name = name.clone();
        self.reactor
            .rule(vec![])
            .using(vec![attr(node, Attr::Ancestors)])
            .by(move |cx| {
                let ancestors = cx.ancestors(0);
                let mut member_names = Vec::new();
                let mut deps = Vec::new();
                for ancestor in &ancestors {
                    if let NodeKind::ClassDeclaration { body, .. } =
                        cx.ast.kind(ancestor.declaration)
                    {
                        for &member in body {
                            let member_name =
                                cx.ast.decl_name(member).unwrap_or_default().to_string();
                            member_names.push(member_name);
                            deps.push(attr(member, Attr::Type));
                        }
                    }
                }

                let class_name = type_class_name.clone();
                cx.rule(vec![attr(node, Attr::Type)]).using(deps).by(move |cx| {
                    let mut class_ty = ClassType::new(class_name);
                    for (i, member_name) in member_names.iter().enumerate() {
                        let member_ty = cx.ty(i);
                        match class_ty.add_field(member_name, member_ty.clone()) {
                            AddField::Added | AddField::SameSignature => {}
                            AddField::OverridesVariable => cx.report(
                                format!(
                                    "Cannot override variable `{}`: can only override methods.",
                                    member_name
                                ),
                                node,
                            ),
                            AddField::SignatureMismatch { existing } => cx.report(
                                format!(
                                    "Cannot override method `{}`: signature {} does not match the parent signature {}.",
                                    member_name, existing, member_ty
                                ),
                                node,
                            ),
                        }
                    }
                    cx.set(0, AttrValue::Type(Type::Class(Arc::new(class_ty))));
                });
            });

        self.copy_rule(attr(node, Attr::Declared), attr(node, Attr::Type));

        let ctor_class_name = name;
        self.reactor
            .rule(vec![attr(node, Attr::Constructor)])
            .by(move |cx| {
                match cx.scopes.class_lookup(cx.ast, class_scope, "<constructor>") {
                    None => cx.error(
                        format!("Missing constructor for class `{}`.", ctor_class_name),
                        node,
                    ),
                    Some(ctx) => cx.set(0, AttrValue::Node(ctx.declaration)),
                }
            });
    }

    fn if_stmt(
        &mut self,
        ast: &Ast,
        node: NodeId,
        condition: NodeId,
        true_branch: NodeId,
        false_branch: Option<NodeId>,
    ) {
        self.reactor
            .rule(vec![])
            .using(vec![attr(condition, Attr::Type)])
            .by(move |cx| {
                let ty = cx.ty(0);
                if !matches!(ty, Type::Bool) {
                    cx.report(
                        format!("If statement with a non-boolean condition of type: {}", ty),
                        condition,
                    );
                }
            });

        let mut branches = vec![true_branch];
        branches.extend(false_branch);
        let deps = self.returns_dependencies(ast, &branches);
        let count = deps.len();
        self.reactor
            .rule(vec![attr(node, Attr::Returns)])
            .using(deps)
            .by(move |cx| {
                let all = (0..count).all(|i| cx.boolean(i));
                cx.set(0, AttrValue::Bool(count == 2 && all));
            });
    }

    fn while_stmt(&mut self, _node: NodeId, condition: NodeId) {
        self.reactor
            .rule(vec![])
            .using(vec![attr(condition, Attr::Type)])
            .by(move |cx| {
                let ty = cx.ty(0);
                if !matches!(ty, Type::Bool) {
                    cx.report(
                        format!("While statement with a non-boolean condition of type: {}", ty),
                        condition,
                    );
                }
            });
    }

    fn return_stmt(&mut self, ast: &Ast, node: NodeId, expression: Option<NodeId>) {
        self.reactor
            .set(attr(node, Attr::Returns), AttrValue::Bool(true));
        self.reactor.set(
            attr(node, Attr::ThreadIndex),
            AttrValue::ThreadIndex(self.thread_index),
        );

        // A top-level return has nothing to check against.
        let Some(function) = self.current_function(ast) else {
            return;
        };
        let NodeKind::FunDeclaration { return_type, .. } = ast.kind(function) else {
            return;
        };
        let return_type = *return_type;

        match expression {
            None => {
                self.reactor
                    .rule(vec![])
                    .using(vec![attr(return_type, Attr::Value)])
                    .by(move |cx| {
                        if !matches!(cx.ty(0), Type::Void) {
                            cx.report(
                                "Return without value in a function with a return type.",
                                node,
                            );
                        }
                    });
            }
            Some(expression) => {
                self.reactor
                    .rule(vec![])
                    .using(vec![attr(return_type, Attr::Value), attr(expression, Attr::Type)])
                    .by(move |cx| {
                        let mut formal = cx.ty(0);
                        // An async function's return values are checked
                        // against the wrapped type.
                        if let Type::Unborn(inner) = &formal {
                            formal = (**inner).clone();
                        }
                        let actual = cx.ty(1);
                        if matches!(formal, Type::Void) {
                            cx.report("Return with value in a Void function.", node);
                        } else if !is_assignable_to(&actual, &formal) {
                            cx.report(
                                format!(
                                    "Incompatible return type, expected {} but got {}",
                                    formal, actual
                                ),
                                expression,
                            );
                        }
                    });
            }
        }
    }

    fn current_function(&self, ast: &Ast) -> Option<NodeId> {
        let mut current = self.scope;
        while let Some(id) = current {
            let scope = self.scopes.get(id);
            if matches!(ast.kind(scope.node), NodeKind::FunDeclaration { .. }) {
                return Some(scope.node);
            }
            current = scope.parent;
        }
        None
    }

    fn born_stmt(&mut self, ast: &Ast, node: NodeId, function: NodeId, variable: Option<NodeId>) {
        let scope = self.current_scope();
        self.reactor.set(
            attr(node, Attr::ThreadIndex),
            AttrValue::ThreadIndex(self.thread_index),
        );
        self.reactor
            .set(attr(node, Attr::Scope), AttrValue::Scope(scope));

        let function_name = match ast.kind(function) {
            NodeKind::Reference { name } => name.clone(),
            _ => String::new(),
        };
        let variable_name = variable.map(|v| match ast.kind(v) {
            NodeKind::Reference { name } => name.clone(),
            _ => String::new(),
        });

        self.reactor
            .rule(vec![])
            .using(vec![attr(function, Attr::Type)])
            .by(move |cx| {
                let declared_function = cx
                    .scopes
                    .lookup(cx.ast, scope, &function_name)
                    .map(|ctx| ctx.declaration)
                    .filter(|&decl| {
                        matches!(cx.ast.kind(decl), NodeKind::FunDeclaration { .. })
                    });
                if declared_function.is_none() {
                    cx.report(
                        "First parameter of born must refer to a declared function.",
                        node,
                    );
                    return;
                }

                let Type::Fun(fun_ty) = cx.ty(0) else {
                    cx.report("Trying to born a non-Unborn function.", node);
                    return;
                };
                let Type::Unborn(component) = &fun_ty.ret else {
                    cx.report("Trying to born a non-Unborn function.", node);
                    return;
                };
                let component = (**component).clone();

                let (Some(variable), Some(variable_name)) = (variable, variable_name.clone())
                else {
                    return;
                };
                if matches!(component, Type::Void) {
                    cx.report(
                        "Cannot assign the return value of a Void Unborn function to a variable: call born() with the function name only.",
                        node,
                    );
                    return;
                }
                cx.rule(vec![])
                    .using(vec![attr(variable, Attr::Type)])
                    .by(move |cx| {
                        let declared_variable = cx
                            .scopes
                            .lookup(cx.ast, scope, &variable_name)
                            .map(|ctx| ctx.declaration)
                            .filter(|&decl| {
                                matches!(cx.ast.kind(decl), NodeKind::VarDeclaration { .. })
                            });
                        if declared_variable.is_none() {
                            cx.report(
                                "Second parameter of born must refer to a declared variable.",
                                node,
                            );
                            return;
                        }
                        let variable_ty = cx.ty(0);
                        if component != variable_ty {
                            cx.report(
                                format!(
                                    "Variable type does not match the Unborn function inner type (expected {} but got {})",
                                    component, variable_ty
                                ),
                                node,
                            );
                        }
                    });
            });
    }

    // ── Expressions ─────────────────────────────────────────────────

    fn reference(&mut self, ast: &Ast, node: NodeId, name: String) {
        self.reactor.set(
            attr(node, Attr::ThreadIndex),
            AttrValue::ThreadIndex(self.thread_index),
        );

        // `Daddy` is not a name; Daddy calls carry their own resolution.
        if name == "Daddy" {
            return;
        }

        let scope = self.current_scope();

        // Immediate lookup succeeds for anything already declared; what it
        // misses is resolved again once every scope is built, at which point
        // finding a variable means it was used before its declaration.
        if let Some(ctx) = self.scopes.lookup(ast, scope, &name) {
            self.reactor
                .set(attr(node, Attr::Decl), AttrValue::Node(ctx.declaration));
            self.reactor
                .set(attr(node, Attr::Scope), AttrValue::Scope(ctx.scope));
            self.copy_rule(attr(node, Attr::Type), attr(ctx.declaration, Attr::Type));
            return;
        }

        self.reactor
            .rule(vec![attr(node, Attr::Decl), attr(node, Attr::Scope)])
            .by(move |cx| match cx.scopes.lookup(cx.ast, scope, &name) {
                None => {
                    cx.error_for(
                        format!("Could not resolve: {}", name),
                        node,
                        &[
                            attr(node, Attr::Decl),
                            attr(node, Attr::Scope),
                            attr(node, Attr::Type),
                        ],
                    );
                }
                Some(ctx) => {
                    cx.set(0, AttrValue::Node(ctx.declaration));
                    cx.set(1, AttrValue::Scope(ctx.scope));
                    if matches!(cx.ast.kind(ctx.declaration), NodeKind::VarDeclaration { .. }) {
                        cx.error_for(
                            format!("Variable used before declaration: {}", name),
                            node,
                            &[attr(node, Attr::Type)],
                        );
                    } else {
                        cx.rule(vec![attr(node, Attr::Type)])
                            .using(vec![attr(ctx.declaration, Attr::Type)])
                            .by(|cx| {
                                let value = cx.get(0).clone();
                                cx.set(0, value);
                            });
                    }
                }
            });
    }

    fn constructor(&mut self, node: NodeId, reference: NodeId) {
        self.reactor
            .rule(vec![])
            .using(vec![attr(reference, Attr::Decl)])
            .by(move |cx| {
                let decl = cx.node(0);
                match cx.ast.kind(decl) {
                    NodeKind::StructDeclaration { fields, .. } => {
                        let fields = fields.clone();
                        let mut deps = vec![attr(decl, Attr::Declared)];
                        deps.extend(fields.iter().map(|&field| attr(field, Attr::Type)));
                        let field_count = fields.len();
                        cx.rule(vec![attr(node, Attr::Type)]).using(deps).by(move |cx| {
                            let struct_ty = cx.ty(0);
                            let params = (1..=field_count).map(|i| cx.ty(i)).collect();
                            cx.set(0, AttrValue::Type(Type::fun(struct_ty, params)));
                        });
                    }
                    _ => cx.error_for(
                        format!(
                            "Applying the constructor operator ($) to non-struct reference for: {}",
                            cx.ast.describe(decl)
                        ),
                        node,
                        &[attr(node, Attr::Type)],
                    ),
                }
            });
    }

    fn array_literal(&mut self, ast: &Ast, node: NodeId, elements: &[NodeId]) {
        if elements.is_empty() {
            // The type of `[]` comes from the inference context; without one,
            // the surrounding check reports the untyped hole.
            match self.inference_context {
                Some(context) if matches!(ast.kind(context), NodeKind::VarDeclaration { .. }) => {
                    self.copy_rule(attr(node, Attr::Type), attr(context, Attr::Type));
                }
                Some(context) => {
                    if let NodeKind::FunCall { function, .. } = ast.kind(context) {
                        let callee = *function;
                        self.reactor
                            .rule(vec![attr(node, Attr::Type)])
                            .using(vec![attr(callee, Attr::Type), attr(node, Attr::Index)])
                            .by(move |cx| {
                                let callee_ty = cx.ty(0);
                                let position = cx.index(1);
                                let params = match &callee_ty {
                                    Type::Fun(fun) => fun.params.clone(),
                                    Type::Class(class) => class
                                        .constructor()
                                        .map(|ctor| ctor.params.clone())
                                        .unwrap_or_default(),
                                    _ => Vec::new(),
                                };
                                match params.get(position) {
                                    Some(param) => cx.set(0, AttrValue::Type(param.clone())),
                                    None => cx.error(
                                        "Cannot infer the type of this empty array literal.",
                                        node,
                                    ),
                                }
                            });
                    }
                }
                None => {}
            }
            return;
        }

        let elements = elements.to_vec();
        let deps: Vec<Attribute> = elements.iter().map(|&e| attr(e, Attr::Type)).collect();
        self.reactor
            .rule(vec![attr(node, Attr::Type)])
            .using(deps)
            .by(move |cx| {
                let mut supertype: Option<Type> = None;
                for (i, &element) in elements.iter().enumerate() {
                    let ty = cx.ty(i);
                    if matches!(ty, Type::Void) {
                        // Report, but still type the array from the others.
                        cx.report("Void-valued expression in array literal", element);
                        continue;
                    }
                    supertype = match supertype {
                        None => Some(ty),
                        Some(so_far) => match common_supertype(&so_far, &ty) {
                            Some(merged) => Some(merged),
                            None => {
                                cx.error("Could not find common supertype in array literal.", node);
                                return;
                            }
                        },
                    };
                }
                match supertype {
                    Some(element_ty) => cx.set(0, AttrValue::Type(Type::array(element_ty))),
                    None => cx.error(
                        "Could not find common supertype in array literal: all members have Void type.",
                        node,
                    ),
                }
            });
    }

    fn field_access(&mut self, node: NodeId, stem: NodeId, field: String) {
        self.reactor
            .rule(vec![])
            .using(vec![attr(stem, Attr::Type)])
            .by(move |cx| {
                let stem_ty = cx.ty(0);
                match &stem_ty {
                    Type::Array(_) => {
                        if field == "length" {
                            cx.publish(attr(node, Attr::Type), AttrValue::Type(Type::Int));
                        } else {
                            cx.error_for(
                                "Trying to access a non-length field on an array",
                                node,
                                &[attr(node, Attr::Type)],
                            );
                        }
                    }
                    Type::Class(class) => match class.field(&field) {
                        None => cx.error_for(
                            format!("Field '{}' not defined in class '{}'", field, class.name),
                            node,
                            &[attr(node, Attr::Type)],
                        ),
                        Some(field_ty) => {
                            if let Type::Fun(fun) = field_ty {
                                if matches!(fun.ret, Type::Unborn(_)) {
                                    cx.error_for(
                                        "Async methods can only be called from within the class",
                                        node,
                                        &[attr(node, Attr::Type)],
                                    );
                                    return;
                                }
                            }
                            let field_ty = field_ty.clone();
                            cx.publish(attr(node, Attr::Type), AttrValue::Type(field_ty));
                        }
                    },
                    Type::Struct(struct_ty) => {
                        if let NodeKind::StructDeclaration { fields, .. } =
                            cx.ast.kind(struct_ty.decl)
                        {
                            for &field_decl in fields {
                                if cx.ast.decl_name(field_decl) == Some(field.as_str()) {
                                    cx.rule(vec![attr(node, Attr::Type)])
                                        .using(vec![attr(field_decl, Attr::Type)])
                                        .by(|cx| {
                                            let value = cx.get(0).clone();
                                            cx.set(0, value);
                                        });
                                    return;
                                }
                            }
                        }
                        cx.error_for(
                            format!(
                                "Trying to access missing field {} on struct {}",
                                field, struct_ty.name
                            ),
                            node,
                            &[attr(node, Attr::Type)],
                        );
                    }
                    other => cx.error_for(
                        format!("Trying to access a field on an expression of type {}", other),
                        node,
                        &[attr(node, Attr::Type)],
                    ),
                }
            });
    }

    fn array_access(&mut self, node: NodeId, array: NodeId, index: NodeId) {
        self.reactor
            .rule(vec![])
            .using(vec![attr(index, Attr::Type)])
            .by(move |cx| {
                if !matches!(cx.ty(0), Type::Int) {
                    cx.report("Indexing an array using a non-Int-valued expression", index);
                }
            });

        self.reactor
            .rule(vec![attr(node, Attr::Type)])
            .using(vec![attr(array, Attr::Type)])
            .by(move |cx| {
                let array_ty = cx.ty(0);
                match &array_ty {
                    Type::Array(element) => cx.set(0, AttrValue::Type((**element).clone())),
                    other => cx.error(
                        format!("Trying to index a non-array expression of type {}", other),
                        node,
                    ),
                }
            });
    }

    fn fun_call(&mut self, ast: &Ast, node: NodeId, function: NodeId, arguments: Vec<NodeId>) {
        self.inference_context = Some(node);
        self.reactor.set(
            attr(node, Attr::ThreadIndex),
            AttrValue::ThreadIndex(self.thread_index),
        );

        let mut deps = vec![attr(function, Attr::Type)];
        for (i, &argument) in arguments.iter().enumerate() {
            deps.push(attr(argument, Attr::Type));
            self.reactor
                .set(attr(argument, Attr::Index), AttrValue::Index(i));
        }

        let callee_display = self.callee_display(ast, function);
        self.reactor
            .rule(vec![attr(node, Attr::Type)])
            .using(deps)
            .by(move |cx| {
                let callee_ty = cx.ty(0);

                let fun_ty = match &callee_ty {
                    Type::Class(class) => match class.constructor() {
                        Some(ctor) => ctor.clone(),
                        None => {
                            cx.error(
                                "Cannot instantiate a class that doesn't implement a constructor",
                                function,
                            );
                            return;
                        }
                    },
                    Type::Fun(fun) => (**fun).clone(),
                    _ => {
                        cx.error(
                            format!(
                                "trying to call a non-function/non-class expression: {}",
                                cx.ast.describe(function)
                            ),
                            function,
                        );
                        return;
                    }
                };

                // Instantiation yields the class itself.
                let result = match &callee_ty {
                    Type::Class(_) => callee_ty.clone(),
                    _ => fun_ty.ret.clone(),
                };
                cx.set(0, AttrValue::Type(result));

                if fun_ty.params.len() != arguments.len() {
                    cx.report(
                        format!(
                            "wrong number of arguments, expected {} but got {}",
                            fun_ty.params.len(),
                            arguments.len()
                        ),
                        node,
                    );
                }

                let checked = fun_ty.params.len().min(arguments.len());
                for i in 0..checked {
                    let argument_ty = cx.ty(i + 1);
                    let param_ty = &fun_ty.params[i];
                    if !is_assignable_to(&argument_ty, param_ty) {
                        cx.report(
                            format!(
                                "incompatible argument provided for argument {} in {}: expected {} but got {}",
                                i, callee_display, param_ty, argument_ty
                            ),
                            arguments[i],
                        );
                    }
                }
            });
    }

    /// How a callee reads in an argument error ("print", "$P", "setA").
    fn callee_display(&self, ast: &Ast, callee: NodeId) -> String {
        match ast.kind(callee) {
            NodeKind::Reference { name } => name.clone(),
            NodeKind::Constructor { reference } => format!("${}", ast.describe(*reference)),
            NodeKind::FieldAccess { field, .. } => field.clone(),
            _ => ast.describe(callee),
        }
    }

    fn daddy_call(&mut self, node: NodeId, arguments: Vec<NodeId>) {
        self.reactor.set(
            attr(node, Attr::ThreadIndex),
            AttrValue::ThreadIndex(self.thread_index),
        );

        let scope = self.current_scope();
        self.reactor.rule(vec![]).by(move |cx| {
            // The nearest enclosing method is the caller; hitting a plain
            // function, a class, or the root first means there is none.
            let mut current = Some(scope);
            let mut method = None;
            loop {
                let Some(id) = current else { break };
                let scope_node = cx.scopes.get(id).node;
                match cx.ast.kind(scope_node) {
                    NodeKind::FunDeclaration { is_method: true, .. } => {
                        method = Some(scope_node);
                        break;
                    }
                    NodeKind::FunDeclaration { .. }
                    | NodeKind::Root { .. }
                    | NodeKind::ClassDeclaration { .. } => break,
                    _ => current = cx.scopes.get(id).parent,
                }
            }

            match method {
                Some(method) => {
                    cx.rule(vec![attr(node, Attr::Parent)])
                        .using(vec![attr(method, Attr::Parent)])
                        .by(move |cx| match cx.maybe_node(0) {
                            None => {
                                cx.error(
                                    "Trying to make a Daddy call in a method that has no parent.",
                                    node,
                                );
                                cx.error_for(
                                    "Cannot find the parent method type.",
                                    node,
                                    &[attr(node, Attr::Type)],
                                );
                            }
                            Some(parent_method) => {
                                cx.set(0, AttrValue::MaybeNode(Some(parent_method)));
                                cx.rule(vec![attr(node, Attr::Type), attr(node, Attr::ParentType)])
                                    .using(vec![attr(parent_method, Attr::Type)])
                                    .by(move |cx| {
                                        let parent_ty = cx.ty(0);
                                        let Type::Fun(fun) = &parent_ty else {
                                            cx.error(
                                                "Cannot find the parent method type.",
                                                node,
                                            );
                                            return;
                                        };
                                        cx.set(0, AttrValue::Type(fun.ret.clone()));
                                        cx.set(1, AttrValue::Type(parent_ty.clone()));
                                    });
                            }
                        });
                }
                None => {
                    cx.report("Daddy calls must be located inside a method", node);
                    cx.error_for(
                        "Could not resolve the Daddy call",
                        node,
                        &[attr(node, Attr::Parent)],
                    );
                    cx.error_for(
                        "Cannot find the parent method type.",
                        node,
                        &[attr(node, Attr::Type)],
                    );
                }
            }
        });

        let mut deps = vec![attr(node, Attr::ParentType)];
        for (i, &argument) in arguments.iter().enumerate() {
            deps.push(attr(argument, Attr::Type));
            self.reactor
                .set(attr(argument, Attr::Index), AttrValue::Index(i));
        }
        self.reactor.rule(vec![]).using(deps).by(move |cx| {
            let Type::Fun(fun) = cx.ty(0) else { return };

            if fun.params.len() != arguments.len() {
                cx.report(
                    format!(
                        "wrong number of arguments in Daddy call, parent expects {} but got {}",
                        fun.params.len(),
                        arguments.len()
                    ),
                    node,
                );
            }
            let checked = fun.params.len().min(arguments.len());
            for i in 0..checked {
                let argument_ty = cx.ty(i + 1);
                if !is_assignable_to(&argument_ty, &fun.params[i]) {
                    cx.report(
                        format!(
                            "incompatible argument provided for argument {} in Daddy call: expected {} but got {}",
                            i, fun.params[i], argument_ty
                        ),
                        arguments[i],
                    );
                }
            }
        });
    }

    fn unary(&mut self, node: NodeId, operand: NodeId) {
        // `!` is the only unary operator.
        self.reactor
            .set(attr(node, Attr::Type), AttrValue::Type(Type::Bool));
        self.reactor
            .rule(vec![])
            .using(vec![attr(operand, Attr::Type)])
            .by(move |cx| {
                let ty = cx.ty(0);
                if !matches!(ty, Type::Bool) {
                    cx.report(format!("Trying to negate type: {}", ty), node);
                }
            });
    }

    fn binary(&mut self, node: NodeId, op: BinaryOp, left: NodeId, right: NodeId) {
        self.reactor
            .rule(vec![attr(node, Attr::Type)])
            .using(vec![attr(left, Attr::Type), attr(right, Attr::Type)])
            .by(move |cx| {
                let left_ty = cx.ty(0);
                let right_ty = cx.ty(1);

                if op == BinaryOp::Add
                    && (matches!(left_ty, Type::String) || matches!(right_ty, Type::String))
                {
                    cx.set(0, AttrValue::Type(Type::String));
                } else if op == BinaryOp::Siblings {
                    if matches!(left_ty, Type::Class(_)) && matches!(right_ty, Type::Class(_)) {
                        cx.set(0, AttrValue::Type(Type::Bool));
                    } else {
                        cx.error("Trying to check if two non-classes are siblings.", node);
                    }
                } else if op.is_arithmetic() {
                    match (&left_ty, &right_ty) {
                        (Type::Int, Type::Int) => cx.set(0, AttrValue::Type(Type::Int)),
                        (Type::Int, Type::Float)
                        | (Type::Float, Type::Int)
                        | (Type::Float, Type::Float) => cx.set(0, AttrValue::Type(Type::Float)),
                        _ => cx.error(
                            format!("Trying to {} {} with {}", op.verb(), left_ty, right_ty),
                            node,
                        ),
                    }
                } else if op.is_comparison() {
                    cx.set(0, AttrValue::Type(Type::Bool));
                    if !matches!(left_ty, Type::Int | Type::Float) {
                        cx.report(
                            format!(
                                "Attempting to perform arithmetic comparison on non-numeric type: {}",
                                left_ty
                            ),
                            left,
                        );
                    }
                    if !matches!(right_ty, Type::Int | Type::Float) {
                        cx.report(
                            format!(
                                "Attempting to perform arithmetic comparison on non-numeric type: {}",
                                right_ty
                            ),
                            right,
                        );
                    }
                } else if op.is_logic() {
                    cx.set(0, AttrValue::Type(Type::Bool));
                    if !matches!(left_ty, Type::Bool) {
                        cx.report(
                            format!(
                                "Attempting to perform binary logic on non-boolean type: {}",
                                left_ty
                            ),
                            left,
                        );
                    }
                    if !matches!(right_ty, Type::Bool) {
                        cx.report(
                            format!(
                                "Attempting to perform binary logic on non-boolean type: {}",
                                right_ty
                            ),
                            right,
                        );
                    }
                } else if op.is_equality() {
                    cx.set(0, AttrValue::Type(Type::Bool));
                    if !is_comparable_to(&left_ty, &right_ty) {
                        cx.report(
                            format!(
                                "Trying to compare incomparable types {} and {}",
                                left_ty, right_ty
                            ),
                            node,
                        );
                    }
                }
            });
    }

    fn assignment(&mut self, node: NodeId, left: NodeId, right: NodeId) {
        self.reactor.set(
            attr(node, Attr::ThreadIndex),
            AttrValue::ThreadIndex(self.thread_index),
        );

        self.reactor
            .rule(vec![attr(node, Attr::Type)])
            .using(vec![attr(left, Attr::Type), attr(right, Attr::Type)])
            .by(move |cx| {
                let left_ty = cx.ty(0);
                let right_ty = cx.ty(1);

                // The type of the assignment is the left-side type.
                cx.set(0, AttrValue::Type(left_ty.clone()));

                let is_lvalue = matches!(
                    cx.ast.kind(left),
                    NodeKind::Reference { .. }
                        | NodeKind::FieldAccess { .. }
                        | NodeKind::ArrayAccess { .. }
                );
                if !is_lvalue {
                    cx.report("Trying to assign to a non-lvalue expression.", left);
                    return;
                }

                if let Type::Class(class) = &left_ty {
                    let mut error = String::new();
                    if !class.can_be_assigned_with(&right_ty, &mut error) {
                        cx.report(error, left);
                    }
                } else if !is_assignable_to(&right_ty, &left_ty) {
                    cx.report(
                        format!(
                            "Trying to assign {} with a non-compatible value. Expected {} but got {}",
                            cx.ast.describe(left),
                            left_ty,
                            right_ty
                        ),
                        node,
                    );
                }
            });
    }

    // ── Types ───────────────────────────────────────────────────────

    fn simple_type(&mut self, node: NodeId, name: String) {
        let scope = self.current_scope();
        // Type declarations may occur after use; resolve once scopes are
        // complete.
        self.reactor.rule(vec![]).by(move |cx| {
            match cx.scopes.lookup(cx.ast, scope, &name) {
                None => cx.error_for(
                    format!("could not resolve: {}", name),
                    node,
                    &[attr(node, Attr::Value)],
                ),
                Some(ctx) => {
                    let decl = ctx.declaration;
                    let is_type_decl = matches!(
                        cx.ast.kind(decl),
                        NodeKind::StructDeclaration { .. }
                            | NodeKind::ClassDeclaration { .. }
                            | NodeKind::Synthetic {
                                kind: SyntheticKind::Type,
                                ..
                            }
                    );
                    if !is_type_decl {
                        cx.error_for(
                            format!(
                                "{} did not resolve to a type declaration but to a {} declaration",
                                name,
                                cx.ast.declared_thing(decl)
                            ),
                            node,
                            &[attr(node, Attr::Value)],
                        );
                    } else {
                        cx.rule(vec![attr(node, Attr::Value)])
                            .using(vec![attr(decl, Attr::Declared)])
                            .by(|cx| {
                                let value = cx.get(0).clone();
                                cx.set(0, value);
                            });
                    }
                }
            }
        });
    }
}
