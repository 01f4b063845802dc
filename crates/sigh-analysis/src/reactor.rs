//! The attribute reactor.
//!
//! A dataflow store over `(node, attribute)` slots. Rules declare the
//! attributes they read and the attributes they produce; a rule fires once
//! after all of its inputs have been published. `error` marks a rule's
//! outputs as deliberately unproduced so that dependent rules neither fire
//! nor count as deadlocked; `error_for` does the same for an explicit
//! attribute list. After the work list drains, any attribute that was
//! demanded but never produced (and never deliberately broken) is reported,
//! so a silent gap cannot hide an error.

use crate::scopes::{DeclarationContext, ScopeArena, ScopeId};
use sigh_syntax::{Ast, NodeId};
use sigh_types::Type;
use std::collections::{HashMap, HashSet, VecDeque};

/// The attribute names used by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    /// Type of an expression or declaration.
    Type,
    /// The type a type *node* denotes.
    Value,
    /// The type a struct/class declaration introduces.
    Declared,
    /// Scope attached to a scope-introducing or scoped node.
    Scope,
    /// Resolved declaration of a reference.
    Decl,
    /// Whether a statement unconditionally returns.
    Returns,
    /// Thread index of the code (0 = main).
    ThreadIndex,
    /// Overridden parent method of a method (or of a Daddy call).
    Parent,
    /// Function type of the parent method at a Daddy call.
    ParentType,
    /// Positional index of a call argument.
    Index,
    /// Ancestor chain of a class declaration.
    Ancestors,
    /// Resolved constructor of a class.
    Constructor,
}

impl Attr {
    pub fn name(self) -> &'static str {
        match self {
            Attr::Type => "type",
            Attr::Value => "value",
            Attr::Declared => "declared",
            Attr::Scope => "scope",
            Attr::Decl => "decl",
            Attr::Returns => "returns",
            Attr::ThreadIndex => "threadIndex",
            Attr::Parent => "parent",
            Attr::ParentType => "parentType",
            Attr::Index => "index",
            Attr::Ancestors => "ancestors",
            Attr::Constructor => "constructor",
        }
    }
}

/// A `(node, attribute)` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub node: NodeId,
    pub attr: Attr,
}

/// Shorthand constructor for an [`Attribute`].
pub fn attr(node: NodeId, attr: Attr) -> Attribute {
    Attribute { node, attr }
}

/// A value stored in an attribute slot.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Type(Type),
    Scope(ScopeId),
    Node(NodeId),
    Bool(bool),
    Index(usize),
    ThreadIndex(u64),
    /// A method's overridden parent; `None` when there is none.
    MaybeNode(Option<NodeId>),
    Ancestors(Vec<DeclarationContext>),
}

/// An error attached to a node.
#[derive(Debug, Clone)]
pub struct SemanticError {
    pub message: String,
    pub node: NodeId,
}

type RuleFn = Box<dyn FnOnce(&mut RuleCx<'_, '_>)>;

struct Rule {
    inputs: Vec<Attribute>,
    outputs: Vec<Attribute>,
    missing: usize,
    run: Option<RuleFn>,
}

#[derive(Default)]
pub struct Reactor {
    values: HashMap<Attribute, AttrValue>,
    broken: HashSet<Attribute>,
    rules: Vec<Rule>,
    watchers: HashMap<Attribute, Vec<usize>>,
    ready: VecDeque<usize>,
    errors: Vec<SemanticError>,
}

impl Reactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an attribute value. Attributes are single-assignment; a
    /// repeated set keeps the first value.
    pub fn set(&mut self, attribute: Attribute, value: AttrValue) {
        if self.values.contains_key(&attribute) {
            return;
        }
        self.values.insert(attribute, value);
        let watchers = self.watchers.get(&attribute).cloned().unwrap_or_default();
        for idx in watchers {
            let rule = &mut self.rules[idx];
            if rule.run.is_some() && rule.missing > 0 {
                rule.missing -= 1;
                if rule.missing == 0 {
                    self.ready.push_back(idx);
                }
            }
        }
    }

    pub fn get(&self, attribute: Attribute) -> Option<&AttrValue> {
        self.values.get(&attribute)
    }

    /// Record an error directly, outside any rule.
    pub fn error(&mut self, message: impl Into<String>, node: NodeId) {
        self.errors.push(SemanticError {
            message: message.into(),
            node,
        });
    }

    /// Start building a rule producing `outputs`.
    pub fn rule(&mut self, outputs: impl Into<Vec<Attribute>>) -> RuleBuilder<'_> {
        RuleBuilder {
            reactor: self,
            outputs: outputs.into(),
            inputs: Vec::new(),
        }
    }

    fn register(&mut self, inputs: Vec<Attribute>, outputs: Vec<Attribute>, run: RuleFn) {
        // A rule waiting on a broken attribute is dead on arrival: break its
        // outputs so dependents are suppressed rather than deadlocked.
        if inputs.iter().any(|input| self.broken.contains(input)) {
            for output in outputs {
                self.break_attribute(output);
            }
            return;
        }

        let idx = self.rules.len();
        let mut distinct_missing = HashSet::new();
        for &input in &inputs {
            if !self.values.contains_key(&input) {
                distinct_missing.insert(input);
            }
        }
        for &input in &distinct_missing {
            self.watchers.entry(input).or_default().push(idx);
        }
        let missing = distinct_missing.len();
        self.rules.push(Rule {
            inputs,
            outputs,
            missing,
            run: Some(run),
        });
        if missing == 0 {
            self.ready.push_back(idx);
        }
    }

    /// Mark an attribute as deliberately unproduced and transitively kill
    /// rules waiting on it.
    fn break_attribute(&mut self, attribute: Attribute) {
        if !self.broken.insert(attribute) {
            return;
        }
        let watchers = self
            .watchers
            .get(&attribute)
            .cloned()
            .unwrap_or_default();
        for idx in watchers {
            if self.rules[idx].run.is_some() {
                self.rules[idx].run = None;
                let outputs = self.rules[idx].outputs.clone();
                for output in outputs {
                    self.break_attribute(output);
                }
            }
        }
    }

    /// Drain the work list to fixpoint, then report attributes that were
    /// demanded but never produced.
    pub fn run(&mut self, ast: &Ast, scopes: &ScopeArena) {
        while let Some(idx) = self.ready.pop_front() {
            let Some(run) = self.rules[idx].run.take() else {
                continue;
            };
            let inputs: Vec<AttrValue> = self.rules[idx]
                .inputs
                .iter()
                .map(|input| {
                    self.values
                        .get(input)
                        .cloned()
                        .unwrap_or(AttrValue::Bool(false))
                })
                .collect();
            let outputs = self.rules[idx].outputs.clone();
            let mut cx = RuleCx {
                reactor: self,
                ast,
                scopes,
                inputs,
                outputs,
            };
            run(&mut cx);
        }

        self.report_missing();
    }

    fn report_missing(&mut self) {
        let pending_outputs: HashSet<Attribute> = self
            .rules
            .iter()
            .filter(|rule| rule.run.is_some())
            .flat_map(|rule| rule.outputs.iter().copied())
            .collect();

        let mut reported = HashSet::new();
        let mut missing = Vec::new();
        for rule in self.rules.iter().filter(|rule| rule.run.is_some()) {
            for &input in &rule.inputs {
                if !self.values.contains_key(&input)
                    && !self.broken.contains(&input)
                    && !pending_outputs.contains(&input)
                    && reported.insert(input)
                {
                    missing.push(input);
                }
            }
        }
        for input in missing {
            self.error(
                format!("missing attribute {}", input.attr.name()),
                input.node,
            );
        }
    }

    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    /// Consume the reactor, returning the final attribute store and errors.
    pub fn into_parts(self) -> (HashMap<Attribute, AttrValue>, Vec<SemanticError>) {
        (self.values, self.errors)
    }
}

/// Builder returned by [`Reactor::rule`].
pub struct RuleBuilder<'r> {
    reactor: &'r mut Reactor,
    outputs: Vec<Attribute>,
    inputs: Vec<Attribute>,
}

impl<'r> RuleBuilder<'r> {
    pub fn using(mut self, inputs: impl Into<Vec<Attribute>>) -> Self {
        self.inputs = inputs.into();
        self
    }

    pub fn by(self, run: impl FnOnce(&mut RuleCx<'_, '_>) + 'static) {
        self.reactor
            .register(self.inputs, self.outputs, Box::new(run));
    }
}

/// Execution context handed to a firing rule.
pub struct RuleCx<'r, 'a> {
    reactor: &'r mut Reactor,
    pub ast: &'a Ast,
    pub scopes: &'a ScopeArena,
    inputs: Vec<AttrValue>,
    outputs: Vec<Attribute>,
}

impl RuleCx<'_, '_> {
    pub fn get(&self, index: usize) -> &AttrValue {
        &self.inputs[index]
    }

    pub fn ty(&self, index: usize) -> Type {
        match &self.inputs[index] {
            AttrValue::Type(ty) => ty.clone(),
            other => panic!("input {} is {:?}, expected a type", index, other),
        }
    }

    pub fn scope(&self, index: usize) -> ScopeId {
        match &self.inputs[index] {
            AttrValue::Scope(scope) => *scope,
            other => panic!("input {} is {:?}, expected a scope", index, other),
        }
    }

    pub fn node(&self, index: usize) -> NodeId {
        match &self.inputs[index] {
            AttrValue::Node(node) => *node,
            other => panic!("input {} is {:?}, expected a node", index, other),
        }
    }

    pub fn boolean(&self, index: usize) -> bool {
        match &self.inputs[index] {
            AttrValue::Bool(value) => *value,
            other => panic!("input {} is {:?}, expected a bool", index, other),
        }
    }

    pub fn index(&self, index: usize) -> usize {
        match &self.inputs[index] {
            AttrValue::Index(value) => *value,
            other => panic!("input {} is {:?}, expected an index", index, other),
        }
    }

    pub fn maybe_node(&self, index: usize) -> Option<NodeId> {
        match &self.inputs[index] {
            AttrValue::MaybeNode(value) => *value,
            other => panic!("input {} is {:?}, expected a parent link", index, other),
        }
    }

    pub fn ancestors(&self, index: usize) -> Vec<DeclarationContext> {
        match &self.inputs[index] {
            AttrValue::Ancestors(value) => value.clone(),
            other => panic!("input {} is {:?}, expected ancestors", index, other),
        }
    }

    /// Publish output `index`.
    pub fn set(&mut self, index: usize, value: AttrValue) {
        let attribute = self.outputs[index];
        self.reactor.set(attribute, value);
    }

    /// Publish an attribute this rule did not declare as an output.
    pub fn publish(&mut self, attribute: Attribute, value: AttrValue) {
        self.reactor.set(attribute, value);
    }

    /// Record an error and mark this rule's declared outputs as deliberately
    /// unproduced.
    pub fn error(&mut self, message: impl Into<String>, node: NodeId) {
        self.reactor.error(message, node);
        for output in self.outputs.clone() {
            self.reactor.break_attribute(output);
        }
    }

    /// Record an error and mark the given attributes as deliberately
    /// unproduced.
    pub fn error_for(
        &mut self,
        message: impl Into<String>,
        node: NodeId,
        attributes: &[Attribute],
    ) {
        self.reactor.error(message, node);
        for &attribute in attributes {
            self.reactor.break_attribute(attribute);
        }
    }

    /// Record an error without breaking any attribute.
    pub fn report(&mut self, message: impl Into<String>, node: NodeId) {
        self.reactor.error(message, node);
    }

    /// Register a follow-up rule from inside a firing rule.
    pub fn rule(&mut self, outputs: impl Into<Vec<Attribute>>) -> RuleBuilder<'_> {
        self.reactor.rule(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigh_common::Span;
    use sigh_syntax::NodeKind;

    fn fixture() -> (Ast, ScopeArena, NodeId, NodeId) {
        let mut ast = Ast::new();
        let a = ast.alloc(NodeKind::IntLiteral(1), Span::DUMMY);
        let b = ast.alloc(NodeKind::IntLiteral(2), Span::DUMMY);
        (ast, ScopeArena::new(), a, b)
    }

    #[test]
    fn rules_fire_once_inputs_arrive() {
        let (ast, scopes, a, b) = fixture();
        let mut reactor = Reactor::new();

        reactor
            .rule(vec![attr(b, Attr::Type)])
            .using(vec![attr(a, Attr::Type)])
            .by(|cx| {
                let ty = cx.ty(0);
                cx.set(0, AttrValue::Type(ty));
            });

        reactor.set(attr(a, Attr::Type), AttrValue::Type(Type::Int));
        reactor.run(&ast, &scopes);

        assert!(matches!(
            reactor.get(attr(b, Attr::Type)),
            Some(AttrValue::Type(Type::Int))
        ));
        assert!(reactor.errors().is_empty());
    }

    #[test]
    fn error_for_suppresses_dependents_without_deadlock() {
        let (ast, scopes, a, b) = fixture();
        let mut reactor = Reactor::new();

        // First rule refuses to produce a's type.
        reactor.rule(vec![]).by(move |cx| {
            cx.error_for("no type for a", a, &[attr(a, Attr::Type)]);
        });
        // Second rule would consume it; it must neither fire nor report a
        // missing attribute.
        reactor
            .rule(vec![attr(b, Attr::Type)])
            .using(vec![attr(a, Attr::Type)])
            .by(|cx| {
                let ty = cx.ty(0);
                cx.set(0, AttrValue::Type(ty));
            });

        reactor.run(&ast, &scopes);

        let messages: Vec<_> = reactor.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["no type for a"]);
    }

    #[test]
    fn demanded_but_never_produced_attributes_are_reported() {
        let (ast, scopes, a, b) = fixture();
        let mut reactor = Reactor::new();

        reactor
            .rule(vec![attr(b, Attr::Type)])
            .using(vec![attr(a, Attr::Type)])
            .by(|cx| {
                let ty = cx.ty(0);
                cx.set(0, AttrValue::Type(ty));
            });

        reactor.run(&ast, &scopes);

        assert_eq!(reactor.errors().len(), 1);
        assert!(reactor.errors()[0].message.contains("missing attribute"));
    }

    #[test]
    fn nested_rule_registration_fires() {
        let (ast, scopes, a, b) = fixture();
        let mut reactor = Reactor::new();

        reactor.rule(vec![]).by(move |cx| {
            cx.rule(vec![attr(b, Attr::Type)])
                .using(vec![attr(a, Attr::Type)])
                .by(|cx| {
                    let ty = cx.ty(0);
                    cx.set(0, AttrValue::Type(ty));
                });
        });
        reactor.set(attr(a, Attr::Type), AttrValue::Type(Type::Float));
        reactor.run(&ast, &scopes);

        assert!(matches!(
            reactor.get(attr(b, Attr::Type)),
            Some(AttrValue::Type(Type::Float))
        ));
    }
}
