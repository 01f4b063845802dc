//! The scope graph.
//!
//! Scopes form a tree through lexical parents. Class scopes additionally
//! resolve names along the inheritance chain before falling back to the
//! lexical chain; the chain is followed by parent *name* through a registry
//! shared by every class scope, with a visited set so declared cycles cannot
//! loop the lookup.

use indexmap::IndexMap;
use sigh_syntax::{Ast, NodeId, NodeKind};
use std::collections::{HashMap, HashSet};

/// Index of a scope inside the [`ScopeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    Ordinary,
    Class,
}

/// One scope: its introducing node, lexical parent, and declarations in
/// source order.
#[derive(Debug)]
pub struct Scope {
    pub node: NodeId,
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    declarations: IndexMap<String, NodeId>,
}

/// A successful lookup: the declaration and the scope it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclarationContext {
    pub scope: ScopeId,
    pub declaration: NodeId,
}

#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
    /// Class name to class scope, shared by all class scopes.
    class_registry: HashMap<String, ScopeId>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_scope(&mut self, node: NodeId, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            node,
            parent,
            kind,
            declarations: IndexMap::new(),
        });
        id
    }

    /// Create a class scope and install it in the registry under the class
    /// name.
    pub fn new_class_scope(&mut self, node: NodeId, parent: ScopeId, name: &str) -> ScopeId {
        let id = self.new_scope(node, Some(parent), ScopeKind::Class);
        self.class_registry.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn declare(&mut self, id: ScopeId, name: &str, declaration: NodeId) {
        self.scopes[id.0 as usize]
            .declarations
            .insert(name.to_string(), declaration);
    }

    pub fn declarations(&self, id: ScopeId) -> impl Iterator<Item = (&str, NodeId)> {
        self.scopes[id.0 as usize]
            .declarations
            .iter()
            .map(|(name, &decl)| (name.as_str(), decl))
    }

    pub fn class_scope(&self, name: &str) -> Option<ScopeId> {
        self.class_registry.get(name).copied()
    }

    /// Full lookup: local map, inheritance chain for class scopes, then the
    /// lexical parent chain.
    pub fn lookup(&self, ast: &Ast, from: ScopeId, name: &str) -> Option<DeclarationContext> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.get(id);
            if scope.kind == ScopeKind::Class {
                if let Some(ctx) = self.class_lookup(ast, id, name) {
                    return Some(ctx);
                }
            } else if let Some(&declaration) = scope.declarations.get(name) {
                return Some(DeclarationContext {
                    scope: id,
                    declaration,
                });
            }
            current = scope.parent;
        }
        None
    }

    /// Lookup restricted to a class scope and its ancestors.
    pub fn class_lookup(&self, ast: &Ast, id: ScopeId, name: &str) -> Option<DeclarationContext> {
        let scope = self.get(id);
        if let Some(&declaration) = scope.declarations.get(name) {
            return Some(DeclarationContext {
                scope: id,
                declaration,
            });
        }

        let mut visited = HashSet::new();
        let mut parent_name = self.class_parent_name(ast, id);
        while let Some(parent) = parent_name {
            if !visited.insert(parent.to_string()) {
                break;
            }
            let Some(parent_id) = self.class_registry.get(parent).copied() else {
                break;
            };
            let parent_scope = self.get(parent_id);
            if let Some(&declaration) = parent_scope.declarations.get(name) {
                return Some(DeclarationContext {
                    scope: parent_id,
                    declaration,
                });
            }
            parent_name = self.class_parent_name(ast, parent_id);
        }
        None
    }

    /// Whether a runtime frame bound to `frame_scope` can answer for
    /// `target`: either the same scope, or (for class scopes) `target` is on
    /// the frame class's inheritance chain. A subclass frame holds the
    /// inherited fields, so writes resolved against an ancestor class scope
    /// must land there.
    pub fn frame_matches(&self, ast: &Ast, frame_scope: ScopeId, target: ScopeId) -> bool {
        if frame_scope == target {
            return true;
        }
        if self.get(frame_scope).kind != ScopeKind::Class
            || self.get(target).kind != ScopeKind::Class
        {
            return false;
        }
        let mut visited = HashSet::new();
        let mut current = Some(frame_scope);
        while let Some(id) = current {
            if id == target {
                return true;
            }
            current = self
                .class_parent_name(ast, id)
                .filter(|name| visited.insert(name.to_string()))
                .and_then(|name| self.class_registry.get(name).copied());
        }
        false
    }

    fn class_parent_name<'a>(&self, ast: &'a Ast, id: ScopeId) -> Option<&'a str> {
        match ast.kind(self.get(id).node) {
            NodeKind::ClassDeclaration { parent, .. } => parent.as_deref(),
            _ => None,
        }
    }
}
