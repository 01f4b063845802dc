//! Semantic analysis for Sigh.
//!
//! The analyzer walks the AST twice (pre- and post-visit), building the
//! scope graph as it goes and deferring every inter-node constraint to rules
//! in an attribute reactor. Running the reactor to fixpoint decorates the
//! tree with `type` / `scope` / `decl` / `returns` / `threadIndex` / `parent`
//! attributes and collects the full error set; nothing aborts early.

mod analyzer;
mod reactor;
mod scopes;

pub use analyzer::{analyze, Analysis};
pub use reactor::{attr, Attr, AttrValue, Attribute, Reactor, RuleCx, SemanticError};
pub use scopes::{DeclarationContext, Scope, ScopeArena, ScopeId, ScopeKind};
