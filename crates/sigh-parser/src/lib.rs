//! The Sigh parser.

mod parser;

pub use parser::Parser;

use sigh_diagnostic::Diagnostic;
use sigh_syntax::Ast;

/// Parse a source string into an AST.
///
/// Always returns a tree; syntax errors are collected in the diagnostics and
/// the affected statements are skipped.
pub fn parse(source: &str) -> (Ast, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) = sigh_lexer::tokenize(source);
    let mut parser = Parser::new(tokens);
    let ast = parser.parse_root();
    diagnostics.extend(parser.into_diagnostics());
    (ast, diagnostics)
}
