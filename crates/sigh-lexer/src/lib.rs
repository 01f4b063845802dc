//! The Sigh lexer.

mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};

use sigh_diagnostic::Diagnostic;

/// Tokenize a whole source string.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source).tokenize()
}
