//! Token definitions for Sigh.

use sigh_common::Span;

/// A token with its kind and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of a token.
///
/// Semicolons never appear here: Sigh treats `;` as whitespace, like
/// comments.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    String(String),

    // Identifiers
    Ident(String),

    // Keywords
    Var,
    Fun,
    Struct,
    Class,
    SonOf,
    If,
    Else,
    While,
    Return,
    Unborn,
    Born,
    /// `ciblingsOf` or `siblingsOf`; both spellings appear in the wild.
    Siblings,

    // Delimiters
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    // Operators
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Percent,   // %
    Eq,        // =
    EqEq,      // ==
    BangEq,    // !=
    Lt,        // <
    LtEq,      // <=
    Gt,        // >
    GtEq,      // >=
    AndAnd,    // &&
    OrOr,      // ||
    Bang,      // !
    PlusPlus,  // ++
    MinusMinus,// --
    PlusEq,    // +=
    MinusEq,   // -=
    StarEq,    // *=
    SlashEq,   // /=
    PercentEq, // %=
    Dollar,    // $

    // Punctuation
    Comma, // ,
    Colon, // :
    Dot,   // .

    // Special
    Eof,
    Error,
}

impl TokenKind {
    /// Returns true if this token can begin an expression.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::String(_)
                | TokenKind::Ident(_)
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Dollar
                | TokenKind::Bang
                | TokenKind::Minus
        )
    }
}
