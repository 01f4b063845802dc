//! The Sigh lexer.
//!
//! One quirk inherited from the grammar: `;` is whitespace. Statement
//! boundaries are purely syntactic, so semicolons, line comments and block
//! comments are all skipped as trivia.

use crate::token::{Token, TokenKind};
use sigh_common::Span;
use sigh_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode};

/// The Sigh lexer.
pub struct Lexer<'src> {
    source: &'src str,
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the entire source and return tokens and diagnostics.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;

        let Some((_, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::from_usize(start, start));
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '$' => TokenKind::Dollar,

            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            // `/` as division; comments were consumed as trivia already.
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AndAnd
                } else {
                    self.error(start, ErrorCode::UnexpectedCharacter, "expected `&&`");
                    TokenKind::Error
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::OrOr
                } else {
                    self.error(start, ErrorCode::UnexpectedCharacter, "expected `||`");
                    TokenKind::Error
                }
            }

            '"' => self.string(start),

            c if c.is_ascii_digit() => self.number(start),
            c if c.is_alphabetic() || c == '_' => self.ident(start),

            c => {
                self.error(
                    start,
                    ErrorCode::UnexpectedCharacter,
                    format!("unexpected character `{}`", c),
                );
                TokenKind::Error
            }
        };

        Token::new(kind, Span::from_usize(start, self.pos))
    }

    /// Skip whitespace, semicolons, and comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == ';' => {
                    self.advance();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek().map(|&(_, c)| c) {
                        Some('/') => {
                            while let Some(c) = self.peek() {
                                if c == '\n' {
                                    break;
                                }
                                self.advance();
                            }
                        }
                        Some('*') => {
                            let start = self.pos;
                            self.advance(); // /
                            self.advance(); // *
                            let mut closed = false;
                            while let Some((_, c)) = self.advance() {
                                if c == '*' && self.eat('/') {
                                    closed = true;
                                    break;
                                }
                            }
                            if !closed {
                                self.error(
                                    start,
                                    ErrorCode::UnterminatedComment,
                                    "unterminated block comment",
                                );
                            }
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self, start: usize) -> TokenKind {
        let mut text = String::new();
        loop {
            match self.advance() {
                Some((_, '"')) => return TokenKind::String(text),
                Some((esc_pos, '\\')) => match self.advance() {
                    Some((_, '\\')) => text.push('\\'),
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, 'r')) => text.push('\r'),
                    Some((_, 't')) => text.push('\t'),
                    Some((_, other)) => {
                        self.error(
                            esc_pos,
                            ErrorCode::InvalidEscape,
                            format!("invalid escape sequence `\\{}`", other),
                        );
                    }
                    None => break,
                },
                Some((_, c)) => text.push(c),
                None => break,
            }
        }
        self.error(start, ErrorCode::UnterminatedString, "unterminated string literal");
        TokenKind::Error
    }

    fn number(&mut self, start: usize) -> TokenKind {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        // A float needs a digit right after the dot; `a.length` style field
        // access on an integer literal does not occur in the grammar, so a
        // bare dot between digits always means a float.
        let mut is_float = false;
        if self.peek() == Some('.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
                is_float = true;
                self.advance(); // .
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = &self.source[start..self.pos];
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => TokenKind::Float(value),
                Err(_) => {
                    self.error(start, ErrorCode::InvalidNumber, "invalid float literal");
                    TokenKind::Error
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => TokenKind::Int(value),
                Err(_) => {
                    self.error(start, ErrorCode::InvalidNumber, "integer literal out of range");
                    TokenKind::Error
                }
            }
        }
    }

    fn ident(&mut self, start: usize) -> TokenKind {
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        match &self.source[start..self.pos] {
            "var" => TokenKind::Var,
            "fun" => TokenKind::Fun,
            "struct" => TokenKind::Struct,
            "class" => TokenKind::Class,
            "sonOf" => TokenKind::SonOf,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "return" => TokenKind::Return,
            "Unborn" => TokenKind::Unborn,
            "born" => TokenKind::Born,
            "ciblingsOf" | "siblingsOf" => TokenKind::Siblings,
            other => TokenKind::Ident(other.to_string()),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((pos, c)) = next {
            self.pos = pos + c.len_utf8();
        }
        next
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&mut self, start: usize, code: ErrorCode, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::error(
                DiagnosticKind::Lexer,
                Span::from_usize(start, self.pos),
                message,
            )
            .with_code(code),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, diagnostics) = Lexer::new(source).tokenize();
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn semicolons_are_whitespace() {
        assert_eq!(
            kinds("return 1; return 2"),
            vec![
                TokenKind::Return,
                TokenKind::Int(1),
                TokenKind::Return,
                TokenKind::Int(2),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn sibling_spellings_are_one_token() {
        assert_eq!(
            kinds("a ciblingsOf b siblingsOf c"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Siblings,
                TokenKind::Ident("b".into()),
                TokenKind::Siblings,
                TokenKind::Ident("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn compound_assignment_tokens() {
        assert_eq!(
            kinds("i++ i-- i += 1"),
            vec![
                TokenKind::Ident("i".into()),
                TokenKind::PlusPlus,
                TokenKind::Ident("i".into()),
                TokenKind::MinusMinus,
                TokenKind::Ident("i".into()),
                TokenKind::PlusEq,
                TokenKind::Int(1),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn float_requires_digit_after_dot() {
        assert_eq!(
            kinds("1.5 a.length"),
            vec![
                TokenKind::Float(1.5),
                TokenKind::Ident("a".into()),
                TokenKind::Dot,
                TokenKind::Ident("length".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\\c""#),
            vec![TokenKind::String("a\nb\\c".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn comments_are_trivia() {
        assert_eq!(
            kinds("1 // comment\n /* block \n */ 2"),
            vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]
        );
    }
}
