//! Recursive-descent parser producing the arena AST.
//!
//! The grammar quirks worth knowing: semicolons are trivia (the lexer eats
//! them), a missing function return type means `Void`, `Daddy(args)` parses
//! as its own call form, and the `++`/`--`/`op=` statements desugar to plain
//! assignments here.

use sigh_common::Span;
use sigh_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode};
use sigh_lexer::{Token, TokenKind};
use sigh_syntax::{Ast, BinaryOp, NodeId, NodeKind, UnaryOp};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    ast: Ast,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            ast: Ast::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Parse the whole program.
    pub fn parse_root(&mut self) -> Ast {
        let start = self.current_span();
        let mut statements = Vec::new();

        while !self.at_end() {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }

        let span = start.merge(self.previous_span());
        let root = self.ast.alloc(NodeKind::Root { statements }, span);
        self.ast.root = Some(root);
        std::mem::take(&mut self.ast)
    }

    // ── Statements ──────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Option<NodeId> {
        match self.current_kind() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Var => self.parse_var_decl(),
            TokenKind::Fun => self.parse_fun_decl(false),
            TokenKind::Struct => self.parse_struct_decl(),
            TokenKind::Class => self.parse_class_decl(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Born => self.parse_born(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.expect(TokenKind::LBrace, "expected `{`")?;

        let mut statements = Vec::new();
        while !matches!(self.current_kind(), TokenKind::RBrace | TokenKind::Eof) {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize_within_braces(),
            }
        }
        self.expect(TokenKind::RBrace, "expected `}` to close block")?;

        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(NodeKind::Block { statements }, span))
    }

    fn parse_var_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // var
        let name = self.expect_ident("expected a variable name after `var`")?;
        self.expect(TokenKind::Colon, "expected `:` after variable name")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Eq, "expected `=` with an initializer")?;
        let initializer = self.parse_expression()?;

        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(
            NodeKind::VarDeclaration {
                name,
                ty,
                initializer,
            },
            span,
        ))
    }

    fn parse_fun_decl(&mut self, is_method: bool) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // fun
        let name_span = self.current_span();
        let name = self.expect_ident("expected a function name after `fun`")?;

        self.expect(TokenKind::LParen, "expected `(` after function name")?;
        let mut parameters = Vec::new();
        if !matches!(self.current_kind(), TokenKind::RParen) {
            loop {
                parameters.push(self.parse_parameter()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected `)` after parameters")?;

        let return_type = if self.eat(TokenKind::Colon) {
            self.parse_type()?
        } else {
            // No annotation means Void.
            self.ast
                .alloc(NodeKind::SimpleType { name: "Void".into() }, name_span)
        };

        let body = self.parse_block()?;
        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(
            NodeKind::FunDeclaration {
                name,
                parameters,
                return_type,
                body,
                is_method,
            },
            span,
        ))
    }

    fn parse_parameter(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let name = self.expect_ident("expected a parameter name")?;
        self.expect(TokenKind::Colon, "expected `:` after parameter name")?;
        let ty = self.parse_type()?;
        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(NodeKind::Parameter { name, ty }, span))
    }

    fn parse_struct_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // struct
        let name = self.expect_ident("expected a struct name after `struct`")?;
        self.expect(TokenKind::LBrace, "expected `{` after struct name")?;

        let mut fields = Vec::new();
        while matches!(self.current_kind(), TokenKind::Var) {
            let field_start = self.current_span();
            self.advance(); // var
            let field_name = self.expect_ident("expected a field name after `var`")?;
            self.expect(TokenKind::Colon, "expected `:` after field name")?;
            let ty = self.parse_type()?;
            let span = field_start.merge(self.previous_span());
            fields.push(
                self.ast
                    .alloc(NodeKind::FieldDeclaration { name: field_name, ty }, span),
            );
        }
        self.expect(TokenKind::RBrace, "expected `}` to close struct body")?;

        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(NodeKind::StructDeclaration { name, fields }, span))
    }

    fn parse_class_decl(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // class
        let name = self.expect_ident("expected a class name after `class`")?;

        let parent = if self.eat(TokenKind::SonOf) {
            Some(self.expect_ident("expected a parent class name after `sonOf`")?)
        } else {
            None
        };

        self.expect(TokenKind::LBrace, "expected `{` after class header")?;
        let mut body = Vec::new();
        while !matches!(self.current_kind(), TokenKind::RBrace | TokenKind::Eof) {
            let member = match self.current_kind() {
                TokenKind::Var => self.parse_var_decl(),
                TokenKind::Fun => self.parse_fun_decl(true),
                TokenKind::Struct => self.parse_struct_decl(),
                TokenKind::Class => self.parse_class_decl(),
                _ => {
                    self.error_here(
                        ErrorCode::UnexpectedToken,
                        "expected a declaration inside class body",
                    );
                    None
                }
            };
            match member {
                Some(member) => body.push(member),
                None => self.synchronize_within_braces(),
            }
        }
        self.expect(TokenKind::RBrace, "expected `}` to close class body")?;

        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(NodeKind::ClassDeclaration { name, parent, body }, span))
    }

    fn parse_if(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // if
        let condition = self.parse_expression()?;
        let true_branch = self.parse_statement()?;
        let false_branch = if self.eat(TokenKind::Else) {
            Some(self.parse_statement()?)
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(
            NodeKind::If {
                condition,
                true_branch,
                false_branch,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // while
        let condition = self.parse_expression()?;
        let body = self.parse_statement()?;
        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(NodeKind::While { condition, body }, span))
    }

    fn parse_return(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // return
        let expression = if self.current_kind().starts_expression() {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(NodeKind::Return { expression }, span))
    }

    fn parse_born(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        self.advance(); // born
        self.expect(TokenKind::LParen, "expected `(` after `born`")?;
        let function = self.parse_born_reference()?;
        let variable = if self.eat(TokenKind::Comma) {
            Some(self.parse_born_reference()?)
        } else {
            None
        };
        self.expect(TokenKind::RParen, "expected `)` to close `born(...)`")?;
        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(NodeKind::Born { function, variable }, span))
    }

    /// `born` takes plain identifiers: a function name and optionally a
    /// variable name.
    fn parse_born_reference(&mut self) -> Option<NodeId> {
        let span = self.current_span();
        let name = self.expect_ident("born(...) arguments must be plain identifiers")?;
        Some(self.ast.alloc(NodeKind::Reference { name }, span))
    }

    fn parse_expression_statement(&mut self) -> Option<NodeId> {
        let start = self.current_span();

        if let Some(desugared) = self.parse_quick_statement() {
            let span = start.merge(self.previous_span());
            return Some(
                self.ast
                    .alloc(NodeKind::ExpressionStatement { expression: desugared }, span),
            );
        }

        let expression = self.parse_expression()?;
        // Only calls and assignments are meaningful as statements.
        if !matches!(
            self.ast.kind(expression),
            NodeKind::Assignment { .. } | NodeKind::FunCall { .. } | NodeKind::DaddyCall { .. }
        ) {
            self.diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::Parser,
                    self.ast.span(expression),
                    "only calls and assignments can be used as statements",
                )
                .with_code(ErrorCode::UnexpectedToken),
            );
            return None;
        }
        let span = start.merge(self.previous_span());
        Some(self.ast.alloc(NodeKind::ExpressionStatement { expression }, span))
    }

    /// Desugar `i++`, `i--` and `i op= e` into assignments.
    fn parse_quick_statement(&mut self) -> Option<NodeId> {
        let name = match self.current_kind() {
            TokenKind::Ident(name) => name.clone(),
            _ => return None,
        };
        let op = match self.peek_kind(1) {
            TokenKind::PlusPlus => BinaryOp::Add,
            TokenKind::MinusMinus => BinaryOp::Sub,
            TokenKind::PlusEq => BinaryOp::Add,
            TokenKind::MinusEq => BinaryOp::Sub,
            TokenKind::StarEq => BinaryOp::Mul,
            TokenKind::SlashEq => BinaryOp::Div,
            TokenKind::PercentEq => BinaryOp::Rem,
            _ => return None,
        };
        let span = self.current_span();
        let is_step = matches!(
            self.peek_kind(1),
            TokenKind::PlusPlus | TokenKind::MinusMinus
        );
        self.advance(); // identifier
        self.advance(); // operator

        let target = self.ast.alloc(NodeKind::Reference { name: name.clone() }, span);
        let operand = self.ast.alloc(NodeKind::Reference { name }, span);
        let right = if is_step {
            self.ast.alloc(NodeKind::IntLiteral(1), span)
        } else {
            self.parse_expression()?
        };
        let value_span = span.merge(self.previous_span());
        let value = self.ast.alloc(
            NodeKind::Binary {
                op,
                left: operand,
                right,
            },
            value_span,
        );
        Some(self.ast.alloc(
            NodeKind::Assignment {
                left: target,
                right: value,
            },
            value_span,
        ))
    }

    // ── Types ───────────────────────────────────────────────────────

    fn parse_type(&mut self) -> Option<NodeId> {
        if matches!(self.current_kind(), TokenKind::Unborn) {
            let start = self.current_span();
            self.advance(); // Unborn
            self.expect(TokenKind::Lt, "expected `<` after `Unborn`")?;
            let inner = self.parse_array_type()?;
            self.expect(TokenKind::Gt, "expected `>` to close `Unborn<...>`")?;
            let span = start.merge(self.previous_span());
            return Some(self.ast.alloc(NodeKind::UnbornType { inner }, span));
        }
        self.parse_array_type()
    }

    fn parse_array_type(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let name = self.expect_ident("expected a type name")?;
        let mut ty = self.ast.alloc(NodeKind::SimpleType { name }, start);
        while matches!(self.current_kind(), TokenKind::LBracket)
            && matches!(self.peek_kind(1), TokenKind::RBracket)
        {
            self.advance();
            self.advance();
            let span = start.merge(self.previous_span());
            ty = self.ast.alloc(NodeKind::ArrayType { element: ty }, span);
        }
        Some(ty)
    }

    // ── Expressions ─────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Option<NodeId> {
        self.parse_assignment()
    }

    /// `a = b = c` is right-associative.
    fn parse_assignment(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let left = self.parse_or()?;
        if self.eat(TokenKind::Eq) {
            let right = self.parse_assignment()?;
            let span = start.merge(self.previous_span());
            return Some(self.ast.alloc(NodeKind::Assignment { left, right }, span));
        }
        Some(left)
    }

    fn parse_or(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::OrOr) {
            let right = self.parse_and()?;
            let span = start.merge(self.previous_span());
            left = self.ast.alloc(
                NodeKind::Binary {
                    op: BinaryOp::Or,
                    left,
                    right,
                },
                span,
            );
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let mut left = self.parse_comparison()?;
        while self.eat(TokenKind::AndAnd) {
            let right = self.parse_comparison()?;
            let span = start.merge(self.previous_span());
            left = self.ast.alloc(
                NodeKind::Binary {
                    op: BinaryOp::And,
                    left,
                    right,
                },
                span,
            );
        }
        Some(left)
    }

    fn parse_comparison(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                TokenKind::Siblings => BinaryOp::Siblings,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            let span = start.merge(self.previous_span());
            left = self.ast.alloc(NodeKind::Binary { op, left, right }, span);
        }
        Some(left)
    }

    fn parse_additive(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            let span = start.merge(self.previous_span());
            left = self.ast.alloc(NodeKind::Binary { op, left, right }, span);
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            let span = start.merge(self.previous_span());
            left = self.ast.alloc(NodeKind::Binary { op, left, right }, span);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<NodeId> {
        if matches!(self.current_kind(), TokenKind::Bang) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.merge(self.previous_span());
            return Some(self.ast.alloc(
                NodeKind::Unary {
                    op: UnaryOp::Not,
                    operand,
                },
                span,
            ));
        }
        self.parse_suffix()
    }

    /// Field access, array access and calls, applied left to right.
    fn parse_suffix(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let field = self.expect_ident("expected a field name after `.`")?;
                    let span = start.merge(self.previous_span());
                    expr = self.ast.alloc(NodeKind::FieldAccess { stem: expr, field }, span);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket, "expected `]` to close array access")?;
                    let span = start.merge(self.previous_span());
                    expr = self
                        .ast
                        .alloc(NodeKind::ArrayAccess { array: expr, index }, span);
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut arguments = Vec::new();
                    if !matches!(self.current_kind(), TokenKind::RParen) {
                        loop {
                            arguments.push(self.parse_expression()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "expected `)` to close call")?;
                    let span = start.merge(self.previous_span());
                    // `Daddy(args)` is its own construct, not a reference call.
                    let is_daddy = matches!(
                        self.ast.kind(expr),
                        NodeKind::Reference { name } if name == "Daddy"
                    );
                    expr = if is_daddy {
                        self.ast.alloc(NodeKind::DaddyCall { arguments }, span)
                    } else {
                        self.ast.alloc(
                            NodeKind::FunCall {
                                function: expr,
                                arguments,
                            },
                            span,
                        )
                    };
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<NodeId> {
        let span = self.current_span();
        match self.current_kind().clone() {
            TokenKind::Int(value) => {
                self.advance();
                Some(self.ast.alloc(NodeKind::IntLiteral(value), span))
            }
            TokenKind::Float(value) => {
                self.advance();
                Some(self.ast.alloc(NodeKind::FloatLiteral(value), span))
            }
            TokenKind::String(value) => {
                self.advance();
                Some(self.ast.alloc(NodeKind::StringLiteral(value), span))
            }
            // A minus sign folds into a numeric literal; Sigh has no general
            // arithmetic negation operator.
            TokenKind::Minus => {
                self.advance();
                let lit_span = self.current_span();
                match self.current_kind().clone() {
                    TokenKind::Int(value) => {
                        self.advance();
                        Some(self.ast.alloc(NodeKind::IntLiteral(-value), span.merge(lit_span)))
                    }
                    TokenKind::Float(value) => {
                        self.advance();
                        Some(
                            self.ast
                                .alloc(NodeKind::FloatLiteral(-value), span.merge(lit_span)),
                        )
                    }
                    _ => {
                        self.error_here(
                            ErrorCode::ExpectedExpression,
                            "expected a number after `-`",
                        );
                        None
                    }
                }
            }
            TokenKind::Ident(name) => {
                self.advance();
                Some(self.ast.alloc(NodeKind::Reference { name }, span))
            }
            TokenKind::Dollar => {
                self.advance();
                let ref_span = self.current_span();
                let name = self.expect_ident("expected a struct name after `$`")?;
                let reference = self.ast.alloc(NodeKind::Reference { name }, ref_span);
                Some(
                    self.ast
                        .alloc(NodeKind::Constructor { reference }, span.merge(ref_span)),
                )
            }
            TokenKind::LParen => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect(TokenKind::RParen, "expected `)`")?;
                let full = span.merge(self.previous_span());
                Some(self.ast.alloc(NodeKind::Parenthesized { expression }, full))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !matches!(self.current_kind(), TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "expected `]` to close array literal")?;
                let full = span.merge(self.previous_span());
                Some(self.ast.alloc(NodeKind::ArrayLiteral { elements }, full))
            }
            _ => {
                self.error_here(ErrorCode::ExpectedExpression, "expected an expression");
                None
            }
        }
    }

    // ── Token cursor ────────────────────────────────────────────────

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.pos == 0 {
            self.current_span()
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if *self.current_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Option<()> {
        if self.eat(kind) {
            Some(())
        } else {
            self.error_here(ErrorCode::UnexpectedToken, message);
            None
        }
    }

    fn expect_ident(&mut self, message: &str) -> Option<String> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => {
                self.error_here(ErrorCode::ExpectedIdentifier, message);
                None
            }
        }
    }

    fn error_here(&mut self, code: ErrorCode, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::error(DiagnosticKind::Parser, self.current_span(), message)
                .with_code(code),
        );
    }

    /// Skip forward to something that can start a statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.at_end() {
            if matches!(
                self.current_kind(),
                TokenKind::Var
                    | TokenKind::Fun
                    | TokenKind::Struct
                    | TokenKind::Class
                    | TokenKind::If
                    | TokenKind::While
                    | TokenKind::Return
                    | TokenKind::Born
                    | TokenKind::LBrace
            ) {
                return;
            }
            self.advance();
        }
    }

    /// Like [`Self::synchronize`], but also stops at a closing brace so a
    /// broken member does not swallow the rest of the enclosing body.
    fn synchronize_within_braces(&mut self) {
        self.advance();
        while !self.at_end() {
            if matches!(
                self.current_kind(),
                TokenKind::Var
                    | TokenKind::Fun
                    | TokenKind::Struct
                    | TokenKind::Class
                    | TokenKind::RBrace
            ) {
                return;
            }
            self.advance();
        }
    }
}
