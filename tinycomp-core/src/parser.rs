//! Recursive-descent parser with precedence climbing for expressions.
//!
//! Local declarations and expression statements share a prefix
//! (`a.b ...` can start either), so statements are parsed speculatively:
//! the parser takes a [`Cursor`] snapshot, tries `Type name`, and rewinds
//! to the snapshot when that does not match.

use crate::ast::{
    BinaryOp, Decl, Expr, ExprKind, Field, FunctionDecl, Ident, Param, Stmt, StmtKind,
    StructDecl, TypeExpr, Unit,
};
use crate::error::CoreError;
use crate::lexer::{Token, TokenKind, lex};
use crate::span::Position;

pub fn parse(input: &str) -> Result<Unit, CoreError> {
    let tokens = lex(input)?;
    let mut parser = Parser::new(tokens);
    parser.parse_unit()
}

/// Saved parser position for backtracking.
#[derive(Debug, Clone, Copy)]
struct Cursor(usize);

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            position: 0,
        }
    }

    // ------------------------------------------------------------------
    // Token utilities
    // ------------------------------------------------------------------

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn current(&self) -> &Token {
        // The lexer always terminates the stream with `Eof`.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn pos(&self) -> Position {
        self.current().pos
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<(), CoreError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn error(&self, message: impl Into<String>) -> CoreError {
        CoreError::parse(self.pos(), message)
    }

    fn save(&self) -> Cursor {
        Cursor(self.position)
    }

    fn restore(&mut self, cursor: Cursor) {
        self.position = cursor.0;
    }

    fn parse_ident(&mut self) -> Option<Ident> {
        let pos = self.pos();
        if let TokenKind::Ident(name) = self.peek() {
            let name = name.clone();
            self.advance();
            Some(Ident { name, pos })
        } else {
            None
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_unit(&mut self) -> Result<Unit, CoreError> {
        let mut decls = Vec::new();
        while let Some(decl) = self.parse_decl()? {
            decls.push(decl);
        }
        if *self.peek() != TokenKind::Eof {
            return Err(self.error(format!("unexpected {}", self.peek().describe())));
        }
        Ok(Unit { decls })
    }

    fn parse_decl(&mut self) -> Result<Option<Decl>, CoreError> {
        if let Some(decl) = self.parse_struct()? {
            return Ok(Some(Decl::Struct(decl)));
        }
        Ok(self.parse_function()?.map(Decl::Function))
    }

    fn parse_struct(&mut self) -> Result<Option<StructDecl>, CoreError> {
        let pos = self.pos();
        if !self.eat(&TokenKind::Struct) {
            return Ok(None);
        }
        let name = self
            .parse_ident()
            .ok_or_else(|| self.error("expected struct name"))?;
        self.expect(&TokenKind::LBrace, "expected left brace")?;
        let mut fields = Vec::new();
        while let Some(ty) = self.parse_type()? {
            let name = self
                .parse_ident()
                .ok_or_else(|| self.error("expected field name"))?;
            fields.push(Field { ty, name });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "expected right brace or field")?;
        Ok(Some(StructDecl { name, fields, pos }))
    }

    fn parse_function(&mut self) -> Result<Option<FunctionDecl>, CoreError> {
        let pos = self.pos();
        let is_exported = self.eat(&TokenKind::Export);
        let ret = if self.eat(&TokenKind::Void) {
            None
        } else {
            match self.parse_type()? {
                Some(ty) => Some(ty),
                None if is_exported => return Err(self.error("expected function return type")),
                None => return Ok(None),
            }
        };
        let name = self.parse_ident();
        self.expect(&TokenKind::LParen, "expected left paren or function name")?;

        let mut params = Vec::new();
        if *self.peek() != TokenKind::RParen {
            loop {
                params.push(self.parse_param()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "expected right paren")?;
        self.expect(&TokenKind::LBrace, "expected left brace")?;

        let mut body = Vec::new();
        while let Some(stmt) = self.parse_stmt()? {
            body.push(stmt);
        }
        let end = self.pos();
        self.expect(&TokenKind::RBrace, "expected statement or right brace")?;

        Ok(Some(FunctionDecl {
            name,
            ret,
            is_exported,
            params,
            body,
            pos,
            end,
        }))
    }

    fn parse_param(&mut self) -> Result<Param, CoreError> {
        let by_ref = self.eat(&TokenKind::Ref);
        let ty = self
            .parse_type()?
            .ok_or_else(|| self.error("expected argument type"))?;
        let name = self
            .parse_ident()
            .ok_or_else(|| self.error("expected argument name"))?;
        Ok(Param { ty, name, by_ref })
    }

    /// `name(.name)* [< type, ... >]`
    fn parse_type(&mut self) -> Result<Option<TypeExpr>, CoreError> {
        let pos = self.pos();
        let Some(first) = self.parse_ident() else {
            return Ok(None);
        };
        let mut path = vec![first.name];
        while *self.peek() == TokenKind::Dot && matches!(self.peek_at(1), TokenKind::Ident(_)) {
            self.advance();
            if let Some(segment) = self.parse_ident() {
                path.push(segment.name);
            }
        }

        let mut args = Vec::new();
        if self.eat(&TokenKind::Less) {
            loop {
                let arg = self
                    .parse_type()?
                    .ok_or_else(|| self.error("expected type name"))?;
                args.push(arg);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Greater, "expected right caret")?;
        }
        Ok(Some(TypeExpr { path, args, pos }))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_stmt(&mut self) -> Result<Option<Stmt>, CoreError> {
        let pos = self.pos();
        let kind = match self.peek() {
            TokenKind::LBrace => {
                self.advance();
                let mut stmts = Vec::new();
                while let Some(stmt) = self.parse_stmt()? {
                    stmts.push(stmt);
                }
                self.expect(&TokenKind::RBrace, "expected right brace")?;
                StmtKind::Block(stmts)
            }
            TokenKind::If => {
                self.advance();
                let (cond, body) = self.parse_condition_and_body()?;
                StmtKind::If { cond, body }
            }
            TokenKind::While => {
                self.advance();
                let (cond, body) = self.parse_condition_and_body()?;
                StmtKind::While { cond, body }
            }
            TokenKind::Return => {
                self.advance();
                let value = self
                    .parse_expr()?
                    .ok_or_else(|| self.error("expected expression"))?;
                self.expect(&TokenKind::Semi, "expected semicolon")?;
                StmtKind::Return(value)
            }
            TokenKind::Semi => {
                self.advance();
                StmtKind::Empty
            }
            _ => {
                let kind = if let Some(local) = self.parse_local()? {
                    local
                } else if let Some(expr) = self.parse_expr()? {
                    StmtKind::Expr(expr)
                } else {
                    return Ok(None);
                };
                self.expect(&TokenKind::Semi, "expected semicolon")?;
                kind
            }
        };
        Ok(Some(Stmt { kind, pos }))
    }

    fn parse_condition_and_body(&mut self) -> Result<(Expr, Box<Stmt>), CoreError> {
        self.expect(&TokenKind::LParen, "expected left paren")?;
        let cond = self
            .parse_expr()?
            .ok_or_else(|| self.error("expected expression"))?;
        self.expect(&TokenKind::RParen, "expected right paren")?;
        let body = self
            .parse_stmt()?
            .ok_or_else(|| self.error("expected statement"))?;
        Ok((cond, Box::new(body)))
    }

    /// `Type name [= expr]`, rewinding when the input is not a declaration.
    fn parse_local(&mut self) -> Result<Option<StmtKind>, CoreError> {
        let snapshot = self.save();
        let Some(ty) = self.parse_type()? else {
            return Ok(None);
        };
        let Some(name) = self.parse_ident() else {
            self.restore(snapshot);
            return Ok(None);
        };
        let init = if self.eat(&TokenKind::Equal) {
            let init = self
                .parse_expr()?
                .ok_or_else(|| self.error("expected initializer expression"))?;
            Some(init)
        } else {
            None
        };
        Ok(Some(StmtKind::Local { ty, name, init }))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expr(&mut self) -> Result<Option<Expr>, CoreError> {
        let Some(target) = self.parse_binary(0)? else {
            return Ok(None);
        };
        if !self.eat(&TokenKind::Equal) {
            return Ok(Some(target));
        }
        let value = self
            .parse_expr()?
            .ok_or_else(|| self.error("expected expression"))?;
        let pos = target.pos;
        Ok(Some(Expr {
            kind: ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            pos,
        }))
    }

    /// Left-associative binary operators, one tier per level.
    fn parse_binary(&mut self, tier: usize) -> Result<Option<Expr>, CoreError> {
        if tier == BINARY_TIERS {
            return self.parse_unary();
        }
        let Some(mut left) = self.parse_binary(tier + 1)? else {
            return Ok(None);
        };
        while let Some(op) = binary_op(self.peek(), tier) {
            self.advance();
            let right = self
                .parse_binary(tier + 1)?
                .ok_or_else(|| self.error("expected expression"))?;
            let pos = left.pos;
            left = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                pos,
            };
        }
        Ok(Some(left))
    }

    fn parse_unary(&mut self) -> Result<Option<Expr>, CoreError> {
        let pos = self.pos();
        if self.eat(&TokenKind::Amp) {
            let target = self
                .parse_unary()?
                .ok_or_else(|| self.error("expected expression"))?;
            return Ok(Some(Expr {
                kind: ExprKind::AddressOf(Box::new(target)),
                pos,
            }));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Option<Expr>, CoreError> {
        let pos = self.pos();
        let kind = match self.peek().clone() {
            TokenKind::LParen => {
                self.advance();
                let expr = self
                    .parse_expr()?
                    .ok_or_else(|| self.error("expected expression"))?;
                self.expect(&TokenKind::RParen, "expected right paren")?;
                return Ok(Some(expr));
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_list(&TokenKind::RBracket, "expected right bracket")?;
                ExprKind::Vector(items)
            }
            TokenKind::Str(value) => {
                self.advance();
                ExprKind::Str(value)
            }
            TokenKind::Number(value) => {
                self.advance();
                ExprKind::Number(value)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::Ident(_) => return self.parse_access().map(Some),
            _ => return Ok(None),
        };
        Ok(Some(Expr { kind, pos }))
    }

    /// Comma separated expressions up to `close`; the opening token has
    /// already been consumed.
    fn parse_list(&mut self, close: &TokenKind, message: &str) -> Result<Vec<Expr>, CoreError> {
        let mut items = Vec::new();
        if let Some(first) = self.parse_expr()? {
            items.push(first);
            while self.eat(&TokenKind::Comma) {
                let item = self
                    .parse_expr()?
                    .ok_or_else(|| self.error("expected expression"))?;
                items.push(item);
            }
        }
        self.expect(close, message)?;
        Ok(items)
    }

    fn parse_access(&mut self) -> Result<Expr, CoreError> {
        let pos = self.pos();
        let ident = self
            .parse_ident()
            .ok_or_else(|| self.error("expected identifier"))?;
        let mut expr = Expr {
            kind: ExprKind::Ident(ident.name),
            pos,
        };
        loop {
            let kind = match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let member = self
                        .parse_ident()
                        .ok_or_else(|| self.error("expected identifier after dot"))?;
                    ExprKind::Member {
                        target: Box::new(expr),
                        member,
                    }
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_list(&TokenKind::RParen, "expected right paren")?;
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self
                        .parse_expr()?
                        .ok_or_else(|| self.error("expected expression for key access"))?;
                    self.expect(&TokenKind::RBracket, "expected right bracket")?;
                    ExprKind::Index {
                        target: Box::new(expr),
                        key: Box::new(key),
                    }
                }
                _ => return Ok(expr),
            };
            expr = Expr { kind, pos };
        }
    }
}

/// Number of binary operator tiers: equality, additive, multiplicative.
const BINARY_TIERS: usize = 3;

/// Binary operator for `kind` at `tier`, lowest precedence first.
fn binary_op(kind: &TokenKind, tier: usize) -> Option<BinaryOp> {
    match (tier, kind) {
        (0, TokenKind::EqualEqual) => Some(BinaryOp::Eq),
        (1, TokenKind::Plus) => Some(BinaryOp::Add),
        (1, TokenKind::Minus) => Some(BinaryOp::Sub),
        (2, TokenKind::Star) => Some(BinaryOp::Mul),
        (2, TokenKind::Slash) => Some(BinaryOp::Div),
        _ => None,
    }
}
