//! Recursive descent parser for route class sources.

use switchyard_core::Diagnostic;

use crate::ast::*;
use crate::token::{Span, Token, TokenKind};

pub type ParseResult<T> = Result<T, Diagnostic>;

/// Limit on nested expressions and blocks.
const MAX_NESTING: usize = 128;

/// Limit on `.` and `+` links in the expressions of one statement.
const MAX_EXPRESSION_LINKS: usize = 512;

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    links: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with an `Eof` token.
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            current: 0,
            depth: 0,
            links: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parses a complete compilation unit, collecting every syntax error.
    pub fn parse_unit(mut self) -> Result<CompilationUnit, Vec<Diagnostic>> {
        let package = match self.parse_package() {
            Ok(package) => package,
            Err(err) => {
                self.diagnostics.push(err);
                self.synchronize_top_level();
                None
            }
        };

        let mut imports = Vec::new();
        while self.check(&TokenKind::Import) {
            match self.parse_import() {
                Ok(import) => imports.push(import),
                Err(err) => {
                    self.diagnostics.push(err);
                    self.synchronize_top_level();
                }
            }
        }

        let mut classes = Vec::new();
        while !self.is_at_end() {
            if self.eat(&TokenKind::Semi) {
                continue;
            }
            match self.parse_class() {
                Ok(class) => classes.push(class),
                Err(err) => {
                    self.diagnostics.push(err);
                    self.synchronize_top_level();
                }
            }
        }

        if self.diagnostics.is_empty() {
            Ok(CompilationUnit {
                package,
                imports,
                classes,
            })
        } else {
            Err(self.diagnostics)
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn current_token(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.current + offset).min(last)].kind
    }

    fn previous_span(&self) -> Span {
        if self.current == 0 {
            return 0..0;
        }
        self.tokens[self.current - 1].span.clone()
    }

    fn is_at_end(&self) -> bool {
        self.current_token().kind == TokenKind::Eof
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current_token().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_here(&self, expected: &str) -> Diagnostic {
        let token = self.current_token();
        Diagnostic::at(
            self.source,
            token.span.clone(),
            format!("expected {}, found {}", expected, token.kind.describe()),
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Span> {
        if self.check(&kind) {
            Ok(self.advance().span)
        } else {
            Err(self.error_here(expected))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Ident> {
        match &self.current_token().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok(Ident { name, span })
            }
            _ => Err(self.error_here("<identifier>")),
        }
    }

    fn enter(&mut self, what: &str) -> ParseResult<()> {
        if self.depth >= MAX_NESTING {
            let token = self.current_token();
            return Err(Diagnostic::at(
                self.source,
                token.span.clone(),
                format!("{} nested too deeply", what),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn link(&mut self) -> ParseResult<()> {
        self.links += 1;
        if self.links > MAX_EXPRESSION_LINKS {
            let token = self.current_token();
            return Err(Diagnostic::at(self.source, token.span.clone(), "expression too long"));
        }
        Ok(())
    }

    /// Skip to the next plausible top-level start.
    fn synchronize_top_level(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.current_token().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                TokenKind::Semi if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip to the end of the current member or statement.
    fn synchronize_member(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.current_token().kind {
                TokenKind::Semi if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_qualified_name(&mut self) -> ParseResult<QualifiedName> {
        let first = self.expect_ident()?;
        let start = first.span.start;
        let mut segments = vec![first.name];
        while self.check(&TokenKind::Dot) && matches!(self.peek_kind(1), TokenKind::Ident(_)) {
            self.advance();
            segments.push(self.expect_ident()?.name);
        }
        Ok(QualifiedName {
            segments,
            span: start..self.previous_span().end,
        })
    }

    fn parse_package(&mut self) -> ParseResult<Option<QualifiedName>> {
        // Annotations on a package declaration are not supported; leave them for the class.
        if !self.check(&TokenKind::Package) {
            return Ok(None);
        }
        self.advance();
        let name = self.parse_qualified_name()?;
        self.expect(TokenKind::Semi, "';'")?;
        Ok(Some(name))
    }

    fn parse_import(&mut self) -> ParseResult<QualifiedName> {
        self.expect(TokenKind::Import, "'import'")?;
        self.eat(&TokenKind::Static);
        let mut name = self.parse_qualified_name()?;
        if self.eat(&TokenKind::Dot) {
            self.expect(TokenKind::Star, "'*' or identifier")?;
            name.segments.push("*".to_string());
            name.span.end = self.previous_span().end;
        }
        self.expect(TokenKind::Semi, "';'")?;
        Ok(name)
    }

    fn parse_annotation(&mut self) -> ParseResult<QualifiedName> {
        self.expect(TokenKind::At, "'@'")?;
        let name = self.parse_qualified_name()?;
        if self.check(&TokenKind::LParen) {
            // Annotation arguments carry no meaning here; skip them balanced.
            let mut depth = 0usize;
            loop {
                match self.advance().kind {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    TokenKind::Eof => return Err(self.error_here("')'")),
                    _ => {}
                }
            }
        }
        Ok(name)
    }

    fn parse_modifiers(&mut self) -> ParseResult<Modifiers> {
        let mut modifiers = Modifiers::default();
        loop {
            match self.current_token().kind {
                TokenKind::At => {
                    let annotation = self.parse_annotation()?;
                    modifiers.annotations.push(annotation);
                }
                TokenKind::Public => {
                    self.advance();
                    modifiers.public = true;
                }
                TokenKind::Protected => {
                    self.advance();
                    modifiers.protected = true;
                }
                TokenKind::Private => {
                    self.advance();
                    modifiers.private = true;
                }
                TokenKind::Static => {
                    self.advance();
                    modifiers.is_static = true;
                }
                TokenKind::Final => {
                    self.advance();
                    modifiers.is_final = true;
                }
                TokenKind::Abstract => {
                    self.advance();
                    modifiers.is_abstract = true;
                }
                _ => return Ok(modifiers),
            }
        }
    }

    fn parse_class(&mut self) -> ParseResult<ClassDecl> {
        let start = self.current_token().span.start;
        let modifiers = self.parse_modifiers()?;

        match self.current_token().kind {
            TokenKind::Class => {
                self.advance();
            }
            TokenKind::Interface | TokenKind::Enum => {
                let token = self.current_token();
                return Err(Diagnostic::at(
                    self.source,
                    token.span.clone(),
                    format!("{} declarations are not supported", token.kind.describe()),
                ));
            }
            _ => return Err(self.error_here("class declaration")),
        }

        let name = self.expect_ident()?;
        let extends = if self.eat(&TokenKind::Extends) {
            Some(self.parse_qualified_name()?)
        } else {
            None
        };

        let mut implements = Vec::new();
        if self.eat(&TokenKind::Implements) {
            implements.push(self.parse_qualified_name()?);
            while self.eat(&TokenKind::Comma) {
                implements.push(self.parse_qualified_name()?);
            }
        }

        self.expect(TokenKind::LBrace, "'{'")?;
        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(&TokenKind::Semi) {
                continue;
            }
            match self.parse_member(&name.name) {
                Ok(member) => members.push(member),
                Err(err) => {
                    self.diagnostics.push(err);
                    self.synchronize_member();
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;

        Ok(ClassDecl {
            modifiers,
            name,
            extends,
            implements,
            members,
            span: start..self.previous_span().end,
        })
    }

    fn parse_type(&mut self) -> ParseResult<TypeRef> {
        let name = self.parse_qualified_name()?;
        if self.check(&TokenKind::Lt) {
            let token = self.current_token();
            return Err(Diagnostic::at(
                self.source,
                token.span.clone(),
                "generic types are not supported",
            ));
        }
        let array = if self.eat(&TokenKind::LBracket) {
            self.expect(TokenKind::RBracket, "']'")?;
            true
        } else {
            false
        };
        Ok(TypeRef { name, array })
    }

    fn parse_member(&mut self, class_name: &str) -> ParseResult<Member> {
        let modifiers = self.parse_modifiers()?;

        if matches!(self.current_token().kind, TokenKind::Class | TokenKind::Interface | TokenKind::Enum) {
            let token = self.current_token();
            return Err(Diagnostic::at(
                self.source,
                token.span.clone(),
                "nested type declarations are not supported",
            ));
        }

        // Constructor: `Name (`
        if let TokenKind::Ident(name) = &self.current_token().kind {
            if name == class_name && self.peek_kind(1) == &TokenKind::LParen {
                let name = self.expect_ident()?;
                let params = self.parse_params()?;
                self.parse_throws()?;
                let body = self.parse_block()?;
                return Ok(Member::Constructor(ConstructorDecl {
                    modifiers,
                    name,
                    params,
                    body,
                }));
            }
        }

        let return_type = if self.eat(&TokenKind::Void) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let name = self.expect_ident()?;

        if self.check(&TokenKind::LParen) {
            let params = self.parse_params()?;
            let throws = self.parse_throws()?;
            let body = if self.eat(&TokenKind::Semi) {
                None
            } else {
                Some(self.parse_block()?)
            };
            return Ok(Member::Method(MethodDecl {
                modifiers,
                return_type,
                name,
                params,
                throws,
                body,
            }));
        }

        let Some(ty) = return_type else {
            return Err(Diagnostic::at(
                self.source,
                name.span.clone(),
                "'void' type not allowed here",
            ));
        };
        self.links = 0;
        let init = if self.eat(&TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semi, "';'")?;
        Ok(Member::Field(FieldDecl {
            modifiers,
            ty,
            name,
            init,
        }))
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                self.eat(&TokenKind::Final);
                let ty = self.parse_type()?;
                let name = self.expect_ident()?;
                params.push(Param { ty, name });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(params)
    }

    fn parse_throws(&mut self) -> ParseResult<Vec<QualifiedName>> {
        let mut throws = Vec::new();
        if self.eat(&TokenKind::Throws) {
            throws.push(self.parse_qualified_name()?);
            while self.eat(&TokenKind::Comma) {
                throws.push(self.parse_qualified_name()?);
            }
        }
        Ok(throws)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> ParseResult<Block> {
        self.enter("block")?;
        let block = self.parse_block_body();
        self.depth -= 1;
        block
    }

    fn parse_block_body(&mut self) -> ParseResult<Block> {
        let start = self.expect(TokenKind::LBrace, "'{'")?.start;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.diagnostics.push(err);
                    self.synchronize_member();
                }
            }
        }
        let end = self.expect(TokenKind::RBrace, "'}'")?.end;
        Ok(Block {
            stmts,
            span: start..end,
        })
    }

    fn is_local_declaration(&self) -> bool {
        if self.check(&TokenKind::Final) {
            return true;
        }
        // `Type name` or `a.b.Type name`
        let mut offset = 0;
        loop {
            match self.peek_kind(offset) {
                TokenKind::Ident(_) => {}
                _ => return false,
            }
            match self.peek_kind(offset + 1) {
                TokenKind::Dot => offset += 2,
                TokenKind::Ident(_) => return true,
                TokenKind::LBracket => return self.peek_kind(offset + 2) == &TokenKind::RBracket,
                _ => return false,
            }
        }
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        self.links = 0;
        match self.current_token().kind {
            TokenKind::Semi => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Return => {
                let span = self.advance().span;
                if !self.check(&TokenKind::Semi) {
                    let token = self.current_token();
                    return Err(Diagnostic::at(
                        self.source,
                        token.span.clone(),
                        "incompatible types: unexpected return value",
                    ));
                }
                self.advance();
                Ok(Stmt::Return(span))
            }
            TokenKind::Throw => {
                let start = self.advance().span.start;
                let expr = self.parse_expr()?;
                let end = self.expect(TokenKind::Semi, "';'")?.end;
                Ok(Stmt::Throw(expr, start..end))
            }
            _ if self.is_local_declaration() => {
                self.eat(&TokenKind::Final);
                let ty = self.parse_type()?;
                let name = self.expect_ident()?;
                let init = if self.eat(&TokenKind::Eq) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Local { ty, name, init })
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.enter("expression")?;
        let expr = self.parse_concat();
        self.depth -= 1;
        expr
    }

    fn parse_concat(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_postfix()?;
        while self.eat(&TokenKind::Plus) {
            self.link()?;
            let rhs = self.parse_postfix()?;
            lhs = Expr::Concat {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.eat(&TokenKind::Dot) {
            self.link()?;
            let name = self.expect_ident()?;
            if self.check(&TokenKind::LParen) {
                let args = self.parse_args()?;
                let span = expr.span().start..self.previous_span().end;
                expr = Expr::Call {
                    target: Some(Box::new(expr)),
                    name,
                    args,
                    span,
                };
            } else {
                expr = Expr::Field {
                    target: Box::new(expr),
                    name,
                };
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.current_token().clone();
        let literal = match &token.kind {
            TokenKind::Str(s) => Some(Literal::Str(s.clone())),
            TokenKind::Char(c) => Some(Literal::Char(*c)),
            TokenKind::Int(i) => Some(Literal::Int(*i)),
            TokenKind::True => Some(Literal::Bool(true)),
            TokenKind::False => Some(Literal::Bool(false)),
            TokenKind::Null => Some(Literal::Null),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok(Expr::Literal(literal, token.span));
        }

        match token.kind {
            TokenKind::This => {
                self.advance();
                Ok(Expr::This(token.span))
            }
            TokenKind::New => {
                self.advance();
                let class = self.parse_qualified_name()?;
                let args = self.parse_args()?;
                Ok(Expr::New {
                    class,
                    args,
                    span: token.span.start..self.previous_span().end,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Ident(_) => {
                let name = self.expect_ident()?;
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    Ok(Expr::Call {
                        target: None,
                        span: name.span.start..self.previous_span().end,
                        name,
                        args,
                    })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            _ => Err(self.error_here("expression")),
        }
    }
}
