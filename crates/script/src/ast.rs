//! Syntax tree for route class sources.

use crate::token::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// A dotted name such as `org.apache.camel.builder.RouteBuilder`.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    pub segments: Vec<String>,
    pub span: Span,
}

impl QualifiedName {
    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub package: Option<QualifiedName>,
    pub imports: Vec<QualifiedName>,
    pub classes: Vec<ClassDecl>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifiers {
    pub public: bool,
    pub protected: bool,
    pub private: bool,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub annotations: Vec<QualifiedName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub modifiers: Modifiers,
    pub name: Ident,
    pub extends: Option<QualifiedName>,
    pub implements: Vec<QualifiedName>,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(FieldDecl),
    Constructor(ConstructorDecl),
    Method(MethodDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub name: QualifiedName,
    pub array: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: TypeRef,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub name: Ident,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    pub modifiers: Modifiers,
    pub name: Ident,
    pub params: Vec<Param>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    /// `None` for `void`.
    pub return_type: Option<TypeRef>,
    pub name: Ident,
    pub params: Vec<Param>,
    pub throws: Vec<QualifiedName>,
    /// `None` for abstract methods.
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Local {
        ty: TypeRef,
        name: Ident,
        init: Option<Expr>,
    },
    Throw(Expr, Span),
    Return(Span),
    Block(Block),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Char(char),
    Int(i64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal, Span),
    Name(Ident),
    This(Span),
    Field {
        target: Box<Expr>,
        name: Ident,
    },
    Call {
        target: Option<Box<Expr>>,
        name: Ident,
        args: Vec<Expr>,
        span: Span,
    },
    New {
        class: QualifiedName,
        args: Vec<Expr>,
        span: Span,
    },
    Concat {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, span) | Expr::This(span) => span.clone(),
            Expr::Name(ident) => ident.span.clone(),
            Expr::Field { target, name } => target.span().start..name.span.end,
            Expr::Call { span, .. } | Expr::New { span, .. } => span.clone(),
            Expr::Concat { lhs, rhs } => lhs.span().start..rhs.span().end,
        }
    }
}
