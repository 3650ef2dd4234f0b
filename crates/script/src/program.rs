//! Lowered, type-checked form of a route class.

use std::collections::HashMap;

use switchyard_core::{ExpressionLanguage, HttpMethod};

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl Value {
    pub fn ty(&self) -> Ty {
        match self {
            Value::Str(_) => Ty::Str,
            Value::Int(_) => Ty::Int,
            Value::Bool(_) => Ty::Bool,
            Value::Null => Ty::Null,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
        }
    }
}

/// Static type of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    Str,
    Int,
    Bool,
    Null,
}

impl std::fmt::Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::Str => write!(f, "String"),
            Ty::Int => write!(f, "int"),
            Ty::Bool => write!(f, "boolean"),
            Ty::Null => write!(f, "<null>"),
        }
    }
}

/// An argument, evaluated when the builder is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Const(Value),
    /// `getContext().resolvePropertyPlaceholders(..)`
    Placeholders(Box<Operand>),
    /// String concatenation of the parts.
    Concat(Vec<Operand>),
}

impl Operand {
    pub fn ty(&self) -> Ty {
        match self {
            Operand::Const(value) => value.ty(),
            Operand::Placeholders(_) | Operand::Concat(_) => Ty::Str,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprOperand {
    pub language: ExpressionLanguage,
    pub text: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOp {
    RouteId(Operand),
    Description(Operand),
    AutoStartup(Operand),
    To(Vec<Operand>),
    ToD(Operand),
    Log(Operand),
    SetBody(ExprOperand),
    SetHeader(Operand, ExprOperand),
    RemoveHeader(Operand),
    Transform(ExprOperand),
    Filter(ExprOperand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestOp {
    Description(Operand),
    Consumes(Operand),
    Produces(Operand),
    Verb(HttpMethod, Option<Operand>),
    To(Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestOption {
    Component,
    Host,
    Port,
    Scheme,
    ContextPath,
    ApiContextPath,
    BindingMode,
    EnableCors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestPropertyKind {
    Component,
    Endpoint,
    Consumer,
    DataFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestConfigOp {
    Set(RestOption, Operand),
    Property(RestPropertyKind, Operand, Operand),
}

/// One statement of a method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Route {
        from: Operand,
        ops: Vec<RouteOp>,
    },
    Rest {
        path: Option<Operand>,
        ops: Vec<RestOp>,
    },
    RestConfiguration {
        component: Option<Operand>,
        ops: Vec<RestConfigOp>,
    },
    /// Call a no-argument method of the same class.
    Invoke(String),
    Throw {
        exception: String,
        message: Option<Operand>,
    },
    Return,
}

/// A lowered class, ready to be instantiated.
#[derive(Debug, Clone)]
pub struct ClassProgram {
    pub name: String,
    pub qualified_name: String,
    pub is_abstract: bool,
    /// Whether instances expose the route-builder capability.
    pub route_builder: bool,
    /// Body of the no-argument constructor; `None` when only constructors with
    /// parameters are declared.
    pub constructor: Option<Vec<Op>>,
    /// Bodies of the no-argument methods, keyed by name.
    pub methods: HashMap<String, Vec<Op>>,
}
