//! Lowering: name resolution, type checks and route DSL vocabulary checks.
//!
//! Turns a parsed [`CompilationUnit`] into the [`ClassProgram`] named by the
//! unit's qualified name. Every problem found is reported as a diagnostic; the
//! unit only lowers successfully when none are found.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use switchyard_core::{Diagnostic, ExpressionLanguage, HttpMethod};

use crate::ast::*;
use crate::program::*;
use crate::token::Span;

/// Supertypes that give a class the route-builder capability.
const ROUTE_BUILDER_TYPES: &[&str] = &[
    "org.apache.camel.builder.RouteBuilder",
    "org.apache.camel.builder.endpoint.EndpointRouteBuilder",
];

const OBJECT_TYPE: &str = "java.lang.Object";

const KNOWN_INTERFACES: &[&str] = &["org.apache.camel.RoutesBuilder"];

const BINDING_MODES: &[&str] = &["off", "auto", "json", "xml", "json_xml"];

const STR: &[Ty] = &[Ty::Str];
const STR_OR_INT: &[Ty] = &[Ty::Str, Ty::Int];
const BOOL_OR_STR: &[Ty] = &[Ty::Bool, Ty::Str];
const CONSTANT_VALUE: &[Ty] = &[Ty::Str, Ty::Int, Ty::Bool];

/// `name` refers to `known` either fully qualified or by its simple name.
fn matches_type(name: &QualifiedName, known: &str) -> bool {
    if name.segments.len() == 1 {
        known.rsplit('.').next() == Some(name.last())
    } else {
        name.to_string() == known
    }
}

fn declared_ty(ty: &TypeRef) -> Option<Ty> {
    if ty.array {
        return None;
    }
    match ty.name.to_string().as_str() {
        "String" | "java.lang.String" => Some(Ty::Str),
        "int" | "long" | "short" | "byte" | "Integer" | "Long" => Some(Ty::Int),
        "boolean" | "Boolean" => Some(Ty::Bool),
        _ => None,
    }
}

fn default_value(ty: &TypeRef) -> Value {
    match (ty.array, ty.name.to_string().as_str()) {
        (false, "int" | "long" | "short" | "byte") => Value::Int(0),
        (false, "boolean") => Value::Bool(false),
        _ => Value::Null,
    }
}

fn stmt_span(stmt: &Stmt) -> Option<Span> {
    match stmt {
        Stmt::Expr(expr) => Some(expr.span()),
        Stmt::Local { name, .. } => Some(name.span.clone()),
        Stmt::Throw(_, span) | Stmt::Return(span) => Some(span.clone()),
        Stmt::Block(block) => Some(block.span.clone()),
        Stmt::Empty => None,
    }
}

/// Lower `unit`, returning the class named by `qualified_name`.
pub fn lower_unit(
    source: &str,
    unit: &CompilationUnit,
    qualified_name: &str,
) -> Result<ClassProgram, Vec<Diagnostic>> {
    let mut lowerer = Lowerer {
        source,
        diagnostics: Vec::new(),
    };

    let (package, simple) = match qualified_name.rsplit_once('.') {
        Some((package, simple)) => (Some(package), simple),
        None => (None, qualified_name),
    };

    let declared = unit.package.as_ref().map(|p| p.to_string());
    match (declared.as_deref(), package) {
        (Some(d), Some(p)) if d == p => {}
        (None, None) => {}
        (None, Some(p)) => lowerer.error(
            0..0,
            format!("missing package declaration: expected 'package {};'", p),
        ),
        (Some(d), _) => {
            let span = unit.package.as_ref().map_or(0..0, |p| p.span.clone());
            lowerer.error(
                span,
                format!("package '{}' does not match unit name '{}'", d, qualified_name),
            );
        }
    }

    let mut seen = HashSet::new();
    let mut target = None;
    for class in &unit.classes {
        if !seen.insert(class.name.name.as_str()) {
            lowerer.error(
                class.name.span.clone(),
                format!("duplicate class: {}", class.name.name),
            );
            continue;
        }
        let program = lowerer.lower_class(class, package);
        if class.name.name == simple {
            target = Some(program);
        }
    }

    match target {
        Some(program) if lowerer.diagnostics.is_empty() => Ok(program),
        Some(_) => Err(lowerer.diagnostics),
        None => {
            lowerer.error(
                0..0,
                format!("class '{}' not found in unit '{}'", simple, qualified_name),
            );
            Err(lowerer.diagnostics)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    FieldInit,
    Constructor,
    Method,
}

struct ClassScope {
    name: String,
    fields: IndexMap<String, Value>,
    no_arg_methods: HashSet<String>,
    methods_with_params: HashSet<String>,
}

struct BodyCtx<'c> {
    class: &'c ClassScope,
    method: String,
    locals: Vec<HashMap<String, Option<Operand>>>,
    mode: Mode,
}

/// One call of a fluent chain.
struct CallSite<'e> {
    name: &'e Ident,
    args: &'e [Expr],
    span: Span,
}

struct Lowerer<'a> {
    source: &'a str,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lowerer<'a> {
    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::at(self.source, span, message));
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn lower_class(&mut self, class: &ClassDecl, package: Option<&str>) -> ClassProgram {
        let name = class.name.name.clone();

        let route_builder = match &class.extends {
            None => false,
            Some(sup) if ROUTE_BUILDER_TYPES.iter().any(|k| matches_type(sup, k)) => true,
            Some(sup) if matches_type(sup, OBJECT_TYPE) => false,
            Some(sup) => {
                self.error(sup.span.clone(), format!("cannot find symbol: class {}", sup));
                false
            }
        };
        for iface in &class.implements {
            if !KNOWN_INTERFACES.iter().any(|k| matches_type(iface, k)) {
                self.error(iface.span.clone(), format!("cannot find symbol: class {}", iface));
            }
        }

        let mut scope = ClassScope {
            name: name.clone(),
            fields: IndexMap::new(),
            no_arg_methods: HashSet::new(),
            methods_with_params: HashSet::new(),
        };

        let mut signatures = HashSet::new();
        for member in &class.members {
            if let Member::Method(method) = member {
                if !signatures.insert((method.name.name.as_str(), method.params.len())) {
                    self.error(
                        method.name.span.clone(),
                        format!("method {}() is already defined in class {}", method.name.name, name),
                    );
                }
                if method.params.is_empty() {
                    scope.no_arg_methods.insert(method.name.name.clone());
                } else {
                    scope.methods_with_params.insert(method.name.name.clone());
                }
            }
        }

        for member in &class.members {
            if let Member::Field(field) = member {
                let value = self.lower_field(&scope, field);
                if scope.fields.contains_key(&field.name.name) {
                    self.error(
                        field.name.span.clone(),
                        format!("variable {} is already defined in class {}", field.name.name, name),
                    );
                    continue;
                }
                scope.fields.insert(field.name.name.clone(), value);
            }
        }

        let constructor = self.lower_constructors(&scope, class);

        let mut methods = HashMap::new();
        for member in &class.members {
            let Member::Method(method) = member else { continue };
            let method_name = &method.name.name;

            match (&method.body, method.modifiers.is_abstract) {
                (None, false) => self.error(
                    method.name.span.clone(),
                    "missing method body, or declare abstract",
                ),
                (Some(_), true) => self.error(
                    method.name.span.clone(),
                    "abstract methods cannot have a body",
                ),
                (None, true) if !class.modifiers.is_abstract => self.error(
                    class.name.span.clone(),
                    format!(
                        "{} is not abstract and does not override abstract method {}() in {}",
                        name, method_name, name
                    ),
                ),
                _ => {}
            }

            if route_builder && method_name == "configure" && method.params.is_empty() {
                if let Some(ty) = &method.return_type {
                    self.error(
                        method.name.span.clone(),
                        format!(
                            "configure() in {} cannot override configure() in RouteBuilder: return type {} is not compatible with void",
                            name, ty.name
                        ),
                    );
                }
            }

            // Methods with parameters cannot be invoked from route code, so their
            // bodies are never lowered.
            if let (Some(body), true) = (&method.body, method.params.is_empty()) {
                let mut ctx = BodyCtx {
                    class: &scope,
                    method: method_name.clone(),
                    locals: Vec::new(),
                    mode: Mode::Method,
                };
                let mut ops = Vec::new();
                self.lower_block(&mut ctx, body, &mut ops);
                methods.insert(method_name.clone(), ops);
            }
        }

        if route_builder && !class.modifiers.is_abstract && !methods.contains_key("configure") {
            self.error(
                class.name.span.clone(),
                format!(
                    "{} is not abstract and does not override abstract method configure() in RouteBuilder",
                    name
                ),
            );
        }

        ClassProgram {
            qualified_name: package.map_or_else(|| name.clone(), |p| format!("{}.{}", p, name)),
            name,
            is_abstract: class.modifiers.is_abstract,
            route_builder,
            constructor,
            methods,
        }
    }

    fn lower_field(&mut self, scope: &ClassScope, field: &FieldDecl) -> Value {
        let Some(init) = &field.init else {
            return default_value(&field.ty);
        };

        let ctx = BodyCtx {
            class: scope,
            method: String::new(),
            locals: Vec::new(),
            mode: Mode::FieldInit,
        };
        let value = match self.lower_expr(&ctx, init) {
            Some(Operand::Const(value)) => value,
            Some(_) => {
                self.error(init.span(), "field initializer must be a constant expression");
                return Value::Null;
            }
            None => return Value::Null,
        };

        if let Some(expected) = declared_ty(&field.ty) {
            let found = value.ty();
            let assignable = found == expected || (found == Ty::Null && expected == Ty::Str);
            if !assignable {
                self.error(
                    init.span(),
                    format!("incompatible types: {} cannot be converted to {}", found, field.ty.name),
                );
            }
        }
        value
    }

    fn lower_constructors(&mut self, scope: &ClassScope, class: &ClassDecl) -> Option<Vec<Op>> {
        let constructors: Vec<&ConstructorDecl> = class
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Constructor(c) => Some(c),
                _ => None,
            })
            .collect();

        if constructors.is_empty() {
            return Some(Vec::new());
        }

        let mut no_arg = constructors.iter().filter(|c| c.params.is_empty());
        let first = no_arg.next()?;
        for duplicate in no_arg {
            self.error(
                duplicate.name.span.clone(),
                format!("constructor {}() is already defined in class {}", scope.name, scope.name),
            );
        }

        let mut ctx = BodyCtx {
            class: scope,
            method: scope.name.clone(),
            locals: Vec::new(),
            mode: Mode::Constructor,
        };
        let mut ops = Vec::new();
        self.lower_block(&mut ctx, &first.body, &mut ops);
        Some(ops)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Lowers a block into `ops`. Returns whether the block always completes abruptly.
    fn lower_block(&mut self, ctx: &mut BodyCtx<'_>, block: &Block, ops: &mut Vec<Op>) -> bool {
        ctx.locals.push(HashMap::new());
        let mut terminated = false;

        for stmt in &block.stmts {
            if terminated {
                if let Some(span) = stmt_span(stmt) {
                    self.error(span, "unreachable statement");
                    break;
                }
                continue;
            }

            match stmt {
                Stmt::Empty => {}
                Stmt::Block(inner) => terminated = self.lower_block(ctx, inner, ops),
                Stmt::Return(_) => {
                    ops.push(Op::Return);
                    terminated = true;
                }
                Stmt::Throw(expr, span) => {
                    if let Some(op) = self.lower_throw(ctx, expr, span.clone()) {
                        ops.push(op);
                    }
                    terminated = true;
                }
                Stmt::Local { ty, name, init } => self.lower_local(ctx, ty, name, init.as_ref()),
                Stmt::Expr(expr) => {
                    if let Some(op) = self.lower_statement(ctx, expr) {
                        ops.push(op);
                    }
                }
            }
        }

        ctx.locals.pop();
        terminated
    }

    fn lower_local(&mut self, ctx: &mut BodyCtx<'_>, ty: &TypeRef, name: &Ident, init: Option<&Expr>) {
        if ctx.locals.iter().any(|scope| scope.contains_key(&name.name)) {
            self.error(
                name.span.clone(),
                format!("variable {} is already defined in method {}()", name.name, ctx.method),
            );
            return;
        }

        let operand = match init {
            Some(expr) => {
                let operand = self.lower_expr(ctx, expr);
                if let (Some(operand), Some(expected)) = (&operand, declared_ty(ty)) {
                    let found = operand.ty();
                    if found != expected && !(found == Ty::Null && expected == Ty::Str) {
                        self.error(
                            expr.span(),
                            format!("incompatible types: {} cannot be converted to {}", found, ty.name),
                        );
                    }
                }
                // A failed initializer still declares the name to avoid cascading errors.
                Some(operand.unwrap_or(Operand::Const(Value::Null)))
            }
            None => None,
        };

        if let Some(scope) = ctx.locals.last_mut() {
            scope.insert(name.name.clone(), operand);
        }
    }

    fn lower_throw(&mut self, ctx: &BodyCtx<'_>, expr: &Expr, span: Span) -> Option<Op> {
        let Expr::New { class, args, .. } = expr else {
            self.error(span, "unsupported throw expression: expected 'throw new <Exception>(...)'");
            return None;
        };

        if args.len() > 2 {
            self.error(
                expr.span(),
                format!("no suitable constructor found for {}", class),
            );
            return None;
        }

        let message = match args.first() {
            None => None,
            Some(arg) => match self.lower_expr(ctx, arg)? {
                Operand::Const(Value::Null) => None,
                operand if operand.ty() == Ty::Str => Some(operand),
                operand => {
                    self.error(
                        arg.span(),
                        format!("incompatible types: {} cannot be converted to String", operand.ty()),
                    );
                    return None;
                }
            },
        };

        Some(Op::Throw {
            exception: class.to_string(),
            message,
        })
    }

    fn lower_statement(&mut self, ctx: &BodyCtx<'_>, expr: &Expr) -> Option<Op> {
        let calls = match flatten_chain(expr) {
            Ok(calls) => calls,
            Err(span) => {
                if matches!(expr, Expr::Call { .. }) {
                    let message = match find_root(expr) {
                        Expr::Name(ident) => format!("cannot find symbol: variable {}", ident.name),
                        _ => "unsupported method call target".to_string(),
                    };
                    self.error(span, message);
                } else {
                    self.error(expr.span(), "not a statement");
                }
                return None;
            }
        };

        let root = &calls[0];
        let root_name = root.name.name.as_str();

        if ctx.class.no_arg_methods.contains(root_name) || ctx.class.methods_with_params.contains(root_name) {
            return self.lower_invoke(ctx, &calls);
        }

        match root_name {
            "from" | "rest" | "restConfiguration" if ctx.mode != Mode::Method => {
                self.error(
                    root.name.span.clone(),
                    format!("{}() cannot be called from a constructor", root_name),
                );
                None
            }
            "from" => self.lower_route(ctx, &calls),
            "rest" => self.lower_rest(ctx, &calls),
            "restConfiguration" => self.lower_rest_configuration(ctx, &calls),
            "getContext" => {
                self.error(
                    root.span.clone(),
                    "getContext() may only be used to resolve property placeholders in arguments",
                );
                None
            }
            other => {
                self.error(
                    root.name.span.clone(),
                    format!("cannot find symbol: method {}() in class {}", other, ctx.class.name),
                );
                None
            }
        }
    }

    fn lower_invoke(&mut self, ctx: &BodyCtx<'_>, calls: &[CallSite<'_>]) -> Option<Op> {
        let root = &calls[0];
        let name = &root.name.name;

        if ctx.mode != Mode::Method {
            self.error(
                root.name.span.clone(),
                format!("method {}() cannot be called from a constructor", name),
            );
            return None;
        }
        if !root.args.is_empty() || !ctx.class.no_arg_methods.contains(name) {
            self.error(
                root.span.clone(),
                format!("calling method {}() with arguments is not supported", name),
            );
            return None;
        }
        if let Some(next) = calls.get(1) {
            self.error(next.name.span.clone(), "void cannot be dereferenced");
            return None;
        }
        Some(Op::Invoke(name.clone()))
    }

    // =========================================================================
    // Route DSL
    // =========================================================================

    fn lower_route(&mut self, ctx: &BodyCtx<'_>, calls: &[CallSite<'_>]) -> Option<Op> {
        let root = &calls[0];
        let from = self.args(ctx, root, "from", &[STR])?.pop()?;

        let mut ops = Vec::new();
        let mut ok = true;
        let mut rest = calls[1..].iter();

        while let Some(call) = rest.next() {
            let name = call.name.name.as_str();
            let op = match name {
                "routeId" => self.single(ctx, call, STR).map(RouteOp::RouteId),
                "description" => self.single(ctx, call, STR).map(RouteOp::Description),
                "autoStartup" => self
                    .single(ctx, call, BOOL_OR_STR)
                    .map(RouteOp::AutoStartup),
                "toD" => self.single(ctx, call, STR).map(RouteOp::ToD),
                "log" => self.single(ctx, call, STR).map(RouteOp::Log),
                "removeHeader" => self.single(ctx, call, STR).map(RouteOp::RemoveHeader),
                "to" => self.varargs(ctx, call).map(RouteOp::To),
                "setBody" | "transform" | "filter" => {
                    let expression = if call.args.is_empty() {
                        self.trailing_clause(ctx, call, rest.next())
                    } else {
                        self.inline_clause(ctx, call, 0, 1)
                    };
                    expression.map(|e| match name {
                        "setBody" => RouteOp::SetBody(e),
                        "transform" => RouteOp::Transform(e),
                        _ => RouteOp::Filter(e),
                    })
                }
                "setHeader" => match call.args.len() {
                    1 => {
                        let header = self.single(ctx, call, STR);
                        let expression = self.trailing_clause(ctx, call, rest.next());
                        header.zip(expression).map(|(h, e)| RouteOp::SetHeader(h, e))
                    }
                    _ => {
                        let header = call
                            .args
                            .first()
                            .and_then(|arg| self.typed(ctx, arg, "setHeader", STR));
                        let expression = self.inline_clause(ctx, call, 1, 2);
                        header.zip(expression).map(|(h, e)| RouteOp::SetHeader(h, e))
                    }
                },
                "end" => {
                    ok &= self.args(ctx, call, "end", &[]).is_some();
                    continue;
                }
                other => {
                    self.error(
                        call.name.span.clone(),
                        format!("cannot find symbol: method {}() in RouteDefinition", other),
                    );
                    None
                }
            };

            match op {
                Some(op) => ops.push(op),
                None => ok = false,
            }
        }

        ok.then_some(Op::Route { from, ops })
    }

    /// Clause written as the next chained call: `setBody().constant("x")`.
    fn trailing_clause(
        &mut self,
        ctx: &BodyCtx<'_>,
        owner: &CallSite<'_>,
        next: Option<&CallSite<'_>>,
    ) -> Option<ExprOperand> {
        match next {
            Some(clause) => self.expression_call(ctx, clause.name, clause.args, clause.span.clone()),
            None => {
                self.error(
                    owner.span.clone(),
                    format!(
                        "{}() must be followed by an expression clause (constant, simple or header)",
                        owner.name.name
                    ),
                );
                None
            }
        }
    }

    /// Clause passed as the argument at `index`: `setBody(constant("x"))`.
    fn inline_clause(
        &mut self,
        ctx: &BodyCtx<'_>,
        owner: &CallSite<'_>,
        index: usize,
        expected_args: usize,
    ) -> Option<ExprOperand> {
        if owner.args.len() != expected_args {
            self.arity_error(owner, &owner.name.name, expected_args);
            return None;
        }
        match &owner.args[index] {
            Expr::Call {
                target: None,
                name,
                args,
                span,
            } => self.expression_call(ctx, name, args, span.clone()),
            other => {
                self.error(
                    other.span(),
                    format!(
                        "{}() expects an expression clause (constant, simple or header)",
                        owner.name.name
                    ),
                );
                None
            }
        }
    }

    fn expression_call(
        &mut self,
        ctx: &BodyCtx<'_>,
        name: &Ident,
        args: &[Expr],
        span: Span,
    ) -> Option<ExprOperand> {
        let (language, accepted) = match name.name.as_str() {
            "constant" => (ExpressionLanguage::Constant, CONSTANT_VALUE),
            "simple" => (ExpressionLanguage::Simple, STR),
            "header" => (ExpressionLanguage::Header, STR),
            other => {
                self.error(
                    name.span.clone(),
                    format!("expected expression clause (constant, simple or header), found {}()", other),
                );
                return None;
            }
        };
        let site = CallSite { name, args, span };
        let text = self.single(ctx, &site, accepted)?;
        Some(ExprOperand { language, text })
    }

    // =========================================================================
    // REST DSL
    // =========================================================================

    fn lower_rest(&mut self, ctx: &BodyCtx<'_>, calls: &[CallSite<'_>]) -> Option<Op> {
        let path = self.optional(ctx, &calls[0], STR)?;

        let mut ops = Vec::new();
        let mut ok = true;
        for call in &calls[1..] {
            let name = call.name.name.as_str();
            let op = if let Some(method) = HttpMethod::from_dsl(name) {
                self.optional(ctx, call, STR).map(|uri| RestOp::Verb(method, uri))
            } else {
                match name {
                    "description" => self.single(ctx, call, STR).map(RestOp::Description),
                    "consumes" => self.single(ctx, call, STR).map(RestOp::Consumes),
                    "produces" => self.single(ctx, call, STR).map(RestOp::Produces),
                    "to" => self.single(ctx, call, STR).map(RestOp::To),
                    "end" => {
                        ok &= self.args(ctx, call, "end", &[]).is_some();
                        continue;
                    }
                    other => {
                        self.error(
                            call.name.span.clone(),
                            format!("cannot find symbol: method {}() in RestDefinition", other),
                        );
                        None
                    }
                }
            };

            match op {
                Some(op) => ops.push(op),
                None => ok = false,
            }
        }

        ok.then_some(Op::Rest { path, ops })
    }

    fn lower_rest_configuration(&mut self, ctx: &BodyCtx<'_>, calls: &[CallSite<'_>]) -> Option<Op> {
        let component = self.optional(ctx, &calls[0], STR)?;

        let mut ops = Vec::new();
        let mut ok = true;
        for call in &calls[1..] {
            let name = call.name.name.as_str();
            let option = match name {
                "component" => Some((RestOption::Component, STR)),
                "host" => Some((RestOption::Host, STR)),
                "port" => Some((RestOption::Port, STR_OR_INT)),
                "scheme" => Some((RestOption::Scheme, STR)),
                "contextPath" => Some((RestOption::ContextPath, STR)),
                "apiContextPath" => Some((RestOption::ApiContextPath, STR)),
                "bindingMode" => Some((RestOption::BindingMode, STR)),
                "enableCORS" => Some((RestOption::EnableCors, BOOL_OR_STR)),
                _ => None,
            };
            let property = match name {
                "componentProperty" => Some(RestPropertyKind::Component),
                "endpointProperty" => Some(RestPropertyKind::Endpoint),
                "consumerProperty" => Some(RestPropertyKind::Consumer),
                "dataFormatProperty" => Some(RestPropertyKind::DataFormat),
                _ => None,
            };

            let op = match (option, property) {
                (Some((option, accepted)), _) => {
                    self.single(ctx, call, accepted).map(|v| RestConfigOp::Set(option, v))
                }
                (None, Some(kind)) => self
                    .args(ctx, call, name, &[STR, STR])
                    .and_then(|mut args| {
                        let value = args.pop()?;
                        let key = args.pop()?;
                        Some(RestConfigOp::Property(kind, key, value))
                    }),
                (None, None) if name == "end" => {
                    ok &= self.args(ctx, call, "end", &[]).is_some();
                    continue;
                }
                (None, None) => {
                    self.error(
                        call.name.span.clone(),
                        format!(
                            "cannot find symbol: method {}() in RestConfigurationDefinition",
                            name
                        ),
                    );
                    None
                }
            };

            match op {
                Some(op) => ops.push(op),
                None => ok = false,
            }
        }

        ok.then_some(Op::RestConfiguration { component, ops })
    }

    // =========================================================================
    // Arguments
    // =========================================================================

    fn arity_error(&mut self, call: &CallSite<'_>, method: &str, expected: usize) {
        self.error(
            call.span.clone(),
            format!(
                "method {} cannot be applied to given types: expected {} argument{}, found {}",
                method,
                expected,
                if expected == 1 { "" } else { "s" },
                call.args.len()
            ),
        );
    }

    /// Lower and type check `call`'s arguments against `params`.
    fn args(
        &mut self,
        ctx: &BodyCtx<'_>,
        call: &CallSite<'_>,
        method: &str,
        params: &[&[Ty]],
    ) -> Option<Vec<Operand>> {
        if call.args.len() != params.len() {
            self.arity_error(call, method, params.len());
            return None;
        }
        let lowered: Vec<Option<Operand>> = call
            .args
            .iter()
            .zip(params)
            .map(|(arg, accepted)| self.typed(ctx, arg, method, accepted))
            .collect();
        lowered.into_iter().collect()
    }

    fn single(&mut self, ctx: &BodyCtx<'_>, call: &CallSite<'_>, accepted: &[Ty]) -> Option<Operand> {
        let method = call.name.name.clone();
        self.args(ctx, call, &method, &[accepted])?.pop()
    }

    /// Zero or one argument.
    fn optional(
        &mut self,
        ctx: &BodyCtx<'_>,
        call: &CallSite<'_>,
        accepted: &[Ty],
    ) -> Option<Option<Operand>> {
        match call.args.len() {
            0 => Some(None),
            1 => self.single(ctx, call, accepted).map(Some),
            _ => {
                self.arity_error(call, &call.name.name, 1);
                None
            }
        }
    }

    /// One or more string arguments.
    fn varargs(&mut self, ctx: &BodyCtx<'_>, call: &CallSite<'_>) -> Option<Vec<Operand>> {
        if call.args.is_empty() {
            self.arity_error(call, &call.name.name, 1);
            return None;
        }
        let method = call.name.name.clone();
        let lowered: Vec<Option<Operand>> = call
            .args
            .iter()
            .map(|arg| self.typed(ctx, arg, &method, STR))
            .collect();
        lowered.into_iter().collect()
    }

    fn typed(&mut self, ctx: &BodyCtx<'_>, arg: &Expr, method: &str, accepted: &[Ty]) -> Option<Operand> {
        let operand = self.lower_expr(ctx, arg)?;
        let found = operand.ty();
        if found == Ty::Null {
            self.error(arg.span(), format!("null is not a valid argument of {}()", method));
            return None;
        }
        if !accepted.contains(&found) {
            let expected = accepted
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" or ");
            self.error(
                arg.span(),
                format!("incompatible types: {} cannot be converted to {}", found, expected),
            );
            return None;
        }
        Some(operand)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn lower_expr(&mut self, ctx: &BodyCtx<'_>, expr: &Expr) -> Option<Operand> {
        match expr {
            Expr::Literal(literal, _) => Some(Operand::Const(match literal {
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Char(c) => Value::Str(c.to_string()),
                Literal::Int(i) => Value::Int(*i),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            })),
            Expr::Name(ident) => self.lookup(ctx, ident),
            Expr::Field { target, name } => match target.as_ref() {
                Expr::This(_) => self.lookup_field(ctx, name),
                Expr::Name(owner) if owner.name == "RestBindingMode" => {
                    if BINDING_MODES.contains(&name.name.as_str()) {
                        Some(Operand::Const(Value::Str(name.name.clone())))
                    } else {
                        self.error(
                            name.span.clone(),
                            format!("cannot find symbol: variable {} in RestBindingMode", name.name),
                        );
                        None
                    }
                }
                _ => {
                    self.error(expr.span(), "cannot find symbol: unsupported field access");
                    None
                }
            },
            Expr::Call {
                target: Some(target),
                name,
                args,
                span,
            } if name.name == "resolvePropertyPlaceholders" && is_get_context(target) => {
                if ctx.mode != Mode::Method {
                    self.error(span.clone(), "getContext() is not available outside of methods");
                    return None;
                }
                let site = CallSite {
                    name,
                    args,
                    span: span.clone(),
                };
                let text = self.single(ctx, &site, STR)?;
                Some(Operand::Placeholders(Box::new(text)))
            }
            Expr::Call { name, .. } => {
                self.error(
                    name.span.clone(),
                    format!("cannot find symbol: method {}() cannot be used as a value", name.name),
                );
                None
            }
            Expr::New { span, .. } => {
                self.error(span.clone(), "object creation is only supported in throw statements");
                None
            }
            Expr::This(span) => {
                self.error(span.clone(), "'this' cannot be used as a value");
                None
            }
            Expr::Concat { lhs, rhs } => {
                let lhs = self.lower_expr(ctx, lhs);
                let rhs = self.lower_expr(ctx, rhs);
                self.concat(expr.span(), lhs?, rhs?)
            }
        }
    }

    fn lookup(&mut self, ctx: &BodyCtx<'_>, ident: &Ident) -> Option<Operand> {
        for scope in ctx.locals.iter().rev() {
            if let Some(local) = scope.get(&ident.name) {
                return match local {
                    Some(operand) => Some(operand.clone()),
                    None => {
                        self.error(
                            ident.span.clone(),
                            format!("variable {} might not have been initialized", ident.name),
                        );
                        None
                    }
                };
            }
        }
        self.lookup_field(ctx, ident)
    }

    fn lookup_field(&mut self, ctx: &BodyCtx<'_>, ident: &Ident) -> Option<Operand> {
        match ctx.class.fields.get(&ident.name) {
            Some(value) => Some(Operand::Const(value.clone())),
            None => {
                self.error(
                    ident.span.clone(),
                    format!("cannot find symbol: variable {}", ident.name),
                );
                None
            }
        }
    }

    fn concat(&mut self, span: Span, lhs: Operand, rhs: Operand) -> Option<Operand> {
        match (lhs.ty(), rhs.ty()) {
            (Ty::Int, Ty::Int) => match (lhs, rhs) {
                (Operand::Const(Value::Int(a)), Operand::Const(Value::Int(b))) => {
                    Some(Operand::Const(Value::Int(a.wrapping_add(b))))
                }
                _ => None,
            },
            (Ty::Str, _) | (_, Ty::Str) => Some(fold_concat(lhs, rhs)),
            (a, b) => {
                self.error(
                    span,
                    format!("bad operand types for binary operator '+': {} and {}", a, b),
                );
                None
            }
        }
    }
}

/// Concatenate two string-typed operands, merging adjacent constants.
fn fold_concat(lhs: Operand, rhs: Operand) -> Operand {
    let mut parts: Vec<Operand> = Vec::new();
    for operand in [lhs, rhs] {
        let pieces = match operand {
            Operand::Concat(inner) => inner,
            other => vec![other],
        };
        for piece in pieces {
            if let (Some(Operand::Const(prev)), Operand::Const(next)) = (parts.last_mut(), &piece) {
                *prev = Value::Str(format!("{}{}", prev, next));
                continue;
            }
            parts.push(piece);
        }
    }

    if parts.len() == 1 {
        match parts.pop() {
            Some(Operand::Const(value)) => Operand::Const(Value::Str(value.to_string())),
            Some(other) => other,
            None => Operand::Const(Value::Str(String::new())),
        }
    } else {
        Operand::Concat(parts)
    }
}

fn is_get_context(expr: &Expr) -> bool {
    match expr {
        Expr::Call {
            target,
            name,
            args,
            ..
        } => {
            name.name == "getContext"
                && args.is_empty()
                && target.as_deref().map_or(true, |t| matches!(t, Expr::This(_)))
        }
        _ => false,
    }
}

/// Innermost receiver of a call chain.
fn find_root(expr: &Expr) -> &Expr {
    let mut current = expr;
    loop {
        match current {
            Expr::Call {
                target: Some(target),
                ..
            }
            | Expr::Field { target, .. } => current = target,
            other => return other,
        }
    }
}

/// Flatten `a(..).b(..).c(..)` into `[a, b, c]`. Fails with the span of the
/// first receiver that is not itself a call.
fn flatten_chain(expr: &Expr) -> Result<Vec<CallSite<'_>>, Span> {
    let mut calls = Vec::new();
    let mut current = expr;
    loop {
        match current {
            Expr::Call {
                target,
                name,
                args,
                span,
            } => {
                calls.push(CallSite {
                    name,
                    args,
                    span: span.clone(),
                });
                match target.as_deref() {
                    None | Some(Expr::This(_)) => break,
                    Some(inner) => current = inner,
                }
            }
            other => return Err(other.span()),
        }
    }
    calls.reverse();
    Ok(calls)
}

#[cfg(test)]
mod tests;
