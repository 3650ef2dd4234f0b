//! Instances of compiled route classes and the interpreter behind `configure()`.

use std::sync::Arc;

use indexmap::IndexMap;
use switchyard_core::{
    BuilderDefinitions, ConfigureError, ExecutionContext, Expression, InstantiationError,
    ProcessorDefinition, RestConfigurationDefinition, RestDefinition, RouteBuilder,
    RouteDefinition, RoutesBuilder, VerbDefinition,
};
use tracing::debug;

use crate::program::*;

/// Nesting limit for helper method calls made from `configure()`.
const MAX_CALL_DEPTH: usize = 64;

/// One live instance of a compiled class.
pub struct ScriptRouteBuilder {
    class: Arc<ClassProgram>,
    context: Option<Arc<ExecutionContext>>,
    configured: bool,
    routes: Vec<RouteDefinition>,
    rests: Vec<RestDefinition>,
    rest_configurations: Option<IndexMap<String, RestConfigurationDefinition>>,
}

impl ScriptRouteBuilder {
    /// Run the no-argument constructor of `class`.
    pub fn instantiate(class: Arc<ClassProgram>) -> Result<Self, InstantiationError> {
        if class.is_abstract {
            return Err(InstantiationError::Abstract(class.qualified_name.clone()));
        }
        let Some(constructor) = class.constructor.as_deref() else {
            return Err(InstantiationError::NoDefaultConstructor(class.qualified_name.clone()));
        };

        let mut builder = Self {
            class: Arc::clone(&class),
            context: None,
            configured: false,
            routes: Vec::new(),
            rests: Vec::new(),
            rest_configurations: None,
        };

        builder.run(constructor, 0).map_err(|e| {
            let (exception, message) = match e {
                ConfigureError::Raised { exception, message } => (exception, message),
                other => ("java.lang.IllegalStateException".to_string(), other.to_string()),
            };
            InstantiationError::ConstructorThrew {
                unit: class.qualified_name.clone(),
                exception,
                message,
            }
        })?;

        debug!(class = %class.qualified_name, "instantiated");
        Ok(builder)
    }

    pub fn qualified_name(&self) -> &str {
        &self.class.qualified_name
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    fn run(&mut self, ops: &[Op], depth: usize) -> Result<(), ConfigureError> {
        for op in ops {
            match op {
                Op::Route { from, ops } => {
                    let route = build_route(self.context.as_deref(), from, ops)?;
                    debug!(from = %route.from, steps = route.steps.len(), "route defined");
                    self.routes.push(route);
                }
                Op::Rest { path, ops } => {
                    let rest = build_rest(self.context.as_deref(), path.as_ref(), ops)?;
                    debug!(path = ?rest.path, verbs = rest.verbs.len(), "rest defined");
                    self.rests.push(rest);
                }
                Op::RestConfiguration { component, ops } => {
                    self.apply_rest_configuration(component.as_ref(), ops)?;
                }
                Op::Invoke(name) => {
                    if depth >= MAX_CALL_DEPTH {
                        return Err(ConfigureError::Raised {
                            exception: "java.lang.StackOverflowError".to_string(),
                            message: format!("call depth exceeded {} at {}()", MAX_CALL_DEPTH, name),
                        });
                    }
                    let class = Arc::clone(&self.class);
                    let body = class.methods.get(name).ok_or_else(|| {
                        ConfigureError::InvalidDsl(format!("no method {}() in {}", name, class.name))
                    })?;
                    self.run(body, depth + 1)?;
                }
                Op::Throw { exception, message } => {
                    let message = match message {
                        Some(m) => eval_str(self.context.as_deref(), m)?,
                        None => String::new(),
                    };
                    return Err(ConfigureError::Raised {
                        exception: exception.clone(),
                        message,
                    });
                }
                Op::Return => return Ok(()),
            }
        }
        Ok(())
    }

    fn apply_rest_configuration(
        &mut self,
        component: Option<&Operand>,
        ops: &[RestConfigOp],
    ) -> Result<(), ConfigureError> {
        let context = self.context.as_deref();
        let key = match component {
            Some(c) => eval_str(context, c)?,
            None => String::new(),
        };

        let definitions = self.rest_configurations.get_or_insert_with(IndexMap::new);
        let definition = definitions.entry(key.clone()).or_insert_with(|| {
            RestConfigurationDefinition {
                component: (!key.is_empty()).then(|| key.clone()),
                ..RestConfigurationDefinition::default()
            }
        });

        for op in ops {
            match op {
                RestConfigOp::Set(option, value) => {
                    let value = Some(eval_str(context, value)?);
                    match option {
                        RestOption::Component => definition.component = value,
                        RestOption::Host => definition.host = value,
                        RestOption::Port => definition.port = value,
                        RestOption::Scheme => definition.scheme = value,
                        RestOption::ContextPath => definition.context_path = value,
                        RestOption::ApiContextPath => definition.api_context_path = value,
                        RestOption::BindingMode => definition.binding_mode = value,
                        RestOption::EnableCors => definition.enable_cors = value,
                    }
                }
                RestConfigOp::Property(kind, key, value) => {
                    let key = eval_str(context, key)?;
                    let value = eval_str(context, value)?;
                    let properties = match kind {
                        RestPropertyKind::Component => &mut definition.component_properties,
                        RestPropertyKind::Endpoint => &mut definition.endpoint_properties,
                        RestPropertyKind::Consumer => &mut definition.consumer_properties,
                        RestPropertyKind::DataFormat => &mut definition.data_format_properties,
                    };
                    properties.insert(key, value);
                }
            }
        }
        Ok(())
    }
}

impl RoutesBuilder for ScriptRouteBuilder {
    fn as_route_builder(&mut self) -> Option<&mut dyn RouteBuilder> {
        if self.class.route_builder {
            Some(self)
        } else {
            None
        }
    }

    fn into_definitions(self: Box<Self>) -> BuilderDefinitions {
        BuilderDefinitions {
            routes: self.routes,
            rests: self.rests,
            rest_configurations: self.rest_configurations,
        }
    }
}

impl RouteBuilder for ScriptRouteBuilder {
    fn set_context(&mut self, context: Arc<ExecutionContext>) {
        self.context = Some(context);
    }

    fn configure(&mut self) -> Result<(), ConfigureError> {
        if self.configured {
            return Err(ConfigureError::AlreadyConfigured);
        }
        self.configured = true;

        let class = Arc::clone(&self.class);
        let body = class.methods.get("configure").ok_or_else(|| {
            ConfigureError::InvalidDsl(format!("{} does not declare configure()", class.name))
        })?;

        debug!(class = %class.qualified_name, "configuring");
        self.run(body, 0)
    }
}

// ============================================================================
// Evaluation
// ============================================================================

fn eval(context: Option<&ExecutionContext>, operand: &Operand) -> Result<Value, ConfigureError> {
    match operand {
        Operand::Const(value) => Ok(value.clone()),
        Operand::Placeholders(text) => {
            let text = eval_str(context, text)?;
            let context = context.ok_or_else(|| {
                ConfigureError::InvalidDsl(
                    "getContext() is null: no execution context was bound before configure()"
                        .to_string(),
                )
            })?;
            context
                .resolve_placeholders(&text)
                .map(Value::Str)
                .map_err(|e| ConfigureError::Raised {
                    exception: "java.lang.IllegalArgumentException".to_string(),
                    message: e.to_string(),
                })
        }
        Operand::Concat(parts) => {
            let mut out = String::new();
            for part in parts {
                out.push_str(&eval(context, part)?.to_string());
            }
            Ok(Value::Str(out))
        }
    }
}

fn eval_str(context: Option<&ExecutionContext>, operand: &Operand) -> Result<String, ConfigureError> {
    Ok(eval(context, operand)?.to_string())
}

fn eval_expression(
    context: Option<&ExecutionContext>,
    expression: &ExprOperand,
) -> Result<Expression, ConfigureError> {
    Ok(Expression::new(expression.language, eval_str(context, &expression.text)?))
}

fn build_route(
    context: Option<&ExecutionContext>,
    from: &Operand,
    ops: &[RouteOp],
) -> Result<RouteDefinition, ConfigureError> {
    let mut route = RouteDefinition::new(eval_str(context, from)?);

    for op in ops {
        match op {
            RouteOp::RouteId(id) => route.id = Some(eval_str(context, id)?),
            RouteOp::Description(d) => route.description = Some(eval_str(context, d)?),
            RouteOp::AutoStartup(flag) => {
                route.auto_startup = match eval(context, flag)? {
                    Value::Bool(b) => b,
                    other => {
                        let text = other.to_string();
                        match text.trim().to_ascii_lowercase().as_str() {
                            "true" => true,
                            "false" => false,
                            _ => {
                                return Err(ConfigureError::InvalidDsl(format!(
                                    "autoStartup expects true or false, got '{}'",
                                    text
                                )))
                            }
                        }
                    }
                };
            }
            RouteOp::To(uris) => {
                for uri in uris {
                    route.steps.push(ProcessorDefinition::To {
                        uri: eval_str(context, uri)?,
                    });
                }
            }
            RouteOp::ToD(uri) => route.steps.push(ProcessorDefinition::ToD {
                uri: eval_str(context, uri)?,
            }),
            RouteOp::Log(message) => route.steps.push(ProcessorDefinition::Log {
                message: eval_str(context, message)?,
            }),
            RouteOp::SetBody(e) => route.steps.push(ProcessorDefinition::SetBody {
                expression: eval_expression(context, e)?,
            }),
            RouteOp::SetHeader(name, e) => route.steps.push(ProcessorDefinition::SetHeader {
                name: eval_str(context, name)?,
                expression: eval_expression(context, e)?,
            }),
            RouteOp::RemoveHeader(name) => route.steps.push(ProcessorDefinition::RemoveHeader {
                name: eval_str(context, name)?,
            }),
            RouteOp::Transform(e) => route.steps.push(ProcessorDefinition::Transform {
                expression: eval_expression(context, e)?,
            }),
            RouteOp::Filter(e) => route.steps.push(ProcessorDefinition::Filter {
                expression: eval_expression(context, e)?,
            }),
        }
    }
    Ok(route)
}

fn build_rest(
    context: Option<&ExecutionContext>,
    path: Option<&Operand>,
    ops: &[RestOp],
) -> Result<RestDefinition, ConfigureError> {
    let path = path.map(|p| eval_str(context, p)).transpose()?;
    let mut rest = RestDefinition::new(path);

    for op in ops {
        match op {
            RestOp::Verb(method, uri) => {
                let uri = uri.as_ref().map(|u| eval_str(context, u)).transpose()?;
                rest.verbs.push(VerbDefinition::new(*method, uri));
            }
            RestOp::To(uri) => {
                let uri = eval_str(context, uri)?;
                let verb = rest.verbs.last_mut().ok_or_else(|| {
                    ConfigureError::InvalidDsl(format!(
                        "to(\"{}\") must follow a REST verb such as get() or post()",
                        uri
                    ))
                })?;
                verb.to = Some(uri);
            }
            // Before the first verb these describe the whole REST definition.
            RestOp::Description(text) => {
                let text = Some(eval_str(context, text)?);
                match rest.verbs.last_mut() {
                    Some(verb) => verb.description = text,
                    None => rest.description = text,
                }
            }
            RestOp::Consumes(text) => {
                let text = Some(eval_str(context, text)?);
                match rest.verbs.last_mut() {
                    Some(verb) => verb.consumes = text,
                    None => rest.consumes = text,
                }
            }
            RestOp::Produces(text) => {
                let text = Some(eval_str(context, text)?);
                match rest.verbs.last_mut() {
                    Some(verb) => verb.produces = text,
                    None => rest.produces = text,
                }
            }
        }
    }
    Ok(rest)
}
