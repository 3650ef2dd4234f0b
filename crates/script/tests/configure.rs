//! Compile, instantiate and configure route classes through the public API.

use std::collections::BTreeMap;
use std::sync::Arc;

use switchyard_core::{
    BuilderDefinitions, ConfigureError, Expression, ExpressionLanguage, ExecutionContext,
    HttpMethod, InstantiationError, ProcessorDefinition, SourceCompiler,
};
use switchyard_script::{render_diagnostics, ScriptCompiler};

fn context(properties: &[(&str, &str)]) -> Arc<ExecutionContext> {
    let properties: BTreeMap<String, String> = properties
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Arc::new(ExecutionContext::with_properties("test", properties))
}

/// Compile, instantiate and configure; returns what the builder accumulated.
fn configure(
    qualified_name: &str,
    source: &str,
    ctx: Arc<ExecutionContext>,
) -> Result<BuilderDefinitions, ConfigureError> {
    let unit = ScriptCompiler::new()
        .compile(qualified_name, source)
        .expect("source should compile");
    let mut instance = unit.instantiate().expect("class should instantiate");
    let builder = instance
        .as_route_builder()
        .expect("class should be a route builder");
    builder.set_context(ctx);
    builder.configure()?;
    Ok(instance.into_definitions())
}

const ROUTES: &str = r#"
package com.example;

import org.apache.camel.builder.RouteBuilder;
import org.apache.camel.model.rest.RestBindingMode;

public class Routes extends RouteBuilder {
    private static final String TARGET = "log:info";

    public Routes() {
    }

    @Override
    public void configure() throws Exception {
        restConfiguration()
            .component("undertow")
            .host("0.0.0.0")
            .port(getContext().resolvePropertyPlaceholders("{{http.port:8080}}"))
            .bindingMode(RestBindingMode.json);

        rest("/api")
            .description("greetings")
            .get("/hello").to("direct:hello")
            .post("/hello").consumes("application/json").to("direct:store");

        from("timer:tick")
            .routeId("ticker")
            .autoStartup(false)
            .setBody().constant("hi")
            .setHeader("source", header("origin"))
            .log("tick " + TARGET)
            .to(TARGET);
    }
}
"#;

#[test]
fn configures_routes_rests_and_rest_configuration() {
    let definitions = configure("com.example.Routes", ROUTES, context(&[("http.port", "9090")])).unwrap();

    assert_eq!(definitions.routes.len(), 1);
    let route = &definitions.routes[0];
    assert_eq!(route.from, "timer:tick");
    assert_eq!(route.id.as_deref(), Some("ticker"));
    assert!(!route.auto_startup);
    assert_eq!(
        route.steps,
        vec![
            ProcessorDefinition::SetBody {
                expression: Expression::new(ExpressionLanguage::Constant, "hi"),
            },
            ProcessorDefinition::SetHeader {
                name: "source".into(),
                expression: Expression::new(ExpressionLanguage::Header, "origin"),
            },
            ProcessorDefinition::Log {
                message: "tick log:info".into(),
            },
            ProcessorDefinition::To {
                uri: "log:info".into(),
            },
        ]
    );

    assert_eq!(definitions.rests.len(), 1);
    let rest = &definitions.rests[0];
    assert_eq!(rest.path.as_deref(), Some("/api"));
    assert_eq!(rest.description.as_deref(), Some("greetings"));
    assert_eq!(rest.verbs.len(), 2);
    assert_eq!(rest.verbs[0].method, HttpMethod::Get);
    assert_eq!(rest.verbs[0].to.as_deref(), Some("direct:hello"));
    assert_eq!(rest.verbs[1].method, HttpMethod::Post);
    assert_eq!(rest.verbs[1].consumes.as_deref(), Some("application/json"));

    let configs = definitions.rest_configurations.unwrap();
    assert_eq!(configs.len(), 1);
    let config = &configs[""];
    assert_eq!(config.component.as_deref(), Some("undertow"));
    assert_eq!(config.host.as_deref(), Some("0.0.0.0"));
    assert_eq!(config.port.as_deref(), Some("9090"));
    assert_eq!(config.binding_mode.as_deref(), Some("json"));
}

#[test]
fn placeholder_defaults_apply_when_property_is_missing() {
    let definitions = configure("com.example.Routes", ROUTES, context(&[])).unwrap();
    let configs = definitions.rest_configurations.unwrap();
    assert_eq!(configs[""].port.as_deref(), Some("8080"));
}

#[test]
fn repeated_rest_configuration_calls_edit_one_entry_in_first_use_order() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public void configure() {
        restConfiguration("netty").port(8081);
        restConfiguration().host("localhost");
        restConfiguration("netty").contextPath("/n");
    }
}
"#;
    let definitions = configure("a.Routes", source, context(&[])).unwrap();
    let configs = definitions.rest_configurations.unwrap();

    let keys: Vec<&str> = configs.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["netty", ""]);
    assert_eq!(configs["netty"].component.as_deref(), Some("netty"));
    assert_eq!(configs["netty"].port.as_deref(), Some("8081"));
    assert_eq!(configs["netty"].context_path.as_deref(), Some("/n"));
    assert_eq!(configs[""].component, None);
}

#[test]
fn no_rest_configuration_means_none() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public void configure() {
        from("direct:a").to("mock:a", "mock:b");
    }
}
"#;
    let definitions = configure("a.Routes", source, context(&[])).unwrap();
    assert!(definitions.rest_configurations.is_none());
    assert_eq!(definitions.routes[0].outputs(), vec!["mock:a", "mock:b"]);
}

#[test]
fn throw_in_configure_surfaces_exception_and_message() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public void configure() throws Exception {
        from("direct:a").to("mock:a");
        throw new IllegalStateException("boom");
    }
}
"#;
    let err = configure("a.Routes", source, context(&[])).unwrap_err();
    assert_eq!(
        err,
        ConfigureError::Raised {
            exception: "IllegalStateException".into(),
            message: "boom".into(),
        }
    );
}

#[test]
fn unresolved_placeholder_raises_illegal_argument() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public void configure() {
        from(getContext().resolvePropertyPlaceholders("{{missing}}")).to("mock:a");
    }
}
"#;
    let err = configure("a.Routes", source, context(&[])).unwrap_err();
    match err {
        ConfigureError::Raised { exception, message } => {
            assert_eq!(exception, "java.lang.IllegalArgumentException");
            assert!(message.contains("missing"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn rest_to_before_verb_is_invalid_dsl() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public void configure() {
        rest("/api").to("direct:nowhere");
    }
}
"#;
    let err = configure("a.Routes", source, context(&[])).unwrap_err();
    assert!(matches!(err, ConfigureError::InvalidDsl(_)), "{:?}", err);
}

#[test]
fn configure_runs_only_once() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public void configure() {
        from("direct:a").to("mock:a");
    }
}
"#;
    let unit = ScriptCompiler::new().compile("a.Routes", source).unwrap();
    let mut instance = unit.instantiate().unwrap();
    let builder = instance.as_route_builder().unwrap();
    builder.set_context(context(&[]));
    builder.configure().unwrap();
    assert_eq!(builder.configure(), Err(ConfigureError::AlreadyConfigured));
    assert_eq!(instance.into_definitions().routes.len(), 1);
}

#[test]
fn recursive_helpers_overflow() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public void configure() {
        again();
    }
    private void again() {
        again();
    }
}
"#;
    let err = configure("a.Routes", source, context(&[])).unwrap_err();
    assert!(
        matches!(&err, ConfigureError::Raised { exception, .. } if exception == "java.lang.StackOverflowError"),
        "{:?}",
        err
    );
}

#[test]
fn instantiation_failures() {
    let compiler = ScriptCompiler::new();

    let abstract_class = "package a; public abstract class Routes extends RouteBuilder { }";
    let err = compiler.compile("a.Routes", abstract_class).unwrap().instantiate().err().unwrap();
    assert_eq!(err, InstantiationError::Abstract("a.Routes".into()));

    let no_default = r#"
package a;
public class Routes extends RouteBuilder {
    public Routes(String name) { }
    public void configure() { }
}
"#;
    let err = compiler.compile("a.Routes", no_default).unwrap().instantiate().err().unwrap();
    assert_eq!(err, InstantiationError::NoDefaultConstructor("a.Routes".into()));

    let throwing = r#"
package a;
public class Routes extends RouteBuilder {
    public Routes() { throw new RuntimeException("nope"); }
    public void configure() { }
}
"#;
    let err = compiler.compile("a.Routes", throwing).unwrap().instantiate().err().unwrap();
    assert_eq!(
        err,
        InstantiationError::ConstructorThrew {
            unit: "a.Routes".into(),
            exception: "RuntimeException".into(),
            message: "nope".into(),
        }
    );
}

#[test]
fn plain_classes_are_not_route_builders() {
    let source = "package a; public class Routes { }";
    let unit = ScriptCompiler::new().compile("a.Routes", source).unwrap();
    assert_eq!(unit.qualified_name(), "a.Routes");
    let mut instance = unit.instantiate().unwrap();
    assert!(instance.as_route_builder().is_none());
}

#[test]
fn compile_errors_carry_positioned_diagnostics() {
    let source = "package a;\npublic class Routes extends RouteBuilder {\n    public void configure() {\n        from(\"direct:a\").too(\"mock:a\");\n    }\n}\n";
    let err = ScriptCompiler::new().compile("a.Routes", source).err().unwrap();

    assert_eq!(err.unit, "a.Routes");
    assert_eq!(err.diagnostics.len(), 1);
    let diagnostic = &err.diagnostics[0];
    assert_eq!(diagnostic.message, "cannot find symbol: method too() in RouteDefinition");
    assert_eq!((diagnostic.line, diagnostic.column), (4, 26));

    let report = render_diagnostics("Routes.java", source, &err);
    assert!(report.contains("too()"), "{}", report);
}

#[test]
fn lexer_and_parser_errors_are_reported_together() {
    let source = "package a;\npublic class Routes extends RouteBuilder {\n    public void configure() {\n        from(\"direct:a);\n    }\n}\n";
    let err = ScriptCompiler::new().compile("a.Routes", source).err().unwrap();
    assert!(err.diagnostics.iter().any(|d| d.message == "unclosed string literal"));
    assert!(err.diagnostics.len() >= 2, "{:?}", err.diagnostics);
}
