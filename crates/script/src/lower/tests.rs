use super::*;
use crate::lexer::Lexer;
use crate::parser::Parser;

fn lower(source: &str, qualified_name: &str) -> Result<ClassProgram, Vec<Diagnostic>> {
    let (tokens, diagnostics) = Lexer::new(source).tokenize();
    assert!(diagnostics.is_empty(), "lexer diagnostics: {:?}", diagnostics);
    let unit = Parser::new(source, tokens)
        .parse_unit()
        .expect("source should parse");
    lower_unit(source, &unit, qualified_name)
}

fn messages(source: &str, qualified_name: &str) -> Vec<String> {
    lower(source, qualified_name)
        .expect_err("lowering should fail")
        .into_iter()
        .map(|d| d.message)
        .collect()
}

fn str_const(s: &str) -> Operand {
    Operand::Const(Value::Str(s.to_string()))
}

#[test]
fn lowers_route_with_folded_constants() {
    let source = r#"
package com.example;

public class Routes extends RouteBuilder {
    private static final String PREFIX = "log:";
    private int port = 80 + 80;

    public void configure() {
        from("timer:tick")
            .routeId("ticker")
            .setBody().constant("hello")
            .setHeader("n", simple("${body}"))
            .to(PREFIX + "info", "mock:" + port);
    }
}
"#;
    let program = lower(source, "com.example.Routes").unwrap();

    assert_eq!(program.qualified_name, "com.example.Routes");
    assert!(program.route_builder);
    assert!(!program.is_abstract);
    assert_eq!(program.constructor, Some(Vec::new()));

    let configure = &program.methods["configure"];
    assert_eq!(
        configure,
        &vec![Op::Route {
            from: str_const("timer:tick"),
            ops: vec![
                RouteOp::RouteId(str_const("ticker")),
                RouteOp::SetBody(ExprOperand {
                    language: ExpressionLanguage::Constant,
                    text: str_const("hello"),
                }),
                RouteOp::SetHeader(
                    str_const("n"),
                    ExprOperand {
                        language: ExpressionLanguage::Simple,
                        text: str_const("${body}"),
                    }
                ),
                RouteOp::To(vec![str_const("log:info"), str_const("mock:160")]),
            ],
        }]
    );
}

#[test]
fn lowers_rest_and_rest_configuration() {
    let source = r#"
package com.example;

public class Api extends RouteBuilder {
    @Override
    public void configure() {
        restConfiguration()
            .component("undertow")
            .port(getContext().resolvePropertyPlaceholders("{{api.port:8080}}"))
            .bindingMode(RestBindingMode.json)
            .enableCORS(true)
            .componentProperty("workers", "4");

        rest("/users").get("/{id}").to("direct:user").end();
    }
}
"#;
    let program = lower(source, "com.example.Api").unwrap();
    let configure = &program.methods["configure"];
    assert_eq!(configure.len(), 2);

    let Op::RestConfiguration { component, ops } = &configure[0] else {
        panic!("expected rest configuration, got {:?}", configure[0]);
    };
    assert_eq!(component, &None);
    assert_eq!(ops[0], RestConfigOp::Set(RestOption::Component, str_const("undertow")));
    assert_eq!(
        ops[1],
        RestConfigOp::Set(
            RestOption::Port,
            Operand::Placeholders(Box::new(str_const("{{api.port:8080}}")))
        )
    );
    assert_eq!(ops[2], RestConfigOp::Set(RestOption::BindingMode, str_const("json")));
    assert_eq!(
        ops[3],
        RestConfigOp::Set(RestOption::EnableCors, Operand::Const(Value::Bool(true)))
    );
    assert_eq!(
        ops[4],
        RestConfigOp::Property(RestPropertyKind::Component, str_const("workers"), str_const("4"))
    );

    assert_eq!(
        configure[1],
        Op::Rest {
            path: Some(str_const("/users")),
            ops: vec![
                RestOp::Verb(HttpMethod::Get, Some(str_const("/{id}"))),
                RestOp::To(str_const("direct:user")),
            ],
        }
    );
}

#[test]
fn helper_methods_become_invocations() {
    let source = r#"
public class Routes extends RouteBuilder {
    public void configure() {
        routes();
        return;
    }

    private void routes() {
        from("direct:a").to("mock:a");
    }
}
"#;
    let program = lower(source, "Routes").unwrap();
    assert_eq!(
        program.methods["configure"],
        vec![Op::Invoke("routes".into()), Op::Return]
    );
    assert!(program.methods.contains_key("routes"));
}

#[test]
fn plain_class_has_no_route_capability() {
    let source = "package a; public class Helper { public Helper() { } }";
    let program = lower(source, "a.Helper").unwrap();
    assert!(!program.route_builder);
    assert_eq!(program.constructor, Some(Vec::new()));
}

#[test]
fn constructor_with_params_only_has_no_default() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public Routes(String name) { }
    public void configure() { }
}
"#;
    assert_eq!(lower(source, "a.Routes").unwrap().constructor, None);
}

#[test]
fn constructor_throw_is_lowered() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public Routes() {
        throw new IllegalStateException("not today");
    }
    public void configure() { }
}
"#;
    let program = lower(source, "a.Routes").unwrap();
    assert_eq!(
        program.constructor,
        Some(vec![Op::Throw {
            exception: "IllegalStateException".into(),
            message: Some(str_const("not today")),
        }])
    );
}

#[test]
fn package_must_match_qualified_name() {
    let source = "package com.other; public class Routes extends RouteBuilder { public void configure() { } }";
    assert_eq!(
        messages(source, "com.example.Routes"),
        vec!["package 'com.other' does not match unit name 'com.example.Routes'"]
    );

    let source = "public class Routes extends RouteBuilder { public void configure() { } }";
    assert_eq!(
        messages(source, "com.example.Routes"),
        vec!["missing package declaration: expected 'package com.example;'"]
    );
}

#[test]
fn missing_target_class_is_reported() {
    let source = "package a; class Other { }";
    assert_eq!(messages(source, "a.Routes"), vec!["class 'Routes' not found in unit 'a.Routes'"]);
}

#[test]
fn route_builder_must_implement_configure() {
    let source = "package a; public class Routes extends RouteBuilder { }";
    assert_eq!(
        messages(source, "a.Routes"),
        vec!["Routes is not abstract and does not override abstract method configure() in RouteBuilder"]
    );

    let source = "package a; public abstract class Routes extends RouteBuilder { }";
    assert!(lower(source, "a.Routes").unwrap().is_abstract);
}

#[test]
fn unknown_symbols_are_reported() {
    let source = r#"
package a;
public class Routes extends SomethingElse {
    public void configure() {
        from("direct:a").bogus("x");
        frm("direct:b");
        from(MISSING);
    }
}
"#;
    assert_eq!(
        messages(source, "a.Routes"),
        vec![
            "cannot find symbol: class SomethingElse",
            "cannot find symbol: method bogus() in RouteDefinition",
            "cannot find symbol: method frm() in class Routes",
            "cannot find symbol: variable MISSING",
        ]
    );
}

#[test]
fn argument_types_and_arity_are_checked() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public void configure() {
        from(42);
        from("direct:a").routeId();
        restConfiguration().enableCORS(1);
        from("direct:b").setBody();
    }
}
"#;
    assert_eq!(
        messages(source, "a.Routes"),
        vec![
            "incompatible types: int cannot be converted to String",
            "method routeId cannot be applied to given types: expected 1 argument, found 0",
            "incompatible types: int cannot be converted to boolean or String",
            "setBody() must be followed by an expression clause (constant, simple or header)",
        ]
    );
}

#[test]
fn bad_operands_and_unreachable_code() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public void configure() {
        String x = true + 1;
        return;
        from("direct:a");
    }
}
"#;
    assert_eq!(
        messages(source, "a.Routes"),
        vec![
            "bad operand types for binary operator '+': boolean and int",
            "unreachable statement",
        ]
    );
}

#[test]
fn placeholders_are_only_resolved_in_methods() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    private String uri = getContext().resolvePropertyPlaceholders("{{x}}");
    public void configure() { }
}
"#;
    assert_eq!(
        messages(source, "a.Routes"),
        vec!["getContext() is not available outside of methods"]
    );
}

#[test]
fn dsl_calls_are_rejected_in_constructors() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    public Routes() {
        from("direct:a");
    }
    public void configure() { }
}
"#;
    assert_eq!(
        messages(source, "a.Routes"),
        vec!["from() cannot be called from a constructor"]
    );
}

#[test]
fn locals_shadow_fields_and_must_be_initialized() {
    let source = r#"
package a;
public class Routes extends RouteBuilder {
    private String target = "mock:field";
    public void configure() {
        String target = "mock:local";
        String later;
        from("direct:a").to(target);
        from("direct:b").to(later);
    }
}
"#;
    assert_eq!(
        messages(source, "a.Routes"),
        vec!["variable later might not have been initialized"]
    );
}
