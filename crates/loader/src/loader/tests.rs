//! Tests for the source loader pipeline.

use std::fs;
use std::sync::Arc;

use switchyard_core::{ExecutionContext, Source};
use switchyard_script::ScriptCompiler;
use tempfile::TempDir;

use super::*;
use crate::resolver::UriResolver;

const ROUTES_JAVA: &str = r#"package com.example;

import org.apache.camel.builder.RouteBuilder;

public class Routes extends RouteBuilder {
    @Override
    public void configure() throws Exception {
        restConfiguration().component("undertow").port(8080);
        from("direct:x").to("mock:y");
    }
}
"#;

fn temp_loader() -> (TempDir, SourceLoader<ScriptCompiler, UriResolver>) {
    let dir = TempDir::new().expect("create tempdir");
    let resolver = UriResolver::with_classpath([dir.path().to_path_buf()]);
    (dir, SourceLoader::new(ScriptCompiler::new(), resolver))
}

fn classpath_source(dir: &TempDir, name: &str, content: &str) -> Source {
    fs::write(dir.path().join(name), content).unwrap();
    Source::from_uri(&format!("classpath:{}", name)).unwrap()
}

fn context() -> Arc<ExecutionContext> {
    Arc::new(ExecutionContext::new("test"))
}

#[test]
fn loads_classpath_source_and_merges_rest_configuration() {
    let (dir, loader) = temp_loader();
    let source = classpath_source(&dir, "Routes.java", ROUTES_JAVA);
    let ctx = context();

    let bundle = loader.load(&ctx, &source).unwrap();

    assert_eq!(bundle.routes.len(), 1);
    assert_eq!(bundle.routes[0].from, "direct:x");
    assert_eq!(bundle.routes[0].outputs(), vec!["mock:y"]);
    assert_eq!(bundle.rest_configurations.len(), 1);

    let held = ctx.rest_configurations();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].component.as_deref(), Some("undertow"));
    assert_eq!(held[0].port, Some(8080));
}

#[test]
fn wrong_language_is_rejected_before_resolution() {
    let (_dir, loader) = temp_loader();
    let source = Source::new("routes.xml", "classpath:does-not-exist.xml", "xml");

    let err = loader.load(&context(), &source).unwrap_err();
    assert_eq!(err.stage, LoadStage::Resolving);
    assert!(matches!(err.kind, LoadErrorKind::UnsupportedLanguage { .. }));
}

#[test]
fn missing_source_fails_at_resolving() {
    let (_dir, loader) = temp_loader();
    let source = Source::from_uri("classpath:Missing.java").unwrap();

    let err = loader.load(&context(), &source).unwrap_err();
    assert_eq!(err.stage, LoadStage::Resolving);
    assert!(matches!(err.kind, LoadErrorKind::Resolution(_)), "{}", err);
    assert!(err.is_source_error());
}

#[test]
fn syntax_error_fails_at_compile_and_registers_nothing() {
    let (dir, loader) = temp_loader();
    let source = classpath_source(
        &dir,
        "Routes.java",
        "package com.example;\npublic class Routes extends RouteBuilder {\n  public void configure() {\n    restConfiguration().port(1)\n    from(\"direct:x\");\n  }\n}\n",
    );
    let ctx = context();

    let err = loader.load(&ctx, &source).unwrap_err();
    assert_eq!(err.stage, LoadStage::Named);
    match &err.kind {
        LoadErrorKind::Compile(compile) => {
            assert_eq!(compile.unit, "com.example.Routes");
            assert!(!compile.diagnostics.is_empty());
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.content.as_deref().is_some_and(|c| c.contains("restConfiguration().port(1)")));
    assert_eq!(ctx.rest_configuration_count(), 0);
}

#[test]
fn constructor_failure_fails_at_instantiation() {
    let (dir, loader) = temp_loader();
    let source = classpath_source(
        &dir,
        "Routes.java",
        r#"package a;
public class Routes extends RouteBuilder {
    public Routes() { throw new IllegalStateException("no"); }
    public void configure() { }
}"#,
    );

    let err = loader.load(&context(), &source).unwrap_err();
    assert_eq!(err.stage, LoadStage::Compiled);
    assert!(matches!(err.kind, LoadErrorKind::Instantiation(_)), "{}", err);
    assert!(err.content.is_none());
}

#[test]
fn raising_configure_leaves_context_untouched() {
    let (dir, loader) = temp_loader();
    let source = classpath_source(
        &dir,
        "Routes.java",
        r#"package a;
public class Routes extends RouteBuilder {
    public void configure() throws Exception {
        restConfiguration().port(8080);
        throw new Exception("user code failed");
    }
}"#,
    );
    let ctx = context();

    let err = loader.load(&ctx, &source).unwrap_err();
    assert_eq!(err.stage, LoadStage::Instantiated);
    match &err.kind {
        LoadErrorKind::Configuration(switchyard_core::ConfigureError::Raised { exception, message }) => {
            assert_eq!(exception, "Exception");
            assert_eq!(message, "user code failed");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(ctx.rest_configuration_count(), 0);
}

#[test]
fn merge_conflict_fails_at_configured_without_partial_append() {
    let (dir, loader) = temp_loader();
    let ctx = context();

    let first = classpath_source(
        &dir,
        "First.java",
        r#"package a;
public class First extends RouteBuilder {
    public void configure() { restConfiguration("netty").port(8081); }
}"#,
    );
    loader.load(&ctx, &first).unwrap();

    let second = classpath_source(
        &dir,
        "Second.java",
        r#"package a;
public class Second extends RouteBuilder {
    public void configure() {
        restConfiguration("undertow").port(8082);
        restConfiguration("netty").port(9999);
    }
}"#,
    );
    let err = loader.load(&ctx, &second).unwrap_err();

    assert_eq!(err.stage, LoadStage::Configured);
    assert!(matches!(err.kind, LoadErrorKind::Merge(_)), "{}", err);
    assert!(!err.is_source_error());
    assert_eq!(ctx.rest_configuration_count(), 1);
}

#[test]
fn non_route_builder_is_a_no_op() {
    let (dir, loader) = temp_loader();
    let source = classpath_source(&dir, "Helper.java", "package a;\npublic class Helper { }\n");
    let ctx = context();

    let bundle = loader.load(&ctx, &source).unwrap();
    assert!(bundle.is_empty());
    assert_eq!(ctx.rest_configuration_count(), 0);
}

#[test]
fn two_loads_of_one_source_are_independent() {
    let (dir, loader) = temp_loader();
    let source = classpath_source(&dir, "Routes.java", ROUTES_JAVA);
    let ctx = context();

    let mut first = loader.load(&ctx, &source).unwrap();
    let second = loader.load(&ctx, &source).unwrap();
    assert_eq!(first, second);

    first.routes.clear();
    assert_eq!(second.routes.len(), 1);
    assert_eq!(ctx.rest_configuration_count(), 2);
}

#[test]
fn load_all_reports_each_source() {
    let (dir, loader) = temp_loader();
    let good = classpath_source(&dir, "Routes.java", ROUTES_JAVA);
    let bad = Source::from_uri("classpath:Missing.java").unwrap();
    let ctx = context();

    let report = loader.load_all(&ctx, &[bad, good]);

    assert_eq!(report.results.len(), 2);
    assert!(!report.is_success());
    let failed: Vec<_> = report.failed().map(|(location, _)| location).collect();
    assert_eq!(failed, vec!["classpath:Missing.java"]);
    let loaded: Vec<_> = report.loaded().map(|(location, _)| location).collect();
    assert_eq!(loaded, vec!["classpath:Routes.java"]);
}

#[test]
fn stages_advance_in_pipeline_order() {
    let mut stage = LoadStage::Resolving;
    let mut seen = vec![stage];
    while stage != LoadStage::Done {
        stage = stage.next();
        seen.push(stage);
    }

    assert_eq!(
        seen,
        vec![
            LoadStage::Resolving,
            LoadStage::Named,
            LoadStage::Compiled,
            LoadStage::Instantiated,
            LoadStage::Configured,
            LoadStage::Merged,
            LoadStage::Done,
        ]
    );
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(LoadStage::Done.next(), LoadStage::Done);
}
