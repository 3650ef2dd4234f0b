//! Human and JSON renderings of a load report.

use serde_json::{json, Value};
use switchyard_core::{ExecutionContext, ProcessorDefinition, RestConfiguration, RouteBundle, Source};
use switchyard_loader::{LoadError, LoadErrorKind, LoadReport, LoadStatus};
use switchyard_script::render_diagnostics;

pub fn json_report(context: &ExecutionContext, report: &LoadReport) -> Value {
    let sources: Vec<Value> = report
        .results
        .iter()
        .map(|result| match &result.status {
            LoadStatus::Loaded { bundle } => json!({
                "location": result.location,
                "status": "loaded",
                "bundle": bundle,
            }),
            LoadStatus::Failed { error } => {
                let diagnostics = match &error.kind {
                    LoadErrorKind::Compile(compile) => json!(compile.diagnostics),
                    _ => json!([]),
                };
                json!({
                    "location": result.location,
                    "status": "failed",
                    "stage": error.stage.to_string(),
                    "error": error.kind.to_string(),
                    "diagnostics": diagnostics,
                })
            }
        })
        .collect();

    json!({
        "context": context.name(),
        "sources": sources,
        "rest_configurations": context.rest_configurations(),
    })
}

pub fn print_report(context: &ExecutionContext, report: &LoadReport, sources: &[Source]) {
    println!("context '{}'", context.name());

    for (result, source) in report.results.iter().zip(sources) {
        match &result.status {
            LoadStatus::Loaded { bundle } => print_bundle(&result.location, bundle),
            LoadStatus::Failed { error } => {
                for line in failure_lines(source.name(), error) {
                    println!("{}", line);
                }
            }
        }
    }

    let configurations = context.rest_configurations();
    println!("rest configurations ({}):", configurations.len());
    for configuration in &configurations {
        println!("  {}", describe_configuration(configuration));
    }
}

fn print_bundle(location: &str, bundle: &RouteBundle) {
    println!(
        "  loaded  {}  routes={} rests={} rest-configurations={}",
        location,
        bundle.routes.len(),
        bundle.rests.len(),
        bundle.rest_configurations.len()
    );
    for (route, label) in bundle.routes.iter().zip(bundle.route_labels()) {
        let outputs = route.outputs();
        let steps = route
            .steps
            .iter()
            .filter(|s| !matches!(s, ProcessorDefinition::To { .. } | ProcessorDefinition::ToD { .. }))
            .count();
        println!(
            "          route {}: {} -> [{}]{}",
            label,
            route.from,
            outputs.join(", "),
            if steps > 0 { format!(" (+{} steps)", steps) } else { String::new() }
        );
    }
    for rest in &bundle.rests {
        for verb in &rest.verbs {
            println!(
                "          rest {} {}{} -> {}",
                verb.method,
                rest.path.as_deref().unwrap_or(""),
                verb.uri.as_deref().unwrap_or(""),
                verb.to.as_deref().unwrap_or("-")
            );
        }
    }
}

/// Lines describing a failed load. Compile failures are rendered against the
/// text that was compiled.
fn failure_lines(name: &str, error: &LoadError) -> Vec<String> {
    let mut lines = vec![format!("  failed  {}  (stage: {})", error.location, error.stage)];
    let details = match (&error.kind, error.content.as_deref()) {
        (LoadErrorKind::Compile(compile), Some(content)) => render_diagnostics(name, content, compile),
        (LoadErrorKind::Compile(compile), None) => compile
            .diagnostics
            .iter()
            .map(|d| format!("{}:{}", name, d))
            .collect::<Vec<_>>()
            .join("\n"),
        (kind, _) => kind.to_string(),
    };
    lines.extend(details.lines().map(|line| format!("          {}", line)));
    lines
}

fn describe_configuration(configuration: &RestConfiguration) -> String {
    let component = match configuration.component_key() {
        "" => "(default)",
        key => key,
    };
    format!(
        "{} host={} port={} scheme={:?} binding={:?} cors={}",
        component,
        configuration.host.as_deref().unwrap_or("-"),
        configuration
            .port
            .map_or_else(|| "-".to_string(), |p| p.to_string()),
        configuration.scheme,
        configuration.binding_mode,
        configuration.enable_cors
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use switchyard_loader::{java_loader, RoutesLoader, UriResolver};

    use super::*;

    #[test]
    fn json_report_lists_loaded_and_failed_sources() {
        let ctx = Arc::new(ExecutionContext::new("report"));
        let good = Source::new(
            "Routes.java",
            "inline:package a; public class Routes extends RouteBuilder { public void configure() { \
             restConfiguration().port(8080); from(\"direct:a\").to(\"mock:a\"); } }",
            "java",
        );
        let bad = Source::new("Bad.java", "inline:package a; public class Bad {", "java");

        let loader = java_loader(UriResolver::new());
        let report = switchyard_loader::load_all(&loader as &dyn RoutesLoader, &ctx, &[good, bad]);
        let value = json_report(&ctx, &report);

        assert_eq!(value["context"], "report");
        assert_eq!(value["sources"][0]["status"], "loaded");
        assert_eq!(value["sources"][0]["bundle"]["routes"][0]["from"], "direct:a");
        assert_eq!(value["sources"][1]["status"], "failed");
        assert_eq!(value["sources"][1]["stage"], "named");
        assert!(value["sources"][1]["diagnostics"].as_array().is_some_and(|d| !d.is_empty()));
        assert_eq!(value["rest_configurations"][0]["port"], 8080);
    }

    #[test]
    fn compile_failures_render_the_compiled_text() {
        let ctx = Arc::new(ExecutionContext::new("report"));
        let content = "package a;\npublic class Routes extends RouteBuilder {\n  public void configure() {\n    from(\"direct:a\").bogus();\n  }\n}\n";
        let source = Source::new("Routes.java", format!("inline:{}", content), "java");

        let error = java_loader(UriResolver::new()).load(&ctx, &source).unwrap_err();
        assert_eq!(error.content.as_deref(), Some(content));

        let lines = failure_lines(source.name(), &error);
        assert!(lines[0].contains("(stage: named)"), "{:?}", lines);
        let rendered = lines.join("\n");
        assert!(rendered.contains("cannot find symbol: method bogus() in RouteDefinition"), "{}", rendered);
        assert!(rendered.contains("from(\"direct:a\").bogus();"), "{}", rendered);
    }
}
