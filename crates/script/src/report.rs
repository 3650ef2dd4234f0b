use std::ops::Range;

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use switchyard_core::CompileError;

/// Render `error` as an annotated, uncolored source report.
///
/// Falls back to one `name:line:column: message` line per diagnostic if the
/// report cannot be written.
pub fn render_diagnostics(name: &str, content: &str, error: &CompileError) -> String {
    let mut out = Vec::new();

    for diagnostic in &error.diagnostics {
        let span = (name, label_range(content, &diagnostic.span));
        let written = Report::build(ReportKind::Error, span.clone())
            .with_config(
                Config::default()
                    .with_color(false)
                    .with_index_type(IndexType::Byte),
            )
            .with_message(format!("failed to compile '{}'", error.unit))
            .with_label(Label::new(span).with_message(&diagnostic.message))
            .finish()
            .write((name, Source::from(content)), &mut out);

        if written.is_err() {
            return error
                .diagnostics
                .iter()
                .map(|d| format!("{}:{}\n", name, d))
                .collect();
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Widen empty spans to one character so the label has something to point at.
fn label_range(content: &str, span: &Range<usize>) -> Range<usize> {
    let start = span.start.min(content.len());
    let end = span.end.clamp(start, content.len());
    if end > start {
        return start..end;
    }
    if let Some(c) = content[start..].chars().next() {
        return start..start + c.len_utf8();
    }
    match content[..start].char_indices().next_back() {
        Some((i, _)) => i..start,
        None => start..start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::Diagnostic;

    #[test]
    fn renders_message_and_location() {
        let content = "package a;\nclass Routes {\n  x\n}\n";
        let start = content.find('x').unwrap();
        let error = CompileError {
            unit: "a.Routes".into(),
            diagnostics: vec![Diagnostic::at(content, start..start + 1, "not a statement")],
        };

        let report = render_diagnostics("Routes.java", content, &error);
        assert!(report.contains("failed to compile 'a.Routes'"), "{}", report);
        assert!(report.contains("not a statement"), "{}", report);
        assert!(report.contains("Routes.java"), "{}", report);
    }

    #[test]
    fn empty_span_at_end_of_input_does_not_panic() {
        let content = "class A {";
        let error = CompileError {
            unit: "A".into(),
            diagnostics: vec![Diagnostic::at(content, content.len()..content.len(), "expected '}'")],
        };
        let report = render_diagnostics("A.java", content, &error);
        assert!(report.contains("expected '}'"), "{}", report);
    }
}
