//! Qualified-name derivation from a source name and its content.

use std::sync::LazyLock;

use regex::Regex;

/// A package declaration at the very start of the text; only whitespace may precede it.
static PACKAGE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A\s*package\s+([a-zA-Z_][.a-zA-Z0-9_]*)\s*;").expect("valid regex")
});

/// Strip `suffix` from `name` and prefix it with the package declared in `content`.
///
/// Never fails: content without a leading package declaration yields the
/// stripped name unchanged.
pub fn determine_qualified_name(name: &str, content: &str, suffix: &str) -> String {
    let stripped = name.strip_suffix(suffix).unwrap_or(name);
    match package_of(content) {
        Some(package) => format!("{}.{}", package, stripped),
        None => stripped.to_string(),
    }
}

/// The package declared at the start of `content`, if any.
pub fn package_of(content: &str) -> Option<&str> {
    PACKAGE_DECLARATION
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
