use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Name given to the shared execution context.
    pub context_name: String,
    /// Source URIs to load, in order.
    pub routes: Vec<String>,
    /// Roots searched, in order, for `classpath:` locations.
    pub classpath: Vec<PathBuf>,
    /// TOML file holding context properties.
    pub properties_file: Option<PathBuf>,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SWITCHYARD_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SWITCHYARD_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();

        let routes = profiled_env_opt(p, "SWITCHYARD_ROUTES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let classpath = profiled_env_opt(p, "SWITCHYARD_CLASSPATH")
            .map(|v| env::split_paths(&v).collect())
            .unwrap_or_default();

        Self {
            profile: p.to_string(),
            context_name: profiled_env_or(p, "SWITCHYARD_CONTEXT_NAME", "switchyard"),
            routes,
            classpath,
            properties_file: profiled_env_opt(p, "SWITCHYARD_PROPERTIES").map(PathBuf::from),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Read the configured properties file, if any.
    pub fn load_properties(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        match &self.properties_file {
            Some(path) => load_properties(path),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  context:     name={}", self.context_name);
        tracing::info!("  routes:      {}", self.routes.len());
        tracing::info!(
            "  classpath:   {}",
            self.classpath
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        tracing::info!(
            "  properties:  {}",
            self.properties_file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
    }
}

// ── Properties ────────────────────────────────────────────────

/// Parse a TOML properties file into flat dotted keys.
///
/// `[http] port = 8080` becomes `http.port = "8080"`. Arrays are joined with commas.
pub fn load_properties(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse_properties(&text)
}

pub fn parse_properties(text: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let table: toml::Table = toml::from_str(text)?;
    let mut out = BTreeMap::new();
    flatten("", &toml::Value::Table(table), &mut out);
    Ok(out)
}

fn flatten(prefix: &str, value: &toml::Value, out: &mut BTreeMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, value) in table {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&key, value, out);
            }
        }
        toml::Value::Array(items) => {
            let joined = items.iter().map(scalar).collect::<Vec<_>>().join(",");
            out.insert(prefix.to_string(), joined);
        }
        other => {
            out.insert(prefix.to_string(), scalar(other));
        }
    }
}

fn scalar(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_tables() {
        let props = parse_properties(
            r#"
greeting = "hello"
[http]
port = 8080
secure = false
[http.cors]
origins = ["a", "b"]
"#,
        )
        .unwrap();

        assert_eq!(props["greeting"], "hello");
        assert_eq!(props["http.port"], "8080");
        assert_eq!(props["http.secure"], "false");
        assert_eq!(props["http.cors.origins"], "a,b");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(
            parse_properties("port = = 1"),
            Err(ConfigError::Properties(_))
        ));
    }

    #[test]
    fn loads_properties_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        std::fs::write(&path, "name = \"orders\"\n").unwrap();

        let config = Config {
            profile: String::new(),
            context_name: "test".into(),
            routes: Vec::new(),
            classpath: Vec::new(),
            properties_file: Some(path),
        };
        let props = config.load_properties().unwrap();
        assert_eq!(props["name"], "orders");
        assert_eq!(config.profile_label(), "default");
    }
}
