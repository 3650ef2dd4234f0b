//! REST endpoint definitions and REST configuration (unresolved and resolved forms).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::ContextError;

// ── REST endpoints ────────────────────────────────────────────

/// A group of REST verbs sharing a base path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestDefinition {
    pub path: Option<String>,
    pub description: Option<String>,
    pub consumes: Option<String>,
    pub produces: Option<String>,
    pub verbs: Vec<VerbDefinition>,
}

impl RestDefinition {
    pub fn new(path: Option<String>) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Map a DSL method name (`get`, `post`, ...) to a verb.
    pub fn from_dsl(name: &str) -> Option<Self> {
        match name {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            "patch" => Some(Self::Patch),
            "head" => Some(Self::Head),
            "options" => Some(Self::Options),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbDefinition {
    pub method: HttpMethod,
    pub uri: Option<String>,
    pub to: Option<String>,
    pub description: Option<String>,
    pub consumes: Option<String>,
    pub produces: Option<String>,
}

impl VerbDefinition {
    pub fn new(method: HttpMethod, uri: Option<String>) -> Self {
        Self {
            method,
            uri,
            to: None,
            description: None,
            consumes: None,
            produces: None,
        }
    }
}

// ── REST configuration ────────────────────────────────────────

/// REST configuration as written by route code.
///
/// Every option is kept as raw text so that property placeholders can be
/// resolved against the context the definition is merged into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestConfigurationDefinition {
    pub component: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub scheme: Option<String>,
    pub context_path: Option<String>,
    pub api_context_path: Option<String>,
    pub binding_mode: Option<String>,
    pub enable_cors: Option<String>,
    pub component_properties: BTreeMap<String, String>,
    pub endpoint_properties: BTreeMap<String, String>,
    pub consumer_properties: BTreeMap<String, String>,
    pub data_format_properties: BTreeMap<String, String>,
}

impl RestConfigurationDefinition {
    /// Resolve placeholders against `context` and validate every option.
    pub fn as_rest_configuration(
        &self,
        context: &ExecutionContext,
    ) -> Result<RestConfiguration, ContextError> {
        let resolve = |value: &Option<String>| -> Result<Option<String>, ContextError> {
            value
                .as_deref()
                .map(|v| context.resolve_placeholders(v))
                .transpose()
        };
        let resolve_map =
            |map: &BTreeMap<String, String>| -> Result<BTreeMap<String, String>, ContextError> {
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), context.resolve_placeholders(v)?)))
                    .collect()
            };

        let port = resolve(&self.port)?
            .map(|p| {
                p.trim().parse::<u16>().map_err(|e| ContextError::InvalidOption {
                    option: "port",
                    value: p.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let scheme = match resolve(&self.scheme)? {
            None => Scheme::Http,
            Some(s) => s.parse()?,
        };

        let binding_mode = match resolve(&self.binding_mode)? {
            None => BindingMode::Off,
            Some(m) => m.parse()?,
        };

        let enable_cors = match resolve(&self.enable_cors)? {
            None => false,
            Some(v) => v.trim().parse::<bool>().map_err(|e| ContextError::InvalidOption {
                option: "enableCORS",
                value: v.clone(),
                reason: e.to_string(),
            })?,
        };

        Ok(RestConfiguration {
            component: resolve(&self.component)?,
            host: resolve(&self.host)?,
            port,
            scheme,
            context_path: resolve(&self.context_path)?,
            api_context_path: resolve(&self.api_context_path)?,
            binding_mode,
            enable_cors,
            component_properties: resolve_map(&self.component_properties)?,
            endpoint_properties: resolve_map(&self.endpoint_properties)?,
            consumer_properties: resolve_map(&self.consumer_properties)?,
            data_format_properties: resolve_map(&self.data_format_properties)?,
        })
    }
}

/// Fully resolved REST configuration held by the [`ExecutionContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestConfiguration {
    pub component: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub scheme: Scheme,
    pub context_path: Option<String>,
    pub api_context_path: Option<String>,
    pub binding_mode: BindingMode,
    pub enable_cors: bool,
    pub component_properties: BTreeMap<String, String>,
    pub endpoint_properties: BTreeMap<String, String>,
    pub consumer_properties: BTreeMap<String, String>,
    pub data_format_properties: BTreeMap<String, String>,
}

impl RestConfiguration {
    /// Key used to detect conflicting configurations (`""` for the default component).
    pub fn component_key(&self) -> &str {
        self.component.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl std::str::FromStr for Scheme {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(ContextError::InvalidOption {
                option: "scheme",
                value: other.to_string(),
                reason: "expected http or https".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingMode {
    Off,
    Auto,
    Json,
    Xml,
    JsonXml,
}

impl std::str::FromStr for BindingMode {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(BindingMode::Off),
            "auto" => Ok(BindingMode::Auto),
            "json" => Ok(BindingMode::Json),
            "xml" => Ok(BindingMode::Xml),
            "json_xml" => Ok(BindingMode::JsonXml),
            _ => Err(ContextError::InvalidOption {
                option: "bindingMode",
                value: s.to_string(),
                reason: "expected one of off, auto, json, xml, json_xml".to_string(),
            }),
        }
    }
}
