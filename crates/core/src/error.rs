use thiserror::Error;

/// Errors raised while building a [`Source`](crate::Source) descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("source location must not be empty")]
    Empty,

    #[error("cannot determine language of source '{0}': no language parameter and no file extension")]
    MissingLanguage(String),
}

/// Errors raised by the shared [`ExecutionContext`](crate::ExecutionContext).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("property placeholder '{{{{{0}}}}}' could not be resolved")]
    UnresolvedPlaceholder(String),

    #[error("malformed property placeholder in '{0}'")]
    MalformedPlaceholder(String),

    #[error("invalid value '{value}' for rest configuration option '{option}': {reason}")]
    InvalidOption {
        option: &'static str,
        value: String,
        reason: String,
    },

    #[error("conflicting rest configuration for component '{0}'")]
    ConflictingRestConfiguration(String),
}

/// Errors raised while loading process configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("properties parse error: {0}")]
    Properties(#[from] toml::de::Error),
}

/// One compiler message, positioned in the source text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    pub message: String,
    /// Byte range in the source text.
    pub span: std::ops::Range<usize>,
    /// 1-based line of `span.start`.
    pub line: usize,
    /// 1-based column (in chars) of `span.start`.
    pub column: usize,
}

impl Diagnostic {
    /// Build a diagnostic, computing line and column from `source`.
    pub fn at(source: &str, span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        let start = span.start.min(source.len());
        let prefix = source.get(..start).unwrap_or(source);
        let line = prefix.matches('\n').count() + 1;
        let column = prefix.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        Self {
            message: message.into(),
            span,
            line,
            column,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "no diagnostics".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// Source text could not be turned into a compiled unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to compile '{unit}': {}", summarize(.diagnostics))]
pub struct CompileError {
    pub unit: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// A compiled unit could not be constructed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstantiationError {
    #[error("'{0}' is abstract; cannot be instantiated")]
    Abstract(String),

    #[error("'{0}' has no accessible no-argument constructor")]
    NoDefaultConstructor(String),

    #[error("constructor of '{unit}' threw {exception}: {message}")]
    ConstructorThrew {
        unit: String,
        exception: String,
        message: String,
    },
}

/// User configuration code failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigureError {
    #[error("{exception}: {message}")]
    Raised { exception: String, message: String },

    #[error("invalid route DSL usage: {0}")]
    InvalidDsl(String),

    #[error("builder has already been configured")]
    AlreadyConfigured,
}
