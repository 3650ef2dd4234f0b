//! Error types and load result structures for the source loader.

use switchyard_core::{CompileError, ConfigureError, ContextError, InstantiationError, RouteBundle};

use crate::resolver::ResolutionError;

/// Position of a load in its pipeline.
///
/// A load moves strictly forward through these states; on failure the
/// [`LoadError`] records the state the load was in when the failing step ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoadStage {
    Resolving,
    Named,
    Compiled,
    Instantiated,
    Configured,
    Merged,
    Done,
}

impl LoadStage {
    /// The stage after this one. `Done` is terminal.
    pub fn next(self) -> Self {
        match self {
            LoadStage::Resolving => LoadStage::Named,
            LoadStage::Named => LoadStage::Compiled,
            LoadStage::Compiled => LoadStage::Instantiated,
            LoadStage::Instantiated => LoadStage::Configured,
            LoadStage::Configured => LoadStage::Merged,
            LoadStage::Merged | LoadStage::Done => LoadStage::Done,
        }
    }
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoadStage::Resolving => "resolving",
            LoadStage::Named => "named",
            LoadStage::Compiled => "compiled",
            LoadStage::Instantiated => "instantiated",
            LoadStage::Configured => "configured",
            LoadStage::Merged => "merged",
            LoadStage::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// What went wrong during a load.
#[derive(Debug, thiserror::Error)]
pub enum LoadErrorKind {
    /// Source content could not be obtained.
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Syntax or reference failure in the source.
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// The compiled unit could not be constructed.
    #[error("instantiation error: {0}")]
    Instantiation(#[from] InstantiationError),

    /// User configuration code raised.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigureError),

    /// Appending REST configurations to the context failed.
    #[error("merge error: {0}")]
    Merge(#[from] ContextError),

    /// No loader handles the source's language tag.
    #[error("unsupported language '{language}' (supported: {})", .supported.join(", "))]
    UnsupportedLanguage {
        language: String,
        supported: Vec<String>,
    },
}

/// A failed load, tagged with the stage it failed in.
#[derive(Debug, thiserror::Error)]
#[error("failed to load '{location}' (stage: {stage}): {kind}")]
pub struct LoadError {
    pub location: String,
    pub stage: LoadStage,
    pub kind: LoadErrorKind,
    /// Text that was compiled, kept for compile failures so diagnostics can
    /// be rendered against it.
    pub content: Option<String>,
}

impl LoadError {
    pub fn new(location: impl Into<String>, stage: LoadStage, kind: impl Into<LoadErrorKind>) -> Self {
        Self {
            location: location.into(),
            stage,
            kind: kind.into(),
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Whether the source itself is at fault rather than the runtime state it
    /// was merged into.
    pub fn is_source_error(&self) -> bool {
        !matches!(self.kind, LoadErrorKind::Merge(_))
    }
}

/// Outcome of loading a single source.
#[derive(Debug)]
pub struct LoadResult {
    /// Location of the source that was loaded.
    pub location: String,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single load attempt.
#[derive(Debug)]
pub enum LoadStatus {
    /// Routes were loaded and REST configurations merged.
    Loaded { bundle: RouteBundle },
    /// The load failed at some stage; nothing was merged.
    Failed { error: LoadError },
}

/// Per-source outcomes of loading a list of sources.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub results: Vec<LoadResult>,
}

impl LoadReport {
    pub fn loaded(&self) -> impl Iterator<Item = (&str, &RouteBundle)> {
        self.results.iter().filter_map(|r| match &r.status {
            LoadStatus::Loaded { bundle } => Some((r.location.as_str(), bundle)),
            LoadStatus::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &LoadError)> {
        self.results.iter().filter_map(|r| match &r.status {
            LoadStatus::Failed { error } => Some((r.location.as_str(), error)),
            LoadStatus::Loaded { .. } => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}
