//! Dispatching sources to loaders by language tag.

use std::sync::Arc;

use indexmap::IndexMap;
use switchyard_core::{ExecutionContext, RouteBundle, Source};
use tracing::debug;

use crate::loader::{load_all, LoadError, LoadErrorKind, LoadReport, LoadStage, RoutesLoader};

/// Errors raised while registering loaders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a loader for language '{0}' is already registered")]
    DuplicateLanguage(String),
}

/// Loaders keyed by the language tags they handle, in registration order.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: IndexMap<String, Arc<dyn RoutesLoader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `loader` for every language it supports.
    ///
    /// Fails without registering anything if one of its languages is taken.
    pub fn register(&mut self, loader: Arc<dyn RoutesLoader>) -> Result<(), RegistryError> {
        let languages: Vec<String> = loader
            .supported_languages()
            .into_iter()
            .map(str::to_string)
            .collect();

        if let Some(taken) = languages.iter().find(|l| self.loaders.contains_key(*l)) {
            return Err(RegistryError::DuplicateLanguage(taken.clone()));
        }

        for language in languages {
            debug!(language = %language, "registered routes loader");
            self.loaders.insert(language, Arc::clone(&loader));
        }
        Ok(())
    }

    pub fn loader_for(&self, language: &str) -> Option<&Arc<dyn RoutesLoader>> {
        self.loaders.get(language)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Load every source in order through the loader for its language.
    pub fn load_all(&self, context: &Arc<ExecutionContext>, sources: &[Source]) -> LoadReport {
        load_all(self, context, sources)
    }
}

impl RoutesLoader for LoaderRegistry {
    fn supported_languages(&self) -> Vec<&str> {
        self.languages().collect()
    }

    fn load(&self, context: &Arc<ExecutionContext>, source: &Source) -> Result<RouteBundle, LoadError> {
        match self.loader_for(source.language()) {
            Some(loader) => loader.load(context, source),
            None => Err(LoadError::new(
                source.location(),
                LoadStage::Resolving,
                LoadErrorKind::UnsupportedLanguage {
                    language: source.language().to_string(),
                    supported: self.languages().map(str::to_string).collect(),
                },
            )),
        }
    }
}
