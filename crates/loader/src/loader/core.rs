//! Core [`SourceLoader`]: resolve, name, compile, instantiate, configure, merge.

use std::sync::Arc;

use switchyard_core::{ExecutionContext, RouteBundle, Source, SourceCompiler};
use tracing::{debug, info, warn};

use crate::extract::extract;
use crate::merge::merge;
use crate::name::determine_qualified_name;
use crate::resolver::{read_content, SourceResolver};

use super::error::{LoadError, LoadErrorKind, LoadReport, LoadResult, LoadStage, LoadStatus};

/// Anything that can turn a [`Source`] into a [`RouteBundle`].
pub trait RoutesLoader: Send + Sync {
    /// Language tags this loader accepts.
    fn supported_languages(&self) -> Vec<&str>;

    /// Load one source, merging its REST configurations into `context`.
    fn load(&self, context: &Arc<ExecutionContext>, source: &Source) -> Result<RouteBundle, LoadError>;
}

/// Loads sources of a single language through one compiler and one resolver.
///
/// Each call to [`load`](Self::load) runs the whole pipeline synchronously.
/// The shared context is only touched by the final merge step, so a failed
/// load leaves it unchanged.
pub struct SourceLoader<C, R> {
    compiler: C,
    resolver: R,
}

impl<C: SourceCompiler, R: SourceResolver> SourceLoader<C, R> {
    pub fn new(compiler: C, resolver: R) -> Self {
        Self { compiler, resolver }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Load every source in order. A failure is recorded and the next source
    /// is still attempted.
    pub fn load_all(&self, context: &Arc<ExecutionContext>, sources: &[Source]) -> LoadReport {
        load_all(self, context, sources)
    }

    fn run(&self, context: &Arc<ExecutionContext>, source: &Source) -> Result<RouteBundle, LoadError> {
        let location = source.location();
        let mut stage = LoadStage::Resolving;

        if source.language() != self.compiler.language() {
            return Err(LoadError::new(
                location,
                stage,
                LoadErrorKind::UnsupportedLanguage {
                    language: source.language().to_string(),
                    supported: vec![self.compiler.language().to_string()],
                },
            ));
        }

        let content = read_content(&self.resolver, source)
            .map_err(|e| LoadError::new(location, stage, e))?;
        let qualified_name =
            determine_qualified_name(source.name(), &content, self.compiler.file_suffix());
        stage = stage.next();
        debug!(source = %location, stage = %stage, unit = %qualified_name, bytes = content.len(), "named");

        let unit = match self.compiler.compile(&qualified_name, &content) {
            Ok(unit) => unit,
            Err(e) => return Err(LoadError::new(location, stage, e).with_content(content)),
        };
        stage = stage.next();
        debug!(source = %location, stage = %stage, unit = %qualified_name, "compiled");

        let instance = unit
            .instantiate()
            .map_err(|e| LoadError::new(location, stage, e))?;
        stage = stage.next();
        debug!(source = %location, stage = %stage, unit = %qualified_name, "instantiated");

        let bundle = extract(instance, context).map_err(|e| LoadError::new(location, stage, e))?;
        stage = stage.next();
        debug!(
            source = %location,
            stage = %stage,
            routes = bundle.routes.len(),
            rests = bundle.rests.len(),
            rest_configurations = bundle.rest_configurations.len(),
            "configured"
        );

        let merged = merge(context, &bundle.rest_configurations)
            .map_err(|e| LoadError::new(location, stage, e))?;
        stage = stage.next();
        debug!(source = %location, stage = %stage, context = %context.name(), merged, "merged");

        stage = stage.next();
        info!(
            source = %location,
            stage = %stage,
            unit = %qualified_name,
            routes = bundle.routes.len(),
            rests = bundle.rests.len(),
            rest_configurations = merged,
            "loaded routes"
        );
        Ok(bundle)
    }
}

impl<C: SourceCompiler, R: SourceResolver> RoutesLoader for SourceLoader<C, R> {
    fn supported_languages(&self) -> Vec<&str> {
        vec![self.compiler.language()]
    }

    fn load(&self, context: &Arc<ExecutionContext>, source: &Source) -> Result<RouteBundle, LoadError> {
        self.run(context, source).inspect_err(|e| {
            warn!(source = %source.location(), stage = %e.stage, error = %e.kind, "failed to load routes");
        })
    }
}

/// Load `sources` one after another through `loader`, never stopping at a failure.
pub fn load_all(
    loader: &dyn RoutesLoader,
    context: &Arc<ExecutionContext>,
    sources: &[Source],
) -> LoadReport {
    let results = sources
        .iter()
        .map(|source| LoadResult {
            location: source.location().to_string(),
            status: match loader.load(context, source) {
                Ok(bundle) => LoadStatus::Loaded { bundle },
                Err(error) => LoadStatus::Failed { error },
            },
        })
        .collect();
    LoadReport { results }
}
