//! Loading route sources into a shared execution context.
//!
//! A [`SourceLoader`] resolves a [`Source`](switchyard_core::Source), derives
//! its qualified name, compiles and instantiates it, runs its configuration and
//! merges the REST configurations it declared into the
//! [`ExecutionContext`](switchyard_core::ExecutionContext).

pub mod extract;
pub mod loader;
pub mod merge;
pub mod name;
pub mod registry;
pub mod resolver;

pub use extract::extract;
pub use loader::{
    load_all, LoadError, LoadErrorKind, LoadReport, LoadResult, LoadStage, LoadStatus,
    RoutesLoader, SourceLoader,
};
pub use merge::merge;
pub use name::determine_qualified_name;
pub use registry::{LoaderRegistry, RegistryError};
pub use resolver::{ResolutionError, SourceResolver, UriResolver};

use switchyard_script::ScriptCompiler;

/// Loader for `java` route classes resolved through a [`UriResolver`].
pub type JavaSourceLoader = SourceLoader<ScriptCompiler, UriResolver>;

/// A `java` loader searching `resolver`'s classpath.
pub fn java_loader(resolver: UriResolver) -> JavaSourceLoader {
    SourceLoader::new(ScriptCompiler::new(), resolver)
}
