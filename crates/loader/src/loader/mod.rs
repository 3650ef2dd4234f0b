//! Source loader: the resolve, name, compile, instantiate, configure and merge pipeline.
//!
//! One [`SourceLoader`] handles one language. Failures are tagged with the
//! [`LoadStage`] they happened in, and only a fully successful load merges
//! REST configurations into the shared context.

mod core;
mod error;

#[cfg(test)]
mod tests;

pub use self::core::{load_all, RoutesLoader, SourceLoader};
pub use self::error::{LoadError, LoadErrorKind, LoadReport, LoadResult, LoadStage, LoadStatus};
