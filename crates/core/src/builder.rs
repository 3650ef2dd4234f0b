//! Capability traits at the compile seam.
//!
//! A [`SourceCompiler`] turns text into a [`CompiledUnit`]; instantiating the
//! unit yields a [`RoutesBuilder`]. Only builders that expose the
//! [`RouteBuilder`] capability take part in configuration.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::context::ExecutionContext;
use crate::error::{CompileError, ConfigureError, InstantiationError};
use crate::rest::{RestConfigurationDefinition, RestDefinition};
use crate::route::RouteDefinition;

/// Compiles source text of one language into executable units.
pub trait SourceCompiler: Send + Sync {
    /// Language tag this compiler handles (e.g. `java`).
    fn language(&self) -> &str;

    /// File name suffix stripped when deriving qualified names (e.g. `.java`).
    fn file_suffix(&self) -> &str;

    fn compile(&self, qualified_name: &str, content: &str)
        -> Result<Box<dyn CompiledUnit>, CompileError>;
}

/// An in-memory compiled artifact with a single instantiation entry point.
pub trait CompiledUnit: Send {
    fn qualified_name(&self) -> &str;

    /// Construct one instance through the no-argument construction path.
    fn instantiate(&self) -> Result<Box<dyn RoutesBuilder>, InstantiationError>;
}

/// Anything a compiled unit instantiates to.
pub trait RoutesBuilder: Send {
    /// The route-builder capability, when this instance has it.
    fn as_route_builder(&mut self) -> Option<&mut dyn RouteBuilder> {
        None
    }

    /// Consume the instance and hand over whatever it accumulated.
    fn into_definitions(self: Box<Self>) -> BuilderDefinitions;
}

/// The configurable route-builder capability.
pub trait RouteBuilder {
    /// Bind the shared context. Called before [`configure`](Self::configure).
    fn set_context(&mut self, context: Arc<ExecutionContext>);

    /// Run user configuration code. Must be called at most once.
    fn configure(&mut self) -> Result<(), ConfigureError>;
}

/// Collections read back from a builder after configuration.
#[derive(Debug, Clone, Default)]
pub struct BuilderDefinitions {
    pub routes: Vec<RouteDefinition>,
    pub rests: Vec<RestDefinition>,
    /// Absent when the builder never declared any REST configuration.
    pub rest_configurations: Option<IndexMap<String, RestConfigurationDefinition>>,
}
