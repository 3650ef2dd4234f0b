pub mod builder;
pub mod bundle;
pub mod config;
pub mod context;
pub mod error;
pub mod rest;
pub mod route;
pub mod source;

pub use builder::{BuilderDefinitions, CompiledUnit, RouteBuilder, RoutesBuilder, SourceCompiler};
pub use bundle::RouteBundle;
pub use config::Config;
pub use context::ExecutionContext;
pub use error::*;
pub use rest::*;
pub use route::*;
pub use source::Source;
