//! Embedded compiler for route classes written in the `java` route language.
//!
//! Source text is lexed, parsed, and lowered into a [`ClassProgram`] with all
//! name and DSL vocabulary checks done up front. Instances interpret the
//! lowered `configure()` body against the bound execution context.

pub mod ast;
pub mod builder;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod program;
pub mod report;
pub mod token;
pub mod unit;

pub use builder::ScriptRouteBuilder;
pub use program::ClassProgram;
pub use report::render_diagnostics;
pub use unit::{compile_program, ScriptCompiler, ScriptUnit};
