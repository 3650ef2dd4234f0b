use std::sync::Arc;

use switchyard_core::{CompileError, CompiledUnit, InstantiationError, RoutesBuilder, SourceCompiler};
use tracing::debug;

use crate::builder::ScriptRouteBuilder;
use crate::lexer::Lexer;
use crate::lower::lower_unit;
use crate::parser::Parser;
use crate::program::ClassProgram;

/// Compiler for `java` route classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptCompiler;

impl ScriptCompiler {
    pub const LANGUAGE: &'static str = "java";
    pub const FILE_SUFFIX: &'static str = ".java";

    pub fn new() -> Self {
        Self
    }
}

impl SourceCompiler for ScriptCompiler {
    fn language(&self) -> &str {
        Self::LANGUAGE
    }

    fn file_suffix(&self) -> &str {
        Self::FILE_SUFFIX
    }

    fn compile(
        &self,
        qualified_name: &str,
        content: &str,
    ) -> Result<Box<dyn CompiledUnit>, CompileError> {
        let program = compile_program(qualified_name, content)?;
        Ok(Box::new(ScriptUnit {
            program: Arc::new(program),
        }))
    }
}

/// Lex, parse and lower `content` into the class named `qualified_name`.
///
/// Lexer and parser diagnostics are reported together; lowering only runs on
/// a clean parse.
pub fn compile_program(qualified_name: &str, content: &str) -> Result<ClassProgram, CompileError> {
    let fail = |diagnostics| {
        let error = CompileError {
            unit: qualified_name.to_string(),
            diagnostics,
        };
        debug!(unit = %qualified_name, diagnostics = error.diagnostics.len(), "compilation failed");
        error
    };

    let (tokens, mut diagnostics) = Lexer::new(content).tokenize();
    let unit = match Parser::new(content, tokens).parse_unit() {
        Ok(unit) if diagnostics.is_empty() => unit,
        Ok(_) => return Err(fail(diagnostics)),
        Err(mut parse) => {
            diagnostics.append(&mut parse);
            diagnostics.sort_by_key(|d| d.span.start);
            return Err(fail(diagnostics));
        }
    };

    let program = lower_unit(content, &unit, qualified_name).map_err(fail)?;
    debug!(
        unit = %qualified_name,
        methods = program.methods.len(),
        route_builder = program.route_builder,
        "compiled"
    );
    Ok(program)
}

/// A compiled class, shared by every instance created from it.
#[derive(Debug, Clone)]
pub struct ScriptUnit {
    program: Arc<ClassProgram>,
}

impl ScriptUnit {
    pub fn program(&self) -> &ClassProgram {
        &self.program
    }
}

impl CompiledUnit for ScriptUnit {
    fn qualified_name(&self) -> &str {
        &self.program.qualified_name
    }

    fn instantiate(&self) -> Result<Box<dyn RoutesBuilder>, InstantiationError> {
        let builder = ScriptRouteBuilder::instantiate(Arc::clone(&self.program))?;
        Ok(Box::new(builder))
    }
}
