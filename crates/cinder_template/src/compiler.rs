//! The markup compiler backend seam and compile invocation.

use std::collections::BTreeMap;
use std::sync::Arc;

use cinder_cache::CompiledArtifact;
use cinder_common::Variables;
use cinder_diagnostics::AnnotationTable;
use cinder_runtime::{Expr, GlobalsTable, Program};

use crate::error::CompileError;

/// A named expression sub-language, invoked by the compiler backend.
pub trait Dialect: Send + Sync {
    /// Translates expression source text into an expression tree.
    fn translate(&self, source: &str) -> Result<Expr, String>;
}

/// Dialects available to a compiler backend, by name.
pub type DialectTable = BTreeMap<String, Arc<dyn Dialect>>;

/// What a compiler backend produces for one template body and macro.
#[derive(Debug, Clone, Default)]
pub struct CompilerOutput {
    /// The executable unit.
    pub program: Program,
    /// Local name to builtin symbol for every global the program calls.
    pub globals: GlobalsTable,
    /// Generated line to construct description.
    pub annotations: AnnotationTable,
    /// Variables the render call must receive from the template itself.
    pub selectors: Variables,
}

/// Translates template bodies into executable programs.
///
/// Backends must be deterministic: the same inputs yield behaviorally
/// equivalent output, which is what makes caching and duplicate compiles safe.
pub trait TemplateCompiler: Send + Sync {
    /// Compiles `body`, or only the macro `macro_name` within it.
    fn compile(
        &self,
        body: &str,
        dialects: &DialectTable,
        default_dialect: &str,
        macro_name: Option<&str>,
    ) -> Result<CompilerOutput, CompileError>;
}

/// Invokes `compiler` and wraps its output into an artifact.
///
/// Rejects output whose annotations point past the end of the program, since
/// those lines could never be mapped.
pub fn compile_artifact(
    compiler: &dyn TemplateCompiler,
    body: &str,
    dialects: &DialectTable,
    default_dialect: &str,
    macro_name: Option<&str>,
) -> Result<CompiledArtifact, CompileError> {
    let output = compiler.compile(body, dialects, default_dialect, macro_name)?;

    let last_line = output.program.len() as u32;
    if let Some((&line, _)) = output.annotations.iter().next_back() {
        if line == 0 || line > last_line {
            return Err(CompileError::new(format!(
                "compiler annotated generated line {line}, but the program has {last_line} lines"
            )));
        }
    }

    tracing::debug!(
        instructions = output.program.len(),
        annotations = output.annotations.len(),
        globals = output.globals.len(),
        macro_name = macro_name.unwrap_or(""),
        "compiled template"
    );

    Ok(CompiledArtifact {
        program: output.program,
        globals: output.globals,
        annotations: output.annotations,
        selectors: output.selectors,
    })
}
