//! Templates: compile, cache, reload, render, and diagnose.
//!
//! An [`Engine`] bundles a markup compiler backend ([`TemplateCompiler`]),
//! its expression [`Dialect`]s, the runtime [`Builtins`](cinder_runtime::Builtins),
//! and default [`TemplateOptions`](cinder_config::TemplateOptions). It creates
//! [`Template`]s from strings or files. Each template owns its artifact
//! registry; rendering derives a cache key from the call's variable names,
//! compiles on a miss, and executes the artifact. In diagnostic mode an
//! execution failure is mapped back to the template construct that raised it.

#![warn(missing_docs)]

pub mod compiler;
pub mod engine;
pub mod error;
pub mod macros;
pub mod source;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use compiler::{compile_artifact, CompilerOutput, Dialect, DialectTable, TemplateCompiler};
pub use engine::Engine;
pub use error::{CompileError, RenderError};
pub use macros::Macros;
pub use template::Template;
