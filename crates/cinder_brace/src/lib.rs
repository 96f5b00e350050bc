//! Reference markup compiler backend with brace syntax.
//!
//! | Construct | Meaning |
//! |-----------|---------|
//! | `{expr}` | emit `expr` in the default dialect, HTML-escaped |
//! | `{dialect: expr}` | emit `expr` in the named dialect |
//! | `{structure expr}` | emit without escaping |
//! | `{#if expr}` … `{#else}` … `{/if}` | conditional |
//! | `{#let name expr}` | bind a local for the rest of the template |
//! | `{#select name literal}` | declare a selector |
//! | `{#macro name}` … `{/macro}` | define a macro (top level only) |
//! | `{{` / `}}` | literal braces |
//!
//! Every construct is annotated `line N: <construct>` at the generated line
//! it starts, so diagnostic-mode failures name the construct that raised.

#![warn(missing_docs)]

pub mod compiler;
pub mod dialect;
mod lexer;
mod parser;

pub use compiler::BraceCompiler;
pub use dialect::{
    standard_dialects, ExistsDialect, ExprDialect, NotDialect, PathDialect, StringDialect,
};

use cinder_template::Engine;

/// Creates an engine with the brace backend and the standard dialects.
pub fn engine() -> Engine {
    Engine::new(BraceCompiler).with_dialects(standard_dialects())
}
