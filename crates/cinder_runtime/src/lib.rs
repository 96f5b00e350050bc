//! The executable unit of a compiled template and its interpreter.
//!
//! A markup compiler backend lowers a template into a [`Program`]: a flat,
//! serializable list of [`Instruction`]s whose 1-indexed positions are the
//! "generated lines" that annotations and diagnostics refer to. [`execute`]
//! runs a program against a [`Namespace`] of caller variables and the
//! [`Builtins`] resolved through the artifact's globals table.

#![warn(missing_docs)]

pub mod builtins;
pub mod error;
pub mod escape;
pub mod exec;
pub mod namespace;
pub mod program;

pub use builtins::{Builtins, NativeFn};
pub use error::{ExecError, ExecErrorKind};
pub use escape::escape_html;
pub use exec::execute;
pub use namespace::{GlobalsTable, Namespace};
pub use program::{BinOp, Expr, Instruction, Program, UnaryOp};
