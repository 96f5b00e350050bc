//! Mapping render failures in generated code back to template constructs.
//!
//! Compiled templates run as generated programs, so a failure is first known
//! only by its generated line. This crate walks a compiled artifact's sparse
//! annotation table back from that line to the nearest recorded construct and
//! produces a [`MappedContext`] for the error. It also renders compile errors
//! against the template body via [`render_excerpt`].

#![warn(missing_docs)]

pub mod context;
pub mod mapper;
pub mod renderer;
pub mod source_text;
pub mod trace;

pub use context::MappedContext;
pub use mapper::{map_failure, nearest_annotation, AnnotationTable};
pub use renderer::render_excerpt;
pub use source_text::SourceText;
pub use trace::{format_traceback, TraceFrame};
