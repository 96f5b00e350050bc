//! Compile and render error types.

use std::path::PathBuf;

use cinder_diagnostics::{render_excerpt, MappedContext, SourceText};
use cinder_runtime::ExecError;

/// A template body rejected by the compiler backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", describe_compile(.message, .line, .col, .excerpt))]
pub struct CompileError {
    /// What is wrong with the template.
    pub message: String,
    /// 1-based line in the template body, when known.
    pub line: Option<u32>,
    /// 1-based column in the template body, when known.
    pub col: Option<u32>,
    /// Rendered source excerpt, filled in by the template that compiled it.
    pub excerpt: Option<String>,
}

impl CompileError {
    /// Creates an error with no location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            col: None,
            excerpt: None,
        }
    }

    /// Creates an error located at `line:col` of the template body.
    pub fn at(message: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
            col: Some(col),
            excerpt: None,
        }
    }

    /// Attaches a rustc-style excerpt of `body`, labelled with `origin`.
    pub fn with_excerpt(mut self, body: &str, origin: &str) -> Self {
        if let Some(line) = self.line {
            let source = SourceText::new(body);
            self.excerpt = Some(render_excerpt(
                &source,
                origin,
                line,
                self.col.unwrap_or(1),
                &self.message,
            ));
        }
        self
    }
}

fn describe_compile(
    message: &str,
    line: &Option<u32>,
    col: &Option<u32>,
    excerpt: &Option<String>,
) -> String {
    if let Some(excerpt) = excerpt {
        return excerpt.trim_end().to_string();
    }
    match (line, col) {
        (Some(line), Some(col)) => format!("{message} at line {line}, column {col}"),
        (Some(line), None) => format!("{message} at line {line}"),
        _ => message.to_string(),
    }
}

/// Any failure of a render call.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The template file is missing or unreadable.
    #[error("failed to read template {path}: {source}")]
    SourceRead {
        /// The template file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler backend rejected the template. Nothing is cached.
    #[error("template compilation failed: {0}")]
    Compilation(#[from] CompileError),

    /// The compiled program raised while rendering.
    ///
    /// The same [`ExecError`] is returned in both render modes; diagnostic
    /// mode only fills in its `context`.
    #[error("{}", describe_execution(.0))]
    Execution(#[from] ExecError),
}

impl RenderError {
    /// Returns the execution error, if this is one.
    pub fn exec_error(&self) -> Option<&ExecError> {
        match self {
            RenderError::Execution(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the diagnostic context attached to an execution error.
    pub fn context(&self) -> Option<&MappedContext> {
        self.exec_error().and_then(|e| e.context.as_ref())
    }

    /// Converts into an [`ExecError`], so a native function that renders
    /// another template can propagate the failure unchanged.
    pub fn into_exec_error(self) -> ExecError {
        match self {
            RenderError::Execution(e) => e,
            other => ExecError::raised(other.to_string()),
        }
    }
}

fn describe_execution(e: &ExecError) -> String {
    match &e.context {
        Some(context) => format!("{e}\n\n{context}"),
        None => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_runtime::ExecErrorKind;

    #[test]
    fn display_with_location() {
        let err = CompileError::at("unterminated construct", 3, 5);
        assert_eq!(err.to_string(), "unterminated construct at line 3, column 5");
        assert_eq!(CompileError::new("empty").to_string(), "empty");

        let mut err = CompileError::new("stray `{/if}`");
        err.line = Some(4);
        assert_eq!(err.to_string(), "stray `{/if}` at line 4");
        let source: &dyn std::error::Error = &err;
        assert!(source.source().is_none());
    }

    #[test]
    fn excerpt_replaces_display() {
        let body = "<p>\n{name\n</p>";
        let err = CompileError::at("unterminated construct", 2, 1).with_excerpt(body, "<Template x>");
        let shown = err.to_string();
        assert!(shown.starts_with("error: unterminated construct"));
        assert!(shown.contains("--> <Template x>:2:1"));
        assert!(shown.contains("2 | {name"));
    }

    #[test]
    fn excerpt_needs_a_line() {
        let err = CompileError::new("bad").with_excerpt("body", "<Template x>");
        assert!(err.excerpt.is_none());
    }

    #[test]
    fn exec_accessors() {
        let err = RenderError::from(ExecError::new(ExecErrorKind::DivisionByZero));
        assert!(err.exec_error().is_some());
        assert!(err.context().is_none());
        assert_eq!(err.into_exec_error().kind, ExecErrorKind::DivisionByZero);

        let err = RenderError::from(CompileError::new("bad"));
        assert!(err.exec_error().is_none());
        assert!(matches!(
            err.into_exec_error().kind,
            ExecErrorKind::Raised(msg) if msg == "template compilation failed: bad"
        ));
    }
}
