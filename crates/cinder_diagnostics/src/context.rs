//! Supplementary context attached to execution failures in diagnostic mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Human-readable context mapping a generated-code failure to its template construct.
///
/// Attached to an execution error in diagnostic mode. The error itself keeps
/// its kind; this only describes where in the template it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedContext {
    /// Identity of the template whose artifact failed.
    pub template: String,
    /// Generated-code line at which execution failed.
    pub line: u32,
    /// The nearest annotation at or before `line`, as `(annotated_line, text)`.
    pub annotation: Option<(u32, String)>,
    /// Formatted evaluation trace.
    pub traceback: String,
}

impl MappedContext {
    /// Returns the annotation text, if a mapping was found.
    pub fn annotation_text(&self) -> Option<&str> {
        self.annotation.as_ref().map(|(_, text)| text.as_str())
    }

    /// Returns `true` if the failure was mapped to a template construct.
    pub fn is_mapped(&self) -> bool {
        self.annotation.is_some()
    }
}

impl fmt::Display for MappedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.annotation {
            Some((_, text)) => writeln!(
                f,
                "while rendering the artifact produced from template {}, \
                 an exception was raised evaluating `{}`:",
                self.template, text
            )?,
            None => writeln!(
                f,
                "while rendering the artifact produced from template {}, \
                 an exception was raised at generated line {} (no mapping available):",
                self.template, self.line
            )?,
        }
        writeln!(f)?;
        f.write_str(&self.traceback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(annotation: Option<(u32, String)>) -> MappedContext {
        MappedContext {
            template: "<Template 1a2b3c4d>".to_string(),
            line: 7,
            annotation,
            traceback: "Traceback (generated code, most recent last):\n".to_string(),
        }
    }

    #[test]
    fn display_mapped() {
        let ctx = context(Some((5, "line 3: compute ratio".to_string())));
        let text = ctx.to_string();
        assert!(text.contains("template <Template 1a2b3c4d>"));
        assert!(text.contains("evaluating `line 3: compute ratio`"));
        assert!(text.contains("Traceback"));
        assert_eq!(ctx.annotation_text(), Some("line 3: compute ratio"));
        assert!(ctx.is_mapped());
    }

    #[test]
    fn display_unmapped() {
        let ctx = context(None);
        let text = ctx.to_string();
        assert!(text.contains("no mapping available"));
        assert!(text.contains("generated line 7"));
        assert!(!ctx.is_mapped());
    }

    #[test]
    fn serde_roundtrip() {
        let ctx = context(Some((1, "x".to_string())));
        let json = serde_json::to_string(&ctx).unwrap();
        let back: MappedContext = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx, back);
    }
}
