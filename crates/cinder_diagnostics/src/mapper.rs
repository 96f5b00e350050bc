//! Backward annotation lookup from a failing generated line.

use std::collections::BTreeMap;

use crate::context::MappedContext;
use crate::trace::{format_traceback, TraceFrame};

/// Sparse mapping from generated-code line (1-indexed) to a description of
/// the template construct that produced it.
///
/// Only lines at construct boundaries are recorded; every line after an
/// entry belongs to that construct until the next entry.
pub type AnnotationTable = BTreeMap<u32, String>;

/// Finds the nearest annotation at or before `line`.
///
/// Returns the annotated line together with its text, or `None` when no
/// construct starts at or before `line`.
pub fn nearest_annotation(annotations: &AnnotationTable, line: u32) -> Option<(u32, &str)> {
    annotations
        .range(..=line)
        .next_back()
        .map(|(l, text)| (*l, text.as_str()))
}

/// Builds the diagnostic context for a failure at generated `line`.
///
/// Never fails: when no annotation is found the context records that no
/// mapping is available, so the original error is always what propagates.
pub fn map_failure(
    template: &str,
    annotations: &AnnotationTable,
    line: u32,
    frames: &[TraceFrame],
) -> MappedContext {
    MappedContext {
        template: template.to_string(),
        line,
        annotation: nearest_annotation(annotations, line).map(|(l, text)| (l, text.to_string())),
        traceback: format_traceback(frames),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AnnotationTable {
        let mut t = AnnotationTable::new();
        t.insert(2, "line 1: greeting".to_string());
        t.insert(5, "line 3: compute ratio".to_string());
        t
    }

    #[test]
    fn exact_hit() {
        assert_eq!(
            nearest_annotation(&table(), 5),
            Some((5, "line 3: compute ratio"))
        );
    }

    #[test]
    fn walks_backward_to_nearest() {
        assert_eq!(nearest_annotation(&table(), 4), Some((2, "line 1: greeting")));
        assert_eq!(
            nearest_annotation(&table(), 40),
            Some((5, "line 3: compute ratio"))
        );
    }

    #[test]
    fn before_first_annotation_is_none() {
        assert_eq!(nearest_annotation(&table(), 1), None);
        assert_eq!(nearest_annotation(&AnnotationTable::new(), 10), None);
    }

    #[test]
    fn map_failure_mapped() {
        let frames = vec![TraceFrame::new(6, "binary `/`")];
        let ctx = map_failure("<Template x>", &table(), 6, &frames);
        assert_eq!(ctx.line, 6);
        assert_eq!(ctx.annotation_text(), Some("line 3: compute ratio"));
        assert!(ctx.traceback.contains("binary `/`"));
    }

    #[test]
    fn map_failure_unmapped_degrades() {
        let ctx = map_failure("<Template x>", &table(), 1, &[]);
        assert!(!ctx.is_mapped());
        assert!(ctx.to_string().contains("no mapping available"));
    }
}
