//! Trace frames recorded while a failure propagates out of a generated program.

use serde::{Deserialize, Serialize};

/// One step of the evaluation trace at the point of failure.
///
/// Frames are ordered outermost first, so the last frame is where the
/// failure was raised.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFrame {
    /// The generated-code line (1-indexed) the frame belongs to.
    pub line: u32,
    /// What was being evaluated, e.g. ``call `upper` ``.
    pub description: String,
}

impl TraceFrame {
    /// Creates a new trace frame.
    pub fn new(line: u32, description: impl Into<String>) -> Self {
        Self {
            line,
            description: description.into(),
        }
    }
}

/// Formats trace frames in a traceback-like layout, one frame per line.
pub fn format_traceback(frames: &[TraceFrame]) -> String {
    let mut out = String::from("Traceback (generated code, most recent last):\n");
    for frame in frames {
        out.push_str(&format!(
            "  generated line {}, in {}\n",
            frame.line, frame.description
        ));
    }
    out
}
