//! Execution error types for generated template programs.
//!
//! Every failure while running a [`Program`](crate::Program) is an
//! [`ExecError`]: a stable [`ExecErrorKind`] plus the generated line it was
//! raised at, the evaluation trace, and an optional [`MappedContext`] filled
//! in by diagnostic-mode rendering.

use cinder_diagnostics::{MappedContext, TraceFrame};

/// The kind of failure raised by a generated program.
///
/// The kind is what callers match on; it is identical whether or not the
/// error was enriched with diagnostic context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecErrorKind {
    /// A variable was referenced that is neither a local, a render variable,
    /// nor a builtin value.
    #[error("name `{0}` is not defined")]
    UndefinedVariable(String),

    /// A global function was called that the artifact does not declare, or
    /// whose symbol is not registered in the builtins.
    #[error("global `{0}` is not available")]
    UndefinedGlobal(String),

    /// A member lookup on a map or list found nothing.
    #[error("{type_name} value has no member `{member}`")]
    KeyNotFound {
        /// Type of the value that was traversed.
        type_name: &'static str,
        /// The member that was requested.
        member: String,
    },

    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An operator was applied to operands it does not support.
    #[error("unsupported operand types for `{op}`: {lhs} and {rhs}")]
    TypeMismatch {
        /// The operator symbol.
        op: &'static str,
        /// Type of the left operand.
        lhs: &'static str,
        /// Type of the right operand.
        rhs: &'static str,
    },

    /// A global function was called with the wrong number of arguments.
    #[error("{function}() takes {expected} argument(s), got {got}")]
    Arity {
        /// The function name.
        function: String,
        /// Number of arguments expected.
        expected: usize,
        /// Number of arguments supplied.
        got: usize,
    },

    /// Integer arithmetic overflowed.
    #[error("integer overflow in `{0}`")]
    Overflow(&'static str),

    /// A jump targeted a line outside the program.
    #[error("jump to generated line {0} is out of range")]
    InvalidJump(u32),

    /// A native function raised an error of its own.
    #[error("{0}")]
    Raised(String),
}

/// An error raised while executing a generated program.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} (generated line {line})")]
pub struct ExecError {
    /// What went wrong.
    pub kind: ExecErrorKind,
    /// Generated line (1-indexed) at which execution failed; 0 until located.
    pub line: u32,
    /// Evaluation trace, outermost frame first.
    pub frames: Vec<TraceFrame>,
    /// Template-level context attached in diagnostic mode.
    pub context: Option<MappedContext>,
}

impl ExecError {
    /// Creates an unlocated error of the given kind.
    pub fn new(kind: ExecErrorKind) -> Self {
        Self {
            kind,
            line: 0,
            frames: Vec::new(),
            context: None,
        }
    }

    /// Creates a [`ExecErrorKind::Raised`] error, for use by native functions.
    pub fn raised(message: impl Into<String>) -> Self {
        Self::new(ExecErrorKind::Raised(message.into()))
    }

    /// Records the failing line of the program being executed.
    ///
    /// A line set by a nested program (a native that rendered another
    /// template) is replaced; the nested location stays in the frames.
    pub(crate) fn locate(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Prepends an outer trace frame.
    pub(crate) fn within(mut self, frame: TraceFrame) -> Self {
        self.frames.insert(0, frame);
        self
    }

    /// Returns `true` if diagnostic context has already been attached.
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Attaches diagnostic context, keeping the kind, line, and trace intact.
    pub fn with_context(mut self, context: MappedContext) -> Self {
        self.context = Some(context);
        self
    }
}

impl From<ExecErrorKind> for ExecError {
    fn from(kind: ExecErrorKind) -> Self {
        Self::new(kind)
    }
}
