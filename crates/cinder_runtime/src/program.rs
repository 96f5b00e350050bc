//! Generated program representation.
//!
//! A [`Program`] is a flat list of [`Instruction`]s. Instruction `i` (0-based)
//! is generated line `i + 1`; jump targets and annotation keys use these
//! 1-indexed line numbers. Programs are plain data so a compiled artifact can
//! be persisted and reloaded without re-running the compiler backend.

use cinder_common::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unary operator.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Boolean negation (by truthiness).
    Not,
}

/// A binary operator.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BinOp {
    /// `+`: numeric addition, string and list concatenation.
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`: integer result when exact, float otherwise.
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// Short-circuit `and`, yielding the deciding operand.
    And,
    /// Short-circuit `or`, yielding the deciding operand.
    Or,
}

impl BinOp {
    /// Returns the operator's source symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// An expression tree evaluated against a namespace.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Expr {
    /// A constant value.
    Literal(Value),
    /// A variable reference: locals, then render variables, then builtin values.
    Var(String),
    /// Member access on a map (by key) or list (by decimal index).
    Member {
        /// The traversed value.
        base: Box<Expr>,
        /// The member name.
        name: String,
    },
    /// `true` if the inner expression evaluates without an undefined-name or
    /// missing-member failure.
    Exists(Box<Expr>),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// A call to a global function declared in the artifact's globals table.
    Call {
        /// Local name of the global.
        function: String,
        /// Positional arguments.
        args: Vec<Expr>,
    },
    /// String concatenation of each part's display form.
    Concat(Vec<Expr>),
}

impl Expr {
    /// Shorthand for a variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    /// Shorthand for a literal.
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Shorthand for a binary operation.
    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Collects the local names of every global this expression calls.
    pub fn called_globals(&self, out: &mut Vec<String>) {
        match self {
            Expr::Literal(_) | Expr::Var(_) => {}
            Expr::Member { base, .. } => base.called_globals(out),
            Expr::Exists(inner) => inner.called_globals(out),
            Expr::Unary { operand, .. } => operand.called_globals(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.called_globals(out);
                rhs.called_globals(out);
            }
            Expr::Call { function, args } => {
                if !out.contains(function) {
                    out.push(function.clone());
                }
                for arg in args {
                    arg.called_globals(out);
                }
            }
            Expr::Concat(parts) => {
                for part in parts {
                    part.called_globals(out);
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::Str(s)) => write!(f, "{s:?}"),
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Var(name) => f.write_str(name),
            Expr::Member { base, name } => write!(f, "{base}/{name}"),
            Expr::Exists(inner) => write!(f, "exists({inner})"),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => write!(f, "-{operand}"),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "not {operand}"),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Call { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::Concat(parts) => {
                f.write_str("concat(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// One generated line.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Instruction {
    /// Append literal text to the output.
    Text(String),
    /// Evaluate and append the display form, HTML-escaped when `escape`.
    Emit {
        /// The expression to render.
        expr: Expr,
        /// Whether to HTML-escape the rendered text.
        escape: bool,
    },
    /// Bind a local name for the rest of the program.
    Assign {
        /// The local name.
        name: String,
        /// The bound expression.
        expr: Expr,
    },
    /// Jump to `target` when `cond` is falsy.
    JumpUnless {
        /// The condition.
        cond: Expr,
        /// Target generated line; one past the last line ends the program.
        target: u32,
    },
    /// Unconditional jump to `target`.
    Jump {
        /// Target generated line; one past the last line ends the program.
        target: u32,
    },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Text(text) => write!(f, "text {text:?}"),
            Instruction::Emit { expr, escape: true } => write!(f, "emit {expr}"),
            Instruction::Emit {
                expr,
                escape: false,
            } => write!(f, "emit structure {expr}"),
            Instruction::Assign { name, expr } => write!(f, "let {name} = {expr}"),
            Instruction::JumpUnless { cond, target } => {
                write!(f, "unless {cond} goto {target}")
            }
            Instruction::Jump { target } => write!(f, "goto {target}"),
        }
    }
}

/// A generated program: the executable unit of a compiled artifact.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Program {
    /// The instructions; index `i` is generated line `i + 1`.
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Creates an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an instruction and returns its generated line.
    pub fn push(&mut self, instruction: Instruction) -> u32 {
        self.instructions.push(instruction);
        self.instructions.len() as u32
    }

    /// Returns the generated line the next pushed instruction will occupy.
    pub fn next_line(&self) -> u32 {
        self.instructions.len() as u32 + 1
    }

    /// Returns the instruction at a 1-indexed generated line.
    pub fn get(&self, line: u32) -> Option<&Instruction> {
        let idx = (line as usize).checked_sub(1)?;
        self.instructions.get(idx)
    }

    /// Returns the number of generated lines.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Renders a numbered listing of the generated lines.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (i, instruction) in self.instructions.iter().enumerate() {
            out.push_str(&format!("{:>4} | {instruction}\n", i + 1));
        }
        out
    }
}
