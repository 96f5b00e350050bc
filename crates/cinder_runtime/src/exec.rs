//! Program interpreter.
//!
//! [`execute`] walks a [`Program`] line by line, evaluating expressions
//! against a [`Namespace`] and accumulating output text. A failure is
//! returned as an [`ExecError`] located at the generated line that raised
//! it, with trace frames for every enclosing call and operator.

use std::cmp::Ordering;
use std::collections::HashMap;

use cinder_common::Value;
use cinder_diagnostics::TraceFrame;

use crate::error::{ExecError, ExecErrorKind};
use crate::escape::escape_html;
use crate::namespace::Namespace;
use crate::program::{BinOp, Expr, Instruction, Program, UnaryOp};

/// Executes a program and returns the produced text.
pub fn execute(program: &Program, ns: &Namespace<'_>) -> Result<String, ExecError> {
    let mut machine = Machine {
        ns,
        locals: HashMap::new(),
        out: String::new(),
        end: program.next_line(),
    };

    let mut line = 1;
    while let Some(instruction) = program.get(line) {
        line = machine.step(instruction, line).map_err(|e| {
            e.locate(line)
                .within(TraceFrame::new(line, instruction.to_string()))
        })?;
    }
    Ok(machine.out)
}

struct Machine<'n, 'a> {
    ns: &'n Namespace<'a>,
    locals: HashMap<String, Value>,
    out: String,
    /// One past the last generated line.
    end: u32,
}

impl Machine<'_, '_> {
    /// Executes one instruction and returns the next line to run.
    fn step(&mut self, instruction: &Instruction, line: u32) -> Result<u32, ExecError> {
        match instruction {
            Instruction::Text(text) => {
                self.out.push_str(text);
                Ok(line + 1)
            }
            Instruction::Emit { expr, escape } => {
                let text = self.eval(expr, line)?.to_string();
                if *escape {
                    self.out.push_str(&escape_html(&text));
                } else {
                    self.out.push_str(&text);
                }
                Ok(line + 1)
            }
            Instruction::Assign { name, expr } => {
                let value = self.eval(expr, line)?;
                self.locals.insert(name.clone(), value);
                Ok(line + 1)
            }
            Instruction::JumpUnless { cond, target } => {
                if self.eval(cond, line)?.is_truthy() {
                    Ok(line + 1)
                } else {
                    self.jump(*target)
                }
            }
            Instruction::Jump { target } => self.jump(*target),
        }
    }

    fn jump(&self, target: u32) -> Result<u32, ExecError> {
        if target == 0 || target > self.end {
            return Err(ExecErrorKind::InvalidJump(target).into());
        }
        Ok(target)
    }

    fn lookup(&self, name: &str) -> Result<Value, ExecError> {
        self.locals
            .get(name)
            .or_else(|| self.ns.variable(name))
            .cloned()
            .ok_or_else(|| ExecErrorKind::UndefinedVariable(name.to_string()).into())
    }

    fn eval(&self, expr: &Expr, line: u32) -> Result<Value, ExecError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Var(name) => self.lookup(name),
            Expr::Member { base, name } => {
                let base = self.eval(base, line)?;
                base.member(name).cloned().ok_or_else(|| {
                    ExecErrorKind::KeyNotFound {
                        type_name: base.type_name(),
                        member: name.clone(),
                    }
                    .into()
                })
            }
            Expr::Exists(inner) => match self.eval(inner, line) {
                Ok(_) => Ok(Value::Bool(true)),
                Err(e)
                    if matches!(
                        e.kind,
                        ExecErrorKind::UndefinedVariable(_) | ExecErrorKind::KeyNotFound { .. }
                    ) =>
                {
                    Ok(Value::Bool(false))
                }
                Err(e) => Err(e),
            },
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, line)?;
                apply_unary(*op, value).map_err(ExecError::from)
            }
            Expr::Binary { op, lhs, rhs } => self
                .eval_binary(*op, lhs, rhs, line)
                .map_err(|e| e.within(TraceFrame::new(line, format!("binary `{}`", op.symbol())))),
            Expr::Call { function, args } => self
                .eval_call(function, args, line)
                .map_err(|e| e.within(TraceFrame::new(line, format!("call `{function}`")))),
            Expr::Concat(parts) => {
                let mut text = String::new();
                for part in parts {
                    text.push_str(&self.eval(part, line)?.to_string());
                }
                Ok(Value::Str(text))
            }
        }
    }

    fn eval_binary(&self, op: BinOp, lhs: &Expr, rhs: &Expr, line: u32) -> Result<Value, ExecError> {
        let l = self.eval(lhs, line)?;
        match op {
            BinOp::And if !l.is_truthy() => return Ok(l),
            BinOp::Or if l.is_truthy() => return Ok(l),
            BinOp::And | BinOp::Or => return self.eval(rhs, line),
            _ => {}
        }
        let r = self.eval(rhs, line)?;
        apply_binary(op, l, r).map_err(ExecError::from)
    }

    fn eval_call(&self, function: &str, args: &[Expr], line: u32) -> Result<Value, ExecError> {
        let f = self
            .ns
            .global(function)
            .ok_or_else(|| ExecError::from(ExecErrorKind::UndefinedGlobal(function.to_string())))?;
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, line)?);
        }
        f(&values)
    }
}

fn apply_unary(op: UnaryOp, value: Value) -> Result<Value, ExecErrorKind> {
    match (op, value) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or(ExecErrorKind::Overflow("-")),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Neg, other) => Err(ExecErrorKind::Raised(format!(
            "bad operand type for unary -: {}",
            other.type_name()
        ))),
    }
}

/// Operands coerced for arithmetic and ordering.
enum Numbers {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn numbers(l: &Value, r: &Value) -> Option<Numbers> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Some(Numbers::Ints(*a, *b)),
        (Value::Int(a), Value::Float(b)) => Some(Numbers::Floats(*a as f64, *b)),
        (Value::Float(a), Value::Int(b)) => Some(Numbers::Floats(*a, *b as f64)),
        (Value::Float(a), Value::Float(b)) => Some(Numbers::Floats(*a, *b)),
        _ => None,
    }
}

fn apply_binary(op: BinOp, l: Value, r: Value) -> Result<Value, ExecErrorKind> {
    let mismatch = ExecErrorKind::TypeMismatch {
        op: op.symbol(),
        lhs: l.type_name(),
        rhs: r.type_name(),
    };
    let overflow = ExecErrorKind::Overflow(op.symbol());

    match op {
        BinOp::Add => match (l, r) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (l, r) => match numbers(&l, &r) {
                Some(Numbers::Ints(a, b)) => a.checked_add(b).map(Value::Int).ok_or(overflow),
                Some(Numbers::Floats(a, b)) => Ok(Value::Float(a + b)),
                None => Err(mismatch),
            },
        },
        BinOp::Sub => match numbers(&l, &r) {
            Some(Numbers::Ints(a, b)) => a.checked_sub(b).map(Value::Int).ok_or(overflow),
            Some(Numbers::Floats(a, b)) => Ok(Value::Float(a - b)),
            None => Err(mismatch),
        },
        BinOp::Mul => match numbers(&l, &r) {
            Some(Numbers::Ints(a, b)) => a.checked_mul(b).map(Value::Int).ok_or(overflow),
            Some(Numbers::Floats(a, b)) => Ok(Value::Float(a * b)),
            None => Err(mismatch),
        },
        BinOp::Div => match numbers(&l, &r) {
            Some(Numbers::Ints(_, 0)) => Err(ExecErrorKind::DivisionByZero),
            Some(Numbers::Ints(a, b)) => match a.checked_rem(b) {
                Some(0) => a.checked_div(b).map(Value::Int).ok_or(overflow),
                Some(_) => Ok(Value::Float(a as f64 / b as f64)),
                None => Err(overflow),
            },
            Some(Numbers::Floats(_, b)) if b == 0.0 => Err(ExecErrorKind::DivisionByZero),
            Some(Numbers::Floats(a, b)) => Ok(Value::Float(a / b)),
            None => Err(mismatch),
        },
        BinOp::Rem => match numbers(&l, &r) {
            Some(Numbers::Ints(_, 0)) => Err(ExecErrorKind::DivisionByZero),
            Some(Numbers::Ints(a, b)) => a.checked_rem(b).map(Value::Int).ok_or(overflow),
            Some(Numbers::Floats(_, b)) if b == 0.0 => Err(ExecErrorKind::DivisionByZero),
            Some(Numbers::Floats(a, b)) => Ok(Value::Float(a % b)),
            None => Err(mismatch),
        },
        BinOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
        BinOp::Ne => Ok(Value::Bool(!values_equal(&l, &r))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = compare(&l, &r).ok_or(mismatch)?;
            let result = match op {
                BinOp::Lt => ordering == Ordering::Less,
                BinOp::Le => ordering != Ordering::Greater,
                BinOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        // Short-circuit operators are handled before both sides are evaluated.
        BinOp::And | BinOp::Or => Ok(r),
    }
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match numbers(l, r) {
        Some(Numbers::Ints(a, b)) => a == b,
        Some(Numbers::Floats(a, b)) => a == b,
        None => l == r,
    }
}

fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => match numbers(l, r)? {
            Numbers::Ints(a, b) => Some(a.cmp(&b)),
            Numbers::Floats(a, b) => a.partial_cmp(&b),
        },
    }
}
