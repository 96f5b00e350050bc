//! A line-oriented compiler backend for unit tests.
//!
//! Each body line becomes one instruction:
//! - `$ expr` or `$ expr # label` emits `expr` (`a / b`, `f()`, or a name)
//!   and annotates it as `line N: label` (or the expression text);
//! - `#select name value` adds a string selector;
//! - `#macro name` ... `#end` delimits a macro;
//! - a line containing `@@` is a compile error;
//! - anything else is literal text.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cinder_common::Value;
use cinder_runtime::{BinOp, Expr, Instruction};

use crate::compiler::{CompilerOutput, DialectTable, TemplateCompiler};
use crate::error::CompileError;

#[derive(Clone, Default)]
pub(crate) struct StubCompiler {
    count: Arc<AtomicUsize>,
    delay: Duration,
}

impl StubCompiler {
    pub(crate) fn slow(delay: Duration) -> Self {
        Self {
            count: Arc::default(),
            delay,
        }
    }

    pub(crate) fn compiles(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

fn parse_expr(src: &str, out: &mut CompilerOutput) -> Expr {
    if let Some((lhs, rhs)) = src.split_once(" / ") {
        return Expr::binary(BinOp::Div, Expr::var(lhs.trim()), Expr::var(rhs.trim()));
    }
    if let Some(function) = src.strip_suffix("()") {
        out.globals
            .insert(function.to_string(), function.to_string());
        return Expr::Call {
            function: function.to_string(),
            args: Vec::new(),
        };
    }
    Expr::var(src)
}

impl TemplateCompiler for StubCompiler {
    fn compile(
        &self,
        body: &str,
        _dialects: &DialectTable,
        _default_dialect: &str,
        macro_name: Option<&str>,
    ) -> Result<CompilerOutput, CompileError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let mut out = CompilerOutput::default();
        let mut current_macro: Option<&str> = None;
        let mut found = macro_name.is_none();

        for (i, line) in body.lines().enumerate() {
            let n = i as u32 + 1;
            if let Some(col) = line.find("@@") {
                return Err(CompileError::at("unexpected `@@`", n, col as u32 + 1));
            }
            if let Some(name) = line.strip_prefix("#macro ") {
                current_macro = Some(name.trim());
                found |= macro_name == current_macro;
                continue;
            }
            if line == "#end" {
                current_macro = None;
                continue;
            }
            if current_macro != macro_name {
                continue;
            }
            if let Some(rest) = line.strip_prefix("#select ") {
                let (name, value) = rest.split_once(' ').unwrap_or((rest, ""));
                out.selectors
                    .insert(name.to_string(), Value::from(value));
                continue;
            }
            if let Some(rest) = line.strip_prefix("$ ") {
                let (expr_src, label) = match rest.split_once(" # ") {
                    Some((expr, label)) => (expr.trim(), label.trim()),
                    None => (rest.trim(), rest.trim()),
                };
                let expr = parse_expr(expr_src, &mut out);
                let at = out.program.push(Instruction::Emit { expr, escape: true });
                out.annotations.insert(at, format!("line {n}: {label}"));
                continue;
            }
            out.program.push(Instruction::Text(line.to_string()));
        }

        if !found {
            return Err(CompileError::new(format!(
                "macro `{}` not found",
                macro_name.unwrap_or_default()
            )));
        }
        Ok(out)
    }
}
