//! Code generation from the construct tree.

use cinder_diagnostics::SourceText;
use cinder_runtime::{Expr, Instruction};
use cinder_template::{CompileError, CompilerOutput, DialectTable, TemplateCompiler};

use crate::lexer::{error_at, Construct};
use crate::parser::{parse, ExprSource, Node};

/// The brace-syntax compiler backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceCompiler;

impl TemplateCompiler for BraceCompiler {
    fn compile(
        &self,
        body: &str,
        dialects: &DialectTable,
        default_dialect: &str,
        macro_name: Option<&str>,
    ) -> Result<CompilerOutput, CompileError> {
        let doc = parse(body)?;
        let nodes = match macro_name {
            Some(name) => doc
                .macros
                .get(name)
                .ok_or_else(|| CompileError::new(format!("macro `{name}` is not defined")))?,
            None => &doc.main,
        };

        let mut codegen = Codegen {
            body,
            lines: SourceText::new(body),
            dialects,
            default_dialect,
            out: CompilerOutput::default(),
        };
        codegen.block(nodes)?;

        tracing::trace!(
            macros = doc.macros.len(),
            lines = codegen.out.program.len(),
            "generated brace template"
        );
        Ok(codegen.out)
    }
}

struct Codegen<'a> {
    body: &'a str,
    lines: SourceText<'a>,
    dialects: &'a DialectTable,
    default_dialect: &'a str,
    out: CompilerOutput,
}

impl Codegen<'_> {
    fn block(&mut self, nodes: &[Node]) -> Result<(), CompileError> {
        for node in nodes {
            self.node(node)?;
        }
        Ok(())
    }

    fn node(&mut self, node: &Node) -> Result<(), CompileError> {
        match node {
            Node::Text(text) => {
                self.out.program.push(Instruction::Text(text.clone()));
            }
            Node::Emit {
                expr,
                structure,
                at,
            } => {
                let expr = self.translate(expr, at)?;
                self.annotate(at);
                self.out.program.push(Instruction::Emit {
                    expr,
                    escape: !structure,
                });
            }
            Node::Let { name, expr, at } => {
                let expr = self.translate(expr, at)?;
                self.annotate(at);
                self.out.program.push(Instruction::Assign {
                    name: name.clone(),
                    expr,
                });
            }
            Node::Select { name, value } => {
                self.out.selectors.insert(name.clone(), value.clone());
            }
            Node::If {
                cond,
                then,
                otherwise,
                at,
            } => {
                let cond = self.translate(cond, at)?;
                self.annotate(at);
                let branch = self
                    .out
                    .program
                    .push(Instruction::JumpUnless { cond, target: 0 });
                self.block(then)?;

                if otherwise.is_empty() {
                    self.patch(branch);
                } else {
                    let skip = self.out.program.push(Instruction::Jump { target: 0 });
                    self.patch(branch);
                    self.block(otherwise)?;
                    self.patch(skip);
                }
            }
        }
        Ok(())
    }

    /// Records the construct at the next generated line.
    fn annotate(&mut self, at: &Construct) {
        let (line, _) = self.lines.line_col(at.offset as u32);
        self.out
            .annotations
            .insert(self.out.program.next_line(), format!("line {line}: {}", at.source));
    }

    /// Points the jump at generated line `line` to the next line.
    fn patch(&mut self, line: u32) {
        let next = self.out.program.next_line();
        if let Some(Instruction::JumpUnless { target, .. } | Instruction::Jump { target }) =
            self.out.program.instructions.get_mut(line as usize - 1)
        {
            *target = next;
        }
    }

    fn translate(&mut self, src: &ExprSource, at: &Construct) -> Result<Expr, CompileError> {
        let name = src.dialect.as_deref().unwrap_or(self.default_dialect);
        let dialect = self.dialects.get(name).ok_or_else(|| {
            error_at(self.body, at.offset, format!("unknown expression dialect `{name}`"))
        })?;
        let expr = dialect
            .translate(&src.text)
            .map_err(|msg| error_at(self.body, at.offset, format!("in `{}`: {msg}", at.source)))?;

        let mut called = Vec::new();
        expr.called_globals(&mut called);
        for function in called {
            self.out.globals.insert(function.clone(), function);
        }
        Ok(expr)
    }
}
