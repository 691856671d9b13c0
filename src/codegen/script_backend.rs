//! # Script Backend
//!
//! Lowers statements one-to-one into [`ScriptOp`]s, so resolved statement
//! indices are valid instruction indices unchanged.

use super::{CodegenBackend, Operand, ScriptOp};
use crate::class::{Class, Value};
use crate::compiler::function_context::{FunctionContext, TermId, TermKind};
use crate::compiler::statement::{GotoTarget, Statement};

#[derive(Debug, Default)]
pub struct ScriptBackend {
    functions_generated: usize,
}

impl ScriptBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of function bodies written so far.
    pub fn functions_generated(&self) -> usize {
        self.functions_generated
    }

    fn operand(ctx: &FunctionContext, id: TermId) -> Operand {
        let term = ctx.term(id);
        match term.kind {
            TermKind::Parameter | TermKind::Result | TermKind::Local | TermKind::UserLocal => {
                Operand::Local(term.name.clone())
            }
            TermKind::EventGraphLocal | TermKind::MemberReference => Operand::Instance(term.name.clone()),
            TermKind::Literal => {
                let value = match &term.default_object {
                    Some(object) if term.ty.category.is_object_like() => Value::Object(Some(object.clone())),
                    _ => Value::parse(&term.ty, &term.default_value).unwrap_or_else(|| Value::zero(&term.ty)),
                };
                Operand::Literal(value)
            }
        }
    }

    fn lower(ctx: &FunctionContext, statement: &Statement, return_index: usize) -> ScriptOp {
        let op = |id: &TermId| Self::operand(ctx, *id);
        let target = |target: &GotoTarget| match target {
            GotoTarget::Resolved(index) => *index,
            GotoTarget::Pin(pin) => {
                tracing::warn!(
                    "[PBCC] Unresolved jump to pin {} in '{}'; jumping to return",
                    pin,
                    ctx.function_name
                );
                return_index
            }
        };

        match statement {
            Statement::Comment(text) => ScriptOp::Comment(text.clone()),
            Statement::DebugSite(node) => ScriptOp::Tracepoint(*node),
            Statement::CallFunction {
                function,
                target,
                args,
                result,
            } => ScriptOp::CallFunction {
                function: function.clone(),
                context: target.as_ref().map(op),
                args: args.iter().map(op).collect(),
                result: result.as_ref().map(op),
            },
            Statement::Assignment { lhs, rhs } => ScriptOp::Let {
                dest: op(lhs),
                src: op(rhs),
            },
            Statement::CreateArray { array, elements } => ScriptOp::SetArray {
                array: op(array),
                elements: elements.iter().map(op).collect(),
            },
            Statement::UnconditionalGoto(goto) => ScriptOp::Jump(target(goto)),
            Statement::GotoIfNot { condition, target: goto } => ScriptOp::JumpIfNot {
                condition: op(condition),
                target: target(goto),
            },
            Statement::ComputedGoto(term) => ScriptOp::ComputedJump(op(term)),
            Statement::GotoReturn => ScriptOp::Jump(return_index),
            Statement::EndOfThread => ScriptOp::EndOfThread,
            Statement::Return => ScriptOp::Return,
        }
    }

    /// The script for one function context.
    pub fn generate_function(&self, ctx: &FunctionContext, skeleton_only: bool) -> Vec<ScriptOp> {
        if skeleton_only || ctx.failed || ctx.statements.is_empty() {
            return vec![ScriptOp::Return];
        }
        let return_index = ctx.statements.len() - 1;
        ctx.statements
            .iter()
            .map(|statement| Self::lower(ctx, statement, return_index))
            .collect()
    }
}

impl CodegenBackend for ScriptBackend {
    fn generate_code_from_class(&mut self, class: &mut Class, functions: &[FunctionContext], skeleton_only: bool) {
        for ctx in functions {
            let script = self.generate_function(ctx, skeleton_only);
            let Some(function) = class.find_own_function_mut(&ctx.function_name) else {
                tracing::debug!(
                    "[PBCC] No class function for '{}'; skipping code generation",
                    ctx.function_name
                );
                continue;
            };
            tracing::trace!("[PBCC] '{}': {} instruction(s)", ctx.function_name, script.len());
            function.script = script;
            self.functions_generated += 1;
        }
    }
}

/// Human-readable listing of a script, one instruction per line.
pub fn disassemble(script: &[ScriptOp]) -> String {
    fn operand(op: &Operand) -> String {
        match op {
            Operand::Local(name) => name.clone(),
            Operand::Instance(name) => format!("self.{}", name),
            Operand::Literal(value) => format!("{:?}", value),
        }
    }

    let mut out = String::new();
    for (index, op) in script.iter().enumerate() {
        let line = match op {
            ScriptOp::Comment(text) => format!("// {}", text),
            ScriptOp::Tracepoint(node) => format!("tracepoint {}", node),
            ScriptOp::CallFunction {
                function,
                context,
                args,
                result,
            } => {
                let args: Vec<String> = args.iter().map(operand).collect();
                let call = match context {
                    Some(context) => format!("{}.{}({})", operand(context), function, args.join(", ")),
                    None => format!("{}({})", function, args.join(", ")),
                };
                match result {
                    Some(result) => format!("{} = {}", operand(result), call),
                    None => call,
                }
            }
            ScriptOp::Let { dest, src } => format!("{} = {}", operand(dest), operand(src)),
            ScriptOp::SetArray { array, elements } => format!(
                "{} = [{}]",
                operand(array),
                elements.iter().map(operand).collect::<Vec<_>>().join(", ")
            ),
            ScriptOp::Jump(target) => format!("jump {}", target),
            ScriptOp::JumpIfNot { condition, target } => {
                format!("jump {} if not {}", target, operand(condition))
            }
            ScriptOp::ComputedJump(target) => format!("jump [{}]", operand(target)),
            ScriptOp::EndOfThread => "end thread".to_string(),
            ScriptOp::Return => "return".to_string(),
        };
        out.push_str(&format!("{:4}: {}\n", index, line));
    }
    out
}
