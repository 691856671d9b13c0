//! # Code Generation
//!
//! Backends turn the statement lists left on each function context into code
//! stored on the generated class. [`ScriptBackend`] lowers them to a flat,
//! index-addressed script.

mod script_backend;

pub use script_backend::{disassemble, ScriptBackend};

use crate::class::{Class, Value};
use crate::compiler::function_context::FunctionContext;
use crate::graph::NodeId;
use serde::{Deserialize, Serialize};

/// Consumes the compiled function contexts of a class.
pub trait CodegenBackend {
    fn generate_code_from_class(
        &mut self,
        class: &mut Class,
        functions: &[FunctionContext],
        skeleton_only: bool,
    );
}

/// Where a script operand lives at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A property of the executing function's frame.
    Local(String),
    /// A property of the object the function runs on.
    Instance(String),
    Literal(Value),
}

/// One script instruction. Jump targets are instruction indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptOp {
    Comment(String),
    Tracepoint(NodeId),
    CallFunction {
        function: String,
        context: Option<Operand>,
        args: Vec<Operand>,
        result: Option<Operand>,
    },
    Let {
        dest: Operand,
        src: Operand,
    },
    SetArray {
        array: Operand,
        elements: Vec<Operand>,
    },
    Jump(usize),
    JumpIfNot {
        condition: Operand,
        target: usize,
    },
    ComputedJump(Operand),
    EndOfThread,
    Return,
}
