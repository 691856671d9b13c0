//! Intermediate statements emitted by node handlers.

use super::function_context::TermId;
use crate::graph::{NodeId, PinId};
use serde::{Deserialize, Serialize};

/// Jump destination. Handlers point at an exec output pin; goto resolution
/// replaces it with a statement index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GotoTarget {
    Pin(PinId),
    Resolved(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Comment(String),
    /// Marks where a node's code begins, for the debugger.
    DebugSite(NodeId),
    CallFunction {
        function: String,
        /// Object the function is called on; `None` calls on self.
        target: Option<TermId>,
        args: Vec<TermId>,
        result: Option<TermId>,
    },
    Assignment {
        lhs: TermId,
        rhs: TermId,
    },
    CreateArray {
        array: TermId,
        elements: Vec<TermId>,
    },
    UnconditionalGoto(GotoTarget),
    GotoIfNot {
        condition: TermId,
        target: GotoTarget,
    },
    /// Jumps to the statement index held by the term.
    ComputedGoto(TermId),
    GotoReturn,
    EndOfThread,
    Return,
}

impl Statement {
    pub fn goto_target(&self) -> Option<GotoTarget> {
        match self {
            Statement::UnconditionalGoto(target) | Statement::GotoIfNot { target, .. } => {
                Some(*target)
            }
            _ => None,
        }
    }

    pub fn goto_target_mut(&mut self) -> Option<&mut GotoTarget> {
        match self {
            Statement::UnconditionalGoto(target) | Statement::GotoIfNot { target, .. } => {
                Some(target)
            }
            _ => None,
        }
    }

    /// Bookkeeping statements that do not count as generated code.
    pub fn is_marker(&self) -> bool {
        matches!(self, Statement::Comment(_) | Statement::DebugSite(_))
    }
}
