//! # Compiler Errors
//!
//! Error type for the fallible building blocks of the compiler.
//!
//! Problems found in a user's Blueprint are never returned as `Err`; they are
//! recorded in the [`MessageLog`](crate::log::MessageLog) and compilation carries
//! on. `CompileError` covers API misuse and the low-level operations whose
//! failure the caller turns into a log entry.

use crate::graph::{NodeId, PinId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("type '{ty}' of '{name}' cannot be mapped to a storage type")]
    InvalidType { name: String, ty: String },

    #[error("a field named '{0}' is already linked into '{1}'")]
    DuplicateField(String, String),

    #[error("node {0} does not exist in graph '{1}'")]
    NodeNotFound(NodeId, String),

    #[error("pin {0} does not exist in graph '{1}'")]
    PinNotFound(PinId, String),

    #[error("node {node} has no pin named '{pin}'")]
    NamedPinNotFound { node: NodeId, pin: String },

    #[error("cannot link pins: {0}")]
    InvalidLink(String),

    #[error("already compiling blueprint '{active}', cannot start compiling '{requested}'")]
    ReentrantCompile { active: String, requested: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompileError>;
