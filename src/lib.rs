//! # Pulsar Blueprint Class Compiler (PBCC)
//!
//! Compiles Blueprint visual scripts into runtime classes: member properties,
//! functions with linked parameter frames, a class default object, and a
//! flat script per function.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pbcc::{Blueprint, Class, CompileOptions, CompileSession, VariableDescription};
//! use pbcc::graph::PinType;
//! use std::sync::Arc;
//!
//! let actor = Arc::new(Class::new("Actor", None));
//! let mut blueprint = Blueprint::new("Door", actor);
//! blueprint
//!     .new_variables
//!     .push(VariableDescription::new("OpenAngle", PinType::float()).with_default("90.0"));
//!
//! let mut session = CompileSession::new();
//! let output = session.compile_blueprint(&mut blueprint, CompileOptions::full())?;
//! if output.succeeded() {
//!     println!("{}", output.class.describe().join("\n"));
//! }
//! # Ok::<(), pbcc::CompileError>(())
//! ```
//!
//! ## Architecture
//!
//! PBCC follows a multi-phase compilation pipeline:
//!
//! 1. **Name Validation** - Resolve member name collisions with the parent class
//! 2. **Class Synthesis** - Purge the old class, create member properties
//! 3. **Graph Transformation** - Expand macros and timelines, merge event graphs
//! 4. **Precompile** - Prune, schedule, and create function signatures
//! 5. **Compile** - Emit statements per node and inline pure nodes
//! 6. **Postcompile** - Order for fall-through and resolve jumps
//! 7. **Code Generation** - Lower statements to each function's script
//!
//! Problems in the Blueprint never abort a compile. They are collected in the
//! [`MessageLog`] returned with the class.

pub mod blueprint;
pub mod class;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod graph;
pub mod handlers;
pub mod log;
pub mod schema;
pub mod session;
pub mod transform;
pub mod validator;

// Re-export the main compilation API
pub use compiler::{compile_blueprint, BlueprintCompilerContext, CompileOutput};
pub use session::{CompileOptions, CompileSession, CompileType, SessionFlags};

// Re-export the data model
pub use blueprint::{
    Blueprint, BlueprintType, ImplementedInterface, ScsNode, SimpleConstructionScript, TimelineTemplate,
    VariableDescription,
};
pub use class::{Class, ClassFlags, DefaultObject, Function, FunctionFlags, Property, PropertyFlags, Value};
pub use codegen::{CodegenBackend, Operand, ScriptBackend, ScriptOp};
pub use error::{CompileError, Result};
pub use log::{Message, MessageLog, ObjectRef, Severity, SourceToken};
