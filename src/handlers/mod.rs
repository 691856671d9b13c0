//! # Node Handlers
//!
//! One handler per node kind. A handler can rewrite the graph around its node
//! before scheduling, register the terminals the node reads and writes, and
//! emit the node's statements.
//!
//! The registry is built once per compile by asking every [`NodeKindTag`] for
//! its handler. Kinds without a handler (macro instances and tunnels, which
//! must be expanded away first) make the function fail with an
//! "unexpected node type" error if they reach the compiler.

mod call;
mod entry;
mod flow;
mod misc;
mod variable;

pub use call::{CallFunctionHandler, MakeArrayHandler};
pub use entry::{EventHandler, FunctionEntryHandler, FunctionResultHandler};
pub use flow::{generate_simple_then_goto, BranchHandler, KnotHandler};
pub use misc::{CommentHandler, TimelineHandler};
pub use variable::{TemporaryVariableHandler, VariableGetHandler, VariableSetHandler};

use crate::class::Class;
use crate::compiler::function_context::{FunctionContext, NetNameMap, TermId};
use crate::graph::{Direction, NodeId, NodeKindTag, PinId};
use crate::log::MessageLog;
use crate::schema::Schema;
use std::collections::HashMap;

/// Compile-wide state a handler may read or report into.
pub struct HandlerEnv<'a> {
    pub log: &'a mut MessageLog,
    pub schema: &'a Schema,
    pub class: &'a Class,
    /// Names of nets that live on the class (ubergraph locals).
    pub class_net_names: &'a mut NetNameMap,
}

pub trait NodeHandler: Send + Sync {
    /// Rewrites the graph around `node` before scheduling.
    fn transform(&self, _ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, _node: NodeId) {}

    /// Registers the terminals the node needs.
    fn register_nets(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        register_default_nets(ctx, env, node);
    }

    /// Emits the node's statements.
    fn compile(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId);
}

impl NodeKindTag {
    /// The handler responsible for nodes of this kind.
    pub fn create_handler(self) -> Option<Box<dyn NodeHandler>> {
        let handler: Box<dyn NodeHandler> = match self {
            NodeKindTag::FunctionEntry => Box::new(FunctionEntryHandler),
            NodeKindTag::FunctionResult => Box::new(FunctionResultHandler),
            NodeKindTag::Event => Box::new(EventHandler),
            NodeKindTag::CallFunction => Box::new(CallFunctionHandler),
            NodeKindTag::VariableGet => Box::new(VariableGetHandler),
            NodeKindTag::VariableSet => Box::new(VariableSetHandler),
            NodeKindTag::TemporaryVariable => Box::new(TemporaryVariableHandler),
            NodeKindTag::Branch => Box::new(BranchHandler),
            NodeKindTag::Knot => Box::new(KnotHandler),
            NodeKindTag::MakeArray => Box::new(MakeArrayHandler),
            NodeKindTag::Timeline => Box::new(TimelineHandler),
            NodeKindTag::Comment => Box::new(CommentHandler),
            NodeKindTag::MacroInstance | NodeKindTag::Tunnel => return None,
        };
        Some(handler)
    }
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<NodeKindTag, Box<dyn NodeHandler>>,
}

impl HandlerRegistry {
    /// Builds the registry from every known node kind.
    pub fn new() -> Self {
        let mut registry = Self::default();
        for tag in NodeKindTag::ALL {
            if let Some(handler) = tag.create_handler() {
                registry.register(tag, handler);
            }
        }
        tracing::debug!("[PBCC] Registered {} node handlers", registry.len());
        registry
    }

    /// Adds or replaces the handler for a node kind.
    pub fn register(&mut self, tag: NodeKindTag, handler: Box<dyn NodeHandler>) {
        self.handlers.insert(tag, handler);
    }

    pub fn handler_for(&self, tag: NodeKindTag) -> Option<&dyn NodeHandler> {
        self.handlers.get(&tag).map(|h| h.as_ref())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Storage name for an output net, class-scoped inside the ubergraph.
pub fn net_name(ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, pin: PinId) -> String {
    if ctx.is_event_graph() {
        env.class_net_names.make_valid_name(&ctx.graph, pin)
    } else {
        ctx.local_net_names.make_valid_name(&ctx.graph, pin)
    }
}

/// Output data pins get a local, unconnected data inputs get a literal.
pub fn register_default_nets(ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
    for pin in ctx.graph.pins_of(node) {
        let (direction, meta, linked) = match ctx.graph.pin(pin) {
            Some(p) => (p.direction, p.is_meta(), p.is_linked()),
            None => continue,
        };
        if meta {
            continue;
        }
        match direction {
            Direction::Output => {
                let name = net_name(ctx, env, pin);
                ctx.create_local_terminal_for_pin(pin, name);
            }
            Direction::Input if !linked => {
                ctx.register_literal(pin);
            }
            Direction::Input => {}
        }
    }
}

/// Resolves the term feeding `pin`, reporting an error when there is none.
pub fn require_input_term(
    ctx: &FunctionContext,
    env: &mut HandlerEnv<'_>,
    pin: PinId,
) -> Option<TermId> {
    let term = ctx.input_term(pin);
    if term.is_none() {
        env.log.error(
            "Failed to resolve the value passed into @@",
            &[ctx.graph.pin_token(pin)],
        );
    }
    term
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_compilable_kinds() {
        let registry = HandlerRegistry::new();
        assert_eq!(registry.len(), NodeKindTag::ALL.len() - 2);
        assert!(registry.handler_for(NodeKindTag::CallFunction).is_some());
        assert!(registry.handler_for(NodeKindTag::MacroInstance).is_none());
        assert!(registry.handler_for(NodeKindTag::Tunnel).is_none());
    }
}
