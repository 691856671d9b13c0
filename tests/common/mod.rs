//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use pbcc::graph::{
    CallData, Direction, EventData, Graph, NodeId, NodeKind, PinType, VariableReference, PN_EXECUTE, PN_THEN,
};
use pbcc::{Blueprint, Class, Function, FunctionFlags, Property, PropertyFlags, ScriptOp};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Routes compiler logging to the test output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// A native `Actor` with a `Speed` member and two overridable events.
pub fn actor_class() -> Arc<Class> {
    let mut actor = Class::new("Actor", None);
    actor
        .link_added_property(Property::new("Speed", PinType::float()).unwrap())
        .unwrap();

    let event_flags = FunctionFlags::BLUEPRINT_EVENT | FunctionFlags::EVENT | FunctionFlags::PUBLIC;
    actor
        .add_function(Function::new("ReceiveBeginPlay", event_flags))
        .unwrap();

    let mut tick = Function::new("ReceiveTick", event_flags);
    let mut delta = Property::new("DeltaSeconds", PinType::float()).unwrap();
    delta.flags |= PropertyFlags::PARM;
    tick.add_property(delta).unwrap();
    tick.link();
    actor.add_function(tick).unwrap();

    actor.static_link();
    Arc::new(actor)
}

pub fn door() -> Blueprint {
    Blueprint::new("Door", actor_class())
}

/// Entry -> `Callee()` -> Result.
pub fn simple_function(name: &str, callee: &str) -> Graph {
    let mut graph = Graph::new(name);
    let entry = graph.spawn_node(NodeKind::FunctionEntry(Default::default()));
    let call = graph.spawn_node(NodeKind::CallFunction(CallData::self_call(callee)));
    let result = graph.spawn_node(NodeKind::FunctionResult);
    graph.connect(entry, PN_THEN, call, PN_EXECUTE).unwrap();
    graph.connect(call, PN_THEN, result, PN_EXECUTE).unwrap();
    graph
}

/// An event page with `BeginPlay -> Print()` and
/// `Tick(DeltaSeconds) -> LastDelta = DeltaSeconds`.
pub fn event_page() -> (Graph, NodeId, NodeId) {
    let mut page = Graph::new("EventGraph");

    let begin = page.spawn_node(NodeKind::Event(EventData::overriding("ReceiveBeginPlay", "Actor")));
    let print = page.spawn_node(NodeKind::CallFunction(CallData::self_call("Print")));
    page.connect(begin, PN_THEN, print, PN_EXECUTE).unwrap();

    let tick = page.spawn_node(NodeKind::Event(EventData::overriding("ReceiveTick", "Actor")));
    page.add_pin(tick, Direction::Output, "DeltaSeconds", PinType::float())
        .unwrap();
    let set = page.spawn_node(NodeKind::VariableSet(Some(VariableReference::self_member(
        "LastDelta",
        PinType::float(),
    ))));
    page.connect(tick, PN_THEN, set, PN_EXECUTE).unwrap();
    page.connect(tick, "DeltaSeconds", set, "LastDelta").unwrap();

    (page, begin, tick)
}

/// The script with tracepoints and comments stripped.
pub fn code_only(script: &[ScriptOp]) -> Vec<ScriptOp> {
    script
        .iter()
        .filter(|op| !matches!(op, ScriptOp::Tracepoint(_) | ScriptOp::Comment(_)))
        .cloned()
        .collect()
}

pub fn calls(script: &[ScriptOp]) -> Vec<String> {
    script
        .iter()
        .filter_map(|op| match op {
            ScriptOp::CallFunction { function, .. } => Some(function.clone()),
            _ => None,
        })
        .collect()
}
