//! Ubergraph consolidation and event stubs.
//!
//! Every event graph page is merged into a single graph compiled as one
//! function, `ExecuteUbergraph_<Blueprint>`, that takes the statement offset
//! to start at. Each event then gets a small stub function of its own name
//! which copies its parameters into the ubergraph's persistent frame and
//! calls into the ubergraph at the event's offset.

use super::{notify_remapped_nodes, SpawnGrid};
use crate::blueprint::ImplementedInterface;
use crate::class::{Class, ClassFlags, PropertyFlags};
use crate::compiler::function_context::NetNameMap;
use crate::error::Result;
use crate::graph::{
    CallData, Direction, EntryData, EventData, Graph, NodeId, NodeKind, PinId, PinType, PN_ENTRY_POINT,
    PN_EXECUTE, PN_THEN,
};
use crate::log::MessageLog;
use crate::schema::Schema;

/// Merges `pages` into one graph named `name`, headed by a synthetic entry
/// node with an `EntryPoint` parameter.
pub fn merge_ubergraph_pages(
    pages: &[Graph],
    name: &str,
    log: &mut MessageLog,
    save_intermediate_products: bool,
) -> (Graph, NodeId) {
    let mut ubergraph = Graph::new(name);
    let mut grid = SpawnGrid::new();

    for page in pages {
        let remap = ubergraph.merge_fragment(page);
        notify_remapped_nodes(log, &ubergraph, page, &remap);
        if save_intermediate_products {
            let mut merged: Vec<NodeId> = remap.nodes.values().copied().collect();
            merged.sort();
            grid.place_section(&mut ubergraph, &merged, &format!("Page: {}", page.name));
        }
        tracing::trace!(
            "[PBCC] Merged event graph page '{}' ({} nodes)",
            page.name,
            remap.nodes.len()
        );
    }

    let entry = ubergraph.spawn_intermediate_node(NodeKind::FunctionEntry(EntryData {
        custom_name: Some(name.to_string()),
        ..Default::default()
    }));
    if let Err(err) = ubergraph.add_pin(entry, Direction::Output, PN_ENTRY_POINT, PinType::int()) {
        log.error(
            &format!("Failed to create the entry point of @@: {}", err),
            &[ubergraph.graph_token()],
        );
    }
    ubergraph.set_order(&[entry]);
    (ubergraph, entry)
}

/// Spawns an override event for every implemented interface function that
/// has neither a graph nor an event, so each interface event is reachable.
///
/// Functions with outputs are implemented as function graphs and are skipped.
pub fn spawn_missing_interface_events(
    ubergraph: &mut Graph,
    interfaces: &[ImplementedInterface],
    log: &mut MessageLog,
) -> Vec<NodeId> {
    let mut spawned = Vec::new();
    for implemented in interfaces {
        let iface = &implemented.interface;
        if !iface.flags.contains(ClassFlags::INTERFACE) {
            continue;
        }
        for function in iface.hierarchy().flat_map(|class| class.functions.iter()) {
            let has_outputs = function
                .parameters()
                .any(|p| p.flags.intersects(PropertyFlags::OUT_PARM | PropertyFlags::RETURN_PARM));
            if has_outputs || implemented.graphs.iter().any(|g| g.name == function.name) {
                continue;
            }
            let already_handled = ubergraph
                .nodes()
                .any(|n| matches!(&n.kind, NodeKind::Event(e) if e.function == function.name));
            if already_handled {
                continue;
            }

            let event = ubergraph.spawn_intermediate_node(NodeKind::Event(EventData::overriding(
                function.name.clone(),
                iface.name.clone(),
            )));
            for param in function.parameters() {
                if let Err(err) = ubergraph.add_pin(event, Direction::Output, param.name.clone(), param.ty.clone()) {
                    log.error(
                        &format!("Failed to add parameter '{}' to @@: {}", param.name, err),
                        &[ubergraph.node_token(event)],
                    );
                }
            }
            tracing::debug!(
                "[PBCC] Added missing interface event '{}' from '{}'",
                function.name,
                iface.name
            );
            spawned.push(event);
        }
    }
    spawned
}

/// The stub function graph generated for one event.
#[derive(Debug, Clone)]
pub struct EventStub {
    pub graph: Graph,
    pub entry: NodeId,
    /// The call into the ubergraph whose `EntryPoint` literal gets patched.
    pub call: NodeId,
    pub has_params: bool,
}

/// Builds the stub for `event`, which lives in `ubergraph`.
///
/// Parameters are written to the class-scoped storage the event's output
/// pins are registered under, so both sides must name them through the
/// same `class_net_names` map.
pub fn build_event_stub(
    ubergraph: &Graph,
    event: NodeId,
    schema: &Schema,
    parent: &Class,
    class_net_names: &mut NetNameMap,
    log: &mut MessageLog,
) -> Option<EventStub> {
    let Some(NodeKind::Event(data)) = ubergraph.kind(event).cloned() else {
        return None;
    };
    let params: Vec<_> = ubergraph
        .filtered_pins(event, Direction::Output, false)
        .into_iter()
        .filter_map(|pin| ubergraph.pin(pin).map(|p| (pin, p.name.clone(), p.ty.clone())))
        .collect();

    if data.is_override() && !signature_matches(parent, &data, &params) {
        log.error(
            "Event node @@ is out-of-date. Please refresh it.",
            &[ubergraph.node_token(event)],
        );
        return None;
    }

    let mut graph = Graph::new(data.function.clone());
    let entry = graph.spawn_intermediate_node(NodeKind::FunctionEntry(EntryData {
        extra_flags: data.function_flags,
        custom_name: Some(data.function.clone()),
        ..Default::default()
    }));
    let call = graph.spawn_intermediate_node(NodeKind::CallFunction(CallData::self_call(
        schema.ubergraph_function_name(),
    )));
    graph.set_position(call, 2 * super::AVERAGE_NODE_WIDTH, 0);

    let built = wire_stub(&mut graph, entry, call, ubergraph, &params, class_net_names);
    if let Err(err) = built {
        log.error(
            &format!("Failed to build the function stub for @@: {}", err),
            &[ubergraph.node_token(event)],
        );
        return None;
    }

    let source = ubergraph.node_ref(event);
    for node in graph.node_ids() {
        log.notify_intermediate_object_creation(graph.node_ref(node), source.clone());
    }
    tracing::trace!("[PBCC] Built event stub '{}'", data.function);

    Some(EventStub {
        graph,
        entry,
        call,
        has_params: !params.is_empty(),
    })
}

/// Links entry -> (parameter assignment) -> ubergraph call.
fn wire_stub(
    graph: &mut Graph,
    entry: NodeId,
    call: NodeId,
    ubergraph: &Graph,
    params: &[(PinId, String, PinType)],
    class_net_names: &mut NetNameMap,
) -> Result<()> {
    let entry_point = graph.add_pin(call, Direction::Input, PN_ENTRY_POINT, PinType::int())?;
    if let Some(pin) = graph.pin_mut(entry_point) {
        pin.default_value = "0".to_string();
    }

    if params.is_empty() {
        return graph.connect(entry, PN_THEN, call, PN_EXECUTE);
    }

    let assign = graph.spawn_intermediate_node(NodeKind::VariableSet(None));
    graph.set_position(assign, super::AVERAGE_NODE_WIDTH, 0);
    for (event_pin, name, ty) in params {
        let param = graph.add_pin(entry, Direction::Output, name.clone(), ty.clone())?;
        let member = class_net_names.make_valid_name(ubergraph, *event_pin);
        let input = graph.add_pin(assign, Direction::Input, member, ty.clone())?;
        graph.make_link(param, input)?;
    }
    graph.connect(entry, PN_THEN, assign, PN_EXECUTE)?;
    graph.connect(assign, PN_THEN, call, PN_EXECUTE)
}

/// Whether an overriding event still carries the overridden function's inputs.
fn signature_matches(parent: &Class, data: &EventData, params: &[(PinId, String, PinType)]) -> bool {
    let function = parent
        .find_function(&data.function)
        .or_else(|| parent.find_interface_function(&data.function))
        .map(|(_, f)| f);
    let Some(function) = function else {
        // a missing parent function is reported by override verification
        return true;
    };
    let expected: Vec<(&str, &PinType)> = function
        .parameters()
        .filter(|p| !p.flags.contains(PropertyFlags::RETURN_PARM))
        .map(|p| (p.name.as_str(), &p.ty))
        .collect();
    expected.len() == params.len()
        && expected
            .iter()
            .zip(params)
            .all(|((name, ty), (_, pin_name, pin_ty))| *name == pin_name.as_str() && *ty == pin_ty)
}
