//! Macro instance expansion and tunnel collapsing.

use super::SpawnGrid;
use crate::graph::{Direction, Graph, NodeId, NodeKind, PinId};
use crate::log::MessageLog;

/// Nested macros deeper than this are reported instead of expanded.
pub const MAX_MACRO_EXPANSION_PASSES: usize = 64;

/// Expands every macro instance in `graph`, including macros nested inside
/// expanded bodies. Returns `false` if any instance could not be expanded.
pub fn expand_tunnels_and_macros(
    graph: &mut Graph,
    macro_graphs: &[Graph],
    log: &mut MessageLog,
    save_intermediate_products: bool,
) -> bool {
    let mut grid = SpawnGrid::new();
    let mut ok = true;

    for pass in 0.. {
        let instances = graph.nodes_where(|kind| matches!(kind, NodeKind::MacroInstance(_)));
        if instances.is_empty() {
            break;
        }
        if pass >= MAX_MACRO_EXPANSION_PASSES {
            for instance in instances {
                log.error(
                    "Macro node @@ is nested too deeply to expand (is it recursive?)",
                    &[graph.node_token(instance)],
                );
                graph.remove_node(instance);
            }
            return false;
        }
        tracing::debug!(
            "[PBCC] Expanding {} macro instance(s) in '{}' (pass {})",
            instances.len(),
            graph.name,
            pass + 1
        );
        for instance in instances {
            ok &= expand_macro_instance(graph, instance, macro_graphs, log, save_intermediate_products, &mut grid);
        }
    }
    ok
}

fn expand_macro_instance(
    graph: &mut Graph,
    instance: NodeId,
    macro_graphs: &[Graph],
    log: &mut MessageLog,
    save_intermediate_products: bool,
    grid: &mut SpawnGrid,
) -> bool {
    let Some(NodeKind::MacroInstance(data)) = graph.kind(instance).cloned() else {
        return true;
    };
    let Some(macro_graph) = macro_graphs.iter().find(|g| g.name == data.macro_graph) else {
        log.error(
            "Macro node @@ is pointing at an invalid macro graph.",
            &[graph.node_token(instance)],
        );
        graph.remove_node(instance);
        return false;
    };

    // Phase 1: build the body in a scratch fragment.
    let mut fragment = macro_graph.clone_into_fragment(format!("{}_expansion", macro_graph.name));
    if let Some(resolved) = &data.resolved_wildcard_type {
        for node in fragment.node_ids() {
            for pin in fragment.pins_of(node) {
                if let Some(pin) = fragment.pin_mut(pin) {
                    if pin.ty.is_wildcard() {
                        pin.ty.resolve_wildcard(resolved);
                    }
                }
            }
        }
    }

    add_array_literals_for_unconnected_inputs(graph, instance, log);

    // Phase 2: merge it into the host.
    let remap = graph.merge_fragment(&fragment);
    let mut cloned: Vec<NodeId> = fragment
        .node_ids()
        .into_iter()
        .filter_map(|old| remap.nodes.get(&old).copied())
        .collect();
    let instance_ref = graph.node_ref(instance);
    for old in fragment.node_ids() {
        if let Some(new) = remap.nodes.get(&old) {
            let source = macro_graph.node_ref(old);
            log.notify_intermediate_macro_node(graph.node_ref(*new), source, instance_ref.clone());
            if let Some(node) = graph.node_mut(*new) {
                node.intermediate = true;
            }
        }
    }
    for (old, new) in &remap.pins {
        log.notify_intermediate_object_creation(graph.pin_ref(*new), macro_graph.pin_ref(*old));
    }

    if save_intermediate_products {
        if let Some(comment) = grid.place_section(graph, &cloned, &format!("Macro: {}", macro_graph.name)) {
            log.notify_intermediate_object_creation(graph.node_ref(comment), instance_ref.clone());
        }
    } else if let Some(anchor) = graph.node(instance).map(|n| n.position) {
        let origin = cloned
            .iter()
            .filter_map(|id| graph.node(*id).map(|n| n.position))
            .fold(None, |acc: Option<(i32, i32)>, p| match acc {
                Some((x, y)) => Some((x.min(p.x), y.min(p.y))),
                None => Some((p.x, p.y)),
            })
            .unwrap_or((0, 0));
        graph.offset_nodes(&cloned, anchor.x - origin.0, anchor.y - origin.1);
    }

    // Phase 3: splice the body in by collapsing its boundary tunnels.
    cloned.retain(|id| matches!(graph.kind(*id), Some(NodeKind::Tunnel { .. })));
    let mut ok = true;
    // entry tunnels first so pass-through wires reach the exit tunnel
    cloned.sort_by_key(|id| !matches!(graph.kind(*id), Some(NodeKind::Tunnel { entry: true })));
    for tunnel in cloned {
        ok &= collapse_tunnel(graph, tunnel, instance, log);
    }
    graph.remove_node(instance);
    ok
}

/// Gives every unconnected array input of a macro instance an empty array to read.
fn add_array_literals_for_unconnected_inputs(graph: &mut Graph, instance: NodeId, log: &mut MessageLog) {
    for pin in graph.filtered_pins(instance, Direction::Input, false) {
        let Some((ty, linked)) = graph.pin(pin).map(|p| (p.ty.clone(), p.is_linked())) else {
            continue;
        };
        if !ty.is_array || linked {
            continue;
        }
        let make_array = graph.spawn_intermediate_node(NodeKind::MakeArray {
            element: ty.element_type(),
            count: 0,
        });
        if let Some(position) = graph.node(instance).map(|n| n.position) {
            graph.set_position(make_array, position.x - super::AVERAGE_NODE_WIDTH, position.y);
        }
        if let Some(output) = graph.find_pin(make_array, "Array", Some(Direction::Output)) {
            if graph.make_link(output, pin).is_err() {
                log.error("Failed to create an empty array for @@", &[graph.pin_token(pin)]);
            }
        }
    }
}

/// Rewires a tunnel's internal links to the instance's external ones and removes it.
fn collapse_tunnel(graph: &mut Graph, tunnel: NodeId, instance: NodeId, log: &mut MessageLog) -> bool {
    let Some(NodeKind::Tunnel { entry }) = graph.kind(tunnel).cloned() else {
        return true;
    };
    // The entry tunnel exposes the instance's inputs as outputs, and vice versa.
    let (tunnel_side, instance_side) = if entry {
        (Direction::Output, Direction::Input)
    } else {
        (Direction::Input, Direction::Output)
    };

    let mut ok = true;
    for tunnel_pin in graph.pins_of(tunnel) {
        let Some((name, direction)) = graph.pin(tunnel_pin).map(|p| (p.name.clone(), p.direction)) else {
            continue;
        };
        if direction != tunnel_side {
            continue;
        }
        let Some(instance_pin) = graph.find_pin(instance, &name, Some(instance_side)) else {
            log.error("Failed to collapse tunnel @@", &[graph.pin_token(tunnel_pin)]);
            ok = false;
            continue;
        };
        if !rewire_through(graph, instance_pin, tunnel_pin, entry) {
            log.error("Failed to collapse tunnel @@", &[graph.node_token(tunnel)]);
            ok = false;
        }
    }
    graph.remove_node(tunnel);
    ok
}

/// Connects what is wired to `instance_pin` outside the macro directly to
/// what is wired to `tunnel_pin` inside it.
fn rewire_through(graph: &mut Graph, instance_pin: PinId, tunnel_pin: PinId, entry: bool) -> bool {
    let external = graph.links_of(instance_pin);
    let internal = graph.links_of(tunnel_pin);
    graph.break_pin_links(tunnel_pin);

    if entry {
        // external sources feed internal targets; unwired inputs pass their literal through
        let (default_value, default_object) = graph
            .pin(instance_pin)
            .map(|p| (p.default_value.clone(), p.default_object.clone()))
            .unwrap_or_default();
        for target in &internal {
            if external.is_empty() {
                if let Some(pin) = graph.pin_mut(*target) {
                    pin.default_value = default_value.clone();
                    pin.default_object = default_object.clone();
                }
            }
            for source in &external {
                if graph.make_link(*source, *target).is_err() {
                    return false;
                }
            }
        }
    } else {
        // internal sources feed external targets
        let (default_value, default_object) = graph
            .pin(tunnel_pin)
            .map(|p| (p.default_value.clone(), p.default_object.clone()))
            .unwrap_or_default();
        for target in &external {
            if internal.is_empty() {
                if let Some(pin) = graph.pin_mut(*target) {
                    pin.default_value = default_value.clone();
                    pin.default_object = default_object.clone();
                }
            }
            for source in &internal {
                if graph.make_link(*source, *target).is_err() {
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CallData, MacroData, PinType, PN_EXECUTE, PN_THEN};

    /// A macro whose body calls `Inner` between its exec boundary pins and
    /// passes a wildcard value through.
    fn make_macro() -> Graph {
        let mut body = Graph::new("DoInner");
        let inputs = body.spawn_node(NodeKind::Tunnel { entry: true });
        let outputs = body.spawn_node(NodeKind::Tunnel { entry: false });
        body.add_pin(inputs, Direction::Output, "Exec", PinType::exec()).unwrap();
        body.add_pin(inputs, Direction::Output, "Value", PinType::wildcard()).unwrap();
        body.add_pin(outputs, Direction::Input, "Done", PinType::exec()).unwrap();
        body.add_pin(outputs, Direction::Input, "Result", PinType::wildcard()).unwrap();

        let inner = body.spawn_node(NodeKind::CallFunction(CallData::self_call("Inner")));
        body.connect(inputs, "Exec", inner, PN_EXECUTE).unwrap();
        body.connect(inner, PN_THEN, outputs, "Done").unwrap();
        body.connect(inputs, "Value", outputs, "Result").unwrap();
        body
    }

    fn host_with_instance() -> (Graph, NodeId, NodeId, NodeId) {
        let mut host = Graph::new("F");
        let before = host.spawn_node(NodeKind::CallFunction(CallData::self_call("Before")));
        let after = host.spawn_node(NodeKind::CallFunction(CallData::self_call("After")));
        host.add_pin(after, Direction::Input, "In", PinType::int()).unwrap();
        let instance = host.spawn_node(NodeKind::MacroInstance(MacroData {
            macro_graph: "DoInner".into(),
            resolved_wildcard_type: Some(PinType::int()),
        }));
        host.add_pin(instance, Direction::Input, "Exec", PinType::exec()).unwrap();
        host.add_pin(instance, Direction::Input, "Value", PinType::int()).unwrap();
        host.add_pin(instance, Direction::Output, "Done", PinType::exec()).unwrap();
        host.add_pin(instance, Direction::Output, "Result", PinType::int()).unwrap();
        host.connect(before, PN_THEN, instance, "Exec").unwrap();
        host.connect(instance, "Done", after, PN_EXECUTE).unwrap();
        host.connect(instance, "Result", after, "In").unwrap();
        let value = host.find_pin(instance, "Value", None).unwrap();
        host.pin_mut(value).unwrap().default_value = "7".into();
        (host, before, after, instance)
    }

    #[test]
    fn test_macro_expansion_is_transparent() {
        let (mut host, before, after, instance) = host_with_instance();
        let mut log = MessageLog::new();
        assert!(expand_tunnels_and_macros(&mut host, &[make_macro()], &mut log, false));
        assert_eq!(log.num_errors, 0);

        assert!(!host.contains_node(instance));
        assert!(host
            .nodes()
            .all(|n| !matches!(n.kind, NodeKind::MacroInstance(_) | NodeKind::Tunnel { .. })));

        // Before -> Inner -> After
        let before_then = host.find_pin(before, PN_THEN, None).unwrap();
        let inner = host.linked_nodes(before_then)[0];
        assert!(matches!(host.kind(inner), Some(NodeKind::CallFunction(c)) if c.function == "Inner"));
        let inner_then = host.find_pin(inner, PN_THEN, None).unwrap();
        assert_eq!(host.linked_nodes(inner_then), vec![after]);

        // the pass-through value carries the instance's literal to After
        let after_in = host.find_pin(after, "In", None).unwrap();
        assert_eq!(host.pin(after_in).unwrap().default_value, "7");
        assert!(host.links_of(after_in).is_empty());
    }

    #[test]
    fn test_wildcards_resolve_and_unwired_arrays_read_an_empty_array() {
        let mut body = Graph::new("ConsumeAll");
        let inputs = body.spawn_node(NodeKind::Tunnel { entry: true });
        let outputs = body.spawn_node(NodeKind::Tunnel { entry: false });
        body.add_pin(inputs, Direction::Output, "Exec", PinType::exec()).unwrap();
        body.add_pin(inputs, Direction::Output, "Items", PinType::wildcard().array_of())
            .unwrap();
        body.add_pin(outputs, Direction::Input, "Done", PinType::exec()).unwrap();
        let consume = body.spawn_node(NodeKind::CallFunction(CallData::self_call("Consume")));
        body.add_pin(consume, Direction::Input, "Items", PinType::wildcard().array_of())
            .unwrap();
        body.connect(inputs, "Exec", consume, PN_EXECUTE).unwrap();
        body.connect(inputs, "Items", consume, "Items").unwrap();
        body.connect(consume, PN_THEN, outputs, "Done").unwrap();

        let mut host = Graph::new("F");
        let instance = host.spawn_node(NodeKind::MacroInstance(MacroData {
            macro_graph: "ConsumeAll".into(),
            resolved_wildcard_type: Some(PinType::int()),
        }));
        host.add_pin(instance, Direction::Input, "Exec", PinType::exec()).unwrap();
        host.add_pin(instance, Direction::Input, "Items", PinType::int().array_of())
            .unwrap();
        host.add_pin(instance, Direction::Output, "Done", PinType::exec()).unwrap();

        let mut log = MessageLog::new();
        assert!(expand_tunnels_and_macros(&mut host, &[body], &mut log, false));
        assert_eq!(log.num_errors, 0);

        let consume = host.nodes_where(|k| matches!(k, NodeKind::CallFunction(c) if c.function == "Consume"))[0];
        let items = host.find_pin(consume, "Items", Some(Direction::Input)).unwrap();
        assert_eq!(host.pin(items).unwrap().ty, PinType::int().array_of());

        let sources = host.linked_nodes(items);
        assert_eq!(sources.len(), 1);
        assert!(matches!(
            host.kind(sources[0]),
            Some(NodeKind::MakeArray { element, count: 0 }) if *element == PinType::int()
        ));
    }

    #[test]
    fn test_expanded_nodes_trace_back_to_instance() {
        let (mut host, before, _, instance) = host_with_instance();
        let instance_ref = host.node_ref(instance);
        let mut log = MessageLog::new();
        expand_tunnels_and_macros(&mut host, &[make_macro()], &mut log, false);

        let inner = host.linked_nodes(host.find_pin(before, PN_THEN, None).unwrap())[0];
        assert_eq!(log.find_source_object(&host.node_ref(inner)), instance_ref);
        let macro_source = log.macro_source_of(&host.node_ref(inner)).unwrap().clone();
        assert_eq!(log.macro_instances_of(&macro_source), &[instance_ref]);
    }

    #[test]
    fn test_invalid_macro_reference_is_an_error() {
        let (mut host, _, _, instance) = host_with_instance();
        let mut log = MessageLog::new();
        assert!(!expand_tunnels_and_macros(&mut host, &[], &mut log, false));
        assert_eq!(log.num_errors, 1);
        assert!(log.messages[0].text.contains("invalid macro graph"));
        assert!(!host.contains_node(instance));
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let (mut host, ..) = host_with_instance();
        let mut log = MessageLog::new();
        expand_tunnels_and_macros(&mut host, &[make_macro()], &mut log, false);
        let count = host.node_count();
        expand_tunnels_and_macros(&mut host, &[make_macro()], &mut log, false);
        assert_eq!(host.node_count(), count);
        assert_eq!(log.num_errors, 0);
    }
}
