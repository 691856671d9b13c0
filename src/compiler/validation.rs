//! Structural checks on links and pins, run before a function graph is pruned.
//!
//! Everything here is report-and-continue: the compile goes on even when a
//! problem is found.

use crate::graph::{Direction, Graph, NodeKind, PinId};
use crate::log::MessageLog;
use crate::schema::Schema;

/// Validates every link and pin of `graph`.
pub fn validate_graph(graph: &Graph, schema: &Schema, log: &mut MessageLog) {
    for node in graph.node_ids() {
        for pin in graph.pins_of(node) {
            validate_links(graph, schema, pin, log);
            validate_pin(graph, schema, pin, log);
        }
        if matches!(graph.kind(node), Some(NodeKind::FunctionResult)) {
            let reached = graph
                .filtered_pins(node, Direction::Input, true)
                .iter()
                .any(|p| graph.pin(*p).map_or(false, |p| p.is_linked()));
            if !reached {
                log.warning(
                    "Return node @@ has no connected execution input and will never run",
                    &[graph.node_token(node)],
                );
            }
        }
    }
}

fn validate_links(graph: &Graph, schema: &Schema, pin: PinId, log: &mut MessageLog) {
    let Some(p) = graph.pin(pin) else {
        return;
    };
    for other in &p.links {
        let Some(o) = graph.pin(*other) else {
            log.error("Pin @@ is linked to a pin that no longer exists", &[graph.pin_token(pin)]);
            continue;
        };
        if !o.links.contains(&pin) {
            log.error(
                "Link between @@ and @@ is only recorded on one side",
                &[graph.pin_token(pin), graph.pin_token(*other)],
            );
        }
        if o.owner == p.owner {
            log.error("Pin @@ is linked to its own node", &[graph.pin_token(pin)]);
        }
        if o.direction == p.direction {
            log.error(
                "Pins @@ and @@ are linked but have the same direction",
                &[graph.pin_token(pin), graph.pin_token(*other)],
            );
        }
        // each link is checked once, from its output side
        if p.direction == Direction::Output && o.direction == Direction::Input && !schema.are_types_compatible(&p.ty, &o.ty) {
            log.warning(
                &format!(
                    "Can't connect pins @@ and @@: {} is not compatible with {}",
                    p.ty, o.ty
                ),
                &[graph.pin_token(pin), graph.pin_token(*other)],
            );
        }
    }
}

fn validate_pin(graph: &Graph, schema: &Schema, pin: PinId, log: &mut MessageLog) {
    let Some(p) = graph.pin(pin) else {
        return;
    };
    if p.ty.is_wildcard() {
        log.error(
            "The type of @@ is undetermined. Connect something to it to determine the type.",
            &[graph.pin_token(pin)],
        );
    }

    if p.direction == Direction::Input && !p.is_linked() {
        if let Some(problem) = schema.default_value_error(&p.ty, &p.default_value) {
            log.warning(
                &format!("Default value of @@ is invalid: {}", problem),
                &[graph.pin_token(pin)],
            );
        }
    }

    if p.links.len() <= 1 {
        return;
    }
    match p.direction {
        Direction::Output if p.is_exec() => log.error(
            "Exec output @@ has more than one connection",
            &[graph.pin_token(pin)],
        ),
        Direction::Input if !p.is_exec() => {
            let pure_self = p.is_self() && graph.is_pure(p.owner);
            if pure_self {
                log.error(
                    "Self pin @@ of a pure call can only take one target; use a loop to call it on several",
                    &[graph.pin_token(pin)],
                );
            } else {
                log.error("Input @@ has more than one connection", &[graph.pin_token(pin)]);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CallData, EntryData, PinType, PN_EXECUTE, PN_THEN};

    #[test]
    fn test_well_formed_graph_is_clean() {
        let mut graph = Graph::new("F");
        let entry = graph.spawn_node(NodeKind::FunctionEntry(EntryData::default()));
        let result = graph.spawn_node(NodeKind::FunctionResult);
        graph.connect(entry, PN_THEN, result, PN_EXECUTE).unwrap();

        let mut log = MessageLog::new();
        validate_graph(&graph, &Schema::new("BP"), &mut log);
        assert!(log.messages.is_empty());
    }

    #[test]
    fn test_multiple_exec_outputs_and_type_mismatch() {
        let mut graph = Graph::new("F");
        let entry = graph.spawn_node(NodeKind::FunctionEntry(EntryData::default()));
        let a = graph.spawn_node(NodeKind::CallFunction(CallData::self_call("A")));
        let b = graph.spawn_node(NodeKind::CallFunction(CallData::self_call("B")));
        graph.connect(entry, PN_THEN, a, PN_EXECUTE).unwrap();
        graph.connect(entry, PN_THEN, b, PN_EXECUTE).unwrap();
        graph.add_pin(entry, Direction::Output, "Count", PinType::int()).unwrap();
        graph.add_pin(a, Direction::Input, "Name", PinType::string()).unwrap();
        graph.connect(entry, "Count", a, "Name").unwrap();

        let mut log = MessageLog::new();
        validate_graph(&graph, &Schema::new("BP"), &mut log);
        assert_eq!(log.num_errors, 1);
        assert_eq!(log.num_warnings, 1);
    }

    #[test]
    fn test_unconnected_wildcard_pin_is_an_error() {
        let mut graph = Graph::new("F");
        let entry = graph.spawn_node(NodeKind::FunctionEntry(EntryData::default()));
        let print = graph.spawn_node(NodeKind::CallFunction(CallData::self_call("Print")));
        graph.connect(entry, PN_THEN, print, PN_EXECUTE).unwrap();
        graph.add_pin(print, Direction::Input, "Value", PinType::wildcard()).unwrap();

        let mut log = MessageLog::new();
        validate_graph(&graph, &Schema::new("BP"), &mut log);
        assert_eq!(log.num_errors, 1);
        assert!(log.messages[0].text.contains("is undetermined"));
    }

    #[test]
    fn test_unparsable_default_warns() {
        let mut graph = Graph::new("F");
        let entry = graph.spawn_node(NodeKind::FunctionEntry(EntryData::default()));
        let print = graph.spawn_node(NodeKind::CallFunction(CallData::self_call("Print")));
        graph.connect(entry, PN_THEN, print, PN_EXECUTE).unwrap();
        let count = graph.add_pin(print, Direction::Input, "Count", PinType::int()).unwrap();
        graph.pin_mut(count).unwrap().default_value = "twelve".into();

        let mut log = MessageLog::new();
        validate_graph(&graph, &Schema::new("BP"), &mut log);
        assert_eq!(log.num_errors, 0);
        assert_eq!(log.num_warnings, 1);
        assert!(log.messages[0].text.contains("'twelve' is not a valid"));

        graph.pin_mut(count).unwrap().default_value = "12".into();
        let mut log = MessageLog::new();
        validate_graph(&graph, &Schema::new("BP"), &mut log);
        assert!(log.messages.is_empty());
    }

    #[test]
    fn test_unreached_return_node_warns() {
        let mut graph = Graph::new("F");
        graph.spawn_node(NodeKind::FunctionEntry(EntryData::default()));
        graph.spawn_node(NodeKind::FunctionResult);

        let mut log = MessageLog::new();
        validate_graph(&graph, &Schema::new("BP"), &mut log);
        assert_eq!(log.num_warnings, 1);
        assert_eq!(log.num_errors, 0);
    }
}
