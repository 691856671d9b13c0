//! Timeline node expansion.
//!
//! A timeline node keeps its data outputs (they read the timeline's member
//! properties) but loses its exec pins: each wired control input becomes a
//! method call on the timeline component and each exec output becomes an
//! internal event the component fires at runtime.

use crate::blueprint::TimelineTemplate;
use crate::graph::{
    CallData, Direction, EventData, Graph, NodeId, NodeKind, PinType, VariableReference, PN_EXECUTE,
    PN_FINISHED, PN_NEW_TIME, PN_SELF, PN_THEN, PN_UPDATE, TIMELINE_CONTROL_PINS,
};
use crate::log::MessageLog;

pub const TIMELINE_COMPONENT_CLASS: &str = "TimelineComponent";
const SET_NEW_TIME: &str = "SetNewTime";

/// Expands every timeline node of an event graph. Returns `false` if a
/// timeline has no template.
pub fn expand_timeline_nodes(graph: &mut Graph, timelines: &[TimelineTemplate], log: &mut MessageLog) -> bool {
    let mut ok = true;
    for node in graph.nodes_where(|kind| matches!(kind, NodeKind::Timeline { .. })) {
        let Some(NodeKind::Timeline { timeline }) = graph.kind(node).cloned() else {
            continue;
        };
        let Some(template) = timelines.iter().find(|t| t.name == timeline) else {
            log.error(
                &format!("Timeline node @@ references a missing timeline template '{}'", timeline),
                &[graph.node_token(node)],
            );
            ok = false;
            continue;
        };
        tracing::debug!("[PBCC] Expanding timeline '{}' in '{}'", template.name, graph.name);
        expand_control_pins(graph, node, template, log);
        expand_track_events(graph, node, template, log);
    }
    ok
}

fn expand_control_pins(graph: &mut Graph, node: NodeId, template: &TimelineTemplate, log: &mut MessageLog) {
    let source = graph.node_ref(node);
    let position = graph.node(node).map(|n| n.position).unwrap_or_default();
    let mut getter: Option<NodeId> = None;

    for (index, control) in TIMELINE_CONTROL_PINS.iter().enumerate() {
        let Some(control_pin) = graph.find_pin(node, control, Some(Direction::Input)) else {
            continue;
        };
        if graph.links_of(control_pin).is_empty() {
            continue;
        }

        let component = *getter.get_or_insert_with(|| {
            let id = graph.spawn_intermediate_node(NodeKind::VariableGet(VariableReference::self_member(
                template.name.clone(),
                PinType::object(TIMELINE_COMPONENT_CLASS),
            )));
            graph.set_position(id, position.x - super::AVERAGE_NODE_WIDTH, position.y);
            id
        });
        log.notify_intermediate_object_creation(graph.node_ref(component), source.clone());

        let call = graph.spawn_intermediate_node(NodeKind::CallFunction(CallData::external(
            *control,
            TIMELINE_COMPONENT_CLASS,
            false,
        )));
        graph.set_position(
            call,
            position.x,
            position.y + (index as i32 + 1) * super::AVERAGE_NODE_HEIGHT,
        );
        log.notify_intermediate_object_creation(graph.node_ref(call), source.clone());

        let wired = graph
            .connect(component, &template.name, call, PN_SELF)
            .and_then(|_| graph.find_pin_checked(call, PN_EXECUTE, Some(Direction::Input)))
            .and_then(|execute| graph.move_pin_links(control_pin, execute));
        let wired = match (wired, *control == SET_NEW_TIME) {
            (Ok(()), true) => graph
                .add_pin(call, Direction::Input, PN_NEW_TIME, PinType::float())
                .and_then(|new_time| match graph.find_pin(node, PN_NEW_TIME, Some(Direction::Input)) {
                    Some(source_pin) => graph.move_pin_links(source_pin, new_time),
                    None => Ok(()),
                }),
            (result, _) => result,
        };
        if let Err(err) = wired {
            log.error(
                &format!("Failed to expand timeline control '{}' on @@: {}", control, err),
                &[graph.node_token(node)],
            );
        }
    }
}

fn expand_track_events(graph: &mut Graph, node: NodeId, template: &TimelineTemplate, log: &mut MessageLog) {
    let source = graph.node_ref(node);
    let position = graph.node(node).map(|n| n.position).unwrap_or_default();

    let mut tracks: Vec<(String, String)> = template
        .event_tracks
        .iter()
        .map(|track| (track.clone(), template.event_function_name(track)))
        .collect();
    tracks.push((PN_UPDATE.to_string(), template.update_function_name()));
    tracks.push((PN_FINISHED.to_string(), template.finished_function_name()));

    for (row, (pin_name, function)) in tracks.into_iter().enumerate() {
        let existing = graph.nodes_where(|kind| matches!(kind, NodeKind::Event(e) if e.function == function));
        let event = match existing.first() {
            Some(event) => *event,
            None => {
                let event = graph.spawn_intermediate_node(NodeKind::Event(EventData {
                    function,
                    internal: true,
                    ..Default::default()
                }));
                graph.set_position(
                    event,
                    position.x + super::AVERAGE_NODE_WIDTH,
                    position.y + row as i32 * super::AVERAGE_NODE_HEIGHT,
                );
                log.notify_intermediate_object_creation(graph.node_ref(event), source.clone());
                event
            }
        };

        let Some(track_pin) = graph.find_pin(node, &pin_name, Some(Direction::Output)) else {
            continue;
        };
        let Some(then) = graph.find_pin(event, PN_THEN, Some(Direction::Output)) else {
            continue;
        };
        if let Err(err) = graph.move_pin_links(track_pin, then) {
            log.error(
                &format!("Failed to route timeline track '{}' of @@: {}", pin_name, err),
                &[graph.node_token(node)],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline_graph() -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new("EventGraph");
        let begin = graph.spawn_node(NodeKind::Event(EventData::custom("Begin")));
        let timeline = graph.spawn_node(NodeKind::Timeline {
            timeline: "Fade".into(),
        });
        graph.add_pin(timeline, Direction::Output, "Hit", PinType::exec()).unwrap();
        let on_update = graph.spawn_node(NodeKind::CallFunction(CallData::self_call("OnUpdate")));
        graph.connect(begin, PN_THEN, timeline, "Play").unwrap();
        graph.connect(timeline, PN_UPDATE, on_update, PN_EXECUTE).unwrap();
        (graph, begin, timeline, on_update)
    }

    fn template() -> TimelineTemplate {
        let mut template = TimelineTemplate::new("Fade");
        template.event_tracks.push("Hit".into());
        template.float_tracks.push("Alpha".into());
        template
    }

    #[test]
    fn test_control_pins_become_component_calls() {
        let (mut graph, begin, timeline, _) = timeline_graph();
        let mut log = MessageLog::new();
        assert!(expand_timeline_nodes(&mut graph, &[template()], &mut log));

        let begin_then = graph.find_pin(begin, PN_THEN, None).unwrap();
        let play = graph.linked_nodes(begin_then)[0];
        assert!(matches!(
            graph.kind(play),
            Some(NodeKind::CallFunction(c)) if c.function == "Play" && c.owner.as_deref() == Some(TIMELINE_COMPONENT_CLASS)
        ));
        let self_pin = graph.find_pin(play, PN_SELF, None).unwrap();
        let getter = graph.linked_nodes(self_pin)[0];
        assert!(matches!(graph.kind(getter), Some(NodeKind::VariableGet(v)) if v.name == "Fade"));

        // unwired controls produce nothing
        let calls = graph.nodes_where(|k| matches!(k, NodeKind::CallFunction(c) if c.owner.is_some()));
        assert_eq!(calls.len(), 1);
        assert!(graph
            .pins_of(timeline)
            .iter()
            .all(|p| !graph.pin(*p).unwrap().is_exec() || !graph.pin(*p).unwrap().is_linked()));
    }

    #[test]
    fn test_tracks_become_internal_events() {
        let (mut graph, _, _, on_update) = timeline_graph();
        let mut log = MessageLog::new();
        expand_timeline_nodes(&mut graph, &[template()], &mut log);

        let events: Vec<String> = graph
            .nodes()
            .filter_map(|n| match &n.kind {
                NodeKind::Event(e) if e.internal => Some(e.function.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(events, vec!["Fade__Hit__EventFunc", "Fade__UpdateFunc", "Fade__FinishedFunc"]);

        let update = graph.nodes_where(|k| matches!(k, NodeKind::Event(e) if e.function == "Fade__UpdateFunc"))[0];
        let then = graph.find_pin(update, PN_THEN, None).unwrap();
        assert_eq!(graph.linked_nodes(then), vec![on_update]);

        // running again adds nothing
        let count = graph.node_count();
        expand_timeline_nodes(&mut graph, &[template()], &mut log);
        assert_eq!(graph.node_count(), count);
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let (mut graph, ..) = timeline_graph();
        let mut log = MessageLog::new();
        assert!(!expand_timeline_nodes(&mut graph, &[], &mut log));
        assert_eq!(log.num_errors, 1);
    }
}
