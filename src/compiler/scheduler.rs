//! # Execution Scheduler
//!
//! Prunes nodes that can never run and orders the survivors.
//!
//! Pruning keeps everything reachable from the root set along exec links,
//! plus any pure node still feeding a kept node. Scheduling then orders the
//! kept nodes so each one comes after every node it reads data from; ties go
//! to graph declaration order. Exec links do not constrain the schedule, so
//! exec loops are legal. A data dependency cycle can never be scheduled and
//! is reported.
//!
//! Both passes run over a `petgraph` view of the node graph whose vertices
//! are added in declaration order, so `NodeIndex` order is declaration order.

use crate::graph::{Graph, NodeId, NodeKind};
use crate::log::MessageLog;
use crate::schema::Schema;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::Dfs;
use petgraph::Direction::{Incoming, Outgoing};
use petgraph::{Directed, EdgeType, Undirected};
use std::collections::{BTreeSet, HashMap, HashSet};

/// One vertex per graph node, with an edge for each `(node, target)` pair.
struct NodeView<Ty: EdgeType> {
    graph: petgraph::Graph<NodeId, (), Ty>,
    indices: HashMap<NodeId, NodeIndex>,
}

impl<Ty: EdgeType> NodeView<Ty> {
    fn build(graph: &Graph, mut targets_of: impl FnMut(NodeId) -> Vec<NodeId>) -> Self {
        let mut view = petgraph::Graph::<NodeId, (), Ty>::default();
        let mut indices = HashMap::with_capacity(graph.node_count());
        for node in graph.node_ids() {
            indices.insert(node, view.add_node(node));
        }
        for node in graph.node_ids() {
            let Some(from) = indices.get(&node).copied() else {
                continue;
            };
            for target in targets_of(node) {
                if let Some(to) = indices.get(&target).copied() {
                    view.update_edge(from, to, ());
                }
            }
        }
        Self { graph: view, indices }
    }

    /// Every node a walk from `starts` can reach, the starts included.
    fn reachable_from(&self, starts: impl IntoIterator<Item = NodeId>) -> HashSet<NodeId> {
        let mut reached = HashSet::new();
        let mut dfs = Dfs::empty(&self.graph);
        for start in starts {
            let Some(index) = self.indices.get(&start) else {
                continue;
            };
            dfs.move_to(*index);
            while let Some(next) = dfs.next(&self.graph) {
                reached.insert(self.graph[next]);
            }
        }
        reached
    }
}

/// Removes every node that is unreachable from `roots`. Returns the removed ids.
pub fn prune_isolated_nodes(graph: &mut Graph, roots: &[NodeId], schema: &Schema, keep_comments: bool) -> Vec<NodeId> {
    let exec = NodeView::<Directed>::build(graph, |node| schema.exec_successors(graph, node));
    let reachable = exec.reachable_from(roots.iter().copied());

    let mut removed = Vec::new();
    for node in graph.node_ids() {
        if reachable.contains(&node) || graph.is_pure(node) {
            continue;
        }
        tracing::trace!("[PBCC] Pruning unreachable node {} from '{}'", node, graph.name);
        graph.remove_node(node);
        removed.push(node);
    }

    // pure nodes survive only while linked to something that runs
    let links = NodeView::<Undirected>::build(graph, |node| {
        graph
            .pins_of(node)
            .into_iter()
            .flat_map(|pin| graph.linked_nodes(pin))
            .collect()
    });
    let connected = links.reachable_from(reachable);
    for node in graph.node_ids() {
        if connected.contains(&node) {
            continue;
        }
        if keep_comments && matches!(graph.kind(node), Some(NodeKind::Comment { .. })) {
            continue;
        }
        graph.remove_node(node);
        removed.push(node);
    }

    if !removed.is_empty() {
        tracing::debug!("[PBCC] Pruned {} node(s) from '{}'", removed.len(), graph.name);
    }
    removed
}

/// Orders the graph's nodes so data producers precede their consumers.
pub fn create_execution_schedule(graph: &Graph, schema: &Schema, log: &mut MessageLog) -> Vec<NodeId> {
    // edges point from a consumer to each node it reads from
    let dependencies = NodeView::<Directed>::build(graph, |node| schema.data_dependencies(graph, node));
    let view = &dependencies.graph;

    let mut pending: Vec<usize> = view
        .node_indices()
        .map(|index| view.neighbors_directed(index, Outgoing).count())
        .collect();
    let mut ready: BTreeSet<NodeIndex> = view
        .node_indices()
        .filter(|index| pending[index.index()] == 0)
        .collect();
    let mut schedule = Vec::with_capacity(view.node_count());
    while let Some(index) = ready.pop_first() {
        schedule.push(view[index]);
        for consumer in view.neighbors_directed(index, Incoming) {
            let count = &mut pending[consumer.index()];
            *count -= 1;
            if *count == 0 {
                ready.insert(consumer);
            }
        }
    }

    if schedule.len() < view.node_count() {
        let scheduled: HashSet<NodeId> = schedule.iter().copied().collect();
        let in_cycle: HashSet<NodeIndex> = tarjan_scc(view)
            .into_iter()
            .filter(|component| component.len() > 1)
            .flatten()
            .collect();
        for index in view.node_indices() {
            let node = view[index];
            if scheduled.contains(&node) {
                continue;
            }
            if in_cycle.contains(&index) {
                log.error(
                    "Dependency cycle detected, preventing node @@ from being scheduled",
                    &[graph.node_token(node)],
                );
            } else {
                log.error(
                    "Node @@ reads from a dependency cycle and cannot be scheduled",
                    &[graph.node_token(node)],
                );
            }
        }
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        CallData, Direction, EntryData, PinType, VariableReference, PN_EXECUTE, PN_THEN,
    };

    fn entry(graph: &mut Graph) -> NodeId {
        graph.spawn_node(NodeKind::FunctionEntry(EntryData::default()))
    }

    fn call(graph: &mut Graph, name: &str) -> NodeId {
        graph.spawn_node(NodeKind::CallFunction(CallData::self_call(name)))
    }

    #[test]
    fn test_isolated_impure_node_is_pruned() {
        let mut graph = Graph::new("F");
        let e = entry(&mut graph);
        let a = call(&mut graph, "A");
        let isolated = call(&mut graph, "Isolated");
        graph.connect(e, PN_THEN, a, PN_EXECUTE).unwrap();

        let removed = prune_isolated_nodes(&mut graph, &[e], &Schema::new("BP"), false);
        assert_eq!(removed, vec![isolated]);
        assert_eq!(graph.node_ids(), vec![e, a]);
    }

    #[test]
    fn test_pure_nodes_survive_only_while_used() {
        let mut graph = Graph::new("F");
        let e = entry(&mut graph);
        let a = call(&mut graph, "A");
        graph.add_pin(a, Direction::Input, "Value", PinType::int()).unwrap();
        let used = graph.spawn_node(NodeKind::VariableGet(VariableReference::self_member("X", PinType::int())));
        let unused = graph.spawn_node(NodeKind::VariableGet(VariableReference::self_member("Y", PinType::int())));
        let comment = graph.spawn_node(NodeKind::Comment { text: "note".into() });
        graph.connect(e, PN_THEN, a, PN_EXECUTE).unwrap();
        graph.connect(used, "X", a, "Value").unwrap();

        let mut kept = graph.clone();
        prune_isolated_nodes(&mut graph, &[e], &Schema::new("BP"), false);
        assert!(graph.contains_node(used));
        assert!(!graph.contains_node(unused));
        assert!(!graph.contains_node(comment));

        prune_isolated_nodes(&mut kept, &[e], &Schema::new("BP"), true);
        assert!(kept.contains_node(comment));
    }

    #[test]
    fn test_schedule_puts_producers_first() {
        let mut graph = Graph::new("F");
        let e = entry(&mut graph);
        let a = call(&mut graph, "A");
        graph.add_pin(a, Direction::Input, "Value", PinType::int()).unwrap();
        let getter = graph.spawn_node(NodeKind::VariableGet(VariableReference::self_member("X", PinType::int())));
        graph.connect(e, PN_THEN, a, PN_EXECUTE).unwrap();
        graph.connect(getter, "X", a, "Value").unwrap();

        let mut log = MessageLog::new();
        let schedule = create_execution_schedule(&graph, &Schema::new("BP"), &mut log);
        assert_eq!(schedule, vec![e, getter, a]);
        assert_eq!(log.num_errors, 0);
    }

    #[test]
    fn test_exec_loops_are_schedulable() {
        let mut graph = Graph::new("F");
        let e = entry(&mut graph);
        let a = call(&mut graph, "A");
        let b = call(&mut graph, "B");
        graph.connect(e, PN_THEN, a, PN_EXECUTE).unwrap();
        graph.connect(a, PN_THEN, b, PN_EXECUTE).unwrap();
        graph.connect(b, PN_THEN, a, PN_EXECUTE).unwrap();

        let mut log = MessageLog::new();
        let schedule = create_execution_schedule(&graph, &Schema::new("BP"), &mut log);
        assert_eq!(schedule, vec![e, a, b]);
        assert_eq!(log.num_errors, 0);
    }

    #[test]
    fn test_data_cycle_is_reported() {
        let mut graph = Graph::new("F");
        let a = graph.spawn_node(NodeKind::CallFunction(CallData::library("Add", "Math", true)));
        let b = graph.spawn_node(NodeKind::CallFunction(CallData::library("Add", "Math", true)));
        for node in [a, b] {
            graph.add_pin(node, Direction::Input, "In", PinType::int()).unwrap();
            graph.add_pin(node, Direction::Output, "ReturnValue", PinType::int()).unwrap();
        }
        graph.connect(a, "ReturnValue", b, "In").unwrap();
        graph.connect(b, "ReturnValue", a, "In").unwrap();

        let mut log = MessageLog::new();
        let schedule = create_execution_schedule(&graph, &Schema::new("BP"), &mut log);
        assert!(schedule.is_empty());
        assert_eq!(log.num_errors, 2);
        assert!(log.messages[0].text.starts_with("Dependency cycle detected"));
    }

    #[test]
    fn test_consumer_of_a_cycle_is_reported_separately() {
        let mut graph = Graph::new("F");
        let e = entry(&mut graph);
        let a = graph.spawn_node(NodeKind::CallFunction(CallData::library("Add", "Math", true)));
        let b = graph.spawn_node(NodeKind::CallFunction(CallData::library("Add", "Math", true)));
        for node in [a, b] {
            graph.add_pin(node, Direction::Input, "In", PinType::int()).unwrap();
            graph.add_pin(node, Direction::Output, "ReturnValue", PinType::int()).unwrap();
        }
        let print = call(&mut graph, "Print");
        graph.add_pin(print, Direction::Input, "Value", PinType::int()).unwrap();
        graph.connect(e, PN_THEN, print, PN_EXECUTE).unwrap();
        graph.connect(a, "ReturnValue", b, "In").unwrap();
        graph.connect(b, "ReturnValue", a, "In").unwrap();
        graph.connect(b, "ReturnValue", print, "Value").unwrap();

        let mut log = MessageLog::new();
        let schedule = create_execution_schedule(&graph, &Schema::new("BP"), &mut log);
        assert_eq!(schedule, vec![e]);
        assert_eq!(log.num_errors, 3);
        assert!(log.messages[0].text.starts_with("Dependency cycle detected"));
        assert!(log.messages[1].text.starts_with("Dependency cycle detected"));
        assert!(log.messages[2].text.contains("reads from a dependency cycle"));
    }

    #[test]
    fn test_pruning_walks_through_exec_loops() {
        let mut graph = Graph::new("F");
        let e = entry(&mut graph);
        let a = call(&mut graph, "A");
        let b = call(&mut graph, "B");
        let c = call(&mut graph, "C");
        graph.connect(e, PN_THEN, a, PN_EXECUTE).unwrap();
        graph.connect(a, PN_THEN, b, PN_EXECUTE).unwrap();
        graph.connect(b, PN_THEN, a, PN_EXECUTE).unwrap();
        // c loops back into the reachable part but nothing reaches c
        graph.connect(c, PN_THEN, a, PN_EXECUTE).unwrap();

        let removed = prune_isolated_nodes(&mut graph, &[e], &Schema::new("BP"), false);
        assert_eq!(removed, vec![c]);
        assert_eq!(graph.node_ids(), vec![e, a, b]);
    }
}
