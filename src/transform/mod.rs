//! # Graph Transformer
//!
//! Rewrites high-level constructs into primitive nodes before scheduling:
//!
//! - **Macros and tunnels** ([`macros`]) - every macro instance is replaced by a
//!   clone of its macro body, and the body's tunnel boundary nodes are
//!   collapsed into direct links.
//! - **Timelines** ([`timeline`]) - control inputs become method calls on the
//!   timeline component and track outputs become internal events.
//! - **Ubergraph** ([`ubergraph`]) - event graph pages are merged into one
//!   consolidated graph, and each event gets a stub function that calls into it.
//!
//! All passes are no-ops on a graph that has already been expanded.

pub mod macros;
pub mod timeline;
pub mod ubergraph;

pub use macros::expand_tunnels_and_macros;
pub use timeline::expand_timeline_nodes;
pub use ubergraph::{build_event_stub, merge_ubergraph_pages, spawn_missing_interface_events, EventStub};

use crate::graph::{Graph, NodeId, NodeKind};
use crate::log::MessageLog;

pub const MINIMUM_SPAWN_X: i32 = -2000;
pub const MAXIMUM_SPAWN_X: i32 = 2000;
pub const AVERAGE_NODE_WIDTH: i32 = 200;
pub const AVERAGE_NODE_HEIGHT: i32 = 150;
pub const HORIZONTAL_SECTION_PADDING: i32 = 250;
pub const VERTICAL_SECTION_PADDING: i32 = 250;
pub const HORIZONTAL_NODE_PADDING: i32 = 40;
pub const COMMENT_BOX_PADDING: i32 = 60;

/// Lays expanded sections out left to right, wrapping into rows, so retained
/// intermediate graphs stay readable.
#[derive(Debug, Clone, Copy)]
pub struct SpawnGrid {
    x: i32,
    y: i32,
    row_height: i32,
}

impl Default for SpawnGrid {
    fn default() -> Self {
        Self {
            x: MINIMUM_SPAWN_X,
            y: -2000,
            row_height: 0,
        }
    }
}

impl SpawnGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `nodes` into the next free cell and wraps them in a comment box.
    pub fn place_section(&mut self, graph: &mut Graph, nodes: &[NodeId], label: &str) -> Option<NodeId> {
        let positions: Vec<_> = nodes
            .iter()
            .filter_map(|id| graph.node(*id).map(|n| n.position))
            .collect();
        if positions.is_empty() {
            return None;
        }
        let min_x = positions.iter().map(|p| p.x).min().unwrap_or(0);
        let max_x = positions.iter().map(|p| p.x).max().unwrap_or(0);
        let min_y = positions.iter().map(|p| p.y).min().unwrap_or(0);
        let max_y = positions.iter().map(|p| p.y).max().unwrap_or(0);
        let width = max_x - min_x + AVERAGE_NODE_WIDTH;
        let height = max_y - min_y + AVERAGE_NODE_HEIGHT;

        if self.x + width > MAXIMUM_SPAWN_X && self.x != MINIMUM_SPAWN_X {
            self.x = MINIMUM_SPAWN_X;
            self.y += self.row_height + VERTICAL_SECTION_PADDING;
            self.row_height = 0;
        }

        graph.offset_nodes(nodes, self.x - min_x, self.y - min_y);
        let comment = graph.spawn_intermediate_node(NodeKind::Comment {
            text: label.to_string(),
        });
        graph.set_position(comment, self.x - COMMENT_BOX_PADDING, self.y - COMMENT_BOX_PADDING);

        self.x += width + HORIZONTAL_SECTION_PADDING + HORIZONTAL_NODE_PADDING;
        self.row_height = self.row_height.max(height);
        Some(comment)
    }
}

/// Records that every node in `nodes` (by new id) came from `source` (by old id).
pub(crate) fn notify_remapped_nodes(
    log: &mut MessageLog,
    host: &Graph,
    source: &Graph,
    remap: &crate::graph::FragmentRemap,
) {
    for (old, new) in &remap.nodes {
        log.notify_intermediate_object_creation(host.node_ref(*new), source.node_ref(*old));
    }
    for (old, new) in &remap.pins {
        log.notify_intermediate_object_creation(host.pin_ref(*new), source.pin_ref(*old));
    }
}
