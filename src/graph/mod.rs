//! # Graph Model
//!
//! Arena-backed node graph consumed by the compiler.
//!
//! Nodes and pins live in slot vectors addressed by [`NodeId`] and [`PinId`].
//! Links are stored on both pins. Removing a node frees its slots; ids are never
//! reused within a graph, so a stale id simply fails to resolve.
//!
//! Expansion passes that need to add many nodes at once build them in a
//! separate fragment graph and [`Graph::merge_fragment`] it into the host, which
//! assigns fresh ids and returns the remap.

mod node;
mod pin;

pub use node::*;
pub use pin::*;

use crate::error::{CompileError, Result};
use crate::log::{ObjectRef, SourceToken};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Old-to-new id mapping produced by [`Graph::merge_fragment`].
#[derive(Debug, Clone, Default)]
pub struct FragmentRemap {
    pub nodes: HashMap<NodeId, NodeId>,
    pub pins: HashMap<PinId, PinId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    nodes: Vec<Option<Node>>,
    pins: Vec<Option<Pin>>,
    /// Declaration order of live nodes.
    order: Vec<NodeId>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Spawns a node of the given kind together with its fixed pins.
    pub fn spawn_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let default_pins = kind.default_pins();
        self.nodes.push(Some(Node {
            id,
            kind,
            pins: Vec::new(),
            position: Position::default(),
            comment: String::new(),
            intermediate: false,
        }));
        self.order.push(id);

        for (direction, desc) in default_pins {
            let pin = self.alloc_pin(id, direction, desc.name, desc.ty);
            if let Some(pin) = self.pin_mut(pin) {
                pin.default_value = desc.default_value;
            }
        }
        id
    }

    pub fn spawn_node_at(&mut self, kind: NodeKind, x: i32, y: i32) -> NodeId {
        let id = self.spawn_node(kind);
        self.set_position(id, x, y);
        id
    }

    /// Spawns a compiler-generated node.
    pub fn spawn_intermediate_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.spawn_node(kind);
        if let Some(node) = self.node_mut(id) {
            node.intermediate = true;
        }
        id
    }

    pub fn set_position(&mut self, node: NodeId, x: i32, y: i32) {
        if let Some(node) = self.node_mut(node) {
            node.position = Position { x, y };
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn node_checked(&self, id: NodeId) -> Result<&Node> {
        self.node(id)
            .ok_or_else(|| CompileError::NodeNotFound(id, self.name.clone()))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn is_pure(&self, id: NodeId) -> bool {
        self.node(id).map_or(false, Node::is_pure)
    }

    /// Live node ids in declaration order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.order.clone()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().filter_map(move |id| self.node(*id))
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn nodes_where(&self, mut predicate: impl FnMut(&NodeKind) -> bool) -> Vec<NodeId> {
        self.nodes()
            .filter(|node| predicate(&node.kind))
            .map(|node| node.id)
            .collect()
    }

    /// Breaks every link of the node, then frees the node and its pins.
    pub fn remove_node(&mut self, id: NodeId) {
        if !self.contains_node(id) {
            return;
        }
        self.break_all_node_links(id);
        if let Some(node) = self.nodes[id.0 as usize].take() {
            for pin in node.pins {
                if let Some(slot) = self.pins.get_mut(pin.0 as usize) {
                    *slot = None;
                }
            }
        }
        self.order.retain(|n| *n != id);
    }

    /// Reorders live nodes; ids missing from `order` keep their relative order at the end.
    pub fn set_order(&mut self, order: &[NodeId]) {
        let mut new_order: Vec<NodeId> = order
            .iter()
            .copied()
            .filter(|id| self.contains_node(*id))
            .collect();
        for id in &self.order {
            if !new_order.contains(id) {
                new_order.push(*id);
            }
        }
        self.order = new_order;
    }

    fn alloc_pin(&mut self, owner: NodeId, direction: Direction, name: String, ty: PinType) -> PinId {
        let id = PinId(self.pins.len() as u32);
        self.pins.push(Some(Pin {
            id,
            owner,
            name,
            direction,
            ty,
            default_value: String::new(),
            default_object: None,
            links: Vec::new(),
        }));
        if let Some(node) = self.node_mut(owner) {
            node.pins.push(id);
        }
        id
    }

    pub fn add_pin(
        &mut self,
        node: NodeId,
        direction: Direction,
        name: impl Into<String>,
        ty: PinType,
    ) -> Result<PinId> {
        self.node_checked(node)?;
        Ok(self.alloc_pin(node, direction, name.into(), ty))
    }

    /// Breaks the pin's links and detaches it from its node.
    pub fn remove_pin(&mut self, id: PinId) {
        let Some(owner) = self.owner_of(id) else {
            return;
        };
        self.break_pin_links(id);
        if let Some(node) = self.node_mut(owner) {
            node.pins.retain(|p| *p != id);
        }
        if let Some(slot) = self.pins.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn pin_checked(&self, id: PinId) -> Result<&Pin> {
        self.pin(id)
            .ok_or_else(|| CompileError::PinNotFound(id, self.name.clone()))
    }

    pub fn pins_of(&self, node: NodeId) -> Vec<PinId> {
        self.node(node).map(|n| n.pins.clone()).unwrap_or_default()
    }

    /// Finds a pin by name, optionally restricted to one direction.
    pub fn find_pin(&self, node: NodeId, name: &str, direction: Option<Direction>) -> Option<PinId> {
        let node = self.node(node)?;
        node.pins.iter().copied().find(|id| {
            self.pin(*id).map_or(false, |pin| {
                pin.name == name && direction.map_or(true, |d| d == pin.direction)
            })
        })
    }

    pub fn find_pin_checked(&self, node: NodeId, name: &str, direction: Option<Direction>) -> Result<PinId> {
        self.find_pin(node, name, direction)
            .ok_or_else(|| CompileError::NamedPinNotFound {
                node,
                pin: name.to_string(),
            })
    }

    pub fn owner_of(&self, pin: PinId) -> Option<NodeId> {
        self.pin(pin).map(|p| p.owner)
    }

    pub fn links_of(&self, pin: PinId) -> Vec<PinId> {
        self.pin(pin).map(|p| p.links.clone()).unwrap_or_default()
    }

    /// Nodes on the far side of every link of `pin`.
    pub fn linked_nodes(&self, pin: PinId) -> Vec<NodeId> {
        self.links_of(pin)
            .into_iter()
            .filter_map(|p| self.owner_of(p))
            .collect()
    }

    /// Pins of `node` matching the direction and exec-ness filters.
    pub fn filtered_pins(&self, node: NodeId, direction: Direction, exec: bool) -> Vec<PinId> {
        self.pins_of(node)
            .into_iter()
            .filter(|id| {
                self.pin(*id)
                    .map_or(false, |p| p.direction == direction && p.is_exec() == exec)
            })
            .collect()
    }

    /// Links an output pin to an input pin (in either argument order).
    pub fn make_link(&mut self, a: PinId, b: PinId) -> Result<()> {
        let pa = self.pin_checked(a)?;
        let pb = self.pin_checked(b)?;
        if pa.direction == pb.direction {
            return Err(CompileError::InvalidLink(format!(
                "pins '{}' and '{}' have the same direction",
                pa.name, pb.name
            )));
        }
        if pa.owner == pb.owner {
            return Err(CompileError::InvalidLink(format!(
                "pins '{}' and '{}' belong to the same node",
                pa.name, pb.name
            )));
        }
        if pa.links.contains(&b) {
            return Ok(());
        }
        if let Some(pin) = self.pin_mut(a) {
            pin.links.push(b);
        }
        if let Some(pin) = self.pin_mut(b) {
            pin.links.push(a);
        }
        Ok(())
    }

    /// Links the named output pin of one node to the named input pin of another.
    pub fn connect(&mut self, from: NodeId, output: &str, to: NodeId, input: &str) -> Result<()> {
        let a = self.find_pin_checked(from, output, Some(Direction::Output))?;
        let b = self.find_pin_checked(to, input, Some(Direction::Input))?;
        self.make_link(a, b)
    }

    pub fn break_link(&mut self, a: PinId, b: PinId) {
        if let Some(pin) = self.pin_mut(a) {
            pin.links.retain(|p| *p != b);
        }
        if let Some(pin) = self.pin_mut(b) {
            pin.links.retain(|p| *p != a);
        }
    }

    pub fn break_pin_links(&mut self, pin: PinId) {
        for other in self.links_of(pin) {
            self.break_link(pin, other);
        }
    }

    pub fn break_all_node_links(&mut self, node: NodeId) {
        for pin in self.pins_of(node) {
            self.break_pin_links(pin);
        }
    }

    /// Moves every link (and the literal default) from one pin to another.
    pub fn move_pin_links(&mut self, from: PinId, to: PinId) -> Result<()> {
        self.copy_pin_links(from, to)?;
        self.break_pin_links(from);
        Ok(())
    }

    /// Duplicates the links (and literal default) of one pin onto another.
    pub fn copy_pin_links(&mut self, from: PinId, to: PinId) -> Result<()> {
        let source = self.pin_checked(from)?.clone();
        self.pin_checked(to)?;
        for other in &source.links {
            self.make_link(to, *other)?;
        }
        if let Some(pin) = self.pin_mut(to) {
            if pin.direction == Direction::Input {
                pin.default_value = source.default_value;
                pin.default_object = source.default_object;
            }
        }
        Ok(())
    }

    /// Copies this graph into a standalone fragment for later merging.
    pub fn clone_into_fragment(&self, name: impl Into<String>) -> Graph {
        let mut fragment = self.clone();
        fragment.name = name.into();
        fragment
    }

    /// Adds every node of `fragment` to this graph under fresh ids.
    ///
    /// The new nodes and pins are staged completely before any of them
    /// becomes part of `self`.
    pub fn merge_fragment(&mut self, fragment: &Graph) -> FragmentRemap {
        let mut remap = FragmentRemap::default();
        let mut next_node = self.nodes.len() as u32;
        let mut next_pin = self.pins.len() as u32;

        for node in fragment.nodes() {
            remap.nodes.insert(node.id, NodeId(next_node));
            next_node += 1;
            for pin in &node.pins {
                remap.pins.insert(*pin, PinId(next_pin));
                next_pin += 1;
            }
        }

        let mut staged_nodes = Vec::with_capacity(remap.nodes.len());
        let mut staged_pins = Vec::with_capacity(remap.pins.len());
        for node in fragment.nodes() {
            let mut copy = node.clone();
            copy.id = remap.nodes[&node.id];
            copy.pins = node.pins.iter().map(|p| remap.pins[p]).collect();
            for pin in &node.pins {
                if let Some(source) = fragment.pin(*pin) {
                    let mut pin_copy = source.clone();
                    pin_copy.id = remap.pins[pin];
                    pin_copy.owner = copy.id;
                    pin_copy.links = source
                        .links
                        .iter()
                        .filter_map(|l| remap.pins.get(l).copied())
                        .collect();
                    staged_pins.push(Some(pin_copy));
                }
            }
            staged_nodes.push(Some(copy));
        }

        self.order
            .extend(staged_nodes.iter().flatten().map(|n: &Node| n.id));
        self.nodes.extend(staged_nodes);
        self.pins.extend(staged_pins);
        remap
    }

    /// Offsets the diagnostic positions of the given nodes.
    pub fn offset_nodes(&mut self, nodes: &[NodeId], dx: i32, dy: i32) {
        for id in nodes {
            if let Some(node) = self.node_mut(*id) {
                node.position.x += dx;
                node.position.y += dy;
            }
        }
    }

    pub fn node_ref(&self, node: NodeId) -> ObjectRef {
        ObjectRef::Node {
            graph: self.name.clone(),
            node,
        }
    }

    pub fn pin_ref(&self, pin: PinId) -> ObjectRef {
        ObjectRef::Pin {
            graph: self.name.clone(),
            node: self.owner_of(pin).unwrap_or(NodeId(u32::MAX)),
            pin,
        }
    }

    pub fn node_token(&self, node: NodeId) -> SourceToken {
        let label = self
            .node(node)
            .map(Node::title)
            .unwrap_or_else(|| node.to_string());
        SourceToken::new(self.node_ref(node), label)
    }

    pub fn pin_token(&self, pin: PinId) -> SourceToken {
        let label = match self.pin(pin) {
            Some(p) => {
                let owner = self.node(p.owner).map(Node::title).unwrap_or_default();
                format!("{} ({})", p.name, owner)
            }
            None => pin.to_string(),
        };
        SourceToken::new(self.pin_ref(pin), label)
    }

    pub fn graph_token(&self) -> SourceToken {
        SourceToken::new(ObjectRef::Graph(self.name.clone()), self.name.clone())
    }
}
