//! # Blueprint
//!
//! The source aggregate handed to the compiler: declared variables, timelines,
//! the construction script tree and the graphs that make up the program.

use crate::class::{Class, PropertyFlags};
use crate::error::Result;
use crate::graph::{Graph, NodeKind, PinType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlueprintType {
    #[default]
    Normal,
    Const,
    MacroLibrary,
    Interface,
    LevelScript,
    FunctionLibrary,
}

impl BlueprintType {
    pub fn supports_event_graphs(self) -> bool {
        matches!(self, BlueprintType::Normal | BlueprintType::LevelScript)
    }
}

/// A member variable declared by the Blueprint author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescription {
    pub name: String,
    pub ty: PinType,
    #[serde(default)]
    pub flags: PropertyFlags,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub rep_notify_func: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl VariableDescription {
    pub fn new(name: impl Into<String>, ty: PinType) -> Self {
        Self {
            name: name.into(),
            ty,
            flags: PropertyFlags::BLUEPRINT_VISIBLE | PropertyFlags::EDIT,
            category: String::new(),
            default_value: String::new(),
            rep_notify_func: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineTemplate {
    pub name: String,
    #[serde(default)]
    pub length: f32,
    #[serde(default)]
    pub auto_play: bool,
    #[serde(default)]
    pub looping: bool,
    #[serde(default)]
    pub replicated: bool,
    #[serde(default)]
    pub event_tracks: Vec<String>,
    #[serde(default)]
    pub float_tracks: Vec<String>,
    #[serde(default)]
    pub vector_tracks: Vec<String>,
    #[serde(default)]
    pub linear_color_tracks: Vec<String>,
}

impl TimelineTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: 5.0,
            ..Default::default()
        }
    }

    pub fn direction_property_name(&self) -> String {
        format!("{}__Direction", self.name)
    }

    pub fn track_property_name(&self, track: &str) -> String {
        format!("{}_{}", self.name, track)
    }

    pub fn event_function_name(&self, track: &str) -> String {
        format!("{}__{}__EventFunc", self.name, track)
    }

    pub fn update_function_name(&self) -> String {
        format!("{}__UpdateFunc", self.name)
    }

    pub fn finished_function_name(&self) -> String {
        format!("{}__FinishedFunc", self.name)
    }

    /// Data tracks with the pin type of their value.
    pub fn data_tracks(&self) -> Vec<(String, PinType)> {
        let floats = self.float_tracks.iter().map(|t| (t.clone(), PinType::float()));
        let vectors = self
            .vector_tracks
            .iter()
            .map(|t| (t.clone(), PinType::structure("Vector")));
        let colors = self
            .linear_color_tracks
            .iter()
            .map(|t| (t.clone(), PinType::structure("LinearColor")));
        floats.chain(vectors).chain(colors).collect()
    }
}

/// A component created by the construction script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScsNode {
    pub variable_name: String,
    pub component_class: String,
    #[serde(default)]
    pub children: Vec<ScsNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleConstructionScript {
    pub root_nodes: Vec<ScsNode>,
}

impl SimpleConstructionScript {
    /// Every node in depth-first order.
    pub fn all_nodes(&self) -> Vec<&ScsNode> {
        fn visit<'a>(node: &'a ScsNode, out: &mut Vec<&'a ScsNode>) {
            out.push(node);
            for child in &node.children {
                visit(child, out);
            }
        }
        let mut out = Vec::new();
        for root in &self.root_nodes {
            visit(root, &mut out);
        }
        out
    }

    /// Visits every node mutably in depth-first order.
    pub fn for_each_node_mut(&mut self, mut f: impl FnMut(&mut ScsNode)) {
        fn visit(node: &mut ScsNode, f: &mut dyn FnMut(&mut ScsNode)) {
            f(node);
            for child in &mut node.children {
                visit(child, f);
            }
        }
        for root in &mut self.root_nodes {
            visit(root, &mut f);
        }
    }
}

/// A component template attached to the generated class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentTemplate {
    pub name: String,
    pub component_class: String,
}

/// An interface implemented by the Blueprint, with its override graphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementedInterface {
    pub interface: Arc<Class>,
    #[serde(default)]
    pub graphs: Vec<Graph>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    #[serde(default)]
    pub blueprint_type: BlueprintType,
    pub parent_class: Arc<Class>,
    #[serde(default)]
    pub new_variables: Vec<VariableDescription>,
    #[serde(default)]
    pub timelines: Vec<TimelineTemplate>,
    #[serde(default)]
    pub construction_script: Option<SimpleConstructionScript>,
    #[serde(default)]
    pub ubergraph_pages: Vec<Graph>,
    #[serde(default)]
    pub function_graphs: Vec<Graph>,
    #[serde(default)]
    pub delegate_signature_graphs: Vec<Graph>,
    #[serde(default)]
    pub macro_graphs: Vec<Graph>,
    #[serde(default)]
    pub implemented_interfaces: Vec<ImplementedInterface>,
    #[serde(default)]
    pub hide_categories: Vec<String>,
    /// The class produced by the previous compile, if any.
    #[serde(default)]
    pub generated_class: Option<Class>,
    /// Compiler-expanded graphs kept for inspection.
    #[serde(default)]
    pub intermediate_generated_graphs: Vec<Graph>,
}

impl Blueprint {
    pub fn new(name: impl Into<String>, parent_class: Arc<Class>) -> Self {
        Self {
            name: name.into(),
            blueprint_type: BlueprintType::Normal,
            parent_class,
            new_variables: Vec::new(),
            timelines: Vec::new(),
            construction_script: None,
            ubergraph_pages: Vec::new(),
            function_graphs: Vec::new(),
            delegate_signature_graphs: Vec::new(),
            macro_graphs: Vec::new(),
            implemented_interfaces: Vec::new(),
            hide_categories: Vec::new(),
            generated_class: None,
            intermediate_generated_graphs: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn generated_class_name(&self) -> String {
        format!("{}_C", self.name)
    }

    pub fn find_macro_graph(&self, name: &str) -> Option<&Graph> {
        self.macro_graphs.iter().find(|g| g.name == name)
    }

    /// Every graph the user authored.
    pub fn all_graphs(&self) -> impl Iterator<Item = &Graph> + '_ {
        self.ubergraph_pages
            .iter()
            .chain(&self.function_graphs)
            .chain(&self.delegate_signature_graphs)
            .chain(&self.macro_graphs)
            .chain(self.implemented_interfaces.iter().flat_map(|i| i.graphs.iter()))
    }

    pub fn all_graphs_mut(&mut self) -> impl Iterator<Item = &mut Graph> + '_ {
        self.ubergraph_pages
            .iter_mut()
            .chain(self.function_graphs.iter_mut())
            .chain(self.delegate_signature_graphs.iter_mut())
            .chain(self.macro_graphs.iter_mut())
            .chain(
                self.implemented_interfaces
                    .iter_mut()
                    .flat_map(|i| i.graphs.iter_mut()),
            )
    }

    /// Whether any graph still reads or writes the self member `name`.
    pub fn is_variable_used(&self, name: &str) -> bool {
        self.all_graphs().any(|graph| {
            graph.nodes().any(|node| match &node.kind {
                NodeKind::VariableGet(var) | NodeKind::VariableSet(Some(var)) => {
                    var.owner.is_none() && var.name == name
                }
                _ => false,
            })
        })
    }

    /// Renames every self-member reference to `old` in all graphs.
    pub fn rename_variable_references(&mut self, old: &str, new: &str) {
        for graph in self.all_graphs_mut() {
            for id in graph.node_ids() {
                let mut renamed_pin = None;
                if let Some(node) = graph.node_mut(id) {
                    match &mut node.kind {
                        NodeKind::VariableGet(var) | NodeKind::VariableSet(Some(var))
                            if var.owner.is_none() && var.name == old =>
                        {
                            var.name = new.to_string();
                            renamed_pin = Some(id);
                        }
                        _ => {}
                    }
                }
                if let Some(node) = renamed_pin {
                    if let Some(pin) = graph.find_pin(node, old, None) {
                        if let Some(pin) = graph.pin_mut(pin) {
                            pin.name = new.to_string();
                        }
                    }
                }
            }
        }
    }

    /// Renames a function graph and the self calls that target it.
    pub fn rename_function_references(&mut self, old: &str, new: &str) {
        for graph in self.all_graphs_mut() {
            if graph.name == old {
                graph.name = new.to_string();
            }
            for id in graph.node_ids() {
                if let Some(node) = graph.node_mut(id) {
                    if let NodeKind::CallFunction(call) = &mut node.kind {
                        if call.owner.is_none() && call.function == old {
                            call.function = new.to_string();
                        }
                    }
                }
            }
        }
    }

    /// Renames timeline nodes that reference `old`.
    pub fn rename_timeline_references(&mut self, old: &str, new: &str) {
        for graph in self.all_graphs_mut() {
            for id in graph.node_ids() {
                if let Some(node) = graph.node_mut(id) {
                    if let NodeKind::Timeline { timeline } = &mut node.kind {
                        if timeline == old {
                            *timeline = new.to_string();
                        }
                    }
                }
            }
        }
    }
}
