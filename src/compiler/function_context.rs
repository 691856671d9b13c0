//! # Function Context
//!
//! Per-function compiler state: the transient graph being compiled, its
//! terminals, the linear execution list and the statements emitted per node.

use super::statement::Statement;
use crate::class::FunctionFlags;
use crate::graph::{Direction, Graph, NodeId, PinId, PinType};
use crate::log::SourceToken;
use crate::validator::sanitize;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermKind {
    Parameter,
    Result,
    Local,
    /// Local of the consolidated event graph, persisted on the class.
    EventGraphLocal,
    Literal,
    MemberReference,
    /// Local variable declared by the user on the function entry.
    UserLocal,
}

/// A storage location needed by generated code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub name: String,
    pub ty: PinType,
    pub kind: TermKind,
    pub source: Option<SourceToken>,
    pub default_value: String,
    pub default_object: Option<String>,
    pub passed_by_ref: bool,
    pub is_const: bool,
    /// Persisted across calls (lives on the class rather than the frame).
    pub save_persistent: bool,
    /// Name of the property synthesized for this terminal.
    pub associated_property: Option<String>,
}

impl Terminal {
    pub fn is_local(&self) -> bool {
        matches!(
            self.kind,
            TermKind::Local | TermKind::UserLocal | TermKind::Parameter | TermKind::Result
        )
    }

    pub fn is_literal(&self) -> bool {
        self.kind == TermKind::Literal
    }
}

/// Stable, unique storage names for pins.
#[derive(Debug, Clone, Default)]
pub struct NetNameMap {
    names: HashMap<PinId, String>,
    used: HashSet<String>,
}

impl NetNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the name already assigned to `pin`, assigning one on first use.
    pub fn make_valid_name(&mut self, graph: &Graph, pin: PinId) -> String {
        if let Some(name) = self.names.get(&pin) {
            return name.clone();
        }
        let base = match graph.pin(pin) {
            Some(p) => {
                let tag = graph
                    .kind(p.owner)
                    .map(|k| format!("{:?}", k.tag()))
                    .unwrap_or_default();
                sanitize(&format!("{}_{}_{}", tag, p.owner.0, p.name))
            }
            None => format!("Net_{}", pin.0),
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while self.used.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.used.insert(name.clone());
        self.names.insert(pin, name.clone());
        name
    }

    pub fn get(&self, pin: PinId) -> Option<&str> {
        self.names.get(&pin).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextFlags {
    pub event_graph: bool,
    pub interface_stub: bool,
    pub const_function: bool,
    pub create_debug_data: bool,
    /// Not callable from other Blueprints (event stubs of overrides, internal events).
    pub internal: bool,
    /// Event stub whose event carries no parameters.
    pub simple_stub_no_params: bool,
}

/// Link between an event stub and the event it forwards to in the ubergraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StubLink {
    /// Event node in the consolidated event graph.
    pub source_event: NodeId,
    /// Call into the ubergraph inside the stub graph.
    pub ubergraph_call: NodeId,
}

#[derive(Debug, Clone)]
pub struct FunctionContext {
    pub function_name: String,
    pub graph: Graph,
    pub flags: ContextFlags,
    /// Multicast delegate property whose signature this graph declares.
    pub delegate_signature_name: Option<String>,
    pub net_flags: FunctionFlags,
    pub stub: Option<StubLink>,
    /// Set once a structural error stops code generation for this function.
    pub failed: bool,

    pub entry_point: Option<NodeId>,
    pub linear_execution_list: Vec<NodeId>,

    pub terms: Vec<Terminal>,
    pub parameters: Vec<TermId>,
    pub results: Vec<TermId>,
    pub locals: Vec<TermId>,
    pub event_graph_locals: Vec<TermId>,
    pub variable_references: Vec<TermId>,
    pub literals: Vec<TermId>,
    pub user_locals: Vec<TermId>,
    pub net_map: HashMap<PinId, TermId>,
    /// Storage names for frame-local nets.
    pub local_net_names: NetNameMap,

    pub statements_per_node: HashMap<NodeId, Vec<Statement>>,
    /// Final statement list, filled in by goto resolution.
    pub statements: Vec<Statement>,
    /// Statement index at which each scheduled node's code begins.
    pub node_labels: HashMap<NodeId, usize>,
}

impl FunctionContext {
    pub fn new(function_name: impl Into<String>, graph: Graph) -> Self {
        Self {
            function_name: function_name.into(),
            graph,
            flags: ContextFlags {
                create_debug_data: true,
                ..Default::default()
            },
            delegate_signature_name: None,
            net_flags: FunctionFlags::empty(),
            stub: None,
            failed: false,
            entry_point: None,
            linear_execution_list: Vec::new(),
            terms: Vec::new(),
            parameters: Vec::new(),
            results: Vec::new(),
            locals: Vec::new(),
            event_graph_locals: Vec::new(),
            variable_references: Vec::new(),
            literals: Vec::new(),
            user_locals: Vec::new(),
            net_map: HashMap::new(),
            local_net_names: NetNameMap::new(),
            statements_per_node: HashMap::new(),
            statements: Vec::new(),
            node_labels: HashMap::new(),
        }
    }

    pub fn is_event_graph(&self) -> bool {
        self.flags.event_graph
    }

    pub fn is_delegate_signature(&self) -> bool {
        self.delegate_signature_name.is_some()
    }

    pub fn mark_as_net_function(&mut self, flags: FunctionFlags) {
        self.net_flags = flags & FunctionFlags::NET_FUNC_FLAGS;
    }

    pub fn term(&self, id: TermId) -> &Terminal {
        &self.terms[id.0]
    }

    pub fn term_mut(&mut self, id: TermId) -> &mut Terminal {
        &mut self.terms[id.0]
    }

    pub fn add_term(
        &mut self,
        kind: TermKind,
        name: impl Into<String>,
        ty: PinType,
        source: Option<SourceToken>,
    ) -> TermId {
        let id = TermId(self.terms.len());
        let passed_by_ref = ty.is_reference;
        let is_const = ty.is_const;
        self.terms.push(Terminal {
            name: name.into(),
            ty,
            kind,
            source,
            default_value: String::new(),
            default_object: None,
            passed_by_ref,
            is_const,
            save_persistent: kind == TermKind::EventGraphLocal,
            associated_property: None,
        });
        let list = match kind {
            TermKind::Parameter => &mut self.parameters,
            TermKind::Result => &mut self.results,
            TermKind::Local => &mut self.locals,
            TermKind::EventGraphLocal => &mut self.event_graph_locals,
            TermKind::Literal => &mut self.literals,
            TermKind::MemberReference => &mut self.variable_references,
            TermKind::UserLocal => &mut self.user_locals,
        };
        list.push(id);
        id
    }

    /// Registers storage for an output pin, choosing frame or ubergraph scope.
    pub fn create_local_terminal_for_pin(&mut self, pin: PinId, name: String) -> Option<TermId> {
        let (ty, token) = {
            let p = self.graph.pin(pin)?;
            (p.ty.clone(), self.graph.pin_token(pin))
        };
        let kind = if self.is_event_graph() {
            TermKind::EventGraphLocal
        } else {
            TermKind::Local
        };
        let id = self.add_term(kind, name, ty, Some(token));
        self.net_map.insert(pin, id);
        Some(id)
    }

    /// Registers a literal term holding the default of an unconnected input pin.
    pub fn register_literal(&mut self, pin: PinId) -> Option<TermId> {
        let (ty, default_value, default_object, token) = {
            let p = self.graph.pin(pin)?;
            (
                p.ty.clone(),
                p.default_value.clone(),
                p.default_object.clone(),
                self.graph.pin_token(pin),
            )
        };
        let id = self.add_term(TermKind::Literal, default_value.clone(), ty, Some(token));
        let term = self.term_mut(id);
        term.default_value = default_value;
        term.default_object = default_object;
        self.net_map.insert(pin, id);
        Some(id)
    }

    /// Member or user-local term named `name`, created on first use.
    pub fn find_or_add_variable_term(
        &mut self,
        name: &str,
        ty: PinType,
        source: Option<SourceToken>,
    ) -> TermId {
        let existing = self
            .user_locals
            .iter()
            .chain(&self.variable_references)
            .copied()
            .find(|id| self.terms[id.0].name == name);
        match existing {
            Some(id) => id,
            None => self.add_term(TermKind::MemberReference, name, ty, source),
        }
    }

    pub fn find_result_term(&self, name: &str) -> Option<TermId> {
        self.results
            .iter()
            .copied()
            .find(|id| self.terms[id.0].name == name)
    }

    /// Term feeding an input pin: the source net if linked, else its literal.
    pub fn input_term(&self, pin: PinId) -> Option<TermId> {
        let p = self.graph.pin(pin)?;
        debug_assert_eq!(p.direction, Direction::Input);
        match p.links.first() {
            Some(source) => self.net_map.get(source).copied(),
            None => self.net_map.get(&pin).copied(),
        }
    }

    pub fn append_statement(&mut self, node: NodeId, statement: Statement) {
        self.statements_per_node
            .entry(node)
            .or_default()
            .push(statement);
    }

    pub fn did_node_generate_code(&self, node: NodeId) -> bool {
        self.statements_per_node
            .get(&node)
            .map_or(false, |list| list.iter().any(|s| !s.is_marker()))
    }

    /// Prepends a copy of `source`'s statements to `dest`'s.
    pub fn copy_and_prepend_statements(&mut self, dest: NodeId, source: NodeId) {
        let copied = match self.statements_per_node.get(&source) {
            Some(list) => list.clone(),
            None => return,
        };
        let target = self.statements_per_node.entry(dest).or_default();
        target.splice(0..0, copied);
    }
}
