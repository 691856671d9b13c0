//! Node kinds and their fixed pin layouts.

use super::pin::*;
use super::{NodeId, PinId};
use crate::class::FunctionFlags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to a member variable, either on the class being compiled
/// (`owner == None`) or on another class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableReference {
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ty: PinType,
}

impl VariableReference {
    pub fn self_member(name: impl Into<String>, ty: PinType) -> Self {
        Self {
            name: name.into(),
            owner: None,
            ty,
        }
    }
}

/// A function-local variable declared on a function entry node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalVariable {
    pub name: String,
    pub ty: PinType,
    #[serde(default)]
    pub default_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryData {
    /// Flags requested by the user on top of the generated ones.
    #[serde(default)]
    pub extra_flags: FunctionFlags,
    /// Overrides the function name normally taken from the owning graph.
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub local_variables: Vec<LocalVariable>,
    /// Tooltip, category, keywords and similar function metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// The function this event implements.
    pub function: String,
    /// Class (parent or interface) declaring the overridden function.
    #[serde(default)]
    pub override_of: Option<String>,
    /// Generated by the compiler (timeline tracks, missing interface events).
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub function_flags: FunctionFlags,
}

impl EventData {
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            function: name.into(),
            ..Default::default()
        }
    }

    pub fn overriding(function: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            override_of: Some(owner.into()),
            ..Default::default()
        }
    }

    pub fn is_override(&self) -> bool {
        self.override_of.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallData {
    pub function: String,
    /// Class declaring the function; `None` calls a function of the class being compiled.
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub pure: bool,
    /// Static library function: no target object, so no self pin.
    #[serde(default)]
    pub is_static: bool,
}

impl CallData {
    pub fn self_call(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            owner: None,
            pure: false,
            is_static: false,
        }
    }

    pub fn external(function: impl Into<String>, owner: impl Into<String>, pure: bool) -> Self {
        Self {
            function: function.into(),
            owner: Some(owner.into()),
            pure,
            is_static: false,
        }
    }

    /// A static function of a function library.
    pub fn library(function: impl Into<String>, owner: impl Into<String>, pure: bool) -> Self {
        Self {
            is_static: true,
            ..Self::external(function, owner, pure)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroData {
    pub macro_graph: String,
    /// Concrete type substituted for every wildcard pin of the expanded body.
    #[serde(default)]
    pub resolved_wildcard_type: Option<PinType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    FunctionEntry(EntryData),
    FunctionResult,
    Event(EventData),
    CallFunction(CallData),
    VariableGet(VariableReference),
    /// `None` assigns every input pin to the member of the same name.
    VariableSet(Option<VariableReference>),
    TemporaryVariable(PinType),
    Branch,
    Knot(PinType),
    MakeArray { element: PinType, count: usize },
    MacroInstance(MacroData),
    /// `entry == true` is the input boundary of a macro body (it has output pins).
    Tunnel { entry: bool },
    Timeline { timeline: String },
    Comment { text: String },
}

/// Discriminant of [`NodeKind`], used to key the handler registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKindTag {
    FunctionEntry,
    FunctionResult,
    Event,
    CallFunction,
    VariableGet,
    VariableSet,
    TemporaryVariable,
    Branch,
    Knot,
    MakeArray,
    MacroInstance,
    Tunnel,
    Timeline,
    Comment,
}

impl NodeKindTag {
    pub const ALL: [NodeKindTag; 14] = [
        NodeKindTag::FunctionEntry,
        NodeKindTag::FunctionResult,
        NodeKindTag::Event,
        NodeKindTag::CallFunction,
        NodeKindTag::VariableGet,
        NodeKindTag::VariableSet,
        NodeKindTag::TemporaryVariable,
        NodeKindTag::Branch,
        NodeKindTag::Knot,
        NodeKindTag::MakeArray,
        NodeKindTag::MacroInstance,
        NodeKindTag::Tunnel,
        NodeKindTag::Timeline,
        NodeKindTag::Comment,
    ];
}

impl NodeKind {
    pub fn tag(&self) -> NodeKindTag {
        match self {
            NodeKind::FunctionEntry(_) => NodeKindTag::FunctionEntry,
            NodeKind::FunctionResult => NodeKindTag::FunctionResult,
            NodeKind::Event(_) => NodeKindTag::Event,
            NodeKind::CallFunction(_) => NodeKindTag::CallFunction,
            NodeKind::VariableGet(_) => NodeKindTag::VariableGet,
            NodeKind::VariableSet(_) => NodeKindTag::VariableSet,
            NodeKind::TemporaryVariable(_) => NodeKindTag::TemporaryVariable,
            NodeKind::Branch => NodeKindTag::Branch,
            NodeKind::Knot(_) => NodeKindTag::Knot,
            NodeKind::MakeArray { .. } => NodeKindTag::MakeArray,
            NodeKind::MacroInstance(_) => NodeKindTag::MacroInstance,
            NodeKind::Tunnel { .. } => NodeKindTag::Tunnel,
            NodeKind::Timeline { .. } => NodeKindTag::Timeline,
            NodeKind::Comment { .. } => NodeKindTag::Comment,
        }
    }

    /// Pure nodes have no side effects and are recomputed at every use.
    pub fn is_pure(&self) -> bool {
        match self {
            NodeKind::CallFunction(call) => call.pure,
            NodeKind::VariableGet(_)
            | NodeKind::MakeArray { .. }
            | NodeKind::Comment { .. }
            | NodeKind::TemporaryVariable(_)
            | NodeKind::Knot(_) => true,
            _ => false,
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self, NodeKind::FunctionEntry(_))
    }

    pub fn is_event(&self) -> bool {
        matches!(self, NodeKind::Event(_))
    }

    /// Human readable title used in diagnostics.
    pub fn title(&self) -> String {
        match self {
            NodeKind::FunctionEntry(entry) => match &entry.custom_name {
                Some(name) => format!("Entry {}", name),
                None => "Function Entry".to_string(),
            },
            NodeKind::FunctionResult => "Return Node".to_string(),
            NodeKind::Event(event) => format!("Event {}", event.function),
            NodeKind::CallFunction(call) => format!("Call {}", call.function),
            NodeKind::VariableGet(var) => format!("Get {}", var.name),
            NodeKind::VariableSet(Some(var)) => format!("Set {}", var.name),
            NodeKind::VariableSet(None) => "Assign Members".to_string(),
            NodeKind::TemporaryVariable(ty) => format!("Local {}", ty),
            NodeKind::Branch => "Branch".to_string(),
            NodeKind::Knot(_) => "Reroute".to_string(),
            NodeKind::MakeArray { .. } => "Make Array".to_string(),
            NodeKind::MacroInstance(data) => format!("Macro {}", data.macro_graph),
            NodeKind::Tunnel { entry: true } => "Inputs".to_string(),
            NodeKind::Tunnel { entry: false } => "Outputs".to_string(),
            NodeKind::Timeline { timeline } => format!("Timeline {}", timeline),
            NodeKind::Comment { text } => format!("Comment '{}'", text),
        }
    }

    /// The fixed pins every node of this kind starts with. Signature pins
    /// (parameters, tracks, tunnel pins) are added by the graph author.
    pub fn default_pins(&self) -> Vec<(Direction, PinDescription)> {
        let exec_in = || (Direction::Input, PinDescription::new(PN_EXECUTE, PinType::exec()));
        let exec_out = |name: &str| (Direction::Output, PinDescription::new(name, PinType::exec()));

        match self {
            NodeKind::FunctionEntry(_) | NodeKind::Event(_) => vec![exec_out(PN_THEN)],
            NodeKind::FunctionResult => vec![exec_in()],
            NodeKind::CallFunction(call) => {
                let mut pins = Vec::new();
                if !call.pure {
                    pins.push(exec_in());
                    pins.push(exec_out(PN_THEN));
                }
                if !call.is_static {
                    pins.push((
                        Direction::Input,
                        PinDescription::new(PN_SELF, PinType::self_object()),
                    ));
                }
                pins
            }
            NodeKind::VariableGet(var) => vec![(
                Direction::Output,
                PinDescription::new(var.name.clone(), var.ty.clone()),
            )],
            NodeKind::VariableSet(var) => {
                let mut pins = vec![exec_in(), exec_out(PN_THEN)];
                if let Some(var) = var {
                    pins.push((
                        Direction::Input,
                        PinDescription::new(var.name.clone(), var.ty.clone()),
                    ));
                }
                pins
            }
            NodeKind::TemporaryVariable(ty) => vec![(
                Direction::Output,
                PinDescription::new("Variable", ty.clone()),
            )],
            NodeKind::Branch => vec![
                exec_in(),
                (
                    Direction::Input,
                    PinDescription::new(PN_CONDITION, PinType::boolean()).with_default("true"),
                ),
                exec_out(PN_THEN),
                exec_out(PN_ELSE),
            ],
            NodeKind::Knot(ty) => vec![
                (Direction::Input, PinDescription::new("InputPin", ty.clone())),
                (Direction::Output, PinDescription::new("OutputPin", ty.clone())),
            ],
            NodeKind::MakeArray { element, count } => {
                let mut pins: Vec<_> = (0..*count)
                    .map(|i| {
                        (
                            Direction::Input,
                            PinDescription::new(format!("[{}]", i), element.clone()),
                        )
                    })
                    .collect();
                pins.push((
                    Direction::Output,
                    PinDescription::new("Array", element.clone().array_of()),
                ));
                pins
            }
            NodeKind::Timeline { .. } => {
                let mut pins: Vec<_> = TIMELINE_CONTROL_PINS
                    .iter()
                    .map(|name| (Direction::Input, PinDescription::new(*name, PinType::exec())))
                    .collect();
                pins.push((
                    Direction::Input,
                    PinDescription::new(PN_NEW_TIME, PinType::float()).with_default("0.0"),
                ));
                pins.push(exec_out(PN_UPDATE));
                pins.push(exec_out(PN_FINISHED));
                pins.push((
                    Direction::Output,
                    PinDescription::new(PN_DIRECTION, PinType::byte()),
                ));
                pins
            }
            NodeKind::MacroInstance(_) | NodeKind::Tunnel { .. } | NodeKind::Comment { .. } => {
                Vec::new()
            }
        }
    }
}

/// Timeline control inputs, each backed by a runtime method of the same name.
pub const TIMELINE_CONTROL_PINS: [&str; 6] = [
    "Play",
    "PlayFromStart",
    "Stop",
    "Reverse",
    "ReverseFromEnd",
    "SetNewTime",
];
pub const PN_NEW_TIME: &str = "NewTime";
pub const PN_UPDATE: &str = "Update";
pub const PN_FINISHED: &str = "Finished";
pub const PN_DIRECTION: &str = "Direction";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub pins: Vec<PinId>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub comment: String,
    /// Spawned by the compiler rather than the user.
    #[serde(default)]
    pub intermediate: bool,
}

impl Node {
    pub fn is_pure(&self) -> bool {
        self.kind.is_pure()
    }

    pub fn title(&self) -> String {
        self.kind.title()
    }
}
