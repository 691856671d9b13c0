//! Pin types and pin storage.

use super::{NodeId, PinId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sub-category marking a pin that refers to the class being compiled.
pub const PSC_SELF: &str = "self";

/// Well-known pin names.
pub const PN_EXECUTE: &str = "execute";
pub const PN_THEN: &str = "then";
pub const PN_ELSE: &str = "else";
pub const PN_SELF: &str = "self";
pub const PN_CONDITION: &str = "Condition";
pub const PN_RETURN_VALUE: &str = "ReturnValue";
pub const PN_ENTRY_POINT: &str = "EntryPoint";
pub const PN_WORLD_CONTEXT: &str = "__WorldContext";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinCategory {
    Exec,
    Boolean,
    Byte,
    Int,
    Float,
    Name,
    String,
    Text,
    Struct,
    Object,
    Class,
    Interface,
    Delegate,
    MulticastDelegate,
    Wildcard,
}

impl PinCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            PinCategory::Exec => "exec",
            PinCategory::Boolean => "bool",
            PinCategory::Byte => "byte",
            PinCategory::Int => "int",
            PinCategory::Float => "float",
            PinCategory::Name => "name",
            PinCategory::String => "string",
            PinCategory::Text => "text",
            PinCategory::Struct => "struct",
            PinCategory::Object => "object",
            PinCategory::Class => "class",
            PinCategory::Interface => "interface",
            PinCategory::Delegate => "delegate",
            PinCategory::MulticastDelegate => "mcdelegate",
            PinCategory::Wildcard => "wildcard",
        }
    }

    /// Categories whose values refer to objects and never carry literal defaults.
    pub fn is_object_like(self) -> bool {
        matches!(
            self,
            PinCategory::Object | PinCategory::Class | PinCategory::Interface
        )
    }
}

/// Full type descriptor of a pin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinType {
    pub category: PinCategory,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub sub_category_object: Option<String>,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub is_reference: bool,
    #[serde(default)]
    pub is_const: bool,
}

impl PinType {
    pub fn new(category: PinCategory) -> Self {
        Self {
            category,
            sub_category: String::new(),
            sub_category_object: None,
            is_array: false,
            is_reference: false,
            is_const: false,
        }
    }

    pub fn exec() -> Self {
        Self::new(PinCategory::Exec)
    }

    pub fn boolean() -> Self {
        Self::new(PinCategory::Boolean)
    }

    pub fn byte() -> Self {
        Self::new(PinCategory::Byte)
    }

    pub fn int() -> Self {
        Self::new(PinCategory::Int)
    }

    pub fn float() -> Self {
        Self::new(PinCategory::Float)
    }

    pub fn name() -> Self {
        Self::new(PinCategory::Name)
    }

    pub fn string() -> Self {
        Self::new(PinCategory::String)
    }

    pub fn wildcard() -> Self {
        Self::new(PinCategory::Wildcard)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self {
            sub_category_object: Some(name.into()),
            ..Self::new(PinCategory::Struct)
        }
    }

    pub fn object(class: impl Into<String>) -> Self {
        Self {
            sub_category_object: Some(class.into()),
            ..Self::new(PinCategory::Object)
        }
    }

    pub fn self_object() -> Self {
        Self {
            sub_category: PSC_SELF.to_string(),
            ..Self::new(PinCategory::Object)
        }
    }

    pub fn multicast_delegate() -> Self {
        Self::new(PinCategory::MulticastDelegate)
    }

    pub fn array_of(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn by_ref(mut self) -> Self {
        self.is_reference = true;
        self
    }

    pub fn is_exec(&self) -> bool {
        self.category == PinCategory::Exec
    }

    pub fn is_wildcard(&self) -> bool {
        self.category == PinCategory::Wildcard
    }

    pub fn is_self(&self) -> bool {
        self.category == PinCategory::Object && self.sub_category == PSC_SELF
    }

    /// Element type of an array pin type.
    pub fn element_type(&self) -> PinType {
        PinType {
            is_array: false,
            is_reference: false,
            ..self.clone()
        }
    }

    /// Copies category information only, keeping array/reference status.
    pub fn resolve_wildcard(&mut self, resolved: &PinType) {
        self.category = resolved.category;
        self.sub_category = resolved.sub_category.clone();
        self.sub_category_object = resolved.sub_category_object.clone();
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "array of ")?;
        }
        match (&self.sub_category_object, self.sub_category.as_str()) {
            (Some(object), _) => write!(f, "{} ({})", self.category.as_str(), object),
            (None, "") => write!(f, "{}", self.category.as_str()),
            (None, sub) => write!(f, "{} ({})", self.category.as_str(), sub),
        }
    }
}

/// Declarative pin used when allocating the default pins of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinDescription {
    pub name: String,
    pub ty: PinType,
    #[serde(default)]
    pub default_value: String,
}

impl PinDescription {
    pub fn new(name: impl Into<String>, ty: PinType) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: String::new(),
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    pub owner: NodeId,
    pub name: String,
    pub direction: Direction,
    pub ty: PinType,
    #[serde(default)]
    pub default_value: String,
    /// Object literal used when an object pin is left unconnected.
    #[serde(default)]
    pub default_object: Option<String>,
    #[serde(default)]
    pub links: Vec<PinId>,
}

impl Pin {
    pub fn is_linked(&self) -> bool {
        !self.links.is_empty()
    }

    pub fn is_exec(&self) -> bool {
        self.ty.is_exec()
    }

    pub fn is_self(&self) -> bool {
        self.name == PN_SELF && self.direction == Direction::Input && self.ty.category == PinCategory::Object
    }

    /// Exec and self pins carry no user data.
    pub fn is_meta(&self) -> bool {
        self.is_exec() || self.is_self()
    }
}
