//! # Runtime Class Model
//!
//! The class, property and function objects produced by the compiler, plus
//! the literal [`Value`] type used for defaults and the class default object.
//!
//! Storage sizes are simulated per pin category; they only need to be stable
//! so that offsets, parameter frames and the default object are reproducible.

use crate::blueprint::{ComponentTemplate, SimpleConstructionScript, TimelineTemplate};
use crate::codegen::ScriptOp;
use crate::error::{CompileError, Result};
use crate::graph::{PinCategory, PinType};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Upper bound on the length of a property chain; exceeding it means the chain is corrupt.
pub const PROPERTY_SAFETY_LIMIT: usize = 100_000;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ClassFlags: u32 {
        const ABSTRACT                = 1 << 0;
        const NOT_PLACEABLE           = 1 << 1;
        const CONST                   = 1 << 2;
        const INTERFACE               = 1 << 3;
        const PARSED                  = 1 << 4;
        const COMPILED_FROM_BLUEPRINT = 1 << 5;
        const TRANSIENT               = 1 << 6;
        const CONFIG                  = 1 << 7;
        const EDIT_INLINE_NEW         = 1 << 8;
        const COLLAPSE_CATEGORIES     = 1 << 9;
        const HAS_INSTANCED_REFERENCE = 1 << 10;

        /// Flags every subclass inherits.
        const INHERIT = Self::TRANSIENT.bits() | Self::CONFIG.bits() | Self::NOT_PLACEABLE.bits();
        /// Flags inherited by script-generated subclasses.
        const SCRIPT_INHERIT = Self::INHERIT.bits()
            | Self::EDIT_INLINE_NEW.bits()
            | Self::COLLAPSE_CATEGORIES.bits()
            | Self::HAS_INSTANCED_REFERENCE.bits();
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FunctionFlags: u32 {
        const FINAL                    = 1 << 0;
        const PUBLIC                   = 1 << 1;
        const PROTECTED                = 1 << 2;
        const PRIVATE                  = 1 << 3;
        const NET                      = 1 << 4;
        const NET_RELIABLE             = 1 << 5;
        const NET_MULTICAST            = 1 << 6;
        const NET_SERVER               = 1 << 7;
        const NET_CLIENT               = 1 << 8;
        const BLUEPRINT_CALLABLE       = 1 << 9;
        const BLUEPRINT_EVENT          = 1 << 10;
        const EXEC                     = 1 << 11;
        const EVENT                    = 1 << 12;
        const DELEGATE                 = 1 << 13;
        const HAS_OUT_PARMS            = 1 << 14;
        const HAS_DEFAULTS             = 1 << 15;
        const STATIC                   = 1 << 16;
        const CONST                    = 1 << 17;
        const BLUEPRINT_AUTHORITY_ONLY = 1 << 18;
        const BLUEPRINT_COSMETIC       = 1 << 19;
        const MULTICAST_DELEGATE       = 1 << 20;

        /// Flags an override inherits from the function it overrides.
        const FUNC_INHERIT = Self::EXEC.bits()
            | Self::EVENT.bits()
            | Self::BLUEPRINT_CALLABLE.bits()
            | Self::BLUEPRINT_EVENT.bits()
            | Self::BLUEPRINT_AUTHORITY_ONLY.bits()
            | Self::BLUEPRINT_COSMETIC.bits();
        const ACCESS_SPECIFIERS = Self::PUBLIC.bits() | Self::PROTECTED.bits() | Self::PRIVATE.bits();
        const NET_FUNC_FLAGS = Self::NET.bits()
            | Self::NET_RELIABLE.bits()
            | Self::NET_SERVER.bits()
            | Self::NET_CLIENT.bits()
            | Self::NET_MULTICAST.bits();
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PropertyFlags: u32 {
        const PARM                     = 1 << 0;
        const OUT_PARM                 = 1 << 1;
        const REFERENCE_PARM           = 1 << 2;
        const RETURN_PARM              = 1 << 3;
        const CONST_PARM               = 1 << 4;
        const NET                      = 1 << 5;
        const REP_NOTIFY               = 1 << 6;
        const SAVE_GAME                = 1 << 7;
        const TRANSIENT                = 1 << 8;
        const DUPLICATE_TRANSIENT      = 1 << 9;
        const BLUEPRINT_VISIBLE        = 1 << 10;
        const EXPOSE_ON_SPAWN          = 1 << 11;
        const DISABLE_EDIT_ON_INSTANCE = 1 << 12;
        const ZERO_CONSTRUCTOR         = 1 << 13;
        const EDIT                     = 1 << 14;
        const BLUEPRINT_READ_ONLY      = 1 << 15;
    }
}

/// Literal value of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Byte(u8),
    Int(i32),
    Float(f32),
    Name(String),
    String(String),
    Text(String),
    Vector([f32; 3]),
    LinearColor([f32; 4]),
    Struct(String),
    Object(Option<String>),
    Array(Vec<Value>),
}

impl Value {
    /// The value a freshly constructed property of this type holds.
    pub fn zero(ty: &PinType) -> Value {
        if ty.is_array {
            return Value::Array(Vec::new());
        }
        match ty.category {
            PinCategory::Boolean => Value::Bool(false),
            PinCategory::Byte => Value::Byte(0),
            PinCategory::Int => Value::Int(0),
            PinCategory::Float => Value::Float(0.0),
            PinCategory::Name => Value::Name("None".to_string()),
            PinCategory::String => Value::String(String::new()),
            PinCategory::Text => Value::Text(String::new()),
            PinCategory::Struct => match ty.sub_category_object.as_deref() {
                Some("Vector") => Value::Vector([0.0; 3]),
                Some("LinearColor") => Value::LinearColor([0.0; 4]),
                _ => Value::Struct(String::new()),
            },
            PinCategory::Object
            | PinCategory::Class
            | PinCategory::Interface
            | PinCategory::Delegate
            | PinCategory::MulticastDelegate => Value::Object(None),
            PinCategory::Exec | PinCategory::Wildcard => Value::None,
        }
    }

    /// Parses a default-value string for the given type.
    pub fn parse(ty: &PinType, text: &str) -> Option<Value> {
        let text = text.trim();
        if ty.is_array {
            return match text {
                "" | "()" => Some(Value::Array(Vec::new())),
                _ => None,
            };
        }
        match ty.category {
            PinCategory::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" | "" => Some(Value::Bool(false)),
                _ => None,
            },
            PinCategory::Byte => text.parse().ok().map(Value::Byte),
            PinCategory::Int => text.parse().ok().map(Value::Int),
            PinCategory::Float => text.parse().ok().map(Value::Float),
            PinCategory::Name => Some(Value::Name(text.to_string())),
            PinCategory::String => Some(Value::String(text.to_string())),
            PinCategory::Text => Some(Value::Text(text.to_string())),
            PinCategory::Struct => match ty.sub_category_object.as_deref() {
                Some("Vector") => parse_components(text, &["X", "Y", "Z"])
                    .map(|v| Value::Vector([v[0], v[1], v[2]])),
                Some("LinearColor") => parse_components(text, &["R", "G", "B", "A"])
                    .map(|v| Value::LinearColor([v[0], v[1], v[2], v[3]])),
                _ => Some(Value::Struct(text.to_string())),
            },
            PinCategory::Object | PinCategory::Class | PinCategory::Interface => match text {
                "" | "None" => Some(Value::Object(None)),
                path => Some(Value::Object(Some(path.to_string()))),
            },
            PinCategory::Delegate | PinCategory::MulticastDelegate => match text {
                "" => Some(Value::Object(None)),
                _ => None,
            },
            PinCategory::Exec | PinCategory::Wildcard => None,
        }
    }
}

/// Accepts `1,2,3` or `(X=1,Y=2,Z=3)`.
fn parse_components(text: &str, keys: &[&str]) -> Option<Vec<f32>> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text);
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != keys.len() {
        return None;
    }
    parts
        .iter()
        .zip(keys)
        .map(|(part, key)| {
            let number = match part.split_once('=') {
                Some((k, v)) if k.trim().eq_ignore_ascii_case(key) => v.trim(),
                Some(_) => return None,
                None => part,
            };
            number.parse().ok()
        })
        .collect()
}

/// Size and alignment of a property of the given type.
pub fn storage_layout(ty: &PinType) -> Option<(usize, usize)> {
    if ty.is_array {
        return Some((16, 8));
    }
    let layout = match ty.category {
        PinCategory::Boolean | PinCategory::Byte => (1, 1),
        PinCategory::Int | PinCategory::Float => (4, 4),
        PinCategory::Name => (8, 4),
        PinCategory::String => (16, 8),
        PinCategory::Text => (24, 8),
        PinCategory::Struct => match ty.sub_category_object.as_deref() {
            Some("Vector") => (12, 4),
            Some("LinearColor") => (16, 4),
            Some(_) => (16, 8),
            None => return None,
        },
        PinCategory::Object | PinCategory::Class => (8, 8),
        PinCategory::Interface | PinCategory::Delegate | PinCategory::MulticastDelegate => (16, 8),
        PinCategory::Exec | PinCategory::Wildcard => return None,
    };
    Some(layout)
}

pub fn is_zero_constructible(ty: &PinType) -> bool {
    !ty.is_array
        && matches!(
            ty.category,
            PinCategory::Boolean
                | PinCategory::Byte
                | PinCategory::Int
                | PinCategory::Float
                | PinCategory::Name
                | PinCategory::Object
                | PinCategory::Class
                | PinCategory::Interface
                | PinCategory::Delegate
        )
}

fn align(offset: usize, alignment: usize) -> usize {
    (offset + alignment - 1) / alignment * alignment
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub ty: PinType,
    pub flags: PropertyFlags,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rep_notify: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub size: usize,
    /// Signature function of a delegate property.
    #[serde(default)]
    pub signature_function: Option<String>,
}

impl Property {
    /// Creates a property for `ty`, failing when the type has no storage.
    pub fn new(name: impl Into<String>, ty: PinType) -> Result<Self> {
        let name = name.into();
        let (size, _) = storage_layout(&ty).ok_or_else(|| CompileError::InvalidType {
            name: name.clone(),
            ty: ty.to_string(),
        })?;
        let mut flags = PropertyFlags::empty();
        if is_zero_constructible(&ty) {
            flags |= PropertyFlags::ZERO_CONSTRUCTOR;
        }
        Ok(Self {
            name,
            ty,
            flags,
            category: String::new(),
            rep_notify: None,
            metadata: BTreeMap::new(),
            offset: 0,
            size,
            signature_function: None,
        })
    }

    pub fn is_parameter(&self) -> bool {
        self.flags.contains(PropertyFlags::PARM)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub flags: FunctionFlags,
    /// `Owner::Name` of the function this one overrides.
    #[serde(default)]
    pub super_function: Option<String>,
    /// Parameters first (in signature order), then locals.
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub num_parms: usize,
    #[serde(default)]
    pub parms_size: usize,
    #[serde(default)]
    pub return_value_offset: Option<usize>,
    #[serde(default)]
    pub frame_size: usize,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub script: Vec<ScriptOp>,
}

impl Function {
    pub fn new(name: impl Into<String>, flags: FunctionFlags) -> Self {
        Self {
            name: name.into(),
            flags,
            ..Default::default()
        }
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Property> + '_ {
        self.properties.iter().filter(|p| p.is_parameter())
    }

    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Appends a property, rejecting duplicate names.
    pub fn add_property(&mut self, property: Property) -> Result<()> {
        if self.find_property(&property.name).is_some() {
            return Err(CompileError::DuplicateField(property.name, self.name.clone()));
        }
        assert!(
            self.properties.len() < PROPERTY_SAFETY_LIMIT,
            "property chain of function '{}' is corrupt",
            self.name
        );
        self.properties.push(property);
        Ok(())
    }

    /// Computes the parameter frame and derived flags.
    pub fn link(&mut self) {
        let mut offset = 0;
        self.num_parms = 0;
        self.return_value_offset = None;
        let mut has_out_parms = false;

        for property in &mut self.properties {
            let (size, alignment) = storage_layout(&property.ty).unwrap_or((property.size, 1));
            offset = align(offset, alignment);
            property.offset = offset;
            property.size = size;
            offset += size;

            if property.flags.contains(PropertyFlags::PARM) {
                self.num_parms += 1;
                self.parms_size = offset;
                if property.flags.contains(PropertyFlags::RETURN_PARM) {
                    self.return_value_offset = Some(property.offset);
                }
                if property.flags.contains(PropertyFlags::OUT_PARM) {
                    has_out_parms = true;
                }
            }
        }
        if self.num_parms == 0 {
            self.parms_size = 0;
        }
        self.frame_size = offset;
        self.flags.set(FunctionFlags::HAS_OUT_PARMS, has_out_parms);
    }

    /// The `Parameters` half of a signature, used to compare overrides.
    pub fn signature(&self) -> Vec<(String, PinType, PropertyFlags)> {
        let relevant = PropertyFlags::PARM
            | PropertyFlags::OUT_PARM
            | PropertyFlags::RETURN_PARM
            | PropertyFlags::REFERENCE_PARM;
        self.parameters()
            .map(|p| (p.name.clone(), p.ty.clone(), p.flags & relevant))
            .collect()
    }
}

/// Values held by the class default object, in property order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultObject {
    pub values: Vec<(String, Value)>,
}

impl DefaultObject {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    #[serde(default)]
    pub super_class: Option<Arc<Class>>,
    #[serde(default)]
    pub flags: ClassFlags,
    /// Property chain; the head is the most recently linked property.
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default)]
    pub interfaces: Vec<Arc<Class>>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub properties_size: usize,
    #[serde(default)]
    pub num_replicated_properties: usize,
    #[serde(default)]
    pub default_object: Option<DefaultObject>,
    #[serde(default)]
    pub timelines: Vec<TimelineTemplate>,
    #[serde(default)]
    pub component_templates: Vec<ComponentTemplate>,
    #[serde(default)]
    pub construction_script: Option<SimpleConstructionScript>,
    /// Name of the Blueprint this class was compiled from.
    #[serde(default)]
    pub generated_by: Option<String>,
}

impl Class {
    pub fn new(name: impl Into<String>, super_class: Option<Arc<Class>>) -> Self {
        Self {
            name: name.into(),
            super_class,
            ..Default::default()
        }
    }

    /// Iterates this class and its ancestors, nearest first.
    pub fn hierarchy(&self) -> impl Iterator<Item = &Class> + '_ {
        std::iter::successors(Some(self), |class| class.super_class.as_deref())
    }

    pub fn is_child_of(&self, name: &str) -> bool {
        self.hierarchy().any(|class| class.name == name)
    }

    pub fn implements_interface(&self, name: &str) -> bool {
        self.hierarchy()
            .any(|class| class.interfaces.iter().any(|i| i.name == name))
    }

    pub fn find_own_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn find_own_property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Finds a property on this class or any ancestor.
    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.hierarchy().find_map(|class| class.find_own_property(name))
    }

    pub fn find_own_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn find_own_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.name == name)
    }

    /// Finds a function on this class or any ancestor, with its owner's name.
    pub fn find_function(&self, name: &str) -> Option<(&str, &Function)> {
        self.hierarchy().find_map(|class| {
            class
                .find_own_function(name)
                .map(|f| (class.name.as_str(), f))
        })
    }

    /// Finds a function declared by an interface implemented anywhere in the hierarchy.
    pub fn find_interface_function(&self, name: &str) -> Option<(&str, &Function)> {
        self.hierarchy()
            .flat_map(|class| class.interfaces.iter())
            .find_map(|iface| iface.find_function(name))
    }

    /// Names of every property and function visible on this class.
    pub fn member_names(&self) -> Vec<String> {
        self.hierarchy()
            .flat_map(|class| {
                class
                    .properties
                    .iter()
                    .map(|p| p.name.clone())
                    .chain(class.functions.iter().map(|f| f.name.clone()))
            })
            .collect()
    }

    /// Links a property at the head of the chain.
    pub fn link_added_property(&mut self, property: Property) -> Result<()> {
        if self.find_own_property(&property.name).is_some() {
            return Err(CompileError::DuplicateField(property.name, self.name.clone()));
        }
        assert!(
            self.properties.len() < PROPERTY_SAFETY_LIMIT,
            "property chain of class '{}' is corrupt",
            self.name
        );
        self.properties.insert(0, property);
        Ok(())
    }

    pub fn add_function(&mut self, function: Function) -> Result<()> {
        if self.find_own_function(&function.name).is_some() {
            return Err(CompileError::DuplicateField(function.name, self.name.clone()));
        }
        self.functions.push(function);
        Ok(())
    }

    /// Lays out member properties after the parent's and counts replicated ones.
    pub fn static_link(&mut self) {
        let mut offset = self
            .super_class
            .as_ref()
            .map_or(0, |parent| parent.properties_size);
        let mut replicated = 0;
        for property in &mut self.properties {
            let (size, alignment) = storage_layout(&property.ty).unwrap_or((property.size, 1));
            offset = align(offset, alignment);
            property.offset = offset;
            property.size = size;
            offset += size;
            if property.flags.contains(PropertyFlags::NET) {
                replicated += 1;
            }
        }
        self.properties_size = offset;
        self.num_replicated_properties = replicated;
    }

    /// Default values of every property in the hierarchy, parents first.
    pub fn inherited_defaults(&self) -> DefaultObject {
        let mut object = DefaultObject::default();
        let chain: Vec<&Class> = self.hierarchy().collect();
        for class in chain.into_iter().rev() {
            if let Some(defaults) = &class.default_object {
                for (name, value) in &defaults.values {
                    object.set(name, value.clone());
                }
            }
        }
        object
    }

    /// Multi-line dump of the class layout.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Class {} : {} [{:?}] ({} bytes)",
            self.name,
            self.super_class.as_ref().map_or("None", |c| c.name.as_str()),
            self.flags,
            self.properties_size
        )];
        for iface in &self.interfaces {
            lines.push(format!("  implements {}", iface.name));
        }
        for property in &self.properties {
            lines.push(format!(
                "  property {} : {} @{} [{:?}]",
                property.name, property.ty, property.offset, property.flags
            ));
        }
        for function in &self.functions {
            lines.push(format!(
                "  function {} [{:?}] parms={} ({} bytes), {} ops",
                function.name,
                function.flags,
                function.num_parms,
                function.parms_size,
                function.script.len()
            ));
            for property in &function.properties {
                lines.push(format!(
                    "    {} : {} @{} [{:?}]",
                    property.name, property.ty, property.offset, property.flags
                ));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_added_property_prepends() {
        let mut class = Class::new("C", None);
        class
            .link_added_property(Property::new("A", PinType::int()).unwrap())
            .unwrap();
        class
            .link_added_property(Property::new("B", PinType::float()).unwrap())
            .unwrap();
        let names: Vec<_> = class.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);

        let err = class
            .link_added_property(Property::new("A", PinType::int()).unwrap())
            .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateField(..)));
    }

    #[test]
    fn test_wildcard_has_no_storage() {
        let err = Property::new("Anything", PinType::wildcard()).unwrap_err();
        assert!(matches!(err, CompileError::InvalidType { .. }));
    }

    #[test]
    fn test_lookup_walks_hierarchy() {
        let mut base = Class::new("Actor", None);
        base.link_added_property(Property::new("Health", PinType::float()).unwrap())
            .unwrap();
        base.add_function(Function::new("ReceiveTick", FunctionFlags::BLUEPRINT_EVENT))
            .unwrap();
        let child = Class::new("MyActor_C", Some(Arc::new(base)));

        assert!(child.find_property("Health").is_some());
        assert!(child.find_own_property("Health").is_none());
        let (owner, _) = child.find_function("ReceiveTick").unwrap();
        assert_eq!(owner, "Actor");
        assert!(child.is_child_of("Actor"));
    }

    #[test]
    fn test_static_link_offsets_follow_parent() {
        let mut base = Class::new("Base", None);
        base.link_added_property(Property::new("Flag", PinType::boolean()).unwrap())
            .unwrap();
        base.static_link();
        assert_eq!(base.properties_size, 1);

        let mut child = Class::new("Child", Some(Arc::new(base)));
        child
            .link_added_property(Property::new("Count", PinType::int()).unwrap())
            .unwrap();
        child.static_link();
        assert_eq!(child.properties[0].offset, 4);
        assert_eq!(child.properties_size, 8);
    }

    #[test]
    fn test_function_link_computes_parms() {
        let mut function = Function::new("Add", FunctionFlags::empty());
        let mut a = Property::new("A", PinType::int()).unwrap();
        a.flags |= PropertyFlags::PARM;
        let mut ret = Property::new("ReturnValue", PinType::int()).unwrap();
        ret.flags |= PropertyFlags::PARM | PropertyFlags::OUT_PARM | PropertyFlags::RETURN_PARM;
        let local = Property::new("Temp", PinType::string()).unwrap();
        function.add_property(a).unwrap();
        function.add_property(ret).unwrap();
        function.add_property(local).unwrap();
        function.link();

        assert_eq!(function.num_parms, 2);
        assert_eq!(function.parms_size, 8);
        assert_eq!(function.return_value_offset, Some(4));
        assert!(function.flags.contains(FunctionFlags::HAS_OUT_PARMS));
        assert_eq!(function.frame_size, 24);
    }

    #[test]
    fn test_parse_default_values() {
        assert_eq!(Value::parse(&PinType::boolean(), "True"), Some(Value::Bool(true)));
        assert_eq!(Value::parse(&PinType::int(), "42"), Some(Value::Int(42)));
        assert_eq!(Value::parse(&PinType::int(), "forty"), None);
        assert_eq!(
            Value::parse(&PinType::structure("Vector"), "(X=1,Y=2.5,Z=-3)"),
            Some(Value::Vector([1.0, 2.5, -3.0]))
        );
        assert_eq!(
            Value::parse(&PinType::structure("Vector"), "1, 2, 3"),
            Some(Value::Vector([1.0, 2.0, 3.0]))
        );
        assert_eq!(
            Value::parse(&PinType::object("Actor"), "None"),
            Some(Value::Object(None))
        );
    }
}
