//! # Graph Schema
//!
//! Type rules and naming conventions shared by every compiler pass.

use crate::class::Value;
use crate::graph::{Direction, Graph, NodeId, Pin, PinCategory, PinId, PinType, PN_SELF};

pub const FN_USER_CONSTRUCTION_SCRIPT: &str = "UserConstructionScript";
pub const FN_EXECUTE_UBERGRAPH_BASE: &str = "ExecuteUbergraph";
pub const DELEGATE_SIGNATURE_SUFFIX: &str = "__DelegateSignature";

pub const MD_TOOLTIP: &str = "ToolTip";
pub const MD_CATEGORY: &str = "Category";
pub const MD_DEFAULT_TO_SELF: &str = "DefaultToSelf";
pub const MD_HIDE_PIN: &str = "HidePin";
pub const MD_CALL_IN_EDITOR: &str = "CallInEditor";
pub const MD_HIDE_CATEGORIES: &str = "HideCategories";
pub const MD_EXPOSE_ON_SPAWN: &str = "ExposeOnSpawn";
pub const MD_INTERNAL_USE_ONLY: &str = "BlueprintInternalUseOnly";
pub const MD_BLUEPRINT_TYPE: &str = "BlueprintType";

/// Schema of the graphs of one Blueprint.
#[derive(Debug, Clone)]
pub struct Schema {
    blueprint_name: String,
    class_name: String,
}

impl Schema {
    pub fn new(blueprint_name: impl Into<String>) -> Self {
        let blueprint_name = blueprint_name.into();
        Self {
            class_name: format!("{}_C", blueprint_name),
            blueprint_name,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Name of the consolidated event graph function.
    pub fn ubergraph_function_name(&self) -> String {
        format!("{}_{}", FN_EXECUTE_UBERGRAPH_BASE, self.blueprint_name)
    }

    pub fn delegate_signature_name(&self, delegate: &str) -> String {
        format!("{}{}", delegate, DELEGATE_SIGNATURE_SUFFIX)
    }

    /// Exec and self pins carry no user data.
    pub fn is_meta_pin(&self, pin: &Pin) -> bool {
        pin.is_meta()
    }

    pub fn find_self_pin(&self, graph: &Graph, node: NodeId) -> Option<PinId> {
        graph.find_pin(node, PN_SELF, Some(Direction::Input))
    }

    /// Whether a value of `output` may flow into `input`.
    pub fn are_types_compatible(&self, output: &PinType, input: &PinType) -> bool {
        if output.is_exec() || input.is_exec() {
            return output.is_exec() && input.is_exec();
        }
        if output.is_wildcard() || input.is_wildcard() {
            return true;
        }
        if output.is_array != input.is_array || output.category != input.category {
            return false;
        }
        match output.category {
            PinCategory::Object | PinCategory::Class | PinCategory::Interface => {
                output.is_self()
                    || input.is_self()
                    || input.sub_category_object.is_none()
                    || output.sub_category_object == input.sub_category_object
                    || output.sub_category_object.as_deref() == Some(self.class_name.as_str())
            }
            PinCategory::Struct | PinCategory::Byte => {
                output.sub_category_object == input.sub_category_object
            }
            _ => true,
        }
    }

    /// Describes why `value` is not a valid default for `ty`, if it is not.
    pub fn default_value_error(&self, ty: &PinType, value: &str) -> Option<String> {
        if value.is_empty() || ty.is_wildcard() || ty.is_exec() {
            return None;
        }
        match Value::parse(ty, value) {
            Some(_) => None,
            None => Some(format!("'{}' is not a valid {}", value, ty)),
        }
    }

    /// Nodes reached through the exec outputs of `node`, in pin order.
    pub fn exec_successors(&self, graph: &Graph, node: NodeId) -> Vec<NodeId> {
        graph
            .filtered_pins(node, Direction::Output, true)
            .into_iter()
            .flat_map(|pin| graph.linked_nodes(pin))
            .collect()
    }

    /// Nodes feeding data into `node`.
    pub fn data_dependencies(&self, graph: &Graph, node: NodeId) -> Vec<NodeId> {
        graph
            .filtered_pins(node, Direction::Input, false)
            .into_iter()
            .flat_map(|pin| graph.linked_nodes(pin))
            .filter(|dep| *dep != node)
            .collect()
    }
}
