//! # Class Synthesizer
//!
//! Builds the generated class: purges the previous one, synthesizes member
//! properties for variables, timelines and construction script components,
//! turns terminals into function or class properties, and finalizes flags,
//! layout and the class default object.

use super::function_context::{FunctionContext, TermId, TermKind};
use crate::blueprint::{Blueprint, BlueprintType, ComponentTemplate};
use crate::class::{Class, ClassFlags, DefaultObject, Function, Property, PropertyFlags, Value};
use crate::error::Result;
use crate::graph::{PinCategory, PinType, PN_RETURN_VALUE};
use crate::log::{MessageLog, ObjectRef, SourceToken};
use crate::schema::{MD_EXPOSE_ON_SPAWN, MD_HIDE_CATEGORIES};
use crate::session::SessionFlags;
use crate::transform::timeline::TIMELINE_COMPONENT_CLASS;
use std::mem::discriminant;

/// A property chain new properties can be linked into.
pub trait PropertyScope {
    fn scope_name(&self) -> &str;

    fn link_property(&mut self, property: Property) -> Result<()>;
}

impl PropertyScope for Class {
    fn scope_name(&self) -> &str {
        &self.name
    }

    fn link_property(&mut self, property: Property) -> Result<()> {
        self.link_added_property(property)
    }
}

impl PropertyScope for Function {
    fn scope_name(&self) -> &str {
        &self.name
    }

    fn link_property(&mut self, property: Property) -> Result<()> {
        self.add_property(property)
    }
}

/// Creates a property of type `ty` and links it into `scope`.
///
/// Fails with [`CompileError::InvalidType`](crate::error::CompileError) when
/// the type has no storage, and with `DuplicateField` on a name collision.
pub fn create_variable<S: PropertyScope + ?Sized>(
    scope: &mut S,
    name: &str,
    ty: &PinType,
    flags: PropertyFlags,
) -> Result<()> {
    let mut property = Property::new(name, ty.clone())?;
    property.flags |= flags;
    if ty.is_const {
        property.flags |= PropertyFlags::CONST_PARM;
    }
    scope.link_property(property)
}

/// Synthesizes a property for every terminal in `terms` that has none yet.
pub fn create_properties_from_list<S: PropertyScope + ?Sized>(
    scope: &mut S,
    ctx: &mut FunctionContext,
    terms: &[TermId],
    flags: PropertyFlags,
    log: &mut MessageLog,
) {
    let is_parameter = flags.contains(PropertyFlags::PARM);
    for id in terms {
        let term = ctx.term(*id).clone();
        if term.associated_property.is_some() {
            continue;
        }

        let mut property_flags = flags;
        if is_parameter {
            if term.kind == TermKind::Result {
                property_flags |= PropertyFlags::OUT_PARM;
                if term.name == PN_RETURN_VALUE {
                    property_flags |= PropertyFlags::RETURN_PARM;
                }
            }
            if term.passed_by_ref {
                property_flags |= PropertyFlags::OUT_PARM | PropertyFlags::REFERENCE_PARM;
            }
            if term.is_const {
                property_flags |= PropertyFlags::CONST_PARM;
            }
        }
        if term.kind == TermKind::EventGraphLocal && !term.save_persistent {
            property_flags |= PropertyFlags::TRANSIENT | PropertyFlags::DUPLICATE_TRANSIENT;
        }

        let mut ty = term.ty.clone();
        ty.is_reference = false;
        if let Err(err) = create_variable(scope, &term.name, &ty, property_flags) {
            let token = term
                .source
                .clone()
                .unwrap_or_else(|| SourceToken::new(ObjectRef::Function(ctx.function_name.clone()), term.name.clone()));
            log.error(
                &format!(
                    "Failed to create property {} in {} for @@: {}",
                    term.name,
                    scope.scope_name(),
                    err
                ),
                &[token],
            );
            continue;
        }
        if let Some(source) = &term.source {
            log.notify_intermediate_object_creation(ObjectRef::Property(term.name.clone()), source.object.clone());
        }
        ctx.term_mut(*id).associated_property = Some(term.name);
    }
}

/// Starts a fresh class for `blueprint`, carrying over the sub-objects other
/// objects may reference from the previously generated class.
///
/// Returns the new class and the old default object.
pub fn clean_and_sanitize_class(blueprint: &mut Blueprint) -> (Class, Option<DefaultObject>) {
    let mut class = Class::new(blueprint.generated_class_name(), Some(blueprint.parent_class.clone()));
    class.generated_by = Some(blueprint.name.clone());

    let old_defaults = match blueprint.generated_class.take() {
        Some(old) => {
            tracing::debug!(
                "[PBCC] Purging previous class '{}' ({} properties, {} functions)",
                old.name,
                old.properties.len(),
                old.functions.len()
            );
            class.component_templates = old.component_templates;
            class.timelines = old.timelines;
            class.construction_script = old.construction_script;
            old.default_object
        }
        None => None,
    };
    (class, old_defaults)
}

/// Synthesizes member properties for declared variables, timelines and
/// construction script components.
pub fn create_class_variables_from_blueprint(
    class: &mut Class,
    blueprint: &Blueprint,
    session: SessionFlags,
    log: &mut MessageLog,
) {
    // reverse order because linking prepends
    for variable in blueprint.new_variables.iter().rev() {
        let mut flags = variable.flags;
        if variable.rep_notify_func.is_some() {
            flags |= PropertyFlags::NET | PropertyFlags::REP_NOTIFY;
        }
        if let Err(err) = create_variable(class, &variable.name, &variable.ty, flags) {
            log.error(
                &format!("Failed to create property for variable {}: {}", variable.name, err),
                &[SourceToken::new(ObjectRef::Property(variable.name.clone()), variable.name.clone())],
            );
            continue;
        }
        if let Some(property) = class.find_own_property_mut(&variable.name) {
            property.category = variable.category.clone();
            property.rep_notify = variable.rep_notify_func.clone();
            property.metadata = variable.metadata.clone();
            if property.metadata.contains_key(MD_EXPOSE_ON_SPAWN) {
                if !property.flags.contains(PropertyFlags::BLUEPRINT_VISIBLE) {
                    log.warning(
                        &format!(
                            "Variable {} is exposed on spawn but is not visible to Blueprints",
                            variable.name
                        ),
                        &[SourceToken::new(ObjectRef::Property(variable.name.clone()), variable.name.clone())],
                    );
                }
                property.flags |= PropertyFlags::EXPOSE_ON_SPAWN;
            }
        }
    }

    for timeline in &blueprint.timelines {
        let mut members = vec![
            (timeline.name.clone(), PinType::object(TIMELINE_COMPONENT_CLASS)),
            (timeline.direction_property_name(), PinType::byte()),
        ];
        members.extend(
            timeline
                .data_tracks()
                .into_iter()
                .map(|(track, ty)| (timeline.track_property_name(&track), ty)),
        );
        for (name, ty) in members {
            let mut flags = PropertyFlags::BLUEPRINT_VISIBLE;
            if timeline.replicated {
                flags |= PropertyFlags::NET;
            }
            if let Err(err) = create_variable(class, &name, &ty, flags) {
                log.error(
                    &format!("Failed to create property for timeline {}: {}", timeline.name, err),
                    &[SourceToken::new(ObjectRef::Property(name.clone()), name.clone())],
                );
            }
        }
    }
    class.timelines = blueprint.timelines.clone();

    if let Some(scs) = &blueprint.construction_script {
        class.component_templates.clear();
        for node in scs.all_nodes() {
            let ty = PinType::object(node.component_class.clone());
            let flags = PropertyFlags::BLUEPRINT_VISIBLE | PropertyFlags::BLUEPRINT_READ_ONLY;
            if let Err(err) = create_variable(class, &node.variable_name, &ty, flags) {
                log.error(
                    &format!("Failed to create property for component {}: {}", node.variable_name, err),
                    &[SourceToken::new(
                        ObjectRef::Property(node.variable_name.clone()),
                        node.variable_name.clone(),
                    )],
                );
                continue;
            }
            let name = if session.suffix_component_templates {
                format!("{}_GEN_VARIABLE", node.variable_name)
            } else {
                node.variable_name.clone()
            };
            class.component_templates.push(ComponentTemplate {
                name,
                component_class: node.component_class.clone(),
            });
        }
        class.construction_script = Some(scs.clone());
    }
}

/// Class flags, interfaces and inherited metadata.
pub fn finalize_class_flags(class: &mut Class, blueprint: &Blueprint, log: &mut MessageLog) {
    let parent = blueprint.parent_class.clone();
    class.flags |= (parent.flags & ClassFlags::SCRIPT_INHERIT) | ClassFlags::PARSED | ClassFlags::COMPILED_FROM_BLUEPRINT;
    match blueprint.blueprint_type {
        BlueprintType::Const => class.flags |= ClassFlags::CONST,
        BlueprintType::MacroLibrary | BlueprintType::FunctionLibrary => {
            class.flags |= ClassFlags::ABSTRACT | ClassFlags::NOT_PLACEABLE
        }
        BlueprintType::Interface => class.flags |= ClassFlags::INTERFACE | ClassFlags::ABSTRACT,
        BlueprintType::Normal | BlueprintType::LevelScript => {}
    }

    for implemented in &blueprint.implemented_interfaces {
        let iface = &implemented.interface;
        if !iface.flags.contains(ClassFlags::INTERFACE) {
            log.warning(
                &format!("'{}' is not an interface and was not added to @@", iface.name),
                &[SourceToken::new(ObjectRef::Blueprint(blueprint.name.clone()), blueprint.name.clone())],
            );
            continue;
        }
        if !class.interfaces.iter().any(|i| i.name == iface.name) {
            class.interfaces.push(iface.clone());
        }
    }

    for (key, value) in &parent.metadata {
        class.metadata.entry(key.clone()).or_insert_with(|| value.clone());
    }
    if !blueprint.hide_categories.is_empty() {
        let mut hidden: Vec<String> = class
            .metadata
            .get(MD_HIDE_CATEGORIES)
            .map(|v| v.split(' ').filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();
        for category in &blueprint.hide_categories {
            if !hidden.contains(category) {
                hidden.push(category.clone());
            }
        }
        class.metadata.insert(MD_HIDE_CATEGORIES.to_string(), hidden.join(" "));
    }
}

/// Clears rep-notify references to functions that do not exist or take parameters.
pub fn validate_rep_notifies(class: &mut Class, log: &mut MessageLog) {
    let invalid: Vec<(String, String)> = class
        .properties
        .iter()
        .filter_map(|p| {
            let notify = p.rep_notify.as_ref()?;
            let valid = class
                .find_function(notify)
                .map_or(false, |(_, f)| f.num_parms == 0);
            (!valid).then(|| (p.name.clone(), notify.clone()))
        })
        .collect();
    for (property, notify) in invalid {
        log.warning(
            &format!(
                "OnRep function '{}' for property '{}' was not found or takes parameters, and was cleared",
                notify, property
            ),
            &[SourceToken::new(ObjectRef::Property(property.clone()), property.clone())],
        );
        if let Some(p) = class.find_own_property_mut(&property) {
            p.rep_notify = None;
            p.flags.remove(PropertyFlags::REP_NOTIFY);
        }
    }
}

/// Warns about multicast delegate properties left without a signature.
pub fn check_delegate_signatures(class: &Class, log: &mut MessageLog) {
    for property in &class.properties {
        if property.ty.category == PinCategory::MulticastDelegate && property.signature_function.is_none() {
            log.warning(
                &format!("Multicast delegate property {} has no signature function", property.name),
                &[SourceToken::new(ObjectRef::Property(property.name.clone()), property.name.clone())],
            );
        }
    }
}

/// Builds the default object: zero values, then the parent's defaults, then
/// the previous default object, then declared variable defaults.
///
/// When regenerating on load the previous default object wins over the
/// declared defaults.
pub fn build_default_object(
    class: &mut Class,
    blueprint: &Blueprint,
    old_defaults: Option<&DefaultObject>,
    is_regenerating_on_load: bool,
    log: &mut MessageLog,
) {
    let mut defaults = DefaultObject::default();
    for property in class.properties.iter().rev() {
        defaults.set(&property.name, Value::zero(&property.ty));
    }
    if let Some(parent) = &class.super_class {
        for (name, value) in parent.inherited_defaults().values {
            defaults.set(&name, value);
        }
    }

    let apply_old = |defaults: &mut DefaultObject| {
        let Some(old) = old_defaults else {
            return;
        };
        for (name, value) in &old.values {
            let Some(property) = class.find_own_property(name) else {
                continue;
            };
            if discriminant(value) == discriminant(&Value::zero(&property.ty)) {
                defaults.set(name, value.clone());
            }
        }
    };

    if is_regenerating_on_load {
        apply_declared_defaults(&mut defaults, class, blueprint, log);
        apply_old(&mut defaults);
    } else {
        apply_old(&mut defaults);
        apply_declared_defaults(&mut defaults, class, blueprint, log);
    }
    class.default_object = Some(defaults);
}

fn apply_declared_defaults(defaults: &mut DefaultObject, class: &Class, blueprint: &Blueprint, log: &mut MessageLog) {
    for variable in &blueprint.new_variables {
        if variable.default_value.is_empty() || class.find_own_property(&variable.name).is_none() {
            continue;
        }
        match Value::parse(&variable.ty, &variable.default_value) {
            Some(value) => defaults.set(&variable.name, value),
            None => log.warning(
                &format!(
                    "Failed to parse default value '{}' for variable {}; it keeps its zero value",
                    variable.default_value, variable.name
                ),
                &[SourceToken::new(ObjectRef::Property(variable.name.clone()), variable.name.clone())],
            ),
        }
    }
}
