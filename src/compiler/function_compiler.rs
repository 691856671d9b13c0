//! # Function Compiler
//!
//! The three per-function passes:
//!
//! - **Precompile** finds the entry node, validates and prunes the graph,
//!   runs node transforms, creates the class function with its flags and
//!   parameters, and schedules the nodes.
//! - **Compile** asks each node's handler for its statements and inlines pure
//!   node code into the impure nodes that consume it.
//! - **Postcompile** orders the nodes for fall-through, flattens the
//!   statements, resolves jumps, and finishes the function's flags and
//!   metadata against the function it overrides.

use super::class_synth::create_properties_from_list;
use super::function_context::{FunctionContext, NetNameMap, TermKind};
use super::scheduler::{create_execution_schedule, prune_isolated_nodes};
use super::statement::{GotoTarget, Statement};
use super::validation::validate_graph;
use crate::blueprint::BlueprintType;
use crate::class::{Class, Function, FunctionFlags, PropertyFlags};
use crate::graph::{Direction, NodeId, NodeKind, PN_WORLD_CONTEXT};
use crate::handlers::{HandlerEnv, HandlerRegistry};
use crate::log::MessageLog;
use crate::schema::{Schema, MD_DEFAULT_TO_SELF, MD_HIDE_PIN};
use crate::session::CompileOptions;
use std::collections::{HashMap, HashSet};

/// Compile-wide state shared by every function pass.
pub struct CompileEnv<'a> {
    pub registry: &'a HandlerRegistry,
    pub log: &'a mut MessageLog,
    pub schema: &'a Schema,
    pub class: &'a mut Class,
    pub class_net_names: &'a mut NetNameMap,
    pub options: &'a CompileOptions,
    pub blueprint_type: BlueprintType,
}

impl CompileEnv<'_> {
    fn handler_env(&mut self) -> HandlerEnv<'_> {
        HandlerEnv {
            log: &mut *self.log,
            schema: self.schema,
            class: &*self.class,
            class_net_names: &mut *self.class_net_names,
        }
    }
}

/// The function `name` overrides, with the name of the class declaring it.
pub fn find_overridden_function(class: &Class, name: &str) -> Option<(String, Function)> {
    class
        .super_class
        .as_deref()
        .and_then(|parent| parent.find_function(name))
        .or_else(|| class.find_interface_function(name))
        .map(|(owner, function)| (owner.to_string(), function.clone()))
}

/// Expands, validates and prunes the graph, then creates the function and its frame.
pub fn precompile_function(ctx: &mut FunctionContext, env: &mut CompileEnv<'_>) {
    tracing::debug!("[PBCC] Precompiling '{}'", ctx.function_name);

    let entries = ctx.graph.nodes_where(NodeKind::is_entry);
    let entry = match entries.as_slice() {
        [entry] => *entry,
        [] => {
            env.log.error(
                "Could not find a root node for the graph @@",
                &[ctx.graph.graph_token()],
            );
            ctx.failed = true;
            return;
        }
        [first, second, ..] => {
            env.log.error(
                "Expected only one function entry node in graph @@, but found both @@ and @@",
                &[
                    ctx.graph.graph_token(),
                    ctx.graph.node_token(*first),
                    ctx.graph.node_token(*second),
                ],
            );
            ctx.failed = true;
            return;
        }
    };
    ctx.entry_point = Some(entry);

    validate_graph(&ctx.graph, env.schema, env.log);

    let mut roots = vec![entry];
    roots.extend(
        ctx.graph
            .nodes_where(|kind| matches!(kind, NodeKind::Event(_) | NodeKind::Timeline { .. })),
    );
    prune_isolated_nodes(
        &mut ctx.graph,
        &roots,
        env.schema,
        env.options.save_intermediate_products,
    );

    check_self_pins(ctx, env);
    transform_nodes(ctx, env);

    if env.blueprint_type != BlueprintType::FunctionLibrary {
        let unused_world_context = ctx
            .graph
            .find_pin(entry, PN_WORLD_CONTEXT, Some(Direction::Output))
            .filter(|pin| ctx.graph.pin(*pin).map_or(false, |p| !p.is_linked()));
        if let Some(pin) = unused_world_context {
            ctx.graph.remove_pin(pin);
        }
    }

    let Some(overridden) = create_function(ctx, env) else {
        ctx.failed = true;
        return;
    };

    ctx.linear_execution_list = create_execution_schedule(&ctx.graph, env.schema, env.log);

    if let Some(NodeKind::FunctionEntry(data)) = ctx.graph.kind(entry).cloned() {
        for local in data.local_variables {
            let token = ctx.graph.node_token(entry);
            let id = ctx.add_term(TermKind::UserLocal, local.name, local.ty, Some(token));
            ctx.term_mut(id).default_value = local.default_value;
        }
    }

    let registry = env.registry;
    for node in ctx.linear_execution_list.clone() {
        let Some(tag) = ctx.graph.kind(node).map(NodeKind::tag) else {
            continue;
        };
        if let Some(handler) = registry.handler_for(tag) {
            handler.register_nets(ctx, &mut env.handler_env(), node);
        }
    }

    create_function_properties(ctx, env);

    if let Some((owner, parent_function)) = overridden {
        let signature = env
            .class
            .find_own_function(&ctx.function_name)
            .map(Function::signature);
        if signature.map_or(false, |s| s != parent_function.signature()) {
            env.log.error(
                &format!(
                    "The function signature of @@ does not match the function it overrides in {}",
                    owner
                ),
                &[ctx.graph.node_token(entry)],
            );
        }
    }
}

/// Calls into another class need an explicit target.
fn check_self_pins(ctx: &FunctionContext, env: &mut CompileEnv<'_>) {
    for node in ctx.graph.node_ids() {
        let Some(NodeKind::CallFunction(call)) = ctx.graph.kind(node) else {
            continue;
        };
        let Some(owner) = &call.owner else {
            continue;
        };
        if env.class.is_child_of(owner) || env.class.implements_interface(owner) {
            continue;
        }
        let Some(self_pin) = env.schema.find_self_pin(&ctx.graph, node) else {
            continue;
        };
        if ctx.graph.pin(self_pin).map_or(true, |p| p.is_linked()) {
            continue;
        }
        env.log.error(
            &format!(
                "This blueprint (self) is not a {}, therefore @@ must have a connection",
                owner
            ),
            &[ctx.graph.pin_token(self_pin)],
        );
    }
}

fn transform_nodes(ctx: &mut FunctionContext, env: &mut CompileEnv<'_>) {
    let registry = env.registry;
    for node in ctx.graph.node_ids() {
        let Some(tag) = ctx.graph.kind(node).map(NodeKind::tag) else {
            continue;
        };
        if let Some(handler) = registry.handler_for(tag) {
            handler.transform(ctx, &mut env.handler_env(), node);
        }
    }
}

/// Adds the class function. Returns `None` when the function cannot be
/// created, otherwise the function it overrides, if any.
fn create_function(
    ctx: &mut FunctionContext,
    env: &mut CompileEnv<'_>,
) -> Option<Option<(String, Function)>> {
    let name = ctx.function_name.clone();
    let entry = ctx.entry_point?;
    let entry_token = ctx.graph.node_token(entry);
    let entry_data = match ctx.graph.kind(entry) {
        Some(NodeKind::FunctionEntry(data)) => data.clone(),
        _ => Default::default(),
    };

    if env.class.find_own_function(&name).is_some() {
        env.log.error(
            &format!("Duplicate function named '{}' found in @@", name),
            &[entry_token],
        );
        return None;
    }
    if env.class.find_property(&name).is_some() {
        env.log.error(
            &format!("Function name '{}' of @@ is already used by a property", name),
            &[entry_token],
        );
        return None;
    }

    let mut flags = if ctx.is_event_graph() {
        FunctionFlags::FINAL
    } else if ctx.is_delegate_signature() {
        FunctionFlags::DELEGATE | FunctionFlags::MULTICAST_DELEGATE
    } else if ctx.flags.internal {
        FunctionFlags::empty()
    } else {
        FunctionFlags::PUBLIC | FunctionFlags::BLUEPRINT_CALLABLE
    };
    if ctx.stub.is_some() {
        flags |= FunctionFlags::EVENT;
    }

    let overridden = find_overridden_function(env.class, &name);
    let mut super_function = None;
    if let Some((owner, parent_function)) = &overridden {
        if !parent_function.flags.contains(FunctionFlags::BLUEPRINT_EVENT) {
            env.log.error(
                &format!(
                    "@@ cannot override '{}' declared in {}: it is not a BlueprintImplementableEvent",
                    name, owner
                ),
                &[entry_token],
            );
            return None;
        }
        let returns_values = parent_function
            .parameters()
            .any(|p| p.flags.intersects(PropertyFlags::OUT_PARM | PropertyFlags::RETURN_PARM));
        if ctx.stub.is_some() && returns_values {
            env.log.error(
                &format!(
                    "'{}' returns values and must be implemented as a function, not as an event (@@)",
                    name
                ),
                &[entry_token],
            );
            return None;
        }
        flags.remove(FunctionFlags::ACCESS_SPECIFIERS);
        flags |= parent_function.flags & (FunctionFlags::FUNC_INHERIT | FunctionFlags::ACCESS_SPECIFIERS);
        super_function = Some(format!("{}::{}", owner, name));
    }

    if entry_data.extra_flags.intersects(FunctionFlags::ACCESS_SPECIFIERS) {
        flags.remove(FunctionFlags::ACCESS_SPECIFIERS);
    }
    flags |= entry_data.extra_flags;
    if ctx.flags.const_function {
        flags |= FunctionFlags::CONST;
    }

    let mut function = Function::new(name.clone(), flags);
    function.super_function = super_function;
    if let Err(err) = env.class.add_function(function) {
        env.log.error(&format!("Failed to create function for @@: {}", err), &[entry_token]);
        return None;
    }
    ctx.mark_as_net_function(flags);
    tracing::trace!("[PBCC] Created function '{}' with flags {:?}", name, flags);
    Some(overridden)
}

fn create_function_properties(ctx: &mut FunctionContext, env: &mut CompileEnv<'_>) {
    let parameters = ctx.parameters.clone();
    let results = ctx.results.clone();
    let locals: Vec<_> = ctx.locals.iter().chain(&ctx.user_locals).copied().collect();
    let event_graph_locals = ctx.event_graph_locals.clone();

    if let Some(function) = env.class.find_own_function_mut(&ctx.function_name) {
        create_properties_from_list(function, ctx, &parameters, PropertyFlags::PARM, env.log);
        create_properties_from_list(function, ctx, &results, PropertyFlags::PARM, env.log);
        create_properties_from_list(function, ctx, &locals, PropertyFlags::empty(), env.log);
    }
    create_properties_from_list(
        &mut *env.class,
        ctx,
        &event_graph_locals,
        PropertyFlags::empty(),
        env.log,
    );
}

/// Schedules nodes and lowers them to statements through their handlers.
pub fn compile_function(ctx: &mut FunctionContext, env: &mut CompileEnv<'_>) {
    if ctx.failed || ctx.flags.interface_stub {
        return;
    }
    tracing::debug!(
        "[PBCC] Compiling '{}' ({} scheduled nodes)",
        ctx.function_name,
        ctx.linear_execution_list.len()
    );

    let registry = env.registry;
    let scheduled = ctx.linear_execution_list.len();
    for node in ctx.linear_execution_list.clone() {
        let Some(kind) = ctx.graph.kind(node).cloned() else {
            continue;
        };
        let Some(handler) = registry.handler_for(kind.tag()) else {
            env.log.error(
                &format!("Unexpected node type {} encountered at @@", kind.title()),
                &[ctx.graph.node_token(node)],
            );
            ctx.failed = true;
            return;
        };

        let ubergraph_entry = ctx.is_event_graph() && kind.is_entry();
        if !ubergraph_entry {
            if env.options.emit_node_comments {
                let comment = ctx
                    .graph
                    .node(node)
                    .map(|n| if n.comment.is_empty() { n.title() } else { n.comment.clone() })
                    .unwrap_or_default();
                ctx.append_statement(node, Statement::Comment(comment));
            }
            if ctx.flags.create_debug_data {
                ctx.append_statement(node, Statement::DebugSite(node));
            }
        }
        handler.compile(ctx, &mut env.handler_env(), node);
    }

    assert_eq!(
        ctx.linear_execution_list.len(),
        scheduled,
        "execution list of '{}' changed while compiling",
        ctx.function_name
    );
    inline_pure_nodes(ctx);
}

/// Moves pure node code into the impure nodes consuming it and drops pure
/// nodes from the execution list.
///
/// Each consumer gets its pure dependencies in schedule order, so a value is
/// always computed before anything reading it.
pub fn inline_pure_nodes(ctx: &mut FunctionContext) {
    let schedule_index: HashMap<NodeId, usize> = ctx
        .linear_execution_list
        .iter()
        .enumerate()
        .map(|(index, node)| (*node, index))
        .collect();
    let mut needed: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    let mut index = 0;
    while index < ctx.linear_execution_list.len() {
        let node = ctx.linear_execution_list[index];
        let antecedents = needed.get(&node).cloned();

        if !ctx.graph.is_pure(node) {
            if let Some(pure_nodes) = antecedents {
                for pure in pure_nodes.iter().rev() {
                    ctx.copy_and_prepend_statements(node, *pure);
                }
            }
            index += 1;
            continue;
        }

        if antecedents.is_some() || ctx.did_node_generate_code(node) {
            for pin in ctx.graph.filtered_pins(node, Direction::Output, false) {
                for consumer in ctx.graph.linked_nodes(pin) {
                    let list = needed.entry(consumer).or_default();
                    insert_in_schedule_order(list, node, &schedule_index);
                    for antecedent in antecedents.iter().flatten() {
                        insert_in_schedule_order(list, *antecedent, &schedule_index);
                    }
                }
            }
        }
        ctx.linear_execution_list.remove(index);
    }
}

fn insert_in_schedule_order(list: &mut Vec<NodeId>, node: NodeId, order: &HashMap<NodeId, usize>) {
    if list.contains(&node) {
        return;
    }
    let key = |n: &NodeId| order.get(n).copied().unwrap_or(usize::MAX);
    let position = list.partition_point(|n| key(n) <= key(&node));
    list.insert(position, node);
}

/// Orders the statement lists, resolves jumps and links the function.
pub fn postcompile_function(ctx: &mut FunctionContext, env: &mut CompileEnv<'_>) {
    if ctx.failed || ctx.flags.interface_stub {
        ctx.statements = vec![Statement::Return];
        ctx.node_labels.clear();
    } else {
        final_sort_linear_exec_list(ctx, env.schema);
        resolve_goto_fixups(ctx);
    }
    finish_function(ctx, env);
}

/// Reorders the execution list so each node is followed by its first exec
/// successor wherever possible, letting most jumps become fall-through.
pub fn final_sort_linear_exec_list(ctx: &mut FunctionContext, schema: &Schema) {
    let mut remaining: Vec<NodeId> = ctx.linear_execution_list.clone();
    let mut unsorted: HashSet<NodeId> = remaining.iter().copied().collect();
    let mut sorted = Vec::with_capacity(remaining.len());
    let mut stack: Vec<NodeId> = ctx.entry_point.into_iter().collect();

    while !unsorted.is_empty() {
        let start = loop {
            match stack.pop() {
                Some(node) if unsorted.contains(&node) => break Some(node),
                Some(_) => continue,
                None => break None,
            }
        };
        let mut next = match start {
            Some(node) => Some(node),
            None => {
                remaining.retain(|n| unsorted.contains(n));
                remaining.first().copied()
            }
        };

        while let Some(node) = next.take() {
            unsorted.remove(&node);
            sorted.push(node);
            let mut successors: Vec<NodeId> = schema
                .exec_successors(&ctx.graph, node)
                .into_iter()
                .filter(|n| unsorted.contains(n))
                .collect();
            if successors.is_empty() {
                break;
            }
            next = Some(successors.remove(0));
            stack.extend(successors.into_iter().rev());
        }
    }
    ctx.linear_execution_list = sorted;
}

/// Flattens per-node statements into the final list and turns pin jump
/// targets into statement indices.
///
/// A trailing jump to the code that comes next anyway is dropped first.
pub fn resolve_goto_fixups(ctx: &mut FunctionContext) {
    let list = ctx.linear_execution_list.clone();
    let has_code = |ctx: &FunctionContext, node: &NodeId| {
        ctx.statements_per_node.get(node).map_or(false, |s| !s.is_empty())
    };

    for index in (0..list.len()).rev() {
        let node = list[index];
        let next = list[index + 1..].iter().copied().find(|n| has_code(ctx, n));
        let redundant = match ctx.statements_per_node.get(&node).and_then(|s| s.last()) {
            Some(Statement::UnconditionalGoto(GotoTarget::Pin(pin))) => {
                let effective = ctx
                    .graph
                    .linked_nodes(*pin)
                    .first()
                    .and_then(|target| list.iter().position(|n| n == target))
                    .and_then(|position| list[position..].iter().copied().find(|n| has_code(ctx, n)));
                effective == next
            }
            Some(Statement::GotoReturn) => next.is_none() && !ctx.is_event_graph(),
            _ => false,
        };
        if redundant {
            if let Some(statements) = ctx.statements_per_node.get_mut(&node) {
                statements.pop();
            }
        }
    }

    let mut statements = Vec::new();
    let mut labels = HashMap::new();
    for node in &list {
        labels.insert(*node, statements.len());
        if let Some(code) = ctx.statements_per_node.get(node) {
            statements.extend(code.iter().cloned());
        }
    }
    let tail = statements.len();
    if ctx.is_event_graph() {
        statements.push(Statement::EndOfThread);
    }
    statements.push(Statement::Return);

    for statement in &mut statements {
        let Some(target) = statement.goto_target_mut() else {
            continue;
        };
        if let GotoTarget::Pin(pin) = *target {
            let resolved = ctx
                .graph
                .linked_nodes(pin)
                .first()
                .and_then(|node| labels.get(node).copied())
                .unwrap_or(tail);
            *target = GotoTarget::Resolved(resolved);
        }
    }

    ctx.statements = statements;
    ctx.node_labels = labels;
}

/// Links the parameter frame and settles flags and metadata.
fn finish_function(ctx: &mut FunctionContext, env: &mut CompileEnv<'_>) {
    let name = ctx.function_name.clone();
    let entry = ctx.entry_point;
    let entry_token = entry.map(|e| ctx.graph.node_token(e));
    let entry_metadata = match entry.and_then(|e| ctx.graph.kind(e)) {
        Some(NodeKind::FunctionEntry(data)) => data.metadata.clone(),
        _ => Default::default(),
    };
    let parameter_defaults: Vec<(String, String)> = entry
        .map(|e| ctx.graph.filtered_pins(e, Direction::Output, false))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|pin| ctx.graph.pin(pin))
        .filter(|p| !p.default_value.is_empty())
        .map(|p| (p.name.clone(), p.default_value.clone()))
        .collect();
    let has_world_context = entry
        .and_then(|e| ctx.graph.find_pin(e, PN_WORLD_CONTEXT, Some(Direction::Output)))
        .is_some();
    let overridden = find_overridden_function(env.class, &name);

    let Some(function) = env.class.find_own_function_mut(&name) else {
        return;
    };
    function.link();

    if !parameter_defaults.is_empty() {
        function.flags |= FunctionFlags::HAS_DEFAULTS;
        for (pin, value) in parameter_defaults {
            function.metadata.insert(format!("CPP_Default_{}", pin), value);
        }
    }
    function.metadata.extend(entry_metadata);
    if has_world_context {
        function
            .metadata
            .insert(MD_DEFAULT_TO_SELF.to_string(), PN_WORLD_CONTEXT.to_string());
        function
            .metadata
            .insert(MD_HIDE_PIN.to_string(), PN_WORLD_CONTEXT.to_string());
    }

    if let Some((owner, parent_function)) = overridden {
        for (key, value) in &parent_function.metadata {
            function
                .metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        let access = function.flags & FunctionFlags::ACCESS_SPECIFIERS;
        let parent_access = parent_function.flags & FunctionFlags::ACCESS_SPECIFIERS;
        if !parent_access.is_empty() && access != parent_access {
            env.log.error(
                &format!(
                    "Access specifier of @@ does not match the function it overrides in {}",
                    owner
                ),
                entry_token.as_slice(),
            );
        }

        let net = function.flags & FunctionFlags::NET_FUNC_FLAGS;
        let parent_net = parent_function.flags & FunctionFlags::NET_FUNC_FLAGS;
        if net != parent_net {
            env.log.warning(
                &format!(
                    "Replication settings of @@ differ from the function it overrides in {}; the inherited settings are used",
                    owner
                ),
                entry_token.as_slice(),
            );
            function.flags.remove(FunctionFlags::NET_FUNC_FLAGS);
            function.flags |= parent_net;
        }
    } else {
        function.flags |= FunctionFlags::EXEC;
        // private functions cannot be overridden
        if !ctx.is_event_graph() && !function.flags.contains(FunctionFlags::PRIVATE) {
            function.flags |= FunctionFlags::BLUEPRINT_EVENT;
        }
    }
    let flags = function.flags;
    ctx.mark_as_net_function(flags);
}
