//! Variable access handlers.

use super::flow::generate_simple_then_goto;
use super::{net_name, require_input_term, HandlerEnv, NodeHandler};
use crate::compiler::function_context::{FunctionContext, TermId, TermKind};
use crate::compiler::statement::Statement;
use crate::graph::{Direction, NodeId, NodeKind, PinId, VariableReference};

/// Resolves a variable to a user local of this function or a member of the class.
fn resolve_variable(
    ctx: &mut FunctionContext,
    env: &mut HandlerEnv<'_>,
    node: NodeId,
    variable: &VariableReference,
    report: bool,
) -> Option<TermId> {
    let is_user_local = ctx
        .user_locals
        .iter()
        .any(|id| ctx.term(*id).name == variable.name);
    if variable.owner.is_none() && !is_user_local && env.class.find_property(&variable.name).is_none() {
        if report {
            env.log.error(
                &format!("Could not find a variable named '{}' for @@", variable.name),
                &[ctx.graph.node_token(node)],
            );
        }
        return None;
    }
    let name = match &variable.owner {
        Some(owner) => format!("{}.{}", owner, variable.name),
        None => variable.name.clone(),
    };
    let token = ctx.graph.node_token(node);
    Some(ctx.find_or_add_variable_term(&name, variable.ty.clone(), Some(token)))
}

pub struct VariableGetHandler;

impl NodeHandler for VariableGetHandler {
    fn register_nets(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        let Some(NodeKind::VariableGet(variable)) = ctx.graph.kind(node).cloned() else {
            return;
        };
        let Some(term) = resolve_variable(ctx, env, node, &variable, true) else {
            return;
        };
        for pin in ctx.graph.filtered_pins(node, Direction::Output, false) {
            ctx.net_map.insert(pin, term);
        }
    }

    fn compile(&self, _ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, _node: NodeId) {}
}

pub struct VariableSetHandler;

impl VariableSetHandler {
    /// `(destination, value pin)` pairs written by the node.
    fn assignments(
        ctx: &mut FunctionContext,
        env: &mut HandlerEnv<'_>,
        node: NodeId,
        report: bool,
    ) -> Vec<(TermId, PinId)> {
        let Some(NodeKind::VariableSet(variable)) = ctx.graph.kind(node).cloned() else {
            return Vec::new();
        };
        let value_pins = ctx.graph.filtered_pins(node, Direction::Input, false);

        match variable {
            Some(variable) => {
                let Some(lhs) = resolve_variable(ctx, env, node, &variable, report) else {
                    return Vec::new();
                };
                value_pins.into_iter().map(|pin| (lhs, pin)).collect()
            }
            None => {
                // each pin names the member it writes
                let mut pairs = Vec::new();
                for pin in value_pins {
                    let Some(p) = ctx.graph.pin(pin) else {
                        continue;
                    };
                    let member = VariableReference::self_member(p.name.clone(), p.ty.clone());
                    if let Some(lhs) = resolve_variable(ctx, env, node, &member, report) {
                        pairs.push((lhs, pin));
                    }
                }
                pairs
            }
        }
    }
}

impl NodeHandler for VariableSetHandler {
    fn register_nets(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        for (_, pin) in Self::assignments(ctx, env, node, true) {
            if !ctx.graph.pin(pin).map_or(false, |p| p.is_linked()) {
                ctx.register_literal(pin);
            }
        }
    }

    fn compile(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        for (lhs, pin) in Self::assignments(ctx, env, node, false) {
            if let Some(rhs) = require_input_term(ctx, env, pin) {
                ctx.append_statement(node, Statement::Assignment { lhs, rhs });
            }
        }
        generate_simple_then_goto(ctx, node);
    }
}

pub struct TemporaryVariableHandler;

impl NodeHandler for TemporaryVariableHandler {
    fn register_nets(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        for pin in ctx.graph.filtered_pins(node, Direction::Output, false) {
            let name = net_name(ctx, env, pin);
            if let Some(term) = ctx.create_local_terminal_for_pin(pin, name) {
                // temporaries are not persisted between event threads
                if ctx.term(term).kind == TermKind::EventGraphLocal {
                    ctx.term_mut(term).save_persistent = false;
                }
            }
        }
    }

    fn compile(&self, _ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, _node: NodeId) {}
}
