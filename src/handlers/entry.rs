//! Function entry, event and function result handlers.

use super::flow::generate_simple_then_goto;
use super::{net_name, require_input_term, HandlerEnv, NodeHandler};
use crate::compiler::function_context::{FunctionContext, TermKind};
use crate::compiler::statement::Statement;
use crate::graph::{Direction, NodeId, PN_ENTRY_POINT};

pub struct FunctionEntryHandler;

impl NodeHandler for FunctionEntryHandler {
    fn register_nets(&self, ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, node: NodeId) {
        for pin in ctx.graph.filtered_pins(node, Direction::Output, false) {
            let Some((name, ty)) = ctx.graph.pin(pin).map(|p| (p.name.clone(), p.ty.clone())) else {
                continue;
            };
            let token = ctx.graph.pin_token(pin);
            let term = ctx.add_term(TermKind::Parameter, name, ty, Some(token));
            ctx.net_map.insert(pin, term);
        }
    }

    fn compile(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        if ctx.is_event_graph() {
            let entry_point = ctx
                .graph
                .find_pin(node, PN_ENTRY_POINT, Some(Direction::Output))
                .and_then(|pin| ctx.net_map.get(&pin).copied());
            match entry_point {
                Some(term) => ctx.append_statement(node, Statement::ComputedGoto(term)),
                None => env.log.error(
                    "Event graph entry @@ has no EntryPoint parameter",
                    &[ctx.graph.node_token(node)],
                ),
            }
        } else {
            generate_simple_then_goto(ctx, node);
        }
    }
}

/// Events store their parameters in class-scoped storage so the stub that
/// calls into the event graph can write them.
pub struct EventHandler;

impl NodeHandler for EventHandler {
    fn register_nets(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        if !ctx.is_event_graph() {
            env.log.error(
                "Event node @@ can only be placed in an event graph",
                &[ctx.graph.node_token(node)],
            );
            ctx.failed = true;
            return;
        }
        for pin in ctx.graph.filtered_pins(node, Direction::Output, false) {
            let name = net_name(ctx, env, pin);
            ctx.create_local_terminal_for_pin(pin, name);
        }
    }

    fn compile(&self, ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, node: NodeId) {
        generate_simple_then_goto(ctx, node);
    }
}

pub struct FunctionResultHandler;

impl NodeHandler for FunctionResultHandler {
    fn register_nets(&self, ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, node: NodeId) {
        for pin in ctx.graph.filtered_pins(node, Direction::Input, false) {
            let Some((name, ty, linked)) = ctx
                .graph
                .pin(pin)
                .map(|p| (p.name.clone(), p.ty.clone(), p.is_linked()))
            else {
                continue;
            };
            if ctx.find_result_term(&name).is_none() {
                let token = ctx.graph.pin_token(pin);
                ctx.add_term(TermKind::Result, name, ty, Some(token));
            }
            if !linked {
                ctx.register_literal(pin);
            }
        }
    }

    fn compile(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        for pin in ctx.graph.filtered_pins(node, Direction::Input, false) {
            let Some(name) = ctx.graph.pin(pin).map(|p| p.name.clone()) else {
                continue;
            };
            let (Some(lhs), Some(rhs)) = (ctx.find_result_term(&name), require_input_term(ctx, env, pin))
            else {
                continue;
            };
            ctx.append_statement(node, Statement::Assignment { lhs, rhs });
        }
        ctx.append_statement(node, Statement::GotoReturn);
    }
}
