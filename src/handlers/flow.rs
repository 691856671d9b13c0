//! Control-flow handlers.

use super::{require_input_term, HandlerEnv, NodeHandler};
use crate::compiler::function_context::FunctionContext;
use crate::compiler::statement::{GotoTarget, Statement};
use crate::graph::{Direction, NodeId, PN_CONDITION, PN_ELSE, PN_THEN};

/// Jumps to whatever the `then` pin is wired to, or ends the function /
/// event thread when it is unwired.
pub fn generate_simple_then_goto(ctx: &mut FunctionContext, node: NodeId) {
    let then = ctx.graph.find_pin(node, PN_THEN, Some(Direction::Output));
    let linked = then.map_or(false, |pin| {
        ctx.graph.pin(pin).map_or(false, |p| p.is_linked())
    });

    let statement = match then {
        Some(pin) if linked => Statement::UnconditionalGoto(GotoTarget::Pin(pin)),
        _ if ctx.is_event_graph() => Statement::EndOfThread,
        _ => Statement::GotoReturn,
    };
    ctx.append_statement(node, statement);
}

pub struct BranchHandler;

impl NodeHandler for BranchHandler {
    fn compile(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        let (Some(condition), Some(then), Some(otherwise)) = (
            ctx.graph.find_pin(node, PN_CONDITION, Some(Direction::Input)),
            ctx.graph.find_pin(node, PN_THEN, Some(Direction::Output)),
            ctx.graph.find_pin(node, PN_ELSE, Some(Direction::Output)),
        ) else {
            env.log.error("Branch node @@ is missing pins", &[ctx.graph.node_token(node)]);
            return;
        };
        let Some(condition) = require_input_term(ctx, env, condition) else {
            return;
        };

        ctx.append_statement(
            node,
            Statement::GotoIfNot {
                condition,
                target: GotoTarget::Pin(otherwise),
            },
        );
        ctx.append_statement(node, Statement::UnconditionalGoto(GotoTarget::Pin(then)));
    }
}

/// Reroute nodes are collapsed before scheduling.
pub struct KnotHandler;

impl NodeHandler for KnotHandler {
    fn transform(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        let graph = &mut ctx.graph;
        let (Some(input), Some(output)) = (
            graph.find_pin(node, "InputPin", Some(Direction::Input)),
            graph.find_pin(node, "OutputPin", Some(Direction::Output)),
        ) else {
            return;
        };

        let sources = graph.links_of(input);
        let targets = graph.links_of(output);
        let (default_value, default_object) = graph
            .pin(input)
            .map(|p| (p.default_value.clone(), p.default_object.clone()))
            .unwrap_or_default();

        for target in targets {
            graph.break_link(output, target);
            if sources.is_empty() {
                if let Some(pin) = graph.pin_mut(target) {
                    pin.default_value = default_value.clone();
                    pin.default_object = default_object.clone();
                }
            }
            for source in &sources {
                if let Err(err) = graph.make_link(*source, target) {
                    env.log.error(
                        &format!("Failed to collapse reroute node @@: {}", err),
                        &[graph.node_token(node)],
                    );
                }
            }
        }
        graph.remove_node(node);
    }

    fn register_nets(&self, _ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, _node: NodeId) {}

    fn compile(&self, _ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, _node: NodeId) {}
}
