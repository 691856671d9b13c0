//! Function call and array construction handlers.

use super::flow::generate_simple_then_goto;
use super::{require_input_term, HandlerEnv, NodeHandler};
use crate::compiler::function_context::FunctionContext;
use crate::compiler::statement::Statement;
use crate::graph::{Direction, NodeId, NodeKind, PN_RETURN_VALUE};

pub struct CallFunctionHandler;

impl NodeHandler for CallFunctionHandler {
    fn compile(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        let Some(NodeKind::CallFunction(call)) = ctx.graph.kind(node).cloned() else {
            return;
        };

        let target = match env.schema.find_self_pin(&ctx.graph, node) {
            Some(pin) if ctx.graph.pin(pin).map_or(false, |p| p.is_linked()) => {
                ctx.input_term(pin)
            }
            _ => None,
        };

        let mut args = Vec::new();
        for pin in ctx.graph.filtered_pins(node, Direction::Input, false) {
            if ctx.graph.pin(pin).map_or(true, |p| p.is_self()) {
                continue;
            }
            match require_input_term(ctx, env, pin) {
                Some(term) => args.push(term),
                None => return,
            }
        }

        let mut result = None;
        for pin in ctx.graph.filtered_pins(node, Direction::Output, false) {
            let is_return = ctx.graph.pin(pin).map_or(false, |p| p.name == PN_RETURN_VALUE);
            let Some(term) = ctx.net_map.get(&pin).copied() else {
                env.log.error(
                    "Output @@ has no storage registered",
                    &[ctx.graph.pin_token(pin)],
                );
                return;
            };
            if is_return {
                result = Some(term);
            } else {
                args.push(term);
            }
        }

        ctx.append_statement(
            node,
            Statement::CallFunction {
                function: call.function.clone(),
                target,
                args,
                result,
            },
        );

        if !call.pure {
            generate_simple_then_goto(ctx, node);
        }
    }
}

pub struct MakeArrayHandler;

impl NodeHandler for MakeArrayHandler {
    fn compile(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        let Some(array) = ctx
            .graph
            .find_pin(node, "Array", Some(Direction::Output))
            .and_then(|pin| ctx.net_map.get(&pin).copied())
        else {
            env.log.error("Make Array node @@ has no output storage", &[ctx.graph.node_token(node)]);
            return;
        };

        let mut elements = Vec::new();
        for pin in ctx.graph.filtered_pins(node, Direction::Input, false) {
            match require_input_term(ctx, env, pin) {
                Some(term) => elements.push(term),
                None => return,
            }
        }
        ctx.append_statement(node, Statement::CreateArray { array, elements });
    }
}
