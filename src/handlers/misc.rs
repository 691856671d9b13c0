//! Comment and timeline handlers.

use super::{HandlerEnv, NodeHandler};
use crate::blueprint::TimelineTemplate;
use crate::compiler::function_context::FunctionContext;
use crate::graph::{Direction, NodeId, NodeKind, PN_DIRECTION};

pub struct CommentHandler;

impl NodeHandler for CommentHandler {
    fn register_nets(&self, _ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, _node: NodeId) {}

    fn compile(&self, _ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, _node: NodeId) {}
}

/// An expanded timeline only remains as the source of its track values,
/// which read the timeline's member properties.
pub struct TimelineHandler;

impl NodeHandler for TimelineHandler {
    fn register_nets(&self, ctx: &mut FunctionContext, env: &mut HandlerEnv<'_>, node: NodeId) {
        let Some(NodeKind::Timeline { timeline }) = ctx.graph.kind(node).cloned() else {
            return;
        };
        if !ctx.is_event_graph() {
            env.log.error(
                "Timeline node @@ can only be placed in an event graph",
                &[ctx.graph.node_token(node)],
            );
            ctx.failed = true;
            return;
        }

        let template = TimelineTemplate::new(timeline);
        for pin in ctx.graph.filtered_pins(node, Direction::Output, false) {
            let Some((pin_name, ty)) = ctx.graph.pin(pin).map(|p| (p.name.clone(), p.ty.clone())) else {
                continue;
            };
            let member = if pin_name == PN_DIRECTION {
                template.direction_property_name()
            } else {
                template.track_property_name(&pin_name)
            };
            if env.class.find_property(&member).is_none() {
                env.log.error(
                    &format!("Timeline track '{}' has no backing property for @@", pin_name),
                    &[ctx.graph.pin_token(pin)],
                );
                continue;
            }
            let token = ctx.graph.pin_token(pin);
            let term = ctx.find_or_add_variable_term(&member, ty, Some(token));
            ctx.net_map.insert(pin, term);
        }
    }

    fn compile(&self, _ctx: &mut FunctionContext, _env: &mut HandlerEnv<'_>, _node: NodeId) {}
}
