use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    Result,
    runtime::{Context, LogEntry},
    workflow::node::{Node, NodeType},
};

use super::{Action, ActionOutput};

/// Entry point of a run; echoes the trigger payload of the execution context.
#[derive(Debug, Clone)]
pub struct TriggerAction;

#[async_trait]
impl Action for TriggerAction {
    fn action_type(&self) -> NodeType {
        NodeType::Trigger
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "event": { "type": "string", "description": "Name of the event that starts the workflow" }
            }
        })
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        node: &Node,
        _: &Value,
    ) -> Result<ActionOutput> {
        let event = node.config.get("event").and_then(Value::as_str).unwrap_or("manual");
        Ok(ActionOutput::success(ctx.trigger().clone()).with_log(LogEntry::info(format!("workflow triggered by {} event", event))))
    }
}
