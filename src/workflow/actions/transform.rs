use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    Result,
    runtime::Context,
    workflow::{
        node::{Node, NodeType},
        template::resolve_json_value,
    },
};

use super::{Action, ActionOutput};

/// Builds a new object from a `mapping` of templates; passes the input through without one.
#[derive(Debug, Clone)]
pub struct TransformAction;

#[async_trait]
impl Action for TransformAction {
    fn action_type(&self) -> NodeType {
        NodeType::Transform
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "mapping": { "type": "object" }
            }
        })
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        node: &Node,
        input: &Value,
    ) -> Result<ActionOutput> {
        self.validate(&node.config)?;
        let output = match node.config.get("mapping") {
            Some(mapping) if mapping.as_object().is_some_and(|m| !m.is_empty()) => resolve_json_value(&ctx, mapping)?,
            _ => input.clone(),
        };
        Ok(ActionOutput::success(output))
    }
}
