use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Result,
    runtime::{Context, LogEntry},
    workflow::{
        node::{Node, NodeType},
        template::resolve_json_value,
    },
};

use super::{Action, ActionOutput, parse_config, simulate_work};

#[derive(Deserialize, Debug, Clone, Default)]
struct TaskConfig {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

/// Generic `action` node: records the named operation with its resolved parameters.
#[derive(Debug, Clone)]
pub struct TaskAction;

#[async_trait]
impl Action for TaskAction {
    fn action_type(&self) -> NodeType {
        NodeType::Action
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": { "type": "string" },
                "params": { "type": "object" }
            }
        })
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        node: &Node,
        input: &Value,
    ) -> Result<ActionOutput> {
        let config: TaskConfig = parse_config(&self.schema(), &node.config)?;
        let action = config.action.unwrap_or_else(|| "noop".to_string());
        let params = match &config.params {
            Some(params) => resolve_json_value(&ctx, params)?,
            None => json!({}),
        };

        simulate_work(ctx.simulation().action_ms).await;

        Ok(ActionOutput::success(json!({
            "executed": true,
            "action": action,
            "params": params,
            "input": input,
        }))
        .with_log(LogEntry::info(format!("executed action {}", action))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeModel, runtime::test_context};

    #[tokio::test]
    async fn test_resolves_params() {
        let ctx = Arc::new(test_context());
        ctx.add_output("fetch".to_string(), json!({ "data": { "id": 42 } }));
        let node = Node::from(&NodeModel::new("save", "action").with_config(json!({
            "action": "store",
            "params": { "id": "{{#fetch.data.id#}}", "owner": "{{$recipient$}}" }
        })));

        let out = TaskAction.run(ctx, &node, &json!({ "fetch": {} })).await.unwrap();
        assert_eq!(out.output["action"], "store");
        assert_eq!(out.output["params"], json!({ "id": 42, "owner": "ops@example.com" }));
        assert_eq!(out.output["input"], json!({ "fetch": {} }));
    }

    #[tokio::test]
    async fn test_unresolved_reference_fails() {
        let ctx = Arc::new(test_context());
        let node = Node::from(&NodeModel::new("save", "action").with_config(json!({ "params": { "id": "{{#ghost.id#}}" } })));
        let err = TaskAction.run(ctx, &node, &json!({})).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }
}
