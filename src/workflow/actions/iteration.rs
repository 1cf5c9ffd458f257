use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Result,
    runtime::{Context, LogEntry},
    workflow::{
        node::{Node, NodeType},
        template::lookup_path,
    },
};

use super::{Action, ActionOutput, parse_config};

#[derive(Deserialize, Debug, Clone, Default)]
struct LoopConfig {
    /// dotted path into the input; the first array in the input when absent
    #[serde(default)]
    items: Option<String>,
    #[serde(default)]
    max_iterations: Option<usize>,
}

/// Counts the items a loop would visit. Bodies are not re-run; the items are
/// handed downstream as the node output.
#[derive(Debug, Clone)]
pub struct LoopAction;

#[async_trait]
impl Action for LoopAction {
    fn action_type(&self) -> NodeType {
        NodeType::Loop
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "items": { "type": "string" },
                "max_iterations": { "type": "integer", "minimum": 0 }
            }
        })
    }

    async fn run(
        &self,
        _: Arc<Context>,
        node: &Node,
        input: &Value,
    ) -> Result<ActionOutput> {
        let config: LoopConfig = parse_config(&self.schema(), &node.config)?;

        let found = match &config.items {
            Some(path) => lookup_path(input, path).and_then(Value::as_array),
            None => input.as_object().and_then(|upstream| upstream.values().find_map(Value::as_array)),
        };

        let Some(items) = found else {
            return Ok(ActionOutput::success(json!({ "iterations": 0, "items": [] })).with_log(LogEntry::warn("no items to iterate over")));
        };

        let limit = config.max_iterations.unwrap_or(items.len()).min(items.len());
        let items = &items[..limit];
        Ok(ActionOutput::success(json!({ "iterations": items.len(), "items": items })).with_log(LogEntry::debug(format!("iterated over {} items", items.len()))))
    }
}
