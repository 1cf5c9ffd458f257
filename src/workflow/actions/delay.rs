use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Result,
    runtime::{Context, LogEntry},
    workflow::node::{Node, NodeType},
};

use super::{Action, ActionOutput, parse_config};

#[derive(Deserialize, Debug, Clone)]
struct DelayConfig {
    duration_ms: u64,
}

/// Pauses the run for a configured duration.
#[derive(Debug, Clone)]
pub struct DelayAction;

#[async_trait]
impl Action for DelayAction {
    fn action_type(&self) -> NodeType {
        NodeType::Delay
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "duration_ms": { "type": "integer", "minimum": 0 }
            },
            "required": ["duration_ms"]
        })
    }

    async fn run(
        &self,
        _: Arc<Context>,
        node: &Node,
        _: &Value,
    ) -> Result<ActionOutput> {
        let config: DelayConfig = parse_config(&self.schema(), &node.config)?;
        tokio::time::sleep(Duration::from_millis(config.duration_ms)).await;

        Ok(ActionOutput::success(json!({ "delayed_ms": config.duration_ms })).with_log(LogEntry::debug(format!("waited {} ms", config.duration_ms))))
    }
}
