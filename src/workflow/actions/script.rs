use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Result,
    runtime::{Context, LogEntry},
    workflow::node::{Node, NodeType},
};

use super::{Action, ActionOutput, parse_config, simulate_work};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
}

#[derive(Deserialize, Debug, Clone)]
struct ScriptConfig {
    language: Language,
    code: String,
}

/// Simulated script run: the code is accepted but not evaluated, and the
/// input becomes the script result.
#[derive(Debug, Clone)]
pub struct ScriptAction;

#[async_trait]
impl Action for ScriptAction {
    fn action_type(&self) -> NodeType {
        NodeType::Script
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "language": { "type": "string", "enum": ["javascript", "python"] },
                "code": { "type": "string" }
            },
            "required": ["language", "code"]
        })
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        node: &Node,
        input: &Value,
    ) -> Result<ActionOutput> {
        let config: ScriptConfig = parse_config(&self.schema(), &node.config)?;

        simulate_work(ctx.simulation().script_ms).await;

        Ok(ActionOutput::success(json!({
            "language": config.language,
            "executed": true,
            "result": input,
        }))
        .with_log(LogEntry::debug(format!("{} script of {} bytes executed", config.language.as_ref(), config.code.len()))))
    }
}
