use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Result,
    runtime::{Context, LogEntry},
    workflow::{
        node::{Node, NodeType},
        template::{resolve_json_value, resolve_template},
    },
};

use super::{Action, ActionOutput, parse_config, simulate_work};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Deserialize, Debug, Clone)]
struct DatabaseConfig {
    query: String,
    #[serde(default)]
    operation: Operation,
    #[serde(default)]
    params: Vec<Value>,
}

/// Simulated database statement. Reads return no rows, writes report one affected row.
#[derive(Debug, Clone)]
pub struct DatabaseAction;

#[async_trait]
impl Action for DatabaseAction {
    fn action_type(&self) -> NodeType {
        NodeType::Database
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "minLength": 1 },
                "operation": { "type": "string", "enum": <Operation as strum::VariantNames>::VARIANTS },
                "params": { "type": "array" }
            },
            "required": ["query"]
        })
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        node: &Node,
        _: &Value,
    ) -> Result<ActionOutput> {
        let config: DatabaseConfig = parse_config(&self.schema(), &node.config)?;
        let query = resolve_template(&ctx, &config.query)?;
        let params = config.params.iter().map(|p| resolve_json_value(&ctx, p)).collect::<Result<Vec<_>>>()?;

        simulate_work(ctx.simulation().database_ms).await;

        let affected_rows = match config.operation {
            Operation::Select => 0,
            _ => 1,
        };
        Ok(ActionOutput::success(json!({
            "operation": config.operation,
            "query": query,
            "params": params,
            "rows": [],
            "row_count": 0,
            "affected_rows": affected_rows,
        }))
        .with_log(LogEntry::debug(format!("{} statement executed", config.operation.as_ref()))))
    }
}
