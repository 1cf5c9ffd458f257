use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    NodeflowError, Result,
    runtime::{Context, LogEntry},
    workflow::{
        node::{Node, NodeType},
        template::{resolve_json_value, resolve_template},
    },
};

use super::{Action, ActionOutput, parse_config, simulate_work};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::VariantNames)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Deserialize, Debug, Clone)]
struct ApiConfig {
    url: String,
    #[serde(default)]
    method: HttpMethod,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<Value>,
    /// status the simulated endpoint answers with
    #[serde(default)]
    mock_status: Option<u16>,
}

/// Error code a failed response is reported with. The codes of transient
/// failures match the default retry policy.
fn status_code(status: u16) -> &'static str {
    match status {
        408 => "TIMEOUT",
        429 => "RATE_LIMITED",
        503 => "SERVICE_UNAVAILABLE",
        500..=599 => "SERVER_ERROR",
        _ => "HTTP_ERROR",
    }
}

/// Simulated HTTP call.
#[derive(Debug, Clone)]
pub struct ApiAction;

#[async_trait]
impl Action for ApiAction {
    fn action_type(&self) -> NodeType {
        NodeType::Api
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "minLength": 1 },
                "method": { "type": "string", "enum": <HttpMethod as strum::VariantNames>::VARIANTS },
                "headers": { "type": "object", "additionalProperties": { "type": "string" } },
                "body": {},
                "mock_status": { "type": "integer", "minimum": 100, "maximum": 599 }
            },
            "required": ["url"]
        })
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        node: &Node,
        input: &Value,
    ) -> Result<ActionOutput> {
        let config: ApiConfig = parse_config(&self.schema(), &node.config)?;
        let url = resolve_template(&ctx, &config.url)?;
        let body = match &config.body {
            Some(body) => resolve_json_value(&ctx, body)?,
            None => Value::Null,
        };

        simulate_work(ctx.simulation().api_ms).await;

        let status = config.mock_status.unwrap_or(200);
        if status >= 400 {
            return Err(NodeflowError::exception(status_code(status), format!("{} {} returned status {}", config.method.as_ref(), url, status)));
        }

        Ok(ActionOutput::success(json!({
            "status": status,
            "method": config.method,
            "url": url,
            "headers": config.headers,
            "body": body,
            "data": input,
        }))
        .with_log(LogEntry::info(format!("{} {} -> {}", config.method.as_ref(), url, status))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeModel, runtime::test_context};

    fn api(config: Value) -> Node {
        Node::from(&NodeModel::new("fetch", "api").with_config(config))
    }

    #[tokio::test]
    async fn test_successful_call() {
        let ctx = Arc::new(test_context());
        let node = api(json!({ "url": "https://api.example.com/users/{{$count$}}", "method": "POST", "body": { "to": "{{$recipient$}}" } }));

        let out = ApiAction.run(ctx, &node, &json!({ "t": { "id": 1 } })).await.unwrap();
        assert_eq!(out.output["status"], 200);
        assert_eq!(out.output["method"], "POST");
        assert_eq!(out.output["url"], "https://api.example.com/users/3");
        assert_eq!(out.output["body"], json!({ "to": "ops@example.com" }));
        assert_eq!(out.output["data"], json!({ "t": { "id": 1 } }));
    }

    #[tokio::test]
    async fn test_mock_status_maps_to_error_code() {
        for (status, code) in [(503, "SERVICE_UNAVAILABLE"), (429, "RATE_LIMITED"), (408, "TIMEOUT"), (500, "SERVER_ERROR"), (404, "HTTP_ERROR")] {
            let ctx = Arc::new(test_context());
            let err = ApiAction.run(ctx, &api(json!({ "url": "https://x.io", "mock_status": status })), &json!({})).await.unwrap_err();
            assert_eq!(err.code(), code, "status {}", status);
        }
    }

    #[test]
    fn test_schema_rejects_unknown_method() {
        assert!(ApiAction.validate(&json!({ "url": "https://x.io", "method": "FETCH" })).is_err());
        assert!(ApiAction.validate(&json!({ "url": "https://x.io", "method": "DELETE" })).is_ok());
    }
}
