use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    NodeflowError, Result,
    runtime::{Context, LogEntry},
    workflow::{
        consts::INVALID_CONFIG,
        node::{Node, NodeType},
        template::resolve_template,
    },
};

use super::{Action, ActionOutput, parse_config, simulate_work};

#[derive(Deserialize, Debug, Clone)]
struct EmailConfig {
    to: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    cc: Vec<String>,
}

/// Simulated mail delivery.
#[derive(Debug, Clone)]
pub struct EmailAction;

#[async_trait]
impl Action for EmailAction {
    fn action_type(&self) -> NodeType {
        NodeType::Email
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "to": { "type": "string" },
                "subject": { "type": "string" },
                "body": { "type": "string" },
                "cc": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["to"]
        })
    }

    async fn run(
        &self,
        ctx: Arc<Context>,
        node: &Node,
        _: &Value,
    ) -> Result<ActionOutput> {
        let config: EmailConfig = parse_config(&self.schema(), &node.config)?;

        let to = resolve_template(&ctx, &config.to)?;
        if to.trim().is_empty() {
            return Err(NodeflowError::exception(INVALID_CONFIG, "email recipient is empty"));
        }
        let subject = resolve_template(&ctx, &config.subject)?;
        let body = config.body.as_deref().map(|b| resolve_template(&ctx, b)).transpose()?;
        let cc = config.cc.iter().map(|c| resolve_template(&ctx, c)).collect::<Result<Vec<_>>>()?;

        simulate_work(ctx.simulation().email_ms).await;

        let message_id = format!("msg_{}_{}", ctx.eid(), node.id);
        Ok(ActionOutput::success(json!({
            "sent": true,
            "to": to,
            "cc": cc,
            "subject": subject,
            "body": body,
            "message_id": message_id,
        }))
        .with_log(LogEntry::info(format!("email sent to {}", to)).with_data(json!({ "message_id": message_id }))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeModel, runtime::test_context};

    #[tokio::test]
    async fn test_sends_to_resolved_recipient() {
        let ctx = Arc::new(test_context());
        let node = Node::from(&NodeModel::new("notify", "email").with_config(json!({ "to": "{{$recipient$}}", "subject": "{{$count$}} new orders", "body": "Hello {{$recipient$}}" })));

        let out = EmailAction.run(ctx, &node, &json!({})).await.unwrap();
        assert_eq!(out.output["sent"], json!(true));
        assert_eq!(out.output["to"], "ops@example.com");
        assert_eq!(out.output["subject"], "3 new orders");
        assert_eq!(out.output["body"], "Hello ops@example.com");
        assert_eq!(out.output["message_id"], "msg_exec_test_notify");
        assert_eq!(out.logs[0].message, "email sent to ops@example.com");
    }

    #[tokio::test]
    async fn test_empty_recipient_is_invalid() {
        let ctx = Arc::new(test_context());
        let node = Node::from(&NodeModel::new("notify", "email").with_config(json!({ "to": "  " })));
        let err = EmailAction.run(ctx, &node, &json!({})).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }
}
