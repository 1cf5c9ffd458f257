use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    Result,
    runtime::Context,
    workflow::node::{Node, NodeType},
};

use super::{Action, ActionOutput};

/// Returns its input unchanged. Serves `other` nodes and stands in for node
/// types that have no registered action.
#[derive(Debug, Clone)]
pub struct PassThroughAction;

#[async_trait]
impl Action for PassThroughAction {
    fn action_type(&self) -> NodeType {
        NodeType::Other
    }

    fn schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn run(
        &self,
        _: Arc<Context>,
        _: &Node,
        input: &Value,
    ) -> Result<ActionOutput> {
        Ok(ActionOutput::success(input.clone()))
    }
}
