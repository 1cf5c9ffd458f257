use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    NodeflowError, Result,
    model::{ConnectionModel, NodeModel},
    workflow::RetryPolicy,
};

/// What the run does when a node fails after its retries.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorHandling {
    /// Abort the run; the node error becomes the workflow error.
    #[default]
    Stop,
    /// Record the failure and keep running the remaining nodes.
    Continue,
    /// Treat every node error as recoverable under the active retry policy.
    Retry,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSettings {
    /// deadline of a whole run in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub error_handling: ErrorHandling,
    /// overrides the engine retry policy for runs of this workflow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowModel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<NodeModel>,
    #[serde(default)]
    pub connections: Vec<ConnectionModel>,
    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub settings: WorkflowSettings,
}

impl WorkflowModel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str::<WorkflowModel>(s).map_err(|e| NodeflowError::Workflow(format!("{}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn node(
        mut self,
        node: NodeModel,
    ) -> Self {
        self.nodes.push(node);
        self
    }

    /// Connect `source` to `target`; the connection id is derived from both ends.
    pub fn connect(
        mut self,
        source: &str,
        target: &str,
    ) -> Self {
        let id = format!("{}->{}", source, target);
        self.connections.push(ConnectionModel::new(id, source, target));
        self
    }

    pub fn variable(
        mut self,
        key: &str,
        value: serde_json::Value,
    ) -> Self {
        self.variables.insert(key.to_string(), value);
        self
    }

    pub fn settings(
        mut self,
        settings: WorkflowSettings,
    ) -> Self {
        self.settings = settings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let text = r#"{
            "id": "wf-1",
            "name": "welcome",
            "nodes": [
                { "id": "start", "type": "trigger" },
                { "id": "mail", "type": "email", "config": { "to": "a@b.c" }, "outputs": ["sent"] }
            ],
            "connections": [{ "id": "c1", "source": "start", "target": "mail" }],
            "settings": { "error_handling": "continue", "timeout_ms": 5000 }
        }"#;
        let model = WorkflowModel::from_json(text).unwrap();
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.nodes[0].kind, "trigger");
        assert!(model.nodes[0].config.as_object().unwrap().is_empty());
        assert_eq!(model.nodes[1].outputs, vec!["sent".to_string()]);
        assert_eq!(model.connections[0].source, "start");
        assert_eq!(model.settings.error_handling, ErrorHandling::Continue);
        assert_eq!(model.settings.timeout_ms, Some(5000));
        assert!(model.settings.retry_policy.is_none());
    }

    #[test]
    fn test_from_json_invalid() {
        let err = WorkflowModel::from_json("{\"id\": 1}").unwrap_err();
        assert!(matches!(err, NodeflowError::Workflow(_)));
    }

    #[test]
    fn test_builder_connect() {
        let model = WorkflowModel::new("wf").node(NodeModel::new("a", "trigger")).node(NodeModel::new("b", "action")).connect("a", "b");
        assert_eq!(model.connections[0].id, "a->b");
    }
}
