use std::{convert::Infallible, fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::model::NodeModel;

/// node id
pub type NodeId = String;

/// Kind of a workflow node.
///
/// The well known kinds have their own variant; any other type string is
/// kept verbatim in [`NodeType::Custom`] so that applications can register
/// actions for their own node types.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Trigger,
    Action,
    Email,
    Api,
    Database,
    Condition,
    Loop,
    Delay,
    Transform,
    Script,
    Other,
    Custom(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Trigger => "trigger",
            NodeType::Action => "action",
            NodeType::Email => "email",
            NodeType::Api => "api",
            NodeType::Database => "database",
            NodeType::Condition => "condition",
            NodeType::Loop => "loop",
            NodeType::Delay => "delay",
            NodeType::Transform => "transform",
            NodeType::Script => "script",
            NodeType::Other => "other",
            NodeType::Custom(name) => name,
        }
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self, NodeType::Trigger)
    }
}

impl FromStr for NodeType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "trigger" => NodeType::Trigger,
            "action" => NodeType::Action,
            "email" => NodeType::Email,
            "api" => NodeType::Api,
            "database" => NodeType::Database,
            "condition" => NodeType::Condition,
            "loop" => NodeType::Loop,
            "delay" => NodeType::Delay,
            "transform" => NodeType::Transform,
            "script" => NodeType::Script,
            "other" => NodeType::Other,
            custom => NodeType::Custom(custom.to_string()),
        })
    }
}

impl From<String> for NodeType {
    fn from(value: String) -> Self {
        match value.parse::<NodeType>() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for NodeType {
    fn from(value: &str) -> Self {
        NodeType::from(value.to_string())
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NodeType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime node representation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    /// node id
    pub id: NodeId,
    /// node display name
    pub name: String,
    /// node kind, selects the action that runs it
    pub node_type: NodeType,
    /// action configuration, checked against the action schema on deploy
    pub config: serde_json::Value,
    /// declared output ports
    pub outputs: Vec<String>,
    /// per-attempt timeout
    pub timeout: Option<Duration>,
}

impl From<&NodeModel> for Node {
    fn from(model: &NodeModel) -> Self {
        Self {
            id: model.id.clone(),
            name: if model.name.is_empty() {
                model.id.clone()
            } else {
                model.name.clone()
            },
            node_type: NodeType::from(model.kind.as_str()),
            config: model.config.clone(),
            outputs: model.outputs.clone(),
            timeout: model.timeout_ms.map(Duration::from_millis),
        }
    }
}
