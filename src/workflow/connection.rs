//! Workflow connections between nodes.

use serde::{Deserialize, Serialize};

use crate::{model::ConnectionModel, workflow::node::NodeId};

/// Unique identifier for a connection within a workflow.
pub type ConnectionId = String;

/// Runtime connection carrying the output of `source` into the input of `target`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Unique connection identifier.
    pub id: ConnectionId,
    /// ID of the upstream node.
    pub source: NodeId,
    /// ID of the downstream node.
    pub target: NodeId,
}

impl From<&ConnectionModel> for Connection {
    fn from(model: &ConnectionModel) -> Self {
        Self {
            id: model.id.clone(),
            source: model.source.clone(),
            target: model.target.clone(),
        }
    }
}
