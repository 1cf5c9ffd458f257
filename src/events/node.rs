use crate::{error::NodeError, runtime::NodeExecution};

#[derive(Debug, Clone)]
pub enum NodeEvent {
    Running(NodeExecution),
    /// A recoverable failure; the node sleeps `delay_ms` before attempt `retry_count + 1`.
    Retrying {
        execution: NodeExecution,
        error: NodeError,
        delay_ms: u64,
    },
    Succeeded(NodeExecution),
    Failed(NodeExecution),
}

impl NodeEvent {
    pub fn str(&self) -> &str {
        match self {
            NodeEvent::Running(_) => "Running",
            NodeEvent::Retrying {
                ..
            } => "Retrying",
            NodeEvent::Succeeded(_) => "Succeeded",
            NodeEvent::Failed(_) => "Failed",
        }
    }

    pub fn execution(&self) -> &NodeExecution {
        match self {
            NodeEvent::Running(e) | NodeEvent::Succeeded(e) | NodeEvent::Failed(e) => e,
            NodeEvent::Retrying {
                execution, ..
            } => execution,
        }
    }
}
