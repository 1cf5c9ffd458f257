//! Execution records.
//!
//! A [`WorkflowExecution`] is created when a run starts and owns one
//! [`NodeExecution`] per node that started, in execution order. Together with
//! the log entries they hold, the records describe everything a run did,
//! including each retry and its delay.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    NodeflowError,
    error::NodeError,
    utils,
    workflow::{Node, NodeId, NodeType},
};

/// execution id
pub type ExecutionId = String;

/// Status of a workflow execution or of a single node execution.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
    Retrying,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum::AsRefStr, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            data: None,
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn with_data(
        mut self,
        data: Value,
    ) -> Self {
        self.data = Some(data);
        self
    }
}

/// Variable bindings and trigger payload available to the nodes of a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    /// returned as the output of trigger nodes
    #[serde(default = "empty_object")]
    pub trigger: Value,
}

fn empty_object() -> Value {
    json!({})
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            variables: HashMap::new(),
            trigger: empty_object(),
        }
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trigger(
        mut self,
        trigger: Value,
    ) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_variable(
        mut self,
        key: &str,
        value: Value,
    ) -> Self {
        self.variables.insert(key.to_string(), value);
        self
    }

    /// Workflow variables overlaid by the bindings of this context.
    pub(crate) fn merged_over(
        &self,
        defaults: &HashMap<String, Value>,
    ) -> Self {
        let mut variables = defaults.clone();
        variables.extend(self.variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            variables,
            trigger: self.trigger.clone(),
        }
    }
}

/// Record of a single node run, including all of its retries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeExecution {
    pub id: String,
    pub node_id: NodeId,
    pub node_type: NodeType,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub input: Value,
    pub output: Option<Value>,
    /// retries performed after the first attempt
    pub retry_count: u32,
    pub logs: Vec<LogEntry>,
    pub error: Option<NodeError>,
}

impl NodeExecution {
    pub fn new(
        id: String,
        node: &Node,
        input: Value,
    ) -> Self {
        Self {
            id,
            node_id: node.id.clone(),
            node_type: node.node_type.clone(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            input,
            output: None,
            retry_count: 0,
            logs: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn finish(
        &mut self,
        status: ExecutionStatus,
    ) {
        let now = Utc::now();
        self.status = status;
        self.ended_at = Some(now);
        self.duration_ms = Some(utils::time::elapsed_millis(self.started_at, now));
    }
}

/// Record of one workflow run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowExecution {
    pub id: ExecutionId,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    /// node executions in the order they ran
    pub node_executions: Vec<NodeExecution>,
    pub context: ExecutionContext,
    pub error: Option<NodeflowError>,
}

impl WorkflowExecution {
    pub fn new(
        id: ExecutionId,
        workflow_id: &str,
        context: ExecutionContext,
    ) -> Self {
        Self {
            id,
            workflow_id: workflow_id.to_string(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            node_executions: Vec::new(),
            context,
            error: None,
        }
    }

    pub(crate) fn finish(
        &mut self,
        status: ExecutionStatus,
        error: Option<NodeflowError>,
    ) {
        let now = Utc::now();
        self.status = status;
        self.error = error;
        self.ended_at = Some(now);
        self.duration_ms = Some(utils::time::elapsed_millis(self.started_at, now));
    }

    /// The record of `nid`, if that node ran.
    pub fn node_execution(
        &self,
        nid: &str,
    ) -> Option<&NodeExecution> {
        self.node_executions.iter().find(|n| n.node_id == nid)
    }

    /// Ids of the nodes that ran, in execution order.
    pub fn executed_node_ids(&self) -> Vec<&str> {
        self.node_executions.iter().map(|n| n.node_id.as_str()).collect()
    }

    pub fn failed_nodes(&self) -> Vec<&NodeExecution> {
        self.node_executions.iter().filter(|n| n.status == ExecutionStatus::Failed).collect()
    }
}
