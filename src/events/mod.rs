//! Event types for workflow execution.
//!
//! Events are published while a workflow runs to notify observers about
//! state changes, completions, errors, and logs. Every event carries a
//! snapshot of the record it describes, so observers never share state with
//! the run that produced it.

mod node;
mod workflow;

pub use node::*;
pub use workflow::*;

use crate::{
    runtime::{ExecutionId, LogEntry},
    workflow::NodeId,
};

/// Generic event wrapper.
#[derive(Debug, Clone)]
pub struct Event<T> {
    inner: T,
}

/// Top-level event type for workflow graph events.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// Workflow-level events (started, updated, completed, failed, cancelled).
    Workflow(WorkflowEvent),
    /// Node-level events (running, retrying, succeeded, failed).
    Node(NodeEvent),
}

/// Event message containing execution and node context.
#[derive(Debug, Clone)]
pub struct Message {
    /// Execution that generated this event.
    pub eid: ExecutionId,
    /// Node that generated this event (empty for workflow events).
    pub nid: NodeId,
    /// The actual event data.
    pub event: GraphEvent,
}

/// Log entry emitted during node execution.
#[derive(Debug, Clone)]
pub struct Log {
    /// Execution that generated this log.
    pub eid: ExecutionId,
    /// Node that generated this log.
    pub nid: NodeId,
    /// The entry as recorded on the node execution.
    pub entry: LogEntry,
}

impl<T> std::ops::Deref for Event<T>
where
    T: std::fmt::Debug + Clone,
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Event<T>
where
    T: std::fmt::Debug + Clone,
{
    pub fn new(inner: &T) -> Self {
        Self {
            inner: inner.clone(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl GraphEvent {
    pub fn is_complete(&self) -> bool {
        matches!(self, GraphEvent::Workflow(WorkflowEvent::Completed(_)))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GraphEvent::Workflow(WorkflowEvent::Failed(_)))
    }

    /// Completed, failed or cancelled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GraphEvent::Workflow(WorkflowEvent::Completed(_) | WorkflowEvent::Failed(_) | WorkflowEvent::Cancelled(_)))
    }

    pub fn name(&self) -> &str {
        match self {
            GraphEvent::Workflow(e) => e.str(),
            GraphEvent::Node(e) => e.str(),
        }
    }
}
