use crate::runtime::WorkflowExecution;

/// Workflow-level lifecycle notifications, each with the execution as it
/// stood when the event was published.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    Started(WorkflowExecution),
    /// Published after every node finishes.
    Updated(WorkflowExecution),
    Completed(WorkflowExecution),
    Failed(WorkflowExecution),
    Cancelled(WorkflowExecution),
}

impl WorkflowEvent {
    pub fn str(&self) -> &str {
        match self {
            WorkflowEvent::Started(_) => "Started",
            WorkflowEvent::Updated(_) => "Updated",
            WorkflowEvent::Completed(_) => "Completed",
            WorkflowEvent::Failed(_) => "Failed",
            WorkflowEvent::Cancelled(_) => "Cancelled",
        }
    }

    pub fn execution(&self) -> &WorkflowExecution {
        match self {
            WorkflowEvent::Started(e) | WorkflowEvent::Updated(e) | WorkflowEvent::Completed(e) | WorkflowEvent::Failed(e) | WorkflowEvent::Cancelled(e) => e,
        }
    }
}
