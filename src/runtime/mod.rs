mod channel;
mod context;
mod record;

pub use channel::{Channel, ChannelEvent, ChannelOptions};
pub use context::Context;
pub use record::{ExecutionContext, ExecutionId, ExecutionStatus, LogEntry, LogLevel, NodeExecution, WorkflowExecution};

#[cfg(test)]
pub(crate) fn test_context() -> Context {
    use std::sync::Arc;

    use serde_json::json;

    let execution_context = ExecutionContext::new().with_variable("recipient", json!("ops@example.com")).with_variable("count", json!(3));
    Context::new("exec_test".to_string(), "wf_test", execution_context, Arc::new(Channel::default()), crate::SimulationConfig::instant())
}
