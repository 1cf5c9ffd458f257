//! Workflow dispatcher for running the nodes of one execution.
//!
//! The dispatcher is responsible for:
//! - Ordering the workflow graph
//! - Running nodes one at a time, each with the outputs of its upstream nodes
//! - Honouring cancellation, the run deadline and the error handling mode
//! - Publishing workflow lifecycle events

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    NodeflowError, Result,
    events::{GraphEvent, WorkflowEvent},
    model::ErrorHandling,
    runtime::{Context, ExecutionStatus, WorkflowExecution},
    workflow::{RetryPolicy, Workflow, execution_order},
};

use super::{Deadline, NodeExecutor};

/// Workflow execution dispatcher.
///
/// A dispatcher drives exactly one run and is consumed by [`Dispatcher::run`].
pub(crate) struct Dispatcher {
    /// Execution context with variables and outputs.
    ctx: Arc<Context>,
    /// The workflow graph to execute.
    workflow: Arc<Workflow>,
    /// Runs single nodes with retry.
    executor: NodeExecutor,
    /// Retry policy in effect for this run.
    policy: RetryPolicy,
    /// Checked before every node.
    token: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        ctx: Arc<Context>,
        workflow: Arc<Workflow>,
        executor: NodeExecutor,
        policy: RetryPolicy,
        token: CancellationToken,
    ) -> Self {
        Self {
            ctx,
            workflow,
            executor,
            policy,
            token,
        }
    }

    pub fn eid(&self) -> &str {
        self.ctx.eid()
    }

    /// Runs the workflow to a terminal state.
    ///
    /// A workflow without a trigger node or with a cycle is rejected before any
    /// node runs. Every other outcome, including node failures, cancellation
    /// and an elapsed deadline, is reported in the returned record.
    pub async fn run(self) -> Result<WorkflowExecution> {
        if !self.workflow.has_trigger() {
            return Err(NodeflowError::NoTriggerNode);
        }
        let order = execution_order(&self.workflow)?;

        let settings = self.workflow.settings();
        let mode = settings.error_handling;
        let deadline = settings.timeout_ms.map(Deadline::after);

        let mut execution = WorkflowExecution::new(self.ctx.eid().to_string(), self.workflow.id(), self.ctx.execution_context().clone());
        info!(eid = self.eid(), workflow = self.workflow.id(), nodes = order.len(), "execution started");
        self.publish(WorkflowEvent::Started(execution.clone()));

        for nid in order {
            if self.token.is_cancelled() {
                info!(eid = self.eid(), next = nid.as_str(), "execution cancelled");
                execution.finish(ExecutionStatus::Cancelled, Some(NodeflowError::Cancelled));
                self.publish(WorkflowEvent::Cancelled(execution.clone()));
                return Ok(execution);
            }

            if let Some(deadline) = deadline.filter(Deadline::elapsed) {
                return Ok(self.timed_out(execution, deadline.ms));
            }

            let node = self.workflow.get_node(&nid).ok_or_else(|| NodeflowError::NotFound(format!("node {}", nid)))?;
            let input = self.gather_input(&nid);

            let retry_all = mode == ErrorHandling::Retry;
            let started = self.executor.start(&self.ctx, node, input);
            let record = self.executor.execute(&self.ctx, node, started, &self.policy, retry_all, deadline).await;

            let failure = record.error.clone();
            execution.node_executions.push(record);
            self.publish(WorkflowEvent::Updated(execution.clone()));

            if let Some(err) = failure {
                if let Some(deadline) = deadline.filter(Deadline::elapsed) {
                    return Ok(self.timed_out(execution, deadline.ms));
                }
                if mode == ErrorHandling::Continue {
                    warn!(eid = self.eid(), nid = nid.as_str(), "node failed, continuing");
                    continue;
                }
                error!(eid = self.eid(), nid = nid.as_str(), "execution failed: {}", err);
                execution.finish(ExecutionStatus::Failed, Some(NodeflowError::Node(err)));
                self.publish(WorkflowEvent::Failed(execution.clone()));
                return Ok(execution);
            }
        }

        execution.finish(ExecutionStatus::Completed, None);
        info!(eid = self.eid(), duration_ms = execution.duration_ms, "execution completed");
        self.publish(WorkflowEvent::Completed(execution.clone()));
        Ok(execution)
    }

    /// Outputs of the direct upstream nodes keyed by node id. A node that
    /// failed or has not run contributes `null`.
    fn gather_input(
        &self,
        nid: &str,
    ) -> Value {
        let mut input = Map::new();
        for source in self.workflow.upstream(nid) {
            let output = self.ctx.output(&source).unwrap_or(Value::Null);
            input.insert(source, output);
        }
        Value::Object(input)
    }

    fn timed_out(
        &self,
        mut execution: WorkflowExecution,
        ms: u64,
    ) -> WorkflowExecution {
        error!(eid = self.eid(), timeout_ms = ms, "execution timed out");
        execution.finish(ExecutionStatus::Failed, Some(NodeflowError::Timeout(ms)));
        self.publish(WorkflowEvent::Failed(execution.clone()));
        execution
    }

    fn publish(
        &self,
        event: WorkflowEvent,
    ) {
        self.ctx.emit_event("", GraphEvent::Workflow(event));
    }
}
