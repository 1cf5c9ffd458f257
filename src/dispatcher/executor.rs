//! Runs a single node through its action, retrying recoverable failures.

use std::{future::Future, sync::Arc, time::Duration};

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::{
    NodeflowError, Result,
    common::IdGenerator,
    error::NodeError,
    events::{GraphEvent, NodeEvent},
    runtime::{Context, ExecutionStatus, LogEntry, NodeExecution},
    workflow::{
        Node, RetryPolicy,
        actions::{Action, ActionOutput, ActionRegistry, PassThroughAction},
        consts::TIMEOUT,
    },
};

/// Instant by which the whole run has to finish, with the configured length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Deadline {
    pub ms: u64,
    pub at: Instant,
}

impl Deadline {
    pub fn after(ms: u64) -> Self {
        Self {
            ms,
            at: Instant::now() + Duration::from_millis(ms),
        }
    }

    pub fn elapsed(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Executes nodes with the actions of a registry.
#[derive(Clone)]
pub(crate) struct NodeExecutor {
    registry: Arc<ActionRegistry>,
    ids: Arc<dyn IdGenerator>,
    fallback: Arc<dyn Action>,
}

impl NodeExecutor {
    pub fn new(
        registry: Arc<ActionRegistry>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            registry,
            ids,
            fallback: Arc::new(PassThroughAction),
        }
    }

    /// Runs `node` until it succeeds, fails with an error the policy does not
    /// retry, or exhausts `policy.max_retries`.
    ///
    /// `record` comes from [`NodeExecutor::start`]. It is returned finished as
    /// `completed` or `failed`; a failure carries its [`NodeError`]. On success
    /// the output is also stored in the run context for downstream nodes. With
    /// `retry_all` every error counts as recoverable.
    ///
    /// When `deadline` elapses during an attempt or a backoff the node is
    /// abandoned: the record keeps its retries and logs so far and fails with
    /// a non-recoverable `TIMEOUT`.
    pub async fn execute(
        &self,
        ctx: &Arc<Context>,
        node: &Node,
        mut record: NodeExecution,
        policy: &RetryPolicy,
        retry_all: bool,
        deadline: Option<Deadline>,
    ) -> NodeExecution {
        let action = match self.registry.get(&node.node_type) {
            Some(action) => action,
            None => {
                warn!(eid = ctx.eid(), nid = node.id.as_str(), node_type = node.node_type.as_str(), "no action registered, passing input through");
                self.log(ctx, &mut record, LogEntry::warn(format!("no action registered for node type {}, input passed through", node.node_type)));
                self.fallback.clone()
            }
        };

        loop {
            let attempt = record.retry_count + 1;
            debug!(eid = ctx.eid(), nid = node.id.as_str(), attempt, "running node");

            let result = match within(deadline, self.attempt(ctx, action.as_ref(), node, &record.input)).await {
                Ok(result) => result,
                Err(ms) => return self.abandon(ctx, record, ms),
            };

            match result {
                Ok(out) => {
                    for entry in out.logs {
                        self.log(ctx, &mut record, entry);
                    }
                    ctx.add_output(node.id.clone(), out.output.clone());
                    record.output = Some(out.output);
                    record.finish(ExecutionStatus::Completed);
                    debug!(eid = ctx.eid(), nid = node.id.as_str(), attempt, duration_ms = record.duration_ms, "node completed");
                    ctx.emit_event(&node.id, GraphEvent::Node(NodeEvent::Succeeded(record.clone())));
                    return record;
                }
                Err(err) => {
                    let code = err.code().to_string();
                    let recoverable = retry_all || policy.is_retryable(&code);
                    let error = NodeError::new(code, err.message(), node.id.clone(), recoverable);

                    if recoverable && record.retry_count < policy.max_retries {
                        let delay_ms = policy.delay_ms(record.retry_count);
                        warn!(eid = ctx.eid(), nid = node.id.as_str(), attempt, delay_ms, code = error.code.as_str(), "node attempt failed, retrying");
                        self.log(
                            ctx,
                            &mut record,
                            LogEntry::warn(format!("attempt {} failed with {}, retrying in {} ms", attempt, error.code, delay_ms))
                                .with_data(serde_json::json!({ "attempt": attempt, "delay_ms": delay_ms, "error": error.message })),
                        );
                        record.status = ExecutionStatus::Retrying;
                        ctx.emit_event(
                            &node.id,
                            GraphEvent::Node(NodeEvent::Retrying {
                                execution: record.clone(),
                                error,
                                delay_ms,
                            }),
                        );

                        if let Err(ms) = within(deadline, tokio::time::sleep(Duration::from_millis(delay_ms))).await {
                            return self.abandon(ctx, record, ms);
                        }
                        record.retry_count += 1;
                        record.status = ExecutionStatus::Running;
                        continue;
                    }

                    error!(eid = ctx.eid(), nid = node.id.as_str(), attempt, code = error.code.as_str(), "node failed: {}", error.message);
                    self.log(ctx, &mut record, LogEntry::error(error.to_string()));
                    record.error = Some(error);
                    record.finish(ExecutionStatus::Failed);
                    ctx.emit_event(&node.id, GraphEvent::Node(NodeEvent::Failed(record.clone())));
                    return record;
                }
            }
        }
    }

    /// Opens the record of a node run and announces it.
    pub fn start(
        &self,
        ctx: &Arc<Context>,
        node: &Node,
        input: Value,
    ) -> NodeExecution {
        let record = NodeExecution::new(self.ids.next_id("nexec"), node, input);
        ctx.emit_event(&node.id, GraphEvent::Node(NodeEvent::Running(record.clone())));
        record
    }

    /// Fails the record of a node that was cut off by the run deadline.
    fn abandon(
        &self,
        ctx: &Context,
        mut record: NodeExecution,
        ms: u64,
    ) -> NodeExecution {
        let error = NodeError::new(TIMEOUT, format!("abandoned when the {} ms run deadline elapsed", ms), record.node_id.clone(), false);
        warn!(eid = ctx.eid(), nid = record.node_id.as_str(), retries = record.retry_count, "node abandoned at run deadline");
        self.log(ctx, &mut record, LogEntry::error(error.to_string()));
        record.error = Some(error);
        record.finish(ExecutionStatus::Failed);
        ctx.emit_event(&record.node_id, GraphEvent::Node(NodeEvent::Failed(record.clone())));
        record
    }

    async fn attempt(
        &self,
        ctx: &Arc<Context>,
        action: &dyn Action,
        node: &Node,
        input: &Value,
    ) -> Result<ActionOutput> {
        match node.timeout {
            Some(limit) => match tokio::time::timeout(limit, action.run(ctx.clone(), node, input)).await {
                Ok(result) => result,
                Err(_) => Err(NodeflowError::exception(TIMEOUT, format!("attempt exceeded {} ms", limit.as_millis()))),
            },
            None => action.run(ctx.clone(), node, input).await,
        }
    }

    fn log(
        &self,
        ctx: &Context,
        record: &mut NodeExecution,
        entry: LogEntry,
    ) {
        ctx.emit_log(&record.node_id, entry.clone());
        record.logs.push(entry);
    }
}

/// Runs `fut` to completion unless `deadline` elapses first, in which case
/// the deadline length is returned.
async fn within<F: Future>(
    deadline: Option<Deadline>,
    fut: F,
) -> std::result::Result<F::Output, u64> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline.at, fut).await.map_err(|_| deadline.ms),
        None => Ok(fut.await),
    }
}
