//! Workflow engine - the main entry point for Nodeflow.
//!
//! The engine manages the lifecycle of workflows and their executions:
//! - Validating and deploying workflow definitions
//! - Running executions in the foreground or as background tasks
//! - Cancelling active executions
//! - Keeping the latest snapshot of every execution

mod monitor;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    Config, NodeflowError, Result,
    common::{IdGenerator, MemCache, NanoIdGenerator},
    dispatcher::{Dispatcher, NodeExecutor},
    model::WorkflowModel,
    runtime::{Channel, Context, ExecutionContext, ExecutionId, WorkflowExecution},
    workflow::{RetryPolicy, ValidationReport, Workflow, actions::ActionRegistry, validate_with},
};

use monitor::Monitor;

/// Per-run settings passed to [`Engine::execute`] and [`Engine::spawn`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Overrides the workflow and engine retry policies for this run.
    pub retry_policy: Option<RetryPolicy>,
    /// Variables and trigger payload of the run. Variables override the
    /// workflow variables of the same name.
    pub context: ExecutionContext,
    /// External token; cancelling it stops the run before its next node.
    pub cancel_token: Option<CancellationToken>,
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_policy(
        mut self,
        policy: RetryPolicy,
    ) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn with_context(
        mut self,
        context: ExecutionContext,
    ) -> Self {
        self.context = context;
        self
    }

    pub fn with_cancel_token(
        mut self,
        token: CancellationToken,
    ) -> Self {
        self.cancel_token = Some(token);
        self
    }
}

/// A run started with [`Engine::spawn`].
pub struct ExecutionHandle {
    id: ExecutionId,
    token: CancellationToken,
    join: JoinHandle<Result<WorkflowExecution>>,
}

impl ExecutionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Requests cancellation; the run stops before its next node.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Waits for the run to finish.
    pub async fn wait(self) -> Result<WorkflowExecution> {
        self.join.await.map_err(|e| NodeflowError::Workflow(format!("execution {} aborted: {}", self.id, e)))?
    }
}

/// The main workflow engine.
///
/// Engine is the central coordinator for Nodeflow, responsible for:
/// - Holding the registry of node actions
/// - Coordinating the event channel for observers
/// - Storing deployed workflow definitions
/// - Creating, tracking and cancelling executions
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().build()?;
///
/// // Deploy a workflow
/// engine.deploy(&workflow_model)?;
///
/// // Run it in the background
/// let handle = engine.spawn("workflow_id", ExecutionOptions::default())?;
/// let execution = handle.wait().await?;
/// ```
pub struct Engine {
    config: Config,
    /// Event channel for broadcasting execution events.
    channel: Arc<Channel>,
    registry: Arc<ActionRegistry>,
    executor: NodeExecutor,
    ids: Arc<dyn IdGenerator>,
    /// Deployed workflows by id.
    workflows: Arc<MemCache<String, Arc<Workflow>>>,
    /// Cancellation tokens of the runs in progress.
    active: Arc<MemCache<ExecutionId, CancellationToken>>,
    /// Latest snapshot of every execution.
    monitor: Monitor,
}

impl Engine {
    pub(crate) fn new(
        config: Config,
        registry: ActionRegistry,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        let channel = Arc::new(Channel::new(&config.channel));
        let monitor = Monitor::new(channel.clone(), config.max_active_executions);
        monitor.monitor()?;

        let registry = Arc::new(registry);
        Ok(Self {
            executor: NodeExecutor::new(registry.clone(), ids.clone()),
            workflows: Arc::new(MemCache::new(config.max_workflows)),
            active: Arc::new(MemCache::new(config.max_active_executions)),
            config,
            channel,
            registry,
            ids,
            monitor,
        })
    }

    /// Creates an engine with the built-in actions and random ids.
    pub fn new_with_config(config: Config) -> Result<Self> {
        Self::new(config, ActionRegistry::with_builtins(), Arc::new(NanoIdGenerator))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Checks a workflow against the structural rules and the schemas of the
    /// registered actions.
    pub fn validate(
        &self,
        model: &WorkflowModel,
    ) -> ValidationReport {
        validate_with(model, &self.registry)
    }

    /// Validates and stores a workflow definition, replacing any deployed
    /// workflow with the same id. Warnings are returned; errors reject it.
    pub fn deploy(
        &self,
        model: &WorkflowModel,
    ) -> Result<ValidationReport> {
        let report = self.validate(model);
        if !report.valid {
            return Err(NodeflowError::Validation(report.errors));
        }

        let workflow = Workflow::try_from(model)?;
        self.workflows.set(model.id.clone(), Arc::new(workflow));
        info!(workflow = model.id.as_str(), warnings = report.warnings.len(), "workflow deployed");
        Ok(report)
    }

    /// Gets a deployed workflow.
    pub fn workflow(
        &self,
        id: &str,
    ) -> Option<Arc<Workflow>> {
        self.workflows.get(&id.to_string())
    }

    /// Runs a deployed workflow and returns its finished record.
    ///
    /// Only failures that prevent a run from starting are returned as errors:
    /// an unknown workflow, a workflow without a trigger node, or a cycle.
    /// Node failures, cancellation and timeouts are reported in the record.
    pub async fn execute(
        &self,
        workflow_id: &str,
        options: ExecutionOptions,
    ) -> Result<WorkflowExecution> {
        let workflow = self.find(workflow_id)?;
        let dispatcher = self.dispatcher(workflow, options);
        drive(self.active.clone(), dispatcher).await
    }

    /// Runs a workflow that was not deployed. Configuration is not validated
    /// up front; invalid node configuration fails the node that holds it.
    pub async fn execute_model(
        &self,
        model: &WorkflowModel,
        options: ExecutionOptions,
    ) -> Result<WorkflowExecution> {
        let workflow = Arc::new(Workflow::try_from(model)?);
        let dispatcher = self.dispatcher(workflow, options);
        drive(self.active.clone(), dispatcher).await
    }

    /// Starts a deployed workflow on the current tokio runtime and returns
    /// without waiting for it.
    pub fn spawn(
        &self,
        workflow_id: &str,
        options: ExecutionOptions,
    ) -> Result<ExecutionHandle> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| NodeflowError::Workflow(format!("spawn requires a tokio runtime: {}", e)))?;
        let workflow = self.find(workflow_id)?;
        let token = options.cancel_token.clone().unwrap_or_default();
        let dispatcher = self.dispatcher(
            workflow,
            ExecutionOptions {
                cancel_token: Some(token.clone()),
                ..options
            },
        );

        let id = dispatcher.eid().to_string();
        let join = runtime.spawn(drive(self.active.clone(), dispatcher));
        Ok(ExecutionHandle {
            id,
            token,
            join,
        })
    }

    /// Cancels an execution in progress.
    pub fn cancel(
        &self,
        eid: &str,
    ) -> Result<()> {
        match self.active.get(&eid.to_string()) {
            Some(token) => {
                info!(eid, "cancellation requested");
                token.cancel();
                Ok(())
            }
            None => Err(NodeflowError::NotFound(format!("execution {} is not running", eid))),
        }
    }

    /// Latest published state of an execution.
    pub fn execution(
        &self,
        eid: &str,
    ) -> Option<WorkflowExecution> {
        self.monitor.get(eid)
    }

    /// Returns a reference to the event channel.
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    fn find(
        &self,
        workflow_id: &str,
    ) -> Result<Arc<Workflow>> {
        self.workflow(workflow_id).ok_or_else(|| NodeflowError::NotFound(format!("workflow {} is not deployed", workflow_id)))
    }

    /// Prepares one run. The retry policy is taken from the options, then the
    /// workflow settings, then the engine configuration.
    fn dispatcher(
        &self,
        workflow: Arc<Workflow>,
        options: ExecutionOptions,
    ) -> Dispatcher {
        let eid = self.ids.next_id("exec");
        let policy = options.retry_policy.or_else(|| workflow.settings().retry_policy.clone()).unwrap_or_else(|| self.config.retry_policy());
        let token = options.cancel_token.unwrap_or_default();
        let execution_context = options.context.merged_over(workflow.variables());

        let ctx = Arc::new(Context::new(eid.clone(), workflow.id(), execution_context, self.channel.clone(), self.config.simulation.clone()));
        self.active.set(eid.clone(), token.clone());
        debug!(eid = eid.as_str(), workflow = workflow.id(), max_retries = policy.max_retries, "execution prepared");

        Dispatcher::new(ctx, workflow, self.executor.clone(), policy, token)
    }
}

async fn drive(
    active: Arc<MemCache<ExecutionId, CancellationToken>>,
    dispatcher: Dispatcher,
) -> Result<WorkflowExecution> {
    let eid = dispatcher.eid().to_string();
    let result = dispatcher.run().await;
    active.remove(&eid);
    result
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use serde_json::{Value, json};

    use super::*;
    use crate::{
        ChannelEvent, ChannelOptions, ErrorHandling, EngineBuilder, ExecutionStatus, GraphEvent, LogLevel, NodeEvent, NodeModel, SequentialIdGenerator,
        SimulationConfig, WorkflowSettings,
    };

    fn engine() -> Engine {
        let config = Config {
            simulation: SimulationConfig::instant(),
            ..Config::default()
        };
        EngineBuilder::new().config(config).id_generator(Arc::new(SequentialIdGenerator::new())).build().unwrap()
    }

    fn fast_retries(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay_ms: 10,
            max_delay_ms: 100,
            ..RetryPolicy::default()
        }
    }

    fn outputs(execution: &WorkflowExecution) -> Vec<(&str, Option<&Value>)> {
        execution.node_executions.iter().map(|n| (n.node_id.as_str(), n.output.as_ref())).collect()
    }

    #[tokio::test]
    async fn test_trigger_then_email() {
        let engine = engine();
        let model = WorkflowModel::new("welcome")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("e", "email").with_config(json!({ "to": "user@example.com", "subject": "Welcome" })))
            .connect("t", "e");

        let execution = engine.execute_model(&model, ExecutionOptions::default()).await.unwrap();

        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.id, "exec_1");
        assert_eq!(execution.executed_node_ids(), vec!["t", "e"]);
        assert_eq!(execution.node_executions[0].output, Some(json!({})));
        let email = execution.node_execution("e").unwrap();
        assert_eq!(email.input, json!({ "t": {} }));
        let output = email.output.as_ref().unwrap();
        assert_eq!(output["sent"], json!(true));
        assert_eq!(output["to"], "user@example.com");
        assert_eq!(output["subject"], "Welcome");
        assert!(execution.ended_at.is_some());
        assert!(execution.duration_ms.is_some());
        assert!(execution.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_fails_the_run() {
        let engine = engine();
        let model = WorkflowModel::new("flaky")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("fetch", "api").with_config(json!({ "url": "https://api.example.com", "mock_status": 503 })))
            .node(NodeModel::new("notify", "email").with_config(json!({ "to": "ops@example.com" })))
            .connect("t", "fetch")
            .connect("fetch", "notify");

        let execution = engine.execute_model(&model, ExecutionOptions::new().with_retry_policy(fast_retries(2))).await.unwrap();

        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert_eq!(execution.executed_node_ids(), vec!["t", "fetch"]);
        let fetch = execution.node_execution("fetch").unwrap();
        assert_eq!(fetch.status, ExecutionStatus::Failed);
        assert_eq!(fetch.retry_count, 2);
        let retries: Vec<_> = fetch.logs.iter().filter(|l| l.level == LogLevel::Warn).map(|l| l.message.as_str()).collect();
        assert_eq!(retries, vec!["attempt 1 failed with SERVICE_UNAVAILABLE, retrying in 10 ms", "attempt 2 failed with SERVICE_UNAVAILABLE, retrying in 20 ms"]);
        match execution.error {
            Some(NodeflowError::Node(e)) => {
                assert_eq!(e.code, "SERVICE_UNAVAILABLE");
                assert_eq!(e.node_id, "fetch");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_between_nodes() {
        let engine = engine();
        let model = WorkflowModel::new("chain")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("a", "action"))
            .node(NodeModel::new("b", "action"))
            .node(NodeModel::new("c", "action"))
            .connect("t", "a")
            .connect("a", "b")
            .connect("b", "c");

        let token = CancellationToken::new();
        let trip = token.clone();
        ChannelEvent::channel(engine.channel(), ChannelOptions::with_nid("a".to_string())).unwrap().on_event(move |e| {
            if matches!(e.event, GraphEvent::Node(NodeEvent::Succeeded(_))) {
                trip.cancel();
            }
        });

        let execution = engine.execute_model(&model, ExecutionOptions::new().with_cancel_token(token)).await.unwrap();

        assert_eq!(execution.status, ExecutionStatus::Cancelled);
        assert_eq!(execution.error, Some(NodeflowError::Cancelled));
        assert_eq!(execution.executed_node_ids(), vec!["t", "a"]);
        assert_eq!(execution.node_execution("a").unwrap().status, ExecutionStatus::Completed);
        assert!(execution.node_execution("b").is_none());
        assert!(execution.node_execution("c").is_none());
    }

    #[tokio::test]
    async fn test_no_trigger_rejected_before_any_node() {
        let engine = engine();
        let events = ChannelEvent::channel(engine.channel(), ChannelOptions::default()).unwrap().queue(16);
        let model = WorkflowModel::new("headless").node(NodeModel::new("a", "action")).node(NodeModel::new("b", "email")).connect("a", "b");

        let err = engine.execute_model(&model, ExecutionOptions::default()).await.unwrap_err();

        assert_eq!(err, NodeflowError::NoTriggerNode);
        assert_eq!(events.len(), 0);
        assert!(engine.execution("exec_1").is_none());
    }

    #[tokio::test]
    async fn test_cycle_rejected_before_any_node() {
        let engine = engine();
        let model = WorkflowModel::new("loop")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("a", "action"))
            .node(NodeModel::new("b", "action"))
            .connect("t", "a")
            .connect("a", "b")
            .connect("b", "a");

        let err = engine.execute_model(&model, ExecutionOptions::default()).await.unwrap_err();
        assert!(matches!(err, NodeflowError::CircularDependency { .. }));
    }

    #[tokio::test]
    async fn test_continue_runs_downstream_of_failure() {
        let engine = engine();
        let model = WorkflowModel::new("best_effort")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("fetch", "api").with_config(json!({ "url": "https://api.example.com", "mock_status": 404 })))
            .node(NodeModel::new("shape", "transform"))
            .connect("t", "fetch")
            .connect("fetch", "shape")
            .connect("t", "shape")
            .settings(WorkflowSettings {
                error_handling: ErrorHandling::Continue,
                ..Default::default()
            });

        let execution = engine.execute_model(&model, ExecutionOptions::default()).await.unwrap();

        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.failed_nodes().len(), 1);
        assert_eq!(execution.node_execution("fetch").unwrap().error.as_ref().unwrap().code, "HTTP_ERROR");
        assert_eq!(outputs(&execution)[2], ("shape", Some(&json!({ "fetch": null, "t": {} }))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_mode_retries_any_error() {
        let engine = engine();
        let model = WorkflowModel::new("stubborn")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("fetch", "api").with_config(json!({ "url": "https://api.example.com", "mock_status": 404 })))
            .connect("t", "fetch")
            .settings(WorkflowSettings {
                error_handling: ErrorHandling::Retry,
                retry_policy: Some(fast_retries(1)),
                ..Default::default()
            });

        let execution = engine.execute_model(&model, ExecutionOptions::default()).await.unwrap();

        assert_eq!(execution.status, ExecutionStatus::Failed);
        let fetch = execution.node_execution("fetch").unwrap();
        assert_eq!(fetch.retry_count, 1);
        assert!(fetch.error.as_ref().unwrap().recoverable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline_abandons_node() {
        let engine = engine();
        let model = WorkflowModel::new("slow")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("wait", "delay").with_config(json!({ "duration_ms": 2000 })))
            .node(NodeModel::new("after", "action"))
            .connect("t", "wait")
            .connect("wait", "after")
            .settings(WorkflowSettings {
                timeout_ms: Some(500),
                ..Default::default()
            });

        let execution = engine.execute_model(&model, ExecutionOptions::default()).await.unwrap();

        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert_eq!(execution.error, Some(NodeflowError::Timeout(500)));
        assert_eq!(execution.executed_node_ids(), vec!["t", "wait"]);
        let wait = execution.node_execution("wait").unwrap();
        assert_eq!(wait.status, ExecutionStatus::Failed);
        assert_eq!(wait.error.as_ref().unwrap().code, "TIMEOUT");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline_keeps_retry_history() {
        let engine = engine();
        let model = WorkflowModel::new("unavailable")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("fetch", "api").with_config(json!({ "url": "https://api.example.com", "mock_status": 503 })))
            .connect("t", "fetch")
            .settings(WorkflowSettings {
                timeout_ms: Some(5000),
                ..Default::default()
            });

        let execution = engine.execute_model(&model, ExecutionOptions::default()).await.unwrap();

        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert_eq!(execution.error, Some(NodeflowError::Timeout(5000)));
        let fetch = execution.node_execution("fetch").unwrap();
        assert_eq!(fetch.status, ExecutionStatus::Failed);
        assert_eq!(fetch.retry_count, 2);
        let retries: Vec<_> = fetch.logs.iter().filter(|l| l.level == LogLevel::Warn).map(|l| l.message.as_str()).collect();
        assert_eq!(
            retries,
            vec![
                "attempt 1 failed with SERVICE_UNAVAILABLE, retrying in 1000 ms",
                "attempt 2 failed with SERVICE_UNAVAILABLE, retrying in 2000 ms",
                "attempt 3 failed with SERVICE_UNAVAILABLE, retrying in 4000 ms",
            ]
        );
        assert_eq!(fetch.logs.last().unwrap().level, LogLevel::Error);
        assert_eq!(fetch.error.as_ref().unwrap().code, "TIMEOUT");
    }

    #[tokio::test]
    async fn test_unknown_type_passes_input_through() {
        let engine = engine();
        let model = WorkflowModel::new("custom")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("hook", "webhook"))
            .connect("t", "hook");

        let execution = engine.execute_model(&model, ExecutionOptions::new().with_context(ExecutionContext::new().with_trigger(json!({ "id": 7 }))))
            .await
            .unwrap();

        assert_eq!(execution.status, ExecutionStatus::Completed);
        let hook = execution.node_execution("hook").unwrap();
        assert_eq!(hook.output, Some(json!({ "t": { "id": 7 } })));
        assert_eq!(hook.logs[0].level, LogLevel::Warn);
    }

    #[tokio::test]
    async fn test_deploy_validates_and_executes_by_id() {
        let engine = engine();
        let invalid = WorkflowModel::new("broken")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("mail", "email").with_config(json!({ "subject": "no recipient" })))
            .connect("t", "mail");
        match engine.deploy(&invalid) {
            Err(NodeflowError::Validation(errors)) => assert!(errors[0].starts_with("node mail has invalid email configuration")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(engine.workflow("broken").is_none());

        let model = WorkflowModel::new("greet")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("mail", "email").with_config(json!({ "to": "{{$to$}}", "subject": "hi" })))
            .connect("t", "mail")
            .variable("to", json!("default@example.com"));
        let report = engine.deploy(&model).unwrap();
        assert!(report.warnings.is_empty());

        let execution = engine.execute("greet", ExecutionOptions::default()).await.unwrap();
        assert_eq!(execution.node_execution("mail").unwrap().output.as_ref().unwrap()["to"], "default@example.com");

        let context = ExecutionContext::new().with_variable("to", json!("override@example.com"));
        let execution = engine.execute("greet", ExecutionOptions::new().with_context(context)).await.unwrap();
        assert_eq!(execution.node_execution("mail").unwrap().output.as_ref().unwrap()["to"], "override@example.com");

        assert!(matches!(engine.execute("missing", ExecutionOptions::default()).await, Err(NodeflowError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_lifecycle_events_in_order() {
        let engine = engine();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ChannelEvent::channel(engine.channel(), ChannelOptions::default()).unwrap().on_event(move |e| {
            sink.lock().unwrap().push(format!("{}:{}", e.nid, e.event.name()));
        });
        let model = WorkflowModel::new("w").node(NodeModel::new("t", "trigger")).node(NodeModel::new("a", "action")).connect("t", "a");

        let execution = engine.execute_model(&model, ExecutionOptions::default()).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![":Started", "t:Running", "t:Succeeded", ":Updated", "a:Running", "a:Succeeded", ":Updated", ":Completed"]
        );
        assert_eq!(engine.execution(&execution.id), Some(execution));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_and_cancel() {
        let engine = engine();
        let model = WorkflowModel::new("background")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("wait", "delay").with_config(json!({ "duration_ms": 1000 })))
            .connect("t", "wait");
        engine.deploy(&model).unwrap();

        let handle = engine.spawn("background", ExecutionOptions::default()).unwrap();
        let eid = handle.id().to_string();
        engine.cancel(&eid).unwrap();

        let execution = handle.wait().await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Cancelled);
        assert!(execution.node_executions.is_empty());
        assert!(matches!(engine.cancel(&eid), Err(NodeflowError::NotFound(_))));

        let handle = engine.spawn("background", ExecutionOptions::default()).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(engine.execution(handle.id()).map(|e| e.status), Some(ExecutionStatus::Running));
        let execution = handle.wait().await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.node_execution("wait").unwrap().output, Some(json!({ "delayed_ms": 1000 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_runs_are_isolated() {
        let engine = engine();
        let model = WorkflowModel::new("orders")
            .node(NodeModel::new("t", "trigger"))
            .node(NodeModel::new("wait", "delay").with_config(json!({ "duration_ms": 1000 })))
            .node(NodeModel::new("echo", "other"))
            .connect("t", "wait")
            .connect("t", "echo")
            .connect("wait", "echo");
        engine.deploy(&model).unwrap();

        let options = |customer: &str| ExecutionOptions::new().with_context(ExecutionContext::new().with_trigger(json!({ "customer": customer })));
        let started = tokio::time::Instant::now();
        let a = engine.spawn("orders", options("alice")).unwrap();
        let b = engine.spawn("orders", options("bob")).unwrap();
        assert_ne!(a.id(), b.id());

        // both runs are inside their delay node
        tokio::time::sleep(Duration::from_millis(1)).await;
        engine.cancel(a.id()).unwrap();

        let a = a.wait().await.unwrap();
        let b = b.wait().await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(2000));

        assert_eq!(a.status, ExecutionStatus::Cancelled);
        assert_eq!(a.executed_node_ids(), vec!["t", "wait"]);
        assert_eq!(a.node_execution("t").unwrap().output, Some(json!({ "customer": "alice" })));

        assert_eq!(b.status, ExecutionStatus::Completed);
        assert_eq!(b.node_execution("t").unwrap().output, Some(json!({ "customer": "bob" })));
        assert_eq!(
            b.node_execution("echo").unwrap().output,
            Some(json!({ "t": { "customer": "bob" }, "wait": { "delayed_ms": 1000 } }))
        );
    }
}
