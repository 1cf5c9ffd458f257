pub mod api;
pub mod condition;
pub mod database;
pub mod delay;
pub mod email;
pub mod iteration;
pub mod passthrough;
pub mod script;
pub mod task;
pub mod transform;
pub mod trigger;

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    Result,
    runtime::{Context, LogEntry},
    workflow::node::{Node, NodeType},
};

pub use api::ApiAction;
pub use condition::ConditionAction;
pub use database::DatabaseAction;
pub use delay::DelayAction;
pub use email::EmailAction;
pub use iteration::LoopAction;
pub use passthrough::PassThroughAction;
pub use script::ScriptAction;
pub use task::TaskAction;
pub use transform::TransformAction;
pub use trigger::TriggerAction;

/// The unit of work behind one node type.
///
/// Actions are registered in an [`ActionRegistry`] under the [`NodeType`]
/// they serve. A single action instance runs every node of its type, so
/// per-node settings come from the node configuration, which the action
/// also validates when a workflow is deployed.
#[async_trait]
pub trait Action: Send + Sync {
    /// Returns the node type served by the action.
    fn action_type(&self) -> NodeType;

    /// Returns the JSON schema of the node configuration.
    ///
    /// # Returns
    ///
    /// Returns a [`serde_json::Value`] representing the schema of the configuration.
    fn schema(&self) -> Value;

    /// Checks a node configuration before the workflow is saved.
    ///
    /// The default implementation validates `config` against [`Action::schema`].
    fn validate(
        &self,
        config: &Value,
    ) -> Result<()> {
        jsonschema::validate(&self.schema(), config)?;
        Ok(())
    }

    /// Executes one attempt of a node.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The [`Context`] of the run.
    /// * `node` - The node being executed.
    /// * `input` - Outputs of the directly connected upstream nodes, keyed by node id.
    ///
    /// # Returns
    ///
    /// Returns the node output and the log entries produced by the attempt.
    /// Failures are reported as [`crate::NodeflowError::Exception`] with an error
    /// code that the retry policy classifies.
    async fn run(
        &self,
        ctx: Arc<Context>,
        node: &Node,
        input: &Value,
    ) -> Result<ActionOutput>;
}

/// Output returned by an action's run method
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutput {
    /// node output made visible to downstream nodes
    pub output: Value,
    /// log entries produced while running
    pub logs: Vec<LogEntry>,
}

impl ActionOutput {
    /// Create a successful action output
    pub fn success(output: Value) -> Self {
        Self {
            output,
            logs: Vec::new(),
        }
    }

    pub fn with_log(
        mut self,
        entry: LogEntry,
    ) -> Self {
        self.logs.push(entry);
        self
    }
}

/// Strategy map from node type to the action that runs it.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<NodeType, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the simulated actions for every built-in node type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TriggerAction));
        registry.register(Arc::new(TaskAction));
        registry.register(Arc::new(EmailAction));
        registry.register(Arc::new(ApiAction));
        registry.register(Arc::new(DatabaseAction));
        registry.register(Arc::new(ConditionAction));
        registry.register(Arc::new(LoopAction));
        registry.register(Arc::new(DelayAction));
        registry.register(Arc::new(TransformAction));
        registry.register(Arc::new(ScriptAction));
        registry.register(Arc::new(PassThroughAction));
        registry
    }

    /// Registers `action` for its node type, replacing any previous action for that type.
    pub fn register(
        &mut self,
        action: Arc<dyn Action>,
    ) -> Option<Arc<dyn Action>> {
        self.actions.insert(action.action_type(), action)
    }

    pub fn get(
        &self,
        node_type: &NodeType,
    ) -> Option<Arc<dyn Action>> {
        self.actions.get(node_type).cloned()
    }

    pub fn contains(
        &self,
        node_type: &NodeType,
    ) -> bool {
        self.actions.contains_key(node_type)
    }

    pub fn node_types(&self) -> Vec<NodeType> {
        let mut types: Vec<NodeType> = self.actions.keys().cloned().collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        types
    }
}

/// Validates `config` against `schema` and deserializes it.
pub(crate) fn parse_config<T: DeserializeOwned>(
    schema: &Value,
    config: &Value,
) -> Result<T> {
    jsonschema::validate(schema, config)?;
    Ok(serde_json::from_value(config.clone())?)
}

/// Waits for the simulated duration of a unit of work.
pub(crate) async fn simulate_work(millis: u64) {
    if millis > 0 {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}
