use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use serde_json::Value;

use crate::{
    ShareLock,
    config::SimulationConfig,
    events::{GraphEvent, Log, Message},
    runtime::{Channel, ExecutionContext, ExecutionId, LogEntry},
    workflow::NodeId,
};

/// State shared between the dispatcher and the actions of one run.
pub struct Context {
    eid: ExecutionId,
    workflow_id: String,
    execution_context: ExecutionContext,
    outputs: ShareLock<HashMap<NodeId, Value>>,
    channel: Arc<Channel>,
    simulation: SimulationConfig,
}

impl Context {
    pub fn new(
        eid: ExecutionId,
        workflow_id: &str,
        execution_context: ExecutionContext,
        channel: Arc<Channel>,
        simulation: SimulationConfig,
    ) -> Self {
        Self {
            eid,
            workflow_id: workflow_id.to_string(),
            execution_context,
            outputs: Arc::new(RwLock::new(HashMap::new())),
            channel,
            simulation,
        }
    }

    pub fn eid(&self) -> &str {
        &self.eid
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    /// Payload the run was triggered with.
    pub fn trigger(&self) -> &Value {
        &self.execution_context.trigger
    }

    pub fn variable(
        &self,
        name: &str,
    ) -> Option<Value> {
        self.execution_context.variables.get(name).cloned()
    }

    pub fn execution_context(&self) -> &ExecutionContext {
        &self.execution_context
    }

    pub fn simulation(&self) -> &SimulationConfig {
        &self.simulation
    }

    /// Output of a node that already ran in this execution.
    pub fn output(
        &self,
        nid: &str,
    ) -> Option<Value> {
        self.outputs.read().unwrap().get(nid).cloned()
    }

    pub fn add_output(
        &self,
        nid: NodeId,
        output: Value,
    ) {
        self.outputs.write().unwrap().insert(nid, output);
    }

    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    /// Publishes a lifecycle event of this run. Workflow events use an empty `nid`.
    pub fn emit_event(
        &self,
        nid: &str,
        event: GraphEvent,
    ) {
        self.channel.publish(Message {
            eid: self.eid.clone(),
            nid: nid.to_string(),
            event,
        });
    }

    pub fn emit_log(
        &self,
        nid: &str,
        entry: LogEntry,
    ) {
        self.channel.publish_log(Log {
            eid: self.eid.clone(),
            nid: nid.to_string(),
            entry,
        });
    }
}
