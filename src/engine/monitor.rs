use std::sync::Arc;

use crate::{
    ChannelEvent, ChannelOptions, Result,
    common::MemCache,
    events::GraphEvent,
    runtime::{Channel, ExecutionId, WorkflowExecution},
};

/// Keeps the latest published snapshot of every execution.
pub struct Monitor {
    channel: Arc<Channel>,
    snapshots: Arc<MemCache<ExecutionId, WorkflowExecution>>,
}

impl Monitor {
    pub fn new(
        channel: Arc<Channel>,
        capacity: usize,
    ) -> Self {
        Self {
            channel,
            snapshots: Arc::new(MemCache::new(capacity)),
        }
    }

    /// Registers the monitor on the channel. Workflow events carry the whole
    /// execution, so the last one seen is the current state of the run.
    pub fn monitor(&self) -> Result<()> {
        let snapshots = self.snapshots.clone();
        ChannelEvent::channel(self.channel.clone(), ChannelOptions::default())?.on_event(move |e| {
            if let GraphEvent::Workflow(event) = &e.event {
                snapshots.set(e.eid.clone(), event.execution().clone());
            }
        });
        Ok(())
    }

    pub fn get(
        &self,
        eid: &str,
    ) -> Option<WorkflowExecution> {
        self.snapshots.get(&eid.to_string())
    }
}
