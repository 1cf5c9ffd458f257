use std::sync::Arc;

use crate::{
    Action, ActionRegistry, Config, Engine, Result,
    common::{IdGenerator, NanoIdGenerator},
};

pub struct EngineBuilder {
    config: Config,
    registry: ActionRegistry,
    ids: Arc<dyn IdGenerator>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            registry: ActionRegistry::with_builtins(),
            ids: Arc::new(NanoIdGenerator),
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    /// Adds an action, replacing the built-in one for the same node type.
    pub fn register(
        mut self,
        action: Arc<dyn Action>,
    ) -> Self {
        self.registry.register(action);
        self
    }

    /// Replaces the whole registry, e.g. with one that has no built-ins.
    pub fn registry(
        mut self,
        registry: ActionRegistry,
    ) -> Self {
        self.registry = registry;
        self
    }

    pub fn id_generator(
        mut self,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        self.ids = ids;
        self
    }

    pub fn build(self) -> Result<Engine> {
        Engine::new(self.config, self.registry, self.ids)
    }
}
