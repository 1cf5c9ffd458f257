use std::{collections::BTreeSet, fs, path::Path};

use serde::Deserialize;

use crate::{Result, workflow::RetryPolicy};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// engine wide retry policy
    pub retry: RetryConfig,
    /// simulated work durations
    pub simulation: SimulationConfig,
    /// observer channel sizing
    pub channel: ChannelConfig,
    /// maximum number of runs tracked for cancellation and snapshots
    pub max_active_executions: usize,
    /// maximum number of deployed workflows kept in the catalog
    pub max_workflows: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// delay before the first retry in milliseconds
    pub initial_delay_ms: u64,
    /// upper bound of any retry delay in milliseconds
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// error codes considered recoverable
    pub retryable_errors: BTreeSet<String>,
}

/// Durations of the simulated unit of work per node type, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub email_ms: u64,
    pub api_ms: u64,
    pub database_ms: u64,
    pub action_ms: u64,
    pub script_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// capacity of the broadcast queue carrying events
    pub event_queue_size: usize,
    /// capacity of the broadcast queue carrying log entries
    pub log_queue_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            simulation: SimulationConfig::default(),
            channel: ChannelConfig::default(),
            max_active_executions: 2048,
            max_workflows: 1024,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            initial_delay_ms: policy.initial_delay_ms,
            max_delay_ms: policy.max_delay_ms,
            backoff_multiplier: policy.backoff_multiplier,
            retryable_errors: policy.retryable_errors,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            email_ms: 1000,
            api_ms: 500,
            database_ms: 300,
            action_ms: 100,
            script_ms: 200,
        }
    }
}

impl SimulationConfig {
    /// No simulated waiting at all; used by tests and dry runs.
    pub fn instant() -> Self {
        Self {
            email_ms: 0,
            api_ms: 0,
            database_ms: 0,
            action_ms: 0,
            script_ms: 0,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            event_queue_size: 2048,
            log_queue_size: 4096,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            max_retries: config.max_retries,
            initial_delay_ms: config.initial_delay_ms,
            max_delay_ms: config.max_delay_ms,
            backoff_multiplier: config.backoff_multiplier,
            retryable_errors: config.retryable_errors.clone(),
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        Ok(config)
    }

    /// The engine wide retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}
