//! # Nodeflow
//!
//! Nodeflow is an embeddable workflow execution engine written in Rust.
//! A workflow is a graph of typed nodes joined by directed connections; the
//! engine orders the graph topologically and runs the nodes one at a time,
//! retrying recoverable failures with exponential backoff.
//!
//! ## Core Features
//!
//! - **Deterministic Ordering**: Depth-first topological ordering with cycle detection
//! - **Retry With Backoff**: Per-node retry bounded by a [`RetryPolicy`]
//! - **Pluggable Node Types**: Every node type is served by an [`Action`] registered by type
//! - **Observable Runs**: Lifecycle events and log entries are published on a [`Channel`]
//! - **Cooperative Cancellation**: Runs stop between nodes when their token is cancelled
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nodeflow::{EngineBuilder, ExecutionOptions, WorkflowModel};
//!
//! let engine = EngineBuilder::new().build()?;
//!
//! let workflow = WorkflowModel::from_json(json_str)?;
//! engine.deploy(&workflow)?;
//!
//! let execution = engine.execute(&workflow.id, ExecutionOptions::default()).await?;
//! println!("{}", execution.status);
//! ```

mod builder;
mod common;
mod config;
mod dispatcher;
mod engine;
mod error;
mod events;
mod model;
mod runtime;
mod utils;
mod workflow;

use std::sync::{Arc, RwLock};

pub use builder::EngineBuilder;
pub use common::{IdGenerator, NanoIdGenerator, Queue, SequentialIdGenerator};
pub use config::{ChannelConfig, Config, RetryConfig, SimulationConfig};
pub use engine::{Engine, ExecutionHandle, ExecutionOptions};
pub use error::{NodeError, NodeflowError};
pub use events::{Event, GraphEvent, Log, Message, NodeEvent, WorkflowEvent};
pub use model::*;
pub use runtime::{
    Channel, ChannelEvent, ChannelOptions, Context, ExecutionContext, ExecutionId, ExecutionStatus, LogEntry, LogLevel, NodeExecution,
    WorkflowExecution,
};
pub use workflow::{
    Connection, Node, NodeId, NodeType, RetryPolicy, ValidationReport, Workflow,
    actions::{Action, ActionOutput, ActionRegistry},
    execution_order, validate, validate_with,
};

/// Result type alias for Nodeflow operations.
pub type Result<T> = std::result::Result<T, NodeflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
