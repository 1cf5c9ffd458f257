//! Error types for Nodeflow.
//!
//! All errors in Nodeflow are represented by the `NodeflowError` enum.
//! Failures raised while a single node runs are carried by [`NodeError`],
//! which records the error code and whether the active retry policy
//! considers it recoverable.

use std::{fmt, io::ErrorKind};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::NodeId;

/// Unified error type for all Nodeflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum NodeflowError {
    /// The workflow has no trigger node and cannot start.
    #[error("workflow has no trigger node")]
    NoTriggerNode,

    /// A cycle was found while ordering the workflow graph.
    #[error("circular dependency detected at node {node}")]
    CircularDependency {
        node: NodeId,
    },

    /// A node failed and was not recovered by its retry policy.
    #[error("{0}")]
    Node(NodeError),

    /// Structured exception raised by an action, classified by error code.
    #[error("ecode: {ecode}, message: {message}")]
    Exception {
        ecode: String,
        message: String,
    },

    /// Any otherwise unclassified failure during a run.
    #[error("{0}")]
    Workflow(String),

    /// The run exceeded the workflow deadline.
    #[error("workflow timed out after {0} ms")]
    Timeout(u64),

    /// The run was cancelled before it finished.
    #[error("workflow execution cancelled")]
    Cancelled,

    /// The workflow failed save-time validation.
    #[error("workflow validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Connection definition errors.
    #[error("{0}")]
    Edge(String),

    /// A requested workflow or execution is unknown.
    #[error("{0}")]
    NotFound(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),

    /// Message queue errors.
    #[error("{0}")]
    Queue(String),
}

/// Error raised by a single node execution.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NodeError {
    /// Machine readable error code, matched against the retry policy.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Node that raised the error.
    pub node_id: NodeId,
    /// When the error was raised.
    pub timestamp: DateTime<Utc>,
    /// Whether the active retry policy lists `code` as retryable.
    pub recoverable: bool,
}

impl NodeError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        node_id: impl Into<NodeId>,
        recoverable: bool,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            node_id: node_id.into(),
            timestamp: Utc::now(),
            recoverable,
        }
    }
}

impl fmt::Display for NodeError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "node {} failed [{}]: {}", self.node_id, self.code, self.message)
    }
}

impl NodeflowError {
    /// Error code used when this error is attached to a node.
    pub fn code(&self) -> &str {
        match self {
            NodeflowError::Exception {
                ecode, ..
            } => ecode,
            NodeflowError::Node(e) => &e.code,
            NodeflowError::Timeout(_) => "TIMEOUT",
            NodeflowError::Convert(_) => "INVALID_CONFIG",
            _ => "EXECUTION_ERROR",
        }
    }

    /// Message without the code prefix added by `Display`.
    pub fn message(&self) -> String {
        match self {
            NodeflowError::Exception {
                message, ..
            } => message.clone(),
            NodeflowError::Node(e) => e.message.clone(),
            other => other.to_string(),
        }
    }

    /// Shorthand for an action-raised coded error.
    pub fn exception(
        ecode: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        NodeflowError::Exception {
            ecode: ecode.into(),
            message: message.into(),
        }
    }
}

impl From<NodeflowError> for String {
    fn from(val: NodeflowError) -> Self {
        val.to_string()
    }
}

impl From<NodeError> for NodeflowError {
    fn from(error: NodeError) -> Self {
        NodeflowError::Node(error)
    }
}

impl From<std::io::Error> for NodeflowError {
    fn from(error: std::io::Error) -> Self {
        NodeflowError::IoError(error.to_string())
    }
}

impl From<NodeflowError> for std::io::Error {
    fn from(val: NodeflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for NodeflowError {
    fn from(error: serde_json::Error) -> Self {
        NodeflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for NodeflowError {
    fn from(error: toml::de::Error) -> Self {
        NodeflowError::Config(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for NodeflowError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        NodeflowError::Convert(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_code_and_message() {
        let err = NodeflowError::exception("RATE_LIMITED", "slow down");
        assert_eq!(err.code(), "RATE_LIMITED");
        assert_eq!(err.message(), "slow down");
        assert_eq!(err.to_string(), "ecode: RATE_LIMITED, message: slow down");
    }

    #[test]
    fn test_node_error_display() {
        let err = NodeError::new("NETWORK_ERROR", "connection reset", "api-1", true);
        assert_eq!(err.to_string(), "node api-1 failed [NETWORK_ERROR]: connection reset");
        assert_eq!(NodeflowError::from(err).code(), "NETWORK_ERROR");
    }

    #[test]
    fn test_validation_display_joins_errors() {
        let err = NodeflowError::Validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "workflow validation failed: a; b");
    }
}
