pub mod actions;
pub mod consts;
mod connection;
mod node;
mod order;
mod retry;
pub mod template;
mod validator;
mod workflow;

pub use connection::{Connection, ConnectionId};
pub use node::{Node, NodeId, NodeType};
pub use order::execution_order;
pub use retry::RetryPolicy;
pub use validator::{ValidationReport, validate, validate_with};
pub use workflow::Workflow;
