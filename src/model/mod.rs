mod connection;
mod node;
mod workflow;

pub use connection::ConnectionModel;
pub use node::NodeModel;
pub use workflow::{ErrorHandling, WorkflowModel, WorkflowSettings};
