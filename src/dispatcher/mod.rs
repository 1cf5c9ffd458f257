//! Sequential execution of a workflow run.

mod dispatcher;
mod executor;

pub(crate) use dispatcher::Dispatcher;
pub(crate) use executor::{Deadline, NodeExecutor};
