mod cache;
mod id;
mod queue;

pub use cache::MemCache;
pub use id::{IdGenerator, NanoIdGenerator, SequentialIdGenerator};
pub use queue::{BroadcastQueue, Queue};
