use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, RwLock},
};

use futures::future::BoxFuture;
use tracing::warn;

use crate::{
    NodeflowError, Result, ShareLock,
    common::{BroadcastQueue, Queue},
    config::ChannelConfig,
    events::{Event, Log, Message},
    runtime::ExecutionId,
};

macro_rules! dispatch_event {
    ($handles:expr, $item:expr) => {
        let handlers = $handles.read().unwrap().clone();
        for handle in handlers.iter() {
            if catch_unwind(AssertUnwindSafe(|| (handle)($item))).is_err() {
                warn!("observer panicked while handling an event");
            }
        }
    };
}

macro_rules! dispatch_event_async {
    ($handles:expr, $item:expr) => {
        let handlers = $handles.read().unwrap().clone();
        if !handlers.is_empty() {
            match tokio::runtime::Handle::try_current() {
                Ok(rt) => {
                    let item = $item.clone();
                    rt.spawn(async move {
                        for handle in handlers.iter() {
                            (handle)(&item).await;
                        }
                    });
                }
                Err(_) => warn!("async observers skipped: no tokio runtime"),
            }
        }
    };
}

pub type WorkflowEventHandle = Arc<dyn Fn(&Event<Message>) + Send + Sync>;
pub type WorkflowLogHandle = Arc<dyn Fn(&Event<Log>) + Send + Sync>;
pub type WorkflowEventHandleAsync = Arc<dyn Fn(&Event<Message>) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// use the glob pattern to match the execution id
    /// eg. exec_*
    pub eid: String,

    /// use the glob pattern to match the node id
    /// eg. mail*
    pub nid: String,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            eid: "*".to_string(),
            nid: "*".to_string(),
        }
    }
}

#[allow(unused)]
impl ChannelOptions {
    pub fn new(
        eid: String,
        nid: String,
    ) -> Self {
        Self {
            eid,
            nid,
        }
    }

    pub fn with_eid(eid: String) -> Self {
        Self {
            eid,
            nid: "*".to_string(),
        }
    }

    pub fn with_nid(nid: String) -> Self {
        Self {
            eid: "*".to_string(),
            nid,
        }
    }
}

/// Delivery point for execution events and node log entries.
///
/// Synchronous observers run inline when a message is published, in
/// registration order, so they observe a run's events in the order the run
/// produced them. Async observers are spawned on the current tokio runtime.
/// Every message is also broadcast to [`Channel::subscribe`] receivers.
/// Observers are advisory: a panicking observer is logged and skipped.
#[derive(Clone)]
pub struct Channel {
    event_queue: Arc<BroadcastQueue<Event<Message>>>,
    log_queue: Arc<BroadcastQueue<Event<Log>>>,

    events: ShareLock<Vec<WorkflowEventHandle>>,
    logs: ShareLock<Vec<WorkflowLogHandle>>,
    events_async: ShareLock<Vec<WorkflowEventHandleAsync>>,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new(&ChannelConfig::default())
    }
}

impl Channel {
    pub fn new(config: &ChannelConfig) -> Self {
        Self {
            event_queue: BroadcastQueue::new(config.event_queue_size.max(1)),
            log_queue: BroadcastQueue::new(config.log_queue_size.max(1)),
            events: Arc::new(RwLock::new(Vec::new())),
            logs: Arc::new(RwLock::new(Vec::new())),
            events_async: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub(crate) fn publish(
        &self,
        message: Message,
    ) {
        let event = Event::new(&message);
        dispatch_event!(self.events, &event);
        dispatch_event_async!(self.events_async, event);
        let _ = self.event_queue.send(event);
    }

    pub(crate) fn publish_log(
        &self,
        log: Log,
    ) {
        let event = Event::new(&log);
        dispatch_event!(self.logs, &event);
        let _ = self.log_queue.send(event);
    }

    /// Stream of every event published after this call.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event<Message>> {
        self.event_queue.subscribe()
    }

    /// Stream of every log entry published after this call.
    pub fn subscribe_logs(&self) -> tokio::sync::broadcast::Receiver<Event<Log>> {
        self.log_queue.subscribe()
    }
}

#[derive(Clone)]
pub struct ChannelEvent {
    channel: Arc<Channel>,

    glob: (globset::GlobMatcher, globset::GlobMatcher),
}

#[allow(unused)]
impl ChannelEvent {
    pub fn channel(
        channel: Arc<Channel>,
        options: ChannelOptions,
    ) -> Result<Self> {
        let compile = |pattern: &str| -> Result<globset::GlobMatcher> {
            globset::Glob::new(pattern).map(|g| g.compile_matcher()).map_err(|e| NodeflowError::Config(format!("invalid channel pattern '{}': {}", pattern, e)))
        };

        Ok(Self {
            glob: (compile(&options.eid)?, compile(&options.nid)?),
            channel,
        })
    }

    /// Called with the execution id when a matching run completes.
    pub fn on_complete(
        &self,
        f: impl Fn(ExecutionId) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.events.write().unwrap().push(Arc::new(move |e| {
            if e.event.is_complete() && is_match(&glob, &e.eid, &e.nid) {
                f(e.eid.clone());
            }
        }));
    }

    pub fn on_error(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.events.write().unwrap().push(Arc::new(move |e| {
            if e.event.is_error() && is_match(&glob, &e.eid, &e.nid) {
                f(e);
            }
        }));
    }

    pub fn on_event(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.events.write().unwrap().push(Arc::new(move |e| {
            if is_match(&glob, &e.eid, &e.nid) {
                f(e);
            }
        }));
    }

    pub fn on_log(
        &self,
        f: impl Fn(&Event<Log>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.channel.logs.write().unwrap().push(Arc::new(move |e| {
            if is_match(&glob, &e.eid, &e.nid) {
                f(e);
            }
        }));
    }

    pub fn on_event_async<F>(
        &self,
        f: F,
    ) where
        F: Fn(&Event<Message>) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let glob = self.glob.clone();

        self.channel.events_async.write().unwrap().push(Arc::new(move |e| {
            if is_match(&glob, &e.eid, &e.nid) {
                f(e)
            } else {
                Box::pin(async {})
            }
        }));
    }

    /// Pull subscription: matching events are queued until taken. Events that
    /// arrive while the queue holds `cap` entries are dropped.
    pub fn queue(
        &self,
        cap: usize,
    ) -> Arc<Queue<Event<Message>>> {
        let queue = Queue::new(cap.max(1));
        let sink = queue.clone();
        self.on_event(move |e| {
            let _ = sink.send(e.clone());
        });
        queue
    }
}

fn is_match(
    glob: &(globset::GlobMatcher, globset::GlobMatcher),
    eid: &str,
    nid: &str,
) -> bool {
    let (pat_eid, pat_nid) = glob;
    pat_eid.is_match(eid) && pat_nid.is_match(nid)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        events::{GraphEvent, WorkflowEvent},
        runtime::{ExecutionContext, LogEntry, WorkflowExecution},
    };

    fn message(
        eid: &str,
        nid: &str,
    ) -> Message {
        Message {
            eid: eid.to_string(),
            nid: nid.to_string(),
            event: GraphEvent::Workflow(WorkflowEvent::Updated(WorkflowExecution::new(eid.to_string(), "wf", ExecutionContext::default()))),
        }
    }

    #[test]
    fn test_sync_observers_filter_by_glob() {
        let channel = Arc::new(Channel::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        ChannelEvent::channel(channel.clone(), ChannelOptions::with_eid("exec_1*".to_string())).unwrap().on_event(move |e| {
            sink.lock().unwrap().push(format!("{}/{}", e.eid, e.nid));
        });

        channel.publish(message("exec_1", "a"));
        channel.publish(message("exec_2", "a"));
        channel.publish(message("exec_12", "b"));

        assert_eq!(*seen.lock().unwrap(), vec!["exec_1/a", "exec_12/b"]);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let channel = Arc::new(Channel::default());
        assert!(ChannelEvent::channel(channel, ChannelOptions::with_nid("[".to_string())).is_err());
    }

    #[test]
    fn test_panicking_observer_does_not_stop_delivery() {
        let channel = Arc::new(Channel::default());
        let observers = ChannelEvent::channel(channel.clone(), ChannelOptions::default()).unwrap();
        observers.on_event(|_| panic!("observer bug"));
        let queue = observers.queue(4);

        channel.publish(message("exec_1", ""));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_logs_reach_log_observers() {
        let channel = Arc::new(Channel::default());
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        ChannelEvent::channel(channel.clone(), ChannelOptions::with_nid("mail".to_string())).unwrap().on_log(move |_| {
            *sink.lock().unwrap() += 1;
        });

        for nid in ["mail", "other"] {
            channel.publish_log(Log {
                eid: "exec_1".to_string(),
                nid: nid.to_string(),
                entry: LogEntry::info("sent"),
            });
        }
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_async_observer_and_broadcast() {
        let channel = Arc::new(Channel::default());
        let (tx, rx) = tokio::sync::oneshot::channel::<String>();
        let tx = Arc::new(Mutex::new(Some(tx)));
        ChannelEvent::channel(channel.clone(), ChannelOptions::default()).unwrap().on_event_async(move |e| {
            let tx = tx.clone();
            let eid = e.eid.clone();
            Box::pin(async move {
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(eid);
                }
            })
        });
        let mut stream = channel.subscribe();

        channel.publish(message("exec_9", ""));

        assert_eq!(rx.await.unwrap(), "exec_9");
        assert_eq!(stream.recv().await.unwrap().eid, "exec_9");
    }
}
