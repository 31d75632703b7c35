use std::sync::{Arc, PoisonError, RwLock};

use tokio::{
    runtime::Handle,
    sync::broadcast::{self, error::RecvError},
};
use tracing::warn;

use crate::{
    AgentflowError, Result, ShareLock,
    common::{BroadcastQueue, Shutdown},
    execution::{ExecutionState, ExecutionStatus},
};

const STATUS_QUEUE_SIZE: usize = 1024;

/// What happened on a status subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// A new status replaced the previous one.
    Updated(ExecutionStatus),
    /// The transport failed. Interval channels retry on the next tick, push
    /// channels close right after this event.
    ConnectionError(AgentflowError),
    /// The execution reached a terminal state and polling stopped.
    Finished(ExecutionState),
    /// The subscription loop ended; the last known status stays available.
    Closed,
}

impl StatusEvent {
    pub fn str(&self) -> &str {
        match self {
            StatusEvent::Updated(_) => "Updated",
            StatusEvent::ConnectionError(_) => "ConnectionError",
            StatusEvent::Finished(_) => "Finished",
            StatusEvent::Closed => "Closed",
        }
    }
}

/// Status event tagged with the execution it belongs to.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub execution_id: String,
    pub event: StatusEvent,
}

pub type StatusHandle = Arc<dyn Fn(&StatusMessage) + Send + Sync>;

/// Fan-out of status events to the view.
pub struct StatusChannel {
    queue: Arc<BroadcastQueue<StatusMessage>>,
    handles: ShareLock<Vec<StatusHandle>>,

    shutdown: Arc<Shutdown>,
}

impl StatusChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: BroadcastQueue::new(STATUS_QUEUE_SIZE),
            handles: Arc::new(RwLock::new(Vec::new())),
            shutdown: Arc::new(Shutdown::new()),
        })
    }

    pub(crate) fn emit(
        &self,
        execution_id: &str,
        event: StatusEvent,
    ) {
        // no receivers is fine, the view may not listen at all
        let _ = self.queue.send(StatusMessage {
            execution_id: execution_id.to_string(),
            event,
        });
    }

    /// Raw receiver of every status message.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusMessage> {
        self.queue.subscribe()
    }

    /// Start dispatching messages to the registered handles.
    pub(crate) fn listen(
        &self,
        runtime: &Handle,
    ) {
        let mut queue = self.queue.subscribe();
        let handles = self.handles.clone();
        let shutdown = self.shutdown.clone();

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    msg = queue.recv() => match msg {
                        Ok(msg) => {
                            let handles = handles.read().unwrap_or_else(PoisonError::into_inner).clone();
                            for handle in handles.iter() {
                                (handle)(&msg);
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => warn!("status channel lagged, {} messages skipped", skipped),
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    fn register(
        &self,
        handle: StatusHandle,
    ) {
        self.handles.write().unwrap_or_else(PoisonError::into_inner).push(handle);
    }
}

/// Callback registration filtered by a glob over execution ids, e.g. `exec-42*`.
#[derive(Clone)]
pub struct StatusListener {
    channel: Arc<StatusChannel>,
    glob: globset::GlobMatcher,
}

impl StatusListener {
    pub fn new(
        channel: Arc<StatusChannel>,
        pattern: &str,
    ) -> Result<Self> {
        let glob = globset::Glob::new(pattern).map_err(|e| AgentflowError::Config(format!("invalid execution pattern '{}': {}", pattern, e)))?.compile_matcher();
        Ok(Self {
            channel,
            glob,
        })
    }

    pub fn on_event(
        &self,
        f: impl Fn(&StatusMessage) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();
        self.channel.register(Arc::new(move |msg| {
            if glob.is_match(&msg.execution_id) {
                f(msg);
            }
        }));
    }

    pub fn on_update(
        &self,
        f: impl Fn(&ExecutionStatus) + Send + Sync + 'static,
    ) {
        self.on_event(move |msg| {
            if let StatusEvent::Updated(status) = &msg.event {
                f(status);
            }
        });
    }

    pub fn on_error(
        &self,
        f: impl Fn(&str, &AgentflowError) + Send + Sync + 'static,
    ) {
        self.on_event(move |msg| {
            if let StatusEvent::ConnectionError(err) = &msg.event {
                f(&msg.execution_id, err);
            }
        });
    }

    pub fn on_closed(
        &self,
        f: impl Fn(&str) + Send + Sync + 'static,
    ) {
        self.on_event(move |msg| {
            if msg.event == StatusEvent::Closed {
                f(&msg.execution_id);
            }
        });
    }
}
