//! One live status feed for one execution.
//!
//! The loop replaces the last known status with every inbound message and
//! never touches the workflow graph. Dropping the last handle of a
//! [`Subscription`] tears the loop down.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    runtime::Handle,
    sync::watch,
    time::{self, MissedTickBehavior},
};
use tokio_stream::{StreamExt, wrappers::WatchStream};
use tracing::{debug, warn};

use crate::{
    ChannelType,
    common::Shutdown,
    execution::{DisplayNode, ExecutionStatus, StatusChannel, StatusEvent, StatusSource, StatusStream, merge_last_known},
    model::GraphSnapshot,
};

/// State shared between a subscription handle and its loop.
struct Feed {
    execution_id: String,
    latest: watch::Sender<Option<ExecutionStatus>>,
    channel: Arc<StatusChannel>,
    active: Arc<AtomicBool>,
    shutdown: Arc<Shutdown>,
}

impl Feed {
    fn publish(
        &self,
        status: ExecutionStatus,
    ) {
        self.latest.send_replace(Some(status.clone()));
        self.channel.emit(&self.execution_id, StatusEvent::Updated(status));
    }

    fn report(
        &self,
        event: StatusEvent,
    ) {
        self.channel.emit(&self.execution_id, event);
    }

    fn close(&self) {
        self.active.store(false, Ordering::SeqCst);
        debug!("status::close({})", self.execution_id);
        self.report(StatusEvent::Closed);
    }
}

pub struct Subscription {
    execution_id: String,
    channel_type: ChannelType,
    latest: watch::Receiver<Option<ExecutionStatus>>,
    active: Arc<AtomicBool>,
    shutdown: Arc<Shutdown>,
}

impl Subscription {
    fn start(
        execution_id: &str,
        channel_type: ChannelType,
        channel: Arc<StatusChannel>,
    ) -> (Self, Feed) {
        let (tx, rx) = watch::channel(None);
        let active = Arc::new(AtomicBool::new(true));
        let shutdown = Arc::new(Shutdown::new());

        let feed = Feed {
            execution_id: execution_id.to_string(),
            latest: tx,
            channel,
            active: active.clone(),
            shutdown: shutdown.clone(),
        };
        let sub = Self {
            execution_id: execution_id.to_string(),
            channel_type,
            latest: rx,
            active,
            shutdown,
        };
        (sub, feed)
    }

    /// Poll `source` every `period`. A failed tick is reported and skipped.
    pub(crate) fn interval(
        execution_id: &str,
        source: Arc<dyn StatusSource>,
        period: Duration,
        stop_on_terminal: bool,
        channel: Arc<StatusChannel>,
        runtime: &Handle,
    ) -> Self {
        let (sub, feed) = Self::start(execution_id, ChannelType::Interval, channel);
        runtime.spawn(run_interval(feed, source, period, stop_on_terminal));
        sub
    }

    /// Follow a push channel until it ends or fails once.
    pub(crate) fn push(
        execution_id: &str,
        stream: Arc<dyn StatusStream>,
        stop_on_terminal: bool,
        channel: Arc<StatusChannel>,
        runtime: &Handle,
    ) -> Self {
        let (sub, feed) = Self::start(execution_id, ChannelType::Push, channel);
        runtime.spawn(run_push(feed, stream, stop_on_terminal));
        sub
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    /// False as soon as `close` was requested, even while the loop winds down.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.shutdown.is_shutdown()
    }

    /// Last known status, kept after the loop has closed.
    pub fn latest(&self) -> Option<ExecutionStatus> {
        self.latest.borrow().clone()
    }

    /// Receiver notified on every status replacement.
    pub fn updates(&self) -> watch::Receiver<Option<ExecutionStatus>> {
        self.latest.clone()
    }

    /// Status replacements as a stream, starting with the current value.
    pub fn stream(&self) -> WatchStream<Option<ExecutionStatus>> {
        WatchStream::new(self.latest.clone())
    }

    /// Display records for `snapshot` using the last known status.
    pub fn display(
        &self,
        snapshot: &GraphSnapshot,
    ) -> Vec<DisplayNode> {
        let latest = self.latest.borrow();
        merge_last_known(snapshot, latest.as_ref())
    }

    pub fn close(&self) {
        self.shutdown.shutdown();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown.shutdown();
    }
}

async fn run_interval(
    feed: Feed,
    source: Arc<dyn StatusSource>,
    period: Duration,
    stop_on_terminal: bool,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = feed.shutdown.wait() => break,
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            _ = feed.shutdown.wait() => break,
            fetched = source.fetch(&feed.execution_id) => fetched,
        };

        match fetched {
            Ok(status) => {
                let state = status.status;
                feed.publish(status);
                if stop_on_terminal && state.is_terminal() {
                    feed.report(StatusEvent::Finished(state));
                    break;
                }
            }
            Err(err) => {
                warn!("status::poll({}) failed: {}", feed.execution_id, err);
                feed.report(StatusEvent::ConnectionError(err));
            }
        }
    }

    feed.close();
}

async fn run_push(
    feed: Feed,
    stream: Arc<dyn StatusStream>,
    stop_on_terminal: bool,
) {
    let opened = tokio::select! {
        _ = feed.shutdown.wait() => None,
        opened = stream.open(&feed.execution_id) => Some(opened),
    };

    let mut frames = match opened {
        Some(Ok(frames)) => frames,
        Some(Err(err)) => {
            warn!("status::open({}) failed: {}", feed.execution_id, err);
            feed.report(StatusEvent::ConnectionError(err));
            feed.close();
            return;
        }
        None => {
            feed.close();
            return;
        }
    };

    loop {
        let frame = tokio::select! {
            _ = feed.shutdown.wait() => break,
            frame = frames.next() => frame,
        };

        match frame {
            Some(Ok(status)) => {
                let state = status.status;
                feed.publish(status);
                if stop_on_terminal && state.is_terminal() {
                    feed.report(StatusEvent::Finished(state));
                    break;
                }
            }
            Some(Err(err)) => {
                warn!("status::push({}) failed: {}", feed.execution_id, err);
                feed.report(StatusEvent::ConnectionError(err));
                break;
            }
            None => break,
        }
    }

    feed.close();
}
