use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, Weak},
};

use tokio::runtime::Handle;
use tracing::debug;

use crate::{
    ChannelType, Result, ShareLock, StatusConfig,
    execution::{StatusChannel, StatusListener, StatusSource, StatusStream, Subscription},
};

/// Status subscriptions of one view.
///
/// Holds at most one active subscription per execution id. The monitor only
/// keeps weak references: a subscription lives as long as the view holds the
/// returned handle, and dropping the monitor closes everything it started.
pub struct StatusMonitor {
    config: StatusConfig,
    source: Arc<dyn StatusSource>,
    stream: Arc<dyn StatusStream>,
    channel: Arc<StatusChannel>,
    subscriptions: ShareLock<HashMap<String, Weak<Subscription>>>,

    runtime: Handle,
}

impl StatusMonitor {
    pub fn new(
        config: StatusConfig,
        source: Arc<dyn StatusSource>,
        stream: Arc<dyn StatusStream>,
        runtime: Handle,
    ) -> Self {
        let channel = StatusChannel::new();
        channel.listen(&runtime);

        Self {
            config,
            source,
            stream,
            channel,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            runtime,
        }
    }

    /// Subscribe to an execution, reusing the active subscription if any.
    pub fn watch(
        &self,
        execution_id: &str,
    ) -> Arc<Subscription> {
        let mut subscriptions = self.subscriptions.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(sub) = subscriptions.get(execution_id).and_then(Weak::upgrade) {
            if sub.is_active() {
                return sub;
            }
        }
        subscriptions.retain(|_, weak| weak.upgrade().is_some_and(|sub| sub.is_active()));

        debug!("status::watch({}, {:?})", execution_id, self.config.channel);
        let sub = Arc::new(match self.config.channel {
            ChannelType::Interval => Subscription::interval(
                execution_id,
                self.source.clone(),
                self.config.poll_interval(),
                self.config.stop_on_terminal,
                self.channel.clone(),
                &self.runtime,
            ),
            ChannelType::Push => Subscription::push(execution_id, self.stream.clone(), self.config.stop_on_terminal, self.channel.clone(), &self.runtime),
        });
        subscriptions.insert(execution_id.to_string(), Arc::downgrade(&sub));
        sub
    }

    /// Close the subscription of an execution, if one is running.
    pub fn unwatch(
        &self,
        execution_id: &str,
    ) {
        let removed = self.subscriptions.write().unwrap_or_else(PoisonError::into_inner).remove(execution_id);
        if let Some(sub) = removed.and_then(|weak| weak.upgrade()) {
            sub.close();
        }
    }

    pub fn close_all(&self) {
        let drained: Vec<Weak<Subscription>> = self.subscriptions.write().unwrap_or_else(PoisonError::into_inner).drain().map(|(_, weak)| weak).collect();
        for sub in drained.iter().filter_map(Weak::upgrade) {
            sub.close();
        }
    }

    /// Number of tracked subscriptions that are still running.
    pub fn active_count(&self) -> usize {
        self.subscriptions.read().unwrap_or_else(PoisonError::into_inner).values().filter_map(Weak::upgrade).filter(|sub| sub.is_active()).count()
    }

    pub fn channel(&self) -> Arc<StatusChannel> {
        self.channel.clone()
    }

    /// Callback registration for executions matching `pattern`.
    pub fn listener(
        &self,
        pattern: &str,
    ) -> Result<StatusListener> {
        StatusListener::new(self.channel.clone(), pattern)
    }
}

impl Drop for StatusMonitor {
    fn drop(&mut self) {
        self.close_all();
        self.channel.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use futures::{StreamExt, stream};
    use tokio::sync::broadcast;

    use super::*;
    use crate::{
        AgentflowError,
        execution::{ExecutionState, ExecutionStatus, NodeRunStatus, StatusEvent, StatusFrames, StatusMessage},
        model::NodeDraft,
        workflow::WorkflowGraph,
    };

    /// Replays scripted results, then keeps answering `Running`.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<ExecutionStatus>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<ExecutionStatus>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(
            &self,
            execution_id: &str,
        ) -> Result<ExecutionStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(ExecutionStatus::new(execution_id, ExecutionState::Running)))
        }
    }

    struct ScriptedStream {
        frames: Mutex<Option<Vec<Result<ExecutionStatus>>>>,
    }

    #[async_trait]
    impl StatusStream for ScriptedStream {
        async fn open(
            &self,
            _execution_id: &str,
        ) -> Result<StatusFrames> {
            match self.frames.lock().unwrap().take() {
                Some(frames) => Ok(stream::iter(frames).boxed()),
                None => Err(AgentflowError::Connection("refused".to_string())),
            }
        }
    }

    fn config(channel: ChannelType) -> StatusConfig {
        StatusConfig {
            channel,
            poll_interval_ms: 10,
            ..Default::default()
        }
    }

    fn monitor(
        channel: ChannelType,
        source: Arc<dyn StatusSource>,
        frames: Option<Vec<Result<ExecutionStatus>>>,
    ) -> StatusMonitor {
        let stream = Arc::new(ScriptedStream {
            frames: Mutex::new(frames),
        });
        StatusMonitor::new(config(channel), source, stream, Handle::current())
    }

    async fn events_until_closed(
        rx: &mut broadcast::Receiver<StatusMessage>,
        execution_id: &str,
    ) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
            if msg.execution_id != execution_id {
                continue;
            }
            let closed = msg.event == StatusEvent::Closed;
            events.push(msg.event);
            if closed {
                return events;
            }
        }
    }

    fn names(events: &[StatusEvent]) -> Vec<&str> {
        events.iter().map(|e| e.str()).collect()
    }

    #[tokio::test]
    async fn test_interval_skips_failed_tick_and_stops_on_terminal() {
        let source = ScriptedSource::new(vec![
            Err(AgentflowError::Connection("timeout".to_string())),
            Ok(ExecutionStatus::new("exec-1", ExecutionState::Running)),
            Ok(ExecutionStatus::new("exec-1", ExecutionState::Completed)),
        ]);
        let monitor = monitor(ChannelType::Interval, source.clone(), None);
        let mut rx = monitor.channel().subscribe();

        let sub = monitor.watch("exec-1");
        let events = events_until_closed(&mut rx, "exec-1").await;

        assert_eq!(names(&events), vec!["ConnectionError", "Updated", "Updated", "Finished", "Closed"]);
        assert_eq!(events[3], StatusEvent::Finished(ExecutionState::Completed));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(!sub.is_active());
        assert_eq!(sub.latest().unwrap().status, ExecutionState::Completed);
    }

    #[tokio::test]
    async fn test_push_error_closes_and_keeps_last_status() {
        let running = ExecutionStatus::new("exec-2", ExecutionState::Running).with_node(
            "a",
            NodeRunStatus {
                status: ExecutionState::Running,
                started_at: Some(10),
                completed_at: None,
            },
        );
        let frames = vec![Ok(running.clone()), Err(AgentflowError::Connection("reset".to_string())), Ok(ExecutionStatus::new("exec-2", ExecutionState::Completed))];
        let monitor = monitor(ChannelType::Push, ScriptedSource::new(vec![]), Some(frames));
        let mut rx = monitor.channel().subscribe();

        let sub = monitor.watch("exec-2");
        let events = events_until_closed(&mut rx, "exec-2").await;

        assert_eq!(names(&events), vec!["Updated", "ConnectionError", "Closed"]);
        assert_eq!(sub.latest(), Some(running));
        assert!(!sub.is_active());
    }

    #[tokio::test]
    async fn test_push_open_failure() {
        let monitor = monitor(ChannelType::Push, ScriptedSource::new(vec![]), None);
        let mut rx = monitor.channel().subscribe();

        let sub = monitor.watch("exec-3");
        let events = events_until_closed(&mut rx, "exec-3").await;

        assert_eq!(names(&events), vec!["ConnectionError", "Closed"]);
        assert!(sub.latest().is_none());
    }

    #[tokio::test]
    async fn test_one_active_subscription_per_execution() {
        let monitor = monitor(ChannelType::Interval, ScriptedSource::new(vec![]), None);
        let mut rx = monitor.channel().subscribe();

        let first = monitor.watch("exec-4");
        let second = monitor.watch("exec-4");
        let other = monitor.watch("exec-5");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));

        // dropping every handle tears the loop down
        drop(first);
        drop(second);
        let events = events_until_closed(&mut rx, "exec-4").await;
        assert_eq!(events.last(), Some(&StatusEvent::Closed));
        assert!(other.is_active());

        monitor.unwatch("exec-5");
        events_until_closed(&mut rx, "exec-5").await;
        assert!(!other.is_active());
    }

    #[tokio::test]
    async fn test_watch_after_close_starts_fresh() {
        let monitor = monitor(ChannelType::Interval, ScriptedSource::new(vec![]), None);
        let mut rx = monitor.channel().subscribe();

        let first = monitor.watch("exec-6");
        first.close();
        events_until_closed(&mut rx, "exec-6").await;

        let second = monitor.watch("exec-6");
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.is_active());
    }

    #[tokio::test]
    async fn test_watch_right_after_close_starts_fresh() {
        let monitor = monitor(ChannelType::Interval, ScriptedSource::new(vec![]), None);

        let first = monitor.watch("exec-10");
        first.close();
        assert!(!first.is_active());

        // no await between close and watch
        let second = monitor.watch("exec-10");
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.is_active());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(second.is_active());
        assert_eq!(monitor.active_count(), 1);
    }

    #[tokio::test]
    async fn test_registry_never_duplicates_live_subscriptions() {
        let monitor = monitor(ChannelType::Interval, ScriptedSource::new(vec![]), None);

        let ids: Vec<String> = (0..1500).map(|i| format!("exec-many-{}", i)).collect();
        let handles: Vec<Arc<Subscription>> = ids.iter().map(|id| monitor.watch(id)).collect();

        for (id, handle) in ids.iter().zip(handles.iter()) {
            assert!(Arc::ptr_eq(&monitor.watch(id), handle), "duplicate subscription for {}", id);
        }
        assert_eq!(monitor.active_count(), ids.len());

        drop(handles);
        monitor.watch("exec-after");
        assert!(monitor.active_count() <= 1);
    }

    #[tokio::test]
    async fn test_display_uses_last_known_status() {
        let graph = WorkflowGraph::new();
        let a = graph.add_node(NodeDraft::new("A", "agent"));
        let b = graph.add_node(NodeDraft::new("B", "agent"));

        let status = ExecutionStatus::new("exec-7", ExecutionState::Completed).with_node(
            a.id.clone(),
            NodeRunStatus {
                status: ExecutionState::Completed,
                started_at: Some(1),
                completed_at: Some(2),
            },
        );
        let monitor = monitor(ChannelType::Interval, ScriptedSource::new(vec![Ok(status)]), None);
        let mut rx = monitor.channel().subscribe();

        let sub = monitor.watch("exec-7");
        let before = sub.display(&graph.to_snapshot());
        assert!(before.iter().all(|d| d.status == ExecutionState::Pending));

        events_until_closed(&mut rx, "exec-7").await;
        let display = sub.display(&graph.to_snapshot());
        assert_eq!(display[0].node_id, a.id);
        assert_eq!(display[0].status, ExecutionState::Completed);
        assert_eq!(display[1].node_id, b.id);
        assert_eq!(display[1].status, ExecutionState::Pending);
        assert_eq!(graph.node_count(), 2);
    }

    #[tokio::test]
    async fn test_subscription_stream_yields_latest() {
        let monitor = monitor(
            ChannelType::Interval,
            ScriptedSource::new(vec![Ok(ExecutionStatus::new("exec-9", ExecutionState::Completed))]),
            None,
        );
        let sub = monitor.watch("exec-9");
        let mut updates = sub.stream();

        let last = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                match tokio_stream::StreamExt::next(&mut updates).await {
                    Some(Some(status)) if status.status.is_terminal() => return status,
                    Some(_) => continue,
                    None => panic!("stream ended without a status"),
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(last.status, ExecutionState::Completed);
    }

    #[tokio::test]
    async fn test_listener_sees_updates() {
        let monitor = monitor(
            ChannelType::Interval,
            ScriptedSource::new(vec![Ok(ExecutionStatus::new("exec-8", ExecutionState::Failed))]),
            None,
        );
        let updates = Arc::new(AtomicUsize::new(0));
        {
            let updates = updates.clone();
            monitor.listener("exec-8").unwrap().on_update(move |_| {
                updates.fetch_add(1, Ordering::SeqCst);
            });
        }
        let mut rx = monitor.channel().subscribe();

        let _sub = monitor.watch("exec-8");
        events_until_closed(&mut rx, "exec-8").await;
        for _ in 0..50 {
            if updates.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(updates.load(Ordering::SeqCst), 1);
    }
}
