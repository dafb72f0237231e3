use std::{collections::HashSet, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use futures::StreamExt;
use shared::{
    domain::{Event, EventId},
    error::ValidationError,
    protocol::EventDraft,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

pub mod clock;
pub mod countdown;
pub mod projection;
pub mod remote;

pub use clock::{Clock, SystemClock};
pub use countdown::{Countdown, CountdownState, EventStatus};
pub use projection::{EventViewModel, FilterMode, ScheduleView};
pub use remote::{HttpRemoteStore, MissingRemoteStore, RemoteEventStore, SnapshotStream};

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Failures surfaced asynchronously on the planner event channel. Remote
/// writes are recoverable and leave the cache untouched; losing the snapshot
/// subscription freezes the cache at its last known state.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("remote write failed: {0}")]
    RemoteWrite(String),
    #[error("snapshot subscription lost: {0}")]
    Subscription(String),
}

#[derive(Debug, Clone)]
pub enum PlannerEvent {
    ViewUpdated(ScheduleView),
    Error(SyncError),
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Period of the shared projection tick. One timer drives every visible
    /// countdown, so cards cannot drift apart.
    pub tick_interval: Duration,
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

struct PlannerState {
    cache: Vec<Event>,
    filter: FilterMode,
    loading: bool,
    subscription_lost: bool,
}

#[derive(Default)]
struct SyncTasks {
    sync: Option<JoinHandle<()>>,
    tick: Option<JoinHandle<()>>,
}

/// Owner of the locally cached event collection. The cache is mutated only
/// by snapshot notifications from the remote store; create and delete intents
/// are forwarded without optimistic local writes, so the next snapshot is the
/// sole source of truth.
pub struct PlannerClient {
    remote: Arc<dyn RemoteEventStore>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    inner: Mutex<PlannerState>,
    tasks: Mutex<SyncTasks>,
    events: broadcast::Sender<PlannerEvent>,
}

impl PlannerClient {
    pub fn new(remote: Arc<dyn RemoteEventStore>) -> Arc<Self> {
        Self::new_with_dependencies(remote, Arc::new(SystemClock), SyncConfig::default())
    }

    pub fn new_with_dependencies(
        remote: Arc<dyn RemoteEventStore>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(config.event_capacity);
        Arc::new(Self {
            remote,
            clock,
            config,
            inner: Mutex::new(PlannerState {
                cache: Vec::new(),
                filter: FilterMode::default(),
                loading: true,
                subscription_lost: false,
            }),
            tasks: Mutex::new(SyncTasks::default()),
            events,
        })
    }

    /// Starts the snapshot subscription and the shared projection tick.
    /// Calling it on an already connected client is a no-op.
    pub async fn connect(self: &Arc<Self>) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        if tasks.sync.is_some() {
            return Ok(());
        }

        let stream = self
            .remote
            .subscribe()
            .await
            .context("failed to subscribe to the event collection")?;

        tasks.sync = Some(self.spawn_sync_task(stream));
        tasks.tick = Some(self.spawn_tick_task());
        Ok(())
    }

    /// Stops snapshot delivery and the projection tick. Safe to call more
    /// than once; later calls find nothing left to stop.
    pub async fn shutdown(&self) {
        let (sync, tick) = {
            let mut tasks = self.tasks.lock().await;
            (tasks.sync.take(), tasks.tick.take())
        };
        if let Some(task) = sync {
            task.abort();
        }
        if let Some(task) = tick {
            task.abort();
        }
    }

    /// Validates and forwards a create intent. The cache is never touched
    /// here; the event only appears once the store pushes the next snapshot,
    /// so a failed write cannot leave a ghost entry behind. Write failures
    /// surface asynchronously as [`SyncError::RemoteWrite`].
    pub async fn request_create(&self, draft: EventDraft) -> Result<(), ValidationError> {
        let event = draft.normalize(EventId::generate())?;
        let remote = Arc::clone(&self.remote);
        let events = self.events.clone();
        tokio::spawn(async move {
            match remote.create(&event).await {
                Ok(id) => debug!(event_id = %id, title = %event.title, "create persisted"),
                Err(err) => {
                    warn!(title = %event.title, "create rejected by store: {err}");
                    let _ = events.send(PlannerEvent::Error(SyncError::RemoteWrite(format!(
                        "failed to create event '{}': {err}",
                        event.title
                    ))));
                }
            }
        });
        Ok(())
    }

    /// Forwards a delete intent; like creates, the cache only changes via the
    /// next snapshot.
    pub async fn request_delete(&self, id: EventId) {
        let remote = Arc::clone(&self.remote);
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(err) = remote.delete(&id).await {
                warn!(event_id = %id, "delete rejected by store: {err}");
                let _ = events.send(PlannerEvent::Error(SyncError::RemoteWrite(format!(
                    "failed to delete event {id}: {err}"
                ))));
            }
        });
    }

    /// Current cache contents in insertion order. Presentation ordering is
    /// the projector's job, not the cache's.
    pub async fn snapshot(&self) -> Vec<Event> {
        self.inner.lock().await.cache.clone()
    }

    pub async fn filter(&self) -> FilterMode {
        self.inner.lock().await.filter
    }

    /// True until the first snapshot arrives. Stays set forever if the
    /// subscription dies before one does.
    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.loading
    }

    pub async fn is_subscription_lost(&self) -> bool {
        self.inner.lock().await.subscription_lost
    }

    pub async fn set_filter(&self, filter: FilterMode) {
        let view = {
            let mut guard = self.inner.lock().await;
            guard.filter = filter;
            self.project_locked(&guard)
        };
        let _ = self.events.send(PlannerEvent::ViewUpdated(view));
    }

    pub async fn current_view(&self) -> ScheduleView {
        let guard = self.inner.lock().await;
        self.project_locked(&guard)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PlannerEvent> {
        self.events.subscribe()
    }

    fn project_locked(&self, state: &PlannerState) -> ScheduleView {
        ScheduleView {
            entries: projection::project(&state.cache, state.filter, self.clock.now()),
            filter: state.filter,
            loading: state.loading,
        }
    }

    /// Replaces the cache wholesale with the snapshot contents. Duplicate ids
    /// within one snapshot are a collaborator fault; the first occurrence
    /// wins so the unique-id invariant holds locally.
    async fn apply_snapshot(&self, events: Vec<Event>) {
        let mut deduped: Vec<Event> = Vec::with_capacity(events.len());
        let mut seen: HashSet<EventId> = HashSet::with_capacity(events.len());
        for event in events {
            if !seen.insert(event.id.clone()) {
                warn!(event_id = %event.id, "duplicate id in snapshot; keeping first occurrence");
                continue;
            }
            deduped.push(event);
        }

        let view = {
            let mut guard = self.inner.lock().await;
            guard.cache = deduped;
            guard.loading = false;
            self.project_locked(&guard)
        };
        let _ = self.events.send(PlannerEvent::ViewUpdated(view));
    }

    fn spawn_sync_task(self: &Arc<Self>, mut stream: SnapshotStream) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(events) = stream.next().await {
                info!(events = events.len(), "snapshot received");
                client.apply_snapshot(events).await;
            }

            {
                let mut guard = client.inner.lock().await;
                guard.subscription_lost = true;
            }
            warn!("snapshot stream ended; cache frozen at last known state");
            let _ = client.events.send(PlannerEvent::Error(SyncError::Subscription(
                "snapshot stream ended".to_string(),
            )));
        })
    }

    fn spawn_tick_task(self: &Arc<Self>) -> JoinHandle<()> {
        let client = Arc::clone(self);
        let period = self.config.tick_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let view = client.current_view().await;
                let _ = client.events.send(PlannerEvent::ViewUpdated(view));
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
