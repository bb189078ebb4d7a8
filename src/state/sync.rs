//! Bridge between the local cache and an optional remote store.
//!
//! Outbound writes are queued and forgotten: a single writer per attached store
//! applies them in order, a failure is logged and recorded in the
//! [`SyncErrorSink`], the local mutation stays. Inbound snapshots from the
//! remote subscriptions overwrite the cache and are published as change events.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use futures::{StreamExt, future::BoxFuture, stream::BoxStream};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{
    dao::{
        local_cache::{Collection, LocalCache},
        models::{ConfigPatch, GuestEntity},
        remote_store::RemoteStore,
        storage::{StorageError, StorageResult},
    },
    state::events::{EventChannel, SyncKind, SyncPayload},
};

/// A remote operation that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncFailure {
    /// Operation that failed, e.g. `put guest g1`.
    pub operation: String,
    /// Error message reported by the store.
    pub message: String,
    /// RFC 3339 time the failure was recorded.
    pub at: String,
}

impl SyncFailure {
    fn now(operation: impl Into<String>, err: &StorageError) -> Self {
        Self {
            operation: operation.into(),
            message: err.to_string(),
            at: now_rfc3339(),
        }
    }
}

/// Destination for failures of fire-and-forget remote operations.
pub trait SyncErrorSink: Send + Sync {
    /// Record one failure.
    fn record(&self, failure: SyncFailure);
    /// Most recent failures, oldest first.
    fn recent(&self) -> Vec<SyncFailure>;
}

/// Bounded in-memory log of the most recent sync failures.
pub struct SyncErrorLog {
    capacity: usize,
    entries: Mutex<VecDeque<SyncFailure>>,
}

impl SyncErrorLog {
    /// Keep at most `capacity` failures; older ones are dropped.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }
}

impl SyncErrorSink for SyncErrorLog {
    fn record(&self, failure: SyncFailure) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(failure);
    }

    fn recent(&self) -> Vec<SyncFailure> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().cloned().collect()
    }
}

/// Everything an inbound listener needs to apply snapshots.
#[derive(Clone)]
struct Inbound {
    cache: LocalCache,
    events: Arc<EventChannel>,
    errors: Arc<dyn SyncErrorSink>,
}

impl Inbound {
    fn apply_guest_snapshot(&self, guests: Vec<GuestEntity>) {
        {
            let _gate = self.cache.lock();
            self.cache.write(Collection::Guests, &guests);
        }
        debug!(guests = guests.len(), "applied remote guest snapshot");
        self.events
            .publish(SyncKind::GuestUpdated, SyncPayload::default());
    }

    fn apply_config_snapshot(&self, config: ConfigPatch) {
        let fields = config.field_names();
        let mut published = Vec::with_capacity(fields.len());
        {
            let _gate = self.cache.lock();
            if let Some(categories) = &config.categories {
                self.cache.write(Collection::Categories, categories);
                published.push(SyncKind::CategoriesUpdated);
            }
            if let Some(winners) = &config.winners {
                self.cache.write(Collection::Winners, winners);
                published.push(SyncKind::WinnersUpdated);
            }
            if let Some(show_date) = &config.show_date {
                self.cache.write(Collection::ShowDate, show_date);
                published.push(SyncKind::ShowDateUpdated);
            }
        }
        debug!(?fields, "applied remote config snapshot");
        for kind in published {
            self.events.publish(kind, SyncPayload::default());
        }
    }

    fn record(&self, operation: &str, err: &StorageError) {
        self.errors.record(SyncFailure::now(operation, err));
    }
}

async fn listen<T>(
    mut stream: BoxStream<'static, StorageResult<T>>,
    name: &'static str,
    inbound: Inbound,
    apply: fn(&Inbound, T),
) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(snapshot) => apply(&inbound, snapshot),
            Err(err) => {
                warn!(subscription = name, error = %err, "remote subscription error");
                inbound.record(&format!("watch {name}"), &err);
            }
        }
    }
    info!(subscription = name, "remote subscription ended");
}

/// One outbound remote write, applied in submission order.
#[derive(Debug)]
enum Outbound {
    PutGuest(GuestEntity),
    DeleteGuest(String),
    MergeConfig(ConfigPatch),
}

impl Outbound {
    fn operation(&self) -> String {
        match self {
            Outbound::PutGuest(guest) => format!("put guest {}", guest.id),
            Outbound::DeleteGuest(id) => format!("delete guest {id}"),
            Outbound::MergeConfig(patch) => {
                format!("merge config [{}]", patch.field_names().join(", "))
            }
        }
    }

    fn send(self, store: &dyn RemoteStore) -> BoxFuture<'static, StorageResult<()>> {
        match self {
            Outbound::PutGuest(guest) => store.put_guest(guest),
            Outbound::DeleteGuest(id) => store.delete_guest(id),
            Outbound::MergeConfig(patch) => store.merge_config(patch),
        }
    }
}

/// Drain the outbound queue one write at a time so the store sees local order.
async fn forward(
    store: Arc<dyn RemoteStore>,
    mut queue: mpsc::UnboundedReceiver<Outbound>,
    inbound: Inbound,
) {
    while let Some(write) = queue.recv().await {
        let operation = write.operation();
        match write.send(store.as_ref()).await {
            Ok(()) => debug!(%operation, "remote write completed"),
            Err(err) => {
                warn!(%operation, error = %err, "remote write failed");
                inbound.record(&operation, &err);
            }
        }
    }
}

struct Attachment {
    outbound: mpsc::UnboundedSender<Outbound>,
    tasks: Vec<JoinHandle<()>>,
}

impl Attachment {
    fn stop(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

/// Owner of the remote store handle and its subscriptions.
///
/// Without an attached store every push is a no-op, which is the local-only mode.
pub struct SyncClient {
    inbound: Inbound,
    remote: RwLock<Option<Attachment>>,
}

impl SyncClient {
    /// Create a detached client.
    pub fn new(
        cache: LocalCache,
        events: Arc<EventChannel>,
        errors: Arc<dyn SyncErrorSink>,
    ) -> Self {
        Self {
            inbound: Inbound {
                cache,
                events,
                errors,
            },
            remote: RwLock::new(None),
        }
    }

    /// Attach a remote store, start listening to its guest and config snapshots and
    /// start the ordered outbound writer. Must be called from within a Tokio runtime.
    ///
    /// A previously attached store is detached first.
    pub fn attach(&self, store: Arc<dyn RemoteStore>) {
        let runtime = Handle::current();

        let guests = runtime.spawn(listen(
            store.watch_guests(),
            "guests",
            self.inbound.clone(),
            Inbound::apply_guest_snapshot,
        ));
        let config = runtime.spawn(listen(
            store.watch_config(),
            "config",
            self.inbound.clone(),
            Inbound::apply_config_snapshot,
        ));
        let (outbound, queue) = mpsc::unbounded_channel();
        let writer = runtime.spawn(forward(store, queue, self.inbound.clone()));

        let attachment = Attachment {
            outbound,
            tasks: vec![guests, config, writer],
        };
        let previous = self.lock_remote_mut().replace(attachment);
        if let Some(previous) = previous {
            previous.stop();
        }
        info!("remote store attached");
    }

    /// Stop the subscriptions and fall back to local-only mode.
    ///
    /// Writes still queued are dropped.
    pub fn detach(&self) {
        if let Some(attachment) = self.lock_remote_mut().take() {
            attachment.stop();
            info!("remote store detached; running local-only");
        }
    }

    /// Release every remote resource held by the client.
    pub fn shutdown(&self) {
        self.detach();
    }

    /// Whether a remote store is currently attached.
    pub fn is_attached(&self) -> bool {
        self.lock_remote().is_some()
    }

    /// Recently recorded failures.
    pub fn recent_failures(&self) -> Vec<SyncFailure> {
        self.inbound.errors.recent()
    }

    /// Forward a created or replaced guest.
    pub fn push_guest(&self, guest: &GuestEntity) {
        self.enqueue(Outbound::PutGuest(guest.clone()));
    }

    /// Forward a guest deletion.
    pub fn push_guest_deletion(&self, id: &str) {
        self.enqueue(Outbound::DeleteGuest(id.to_string()));
    }

    /// Merge the present fields of `patch` into the shared configuration record.
    pub fn push_config(&self, patch: ConfigPatch) {
        if patch.is_empty() {
            return;
        }
        self.enqueue(Outbound::MergeConfig(patch));
    }

    fn enqueue(&self, write: Outbound) {
        let guard = self.lock_remote();
        let Some(attachment) = guard.as_ref() else {
            return;
        };
        if let Err(mpsc::error::SendError(write)) = attachment.outbound.send(write) {
            debug!(operation = %write.operation(), "outbound writer stopped; write dropped");
        }
    }

    fn lock_remote(&self) -> std::sync::RwLockReadGuard<'_, Option<Attachment>> {
        self.remote.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_remote_mut(&self) -> std::sync::RwLockWriteGuard<'_, Option<Attachment>> {
        self.remote.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Current UTC time formatted as RFC 3339.
pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
