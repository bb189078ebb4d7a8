//! In-process and cross-tab notification of collection changes.
//!
//! Every mutation publishes a [`SyncMessage`] on the [`EventChannel`] of the tab
//! that performed it. Handlers registered on that channel run synchronously, the
//! message is fanned out to broadcast receivers (SSE clients), and it is posted to
//! the [`TabChannel`] so every other tab joined to the same bus sees it as well.

use std::sync::{
    Arc, Mutex, PoisonError, Weak,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::local_cache::{Collection, LocalCache};

/// Kind of change carried by a [`SyncMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SyncKind {
    /// The category list was replaced.
    CategoriesUpdated,
    /// One or more guests were created, replaced or removed.
    GuestUpdated,
    /// A winner was set or cleared.
    WinnersUpdated,
    /// The show date changed.
    ShowDateUpdated,
    /// Another tab wrote the named storage key; only the key is known.
    StorageChange,
}

impl SyncKind {
    /// Event name used on the SSE stream.
    pub fn as_str(self) -> &'static str {
        match self {
            SyncKind::CategoriesUpdated => "categories-updated",
            SyncKind::GuestUpdated => "guest-updated",
            SyncKind::WinnersUpdated => "winners-updated",
            SyncKind::ShowDateUpdated => "show-date-updated",
            SyncKind::StorageChange => "storage-change",
        }
    }
}

/// Optional details attached to a [`SyncMessage`].
///
/// Consumers treat messages as "refresh" hints and re-read the cache, so every
/// field is informative only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Winning nominee; absent when a winner was cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominee: Option<String>,
    /// Storage key, set on `storage-change` messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl SyncPayload {
    /// Payload naming a single guest.
    pub fn guest(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Payload naming a whole party.
    pub fn party(party_id: impl Into<String>) -> Self {
        Self {
            party_id: Some(party_id.into()),
            ..Self::default()
        }
    }

    /// Payload describing a winner change.
    pub fn winner(category: impl Into<String>, nominee: Option<String>) -> Self {
        Self {
            category: Some(category.into()),
            nominee,
            ..Self::default()
        }
    }
}

/// Change notification `{type, payload, ts}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SyncMessage {
    #[serde(rename = "type")]
    pub kind: SyncKind,
    #[serde(default)]
    pub payload: SyncPayload,
    /// Milliseconds since the Unix epoch at publication.
    pub ts: u64,
}

impl SyncMessage {
    /// Build a message stamped with the current time.
    pub fn new(kind: SyncKind, payload: SyncPayload) -> Self {
        let ts = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Self {
            kind,
            payload,
            ts: u64::try_from(ts).unwrap_or_default(),
        }
    }

    /// Collection the message refers to.
    pub fn collection(&self) -> Option<Collection> {
        match self.kind {
            SyncKind::CategoriesUpdated => Some(Collection::Categories),
            SyncKind::GuestUpdated => Some(Collection::Guests),
            SyncKind::WinnersUpdated => Some(Collection::Winners),
            SyncKind::ShowDateUpdated => Some(Collection::ShowDate),
            SyncKind::StorageChange => self.payload.key.as_deref().and_then(Collection::from_key),
        }
    }

    fn storage_change(collection: Collection) -> Self {
        Self::new(
            SyncKind::StorageChange,
            SyncPayload {
                key: Some(collection.key().to_string()),
                ..SyncPayload::default()
            },
        )
    }
}

/// Message travelling on a [`TabChannel`], tagged with the posting tab.
#[derive(Debug, Clone)]
struct TabEnvelope {
    origin: Uuid,
    message: SyncMessage,
}

/// Broadcast bus joined by every tab of one device.
///
/// A message posted by one tab reaches every other tab; it is never echoed back
/// to the sender.
#[derive(Clone)]
pub struct TabChannel {
    sender: broadcast::Sender<TabEnvelope>,
}

impl TabChannel {
    /// Create a bus buffering up to `capacity` undelivered messages per tab.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    fn post(&self, envelope: TabEnvelope) {
        let _ = self.sender.send(envelope);
    }

    fn subscribe(&self) -> broadcast::Receiver<TabEnvelope> {
        self.sender.subscribe()
    }
}

type Handler = Arc<dyn Fn(&SyncMessage) + Send + Sync>;

struct Registration {
    filter: Option<Collection>,
    handler: Handler,
}

struct ChannelInner {
    tab_id: Uuid,
    local: broadcast::Sender<SyncMessage>,
    handlers: DashMap<u64, Registration>,
    next_id: AtomicU64,
    tab: Option<TabChannel>,
    relays: Mutex<Vec<JoinHandle<()>>>,
}

impl ChannelInner {
    fn dispatch(&self, message: &SyncMessage) {
        // Handlers may subscribe or unsubscribe, so none run while the map is borrowed.
        let handlers: Vec<Handler> = self
            .handlers
            .iter()
            .filter(|entry| match entry.filter {
                None => true,
                Some(collection) => message.collection() == Some(collection),
            })
            .map(|entry| Arc::clone(&entry.handler))
            .collect();
        for handler in handlers {
            handler(message);
        }
        let _ = self.local.send(message.clone());
    }
}

/// Per-tab event channel.
pub struct EventChannel {
    inner: Arc<ChannelInner>,
}

impl EventChannel {
    /// Create a channel, optionally joined to a cross-tab bus.
    pub fn new(capacity: usize, tab: Option<TabChannel>) -> Self {
        let (local, _receiver) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(ChannelInner {
                tab_id: Uuid::new_v4(),
                local,
                handlers: DashMap::new(),
                next_id: AtomicU64::new(1),
                tab,
                relays: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Publish a change made by this tab.
    pub fn publish(&self, kind: SyncKind, payload: SyncPayload) {
        let message = SyncMessage::new(kind, payload);
        debug!(kind = kind.as_str(), "publishing sync event");
        self.inner.dispatch(&message);
        if let Some(tab) = &self.inner.tab {
            tab.post(TabEnvelope {
                origin: self.inner.tab_id,
                message,
            });
        }
    }

    /// Register a handler for messages about `collection` (or every message when `None`).
    pub fn subscribe<F>(&self, collection: Option<Collection>, handler: F) -> Subscription
    where
        F: Fn(&SyncMessage) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers.insert(
            id,
            Registration {
                filter: collection,
                handler: Arc::new(handler),
            },
        );
        Subscription {
            channel: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Register a handler receiving every message, local or from other tabs.
    pub fn on_sync<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SyncMessage) + Send + Sync + 'static,
    {
        self.subscribe(None, handler)
    }

    /// Receiver of every message dispatched on this channel.
    pub fn receiver(&self) -> broadcast::Receiver<SyncMessage> {
        self.inner.local.subscribe()
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }

    /// Start forwarding other tabs' messages and foreign storage writes into this channel.
    ///
    /// Must be called from within a Tokio runtime. Calling it again replaces the relays.
    pub fn spawn_relays(&self, cache: &LocalCache) {
        let mut relays = Vec::with_capacity(2);

        if let Some(tab) = &self.inner.tab {
            let mut receiver = tab.subscribe();
            let weak = Arc::downgrade(&self.inner);
            relays.push(tokio::spawn(async move {
                loop {
                    let envelope = match receiver.recv().await {
                        Ok(envelope) => envelope,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(skipped, "tab channel lagged");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    };
                    let Some(inner) = weak.upgrade() else { break };
                    if envelope.origin != inner.tab_id {
                        inner.dispatch(&envelope.message);
                    }
                }
            }));
        }

        let mut signals = cache.storage_signals();
        let weak = Arc::downgrade(&self.inner);
        relays.push(tokio::spawn(async move {
            while let Some(collection) = signals.next().await {
                let Some(inner) = weak.upgrade() else { break };
                inner.dispatch(&SyncMessage::storage_change(collection));
            }
        }));

        let previous = std::mem::replace(&mut *self.lock_relays(), relays);
        for relay in previous {
            relay.abort();
        }
    }

    /// Stop the relay tasks; locally published messages keep working.
    pub fn shutdown(&self) {
        let relays = std::mem::take(&mut *self.lock_relays());
        if !relays.is_empty() {
            info!(relays = relays.len(), "stopping event relays");
        }
        for relay in relays {
            relay.abort();
        }
    }

    fn lock_relays(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.inner
            .relays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle returned by [`EventChannel::subscribe`]; the handler stays registered
/// until [`Subscription::unsubscribe`] is called.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    channel: Weak<ChannelInner>,
    id: u64,
}

impl Subscription {
    /// Remove the handler. Returns `false` when it was already gone.
    pub fn unsubscribe(self) -> bool {
        self.channel
            .upgrade()
            .is_some_and(|inner| inner.handlers.remove(&self.id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::atomic::AtomicUsize, time::Duration};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&SyncMessage) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        (count, move |_: &SyncMessage| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn message_serializes_with_type_tag() {
        let message = SyncMessage::new(
            SyncKind::WinnersUpdated,
            SyncPayload::winner("Best Picture", None),
        );
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "winners-updated");
        assert_eq!(json["payload"]["category"], "Best Picture");
        assert!(json["payload"].get("nominee").is_none());
        assert!(json["ts"].as_u64().unwrap() > 0);
    }

    #[test]
    fn storage_change_resolves_its_collection() {
        let message = SyncMessage::storage_change(Collection::Guests);
        assert_eq!(message.payload.key.as_deref(), Some("oscar_guests"));
        assert_eq!(message.collection(), Some(Collection::Guests));
    }

    #[test]
    fn handlers_filter_by_collection() {
        let channel = EventChannel::new(8, None);
        let (all, all_handler) = counter();
        let (winners, winners_handler) = counter();
        let _all = channel.on_sync(all_handler);
        let _winners = channel.subscribe(Some(Collection::Winners), winners_handler);

        channel.publish(SyncKind::GuestUpdated, SyncPayload::guest("g1"));
        channel.publish(SyncKind::WinnersUpdated, SyncPayload::winner("X", None));

        assert_eq!(all.load(Ordering::SeqCst), 2);
        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let channel = EventChannel::new(8, None);
        let (count, handler) = counter();
        let subscription = channel.on_sync(handler);

        channel.publish(SyncKind::CategoriesUpdated, SyncPayload::default());
        assert!(subscription.unsubscribe());
        channel.publish(SyncKind::CategoriesUpdated, SyncPayload::default());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(channel.handler_count(), 0);
    }

    #[test]
    fn handler_may_subscribe_while_dispatching() {
        let channel = Arc::new(EventChannel::new(8, None));
        let inner_channel = Arc::clone(&channel);
        let _outer = channel.on_sync(move |_| {
            let _nested = inner_channel.on_sync(|_| {});
        });
        channel.publish(SyncKind::GuestUpdated, SyncPayload::default());
        assert_eq!(channel.handler_count(), 2);
    }

    #[tokio::test]
    async fn other_tabs_receive_messages_but_not_the_sender() {
        let bus = TabChannel::new(8);
        let cache = LocalCache::in_memory();
        let first = EventChannel::new(8, Some(bus.clone()));
        let second = EventChannel::new(8, Some(bus));
        first.spawn_relays(&cache);
        second.spawn_relays(&cache.open_tab());

        let mut first_rx = first.receiver();
        let mut second_rx = second.receiver();

        first.publish(SyncKind::GuestUpdated, SyncPayload::guest("g1"));

        let local = first_rx.recv().await.unwrap();
        assert_eq!(local.kind, SyncKind::GuestUpdated);

        let remote = tokio::time::timeout(Duration::from_secs(1), second_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remote.payload.id.as_deref(), Some("g1"));

        let echo = tokio::time::timeout(Duration::from_millis(50), first_rx.recv()).await;
        assert!(echo.is_err(), "the sender must not receive its own tab message");
    }

    #[tokio::test]
    async fn foreign_cache_writes_become_storage_change() {
        let cache = LocalCache::in_memory();
        let other_tab = cache.open_tab();
        let channel = EventChannel::new(8, None);
        channel.spawn_relays(&cache);
        let mut receiver = channel.receiver();

        other_tab.write(Collection::ShowDate, "2026-03-15");

        let message = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.kind, SyncKind::StorageChange);
        assert_eq!(message.collection(), Some(Collection::ShowDate));
    }
}
