//! Process-local remote store shared by cloning, used for tests and for
//! simulating several devices inside one process.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_stream::stream;
use futures::{future::BoxFuture, stream::BoxStream};
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::watch;

use crate::dao::{
    models::{ConfigPatch, GuestEntity},
    remote_store::RemoteStore,
    storage::{StorageError, StorageResult},
};

/// Failure reported while the in-memory store is switched offline.
#[derive(Debug, Error)]
#[error("in-memory remote store is offline")]
pub struct OfflineError;

struct Inner {
    guests: watch::Sender<IndexMap<String, GuestEntity>>,
    config: watch::Sender<Option<ConfigPatch>>,
    offline: AtomicBool,
}

/// Shared in-memory implementation of [`RemoteStore`]. Clones share the same data.
#[derive(Clone)]
pub struct InMemoryRemoteStore {
    inner: Arc<Inner>,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemoteStore {
    /// Create an empty store with no configuration record yet.
    pub fn new() -> Self {
        let (guests, _) = watch::channel(IndexMap::new());
        let (config, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                guests,
                config,
                offline: AtomicBool::new(false),
            }),
        }
    }

    /// Make every subsequent operation fail (or succeed again) to exercise failure paths.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Current guest documents, in insertion order.
    pub fn guests(&self) -> Vec<GuestEntity> {
        self.inner.guests.borrow().values().cloned().collect()
    }

    /// Current configuration record, if one was ever written.
    pub fn config(&self) -> Option<ConfigPatch> {
        self.inner.config.borrow().clone()
    }

    fn ensure_online(&self, operation: &str) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                format!("{operation} rejected"),
                OfflineError,
            ))
        } else {
            Ok(())
        }
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn put_guest(&self, guest: GuestEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online("put guest")?;
            store.inner.guests.send_modify(|guests| {
                guests.insert(guest.id.clone(), guest);
            });
            Ok(())
        })
    }

    fn delete_guest(&self, id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online("delete guest")?;
            store.inner.guests.send_if_modified(|guests| guests.shift_remove(&id).is_some());
            Ok(())
        })
    }

    fn merge_config(&self, patch: ConfigPatch) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online("merge config")?;
            store.inner.config.send_modify(|config| {
                config.get_or_insert_with(ConfigPatch::default).merge(patch);
            });
            Ok(())
        })
    }

    fn watch_guests(&self) -> BoxStream<'static, StorageResult<Vec<GuestEntity>>> {
        let store = self.clone();
        Box::pin(stream! {
            if let Err(err) = store.ensure_online("watch guests") {
                yield Err(err);
                return;
            }
            let mut receiver = store.inner.guests.subscribe();
            loop {
                let snapshot: Vec<GuestEntity> =
                    receiver.borrow_and_update().values().cloned().collect();
                yield Ok(snapshot);
                if receiver.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn watch_config(&self) -> BoxStream<'static, StorageResult<ConfigPatch>> {
        let store = self.clone();
        Box::pin(stream! {
            if let Err(err) = store.ensure_online("watch config") {
                yield Err(err);
                return;
            }
            let mut receiver = store.inner.config.subscribe();
            loop {
                // A record that does not exist yet produces no snapshot.
                let snapshot = receiver.borrow_and_update().clone();
                if let Some(config) = snapshot {
                    yield Ok(config);
                }
                if receiver.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online("health check") })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online("reconnect") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    use crate::dao::models::{CategoryEntity, Rsvp, Winners};

    fn guest(id: &str, name: &str) -> GuestEntity {
        GuestEntity {
            id: id.into(),
            name: name.into(),
            rsvp: Rsvp::Yes,
            dietary: String::new(),
            party_id: None,
            is_party_host: false,
            party_size: 1,
            predictions: Default::default(),
            ballot_submitted: false,
            submitted_at: None,
        }
    }

    #[tokio::test]
    async fn merge_config_keeps_unrelated_fields() {
        let store = InMemoryRemoteStore::new();
        store
            .merge_config(ConfigPatch::categories(vec![CategoryEntity::new(
                "Best Picture",
                ["A"],
            )]))
            .await
            .unwrap();
        let mut winners = Winners::new();
        winners.insert("Best Picture".into(), "A".into());
        store.merge_config(ConfigPatch::winners(winners)).await.unwrap();

        let config = store.config().unwrap();
        assert_eq!(config.categories.map(|c| c.len()), Some(1));
        assert_eq!(config.winners.map(|w| w.len()), Some(1));
        assert!(config.show_date.is_none());
    }

    #[tokio::test]
    async fn watch_guests_yields_initial_and_updated_snapshots() {
        let store = InMemoryRemoteStore::new();
        store.put_guest(guest("g1", "Alice")).await.unwrap();

        let mut snapshots = store.watch_guests();
        let first = snapshots.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        store.put_guest(guest("g2", "Bob")).await.unwrap();
        let second = snapshots.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 2);

        store.delete_guest("g1".into()).await.unwrap();
        let third = snapshots.next().await.unwrap().unwrap();
        assert_eq!(third.iter().map(|g| g.name.as_str()).collect::<Vec<_>>(), ["Bob"]);
    }

    #[tokio::test]
    async fn offline_store_rejects_writes() {
        let store = InMemoryRemoteStore::new();
        store.set_offline(true);
        assert!(store.put_guest(guest("g1", "Alice")).await.is_err());
        assert!(store.health_check().await.is_err());
        assert!(store.guests().is_empty());

        store.set_offline(false);
        assert!(store.put_guest(guest("g1", "Alice")).await.is_ok());
    }
}
