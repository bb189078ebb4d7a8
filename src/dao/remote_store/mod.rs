#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use futures::{future::BoxFuture, stream::BoxStream};

use crate::dao::{
    models::{ConfigPatch, GuestEntity},
    storage::StorageResult,
};

/// Abstraction over the shared, multi-device store mirroring the local cache.
///
/// Writes are keyed per entity: guests by id, everything else merged into a single
/// configuration record. Subscriptions yield full snapshots, the first one as soon
/// as the stream is polled.
pub trait RemoteStore: Send + Sync {
    /// Create or replace the guest document keyed by `guest.id`.
    fn put_guest(&self, guest: GuestEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove the guest document with the given id; missing documents are not an error.
    fn delete_guest(&self, id: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Merge the fields present in `patch` into the shared configuration record.
    fn merge_config(&self, patch: ConfigPatch) -> BoxFuture<'static, StorageResult<()>>;
    /// Stream of full guest-list snapshots.
    fn watch_guests(&self) -> BoxStream<'static, StorageResult<Vec<GuestEntity>>>;
    /// Stream of configuration snapshots; only stored fields are present.
    fn watch_config(&self) -> BoxStream<'static, StorageResult<ConfigPatch>>;
    /// Cheap reachability probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
