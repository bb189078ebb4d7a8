/// Per-tab local cache and its backends.
pub mod local_cache;
/// Domain records shared by the cache and the remote store.
pub mod models;
/// Shared multi-device store abstraction and its implementations.
pub mod remote_store;
/// Backend-agnostic storage errors.
pub mod storage;
