//! Synchronous key-value cache holding the four party collections.
//!
//! The cache is the only datastore the rest of the crate reads from. Values are
//! stored as JSON text under fixed keys; a value that no longer parses is
//! reported as absent instead of failing the caller.

use std::{
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const SIGNAL_CAPACITY: usize = 64;

/// Named collections persisted by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Award categories and their nominees.
    Categories,
    /// Guest records.
    Guests,
    /// Announced winners.
    Winners,
    /// Show date string.
    ShowDate,
}

impl Collection {
    /// Every collection, in persistence order.
    pub const ALL: [Collection; 4] = [
        Collection::Categories,
        Collection::Guests,
        Collection::Winners,
        Collection::ShowDate,
    ];

    /// Storage key the collection lives under.
    pub fn key(self) -> &'static str {
        match self {
            Collection::Categories => "oscar_categories",
            Collection::Guests => "oscar_guests",
            Collection::Winners => "oscar_winners",
            Collection::ShowDate => "oscar_show_date",
        }
    }

    /// Reverse lookup of [`Collection::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|collection| collection.key() == key)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw storage behind a [`LocalCache`].
///
/// Implementations never fail loudly: unreadable entries are reported as absent
/// and failed writes are logged.
pub trait CacheBackend: Send + Sync {
    /// Return the raw text stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String);
}

/// Process-local backend, the equivalent of browser storage for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryCacheBackend {
    entries: DashMap<String, String>,
}

impl MemoryCacheBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryCacheBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Backend persisting one `<key>.json` file per collection inside a directory.
pub struct FileCacheBackend {
    dir: PathBuf,
}

impl FileCacheBackend {
    /// Open (and create if needed) the cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the cache files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheBackend for FileCacheBackend {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read cache entry");
                None
            }
        }
    }

    fn set(&self, key: &str, value: String) {
        let path = self.path_for(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        let result = fs::write(&staging, value).and_then(|()| fs::rename(&staging, &path));
        if let Err(err) = result {
            warn!(path = %path.display(), error = %err, "failed to write cache entry");
        }
    }
}

/// Notification that another handle on the same storage modified a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageSignal {
    origin: u64,
    /// Collection that changed.
    pub collection: Collection,
}

/// Storage shared by every tab opened on one device.
struct SharedStorage {
    backend: Arc<dyn CacheBackend>,
    signals: broadcast::Sender<StorageSignal>,
    gate: Mutex<()>,
    next_handle: AtomicU64,
}

/// Handle on the local cache. Cloning keeps the same identity; use
/// [`LocalCache::open_tab`] to obtain a handle that behaves like another tab.
#[derive(Clone)]
pub struct LocalCache {
    shared: Arc<SharedStorage>,
    handle_id: u64,
}

impl LocalCache {
    /// Create a cache over the given backend.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        let (signals, _receiver) = broadcast::channel(SIGNAL_CAPACITY);
        let shared = Arc::new(SharedStorage {
            backend,
            signals,
            gate: Mutex::new(()),
            next_handle: AtomicU64::new(1),
        });
        Self {
            shared,
            handle_id: 0,
        }
    }

    /// Convenience constructor for an in-memory cache.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheBackend::new()))
    }

    /// Open another handle on the same storage, standing for a second tab.
    ///
    /// Writes made through one handle raise [`StorageSignal`]s on every other handle.
    pub fn open_tab(&self) -> Self {
        let handle_id = self.shared.next_handle.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::clone(&self.shared),
            handle_id,
        }
    }

    /// Read and decode a collection; missing or corrupt values yield `None`.
    pub fn read<T: DeserializeOwned>(&self, collection: Collection) -> Option<T> {
        let raw = self.shared.backend.get(collection.key())?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%collection, error = %err, "corrupt cache entry; treating as absent");
                None
            }
        }
    }

    /// Encode and store a collection, then signal the other handles.
    pub fn write<T: Serialize + ?Sized>(&self, collection: Collection, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%collection, error = %err, "failed to encode cache entry");
                return;
            }
        };
        self.shared.backend.set(collection.key(), raw);
        debug!(%collection, handle = self.handle_id, "cache entry written");
        let _ = self.shared.signals.send(StorageSignal {
            origin: self.handle_id,
            collection,
        });
    }

    /// Serialize read-modify-write sequences against this storage.
    ///
    /// Events must be published after the guard is dropped.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.shared
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to writes performed through other handles on the same storage.
    pub fn storage_signals(&self) -> StorageSignals {
        StorageSignals {
            receiver: self.shared.signals.subscribe(),
            own_handle: self.handle_id,
        }
    }
}

/// Receiver of [`StorageSignal`]s that skips the subscriber's own writes.
pub struct StorageSignals {
    receiver: broadcast::Receiver<StorageSignal>,
    own_handle: u64,
}

impl StorageSignals {
    /// Wait for the next foreign write. Returns `None` once the storage is gone.
    pub async fn next(&mut self) -> Option<Collection> {
        loop {
            match self.receiver.recv().await {
                Ok(signal) if signal.origin == self.own_handle => continue,
                Ok(signal) => return Some(signal.collection),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "storage signals lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
