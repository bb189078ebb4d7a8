pub mod events;
pub mod sync;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::local_cache::LocalCache,
    state::{
        events::{EventChannel, TabChannel},
        sync::{SyncClient, SyncErrorLog},
    },
};

pub use self::events::{Subscription, SyncKind, SyncMessage, SyncPayload};
pub use self::sync::{SyncErrorSink, SyncFailure};

pub type SharedState = Arc<AppState>;

/// State of one tab: its cache handle, event channel and sync bridge.
///
/// Every model operation takes an `&AppState`; several states built over handles
/// of the same [`LocalCache`] behave like several tabs of one browser.
pub struct AppState {
    config: AppConfig,
    cache: LocalCache,
    events: Arc<EventChannel>,
    sync: SyncClient,
}

impl AppState {
    /// Build the state of one tab, with the default bounded sync error log.
    pub fn new(config: AppConfig, cache: LocalCache, tab: Option<TabChannel>) -> SharedState {
        let errors = Arc::new(SyncErrorLog::new(config.sync_error_capacity));
        Self::with_error_sink(config, cache, tab, errors)
    }

    /// Build the state of one tab reporting remote failures to `errors`.
    pub fn with_error_sink(
        config: AppConfig,
        cache: LocalCache,
        tab: Option<TabChannel>,
        errors: Arc<dyn SyncErrorSink>,
    ) -> SharedState {
        let events = Arc::new(EventChannel::new(config.event_capacity, tab));
        let sync = SyncClient::new(cache.clone(), Arc::clone(&events), errors);
        Arc::new(Self {
            config,
            cache,
            events,
            sync,
        })
    }

    /// Start relaying other tabs' events and foreign cache writes. Requires a Tokio runtime.
    pub fn start(&self) {
        self.events.spawn_relays(&self.cache);
    }

    /// Stop relays and remote subscriptions.
    pub fn shutdown(&self) {
        self.sync.shutdown();
        self.events.shutdown();
    }

    /// Loaded application configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Local cache handle of this tab.
    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Event channel of this tab.
    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    /// Bridge to the remote store.
    pub fn sync(&self) -> &SyncClient {
        &self.sync
    }

    /// Whether the tab runs without a remote store.
    pub fn is_local_only(&self) -> bool {
        !self.sync.is_attached()
    }
}
