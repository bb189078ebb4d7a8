use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{remote_store::RemoteStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the remote store, attach it to the sync bridge while it is reachable
/// and fall back to local-only mode when it is not.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RemoteStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.sync().attach(Arc::clone(&store));
                info!("remote store connected; syncing");
                delay = INITIAL_DELAY;

                loop {
                    match store.health_check().await {
                        Ok(()) => {
                            if !state.sync().is_attached() {
                                info!("remote store healthy again; resuming sync");
                                state.sync().attach(Arc::clone(&store));
                            }
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(err) => {
                            warn!(error = %err, "remote store health check failed");
                            let mut attempt = 0;
                            let mut reconnect_delay = INITIAL_DELAY;
                            let mut reconnected = false;

                            while attempt < MAX_RECONNECT_ATTEMPTS {
                                match store.try_reconnect().await {
                                    Ok(()) => {
                                        info!(
                                            "remote store reconnection succeeded after health check failure"
                                        );
                                        reconnected = true;
                                        break;
                                    }
                                    Err(reconnect_err) => {
                                        if attempt == 0 {
                                            warn!(
                                                attempt, error = %reconnect_err,
                                                "remote reconnect first attempt failed; running local-only"
                                            );
                                            state.sync().detach();
                                        } else {
                                            warn!(attempt, error = %reconnect_err, "remote reconnect attempt failed");
                                        };
                                        attempt += 1;
                                        sleep(reconnect_delay).await;
                                        reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                                    }
                                }
                            }

                            if reconnected {
                                if !state.sync().is_attached() {
                                    state.sync().attach(Arc::clone(&store));
                                }
                                sleep(HEALTH_POLL_INTERVAL).await;
                                continue;
                            } else {
                                warn!(
                                    "exhausted remote reconnect attempts; staying local-only"
                                );
                                state.sync().detach();
                                break;
                            }
                        }
                    }
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "remote store connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{local_cache::LocalCache, remote_store::memory::InMemoryRemoteStore},
        state::AppState,
    };

    #[tokio::test(start_paused = true)]
    async fn attaches_after_failed_connection_attempts() {
        let state = AppState::new(AppConfig::default(), LocalCache::in_memory(), None);
        let remote = InMemoryRemoteStore::new();
        let mut attempts = 0;

        let supervisor = tokio::spawn(run(Arc::clone(&state), move || {
            attempts += 1;
            let remote = remote.clone();
            let fail = attempts < 3;
            async move {
                if fail {
                    Err(StorageError::unavailable(
                        "not yet".into(),
                        std::io::Error::other("refused"),
                    ))
                } else {
                    Ok(Arc::new(remote) as Arc<dyn RemoteStore>)
                }
            }
        }));

        for _ in 0..20 {
            if state.sync().is_attached() {
                break;
            }
            sleep(Duration::from_millis(500)).await;
        }
        assert!(state.sync().is_attached());
        supervisor.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn detaches_when_the_store_stays_unreachable() {
        let state = AppState::new(AppConfig::default(), LocalCache::in_memory(), None);
        let remote = InMemoryRemoteStore::new();
        let probe = remote.clone();

        let supervisor = tokio::spawn(run(Arc::clone(&state), move || {
            let remote = remote.clone();
            async move { Ok(Arc::new(remote) as Arc<dyn RemoteStore>) }
        }));

        for _ in 0..10 {
            if state.sync().is_attached() {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }
        assert!(state.sync().is_attached());

        probe.set_offline(true);
        let mut detached = false;
        for _ in 0..200 {
            if !state.sync().is_attached() {
                detached = true;
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }
        assert!(detached);
        supervisor.abort();
    }
}
