//! Oscar party backend entrypoint wiring the local cache, remote sync, REST and SSE layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oscar_party_back::{
    config::AppConfig,
    dao::local_cache::{FileCacheBackend, LocalCache},
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let cache = match &config.cache_dir {
        Some(dir) => {
            let backend = FileCacheBackend::open(dir)
                .with_context(|| format!("opening cache directory {}", dir.display()))?;
            LocalCache::new(Arc::new(backend))
        }
        None => LocalCache::in_memory(),
    };

    let app_state = AppState::new(config, cache, None);
    app_state.start();
    spawn_remote_supervisor(&app_state);

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    let served = axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum");

    app_state.shutdown();
    served
}

/// Start syncing with CouchDB when it is configured; otherwise stay local-only.
#[cfg(feature = "couch-store")]
fn spawn_remote_supervisor(state: &SharedState) {
    use oscar_party_back::{
        dao::{
            remote_store::{
                RemoteStore,
                couchdb::{CouchConfig, CouchRemoteStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };
    use tracing::warn;

    let couch = match CouchConfig::from_env() {
        Ok(couch) => couch,
        Err(err) => {
            warn!(error = %err, "no remote store configured; running local-only");
            return;
        }
    };

    info!(base_url = %couch.base_url, database = %couch.database, "remote store configured");
    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        let couch = couch.clone();
        async move {
            let store = CouchRemoteStore::connect(couch)
                .await
                .map_err(StorageError::from)?;
            Ok(Arc::new(store) as Arc<dyn RemoteStore>)
        }
    }));
}

#[cfg(not(feature = "couch-store"))]
fn spawn_remote_supervisor(_state: &SharedState) {
    info!("built without a remote store; running local-only");
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
