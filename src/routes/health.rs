use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::health::HealthResponse,
    services::health_service,
    state::{SharedState, SyncFailure},
};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
/// Report whether the server syncs with the remote store or runs local-only.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(health_service::health_status(&state))
}

#[utoipa::path(
    get,
    path = "/sync/errors",
    tag = "health",
    responses((status = 200, description = "Recent remote failures, oldest first", body = [SyncFailure]))
)]
/// Recent fire-and-forget remote write and subscription failures.
pub async fn sync_errors(State(state): State<SharedState>) -> Json<Vec<SyncFailure>> {
    Json(state.sync().recent_failures())
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/healthcheck", get(healthcheck))
        .route("/sync/errors", get(sync_errors))
}
