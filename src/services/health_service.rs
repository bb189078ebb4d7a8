use tracing::debug;

use crate::{dto::health::HealthResponse, state::AppState};

/// Report whether the remote store is attached.
pub fn health_status(state: &AppState) -> HealthResponse {
    if state.is_local_only() {
        debug!("remote store not attached (local-only mode)");
        HealthResponse::local_only()
    } else {
        HealthResponse::ok()
    }
}
