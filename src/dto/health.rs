use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "local-only").
    pub status: String,
}

impl HealthResponse {
    /// The remote store is attached and syncing.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Running on the local cache alone.
    pub fn local_only() -> Self {
        Self {
            status: "local-only".to_string(),
        }
    }
}
