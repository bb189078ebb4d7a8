use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::admin::{BallotRemindersResponse, GuestStatsResponse},
    services::admin_service,
    state::SharedState,
};

/// Host dashboard endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/reminders", get(reminders))
}

#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "admin",
    responses((status = 200, description = "Attendance counters", body = GuestStatsResponse))
)]
/// Attendance and ballot counters.
pub async fn stats(State(state): State<SharedState>) -> Json<GuestStatsResponse> {
    Json(admin_service::guest_stats(&state).into())
}

#[utoipa::path(
    get,
    path = "/admin/reminders",
    tag = "admin",
    responses((status = 200, description = "Attending guests without a ballot", body = BallotRemindersResponse))
)]
/// Attending guests who still owe a ballot, with the countdown alert.
pub async fn reminders(State(state): State<SharedState>) -> Json<BallotRemindersResponse> {
    Json(admin_service::ballot_reminders(&state).into())
}
