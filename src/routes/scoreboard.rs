use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};

use crate::{
    dto::scoreboard::{LeaderboardEntryView, ProgressResponse},
    services::{export, scoring},
    state::SharedState,
};

/// Leaderboard, progress and export endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .route("/progress", get(progress))
        .route("/export.csv", get(export_csv))
}

/// Guests ranked by score, ties broken by name.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "scoreboard",
    responses((status = 200, description = "Ranked guests", body = [LeaderboardEntryView]))
)]
pub async fn leaderboard(State(state): State<SharedState>) -> Json<Vec<LeaderboardEntryView>> {
    Json(
        scoring::leaderboard(&state)
            .into_iter()
            .map(Into::into)
            .collect(),
    )
}

/// How many categories have been announced.
#[utoipa::path(
    get,
    path = "/progress",
    tag = "scoreboard",
    responses((status = 200, description = "Announcement progress", body = ProgressResponse))
)]
pub async fn progress(State(state): State<SharedState>) -> Json<ProgressResponse> {
    Json(scoring::progress(&state).into())
}

/// Guest list as CSV, one prediction column per category.
#[utoipa::path(
    get,
    path = "/export.csv",
    tag = "scoreboard",
    responses((status = 200, description = "CSV export", content_type = "text/csv", body = String))
)]
pub async fn export_csv(State(state): State<SharedState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"oscar-party-guests.csv\"",
            ),
        ],
        export::export_csv(&state),
    )
}
