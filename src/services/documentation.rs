use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Oscar party backend.
#[openapi(
    info(title = "Oscar Party Back"),
    paths(
        crate::routes::health::healthcheck,
        crate::routes::health::sync_errors,
        crate::routes::sse::sync_stream,
        crate::routes::guests::list_guests,
        crate::routes::guests::save_guest,
        crate::routes::guests::find_guest,
        crate::routes::guests::lookup_party,
        crate::routes::guests::delete_guest,
        crate::routes::guests::guest_score,
        crate::routes::guests::submit_party,
        crate::routes::guests::list_party,
        crate::routes::guests::delete_party,
        crate::routes::setup::get_categories,
        crate::routes::setup::save_categories,
        crate::routes::setup::default_categories,
        crate::routes::setup::categories_configured,
        crate::routes::setup::get_winners,
        crate::routes::setup::set_winner,
        crate::routes::setup::toggle_winner,
        crate::routes::setup::clear_winner,
        crate::routes::setup::get_show_date,
        crate::routes::setup::set_show_date,
        crate::routes::scoreboard::leaderboard,
        crate::routes::scoreboard::progress,
        crate::routes::scoreboard::export_csv,
        crate::routes::admin::stats,
        crate::routes::admin::reminders,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::state::SyncFailure,
            crate::dto::guest::GuestView,
            crate::dto::guest::SaveGuestRequest,
            crate::dto::guest::MemberRequest,
            crate::dto::guest::PartySubmissionRequest,
            crate::dto::guest::PartyLookupResponse,
            crate::dto::guest::ScoreResponse,
            crate::dto::setup::CategoryDto,
            crate::dto::setup::ConfiguredResponse,
            crate::dto::setup::WinnerRequest,
            crate::dto::setup::WinnersResponse,
            crate::dto::setup::ToggleWinnerResponse,
            crate::dto::setup::ShowDateRequest,
            crate::dto::setup::ShowDateResponse,
            crate::dto::scoreboard::LeaderboardEntryView,
            crate::dto::scoreboard::ProgressResponse,
            crate::dto::admin::GuestStatsResponse,
            crate::dto::admin::BallotRemindersResponse,
        )
    ),
    tags(
        (name = "guests", description = "Guest list and RSVP submissions"),
        (name = "setup", description = "Categories, winners and show date"),
        (name = "scoreboard", description = "Leaderboard, progress and CSV export"),
        (name = "admin", description = "Host dashboard"),
        (name = "health", description = "Health and sync diagnostics"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_tree() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sync/errors",
            "/sse/sync",
            "/guests",
            "/guests/{id}",
            "/parties",
            "/categories",
            "/winners",
            "/show-date",
            "/leaderboard",
            "/export.csv",
            "/admin/reminders",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
