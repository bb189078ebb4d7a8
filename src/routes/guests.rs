use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use validator::Validate;

use crate::{
    dto::guest::{
        GuestView, NameQuery, PartyLookupResponse, PartySubmissionRequest, SaveGuestRequest,
        ScoreResponse,
    },
    error::AppError,
    services::{guest_service, scoring},
    state::SharedState,
};

/// Guest and party endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/guests", get(list_guests).post(save_guest))
        .route("/guests/by-name", get(find_guest))
        .route("/guests/lookup", get(lookup_party))
        .route("/guests/{id}", delete(delete_guest))
        .route("/guests/{id}/score", get(guest_score))
        .route("/parties", post(submit_party))
        .route(
            "/parties/{party_id}",
            get(list_party).delete(delete_party),
        )
}

/// List every guest.
#[utoipa::path(
    get,
    path = "/guests",
    tag = "guests",
    responses((status = 200, description = "All guests", body = [GuestView]))
)]
pub async fn list_guests(State(state): State<SharedState>) -> Json<Vec<GuestView>> {
    Json(
        guest_service::get_guests(&state)
            .into_iter()
            .map(Into::into)
            .collect(),
    )
}

/// Create or replace a single guest.
#[utoipa::path(
    post,
    path = "/guests",
    tag = "guests",
    request_body = SaveGuestRequest,
    responses(
        (status = 200, description = "Guest saved", body = GuestView),
        (status = 400, description = "Invalid guest or name already taken")
    )
)]
pub async fn save_guest(
    State(state): State<SharedState>,
    Json(payload): Json<SaveGuestRequest>,
) -> Result<Json<GuestView>, AppError> {
    payload.validate()?;
    let guest = guest_service::save_guest(&state, payload.into())?;
    Ok(Json(guest.into()))
}

/// Find a guest by name, ignoring case and surrounding whitespace.
#[utoipa::path(
    get,
    path = "/guests/by-name",
    tag = "guests",
    params(NameQuery),
    responses(
        (status = 200, description = "Matching guest", body = GuestView),
        (status = 404, description = "No guest with that name")
    )
)]
pub async fn find_guest(
    State(state): State<SharedState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<GuestView>, AppError> {
    query.validate()?;
    guest_service::find_guest_by_name(&state, &query.name)
        .map(|guest| Json(guest.into()))
        .ok_or_else(|| AppError::NotFound(format!("no guest named `{}`", query.name.trim())))
}

/// Load the submission a guest belongs to, host first.
#[utoipa::path(
    get,
    path = "/guests/lookup",
    tag = "guests",
    params(NameQuery),
    responses(
        (status = 200, description = "Party to edit", body = PartyLookupResponse),
        (status = 404, description = "No submission found for that name")
    )
)]
pub async fn lookup_party(
    State(state): State<SharedState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<PartyLookupResponse>, AppError> {
    query.validate()?;
    guest_service::lookup_party(&state, &query.name)
        .map(|lookup| Json(lookup.into()))
        .ok_or_else(|| AppError::NotFound("no submission found for that name".into()))
}

/// Delete exactly one guest.
#[utoipa::path(
    delete,
    path = "/guests/{id}",
    tag = "guests",
    params(("id" = String, Path, description = "Guest identifier")),
    responses(
        (status = 204, description = "Guest deleted"),
        (status = 404, description = "Guest not found")
    )
)]
pub async fn delete_guest(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if guest_service::delete_guest(&state, &id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("guest `{id}` not found")))
    }
}

/// Score of one guest against the current winners.
#[utoipa::path(
    get,
    path = "/guests/{id}/score",
    tag = "guests",
    params(("id" = String, Path, description = "Guest identifier")),
    responses(
        (status = 200, description = "Current score", body = ScoreResponse),
        (status = 404, description = "Guest not found")
    )
)]
pub async fn guest_score(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ScoreResponse>, AppError> {
    let guest = guest_service::get_guest(&state, &id)?;
    let score = scoring::score_guest(&state, &guest);
    Ok(Json(ScoreResponse {
        id: guest.id,
        score,
    }))
}

/// Save a whole RSVP form, replacing the edited party.
#[utoipa::path(
    post,
    path = "/parties",
    tag = "guests",
    request_body = PartySubmissionRequest,
    responses(
        (status = 200, description = "Guests created for the submission", body = [GuestView]),
        (status = 400, description = "Submission rejected")
    )
)]
pub async fn submit_party(
    State(state): State<SharedState>,
    Json(payload): Json<PartySubmissionRequest>,
) -> Result<Json<Vec<GuestView>>, AppError> {
    let created = guest_service::submit_party(&state, payload.into())?;
    Ok(Json(created.into_iter().map(Into::into).collect()))
}

/// Members of a party.
#[utoipa::path(
    get,
    path = "/parties/{party_id}",
    tag = "guests",
    params(("party_id" = String, Path, description = "Party identifier")),
    responses((status = 200, description = "Party members", body = [GuestView]))
)]
pub async fn list_party(
    State(state): State<SharedState>,
    Path(party_id): Path<String>,
) -> Json<Vec<GuestView>> {
    Json(
        guest_service::get_guests_by_party_id(&state, &party_id)
            .into_iter()
            .map(Into::into)
            .collect(),
    )
}

/// Delete a party, or a lone guest addressed by its own id.
#[utoipa::path(
    delete,
    path = "/parties/{party_id}",
    tag = "guests",
    params(("party_id" = String, Path, description = "Party identifier or lone guest id")),
    responses((status = 200, description = "Removed guests", body = [GuestView]))
)]
pub async fn delete_party(
    State(state): State<SharedState>,
    Path(party_id): Path<String>,
) -> Json<Vec<GuestView>> {
    Json(
        guest_service::delete_guests_by_party_id(&state, &party_id)
            .into_iter()
            .map(Into::into)
            .collect(),
    )
}
