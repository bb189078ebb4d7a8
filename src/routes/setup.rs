use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use validator::Validate;

use crate::{
    dto::setup::{
        CategoryDto, ConfiguredResponse, ShowDateRequest, ShowDateResponse, ToggleWinnerResponse,
        WinnerRequest, WinnersResponse,
    },
    error::AppError,
    services::setup_service,
    state::SharedState,
};

/// Category, winner and show date endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/categories", get(get_categories).put(save_categories))
        .route("/categories/defaults", get(default_categories))
        .route("/categories/configured", get(categories_configured))
        .route("/winners", get(get_winners).put(set_winner))
        .route("/winners/toggle", post(toggle_winner))
        .route("/winners/{category}", delete(clear_winner))
        .route("/show-date", get(get_show_date).put(set_show_date))
}

fn to_dtos(categories: Vec<crate::dao::models::CategoryEntity>) -> Vec<CategoryDto> {
    categories.into_iter().map(Into::into).collect()
}

/// Configured categories.
#[utoipa::path(
    get,
    path = "/categories",
    tag = "setup",
    responses((status = 200, description = "Configured categories", body = [CategoryDto]))
)]
pub async fn get_categories(State(state): State<SharedState>) -> Json<Vec<CategoryDto>> {
    Json(to_dtos(setup_service::get_categories(&state)))
}

/// Replace the category list. Names and nominees are trimmed, blanks dropped.
#[utoipa::path(
    put,
    path = "/categories",
    tag = "setup",
    request_body = [CategoryDto],
    responses(
        (status = 200, description = "Saved categories", body = [CategoryDto]),
        (status = 400, description = "Duplicate category name")
    )
)]
pub async fn save_categories(
    State(state): State<SharedState>,
    Json(payload): Json<Vec<CategoryDto>>,
) -> Result<Json<Vec<CategoryDto>>, AppError> {
    let categories = payload.into_iter().map(Into::into).collect();
    let saved = setup_service::save_categories(&state, categories)?;
    Ok(Json(to_dtos(saved)))
}

/// Built-in category list.
#[utoipa::path(
    get,
    path = "/categories/defaults",
    tag = "setup",
    responses((status = 200, description = "Default categories", body = [CategoryDto]))
)]
pub async fn default_categories() -> Json<Vec<CategoryDto>> {
    Json(to_dtos(setup_service::default_categories()))
}

/// Whether any category has nominees.
#[utoipa::path(
    get,
    path = "/categories/configured",
    tag = "setup",
    responses((status = 200, description = "Configuration flag", body = ConfiguredResponse))
)]
pub async fn categories_configured(State(state): State<SharedState>) -> Json<ConfiguredResponse> {
    Json(ConfiguredResponse {
        configured: setup_service::categories_configured(&state),
    })
}

/// Announced winners.
#[utoipa::path(
    get,
    path = "/winners",
    tag = "setup",
    responses((status = 200, description = "Winners keyed by category", body = WinnersResponse))
)]
pub async fn get_winners(State(state): State<SharedState>) -> Json<WinnersResponse> {
    Json(WinnersResponse(setup_service::get_winners(&state)))
}

/// Announce the winner of one category.
#[utoipa::path(
    put,
    path = "/winners",
    tag = "setup",
    request_body = WinnerRequest,
    responses(
        (status = 200, description = "Winners after the change", body = WinnersResponse),
        (status = 400, description = "Unknown category or nominee")
    )
)]
pub async fn set_winner(
    State(state): State<SharedState>,
    Json(payload): Json<WinnerRequest>,
) -> Result<Json<WinnersResponse>, AppError> {
    payload.validate()?;
    let winners = setup_service::set_winner(&state, &payload.category, &payload.nominee)?;
    Ok(Json(WinnersResponse(winners)))
}

/// Set the winner, or withdraw it when the nominee already holds it.
#[utoipa::path(
    post,
    path = "/winners/toggle",
    tag = "setup",
    request_body = WinnerRequest,
    responses(
        (status = 200, description = "Winner of the category after the toggle", body = ToggleWinnerResponse),
        (status = 400, description = "Unknown category or nominee")
    )
)]
pub async fn toggle_winner(
    State(state): State<SharedState>,
    Json(payload): Json<WinnerRequest>,
) -> Result<Json<ToggleWinnerResponse>, AppError> {
    payload.validate()?;
    let winner = setup_service::toggle_winner(&state, &payload.category, &payload.nominee)?;
    Ok(Json(ToggleWinnerResponse {
        category: payload.category,
        winner,
    }))
}

/// Withdraw the announcement of one category.
#[utoipa::path(
    delete,
    path = "/winners/{category}",
    tag = "setup",
    params(("category" = String, Path, description = "Category name")),
    responses((status = 200, description = "Winners after the change", body = WinnersResponse))
)]
pub async fn clear_winner(
    State(state): State<SharedState>,
    Path(category): Path<String>,
) -> Json<WinnersResponse> {
    Json(WinnersResponse(setup_service::clear_winner(&state, &category)))
}

fn show_date_response(state: &SharedState) -> ShowDateResponse {
    ShowDateResponse {
        show_date: setup_service::get_show_date(state),
        days_until_show: setup_service::days_until_show(state),
    }
}

/// Show date and countdown.
#[utoipa::path(
    get,
    path = "/show-date",
    tag = "setup",
    responses((status = 200, description = "Show date", body = ShowDateResponse))
)]
pub async fn get_show_date(State(state): State<SharedState>) -> Json<ShowDateResponse> {
    Json(show_date_response(&state))
}

/// Set or clear the show date.
#[utoipa::path(
    put,
    path = "/show-date",
    tag = "setup",
    request_body = ShowDateRequest,
    responses(
        (status = 200, description = "Show date after the change", body = ShowDateResponse),
        (status = 400, description = "Unparseable date")
    )
)]
pub async fn set_show_date(
    State(state): State<SharedState>,
    Json(payload): Json<ShowDateRequest>,
) -> Result<Json<ShowDateResponse>, AppError> {
    setup_service::set_show_date(&state, &payload.show_date)?;
    Ok(Json(show_date_response(&state)))
}
