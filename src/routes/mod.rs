use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod guests;
pub mod health;
pub mod scoreboard;
pub mod setup;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(guests::router())
        .merge(setup::router())
        .merge(scoreboard::router())
        .merge(admin::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
