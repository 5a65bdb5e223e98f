//! Route definitions for the event ledger.
//!
//! Mounted at `/events` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// Event routes.
///
/// ```text
/// POST   /        -> create_event
/// GET    /{id}    -> get_event
/// DELETE /{id}    -> retract_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(events::create_event))
        .route(
            "/{id}",
            get(events::get_event).delete(events::retract_event),
        )
}
