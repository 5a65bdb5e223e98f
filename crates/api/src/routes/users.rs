//! Route definitions for users and per-user read paths.
//!
//! Mounted at `/users` by `api_routes()`.

use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// User routes.
///
/// ```text
/// POST   /               -> create_user
/// GET    /               -> list_users
/// GET    /{id}           -> get_user
/// GET    /{id}/events    -> list_user_events
/// GET    /{id}/metrics   -> user_metrics (lifetime or windowed)
/// GET    /{id}/rank      -> user_rank
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/{id}", get(users::get_user))
        .route("/{id}/events", get(users::list_user_events))
        .route("/{id}/metrics", get(users::user_metrics))
        .route("/{id}/rank", get(users::user_rank))
}
