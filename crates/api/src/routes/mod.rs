//! Route composition.

pub mod events;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// The full application route tree, before middleware layers.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/events", events::router())
        .nest("/users", users::router())
}
