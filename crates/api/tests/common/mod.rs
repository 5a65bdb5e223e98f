//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use lode_api::config::ServerConfig;
use lode_api::routes;
use lode_api::state::AppState;
use lode_core::eligibility::EligibilityWindow;
use lode_ledger::tasks::UpdatePointsPayload;
use lode_ledger::{EventLedger, LedgerConfig, PointsRecomputer};
use lode_queue::TaskQueue;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Ledger configuration for tests: phase-one window, block points allowed.
pub fn test_ledger_config() -> LedgerConfig {
    LedgerConfig {
        eligibility: EligibilityWindow::phase_one(),
        allow_block_mined_points: true,
        block_mined_sequence_cap: 150_000,
    }
}

/// An RFC 3339 timestamp inside the phase-one eligibility window.
pub const IN_PHASE: &str = "2022-01-10T12:00:00Z";

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let ledger = EventLedger::new(
        pool.clone(),
        TaskQueue::new(pool.clone()),
        test_ledger_config(),
    );

    let state = AppState {
        pool,
        config: Arc::new(test_config()),
        ledger,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    routes::api_routes()
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Send a GET request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a DELETE request.
pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a user through the API and return its ID.
pub async fn create_user(app: &Router, handle: &str) -> i64 {
    let response = post_json(
        app.clone(),
        "/users",
        serde_json::json!({
            "handle": handle,
            "email": format!("{handle}@example.com"),
            "country_code": "USA",
        }),
    )
    .await;
    let json = body_json(response).await;
    json["data"]["id"].as_i64().expect("created user has an id")
}

/// Drain the queue, running every pending recomputation like the worker
/// would.
pub async fn run_pending_recomputations(pool: &PgPool) {
    let queue = TaskQueue::new(pool.clone());
    while let Some(task) = queue.claim_next().await.unwrap() {
        let payload: UpdatePointsPayload = serde_json::from_value(task.payload.clone()).unwrap();
        PointsRecomputer::recompute(pool, payload.user_id, payload.category)
            .await
            .unwrap();
        queue.complete(&task).await.unwrap();
    }
}
