//! Integration tests for the event endpoints.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{body_json, create_user, delete, get, post_json, IN_PHASE};

// ---------------------------------------------------------------------------
// Test: POST /events records an event and returns the envelope
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_event_returns_created_with_envelope(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = create_user(&app, "poster").await;

    let response = post_json(
        app.clone(),
        "/events",
        json!({
            "category": "COMMUNITY_CONTRIBUTION",
            "user_id": user_id,
            "occurred_at": IN_PHASE,
            "url": "https://forum/post/100",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert!(json["data"]["id"].is_i64());
    assert_eq!(json["data"]["points"], 1000, "catalog default applies");
    assert_eq!(json["data"]["metadata"]["url"], "https://forum/post/100");
}

// ---------------------------------------------------------------------------
// Test: repeat sighting returns the same event
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeat_sighting_returns_same_event(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = create_user(&app, "repeater").await;

    let body = json!({
        "category": "COMMUNITY_CONTRIBUTION",
        "user_id": user_id,
        "occurred_at": IN_PHASE,
        "url": "https://forum/post/200",
    });

    let first = body_json(post_json(app.clone(), "/events", body.clone()).await).await;

    let mut updated = body.clone();
    updated["points"] = json!(50);
    let second_response = post_json(app.clone(), "/events", updated).await;
    assert_eq!(second_response.status(), StatusCode::CREATED);

    let second = body_json(second_response).await;
    assert_eq!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(second["data"]["points"], 50, "override updates in place");
}

// ---------------------------------------------------------------------------
// Test: ineligible events return 200 with a null body
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn ineligible_event_returns_null_data(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = create_user(&app, "latecomer").await;

    let response = post_json(
        app.clone(),
        "/events",
        json!({
            "category": "BUG_CAUGHT",
            "user_id": user_id,
            "occurred_at": "2023-06-01T00:00:00Z",
            "url": "https://tracker/late",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["data"].is_null(), "accepted but not recorded");
}

// ---------------------------------------------------------------------------
// Test: request validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn multiple_external_keys_are_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = create_user(&app, "confused").await;

    let response = post_json(
        app.clone(),
        "/events",
        json!({
            "category": "BUG_CAUGHT",
            "user_id": user_id,
            "occurred_at": IN_PHASE,
            "url": "https://tracker/1",
            "block_id": 1,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn event_for_unknown_user_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/events",
        json!({
            "category": "BUG_CAUGHT",
            "user_id": 9999,
            "occurred_at": IN_PHASE,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Test: GET /events/{id}
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_event_round_trips(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = create_user(&app, "fetcher").await;

    let created = body_json(
        post_json(
            app.clone(),
            "/events",
            json!({
                "category": "SOCIAL_MEDIA_PROMOTION",
                "user_id": user_id,
                "occurred_at": IN_PHASE,
                "url": "https://social/1",
            }),
        )
        .await,
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = get(app.clone(), &format!("/events/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["category"], "SOCIAL_MEDIA_PROMOTION");

    let missing = get(app, "/events/424242").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: DELETE /events/{id} retracts idempotently
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn retract_event_is_idempotent(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = create_user(&app, "retractor").await;

    let created = body_json(
        post_json(
            app.clone(),
            "/events",
            json!({
                "category": "PULL_REQUEST_MERGED",
                "user_id": user_id,
                "occurred_at": IN_PHASE,
                "url": "https://git/pr/7",
            }),
        )
        .await,
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let first = delete(app.clone(), &format!("/events/{id}")).await;
    assert_eq!(first.status(), StatusCode::OK);
    let json = body_json(first).await;
    assert_eq!(json["data"]["points"], 0);
    assert!(!json["data"]["deleted_at"].is_null());

    let second = delete(app.clone(), &format!("/events/{id}")).await;
    assert_eq!(second.status(), StatusCode::OK);
    let json = body_json(second).await;
    assert_eq!(json["data"]["points"], 0);
}
