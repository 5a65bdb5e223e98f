//! Handlers for the account directory and per-user read paths: event
//! listings, metrics, and leaderboard rank.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use lode_core::category::EventCategory;
use lode_core::error::CoreError;
use lode_core::types::DbId;
use lode_db::models::user::CreateUser;
use lode_db::repositories::{UserPointsRepo, UserRepo};
use lode_ledger::ledger::ListEvents;
use lode_ledger::{MetricsReporter, RankingEngine};

use crate::error::{AppError, AppResult};
use crate::query::{EventCursorParams, MetricsWindowParams, RankParams};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /users
// ---------------------------------------------------------------------------

/// Create a user and provision their points aggregate row in the same
/// transaction. Every user must have one before ranking can see them.
pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> AppResult<impl IntoResponse> {
    if input.handle.trim().is_empty() {
        return Err(AppError::BadRequest("handle must not be empty".to_string()));
    }
    if input.email.trim().is_empty() {
        return Err(AppError::BadRequest("email must not be empty".to_string()));
    }

    // Friendly duplicate checks; the unique constraints still catch races.
    if UserRepo::find_by_handle(&state.pool, &input.handle).await?.is_some() {
        return Err(CoreError::Conflict(format!("Handle '{}' is already taken", input.handle)).into());
    }
    if UserRepo::find_by_email(&state.pool, &input.email).await?.is_some() {
        return Err(CoreError::Conflict("Email is already registered".to_string()).into());
    }

    let mut tx = state.pool.begin().await?;
    let user = UserRepo::create(&mut *tx, &input).await?;
    UserPointsRepo::provision(&mut *tx, user.id).await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, handle = %user.handle, "User created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

// ---------------------------------------------------------------------------
// GET /users
// ---------------------------------------------------------------------------

/// List all users, newest first.
pub async fn list_users(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: users }))
}

// ---------------------------------------------------------------------------
// GET /users/{id}
// ---------------------------------------------------------------------------

/// Get a single user by ID.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;
    Ok(Json(DataResponse { data: user }))
}

// ---------------------------------------------------------------------------
// GET /users/{id}/events
// ---------------------------------------------------------------------------

/// List a user's events, cursor-paginated, newest first.
pub async fn list_user_events(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<EventCursorParams>,
) -> AppResult<impl IntoResponse> {
    if params.before.is_some() && params.after.is_some() {
        return Err(AppError::BadRequest(
            "before and after cursors are mutually exclusive".to_string(),
        ));
    }

    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;

    let page = state
        .ledger
        .list(
            id,
            &ListEvents {
                before: params.before,
                after: params.after,
                limit: params.limit,
            },
        )
        .await?;

    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// GET /users/{id}/metrics
// ---------------------------------------------------------------------------

/// Lifetime metrics, or windowed metrics when `start` and `end` are given.
///
/// Reads the ledger directly, so results never lag behind the
/// recomputation queue.
pub async fn user_metrics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<MetricsWindowParams>,
) -> AppResult<axum::response::Response> {
    match (params.start, params.end) {
        (Some(start), Some(end)) => {
            let metrics = MetricsReporter::windowed(&state.pool, id, start, end).await?;
            Ok(Json(DataResponse { data: metrics }).into_response())
        }
        (None, None) => {
            let metrics = MetricsReporter::lifetime(&state.pool, id).await?;
            Ok(Json(DataResponse { data: metrics }).into_response())
        }
        _ => Err(AppError::BadRequest(
            "start and end must be supplied together".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// GET /users/{id}/rank
// ---------------------------------------------------------------------------

/// Leaderboard rank over a comma-separated category set (default: all).
pub async fn user_rank(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<RankParams>,
) -> AppResult<impl IntoResponse> {
    let categories = match &params.categories {
        Some(raw) => raw
            .split(',')
            .map(|name| EventCategory::parse(name.trim()))
            .collect::<Result<Vec<_>, _>>()?,
        None => EventCategory::ALL.to_vec(),
    };

    let metrics = RankingEngine::rank_with_count(&state.pool, id, &categories).await?;
    Ok(Json(DataResponse { data: metrics }))
}
