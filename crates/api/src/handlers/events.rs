//! Handlers for event ingestion and retraction.
//!
//! Ineligible events (timestamp outside the acceptance window) return
//! `200 { "data": null }` — accepted but not recorded, per the ledger's
//! contract. All other failures surface as error responses.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use lode_core::category::EventCategory;
use lode_core::error::CoreError;
use lode_core::types::{DbId, Timestamp};
use lode_db::repositories::UserRepo;
use lode_ledger::ledger::{EventWithMetadata, ExternalRef, NewEvent};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /events`.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub category: EventCategory,
    pub user_id: DbId,
    pub points: Option<i64>,
    pub occurred_at: Option<Timestamp>,
    pub url: Option<String>,
    pub block_id: Option<DbId>,
    pub deposit_id: Option<DbId>,
}

impl CreateEventRequest {
    /// Resolve the external-identity reference; at most one may be given.
    fn external_ref(&self) -> Result<Option<ExternalRef>, AppError> {
        let supplied = [
            self.url.is_some(),
            self.block_id.is_some(),
            self.deposit_id.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if supplied > 1 {
            return Err(AppError::BadRequest(
                "At most one of url, block_id, deposit_id may be supplied".to_string(),
            ));
        }

        Ok(if let Some(url) = &self.url {
            Some(ExternalRef::Url(url.clone()))
        } else if let Some(block_id) = self.block_id {
            Some(ExternalRef::Block(block_id))
        } else {
            self.deposit_id.map(ExternalRef::Deposit)
        })
    }
}

// ---------------------------------------------------------------------------
// POST /events
// ---------------------------------------------------------------------------

/// Record an event sighting, idempotently per external key.
pub async fn create_event(
    State(state): State<AppState>,
    Json(input): Json<CreateEventRequest>,
) -> AppResult<impl IntoResponse> {
    let external = input.external_ref()?;

    // Resolve the owner up front so a bad user_id is a 404, not a
    // foreign-key error.
    UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id: input.user_id })?;

    let outcome = state
        .ledger
        .create(NewEvent {
            category: input.category,
            user_id: input.user_id,
            points: input.points,
            occurred_at: input.occurred_at,
            external,
        })
        .await?;

    let (status, event): (StatusCode, Option<EventWithMetadata>) = match outcome.into_event() {
        Some(event) => (StatusCode::CREATED, Some(event)),
        None => (StatusCode::OK, None),
    };

    Ok((status, Json(DataResponse { data: event })))
}

// ---------------------------------------------------------------------------
// GET /events/{id}
// ---------------------------------------------------------------------------

/// Fetch a single event with its external-identity metadata.
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let event = state.ledger.find(id).await?;
    Ok(Json(DataResponse { data: event }))
}

// ---------------------------------------------------------------------------
// DELETE /events/{id}
// ---------------------------------------------------------------------------

/// Retract an event. Idempotent: retracting an already-retracted event
/// returns the stored state unchanged.
pub async fn retract_event(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let event = state.ledger.retract(id).await?;

    tracing::info!(event_id = id, user_id = event.user_id, "Event retracted via API");

    Ok(Json(DataResponse { data: event }))
}
