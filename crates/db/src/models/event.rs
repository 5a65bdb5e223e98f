//! Event ledger entity model.

use serde::Serialize;
use sqlx::FromRow;

use lode_core::category::EventCategory;
use lode_core::types::{DbId, Timestamp};

/// Lifecycle of a ledger event. Retraction is a soft delete: the row stays
/// for audit history with its points zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Active,
    Retracted,
}

/// A row from the `events` table.
///
/// At most one of `block_id`, `deposit_id`, `url` is set; that value is the
/// event's external identity and the idempotency key for upserts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub category: EventCategory,
    pub user_id: DbId,
    pub points: i64,
    pub occurred_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
    pub block_id: Option<DbId>,
    pub deposit_id: Option<DbId>,
    pub url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    /// Tagged lifecycle state derived from `deleted_at`.
    pub fn lifecycle(&self) -> LifecycleState {
        if self.deleted_at.is_some() {
            LifecycleState::Retracted
        } else {
            LifecycleState::Active
        }
    }
}

/// Insertable event row. Built by the ledger after it has resolved the
/// external identity and computed the point value.
#[derive(Debug, Clone)]
pub struct CreateEventRow {
    pub category: EventCategory,
    pub user_id: DbId,
    pub points: i64,
    pub occurred_at: Timestamp,
    pub block_id: Option<DbId>,
    pub deposit_id: Option<DbId>,
    pub url: Option<String>,
}

/// Count and point-sum over a set of events.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct EventAggregate {
    pub count: i64,
    pub points: i64,
}

/// Point-sum and latest occurrence for one (user, category) pair, as
/// recomputed from active ledger rows.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct PointsAggregate {
    pub points: i64,
    pub last_occurred_at: Option<Timestamp>,
}
