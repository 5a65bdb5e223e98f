//! Task queue entity model.

use serde::Serialize;
use sqlx::FromRow;

use lode_core::types::{DbId, Timestamp};

/// Execution state of a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub name: String,
    pub payload: serde_json::Value,
    /// When set, at most one pending task with this key exists at a time.
    pub dedupe_key: Option<String>,
    pub status: TaskStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    /// Earliest time the task may be claimed. Pushed into the future on
    /// retry backoff.
    pub run_at: Timestamp,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}
