//! Repository for the `tasks` queue table.
//!
//! The queue crate builds its delivery semantics (dedupe, backoff, reaping)
//! on these primitives. Claiming uses `FOR UPDATE SKIP LOCKED` so multiple
//! worker processes never double-dispatch a task.

use sqlx::PgPool;

use lode_core::types::{DbId, Timestamp};

use crate::models::task::{Task, TaskStatus};

/// Column list for `tasks` queries.
const COLUMNS: &str = "id, name, payload, dedupe_key, status, attempts, max_attempts, \
                       run_at, last_error, created_at, started_at, completed_at";

/// Provides queue operations on the `tasks` table.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a pending task.
    ///
    /// When `dedupe_key` is set and a pending task with the same key already
    /// exists, the insert folds into it and `None` is returned (conditional
    /// insert against the partial unique index).
    pub async fn insert(
        executor: impl sqlx::PgExecutor<'_>,
        name: &str,
        payload: &serde_json::Value,
        dedupe_key: Option<&str>,
        max_attempts: i32,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (name, payload, dedupe_key, max_attempts)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (dedupe_key) WHERE status = 'pending' AND dedupe_key IS NOT NULL
                 DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(name)
            .bind(payload)
            .bind(dedupe_key)
            .bind(max_attempts)
            .fetch_optional(executor)
            .await
    }

    /// Atomically claim the next runnable pending task.
    ///
    /// Honors `run_at` so backoff-delayed retries are not claimed early.
    /// Increments `attempts` as part of the claim.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks
             SET status = $1, started_at = NOW(), attempts = attempts + 1
             WHERE id = (
                 SELECT id FROM tasks
                 WHERE status = $2 AND run_at <= NOW()
                 ORDER BY run_at ASC, id ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(TaskStatus::Running)
            .bind(TaskStatus::Pending)
            .fetch_optional(pool)
            .await
    }

    /// Mark a task completed.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET status = $2, completed_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(TaskStatus::Completed)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Return a task to the pending state with a future `run_at`.
    ///
    /// Fails with a unique violation if another pending task now holds the
    /// same dedupe key; the queue layer resolves that by folding.
    pub async fn reschedule(
        pool: &PgPool,
        id: DbId,
        error: &str,
        run_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET status = $2, last_error = $3, run_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(TaskStatus::Pending)
        .bind(error)
        .bind(run_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a task permanently failed.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET status = $2, last_error = $3, completed_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(TaskStatus::Failed)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a task by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Count pending tasks, optionally restricted to one task name.
    pub async fn pending_count(pool: &PgPool, name: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks
             WHERE status = 'pending' AND ($1::TEXT IS NULL OR name = $1)",
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }

    /// Recover tasks stuck in `running` since before `cutoff`.
    ///
    /// A stuck task whose dedupe key has meanwhile gained a fresh pending
    /// duplicate is completed instead of re-pended (the duplicate subsumes
    /// it); the rest go back to pending for immediate re-claim. Returns the
    /// number of tasks returned to the pending state.
    pub async fn reap_stale(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE tasks SET status = 'completed', completed_at = NOW(),
                    last_error = 'superseded by pending duplicate'
             WHERE status = 'running' AND started_at < $1
               AND dedupe_key IS NOT NULL
               AND EXISTS (
                   SELECT 1 FROM tasks dup
                   WHERE dup.dedupe_key = tasks.dedupe_key AND dup.status = 'pending'
               )",
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;

        let repended = sqlx::query(
            "UPDATE tasks SET status = 'pending', run_at = NOW()
             WHERE status = 'running' AND started_at < $1",
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(repended.rows_affected())
    }
}
