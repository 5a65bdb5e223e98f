//! The [`TaskQueue`] handle.

use chrono::{Duration, Utc};

use lode_db::models::task::Task;
use lode_db::repositories::TaskRepo;
use lode_db::DbPool;

/// How many times a task may be attempted before it is marked failed.
const DEFAULT_MAX_ATTEMPTS: i32 = 5;

/// Base delay for retry backoff. Doubles per attempt.
const BASE_BACKOFF_SECS: i64 = 30;

/// Longest single backoff delay.
const MAX_BACKOFF_SECS: i64 = 3600;

/// Cheaply cloneable handle to the durable task queue.
///
/// Producers call [`enqueue`](TaskQueue::enqueue) and forget; workers drive
/// [`claim_next`](TaskQueue::claim_next) / [`complete`](TaskQueue::complete)
/// / [`fail`](TaskQueue::fail).
#[derive(Clone)]
pub struct TaskQueue {
    pool: DbPool,
    max_attempts: i32,
}

impl TaskQueue {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Enqueue a task.
    ///
    /// When `dedupe_key` is set and a pending task already holds the same
    /// key, nothing is inserted and `None` is returned — the pending task
    /// subsumes this trigger. Accepts any executor so producers can enqueue
    /// inside their own transaction.
    pub async fn enqueue(
        &self,
        executor: impl sqlx::PgExecutor<'_>,
        name: &str,
        payload: &serde_json::Value,
        dedupe_key: Option<&str>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let task = TaskRepo::insert(executor, name, payload, dedupe_key, self.max_attempts).await?;
        match &task {
            Some(task) => {
                tracing::debug!(task_id = task.id, task_name = name, "Task enqueued");
            }
            None => {
                tracing::debug!(
                    task_name = name,
                    dedupe_key = dedupe_key.unwrap_or(""),
                    "Task folded into pending duplicate"
                );
            }
        }
        Ok(task)
    }

    /// Claim the next runnable task, if any.
    pub async fn claim_next(&self) -> Result<Option<Task>, sqlx::Error> {
        TaskRepo::claim_next(&self.pool).await
    }

    /// Mark a claimed task as successfully completed.
    pub async fn complete(&self, task: &Task) -> Result<(), sqlx::Error> {
        TaskRepo::complete(&self.pool, task.id).await
    }

    /// Record a failed attempt.
    ///
    /// Below the attempt limit the task returns to pending with exponential
    /// backoff. At the limit it is marked failed permanently. If a fresh
    /// pending task claimed the dedupe key in the meantime, the retry folds
    /// into it and this task completes instead.
    pub async fn fail(&self, task: &Task, error: &str) -> Result<(), sqlx::Error> {
        if task.attempts >= task.max_attempts {
            tracing::warn!(
                task_id = task.id,
                task_name = %task.name,
                attempts = task.attempts,
                error,
                "Task failed permanently"
            );
            return TaskRepo::fail(&self.pool, task.id, error).await;
        }

        let delay = backoff_secs(task.attempts);
        let run_at = Utc::now() + Duration::seconds(delay);

        match TaskRepo::reschedule(&self.pool, task.id, error, run_at).await {
            Ok(()) => {
                tracing::info!(
                    task_id = task.id,
                    task_name = %task.name,
                    attempts = task.attempts,
                    retry_in_secs = delay,
                    error,
                    "Task rescheduled"
                );
                Ok(())
            }
            Err(err) if is_unique_violation(&err) => {
                tracing::debug!(
                    task_id = task.id,
                    task_name = %task.name,
                    "Retry folded into newer pending duplicate"
                );
                TaskRepo::complete(&self.pool, task.id).await
            }
            Err(err) => Err(err),
        }
    }

    /// Mark a task failed without retrying, regardless of remaining
    /// attempts. For poison tasks that can never succeed (unknown name,
    /// malformed payload).
    pub async fn fail_permanently(&self, task: &Task, error: &str) -> Result<(), sqlx::Error> {
        tracing::error!(
            task_id = task.id,
            task_name = %task.name,
            error,
            "Task failed permanently without retry"
        );
        TaskRepo::fail(&self.pool, task.id, error).await
    }

    /// Recover tasks stuck in `running` longer than `max_age`.
    pub async fn reap_stale(&self, max_age: Duration) -> Result<u64, sqlx::Error> {
        let cutoff = Utc::now() - max_age;
        let repended = TaskRepo::reap_stale(&self.pool, cutoff).await?;
        if repended > 0 {
            tracing::warn!(repended, "Reaped stale running tasks");
        }
        Ok(repended)
    }
}

/// Retry delay in seconds for the given attempt count (1-based).
fn backoff_secs(attempts: i32) -> i64 {
    let exponent = (attempts - 1).clamp(0, 30) as u32;
    (BASE_BACKOFF_SECS << exponent).min(MAX_BACKOFF_SECS)
}

/// Whether a sqlx error is a PostgreSQL unique-constraint violation (23505).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
