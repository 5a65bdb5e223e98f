//! Task-queue worker.
//!
//! Drains the durable queue and dispatches tasks by name. The only handler
//! today is points recomputation; it is idempotent, so the queue's
//! at-least-once delivery needs no compensation here.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use lode_db::models::task::Task;
use lode_db::DbPool;
use lode_ledger::tasks::{UpdatePointsPayload, UPDATE_POINTS_TASK};
use lode_ledger::PointsRecomputer;
use lode_queue::TaskQueue;

/// How often the worker polls for runnable tasks when idle.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How often stuck `running` tasks are reaped.
const REAP_INTERVAL: Duration = Duration::from_secs(60);

/// A `running` task older than this is considered stuck.
const STALE_TASK_AGE_MINUTES: i64 = 10;

/// How a task execution failed.
#[derive(Debug)]
pub enum TaskError {
    /// Transient; the queue retries with backoff.
    Retryable(String),
    /// The task can never succeed; fail it immediately.
    Fatal(String),
}

/// Run the worker loop until `cancel` is triggered.
///
/// Each poll tick drains the queue to empty; a slower tick reaps tasks left
/// `running` by a crashed worker back into the pending state.
pub async fn run(pool: DbPool, queue: TaskQueue, cancel: CancellationToken) {
    tracing::info!(
        poll_secs = POLL_INTERVAL.as_secs(),
        reap_secs = REAP_INTERVAL.as_secs(),
        "Worker started"
    );

    let mut poll = tokio::time::interval(POLL_INTERVAL);
    let mut reap = tokio::time::interval(REAP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Worker stopping");
                break;
            }
            _ = reap.tick() => {
                if let Err(e) = queue
                    .reap_stale(chrono::Duration::minutes(STALE_TASK_AGE_MINUTES))
                    .await
                {
                    tracing::error!(error = %e, "Failed to reap stale tasks");
                }
            }
            _ = poll.tick() => {
                drain(&pool, &queue).await;
            }
        }
    }
}

/// Claim and execute tasks until the queue has nothing runnable.
///
/// Returns the number of tasks processed (completed or failed).
pub async fn drain(pool: &DbPool, queue: &TaskQueue) -> u64 {
    let mut processed = 0;
    loop {
        let task = match queue.claim_next().await {
            Ok(Some(task)) => task,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to claim task");
                break;
            }
        };

        let result = process_task(pool, &task).await;
        let outcome = match result {
            Ok(()) => queue.complete(&task).await,
            Err(TaskError::Retryable(msg)) => queue.fail(&task, &msg).await,
            Err(TaskError::Fatal(msg)) => queue.fail_permanently(&task, &msg).await,
        };
        if let Err(e) = outcome {
            tracing::error!(task_id = task.id, error = %e, "Failed to record task outcome");
        }
        processed += 1;
    }
    processed
}

/// Dispatch one claimed task by name.
pub async fn process_task(pool: &DbPool, task: &Task) -> Result<(), TaskError> {
    match task.name.as_str() {
        UPDATE_POINTS_TASK => {
            let payload: UpdatePointsPayload = serde_json::from_value(task.payload.clone())
                .map_err(|e| TaskError::Fatal(format!("Invalid update-points payload: {e}")))?;

            PointsRecomputer::recompute(pool, payload.user_id, payload.category)
                .await
                .map_err(|e| TaskError::Retryable(e.to_string()))
        }
        other => Err(TaskError::Fatal(format!("Unknown task name: {other}"))),
    }
}
