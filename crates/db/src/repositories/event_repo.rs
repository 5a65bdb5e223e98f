//! Repository for the `events` table.
//!
//! Active-row filtering (`deleted_at IS NULL`) happens here so callers deal
//! in lifecycle terms, not in nullable-column checks. Sums are cast to
//! BIGINT in SQL because `SUM(BIGINT)` is NUMERIC in PostgreSQL.

use sqlx::PgPool;

use lode_core::category::EventCategory;
use lode_core::types::{DbId, Timestamp};

use crate::models::event::{CreateEventRow, Event, EventAggregate, PointsAggregate};

/// Column list for `events` queries.
const COLUMNS: &str = "id, category, user_id, points, occurred_at, deleted_at, \
                       block_id, deposit_id, url, created_at, updated_at";

/// Provides read/write operations for ledger events.
pub struct EventRepo;

impl EventRepo {
    /// Find an event by ID, regardless of lifecycle state.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the active event holding the given block identity.
    pub async fn find_active_by_block_id(
        executor: impl sqlx::PgExecutor<'_>,
        block_id: DbId,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM events WHERE block_id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Event>(&query)
            .bind(block_id)
            .fetch_optional(executor)
            .await
    }

    /// Find the active event holding the given deposit identity.
    pub async fn find_active_by_deposit_id(
        executor: impl sqlx::PgExecutor<'_>,
        deposit_id: DbId,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM events WHERE deposit_id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Event>(&query)
            .bind(deposit_id)
            .fetch_optional(executor)
            .await
    }

    /// Find the active event holding the given URL identity.
    pub async fn find_active_by_url(
        executor: impl sqlx::PgExecutor<'_>,
        url: &str,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE url = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Event>(&query)
            .bind(url)
            .fetch_optional(executor)
            .await
    }

    /// Insert a new active event, returning the created row.
    pub async fn insert(
        executor: impl sqlx::PgExecutor<'_>,
        input: &CreateEventRow,
    ) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events (category, user_id, points, occurred_at, block_id, deposit_id, url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(input.category)
            .bind(input.user_id)
            .bind(input.points)
            .bind(input.occurred_at)
            .bind(input.block_id)
            .bind(input.deposit_id)
            .bind(input.url.as_deref())
            .fetch_one(executor)
            .await
    }

    /// Overwrite an event's point value.
    pub async fn update_points(
        executor: impl sqlx::PgExecutor<'_>,
        id: DbId,
        points: i64,
    ) -> Result<Event, sqlx::Error> {
        let query = format!(
            "UPDATE events SET points = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(points)
            .fetch_one(executor)
            .await
    }

    /// Retract an active event: set `deleted_at`, zero the points.
    ///
    /// Returns `None` if the event was already retracted, making retraction
    /// naturally idempotent for the caller.
    pub async fn soft_delete(
        executor: impl sqlx::PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET deleted_at = NOW(), points = 0, updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// First page, or the page following `cursor`, in `(occurred_at DESC,
    /// id DESC)` order.
    pub async fn page_after(
        pool: &PgPool,
        user_id: DbId,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        match cursor {
            Some((occurred_at, id)) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM events
                     WHERE user_id = $1 AND deleted_at IS NULL
                       AND (occurred_at, id) < ($2, $3)
                     ORDER BY occurred_at DESC, id DESC
                     LIMIT $4"
                );
                sqlx::query_as::<_, Event>(&query)
                    .bind(user_id)
                    .bind(occurred_at)
                    .bind(id)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM events
                     WHERE user_id = $1 AND deleted_at IS NULL
                     ORDER BY occurred_at DESC, id DESC
                     LIMIT $2"
                );
                sqlx::query_as::<_, Event>(&query)
                    .bind(user_id)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// The page preceding `cursor` in `(occurred_at DESC, id DESC)` order.
    ///
    /// Rows come back in ascending order (nearest-to-cursor first); the
    /// caller reverses them for presentation.
    pub async fn page_before(
        pool: &PgPool,
        user_id: DbId,
        cursor: (Timestamp, DbId),
        limit: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE user_id = $1 AND deleted_at IS NULL
               AND (occurred_at, id) > ($2, $3)
             ORDER BY occurred_at ASC, id ASC
             LIMIT $4"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(user_id)
            .bind(cursor.0)
            .bind(cursor.1)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Whether any active row follows the given position in page order.
    pub async fn exists_after(
        pool: &PgPool,
        user_id: DbId,
        position: (Timestamp, DbId),
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM events
                 WHERE user_id = $1 AND deleted_at IS NULL
                   AND (occurred_at, id) < ($2, $3)
             )",
        )
        .bind(user_id)
        .bind(position.0)
        .bind(position.1)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Whether any active row precedes the given position in page order.
    pub async fn exists_before(
        pool: &PgPool,
        user_id: DbId,
        position: (Timestamp, DbId),
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM events
                 WHERE user_id = $1 AND deleted_at IS NULL
                   AND (occurred_at, id) > ($2, $3)
             )",
        )
        .bind(user_id)
        .bind(position.0)
        .bind(position.1)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Point-sum and latest occurrence over active events of one category.
    pub async fn aggregate_for_category(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: DbId,
        category: EventCategory,
    ) -> Result<PointsAggregate, sqlx::Error> {
        sqlx::query_as::<_, PointsAggregate>(
            "SELECT COALESCE(SUM(points), 0)::BIGINT AS points,
                    MAX(occurred_at) AS last_occurred_at
             FROM events
             WHERE user_id = $1 AND category = $2 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(category)
        .fetch_one(executor)
        .await
    }

    /// Grand total over all active events for a user.
    pub async fn total_points(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0)::BIGINT
             FROM events
             WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Lifetime count and point-sum for one (user, category).
    pub async fn metrics_lifetime(
        pool: &PgPool,
        user_id: DbId,
        category: EventCategory,
    ) -> Result<EventAggregate, sqlx::Error> {
        sqlx::query_as::<_, EventAggregate>(
            "SELECT COUNT(*) AS count, COALESCE(SUM(points), 0)::BIGINT AS points
             FROM events
             WHERE user_id = $1 AND category = $2 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(category)
        .fetch_one(pool)
        .await
    }

    /// Count and point-sum for one (user, category) in `[start, end)`.
    pub async fn metrics_windowed(
        pool: &PgPool,
        user_id: DbId,
        category: EventCategory,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<EventAggregate, sqlx::Error> {
        sqlx::query_as::<_, EventAggregate>(
            "SELECT COUNT(*) AS count, COALESCE(SUM(points), 0)::BIGINT AS points
             FROM events
             WHERE user_id = $1 AND category = $2 AND deleted_at IS NULL
               AND occurred_at >= $3 AND occurred_at < $4",
        )
        .bind(user_id)
        .bind(category)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
    }

    /// Point-sum across all categories in `[start, end)`.
    pub async fn points_in_window(
        pool: &PgPool,
        user_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0)::BIGINT
             FROM events
             WHERE user_id = $1 AND deleted_at IS NULL
               AND occurred_at >= $2 AND occurred_at < $3",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
    }
}
