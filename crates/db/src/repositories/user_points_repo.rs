//! Repository for the `user_points` aggregate table.
//!
//! The per-category column names come from the static mapping in
//! `lode_core::category` — queries are assembled from those `&'static str`
//! literals, never from caller-supplied strings.

use sqlx::PgPool;

use lode_core::category::EventCategory;
use lode_core::types::DbId;

use crate::models::event::PointsAggregate;
use crate::models::user_points::{UserPoints, UserRank};

/// Column list for `user_points` queries.
const COLUMNS: &str = "user_id, total_points, \
    block_mined_points, block_mined_last_occurred_at, \
    bug_caught_points, bug_caught_last_occurred_at, \
    community_contribution_points, community_contribution_last_occurred_at, \
    pull_request_merged_points, pull_request_merged_last_occurred_at, \
    social_media_promotion_points, social_media_promotion_last_occurred_at, \
    node_uptime_points, node_uptime_last_occurred_at, \
    send_transaction_points, send_transaction_last_occurred_at, \
    created_at, updated_at";

/// Provides access to the denormalized per-user points aggregate.
pub struct UserPointsRepo;

impl UserPointsRepo {
    /// Provision an empty aggregate row for a new user.
    ///
    /// Idempotent; runs inside the account-creation transaction.
    pub async fn provision(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO user_points (user_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Fetch a user's aggregate row.
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<UserPoints>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_points WHERE user_id = $1");
        sqlx::query_as::<_, UserPoints>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Write one category's recomputed subtotal and the grand total.
    ///
    /// Upserts so recomputation also heals a missing row.
    pub async fn upsert_category(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: DbId,
        category: EventCategory,
        aggregate: &PointsAggregate,
        total_points: i64,
    ) -> Result<(), sqlx::Error> {
        let points_col = category.points_column();
        let occurred_col = category.last_occurred_column();
        let query = format!(
            "INSERT INTO user_points (user_id, {points_col}, {occurred_col}, total_points)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO UPDATE SET
                 {points_col} = $2,
                 {occurred_col} = $3,
                 total_points = $4,
                 updated_at = NOW()"
        );
        sqlx::query(&query)
            .bind(user_id)
            .bind(aggregate.points)
            .bind(aggregate.last_occurred_at)
            .bind(total_points)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Compute a user's rank over the given category set.
    ///
    /// Single set-based ranking over all users joined against the aggregate
    /// store. Ties share a rank; the ordering is points descending, then
    /// earliest latest-occurrence (missing treated as now, i.e. worst),
    /// then account creation time.
    ///
    /// Returns `None` only if `user_id` does not exist in `users` at all.
    pub async fn rank_for_user(
        pool: &PgPool,
        user_id: DbId,
        categories: &[EventCategory],
    ) -> Result<Option<UserRank>, sqlx::Error> {
        assert!(!categories.is_empty(), "rank requires at least one category");

        let points_expr = categories
            .iter()
            .map(|c| format!("user_points.{}", c.points_column()))
            .collect::<Vec<_>>()
            .join(" + ");

        let occurred_exprs = categories
            .iter()
            .map(|c| format!("user_points.{}", c.last_occurred_column()))
            .collect::<Vec<_>>()
            .join(", ");

        let query = format!(
            "WITH user_ranks AS (
                 SELECT
                     users.id AS user_id,
                     COALESCE({points_expr}, 0) AS points,
                     DENSE_RANK() OVER (
                         ORDER BY
                             COALESCE({points_expr}, 0) DESC,
                             COALESCE(LEAST({occurred_exprs}), NOW()) ASC,
                             users.created_at ASC
                     ) AS rank
                 FROM users
                 LEFT JOIN user_points ON user_points.user_id = users.id
             )
             SELECT user_id, points, rank
             FROM user_ranks
             WHERE user_id = $1
             LIMIT 1"
        );

        sqlx::query_as::<_, UserRank>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
