//! Leaderboard ranking over the aggregate store.

use serde::Serialize;

use lode_core::category::EventCategory;
use lode_core::error::CoreError;
use lode_core::types::DbId;
use lode_db::models::user_points::UserRank;
use lode_db::repositories::{EventRepo, UserPointsRepo, UserRepo};
use lode_db::DbPool;

/// A user's standing for a category set, including how many events
/// contributed to it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RankedMetrics {
    pub points: i64,
    pub rank: i64,
    pub count: i64,
}

/// Computes a user's rank among all users.
pub struct RankingEngine;

impl RankingEngine {
    /// Rank a user over the summed subtotals of the given categories.
    ///
    /// Ordering: higher points first; ties prefer the user whose latest
    /// contributing event occurred earlier; remaining ties prefer the older
    /// account. Users without activity rank with zero points. Every user is
    /// expected to have an aggregate row from account provisioning — a
    /// missing row is an internal-consistency fault, not a zero.
    pub async fn rank(
        pool: &DbPool,
        user_id: DbId,
        categories: &[EventCategory],
    ) -> Result<UserRank, crate::LedgerError> {
        if categories.is_empty() {
            return Err(CoreError::Validation(
                "Rank requires at least one category".to_string(),
            )
            .into());
        }

        UserRepo::find_by_id(pool, user_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "User", id: user_id })?;

        if UserPointsRepo::find_by_user_id(pool, user_id).await?.is_none() {
            return Err(CoreError::InternalConsistency(format!(
                "User {user_id} has no points aggregate row"
            ))
            .into());
        }

        let rank = UserPointsRepo::rank_for_user(pool, user_id, categories)
            .await?
            .ok_or_else(|| {
                CoreError::InternalConsistency(format!(
                    "Ranking returned no row for user {user_id}"
                ))
            })?;
        Ok(rank)
    }

    /// Rank plus the number of active events behind the points.
    pub async fn rank_with_count(
        pool: &DbPool,
        user_id: DbId,
        categories: &[EventCategory],
    ) -> Result<RankedMetrics, crate::LedgerError> {
        let rank = Self::rank(pool, user_id, categories).await?;

        let mut count = 0;
        for category in categories {
            count += EventRepo::metrics_lifetime(pool, user_id, *category)
                .await?
                .count;
        }

        Ok(RankedMetrics {
            points: rank.points,
            rank: rank.rank,
            count,
        })
    }
}
