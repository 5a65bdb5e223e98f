//! Asynchronous points recomputation.
//!
//! Always rebuilds from the ledger instead of applying deltas, so any number
//! of runs in any order converge on the same aggregate values.

use lode_core::category::EventCategory;
use lode_core::types::DbId;
use lode_db::repositories::{EventRepo, UserPointsRepo};
use lode_db::DbPool;

/// Rebuilds one `(user, category)` slice of the aggregate store.
pub struct PointsRecomputer;

impl PointsRecomputer {
    /// Recompute a user's subtotal for one category and their grand total,
    /// and upsert both into `user_points`.
    ///
    /// Runs in a single transaction: the aggregate row is never partially
    /// updated. Safe to re-run for the same key and to run concurrently for
    /// different users.
    pub async fn recompute(
        pool: &DbPool,
        user_id: DbId,
        category: EventCategory,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let aggregate = EventRepo::aggregate_for_category(&mut *tx, user_id, category).await?;
        let total_points = EventRepo::total_points(&mut *tx, user_id).await?;

        UserPointsRepo::upsert_category(&mut *tx, user_id, category, &aggregate, total_points)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            user_id,
            category = %category,
            points = aggregate.points,
            total_points,
            "Recomputed points aggregate"
        );
        Ok(())
    }
}
