//! Read-only event metrics.
//!
//! Reports come straight from the `events` table, never from the aggregate
//! store, so they always reflect the ledger's current state regardless of
//! the recomputation backlog.

use serde::Serialize;

use lode_core::category::EventCategory;
use lode_core::error::CoreError;
use lode_core::types::{DbId, Timestamp};
use lode_db::repositories::{EventRepo, UserRepo};
use lode_db::DbPool;

/// Count and point-sum for one category.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategoryMetrics {
    pub category: EventCategory,
    pub count: i64,
    pub points: i64,
}

/// Lifetime metrics across every category.
#[derive(Debug, Serialize)]
pub struct LifetimeMetrics {
    pub user_id: DbId,
    pub categories: Vec<CategoryMetrics>,
    pub total_points: i64,
}

/// Metrics over a half-open `[start, end)` window.
#[derive(Debug, Serialize)]
pub struct WindowedMetrics {
    pub user_id: DbId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub categories: Vec<CategoryMetrics>,
    /// Point-sum across all categories inside the window.
    pub points: i64,
}

/// Aggregates event counts and point-sums for reporting.
pub struct MetricsReporter;

impl MetricsReporter {
    /// Per-category lifetime count and point-sum for a user.
    pub async fn lifetime(
        pool: &DbPool,
        user_id: DbId,
    ) -> Result<LifetimeMetrics, crate::LedgerError> {
        Self::require_user(pool, user_id).await?;

        let mut categories = Vec::with_capacity(EventCategory::ALL.len());
        let mut total_points = 0;
        for category in EventCategory::ALL {
            let aggregate = EventRepo::metrics_lifetime(pool, user_id, category).await?;
            total_points += aggregate.points;
            categories.push(CategoryMetrics {
                category,
                count: aggregate.count,
                points: aggregate.points,
            });
        }

        Ok(LifetimeMetrics { user_id, categories, total_points })
    }

    /// Per-category count and point-sum inside `[start, end)`.
    pub async fn windowed(
        pool: &DbPool,
        user_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<WindowedMetrics, crate::LedgerError> {
        if start >= end {
            return Err(CoreError::Validation(
                "Metrics window start must precede end".to_string(),
            )
            .into());
        }
        Self::require_user(pool, user_id).await?;

        let mut categories = Vec::with_capacity(EventCategory::ALL.len());
        for category in EventCategory::ALL {
            let aggregate =
                EventRepo::metrics_windowed(pool, user_id, category, start, end).await?;
            categories.push(CategoryMetrics {
                category,
                count: aggregate.count,
                points: aggregate.points,
            });
        }

        let points = EventRepo::points_in_window(pool, user_id, start, end).await?;

        Ok(WindowedMetrics { user_id, start, end, categories, points })
    }

    async fn require_user(pool: &DbPool, user_id: DbId) -> Result<(), crate::LedgerError> {
        UserRepo::find_by_id(pool, user_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "User", id: user_id })?;
        Ok(())
    }
}
