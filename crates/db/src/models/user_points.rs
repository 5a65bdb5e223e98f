//! Denormalized per-user points aggregate.

use serde::Serialize;
use sqlx::FromRow;

use lode_core::category::EventCategory;
use lode_core::types::{DbId, Timestamp};

/// A row from the `user_points` table. One per user, provisioned at account
/// creation. Written only by the recomputation worker.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserPoints {
    pub user_id: DbId,
    pub total_points: i64,

    pub block_mined_points: i64,
    pub block_mined_last_occurred_at: Option<Timestamp>,
    pub bug_caught_points: i64,
    pub bug_caught_last_occurred_at: Option<Timestamp>,
    pub community_contribution_points: i64,
    pub community_contribution_last_occurred_at: Option<Timestamp>,
    pub pull_request_merged_points: i64,
    pub pull_request_merged_last_occurred_at: Option<Timestamp>,
    pub social_media_promotion_points: i64,
    pub social_media_promotion_last_occurred_at: Option<Timestamp>,
    pub node_uptime_points: i64,
    pub node_uptime_last_occurred_at: Option<Timestamp>,
    pub send_transaction_points: i64,
    pub send_transaction_last_occurred_at: Option<Timestamp>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserPoints {
    /// Subtotal for one category.
    pub fn points_for(&self, category: EventCategory) -> i64 {
        match category {
            EventCategory::BlockMined => self.block_mined_points,
            EventCategory::BugCaught => self.bug_caught_points,
            EventCategory::CommunityContribution => self.community_contribution_points,
            EventCategory::PullRequestMerged => self.pull_request_merged_points,
            EventCategory::SocialMediaPromotion => self.social_media_promotion_points,
            EventCategory::NodeUptime => self.node_uptime_points,
            EventCategory::SendTransaction => self.send_transaction_points,
        }
    }

    /// Latest occurrence for one category, if any event was ever recorded.
    pub fn last_occurred_at_for(&self, category: EventCategory) -> Option<Timestamp> {
        match category {
            EventCategory::BlockMined => self.block_mined_last_occurred_at,
            EventCategory::BugCaught => self.bug_caught_last_occurred_at,
            EventCategory::CommunityContribution => self.community_contribution_last_occurred_at,
            EventCategory::PullRequestMerged => self.pull_request_merged_last_occurred_at,
            EventCategory::SocialMediaPromotion => self.social_media_promotion_last_occurred_at,
            EventCategory::NodeUptime => self.node_uptime_last_occurred_at,
            EventCategory::SendTransaction => self.send_transaction_last_occurred_at,
        }
    }
}

/// A user's points and rank for a category set, as computed by the ranking
/// query.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct UserRank {
    pub user_id: DbId,
    pub points: i64,
    pub rank: i64,
}
