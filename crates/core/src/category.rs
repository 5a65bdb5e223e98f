//! Event categories and the points catalog.
//!
//! Every trackable contribution belongs to exactly one [`EventCategory`].
//! The catalog maps each category to its default point award and to the
//! pair of denormalized columns it owns in the `user_points` table. Column
//! names are compile-time literals so query builders never interpolate
//! caller-supplied strings.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The fixed set of point-awarding event kinds.
///
/// Stored in PostgreSQL as the `event_category` enum type; serialized over
/// the API in SCREAMING_SNAKE_CASE (`"BLOCK_MINED"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    BlockMined,
    BugCaught,
    CommunityContribution,
    PullRequestMerged,
    SocialMediaPromotion,
    NodeUptime,
    SendTransaction,
}

/// Coarse grouping of categories for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryGroup {
    /// Awards earned by running network infrastructure.
    Network,
    /// Awards earned by contributing to the project and its community.
    Community,
}

impl EventCategory {
    /// Every category, in catalog order. Used by recomputation and metrics
    /// fan-out so a newly added category cannot be silently skipped.
    pub const ALL: [EventCategory; 7] = [
        EventCategory::BlockMined,
        EventCategory::BugCaught,
        EventCategory::CommunityContribution,
        EventCategory::PullRequestMerged,
        EventCategory::SocialMediaPromotion,
        EventCategory::NodeUptime,
        EventCategory::SendTransaction,
    ];

    /// Default point award for an event of this category.
    ///
    /// Applied when no explicit override accompanies the event.
    pub fn default_points(self) -> i64 {
        match self {
            EventCategory::BlockMined => 100,
            EventCategory::BugCaught => 100,
            EventCategory::CommunityContribution => 1000,
            EventCategory::PullRequestMerged => 500,
            EventCategory::SocialMediaPromotion => 100,
            EventCategory::NodeUptime => 10,
            EventCategory::SendTransaction => 1,
        }
    }

    /// Reporting group this category belongs to.
    pub fn group(self) -> CategoryGroup {
        match self {
            EventCategory::BlockMined
            | EventCategory::NodeUptime
            | EventCategory::SendTransaction => CategoryGroup::Network,
            EventCategory::BugCaught
            | EventCategory::CommunityContribution
            | EventCategory::PullRequestMerged
            | EventCategory::SocialMediaPromotion => CategoryGroup::Community,
        }
    }

    /// Wire name, matching the database enum value.
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::BlockMined => "BLOCK_MINED",
            EventCategory::BugCaught => "BUG_CAUGHT",
            EventCategory::CommunityContribution => "COMMUNITY_CONTRIBUTION",
            EventCategory::PullRequestMerged => "PULL_REQUEST_MERGED",
            EventCategory::SocialMediaPromotion => "SOCIAL_MEDIA_PROMOTION",
            EventCategory::NodeUptime => "NODE_UPTIME",
            EventCategory::SendTransaction => "SEND_TRANSACTION",
        }
    }

    /// Parse a wire name back into a category.
    pub fn parse(value: &str) -> Result<EventCategory, CoreError> {
        EventCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| {
                CoreError::Validation(format!("Unknown event category '{value}'"))
            })
    }

    /// Column in `user_points` holding this category's point subtotal.
    pub fn points_column(self) -> &'static str {
        match self {
            EventCategory::BlockMined => "block_mined_points",
            EventCategory::BugCaught => "bug_caught_points",
            EventCategory::CommunityContribution => "community_contribution_points",
            EventCategory::PullRequestMerged => "pull_request_merged_points",
            EventCategory::SocialMediaPromotion => "social_media_promotion_points",
            EventCategory::NodeUptime => "node_uptime_points",
            EventCategory::SendTransaction => "send_transaction_points",
        }
    }

    /// Column in `user_points` holding this category's latest occurrence.
    pub fn last_occurred_column(self) -> &'static str {
        match self {
            EventCategory::BlockMined => "block_mined_last_occurred_at",
            EventCategory::BugCaught => "bug_caught_last_occurred_at",
            EventCategory::CommunityContribution => "community_contribution_last_occurred_at",
            EventCategory::PullRequestMerged => "pull_request_merged_last_occurred_at",
            EventCategory::SocialMediaPromotion => "social_media_promotion_last_occurred_at",
            EventCategory::NodeUptime => "node_uptime_last_occurred_at",
            EventCategory::SendTransaction => "send_transaction_last_occurred_at",
        }
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
