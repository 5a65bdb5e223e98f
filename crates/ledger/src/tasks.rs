//! Task names and payloads the ledger submits to the queue.

use serde::{Deserialize, Serialize};

use lode_core::category::EventCategory;
use lode_core::types::DbId;

/// Task name for per-(user, category) points recomputation.
pub const UPDATE_POINTS_TASK: &str = "update-points";

/// Payload of an [`UPDATE_POINTS_TASK`] task.
///
/// Carries only the recomputation key. Point values are deliberately absent:
/// the worker always re-reads the ledger, so a task enqueued before an
/// override still converges on the current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePointsPayload {
    pub user_id: DbId,
    pub category: EventCategory,
}

impl UpdatePointsPayload {
    /// Queue dedupe key: at most one pending recomputation per key.
    pub fn dedupe_key(&self) -> String {
        format!("{UPDATE_POINTS_TASK}:{}:{}", self.user_id, self.category)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_key_embeds_user_and_category() {
        let payload = UpdatePointsPayload {
            user_id: 42,
            category: EventCategory::BlockMined,
        };
        assert_eq!(payload.dedupe_key(), "update-points:42:BLOCK_MINED");
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = UpdatePointsPayload {
            user_id: 7,
            category: EventCategory::NodeUptime,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["category"], "NODE_UPTIME");

        let back: UpdatePointsPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back.user_id, 7);
        assert_eq!(back.category, EventCategory::NodeUptime);
    }
}
