//! Eligibility window for event ingestion.
//!
//! Points are only granted while an incentive phase is open. An event whose
//! `occurred_at` falls outside the window is *ineligible*: the request
//! succeeds but nothing is recorded. Ineligibility is an outcome, not an
//! error.

use chrono::TimeZone;

use crate::types::Timestamp;

/// Half-open acceptance window for event timestamps.
#[derive(Debug, Clone)]
pub struct EligibilityWindow {
    /// When `false`, every timestamp is accepted. Mirrors the
    /// `CHECK_EVENT_OCCURRED_AT` environment flag.
    pub enforce: bool,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl EligibilityWindow {
    /// The first incentive phase: 2021-12-01 20:00 UTC to 2022-03-12 20:00 UTC.
    pub fn phase_one() -> Self {
        Self {
            enforce: true,
            start: chrono::Utc.with_ymd_and_hms(2021, 12, 1, 20, 0, 0).unwrap(),
            end: chrono::Utc.with_ymd_and_hms(2022, 3, 12, 20, 0, 0).unwrap(),
        }
    }

    /// Build the window from environment variables.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `CHECK_EVENT_OCCURRED_AT`| `true`                  |
    /// | `PHASE_START`            | `2021-12-01T20:00:00Z`  |
    /// | `PHASE_END`              | `2022-03-12T20:00:00Z`  |
    ///
    /// Bounds are RFC 3339 timestamps.
    pub fn from_env() -> Self {
        let defaults = Self::phase_one();

        let enforce = std::env::var("CHECK_EVENT_OCCURRED_AT")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let start = std::env::var("PHASE_START")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.start);

        let end = std::env::var("PHASE_END")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.end);

        Self { enforce, start, end }
    }

    /// Whether an event that occurred at `occurred_at` may be recorded.
    pub fn allows(&self, occurred_at: Timestamp) -> bool {
        if !self.enforce {
            return true;
        }
        occurred_at >= self.start && occurred_at < self.end
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn timestamp_inside_window_is_allowed() {
        let window = EligibilityWindow::phase_one();
        assert!(window.allows(window.start + Duration::days(10)));
    }

    #[test]
    fn window_start_is_inclusive_end_is_exclusive() {
        let window = EligibilityWindow::phase_one();
        assert!(window.allows(window.start));
        assert!(!window.allows(window.end));
    }

    #[test]
    fn timestamp_before_launch_is_rejected() {
        let window = EligibilityWindow::phase_one();
        assert!(!window.allows(window.start - Duration::seconds(1)));
    }

    #[test]
    fn timestamp_after_phase_is_rejected() {
        let window = EligibilityWindow::phase_one();
        assert!(!window.allows(window.end + Duration::days(30)));
    }

    #[test]
    fn unenforced_window_allows_everything() {
        let mut window = EligibilityWindow::phase_one();
        window.enforce = false;
        assert!(window.allows(window.start - Duration::days(365)));
        assert!(window.allows(window.end + Duration::days(365)));
    }
}
