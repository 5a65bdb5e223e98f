//! Shared query parameter types for API handlers.

use serde::Deserialize;

use lode_core::types::{DbId, Timestamp};

/// Cursor pagination parameters for event listings
/// (`?before=&after=&limit=`).
#[derive(Debug, Deserialize)]
pub struct EventCursorParams {
    pub before: Option<DbId>,
    pub after: Option<DbId>,
    pub limit: Option<i64>,
}

/// Optional metrics window (`?start=&end=`, RFC 3339).
///
/// Both bounds present selects windowed metrics; neither selects lifetime
/// metrics; supplying only one is a bad request.
#[derive(Debug, Deserialize)]
pub struct MetricsWindowParams {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

/// Category filter for ranking (`?categories=BLOCK_MINED,BUG_CAUGHT`).
/// Absent means all categories.
#[derive(Debug, Deserialize)]
pub struct RankParams {
    pub categories: Option<String>,
}
