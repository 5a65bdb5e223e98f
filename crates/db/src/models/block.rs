//! Mined block entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lode_core::types::{DbId, Timestamp};

/// A row from the `blocks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Block {
    pub id: DbId,
    pub hash: String,
    pub sequence: i64,
    pub difficulty: i64,
    /// Whether the block is on the main chain. Forked blocks stay in the
    /// table but no longer award points.
    pub main: bool,
    pub timestamp: Timestamp,
    pub transactions_count: i32,
    pub created_at: Timestamp,
}

/// DTO for recording a newly mined block.
#[derive(Debug, Deserialize)]
pub struct CreateBlock {
    pub hash: String,
    pub sequence: i64,
    pub difficulty: i64,
    pub main: bool,
    pub timestamp: Timestamp,
    pub transactions_count: i32,
}
