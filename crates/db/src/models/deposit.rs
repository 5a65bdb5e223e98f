//! Bridge deposit entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lode_core::types::{DbId, Timestamp};

/// A row from the `deposits` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deposit {
    pub id: DbId,
    pub transaction_hash: String,
    pub block_hash: String,
    pub amount: i64,
    pub created_at: Timestamp,
}

/// DTO for recording a deposit.
#[derive(Debug, Deserialize)]
pub struct CreateDeposit {
    pub transaction_hash: String,
    pub block_hash: String,
    pub amount: i64,
}
