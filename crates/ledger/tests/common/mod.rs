//! Shared helpers for ledger integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use lode_core::eligibility::EligibilityWindow;
use lode_core::types::{DbId, Timestamp};
use lode_db::models::block::{Block, CreateBlock};
use lode_db::models::deposit::{CreateDeposit, Deposit};
use lode_db::models::user::CreateUser;
use lode_db::repositories::{BlockRepo, DepositRepo, UserPointsRepo, UserRepo};
use lode_ledger::tasks::UpdatePointsPayload;
use lode_ledger::{EventLedger, LedgerConfig, PointsRecomputer};
use lode_queue::TaskQueue;

/// Ledger configuration matching production defaults.
pub fn test_config() -> LedgerConfig {
    LedgerConfig {
        eligibility: EligibilityWindow::phase_one(),
        allow_block_mined_points: true,
        block_mined_sequence_cap: 150_000,
    }
}

/// Build an [`EventLedger`] over the test pool.
pub fn build_ledger(pool: &PgPool) -> EventLedger {
    EventLedger::new(pool.clone(), TaskQueue::new(pool.clone()), test_config())
}

/// A timestamp inside the phase-one eligibility window.
pub fn in_phase(day: u32, hour: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2022, 1, day, hour, 0, 0).unwrap()
}

/// Create a user with a provisioned aggregate row.
pub async fn new_user(pool: &PgPool, handle: &str) -> DbId {
    let mut tx = pool.begin().await.unwrap();
    let user = UserRepo::create(
        &mut *tx,
        &CreateUser {
            handle: handle.to_string(),
            email: format!("{handle}@example.com"),
            country_code: "USA".to_string(),
        },
    )
    .await
    .unwrap();
    UserPointsRepo::provision(&mut *tx, user.id).await.unwrap();
    tx.commit().await.unwrap();
    user.id
}

/// Record a block at the given sequence, timestamped inside the phase.
pub async fn new_block(pool: &PgPool, hash: &str, sequence: i64) -> Block {
    BlockRepo::create(
        pool,
        &CreateBlock {
            hash: hash.to_string(),
            sequence,
            difficulty: 12_000,
            main: true,
            timestamp: in_phase(5, 8),
            transactions_count: 1,
        },
    )
    .await
    .unwrap()
}

/// Record a deposit.
pub async fn new_deposit(pool: &PgPool, transaction_hash: &str) -> Deposit {
    DepositRepo::create(
        pool,
        &CreateDeposit {
            transaction_hash: transaction_hash.to_string(),
            block_hash: "0xparent".to_string(),
            amount: 500,
        },
    )
    .await
    .unwrap()
}

/// Drain the queue, running every pending recomputation like the worker
/// would.
pub async fn run_pending_recomputations(pool: &PgPool) {
    let queue = TaskQueue::new(pool.clone());
    while let Some(task) = queue.claim_next().await.unwrap() {
        let payload: UpdatePointsPayload = serde_json::from_value(task.payload.clone()).unwrap();
        PointsRecomputer::recompute(pool, payload.user_id, payload.category)
            .await
            .unwrap();
        queue.complete(&task).await.unwrap();
    }
}
