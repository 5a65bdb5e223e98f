//! Integration tests for the block and deposit collaborator tables.

use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use lode_db::models::block::CreateBlock;
use lode_db::models::deposit::CreateDeposit;
use lode_db::repositories::{BlockRepo, DepositRepo};

// ---------------------------------------------------------------------------
// Test: blocks round-trip by id and hash
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_block_round_trips_by_id_and_hash(pool: PgPool) {
    let block = BlockRepo::create(
        &pool,
        &CreateBlock {
            hash: "0xfeed".to_string(),
            sequence: 42,
            difficulty: 9_000,
            main: true,
            timestamp: Utc.with_ymd_and_hms(2022, 1, 3, 10, 0, 0).unwrap(),
            transactions_count: 2,
        },
    )
    .await
    .unwrap();

    let by_id = BlockRepo::find_by_id(&pool, block.id).await.unwrap().unwrap();
    assert_eq!(by_id.hash, "0xfeed");
    assert_eq!(by_id.sequence, 42);

    let by_hash = BlockRepo::find_by_hash(&pool, "0xfeed").await.unwrap().unwrap();
    assert_eq!(by_hash.id, block.id);

    assert!(BlockRepo::find_by_hash(&pool, "0xmissing").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: deposits round-trip by id and transaction hash
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deposit_round_trips_by_id_and_hash(pool: PgPool) {
    let deposit = DepositRepo::create(
        &pool,
        &CreateDeposit {
            transaction_hash: "0xsend".to_string(),
            block_hash: "0xparent".to_string(),
            amount: 750,
        },
    )
    .await
    .unwrap();

    let by_id = DepositRepo::find_by_id(&pool, deposit.id).await.unwrap().unwrap();
    assert_eq!(by_id.amount, 750);

    let by_hash = DepositRepo::find_by_transaction_hash(&pool, "0xsend")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_hash.id, deposit.id);
}

// ---------------------------------------------------------------------------
// Test: duplicate block hashes are rejected
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_block_hash_is_rejected(pool: PgPool) {
    let input = CreateBlock {
        hash: "0xdup".to_string(),
        sequence: 7,
        difficulty: 100,
        main: true,
        timestamp: Utc.with_ymd_and_hms(2022, 1, 3, 10, 0, 0).unwrap(),
        transactions_count: 0,
    };

    BlockRepo::create(&pool, &input).await.unwrap();
    assert!(BlockRepo::create(&pool, &input).await.is_err());
}
