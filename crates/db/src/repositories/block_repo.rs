//! Repository for the `blocks` table.

use sqlx::PgPool;

use lode_core::types::DbId;

use crate::models::block::{Block, CreateBlock};

/// Column list for `blocks` queries.
const COLUMNS: &str =
    "id, hash, sequence, difficulty, main, timestamp, transactions_count, created_at";

pub struct BlockRepo;

impl BlockRepo {
    /// Insert a new block, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateBlock) -> Result<Block, sqlx::Error> {
        let query = format!(
            "INSERT INTO blocks (hash, sequence, difficulty, main, timestamp, transactions_count)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Block>(&query)
            .bind(&input.hash)
            .bind(input.sequence)
            .bind(input.difficulty)
            .bind(input.main)
            .bind(input.timestamp)
            .bind(input.transactions_count)
            .fetch_one(pool)
            .await
    }

    /// Find a block by internal ID.
    pub async fn find_by_id(
        executor: impl sqlx::PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Block>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blocks WHERE id = $1");
        sqlx::query_as::<_, Block>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a block by its hash.
    pub async fn find_by_hash(pool: &PgPool, hash: &str) -> Result<Option<Block>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blocks WHERE hash = $1");
        sqlx::query_as::<_, Block>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }
}
