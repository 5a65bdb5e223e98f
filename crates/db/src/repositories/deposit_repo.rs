//! Repository for the `deposits` table.

use sqlx::PgPool;

use lode_core::types::DbId;

use crate::models::deposit::{CreateDeposit, Deposit};

/// Column list for `deposits` queries.
const COLUMNS: &str = "id, transaction_hash, block_hash, amount, created_at";

pub struct DepositRepo;

impl DepositRepo {
    /// Insert a new deposit, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateDeposit) -> Result<Deposit, sqlx::Error> {
        let query = format!(
            "INSERT INTO deposits (transaction_hash, block_hash, amount)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deposit>(&query)
            .bind(&input.transaction_hash)
            .bind(&input.block_hash)
            .bind(input.amount)
            .fetch_one(pool)
            .await
    }

    /// Find a deposit by internal ID.
    pub async fn find_by_id(
        executor: impl sqlx::PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Deposit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deposits WHERE id = $1");
        sqlx::query_as::<_, Deposit>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a deposit by its transaction hash.
    pub async fn find_by_transaction_hash(
        pool: &PgPool,
        transaction_hash: &str,
    ) -> Result<Option<Deposit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deposits WHERE transaction_hash = $1");
        sqlx::query_as::<_, Deposit>(&query)
            .bind(transaction_hash)
            .fetch_optional(pool)
            .await
    }
}
