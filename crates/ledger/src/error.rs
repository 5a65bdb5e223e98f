use lode_core::error::CoreError;

/// Error type for ledger operations.
///
/// Store errors propagate unchanged; domain failures carry a [`CoreError`].
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience alias for ledger results.
pub type LedgerResult<T> = Result<T, LedgerError>;
