use std::sync::Arc;

use lode_ledger::EventLedger;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: lode_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The event ledger service (store + task-queue collaborators).
    pub ledger: EventLedger,
}
