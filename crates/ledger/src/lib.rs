//! The event-to-points reconciliation engine.
//!
//! [`ledger::EventLedger`] owns event ingestion and retraction and triggers
//! asynchronous recomputation through the task queue.
//! [`recompute::PointsRecomputer`] rebuilds the denormalized `user_points`
//! aggregate from the ledger; [`rank::RankingEngine`] and
//! [`metrics::MetricsReporter`] are pure read paths.

pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod rank;
pub mod recompute;
pub mod tasks;

pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use ledger::EventLedger;
pub use metrics::MetricsReporter;
pub use rank::RankingEngine;
pub use recompute::PointsRecomputer;
