use lode_core::eligibility::EligibilityWindow;

/// Ledger configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Acceptance window for event timestamps.
    pub eligibility: EligibilityWindow,
    /// Master switch for granting block-mined points.
    pub allow_block_mined_points: bool,
    /// Blocks past this sequence no longer award points.
    pub block_mined_sequence_cap: i64,
}

impl LedgerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default   |
    /// |----------------------------|-----------|
    /// | `ALLOW_BLOCK_MINED_POINTS` | `true`    |
    /// | `BLOCK_MINED_SEQUENCE_CAP` | `150000`  |
    ///
    /// Eligibility window variables are documented on
    /// [`EligibilityWindow::from_env`].
    pub fn from_env() -> Self {
        let allow_block_mined_points = std::env::var("ALLOW_BLOCK_MINED_POINTS")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let block_mined_sequence_cap: i64 = std::env::var("BLOCK_MINED_SEQUENCE_CAP")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(150_000);

        Self {
            eligibility: EligibilityWindow::from_env(),
            allow_block_mined_points,
            block_mined_sequence_cap,
        }
    }
}
