//! Deterministic monthly cash-flow projection: income, inflating expense
//! budgets, one-time costs, savings buckets with a cash-reserve rule, and
//! calendar-year rollups, served over a small JSON API.

pub mod api;
pub mod config;
pub mod core;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Installs the global `tracing` subscriber once; later calls are no-ops.
pub fn init_tracing(filter: &str) {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter =
            EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("ledgera=info"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
