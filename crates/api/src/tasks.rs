//! Background maintenance tasks.

use std::sync::Arc;
use std::time::Duration;

use inventory_store::InventoryStore;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use crate::AppState;

/// Periodically stocks the days that slide into the booking horizon.
///
/// The first tick fires one `every` after spawning; callers run the initial
/// fill themselves before serving.
pub fn spawn_horizon_refresh<S: InventoryStore + 'static>(
    state: Arc<AppState<S>>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        loop {
            ticker.tick().await;
            match state.horizon.fill_missing_days().await {
                Ok(report) => tracing::debug!(
                    inventory_inserted = report.inventory_inserted,
                    rates_inserted = report.rates_inserted,
                    "horizon refresh complete"
                ),
                Err(err) => {
                    metrics::counter!("horizon_refresh_failures_total").increment(1);
                    tracing::warn!(error = %err, "horizon refresh failed");
                }
            }
        }
    })
}
