//! Keeps inventory and rate rows stocked up to the booking horizon.

use std::sync::Arc;

use common::Money;
use inventory_store::{InventoryStore, SeedReport};

use crate::error::{ReservationError, Result};
use crate::validation::{Clock, RangePolicy};

/// Defaults written into newly stocked days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayDefaults {
    pub total_spaces: i32,
    pub price: Money,
}

impl Default for DayDefaults {
    fn default() -> Self {
        Self {
            total_spaces: 10,
            price: Money::from_cents(1500),
        }
    }
}

/// Fills in missing days between today and the end of the horizon.
///
/// The horizon slides forward with the calendar, so this needs to run
/// regularly; days that already exist are never modified.
pub struct HorizonMaintainer<S: InventoryStore> {
    store: S,
    policy: RangePolicy,
    defaults: DayDefaults,
    clock: Arc<dyn Clock>,
}

impl<S: InventoryStore> HorizonMaintainer<S> {
    pub fn new(store: S, policy: RangePolicy, defaults: DayDefaults, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            defaults,
            clock,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn fill_missing_days(&self) -> Result<SeedReport> {
        let today = self.clock.today();
        let horizon = self.policy.horizon(today).ok_or_else(|| {
            ReservationError::InvalidRange(format!("no horizon can be computed from {today}"))
        })?;

        let report = self
            .store
            .seed_days(horizon, self.defaults.total_spaces, self.defaults.price)
            .await?;

        metrics::counter!("horizon_days_seeded_total").increment(report.inventory_inserted);
        if report.inventory_inserted > 0 || report.rates_inserted > 0 {
            tracing::info!(
                %horizon,
                inventory = report.inventory_inserted,
                rates = report.rates_inserted,
                "stocked missing days"
            );
        }

        Ok(report)
    }
}
