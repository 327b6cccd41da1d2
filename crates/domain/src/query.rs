//! Read-only lookups of availability and prices.

use std::sync::Arc;

use chrono::NaiveDate;
use common::{DateRange, Money};
use inventory_store::InventoryStore;

use crate::error::{ReservationError, Result};
use crate::validation::{Clock, RangePolicy};

/// Free spaces on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub available_spaces: i32,
}

/// Price of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPrice {
    pub date: NaiveDate,
    pub price: Money,
}

/// Answers availability and price questions from stored per-day rows.
///
/// Nothing is cached; every call reads the store.
pub struct QueryService<S: InventoryStore> {
    store: S,
    policy: RangePolicy,
    clock: Arc<dyn Clock>,
}

impl<S: InventoryStore> QueryService<S> {
    pub fn new(store: S, policy: RangePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    /// Free spaces per day, in date order.
    ///
    /// Any well-ordered range is accepted, including past days; days without
    /// inventory rows are left out.
    #[tracing::instrument(skip(self))]
    pub async fn availability(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayAvailability>> {
        let range = DateRange::new(start, end).ok_or_else(|| {
            ReservationError::InvalidRange(format!("end date {end} is before start date {start}"))
        })?;

        let days = self.store.inventory(range).await?;
        Ok(days
            .into_iter()
            .map(|day| DayAvailability {
                date: day.date,
                available_spaces: day.available_spaces(),
            })
            .collect())
    }

    /// Price per day, in date order. The range must pass the booking policy.
    #[tracing::instrument(skip(self))]
    pub async fn prices(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DayPrice>> {
        let range = self.policy.validate(start, end, self.clock.today())?;

        let rates = self.store.rates(range).await?;
        Ok(rates
            .into_iter()
            .map(|rate| DayPrice {
                date: rate.date,
                price: rate.price,
            })
            .collect())
    }
}
