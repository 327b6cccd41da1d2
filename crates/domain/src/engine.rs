//! Reservation engine: create, cancel and amend bookings.

use std::sync::Arc;

use chrono::NaiveDate;
use common::BookingId;
use inventory_store::{Booking, InventoryStore, InventoryTx};

use crate::error::{ReservationError, Result};
use crate::plan;
use crate::validation::{Clock, RangePolicy};

/// Keeps per-day reserved counts in step with the set of confirmed bookings.
///
/// Each mutating operation runs as one unit of work: the capacity check and
/// the count changes it leads to commit together or not at all.
pub struct ReservationEngine<S: InventoryStore> {
    store: S,
    policy: RangePolicy,
    clock: Arc<dyn Clock>,
}

impl<S: InventoryStore> ReservationEngine<S> {
    /// Creates an engine that reads today's date from `clock`.
    pub fn new(store: S, policy: RangePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Books one space for every day from `start` to `end` inclusive.
    #[tracing::instrument(skip(self))]
    pub async fn create_booking(&self, start: NaiveDate, end: NaiveDate) -> Result<BookingId> {
        let result = self.try_create(start, end).await;
        record_outcome("create", &result);
        if let Ok(id) = &result {
            metrics::counter!("bookings_created_total").increment(1);
            tracing::info!(booking_id = %id, "booking created");
        }
        result
    }

    async fn try_create(&self, start: NaiveDate, end: NaiveDate) -> Result<BookingId> {
        let range = self.policy.validate(start, end, self.clock.today())?;

        let mut tx = self.store.begin().await?;
        let inventory = tx.lock_inventory(range).await?;
        let plan = plan::plan_booking(range, &inventory)?;

        let booking = Booking::confirmed(range);
        tx.insert_booking(&booking).await?;
        plan.apply(&mut tx).await?;
        tx.commit().await?;

        Ok(booking.id)
    }

    /// Cancels a confirmed booking and releases its days.
    ///
    /// Cancelling twice fails with `NotFound` the second time.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_booking(&self, id: BookingId) -> Result<BookingId> {
        let result = self.try_cancel(id).await;
        record_outcome("cancel", &result);
        if result.is_ok() {
            metrics::counter!("bookings_cancelled_total").increment(1);
            tracing::info!(booking_id = %id, "booking cancelled");
        }
        result
    }

    async fn try_cancel(&self, id: BookingId) -> Result<BookingId> {
        let mut tx = self.store.begin().await?;
        let mut booking = tx
            .find_confirmed_booking(id)
            .await?
            .ok_or(ReservationError::NotFound(id))?;

        tx.lock_inventory(booking.range).await?;
        let plan = plan::plan_cancellation(&booking);

        booking.cancel();
        tx.update_booking(&booking).await?;
        plan.apply(&mut tx).await?;
        tx.commit().await?;

        Ok(id)
    }

    /// Moves a confirmed booking to a new range.
    ///
    /// Only days the booking doesn't already hold are checked for capacity.
    /// On failure the booking and every count stay as they were.
    #[tracing::instrument(skip(self))]
    pub async fn amend_booking(
        &self,
        id: BookingId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BookingId> {
        let result = self.try_amend(id, start, end).await;
        record_outcome("amend", &result);
        if result.is_ok() {
            metrics::counter!("bookings_amended_total").increment(1);
            tracing::info!(booking_id = %id, "booking amended");
        }
        result
    }

    async fn try_amend(&self, id: BookingId, start: NaiveDate, end: NaiveDate) -> Result<BookingId> {
        let new_range = self.policy.validate(start, end, self.clock.today())?;

        let mut tx = self.store.begin().await?;
        let mut booking = tx
            .find_confirmed_booking(id)
            .await?
            .ok_or(ReservationError::NotFound(id))?;

        let inventory = tx.lock_inventory(booking.range.span(&new_range)).await?;
        let plan = plan::plan_amendment(&booking, new_range, &inventory)?;
        tracing::debug!(
            added = plan.increment.len(),
            removed = plan.decrement.len(),
            "amendment planned"
        );

        booking.reschedule(new_range);
        tx.update_booking(&booking).await?;
        plan.apply(&mut tx).await?;
        tx.commit().await?;

        Ok(id)
    }

    /// Loads a booking in any status.
    #[tracing::instrument(skip(self))]
    pub async fn booking(&self, id: BookingId) -> Result<Booking> {
        self.store
            .booking(id)
            .await?
            .ok_or(ReservationError::NotFound(id))
    }
}

fn record_outcome<T>(operation: &'static str, result: &Result<T>) {
    match result {
        Ok(_) => {}
        Err(err) if err.is_rejection() => {
            metrics::counter!(
                "booking_rejections_total",
                "operation" => operation,
                "reason" => err.kind()
            )
            .increment(1);
            tracing::info!(operation, reason = err.kind(), error = %err, "request rejected");
        }
        Err(err) => {
            tracing::error!(operation, error = %err, "reservation operation failed");
        }
    }
}
