//! Pure planning of reserved-count changes.
//!
//! Planners look at the locked inventory rows and decide which days gain a
//! reservation and which lose one. They never touch storage; the engine
//! applies the resulting [`InventoryPlan`] inside the same unit of work.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use common::DateRange;
use inventory_store::{Booking, DayInventory, InventoryTx, StoreError};

use crate::error::{ReservationError, Result};

/// Per-day reserved-count changes for one operation.
///
/// `increment` and `decrement` never share a day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryPlan {
    pub increment: Vec<NaiveDate>,
    pub decrement: Vec<NaiveDate>,
}

impl InventoryPlan {
    pub fn is_empty(&self) -> bool {
        self.increment.is_empty() && self.decrement.is_empty()
    }

    /// Writes the plan through an open unit of work.
    pub async fn apply<T: InventoryTx>(&self, tx: &mut T) -> std::result::Result<(), StoreError> {
        tx.adjust_reserved(&self.decrement, -1).await?;
        tx.adjust_reserved(&self.increment, 1).await?;
        Ok(())
    }
}

/// Days among `wanted` that cannot take one more reservation.
///
/// A day without an inventory row is outside the stocked horizon and counts
/// as full.
fn unavailable_days(
    wanted: impl IntoIterator<Item = NaiveDate>,
    inventory: &[DayInventory],
) -> Vec<NaiveDate> {
    let by_date: BTreeMap<NaiveDate, &DayInventory> =
        inventory.iter().map(|day| (day.date, day)).collect();

    wanted
        .into_iter()
        .filter(|date| by_date.get(date).is_none_or(|day| day.is_full()))
        .collect()
}

/// Plans a new booking over `range`: every day gains one reservation.
pub fn plan_booking(range: DateRange, inventory: &[DayInventory]) -> Result<InventoryPlan> {
    let full = unavailable_days(range.days(), inventory);
    if !full.is_empty() {
        return Err(ReservationError::CapacityExceeded { dates: full });
    }

    Ok(InventoryPlan {
        increment: range.days().collect(),
        decrement: Vec::new(),
    })
}

/// Plans a cancellation: every day of the booking loses one reservation.
pub fn plan_cancellation(booking: &Booking) -> InventoryPlan {
    InventoryPlan {
        increment: Vec::new(),
        decrement: booking.range.days().collect(),
    }
}

/// Plans moving `booking` to `new_range`.
///
/// Only days the booking doesn't already hold need spare capacity. Days in
/// both ranges keep their reservation and are not written at all.
pub fn plan_amendment(
    booking: &Booking,
    new_range: DateRange,
    inventory: &[DayInventory],
) -> Result<InventoryPlan> {
    let added = new_range.difference(&booking.range);
    let removed = booking.range.difference(&new_range);

    let full = unavailable_days(added.iter().copied(), inventory);
    if !full.is_empty() {
        return Err(ReservationError::CapacityExceeded { dates: full });
    }

    Ok(InventoryPlan {
        increment: added,
        decrement: removed,
    })
}
