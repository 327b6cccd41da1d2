//! Date range validation against the bookable horizon.

use chrono::{Months, NaiveDate, Utc};
use common::DateRange;

use crate::error::{ReservationError, Result};

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The current UTC date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Rules a requested range must satisfy before anything is reserved or priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePolicy {
    /// How far ahead of today bookings are accepted.
    pub horizon_months: u32,
}

impl Default for RangePolicy {
    fn default() -> Self {
        Self { horizon_months: 24 }
    }
}

impl RangePolicy {
    pub fn new(horizon_months: u32) -> Self {
        Self { horizon_months }
    }

    /// Latest date a range may end on. Month arithmetic clamps to the end of
    /// the month, so a Feb 29 today yields Feb 28 two years on.
    pub fn latest_end(&self, today: NaiveDate) -> Option<NaiveDate> {
        today.checked_add_months(Months::new(self.horizon_months))
    }

    /// The whole bookable horizon starting today.
    pub fn horizon(&self, today: NaiveDate) -> Option<DateRange> {
        self.latest_end(today)
            .and_then(|end| DateRange::new(today, end))
    }

    /// Checks a requested range.
    ///
    /// Rejects a range that ends before it starts, starts before `today`,
    /// or ends after the horizon.
    pub fn validate(&self, start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<DateRange> {
        let range = DateRange::new(start, end).ok_or_else(|| {
            ReservationError::InvalidRange(format!("end date {end} is before start date {start}"))
        })?;

        if start < today {
            return Err(ReservationError::InvalidRange(format!(
                "start date {start} is in the past"
            )));
        }

        let latest = self.latest_end(today).ok_or_else(|| {
            ReservationError::InvalidRange("booking horizon is out of range".to_string())
        })?;
        if end > latest {
            return Err(ReservationError::InvalidRange(format!(
                "end date {end} is beyond the booking horizon {latest}"
            )));
        }

        Ok(range)
    }
}
