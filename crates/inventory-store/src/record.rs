//! Persisted records: bookings, per-day inventory and per-day rates.

use chrono::{DateTime, NaiveDate, Utc};
use common::{BookingId, DateRange, Money};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Lifecycle state of a booking. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Column value used by the SQL store.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(StoreError::Corrupt(format!("unknown booking status '{other}'"))),
        }
    }
}

/// A reservation of one space for every day of `range`.
///
/// Bookings are never deleted; cancelling only flips the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub range: DateRange,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// A new confirmed booking with a fresh ID.
    pub fn confirmed(range: DateRange) -> Self {
        let now = Utc::now();
        Self {
            id: BookingId::new(),
            range,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    pub fn cancel(&mut self) {
        self.status = BookingStatus::Cancelled;
        self.updated_at = Utc::now();
    }

    pub fn reschedule(&mut self, range: DateRange) {
        self.range = range;
        self.updated_at = Utc::now();
    }
}

/// Capacity and occupancy for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayInventory {
    pub date: NaiveDate,
    pub total_spaces: i32,
    pub reserved_spaces: i32,
}

impl DayInventory {
    /// A day with nothing reserved yet.
    pub fn empty(date: NaiveDate, total_spaces: i32) -> Self {
        Self {
            date,
            total_spaces,
            reserved_spaces: 0,
        }
    }

    pub fn available_spaces(&self) -> i32 {
        self.total_spaces - self.reserved_spaces
    }

    pub fn is_full(&self) -> bool {
        self.reserved_spaces >= self.total_spaces
    }
}

/// Price of parking for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRate {
    pub date: NaiveDate,
    pub price: Money,
}

/// Rows inserted by a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inventory_inserted: u64,
    pub rates_inserted: u64,
}
