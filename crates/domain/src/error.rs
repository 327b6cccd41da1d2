//! Domain error types.

use chrono::NaiveDate;
use common::BookingId;
use inventory_store::StoreError;
use thiserror::Error;

/// Errors that can occur during reservation operations.
///
/// The first three variants are expected rejections the caller can act on.
/// `Store` is an unexpected failure of the underlying storage.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// The requested dates are malformed or outside the bookable horizon.
    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    /// No confirmed booking with this ID exists.
    #[error("Could not find an open booking with the id: {0}")]
    NotFound(BookingId),

    /// At least one required day has no spaces left.
    #[error(
        "One or more days in the selected range has no spaces available to book: {}",
        format_dates(dates)
    )]
    CapacityExceeded { dates: Vec<NaiveDate> },

    /// An error occurred in the inventory store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ReservationError {
    /// Returns true for the expected, caller-recoverable kinds.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ReservationError::Store(_))
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ReservationError::InvalidRange(_) => "invalid_range",
            ReservationError::NotFound(_) => "not_found",
            ReservationError::CapacityExceeded { .. } => "capacity_exceeded",
            ReservationError::Store(_) => "store",
        }
    }
}

fn format_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(NaiveDate::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type alias for reservation results.
pub type Result<T> = std::result::Result<T, ReservationError>;
