use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur when interacting with the inventory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No inventory row exists for a day that was asked to change.
    #[error("No inventory row for {0}")]
    MissingDay(NaiveDate),

    /// Adjusting a day would push its reserved count outside `0..=total`.
    #[error("Reserved count for {date} would be {reserved}, allowed range is 0..={total}")]
    ReservedOutOfBounds {
        date: NaiveDate,
        reserved: i32,
        total: i32,
    },

    /// A booking was inserted twice or updated without existing.
    #[error("Booking record conflict: {0}")]
    BookingConflict(String),

    /// A stored row could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for inventory store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
