//! Shared value types for the car park reservation system.

pub mod money;
pub mod range;
pub mod types;

pub use money::Money;
pub use range::DateRange;
pub use types::BookingId;
