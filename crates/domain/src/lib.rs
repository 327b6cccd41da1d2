//! Domain layer for the car park reservation system.
//!
//! This crate provides:
//! - `ReservationEngine` for creating, cancelling and amending bookings
//! - `QueryService` for availability and price lookups
//! - `RangePolicy` for validating requested date ranges
//! - `HorizonMaintainer` for keeping per-day rows stocked ahead of time

pub mod engine;
pub mod error;
pub mod horizon;
pub mod plan;
pub mod query;
pub mod validation;

pub use engine::ReservationEngine;
pub use error::{ReservationError, Result};
pub use horizon::{DayDefaults, HorizonMaintainer};
pub use plan::InventoryPlan;
pub use query::{DayAvailability, DayPrice, QueryService};
pub use validation::{Clock, FixedClock, RangePolicy, SystemClock};
