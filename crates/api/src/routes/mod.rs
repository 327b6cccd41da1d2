//! HTTP route handlers.

pub mod bookings;
pub mod inventory;
pub mod ops;
pub mod params;
