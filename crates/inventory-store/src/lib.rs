//! Persistence for bookings and per-day car park inventory.
//!
//! Two implementations share the [`InventoryStore`] trait: an in-memory
//! store for tests and single-process runs, and a PostgreSQL store.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{BookingId, DateRange, Money};
pub use error::{Result, StoreError};
pub use memory::{InMemoryInventoryStore, InMemoryTx};
pub use postgres::{PostgresInventoryStore, PostgresTx};
pub use record::{Booking, BookingStatus, DayInventory, DayRate, SeedReport};
pub use store::{InventoryStore, InventoryTx};
