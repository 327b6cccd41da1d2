use async_trait::async_trait;
use chrono::NaiveDate;
use common::{BookingId, DateRange, Money};

use crate::{Booking, DayInventory, DayRate, Result, SeedReport};

/// Core trait for inventory store implementations.
///
/// The store owns three collections: bookings, per-day inventory and
/// per-day rates. Reads outside a transaction see a consistent snapshot;
/// all mutations of bookings and reserved counts go through an
/// [`InventoryTx`].
#[async_trait]
pub trait InventoryStore: Send + Sync + Clone {
    /// Unit of work type returned by [`InventoryStore::begin`].
    type Tx: InventoryTx;

    /// Opens a unit of work.
    ///
    /// Until the unit is committed or dropped, no other unit can change the
    /// inventory rows it has locked. Dropping without commit discards every
    /// change made through it.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Returns inventory rows for the days of `range` that exist, ordered by date.
    async fn inventory(&self, range: DateRange) -> Result<Vec<DayInventory>>;

    /// Returns rate rows for the days of `range` that exist, ordered by date.
    async fn rates(&self, range: DateRange) -> Result<Vec<DayRate>>;

    /// Loads a booking regardless of its status.
    async fn booking(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Inserts inventory and rate rows for every day of `range` that has none.
    ///
    /// Existing rows are left untouched, so repeated runs are harmless.
    async fn seed_days(
        &self,
        range: DateRange,
        total_spaces: i32,
        price: Money,
    ) -> Result<SeedReport>;
}

/// An open, atomic unit of work against an [`InventoryStore`].
#[async_trait]
pub trait InventoryTx: Send {
    /// Fetches the inventory rows of `range`, ordered by date, and locks them
    /// for the rest of the unit.
    ///
    /// Days without a row are simply absent from the result.
    async fn lock_inventory(&mut self, range: DateRange) -> Result<Vec<DayInventory>>;

    /// Finds a booking that is still confirmed.
    async fn find_confirmed_booking(&mut self, id: BookingId) -> Result<Option<Booking>>;

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()>;

    async fn update_booking(&mut self, booking: &Booking) -> Result<()>;

    /// Adds `delta` to the reserved count of each day.
    ///
    /// Fails with `MissingDay` if a day has no row and with
    /// `ReservedOutOfBounds` if a count would leave `0..=total`.
    async fn adjust_reserved(&mut self, days: &[NaiveDate], delta: i32) -> Result<()>;

    /// Makes every change of this unit visible at once.
    async fn commit(self) -> Result<()>;
}
