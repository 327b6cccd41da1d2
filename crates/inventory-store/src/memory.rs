use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{BookingId, DateRange, Money};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Booking, DayInventory, DayRate, Result, SeedReport, StoreError,
    store::{InventoryStore, InventoryTx},
};

#[derive(Debug, Default)]
struct State {
    bookings: HashMap<BookingId, Booking>,
    inventory: BTreeMap<NaiveDate, DayInventory>,
    rates: BTreeMap<NaiveDate, DayRate>,
}

/// In-memory inventory store.
///
/// Provides the same interface as the PostgreSQL implementation. A unit of
/// work holds the write lock for its whole lifetime, so units are fully
/// serialized and readers never see a half-applied change.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bookings stored, in any status.
    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }

    /// Overwrites a day's reserved count without touching bookings.
    ///
    /// Meant for fixtures that need a day to look full.
    pub async fn set_reserved(&self, date: NaiveDate, reserved: i32) -> Result<()> {
        let mut state = self.state.write().await;
        let day = state
            .inventory
            .get_mut(&date)
            .ok_or(StoreError::MissingDay(date))?;
        day.reserved_spaces = reserved;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx> {
        let state = self.state.clone().write_owned().await;
        Ok(InMemoryTx {
            state,
            bookings: HashMap::new(),
            reserved: BTreeMap::new(),
        })
    }

    async fn inventory(&self, range: DateRange) -> Result<Vec<DayInventory>> {
        let state = self.state.read().await;
        Ok(state
            .inventory
            .range(range.start()..=range.end())
            .map(|(_, day)| *day)
            .collect())
    }

    async fn rates(&self, range: DateRange) -> Result<Vec<DayRate>> {
        let state = self.state.read().await;
        Ok(state
            .rates
            .range(range.start()..=range.end())
            .map(|(_, rate)| *rate)
            .collect())
    }

    async fn booking(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn seed_days(
        &self,
        range: DateRange,
        total_spaces: i32,
        price: Money,
    ) -> Result<SeedReport> {
        let mut state = self.state.write().await;
        let mut report = SeedReport::default();

        for date in range.days() {
            if !state.inventory.contains_key(&date) {
                state
                    .inventory
                    .insert(date, DayInventory::empty(date, total_spaces));
                report.inventory_inserted += 1;
            }
            if !state.rates.contains_key(&date) {
                state.rates.insert(date, DayRate { date, price });
                report.rates_inserted += 1;
            }
        }

        Ok(report)
    }
}

/// Unit of work over [`InMemoryInventoryStore`].
///
/// Changes are staged next to the locked state and only written into it by
/// [`InventoryTx::commit`].
pub struct InMemoryTx {
    state: OwnedRwLockWriteGuard<State>,
    bookings: HashMap<BookingId, Booking>,
    /// Staged absolute reserved counts.
    reserved: BTreeMap<NaiveDate, i32>,
}

impl InMemoryTx {
    fn current_booking(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.get(&id).or_else(|| self.state.bookings.get(&id))
    }

    fn current_day(&self, date: NaiveDate) -> Option<DayInventory> {
        self.state.inventory.get(&date).map(|day| DayInventory {
            reserved_spaces: self
                .reserved
                .get(&date)
                .copied()
                .unwrap_or(day.reserved_spaces),
            ..*day
        })
    }
}

#[async_trait]
impl InventoryTx for InMemoryTx {
    async fn lock_inventory(&mut self, range: DateRange) -> Result<Vec<DayInventory>> {
        Ok(range.days().filter_map(|date| self.current_day(date)).collect())
    }

    async fn find_confirmed_booking(&mut self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self
            .current_booking(id)
            .filter(|booking| booking.is_confirmed())
            .cloned())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        if self.current_booking(booking.id).is_some() {
            return Err(StoreError::BookingConflict(format!(
                "booking {} already exists",
                booking.id
            )));
        }
        self.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn update_booking(&mut self, booking: &Booking) -> Result<()> {
        if self.current_booking(booking.id).is_none() {
            return Err(StoreError::BookingConflict(format!(
                "booking {} does not exist",
                booking.id
            )));
        }
        self.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn adjust_reserved(&mut self, days: &[NaiveDate], delta: i32) -> Result<()> {
        // Validate every day before staging anything.
        let mut updates = Vec::with_capacity(days.len());
        for &date in days {
            let day = self.current_day(date).ok_or(StoreError::MissingDay(date))?;
            let reserved = day.reserved_spaces + delta;
            if reserved < 0 || reserved > day.total_spaces {
                return Err(StoreError::ReservedOutOfBounds {
                    date,
                    reserved,
                    total: day.total_spaces,
                });
            }
            updates.push((date, reserved));
        }

        self.reserved.extend(updates);
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTx {
            mut state,
            bookings,
            reserved,
        } = self;

        for (date, count) in reserved {
            if let Some(day) = state.inventory.get_mut(&date) {
                day.reserved_spaces = count;
            }
        }
        state.bookings.extend(bookings);

        Ok(())
    }
}
