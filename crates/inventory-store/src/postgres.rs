use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{BookingId, DateRange, Money};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Booking, BookingStatus, DayInventory, DayRate, Result, SeedReport, StoreError,
    store::{InventoryStore, InventoryTx},
};

/// PostgreSQL-backed inventory store implementation.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new PostgreSQL inventory store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn row_to_booking(row: PgRow) -> Result<Booking> {
    let start: NaiveDate = row.try_get("start_date")?;
    let end: NaiveDate = row.try_get("end_date")?;
    let range = DateRange::new(start, end)
        .ok_or_else(|| StoreError::Corrupt(format!("booking ends {end} before it starts {start}")))?;
    let status: String = row.try_get("status")?;

    Ok(Booking {
        id: BookingId::from_uuid(row.try_get::<Uuid, _>("id")?),
        range,
        status: status.parse()?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn row_to_inventory(row: PgRow) -> Result<DayInventory> {
    Ok(DayInventory {
        date: row.try_get("date")?,
        total_spaces: row.try_get("total_spaces")?,
        reserved_spaces: row.try_get("reserved_spaces")?,
    })
}

fn row_to_rate(row: PgRow) -> Result<DayRate> {
    Ok(DayRate {
        date: row.try_get("date")?,
        price: Money::from_cents(row.try_get("price_cents")?),
    })
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTx { tx })
    }

    async fn inventory(&self, range: DateRange) -> Result<Vec<DayInventory>> {
        let rows = sqlx::query(
            r#"
            SELECT date, total_spaces, reserved_spaces
            FROM day_inventory
            WHERE date BETWEEN $1 AND $2
            ORDER BY date ASC
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_inventory).collect()
    }

    async fn rates(&self, range: DateRange) -> Result<Vec<DayRate>> {
        let rows = sqlx::query(
            r#"
            SELECT date, price_cents
            FROM day_rates
            WHERE date BETWEEN $1 AND $2
            ORDER BY date ASC
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_rate).collect()
    }

    async fn booking(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(
            r#"
            SELECT id, start_date, end_date, status, created_at, updated_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_booking).transpose()
    }

    async fn seed_days(
        &self,
        range: DateRange,
        total_spaces: i32,
        price: Money,
    ) -> Result<SeedReport> {
        let mut tx = self.pool.begin().await?;

        let inventory = sqlx::query(
            r#"
            INSERT INTO day_inventory (date, total_spaces, reserved_spaces)
            SELECT day::date, $3, 0
            FROM generate_series($1::date, $2::date, INTERVAL '1 day') AS day
            ON CONFLICT (date) DO NOTHING
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .bind(total_spaces)
        .execute(&mut *tx)
        .await?;

        let rates = sqlx::query(
            r#"
            INSERT INTO day_rates (date, price_cents)
            SELECT day::date, $3
            FROM generate_series($1::date, $2::date, INTERVAL '1 day') AS day
            ON CONFLICT (date) DO NOTHING
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .bind(price.cents())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SeedReport {
            inventory_inserted: inventory.rows_affected(),
            rates_inserted: rates.rows_affected(),
        })
    }
}

/// Unit of work over [`PostgresInventoryStore`], backed by one SQL transaction.
///
/// Dropping it without commit rolls the transaction back.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl InventoryTx for PostgresTx {
    async fn lock_inventory(&mut self, range: DateRange) -> Result<Vec<DayInventory>> {
        // Rows are locked in date order so concurrent units can't deadlock.
        let rows = sqlx::query(
            r#"
            SELECT date, total_spaces, reserved_spaces
            FROM day_inventory
            WHERE date BETWEEN $1 AND $2
            ORDER BY date ASC
            FOR UPDATE
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_inventory).collect()
    }

    async fn find_confirmed_booking(&mut self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(
            r#"
            SELECT id, start_date, end_date, status, created_at, updated_at
            FROM bookings
            WHERE id = $1 AND status = $2
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .bind(BookingStatus::Confirmed.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_booking).transpose()
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, start_date, end_date, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.range.start())
        .bind(booking.range.end())
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::BookingConflict(format!(
                    "booking {} already exists",
                    booking.id
                ));
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn update_booking(&mut self, booking: &Booking) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET start_date = $2, end_date = $3, status = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.range.start())
        .bind(booking.range.end())
        .bind(booking.status.as_str())
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::BookingConflict(format!(
                "booking {} does not exist",
                booking.id
            )));
        }
        Ok(())
    }

    async fn adjust_reserved(&mut self, days: &[NaiveDate], delta: i32) -> Result<()> {
        if days.is_empty() {
            return Ok(());
        }

        let updated: Vec<NaiveDate> = sqlx::query_scalar(
            r#"
            UPDATE day_inventory
            SET reserved_spaces = reserved_spaces + $1
            WHERE date = ANY($2)
              AND reserved_spaces + $1 BETWEEN 0 AND total_spaces
            RETURNING date
            "#,
        )
        .bind(delta)
        .bind(days.to_vec())
        .fetch_all(&mut *self.tx)
        .await?;

        if updated.len() == days.len() {
            return Ok(());
        }

        // Report the first day that was skipped. The caller drops the
        // transaction, which undoes the rows that did change.
        let Some(&date) = days.iter().find(|day| !updated.contains(day)) else {
            return Ok(());
        };
        let row = sqlx::query(
            "SELECT date, total_spaces, reserved_spaces FROM day_inventory WHERE date = $1",
        )
        .bind(date)
        .fetch_optional(&mut *self.tx)
        .await?;

        match row.map(row_to_inventory).transpose()? {
            Some(day) => Err(StoreError::ReservedOutOfBounds {
                date,
                reserved: day.reserved_spaces + delta,
                total: day.total_spaces,
            }),
            None => Err(StoreError::MissingDay(date)),
        }
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
