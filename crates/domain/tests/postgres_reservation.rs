//! Reservation engine against PostgreSQL, with concurrent callers.
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p domain --test postgres_reservation -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use common::{DateRange, Money};
use domain::{FixedClock, RangePolicy, ReservationEngine, ReservationError};
use inventory_store::{InventoryStore, PostgresInventoryStore};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

const TOTAL: i32 = 10;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresInventoryStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2027, 3, 1).unwrap()
}

fn day(offset: u64) -> NaiveDate {
    today() + chrono::Days::new(offset)
}

/// Engine over a freshly truncated store with ten days of `TOTAL` spaces.
async fn get_test_engine() -> Arc<ReservationEngine<PostgresInventoryStore>> {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE bookings, day_inventory, day_rates")
        .execute(&pool)
        .await
        .unwrap();

    let store = PostgresInventoryStore::new(pool);
    store
        .seed_days(
            DateRange::new(day(0), day(9)).unwrap(),
            TOTAL,
            Money::from_cents(1500),
        )
        .await
        .unwrap();

    Arc::new(ReservationEngine::new(
        store,
        RangePolicy::default(),
        Arc::new(FixedClock(today())),
    ))
}

async fn reserved(engine: &ReservationEngine<PostgresInventoryStore>, date: NaiveDate) -> i32 {
    engine
        .store()
        .inventory(DateRange::single(date))
        .await
        .unwrap()[0]
        .reserved_spaces
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_fill_capacity_exactly() {
    let engine = get_test_engine().await;

    let mut handles = Vec::new();
    for _ in 0..(TOTAL * 2) {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.create_booking(day(2), day(4)).await
        }));
    }

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(ReservationError::CapacityExceeded { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(accepted, TOTAL);
    assert_eq!(rejected, TOTAL);
    for offset in 2..=4 {
        assert_eq!(reserved(&engine, day(offset)).await, TOTAL);
    }
    assert_eq!(reserved(&engine, day(1)).await, 0);
    assert_eq!(reserved(&engine, day(5)).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancels_release_once() {
    let engine = get_test_engine().await;
    let id = engine.create_booking(day(1), day(3)).await.unwrap();

    let first = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.cancel_booking(id).await })
    };
    let second = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.cancel_booking(id).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let not_found = results
        .iter()
        .filter(|r| matches!(r, Err(ReservationError::NotFound(found)) if *found == id))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(not_found, 1);
    for offset in 1..=3 {
        assert_eq!(reserved(&engine, day(offset)).await, 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn amend_and_create_race_for_last_space() {
    let engine = get_test_engine().await;

    // Day 6 has a single space left; one booking amends into it while
    // another tries to book it outright.
    let movable = engine.create_booking(day(5), day(5)).await.unwrap();
    for _ in 0..(TOTAL - 1) {
        engine.create_booking(day(6), day(6)).await.unwrap();
    }

    let amend = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.amend_booking(movable, day(5), day(6)).await })
    };
    let create = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.create_booking(day(6), day(6)).await.map(|_| movable) })
    };

    let results = [amend.await.unwrap(), create.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(ReservationError::CapacityExceeded { dates }) if dates == &vec![day(6)]
    )));
    assert_eq!(reserved(&engine, day(6)).await, TOTAL);
    assert_eq!(reserved(&engine, day(5)).await, 1);
}
