//! HTTP API server for the car park reservation system.
//!
//! Provides REST endpoints for availability, prices and bookings, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod tasks;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::Money;
use domain::{
    Clock, DayDefaults, HorizonMaintainer, QueryService, RangePolicy, ReservationEngine,
    SystemClock,
};
use inventory_store::InventoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: InventoryStore> {
    pub engine: ReservationEngine<S>,
    pub queries: QueryService<S>,
    pub horizon: HorizonMaintainer<S>,
    /// Source of today's date shared by every component above.
    pub clock: Arc<dyn Clock>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: InventoryStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health::<S>))
        .route(
            "/carpark/availability",
            get(routes::inventory::availability::<S>),
        )
        .route("/carpark/prices", get(routes::inventory::prices::<S>))
        .route("/carpark/booking", post(routes::bookings::create::<S>))
        .route(
            "/carpark/booking/cancel/{id}",
            post(routes::bookings::cancel::<S>),
        )
        .route("/carpark/booking/edit", post(routes::bookings::amend::<S>))
        .route("/carpark/booking/{id}", get(routes::bookings::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state on top of `store`, reading today's date
/// from the system clock.
pub fn create_state<S: InventoryStore + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    create_state_with_clock(store, config, Arc::new(SystemClock))
}

/// Like [`create_state`], with an explicit clock.
pub fn create_state_with_clock<S: InventoryStore + 'static>(
    store: S,
    config: &Config,
    clock: Arc<dyn Clock>,
) -> Arc<AppState<S>> {
    let policy = RangePolicy::new(config.horizon_months);
    let defaults = DayDefaults {
        total_spaces: config.daily_spaces,
        price: Money::from_cents(config.daily_price_cents),
    };

    Arc::new(AppState {
        engine: ReservationEngine::new(store.clone(), policy, clock.clone()),
        queries: QueryService::new(store.clone(), policy, clock.clone()),
        horizon: HorizonMaintainer::new(store, policy, defaults, clock.clone()),
        clock,
    })
}
