//! Availability and price lookups.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use inventory_store::InventoryStore;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::params::{DateRangeQuery, parse_range};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub date: String,
    pub available_spaces: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub date: String,
    /// Decimal amount, e.g. `"15.00"`.
    pub price: String,
    pub price_cents: i64,
}

fn query_params(
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<DateRangeQuery, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// GET /carpark/availability: free spaces per day.
#[tracing::instrument(skip(state, query))]
pub async fn availability<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<AvailabilityResponse>>, ApiError> {
    let q = query_params(query)?;
    let (start, end) = parse_range(q.start_date.as_deref(), q.end_date.as_deref())?;

    let days = state.queries.availability(start, end).await?;
    Ok(Json(
        days.into_iter()
            .map(|d| AvailabilityResponse {
                date: d.date.to_string(),
                available_spaces: d.available_spaces,
            })
            .collect(),
    ))
}

/// GET /carpark/prices: price per day.
#[tracing::instrument(skip(state, query))]
pub async fn prices<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<PriceResponse>>, ApiError> {
    let q = query_params(query)?;
    let (start, end) = parse_range(q.start_date.as_deref(), q.end_date.as_deref())?;

    let prices = state.queries.prices(start, end).await?;
    Ok(Json(
        prices
            .into_iter()
            .map(|p| PriceResponse {
                date: p.date.to_string(),
                price: p.price.to_string(),
                price_cents: p.price.cents(),
            })
            .collect(),
    ))
}
