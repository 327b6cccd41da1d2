//! Booking create, cancel, amend and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::ReservationError;
use inventory_store::{Booking, InventoryStore};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::params::{parse_booking_id, parse_range};

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendBookingRequest {
    pub id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct BookingIdResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            start_date: booking.range.start().to_string(),
            end_date: booking.range.end().to_string(),
            status: booking.status.as_str().to_string(),
            created_at: booking.created_at.to_rfc3339(),
            updated_at: booking.updated_at.to_rfc3339(),
        }
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(req)| req)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

// -- Handlers --

/// POST /carpark/booking: reserve one space for every day of the range.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingIdResponse>), ApiError> {
    let req = json_body(body)?;
    let (start, end) = parse_range(req.start_date.as_deref(), req.end_date.as_deref())?;

    let id = state.engine.create_booking(start, end).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingIdResponse { id: id.to_string() }),
    ))
}

/// POST /carpark/booking/cancel/:id: release a confirmed booking.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BookingIdResponse>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let id = state.engine.cancel_booking(booking_id).await?;
    Ok(Json(BookingIdResponse { id: id.to_string() }))
}

/// POST /carpark/booking/edit: move a confirmed booking to new dates.
#[tracing::instrument(skip(state, body))]
pub async fn amend<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<AmendBookingRequest>, JsonRejection>,
) -> Result<Json<BookingIdResponse>, ApiError> {
    let req = json_body(body)?;
    let raw_id = req
        .id
        .ok_or_else(|| ApiError::BadRequest("id was not supplied".to_string()))?;
    let booking_id = parse_booking_id(&raw_id)?;
    let (start, end) = parse_range(req.start_date.as_deref(), req.end_date.as_deref())?;

    let id = state.engine.amend_booking(booking_id, start, end).await?;
    Ok(Json(BookingIdResponse { id: id.to_string() }))
}

/// GET /carpark/booking/:id: load a booking in any status.
#[tracing::instrument(skip(state))]
pub async fn get<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state.engine.booking(booking_id).await.map_err(|e| match e {
        ReservationError::NotFound(_) => ApiError::NotFound(format!("Booking {id} not found")),
        other => ApiError::from(other),
    })?;

    Ok(Json(BookingResponse::from(booking)))
}
