//! Parsing of dates and IDs supplied by clients.

use chrono::NaiveDate;
use common::BookingId;
use serde::Deserialize;

use crate::error::ApiError;

/// The only accepted date layout.
pub const DATE_FORMAT: &str = "yyyy-MM-dd";

/// `?startDate=…&endDate=…` query string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Parses a `yyyy-MM-dd` date, rejecting every other layout.
///
/// `field` names the parameter in the error message.
pub fn parse_date(field: &str, value: Option<&str>) -> Result<NaiveDate, ApiError> {
    let invalid = || ApiError::BadRequest(format!("{field} was not supplied in {DATE_FORMAT} format"));

    let value = value.ok_or_else(invalid)?;
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

/// Parses both ends of a range from raw client values.
pub fn parse_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(NaiveDate, NaiveDate), ApiError> {
    Ok((parse_date("startDate", start)?, parse_date("endDate", end)?))
}

/// Parses a booking ID. The all-zero UUID counts as no ID at all.
pub fn parse_booking_id(id: &str) -> Result<BookingId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid booking id: {e}")))?;
    let id = BookingId::from_uuid(uuid);
    if id.is_nil() {
        return Err(ApiError::BadRequest("id was not supplied".to_string()));
    }
    Ok(id)
}
