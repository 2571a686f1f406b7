use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use busline_booking::{BookingRequest, RefundOutcome};
use busline_core::{
    Booking, BookingIntent, BookingStatus, Consent, Passenger, PassengerInput, PaymentMethod, PetInput,
};
use busline_shared::models::events::{BookingCancelledEvent, BookingConfirmedEvent};
use busline_shared::Masked;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub trip_id: Uuid,
    pub passengers: Vec<PassengerInput>,
    pub seat_numbers: Vec<u32>,
    pub payment_method: PaymentMethod,
    pub intent: BookingIntent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub total_amount: Decimal,
    pub seats: Vec<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingResponse {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub refund_amount: Decimal,
    pub released_seats: Vec<u32>,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerResponse {
    pub seat_number: u32,
    pub name: String,
    pub surname: String,
    pub national_id: Masked<String>,
    pub age: u8,
    pub gender: busline_core::Gender,
    pub contact_phone: Masked<String>,
    pub guardian_name: Option<String>,
    pub guardian_id: Option<Masked<String>>,
    pub notarized_permission: bool,
    pub travels_with_pet: bool,
    pub pet: Option<PetInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub status: BookingStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
    pub base_fare: Decimal,
    pub seats: Vec<u32>,
    pub passengers: Vec<PassengerResponse>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<Decimal>,
    pub cancellation_reason: Option<String>,
}

impl PassengerResponse {
    fn new(seat_number: u32, p: Passenger) -> Self {
        let (guardian_name, guardian_id, notarized_permission) = match p.consent {
            Some(Consent::Guardian(g)) => (Some(g.name), Some(g.national_id), false),
            Some(Consent::NotarizedPermission) => (None, None, true),
            None => (None, None, false),
        };
        let pet = p.pet.map(|pet| PetInput {
            species: Some(pet.species),
            name: pet.name,
            weight_kg: Some(pet.weight_kg),
        });

        Self {
            seat_number,
            name: p.name,
            surname: p.surname,
            national_id: p.national_id,
            age: p.age,
            gender: p.gender,
            contact_phone: p.contact_phone,
            guardian_name,
            guardian_id,
            notarized_permission,
            travels_with_pet: pet.is_some(),
            pet,
        }
    }
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        let passengers = booking
            .seat_numbers
            .iter()
            .copied()
            .zip(booking.passengers)
            .map(|(seat, p)| PassengerResponse::new(seat, p))
            .collect();

        Self {
            booking_id: booking.id,
            trip_id: booking.trip_id,
            status: booking.status,
            payment_method: booking.payment_method,
            total_amount: booking.total_amount,
            base_fare: booking.trip.base_fare,
            seats: booking.seat_numbers,
            passengers,
            created_at: booking.created_at,
            cancelled_at: booking.cancelled_at,
            refund_amount: booking.refund_amount,
            cancellation_reason: booking.cancellation_reason,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let Json(req) = payload?;

    let booking = state
        .engine
        .submit_booking(BookingRequest {
            trip_id: req.trip_id,
            passengers: req.passengers,
            seat_numbers: req.seat_numbers,
            payment_method: req.payment_method,
            intent: req.intent,
        })
        .await?;

    if let Some(events) = &state.events {
        let event = BookingConfirmedEvent {
            booking_id: booking.id,
            trip_id: booking.trip_id,
            seat_numbers: booking.seat_numbers.clone(),
            status: booking.status.as_str().to_string(),
            total_amount: booking.total_amount,
            payment_method: booking.payment_method.as_str().to_string(),
            timestamp: Utc::now().timestamp(),
        };
        if let Err(e) = events.booking_confirmed(&event).await {
            warn!("Booking {} committed but confirmation event was not published: {}", booking.id, e);
        }
    }

    info!("Booking created: {} ({})", booking.id, booking.status.as_str());

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking_id: booking.id,
            status: booking.status,
            total_amount: booking.total_amount,
            seats: booking.seat_numbers,
        }),
    ))
}

async fn get_booking(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let Path(booking_id) = path?;
    let booking = state
        .engine
        .get_booking(booking_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("BookingNotFound", format!("Booking not found: {}", booking_id)))?;

    Ok(Json(booking.into()))
}

async fn cancel_booking(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> Result<Json<CancelBookingResponse>, AppError> {
    let Path(booking_id) = path?;
    let req = parse_cancel_body(&body)?;

    let outcome: RefundOutcome = state
        .cancellations
        .cancel(booking_id, &req.reason, Utc::now())
        .await?;

    if let Some(events) = &state.events {
        let event = BookingCancelledEvent {
            booking_id,
            trip_id: outcome.trip_id,
            released_seats: outcome.released_seats.clone(),
            refund_amount: outcome.refund_amount,
            reason: req.reason.clone(),
            timestamp: outcome.cancelled_at.timestamp(),
        };
        if let Err(e) = events.booking_cancelled(&event).await {
            warn!("Booking {} cancelled but event was not published: {}", booking_id, e);
        }
    }

    Ok(Json(CancelBookingResponse {
        booking_id,
        status: outcome.status,
        refund_amount: outcome.refund_amount,
        released_seats: outcome.released_seats,
        cancelled_at: outcome.cancelled_at,
    }))
}

/// The cancel body is optional; when present it must be a JSON object.
fn parse_cancel_body(body: &[u8]) -> Result<CancelBookingRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CancelBookingRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::ValidationError("InvalidRequest", format!("Invalid cancel body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_body_parsing() {
        assert_eq!(parse_cancel_body(b"").unwrap().reason, "");
        assert_eq!(parse_cancel_body(b" \n").unwrap().reason, "");
        assert_eq!(parse_cancel_body(br#"{"reason":"plans changed"}"#).unwrap().reason, "plans changed");
        assert_eq!(parse_cancel_body(b"{}").unwrap().reason, "");

        for bad in [&b"{not json"[..], br#"{"reason": 7}"#, br#""plans changed""#] {
            assert!(matches!(parse_cancel_body(bad), Err(AppError::ValidationError("InvalidRequest", _))));
        }
    }
}
