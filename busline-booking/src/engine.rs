use busline_core::{
    Booking, BookingIntent, BookingRepository, ClaimError, OccupiedSeat, PassengerInput, PaymentMethod,
    PolicyReason, SeatLedger, StoreError, Trip, TripCatalog, TripStatus,
};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::policy::PassengerPolicy;
use crate::pricing::PricingEngine;

/// A sale or reservation as submitted by a client.
///
/// Passengers stay in their wire shape until the request itself has been checked.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub trip_id: Uuid,
    pub passengers: Vec<PassengerInput>,
    pub seat_numbers: Vec<u32>,
    pub payment_method: PaymentMethod,
    pub intent: BookingIntent,
}

/// Seat map of one trip.
#[derive(Debug, Clone)]
pub struct SeatMap {
    pub trip_id: Uuid,
    pub capacity: u32,
    pub occupied: Vec<OccupiedSeat>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Trip not found: {0}")]
    TripNotFound(Uuid),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Trip is not open for booking (status {})", .0.as_str())]
    TripNotBookable(TripStatus),

    #[error("Passenger {passenger_index} rejected: {reason}")]
    PolicyViolation {
        passenger_index: usize,
        reason: PolicyReason,
    },

    #[error("Seat {0} is already taken")]
    SeatConflict(u32),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Orchestrates a sale end to end.
///
/// Validation is read-only; the single mutation is the repository commit, issued last,
/// so any earlier failure leaves no trace.
pub struct BookingEngine {
    catalog: Arc<dyn TripCatalog>,
    ledger: Arc<dyn SeatLedger>,
    bookings: Arc<dyn BookingRepository>,
    policy: PassengerPolicy,
    pricing: PricingEngine,
}

impl BookingEngine {
    pub fn new(
        catalog: Arc<dyn TripCatalog>,
        ledger: Arc<dyn SeatLedger>,
        bookings: Arc<dyn BookingRepository>,
        policy: PassengerPolicy,
        pricing: PricingEngine,
    ) -> Self {
        Self { catalog, ledger, bookings, policy, pricing }
    }

    pub async fn submit_booking(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        // The trip read here is the snapshot used for every later check and for pricing.
        let trip = self
            .catalog
            .get_trip(request.trip_id)
            .await?
            .ok_or(BookingError::TripNotFound(request.trip_id))?;

        validate_shape(&request, &trip)?;

        if !trip.is_bookable() {
            return Err(BookingError::TripNotBookable(trip.status));
        }

        let mut passengers = Vec::with_capacity(request.passengers.len());
        for (passenger_index, input) in request.passengers.into_iter().enumerate() {
            let passenger = self
                .policy
                .admit(input, &trip)
                .map_err(|reason| BookingError::PolicyViolation { passenger_index, reason })?;
            passengers.push(passenger);
        }

        let snapshot = trip.snapshot();
        let quote = self.pricing.quote(&snapshot, &passengers);

        let booking = Booking {
            id: Uuid::new_v4(),
            trip_id: trip.id,
            seat_numbers: request.seat_numbers,
            passengers,
            total_amount: quote.total,
            payment_method: request.payment_method,
            status: request.intent.status(),
            trip: snapshot,
            created_at: Utc::now(),
            cancelled_at: None,
            refund_amount: None,
            cancellation_reason: None,
        };

        // Free seat rows are materialised on first sale; this never touches occupancy.
        self.ledger.open_trip(trip.id, trip.capacity()).await?;

        match self.bookings.commit_booking(&booking).await {
            Ok(()) => {
                info!(
                    "Booking committed: {} trip {} seats {:?} total {} ({})",
                    booking.id,
                    booking.trip_id,
                    booking.seat_numbers,
                    booking.total_amount,
                    booking.status.as_str()
                );
                Ok(booking)
            }
            Err(ClaimError::SeatConflict(seat)) => {
                warn!("Seat conflict on trip {} seat {}", booking.trip_id, seat);
                Err(BookingError::SeatConflict(seat))
            }
            Err(ClaimError::UnknownSeat(seat)) => Err(BookingError::InvalidRequest(format!(
                "seat {} does not exist on trip {}",
                seat, booking.trip_id
            ))),
            Err(ClaimError::Store(e)) => Err(BookingError::Storage(e)),
        }
    }

    pub async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        self.bookings.get_booking(id).await
    }

    pub async fn seat_map(&self, trip_id: Uuid) -> Result<SeatMap, BookingError> {
        let trip = self
            .catalog
            .get_trip(trip_id)
            .await?
            .ok_or(BookingError::TripNotFound(trip_id))?;
        let occupied = self.ledger.list_occupied(trip_id).await?;
        Ok(SeatMap { trip_id, capacity: trip.capacity(), occupied })
    }
}

fn validate_shape(request: &BookingRequest, trip: &Trip) -> Result<(), BookingError> {
    if request.seat_numbers.is_empty() {
        return Err(BookingError::InvalidRequest("at least one seat is required".to_string()));
    }
    if request.seat_numbers.len() != request.passengers.len() {
        return Err(BookingError::InvalidRequest(format!(
            "{} seats for {} passengers",
            request.seat_numbers.len(),
            request.passengers.len()
        )));
    }

    let capacity = trip.capacity();
    let mut seen = HashSet::new();
    for seat in &request.seat_numbers {
        if *seat < 1 || *seat > capacity {
            return Err(BookingError::InvalidRequest(format!(
                "seat {} is outside 1..={}",
                seat, capacity
            )));
        }
        if !seen.insert(*seat) {
            return Err(BookingError::InvalidRequest(format!("seat {} requested twice", seat)));
        }
    }
    Ok(())
}
