use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, Cancellation, OccupiedSeat, SeatClaim, SeatStatus};
use crate::trip::Trip;
use crate::{ClaimError, StoreError};

/// Read access to the trip catalog owned by scheduling.
#[async_trait]
pub trait TripCatalog: Send + Sync {
    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError>;
}

/// Authoritative seat occupancy per trip.
#[async_trait]
pub trait SeatLedger: Send + Sync {
    /// Creates seats `1..=capacity` as free. Re-opening a trip leaves existing seats untouched.
    async fn open_trip(&self, trip_id: Uuid, capacity: u32) -> Result<(), StoreError>;

    /// Every seat that is not free, ordered by seat number.
    async fn list_occupied(&self, trip_id: Uuid) -> Result<Vec<OccupiedSeat>, StoreError>;

    /// Atomic check-and-set: either every requested seat moves to `status` or none does.
    async fn try_claim(
        &self,
        trip_id: Uuid,
        claims: &[SeatClaim],
        booking_id: Uuid,
        status: SeatStatus,
    ) -> Result<(), ClaimError>;

    /// Frees the seats. Releasing a free seat is a no-op.
    async fn release(&self, trip_id: Uuid, seat_numbers: &[u32]) -> Result<(), StoreError>;
}

/// Result of committing a cancellation.
#[derive(Debug, Clone)]
pub enum CancellationCommit {
    Cancelled(Booking),
    AlreadyCancelled(Booking),
    NotFound,
}

/// Booking persistence. Both commits are single atomic units that include the seat changes.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Claims the booking's seats and stores the booking together.
    async fn commit_booking(&self, booking: &Booking) -> Result<(), ClaimError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// Moves the booking to `Cancelled` and frees its seats, unless it is already cancelled.
    async fn commit_cancellation(
        &self,
        id: Uuid,
        cancellation: &Cancellation,
    ) -> Result<CancellationCommit, StoreError>;
}
