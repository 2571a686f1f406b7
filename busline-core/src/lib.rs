pub mod booking;
pub mod passenger;
pub mod repository;
pub mod rules;
pub mod trip;

pub use booking::{
    to_cents, Booking, BookingIntent, BookingStatus, Cancellation, OccupiedSeat, PaymentMethod,
    SeatClaim, SeatStatus,
};
pub use passenger::{Consent, Gender, Guardian, Passenger, PassengerInput, Pet, PetInput, PolicyReason};
pub use repository::{BookingRepository, CancellationCommit, SeatLedger, TripCatalog};
pub use rules::{CancellationPolicy, PassengerRules, PricingRules, RefundTier};
pub use trip::{BusRef, RouteRef, Trip, TripSnapshot, TripStatus};

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Stored data is invalid: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClaimError {
    #[error("Seat {0} is already taken")]
    SeatConflict(u32),
    #[error("Seat {0} does not exist on this trip")]
    UnknownSeat(u32),
    #[error(transparent)]
    Store(#[from] StoreError),
}
