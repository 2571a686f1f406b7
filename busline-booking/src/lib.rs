pub mod cancellation;
pub mod engine;
pub mod memory;
pub mod policy;
pub mod pricing;

#[cfg(test)]
mod testing;

pub use cancellation::{CancelError, CancellationService, RefundOutcome};
pub use engine::{BookingEngine, BookingError, BookingRequest, SeatMap};
pub use memory::{MemoryBookingStore, MemorySeatLedger, MemoryTripCatalog};
pub use policy::PassengerPolicy;
pub use pricing::{PricingEngine, Quote};
