use busline_core::{
    to_cents, BookingRepository, BookingStatus, Cancellation, CancellationCommit,
    CancellationPolicy, RefundTier, StoreError, TripCatalog,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub status: BookingStatus,
    pub refund_amount: Decimal,
    pub tier: Option<RefundTier>,
    pub released_seats: Vec<u32>,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CancelError {
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(Uuid),

    #[error("Trip departed at {0}")]
    DepartureInPast(DateTime<Utc>),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Cancels bookings and works out what is owed back.
pub struct CancellationService {
    catalog: Arc<dyn TripCatalog>,
    bookings: Arc<dyn BookingRepository>,
    policy: CancellationPolicy,
}

impl CancellationService {
    pub fn new(
        catalog: Arc<dyn TripCatalog>,
        bookings: Arc<dyn BookingRepository>,
        policy: CancellationPolicy,
    ) -> Self {
        Self { catalog, bookings, policy: policy.normalized() }
    }

    /// First tier whose threshold is met, scanning from most generous; the last tier otherwise.
    pub fn select_tier(&self, remaining: Duration) -> Option<&RefundTier> {
        self.policy
            .tiers
            .iter()
            .find(|tier| remaining >= Duration::hours(i64::from(tier.hours_before_departure)))
            .or_else(|| self.policy.tiers.last())
    }

    pub async fn cancel(
        &self,
        booking_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<RefundOutcome, CancelError> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or(CancelError::BookingNotFound(booking_id))?;

        if booking.is_cancelled() {
            return Err(CancelError::AlreadyCancelled(booking_id));
        }

        // Departure can be rescheduled after the sale; the catalog wins when it still lists the trip.
        let departure_at = match self.catalog.get_trip(booking.trip_id).await? {
            Some(trip) => trip.departure_at,
            None => booking.trip.departure_at,
        };
        if now >= departure_at {
            return Err(CancelError::DepartureInPast(departure_at));
        }

        let tier = self.select_tier(departure_at - now).cloned();
        let refund_amount = match &tier {
            Some(tier) => refund_for(booking.total_amount, tier),
            None => to_cents(Decimal::ZERO),
        };

        let cancellation = Cancellation {
            cancelled_at: now,
            refund_amount,
            reason: reason.to_string(),
        };

        match self.bookings.commit_cancellation(booking_id, &cancellation).await? {
            CancellationCommit::Cancelled(cancelled) => {
                info!(
                    "Booking cancelled: {} refund {} of {} (seats {:?} released)",
                    booking_id, refund_amount, cancelled.total_amount, cancelled.seat_numbers
                );
                Ok(RefundOutcome {
                    booking_id,
                    trip_id: cancelled.trip_id,
                    status: cancelled.status,
                    refund_amount,
                    tier,
                    released_seats: cancelled.seat_numbers,
                    cancelled_at: now,
                })
            }
            CancellationCommit::AlreadyCancelled(_) => {
                warn!("Concurrent cancellation lost for booking {}", booking_id);
                Err(CancelError::AlreadyCancelled(booking_id))
            }
            CancellationCommit::NotFound => Err(CancelError::BookingNotFound(booking_id)),
        }
    }
}

/// `total * percent / 100 - penalty`, never below zero.
pub fn refund_for(total: Decimal, tier: &RefundTier) -> Decimal {
    let gross = total * tier.refund_percent / Decimal::ONE_HUNDRED;
    let penalty = if tier.applies_penalty() { tier.flat_penalty } else { Decimal::ZERO };
    to_cents((gross - penalty).max(Decimal::ZERO))
}
