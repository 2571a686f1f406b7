use async_trait::async_trait;
use busline_core::{
    Booking, BookingRepository, Cancellation, CancellationCommit, ClaimError, Gender, OccupiedSeat,
    SeatClaim, SeatLedger, SeatStatus, StoreError, Trip, TripCatalog, TripStatus,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// One row of the seat ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatAssignment {
    pub status: SeatStatus,
    pub booking_id: Option<Uuid>,
    pub gender: Option<Gender>,
}

impl SeatAssignment {
    fn free() -> Self {
        Self { status: SeatStatus::Free, booking_id: None, gender: None }
    }
}

type SeatMap = BTreeMap<u32, SeatAssignment>;

/// Process-local seat ledger.
///
/// Each trip's seats sit behind their own mutex, so claims on one trip are serialized
/// while other trips proceed independently. A claim checks and writes under a single
/// lock acquisition.
#[derive(Default)]
pub struct MemorySeatLedger {
    trips: RwLock<HashMap<Uuid, Arc<Mutex<SeatMap>>>>,
}

impl MemorySeatLedger {
    pub fn new() -> Self {
        Self::default()
    }

    async fn seats(&self, trip_id: Uuid) -> Option<Arc<Mutex<SeatMap>>> {
        self.trips.read().await.get(&trip_id).cloned()
    }

    /// Snapshot of a single seat, `None` when the trip or seat is unknown.
    pub async fn seat(&self, trip_id: Uuid, seat_number: u32) -> Option<SeatAssignment> {
        let seats = self.seats(trip_id).await?;
        let guard = seats.lock().await;
        guard.get(&seat_number).cloned()
    }
}

fn claim_locked(
    seats: &mut SeatMap,
    claims: &[SeatClaim],
    booking_id: Uuid,
    status: SeatStatus,
) -> Result<(), ClaimError> {
    let mut ordered: Vec<&SeatClaim> = claims.iter().collect();
    ordered.sort_by_key(|c| c.seat_number);

    // Check everything first; nothing is written unless every seat is free.
    for claim in &ordered {
        match seats.get(&claim.seat_number) {
            None => return Err(ClaimError::UnknownSeat(claim.seat_number)),
            Some(seat) if seat.status != SeatStatus::Free => {
                return Err(ClaimError::SeatConflict(claim.seat_number))
            }
            Some(_) => {}
        }
    }

    for claim in ordered {
        seats.insert(
            claim.seat_number,
            SeatAssignment { status, booking_id: Some(booking_id), gender: Some(claim.gender) },
        );
    }
    Ok(())
}

fn release_locked(seats: &mut SeatMap, seat_numbers: &[u32]) {
    for number in seat_numbers {
        if let Some(seat) = seats.get_mut(number) {
            *seat = SeatAssignment::free();
        }
    }
}

#[async_trait]
impl SeatLedger for MemorySeatLedger {
    async fn open_trip(&self, trip_id: Uuid, capacity: u32) -> Result<(), StoreError> {
        let seats = {
            let mut trips = self.trips.write().await;
            trips.entry(trip_id).or_default().clone()
        };
        let mut guard = seats.lock().await;
        for number in 1..=capacity {
            guard.entry(number).or_insert_with(SeatAssignment::free);
        }
        Ok(())
    }

    async fn list_occupied(&self, trip_id: Uuid) -> Result<Vec<OccupiedSeat>, StoreError> {
        let Some(seats) = self.seats(trip_id).await else {
            return Ok(Vec::new());
        };
        let guard = seats.lock().await;
        Ok(guard
            .iter()
            .filter(|(_, seat)| seat.status != SeatStatus::Free)
            .map(|(number, seat)| OccupiedSeat {
                seat_number: *number,
                status: seat.status,
                gender: seat.gender,
                booking_id: seat.booking_id,
            })
            .collect())
    }

    async fn try_claim(
        &self,
        trip_id: Uuid,
        claims: &[SeatClaim],
        booking_id: Uuid,
        status: SeatStatus,
    ) -> Result<(), ClaimError> {
        let Some(first) = claims.iter().map(|c| c.seat_number).min() else {
            return Ok(());
        };
        let seats = self.seats(trip_id).await.ok_or(ClaimError::UnknownSeat(first))?;
        let mut guard = seats.lock().await;
        claim_locked(&mut guard, claims, booking_id, status)
    }

    async fn release(&self, trip_id: Uuid, seat_numbers: &[u32]) -> Result<(), StoreError> {
        if let Some(seats) = self.seats(trip_id).await {
            let mut guard = seats.lock().await;
            release_locked(&mut guard, seat_numbers);
        }
        Ok(())
    }
}

/// Booking store backed by a [`MemorySeatLedger`].
pub struct MemoryBookingStore {
    ledger: Arc<MemorySeatLedger>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookingStore {
    pub fn new(ledger: Arc<MemorySeatLedger>) -> Self {
        Self { ledger, bookings: RwLock::new(HashMap::new()) }
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingStore {
    async fn commit_booking(&self, booking: &Booking) -> Result<(), ClaimError> {
        self.ledger
            .try_claim(booking.trip_id, &booking.seat_claims(), booking.id, booking.seat_status())
            .await?;
        // Inserting into the map cannot fail, so the claim and the record land together.
        self.bookings.write().await.insert(booking.id, booking.clone());
        debug!("Stored booking {} in memory", booking.id);
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn commit_cancellation(
        &self,
        id: Uuid,
        cancellation: &Cancellation,
    ) -> Result<CancellationCommit, StoreError> {
        let mut bookings = self.bookings.write().await;
        let Some(booking) = bookings.get_mut(&id) else {
            return Ok(CancellationCommit::NotFound);
        };
        if booking.is_cancelled() {
            return Ok(CancellationCommit::AlreadyCancelled(booking.clone()));
        }

        booking.apply_cancellation(cancellation);
        // Still holding the bookings lock: no reader sees the status without the freed seats.
        self.ledger.release(booking.trip_id, &booking.seat_numbers).await?;
        info!("Released seats {:?} of booking {}", booking.seat_numbers, id);
        Ok(CancellationCommit::Cancelled(booking.clone()))
    }
}

/// Catalog fed directly by callers; stands in for the scheduling service.
#[derive(Default)]
pub struct MemoryTripCatalog {
    trips: RwLock<HashMap<Uuid, Trip>>,
}

impl MemoryTripCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, trip: Trip) {
        self.trips.write().await.insert(trip.id, trip);
    }

    pub async fn set_status(&self, trip_id: Uuid, status: TripStatus) -> bool {
        match self.trips.write().await.get_mut(&trip_id) {
            Some(trip) => {
                trip.status = status;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl TripCatalog for MemoryTripCatalog {
    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError> {
        Ok(self.trips.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(seats: &[u32]) -> Vec<SeatClaim> {
        seats.iter().map(|s| SeatClaim { seat_number: *s, gender: Gender::Other }).collect()
    }

    #[tokio::test]
    async fn test_claim_and_list() {
        let ledger = MemorySeatLedger::new();
        let trip_id = Uuid::new_v4();
        ledger.open_trip(trip_id, 40).await.unwrap();

        let booking_id = Uuid::new_v4();
        ledger.try_claim(trip_id, &claims(&[2, 1]), booking_id, SeatStatus::Sold).await.unwrap();

        let occupied = ledger.list_occupied(trip_id).await.unwrap();
        assert_eq!(occupied.len(), 2);
        assert_eq!(occupied[0].seat_number, 1);
        assert_eq!(occupied[1].booking_id, Some(booking_id));
        assert_eq!(occupied[1].gender, Some(Gender::Other));
    }

    #[tokio::test]
    async fn test_multi_seat_claim_is_all_or_nothing() {
        let ledger = MemorySeatLedger::new();
        let trip_id = Uuid::new_v4();
        ledger.open_trip(trip_id, 40).await.unwrap();
        ledger.try_claim(trip_id, &claims(&[4]), Uuid::new_v4(), SeatStatus::Sold).await.unwrap();

        let result = ledger.try_claim(trip_id, &claims(&[3, 4, 5]), Uuid::new_v4(), SeatStatus::Sold).await;
        assert!(matches!(result, Err(ClaimError::SeatConflict(4))));

        assert_eq!(ledger.seat(trip_id, 3).await.unwrap().status, SeatStatus::Free);
        assert_eq!(ledger.seat(trip_id, 5).await.unwrap().status, SeatStatus::Free);
        assert_eq!(ledger.list_occupied(trip_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_conflict_names_lowest_taken_seat() {
        let ledger = MemorySeatLedger::new();
        let trip_id = Uuid::new_v4();
        ledger.open_trip(trip_id, 10).await.unwrap();
        ledger.try_claim(trip_id, &claims(&[7, 3]), Uuid::new_v4(), SeatStatus::Held).await.unwrap();

        let result = ledger.try_claim(trip_id, &claims(&[7, 3]), Uuid::new_v4(), SeatStatus::Sold).await;
        assert!(matches!(result, Err(ClaimError::SeatConflict(3))));
    }

    #[tokio::test]
    async fn test_unknown_seat_and_unopened_trip() {
        let ledger = MemorySeatLedger::new();
        let trip_id = Uuid::new_v4();

        let result = ledger.try_claim(trip_id, &claims(&[1]), Uuid::new_v4(), SeatStatus::Sold).await;
        assert!(matches!(result, Err(ClaimError::UnknownSeat(1))));

        ledger.open_trip(trip_id, 4).await.unwrap();
        let result = ledger.try_claim(trip_id, &claims(&[2, 5]), Uuid::new_v4(), SeatStatus::Sold).await;
        assert!(matches!(result, Err(ClaimError::UnknownSeat(5))));
        assert!(ledger.list_occupied(trip_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let ledger = MemorySeatLedger::new();
        let trip_id = Uuid::new_v4();
        ledger.open_trip(trip_id, 4).await.unwrap();
        ledger.try_claim(trip_id, &claims(&[1]), Uuid::new_v4(), SeatStatus::Sold).await.unwrap();

        ledger.release(trip_id, &[1]).await.unwrap();
        let after_first = ledger.seat(trip_id, 1).await.unwrap();
        ledger.release(trip_id, &[1]).await.unwrap();
        let after_second = ledger.seat(trip_id, 1).await.unwrap();

        assert_eq!(after_first, SeatAssignment::free());
        assert_eq!(after_first, after_second);
        assert!(ledger.list_occupied(trip_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_keeps_claims() {
        let ledger = MemorySeatLedger::new();
        let trip_id = Uuid::new_v4();
        ledger.open_trip(trip_id, 4).await.unwrap();
        ledger.try_claim(trip_id, &claims(&[1]), Uuid::new_v4(), SeatStatus::Sold).await.unwrap();
        ledger.open_trip(trip_id, 4).await.unwrap();

        assert_eq!(ledger.seat(trip_id, 1).await.unwrap().status, SeatStatus::Sold);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_single_winner() {
        let ledger = Arc::new(MemorySeatLedger::new());
        let trip_id = Uuid::new_v4();
        ledger.open_trip(trip_id, 40).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..64 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.try_claim(trip_id, &claims(&[12]), Uuid::new_v4(), SeatStatus::Sold).await
            }));
        }

        let mut won = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => won += 1,
                Err(ClaimError::SeatConflict(12)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(won, 1);
        assert_eq!(conflicts, 63);
    }
}
