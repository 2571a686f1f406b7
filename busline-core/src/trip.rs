use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a scheduled trip. Only `Scheduled` trips accept bookings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "SCHEDULED",
            TripStatus::InProgress => "IN_PROGRESS",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SCHEDULED" => Some(TripStatus::Scheduled),
            "IN_PROGRESS" => Some(TripStatus::InProgress),
            "COMPLETED" => Some(TripStatus::Completed),
            "CANCELLED" => Some(TripStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRef {
    pub origin: String,
    pub destination: String,
    pub base_fare: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusRef {
    pub plate: String,
    pub capacity: u32,
    pub pet_friendly: bool,
}

/// A trip as supplied by the catalog. Read-only to the booking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub route: RouteRef,
    pub bus: BusRef,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
    pub status: TripStatus,
}

impl Trip {
    pub fn capacity(&self) -> u32 {
        self.bus.capacity
    }

    pub fn is_bookable(&self) -> bool {
        self.status == TripStatus::Scheduled
    }

    pub fn allows_pets(&self) -> bool {
        self.bus.pet_friendly
    }

    /// Freezes the values a booking must keep even if the catalog changes later.
    pub fn snapshot(&self) -> TripSnapshot {
        TripSnapshot {
            base_fare: self.route.base_fare,
            capacity: self.bus.capacity,
            departure_at: self.departure_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripSnapshot {
    pub base_fare: Decimal,
    pub capacity: u32,
    pub departure_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_round_trip_through_column_value() {
        for status in [TripStatus::Scheduled, TripStatus::InProgress, TripStatus::Completed, TripStatus::Cancelled] {
            assert_eq!(TripStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TripStatus::parse("BOARDING"), None);
    }

    #[test]
    fn test_snapshot_copies_fare_and_capacity() {
        let trip = Trip {
            id: Uuid::new_v4(),
            route: RouteRef { origin: "Rosario".into(), destination: "Córdoba".into(), base_fare: dec!(35.00) },
            bus: BusRef { plate: "AB123CD".into(), capacity: 40, pet_friendly: false },
            departure_at: Utc::now(),
            arrival_at: Utc::now(),
            status: TripStatus::Scheduled,
        };

        let snapshot = trip.snapshot();
        assert_eq!(snapshot.base_fare, dec!(35.00));
        assert_eq!(snapshot.capacity, 40);
        assert!(trip.is_bookable());
        assert!(!trip.allows_pets());
    }
}
