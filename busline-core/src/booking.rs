use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::passenger::{Gender, Passenger};
use crate::trip::TripSnapshot;

/// Rounds a currency amount to cents and pins the scale so it always renders with two decimals.
pub fn to_cents(amount: Decimal) -> Decimal {
    let mut cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents
}

/// Booking status in the lifecycle. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Reserved,
    Sold,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Reserved => "Reserved",
            BookingStatus::Sold => "Sold",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Reserved" => Some(BookingStatus::Reserved),
            "Sold" => Some(BookingStatus::Sold),
            "Cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// What the client asks for: a paid sale or a hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingIntent {
    Sold,
    Reserved,
}

impl BookingIntent {
    pub fn status(&self) -> BookingStatus {
        match self {
            BookingIntent::Sold => BookingStatus::Sold,
            BookingIntent::Reserved => BookingStatus::Reserved,
        }
    }

    pub fn seat_status(&self) -> SeatStatus {
        match self {
            BookingIntent::Sold => SeatStatus::Sold,
            BookingIntent::Reserved => SeatStatus::Held,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "transfer" => Some(PaymentMethod::Transfer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Free,
    Held,
    Sold,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Free => "FREE",
            SeatStatus::Held => "HELD",
            SeatStatus::Sold => "SOLD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FREE" => Some(SeatStatus::Free),
            "HELD" => Some(SeatStatus::Held),
            "SOLD" => Some(SeatStatus::Sold),
            _ => None,
        }
    }
}

/// One seat requested by a booking, with the occupant's gender for the seat map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatClaim {
    pub seat_number: u32,
    pub gender: Gender,
}

/// A non-free seat as reported by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OccupiedSeat {
    pub seat_number: u32,
    pub status: SeatStatus,
    pub gender: Option<Gender>,
    pub booking_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cancellation {
    pub cancelled_at: DateTime<Utc>,
    pub refund_amount: Decimal,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub seat_numbers: Vec<u32>,
    pub passengers: Vec<Passenger>,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: BookingStatus,
    pub trip: TripSnapshot,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<Decimal>,
    pub cancellation_reason: Option<String>,
}

impl Booking {
    /// Pairs each seat with its passenger, in request order.
    pub fn seat_claims(&self) -> Vec<SeatClaim> {
        self.seat_numbers
            .iter()
            .zip(&self.passengers)
            .map(|(seat, p)| SeatClaim { seat_number: *seat, gender: p.gender })
            .collect()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    pub fn seat_status(&self) -> SeatStatus {
        match self.status {
            BookingStatus::Reserved => SeatStatus::Held,
            BookingStatus::Sold => SeatStatus::Sold,
            BookingStatus::Cancelled => SeatStatus::Free,
        }
    }

    /// Applies a committed cancellation. Callers check terminality first.
    pub fn apply_cancellation(&mut self, cancellation: &Cancellation) {
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(cancellation.cancelled_at);
        self.refund_amount = Some(cancellation.refund_amount);
        self.cancellation_reason = Some(cancellation.reason.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cents_rounding() {
        assert_eq!(to_cents(dec!(10.005)), dec!(10.01));
        assert_eq!(to_cents(dec!(70)), dec!(70));
        assert_eq!(to_cents(dec!(70)).to_string(), "70.00");
        assert_eq!(to_cents(dec!(33.333)), dec!(33.33));
    }

    #[test]
    fn test_intent_maps_to_seat_status() {
        assert_eq!(BookingIntent::Sold.seat_status(), SeatStatus::Sold);
        assert_eq!(BookingIntent::Reserved.seat_status(), SeatStatus::Held);
        assert_eq!(BookingIntent::Reserved.status(), BookingStatus::Reserved);
    }

    #[test]
    fn test_column_values_parse_back() {
        assert_eq!(BookingStatus::parse("Cancelled"), Some(BookingStatus::Cancelled));
        assert_eq!(SeatStatus::parse(SeatStatus::Held.as_str()), Some(SeatStatus::Held));
        assert_eq!(PaymentMethod::parse("card"), Some(PaymentMethod::Card));
        assert_eq!(PaymentMethod::parse("crypto"), None);
    }
}
