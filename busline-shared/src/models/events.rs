use rust_decimal::Decimal;
use uuid::Uuid;

pub const BOOKING_CONFIRMED_TOPIC: &str = "booking.confirmed";
pub const BOOKING_CANCELLED_TOPIC: &str = "booking.cancelled";

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub seat_numbers: Vec<u32>,
    pub status: String, // Sold or Reserved
    pub total_amount: Decimal,
    pub payment_method: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub released_seats: Vec<u32>,
    pub refund_amount: Decimal,
    pub reason: String,
    pub timestamp: i64,
}
