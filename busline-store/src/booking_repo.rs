use async_trait::async_trait;
use busline_core::{
    Booking, BookingRepository, BookingStatus, Cancellation, CancellationCommit, ClaimError, Consent,
    Gender, Guardian, Passenger, PaymentMethod, Pet, StoreError, TripSnapshot,
};
use busline_shared::Masked;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::database::db_err;
use crate::seat_repo::claim_seats;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    trip_id: Uuid,
    seat_numbers: Vec<i32>,
    total_amount: Decimal,
    payment_method: String,
    status: String,
    base_fare: Decimal,
    capacity: i32,
    departure_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    refund_amount: Option<Decimal>,
    cancellation_reason: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    name: String,
    surname: String,
    national_id: String,
    age: i16,
    gender: String,
    contact_phone: String,
    guardian_name: Option<String>,
    guardian_national_id: Option<String>,
    notarized_permission: bool,
    pet_species: Option<String>,
    pet_name: Option<String>,
    pet_weight_kg: Option<Decimal>,
}

impl TryFrom<PassengerRow> for Passenger {
    type Error = StoreError;

    fn try_from(row: PassengerRow) -> Result<Self, Self::Error> {
        let gender = Gender::parse(&row.gender)
            .ok_or_else(|| StoreError::InvalidData(format!("gender {}", row.gender)))?;
        let consent = match (row.guardian_name, row.guardian_national_id, row.notarized_permission) {
            (Some(name), Some(id), false) => Some(Consent::Guardian(Guardian { name, national_id: Masked::new(id) })),
            (None, None, true) => Some(Consent::NotarizedPermission),
            (None, None, false) => None,
            _ => return Err(StoreError::InvalidData("inconsistent consent columns".to_string())),
        };
        let pet = match (row.pet_species, row.pet_weight_kg) {
            (Some(species), Some(weight_kg)) => Some(Pet { species, name: row.pet_name, weight_kg }),
            (None, None) => None,
            _ => return Err(StoreError::InvalidData("inconsistent pet columns".to_string())),
        };

        Ok(Passenger {
            name: row.name,
            surname: row.surname,
            national_id: Masked::new(row.national_id),
            age: u8::try_from(row.age).map_err(|_| StoreError::InvalidData(format!("age {}", row.age)))?,
            gender,
            contact_phone: Masked::new(row.contact_phone),
            consent,
            pet,
        })
    }
}

fn into_booking(row: BookingRow, passengers: Vec<Passenger>) -> Result<Booking, StoreError> {
    let status = BookingStatus::parse(&row.status)
        .ok_or_else(|| StoreError::InvalidData(format!("booking status {}", row.status)))?;
    let payment_method = PaymentMethod::parse(&row.payment_method)
        .ok_or_else(|| StoreError::InvalidData(format!("payment method {}", row.payment_method)))?;

    Ok(Booking {
        id: row.id,
        trip_id: row.trip_id,
        seat_numbers: row.seat_numbers.into_iter().map(|n| n as u32).collect(),
        passengers,
        total_amount: row.total_amount,
        payment_method,
        status,
        trip: TripSnapshot {
            base_fare: row.base_fare,
            capacity: row.capacity as u32,
            departure_at: row.departure_at,
        },
        created_at: row.created_at,
        cancelled_at: row.cancelled_at,
        refund_amount: row.refund_amount,
        cancellation_reason: row.cancellation_reason,
    })
}

const SELECT_BOOKING: &str = r#"
    SELECT id, trip_id, seat_numbers, total_amount, payment_method, status,
           base_fare, capacity, departure_at, created_at, cancelled_at, refund_amount, cancellation_reason
    FROM bookings
    WHERE id = $1
"#;

async fn fetch_booking(conn: &mut PgConnection, id: Uuid, for_update: bool) -> Result<Option<Booking>, StoreError> {
    let sql = if for_update {
        format!("{} FOR UPDATE", SELECT_BOOKING)
    } else {
        SELECT_BOOKING.to_string()
    };

    let Some(row) = sqlx::query_as::<_, BookingRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?
    else {
        return Ok(None);
    };

    let passengers = sqlx::query_as::<_, PassengerRow>(
        r#"
        SELECT name, surname, national_id, age, gender, contact_phone,
               guardian_name, guardian_national_id, notarized_permission,
               pet_species, pet_name, pet_weight_kg
        FROM passengers
        WHERE booking_id = $1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?
    .into_iter()
    .map(Passenger::try_from)
    .collect::<Result<Vec<_>, _>>()?;

    into_booking(row, passengers).map(Some)
}

async fn insert_booking(conn: &mut PgConnection, booking: &Booking) -> Result<(), sqlx::Error> {
    let seat_numbers: Vec<i32> = booking.seat_numbers.iter().map(|n| *n as i32).collect();

    sqlx::query(
        r#"
        INSERT INTO bookings (id, trip_id, seat_numbers, total_amount, payment_method, status,
                              base_fare, capacity, departure_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(booking.id)
    .bind(booking.trip_id)
    .bind(&seat_numbers)
    .bind(booking.total_amount)
    .bind(booking.payment_method.as_str())
    .bind(booking.status.as_str())
    .bind(booking.trip.base_fare)
    .bind(booking.trip.capacity as i32)
    .bind(booking.trip.departure_at)
    .bind(booking.created_at)
    .execute(&mut *conn)
    .await?;

    for (position, (seat, p)) in booking.seat_numbers.iter().zip(&booking.passengers).enumerate() {
        let (guardian_name, guardian_id, notarized) = match &p.consent {
            Some(Consent::Guardian(g)) => (Some(g.name.as_str()), Some(g.national_id.expose().as_str()), false),
            Some(Consent::NotarizedPermission) => (None, None, true),
            None => (None, None, false),
        };

        sqlx::query(
            r#"
            INSERT INTO passengers (id, booking_id, position, seat_number, name, surname, national_id, age,
                                    gender, contact_phone, guardian_name, guardian_national_id,
                                    notarized_permission, pet_species, pet_name, pet_weight_kg)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking.id)
        .bind(position as i32)
        .bind(*seat as i32)
        .bind(&p.name)
        .bind(&p.surname)
        .bind(p.national_id.expose())
        .bind(i16::from(p.age))
        .bind(p.gender.as_str())
        .bind(p.contact_phone.expose())
        .bind(guardian_name)
        .bind(guardian_id)
        .bind(notarized)
        .bind(p.pet.as_ref().map(|pet| pet.species.as_str()))
        .bind(p.pet.as_ref().and_then(|pet| pet.name.as_deref()))
        .bind(p.pet.as_ref().map(|pet| pet.weight_kg))
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn commit_booking(&self, booking: &Booking) -> Result<(), ClaimError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Dropping `tx` on any early return rolls everything back, seats included.
        claim_seats(&mut tx, booking.trip_id, &booking.seat_claims(), booking.id, booking.seat_status()).await?;
        insert_booking(&mut tx, booking).await.map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_booking(&mut conn, id, false).await
    }

    async fn commit_cancellation(
        &self,
        id: Uuid,
        cancellation: &Cancellation,
    ) -> Result<CancellationCommit, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let Some(mut booking) = fetch_booking(&mut tx, id, true).await? else {
            return Ok(CancellationCommit::NotFound);
        };
        if booking.is_cancelled() {
            return Ok(CancellationCommit::AlreadyCancelled(booking));
        }

        sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'Cancelled', cancelled_at = $2, refund_amount = $3, cancellation_reason = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(cancellation.cancelled_at)
        .bind(cancellation.refund_amount)
        .bind(&cancellation.reason)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        // Only seats this booking still owns; a seat can never be freed twice.
        let freed = sqlx::query(
            r#"
            UPDATE seats
            SET status = 'FREE', booking_id = NULL, occupant_gender = NULL, updated_at = NOW()
            WHERE trip_id = $1 AND booking_id = $2
            "#,
        )
        .bind(booking.trip_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        info!("Cancellation committed for {}: {} seats freed", id, freed.rows_affected());
        booking.apply_cancellation(cancellation);
        Ok(CancellationCommit::Cancelled(booking))
    }
}
