use async_trait::async_trait;
use busline_core::{ClaimError, Gender, OccupiedSeat, SeatClaim, SeatLedger, SeatStatus, StoreError};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::db_err;

#[derive(sqlx::FromRow)]
struct SeatRow {
    seat_number: i32,
    status: String,
    booking_id: Option<Uuid>,
    occupant_gender: Option<String>,
}

impl TryFrom<SeatRow> for OccupiedSeat {
    type Error = StoreError;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        let status = SeatStatus::parse(&row.status)
            .ok_or_else(|| StoreError::InvalidData(format!("seat status {}", row.status)))?;
        Ok(OccupiedSeat {
            seat_number: row.seat_number as u32,
            status,
            gender: row.occupant_gender.as_deref().and_then(Gender::parse),
            booking_id: row.booking_id,
        })
    }
}

/// Check-and-set over exactly the requested seat rows, inside the caller's transaction.
///
/// Rows are locked with `FOR UPDATE` in ascending seat order, which every caller shares,
/// so two claims never wait on each other in opposite directions.
pub(crate) async fn claim_seats(
    conn: &mut PgConnection,
    trip_id: Uuid,
    claims: &[SeatClaim],
    booking_id: Uuid,
    status: SeatStatus,
) -> Result<(), ClaimError> {
    let mut ordered: Vec<&SeatClaim> = claims.iter().collect();
    ordered.sort_by_key(|c| c.seat_number);
    let numbers: Vec<i32> = ordered.iter().map(|c| c.seat_number as i32).collect();
    let genders: Vec<String> = ordered.iter().map(|c| c.gender.as_str().to_string()).collect();

    let locked = sqlx::query_as::<_, SeatRow>(
        r#"
        SELECT seat_number, status, booking_id, occupant_gender
        FROM seats
        WHERE trip_id = $1 AND seat_number = ANY($2)
        ORDER BY seat_number
        FOR UPDATE
        "#,
    )
    .bind(trip_id)
    .bind(&numbers)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;

    for number in &numbers {
        match locked.iter().find(|row| row.seat_number == *number) {
            None => return Err(ClaimError::UnknownSeat(*number as u32)),
            Some(row) if row.status != SeatStatus::Free.as_str() => {
                return Err(ClaimError::SeatConflict(*number as u32))
            }
            Some(_) => {}
        }
    }

    let updated = sqlx::query(
        r#"
        UPDATE seats s
        SET status = $3, booking_id = $4, occupant_gender = c.gender, updated_at = NOW()
        FROM UNNEST($2::int4[], $5::text[]) AS c(seat_number, gender)
        WHERE s.trip_id = $1 AND s.seat_number = c.seat_number AND s.status = 'FREE'
        "#,
    )
    .bind(trip_id)
    .bind(&numbers)
    .bind(status.as_str())
    .bind(booking_id)
    .bind(&genders)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    if updated.rows_affected() != numbers.len() as u64 {
        // The rows are locked, so this means the table changed under a different lock discipline.
        warn!("Seat claim for trip {} touched {} of {} rows", trip_id, updated.rows_affected(), numbers.len());
        return Err(ClaimError::Store(StoreError::InvalidData(
            "seat claim affected an unexpected number of rows".to_string(),
        )));
    }

    debug!("Claimed seats {:?} on trip {} for {}", numbers, trip_id, booking_id);
    Ok(())
}

pub(crate) async fn release_seats(
    conn: &mut PgConnection,
    trip_id: Uuid,
    seat_numbers: &[u32],
) -> Result<u64, sqlx::Error> {
    let numbers: Vec<i32> = seat_numbers.iter().map(|n| *n as i32).collect();
    let result = sqlx::query(
        r#"
        UPDATE seats
        SET status = 'FREE', booking_id = NULL, occupant_gender = NULL, updated_at = NOW()
        WHERE trip_id = $1 AND seat_number = ANY($2) AND status <> 'FREE'
        "#,
    )
    .bind(trip_id)
    .bind(&numbers)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

pub struct PgSeatLedger {
    pool: PgPool,
}

impl PgSeatLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeatLedger for PgSeatLedger {
    async fn open_trip(&self, trip_id: Uuid, capacity: u32) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO seats (trip_id, seat_number)
            SELECT $1, n FROM generate_series(1, $2) AS n
            ON CONFLICT (trip_id, seat_number) DO NOTHING
            "#,
        )
        .bind(trip_id)
        .bind(capacity as i32)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_occupied(&self, trip_id: Uuid) -> Result<Vec<OccupiedSeat>, StoreError> {
        let rows = sqlx::query_as::<_, SeatRow>(
            r#"
            SELECT seat_number, status, booking_id, occupant_gender
            FROM seats
            WHERE trip_id = $1 AND status <> 'FREE'
            ORDER BY seat_number
            "#,
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(OccupiedSeat::try_from).collect()
    }

    async fn try_claim(
        &self,
        trip_id: Uuid,
        claims: &[SeatClaim],
        booking_id: Uuid,
        status: SeatStatus,
    ) -> Result<(), ClaimError> {
        if claims.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        claim_seats(&mut tx, trip_id, claims, booking_id, status).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn release(&self, trip_id: Uuid, seat_numbers: &[u32]) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        let freed = release_seats(&mut conn, trip_id, seat_numbers).await.map_err(db_err)?;
        debug!("Released {} of {:?} seats on trip {}", freed, seat_numbers, trip_id);
        Ok(())
    }
}
