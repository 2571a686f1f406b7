use async_trait::async_trait;
use busline_core::{BusRef, RouteRef, StoreError, Trip, TripCatalog, TripStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::db_err;

/// Reads trips owned by the scheduling side of the platform.
pub struct PgTripCatalog {
    pool: PgPool,
}

impl PgTripCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    origin: String,
    destination: String,
    base_fare: Decimal,
    plate: String,
    capacity: i32,
    pet_friendly: bool,
    departure_at: DateTime<Utc>,
    arrival_at: DateTime<Utc>,
    status: String,
}

impl TryFrom<TripRow> for Trip {
    type Error = StoreError;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        let status = TripStatus::parse(&row.status)
            .ok_or_else(|| StoreError::InvalidData(format!("trip status {}", row.status)))?;
        let capacity = u32::try_from(row.capacity)
            .map_err(|_| StoreError::InvalidData(format!("bus capacity {}", row.capacity)))?;

        Ok(Trip {
            id: row.id,
            route: RouteRef {
                origin: row.origin,
                destination: row.destination,
                base_fare: row.base_fare,
            },
            bus: BusRef {
                plate: row.plate,
                capacity,
                pet_friendly: row.pet_friendly,
            },
            departure_at: row.departure_at,
            arrival_at: row.arrival_at,
            status,
        })
    }
}

#[async_trait]
impl TripCatalog for PgTripCatalog {
    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError> {
        let row = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT
                t.id, r.origin, r.destination, r.base_fare,
                b.plate, b.capacity, b.pet_friendly,
                t.scheduled_departure AS departure_at, t.scheduled_arrival AS arrival_at,
                t.status
            FROM trips t
            JOIN routes r ON t.route_id = r.id
            JOIN buses b ON t.bus_id = b.id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Trip::try_from).transpose()
    }
}
