use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Json, Router,
};
use busline_core::{Gender, SeatStatus};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupiedSeatResponse {
    pub seat_number: u32,
    pub gender: Option<Gender>,
    pub status: SeatStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMapResponse {
    pub trip_id: Uuid,
    pub capacity: u32,
    pub occupied: Vec<OccupiedSeatResponse>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/trips/{id}/seats", get(get_seat_map))
}

async fn get_seat_map(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SeatMapResponse>, AppError> {
    let Path(trip_id) = path?;
    let map = state.engine.seat_map(trip_id).await?;

    Ok(Json(SeatMapResponse {
        trip_id: map.trip_id,
        capacity: map.capacity,
        occupied: map
            .occupied
            .into_iter()
            .map(|seat| OccupiedSeatResponse {
                seat_number: seat.seat_number,
                gender: seat.gender,
                status: seat.status,
            })
            .collect(),
    }))
}
