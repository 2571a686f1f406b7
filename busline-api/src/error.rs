use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use busline_booking::{BookingError, CancelError};
use busline_core::PolicyReason;
use serde_json::json;

/// Every error leaves the service as `{ errorKind, detail }`.
#[derive(Debug)]
pub enum AppError {
    ValidationError(&'static str, String),
    NotFoundError(&'static str, String),
    ConflictError(&'static str, String),
    GoneError(&'static str, String),
    PolicyViolation { passenger_index: usize, reason: PolicyReason },
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::ValidationError(kind, detail) => (StatusCode::UNPROCESSABLE_ENTITY, error_body(kind, detail)),
            AppError::NotFoundError(kind, detail) => (StatusCode::NOT_FOUND, error_body(kind, detail)),
            AppError::ConflictError(kind, detail) => (StatusCode::CONFLICT, error_body(kind, detail)),
            AppError::GoneError(kind, detail) => (StatusCode::GONE, error_body(kind, detail)),
            AppError::PolicyViolation { passenger_index, reason } => (
                StatusCode::CONFLICT,
                json!({
                    "errorKind": "PolicyViolation",
                    "detail": format!("Passenger {} rejected: {}", passenger_index, reason),
                    "passengerIndex": passenger_index,
                    "reason": reason.code(),
                }),
            ),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, error_body("Internal", "Internal Server Error".to_string()))
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, error_body("Internal", "Internal Server Error".to_string()))
            }
        };

        (status, Json(body)).into_response()
    }
}

fn error_body(kind: &str, detail: String) -> serde_json::Value {
    json!({
        "errorKind": kind,
        "detail": detail,
    })
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let detail = err.to_string();
        match err {
            BookingError::TripNotFound(_) => AppError::NotFoundError("TripNotFound", detail),
            BookingError::InvalidRequest(_) => AppError::ValidationError("InvalidRequest", detail),
            BookingError::TripNotBookable(_) => AppError::GoneError("TripNotBookable", detail),
            BookingError::PolicyViolation { passenger_index, reason } => {
                AppError::PolicyViolation { passenger_index, reason }
            }
            BookingError::SeatConflict(_) => AppError::ConflictError("SeatConflict", detail),
            BookingError::Storage(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<CancelError> for AppError {
    fn from(err: CancelError) -> Self {
        let detail = err.to_string();
        match err {
            CancelError::BookingNotFound(_) => AppError::NotFoundError("BookingNotFound", detail),
            CancelError::AlreadyCancelled(_) => AppError::ConflictError("AlreadyCancelled", detail),
            CancelError::DepartureInPast(_) => AppError::GoneError("DepartureInPast", detail),
            CancelError::Storage(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::ValidationError("InvalidRequest", err.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(err: PathRejection) -> Self {
        AppError::ValidationError("InvalidRequest", err.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
