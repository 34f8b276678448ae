//! Ошибки бронирования и их отображение в HTTP-ответы.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::{BookingId, SeatCoordinate, ShowId};
use crate::services::inventory::{join_seats, InventoryError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("booking reference {0} is already in use")]
    DuplicateReference(String),
    #[error("a requested seat is held by another active booking")]
    SeatTaken,
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Caller-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Unauthorized,
    SeatConflict,
    TemporalViolation,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("a booking may hold at most {max} seats, got {requested}")]
    TooManySeats { requested: usize, max: usize },
    #[error("show {0} not found")]
    ShowNotFound(ShowId),
    #[error("booking {0} not found")]
    NotFound(BookingId),
    #[error("booking {0} belongs to another user")]
    NotOwner(BookingId),
    #[error("seats already booked: {}", join_seats(.0))]
    SeatConflict(Vec<SeatCoordinate>),
    #[error("the show for booking {0} has already started or is past the cancellation cutoff")]
    PastShow(BookingId),
    #[error("booking {0} is already cancelled")]
    AlreadyCancelled(BookingId),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::InvalidInput(_)
            | BookingError::TooManySeats { .. }
            | BookingError::AlreadyCancelled(_) => ErrorKind::InvalidInput,
            BookingError::ShowNotFound(_) | BookingError::NotFound(_) => ErrorKind::NotFound,
            BookingError::NotOwner(_) => ErrorKind::Unauthorized,
            BookingError::SeatConflict(_) => ErrorKind::SeatConflict,
            BookingError::PastShow(_) => ErrorKind::TemporalViolation,
            BookingError::Storage(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::InvalidInput(_)
            | BookingError::TooManySeats { .. }
            | BookingError::PastShow(_) => StatusCode::BAD_REQUEST,
            BookingError::ShowNotFound(_) | BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::NotOwner(_) => StatusCode::FORBIDDEN,
            BookingError::SeatConflict(_) | BookingError::AlreadyCancelled(_) => StatusCode::CONFLICT,
            BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InventoryError> for BookingError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Conflict(seats) => BookingError::SeatConflict(seats),
            // Конкуренция за мьютекс не раскрывается клиенту отдельно
            InventoryError::LockTimeout(_) => BookingError::SeatConflict(Vec::new()),
            InventoryError::OutOfRange(_) | InventoryError::Duplicate(_) => {
                BookingError::InvalidInput(err.to_string())
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    code: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    seats: Vec<String>,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            BookingError::Storage(e) => {
                tracing::error!(error = %e, "booking storage failure");
                "Internal storage error".to_string()
            }
            other => other.to_string(),
        };
        let seats = match &self {
            BookingError::SeatConflict(seats) => seats.iter().map(SeatCoordinate::key).collect(),
            _ => Vec::new(),
        };

        let body = ErrorBody { success: false, code: self.kind(), message, seats };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn conflict_maps_to_409_with_seats() {
        let err: BookingError = InventoryError::Conflict(vec![SeatCoordinate::new("A", 2)]).into();
        assert_eq!(err.kind(), ErrorKind::SeatConflict);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "seats already booked: A2");
    }

    #[test]
    fn lock_timeout_surfaces_as_conflict() {
        let err: BookingError = InventoryError::LockTimeout(3).into();
        assert!(matches!(err, BookingError::SeatConflict(ref s) if s.is_empty()));
    }

    #[test]
    fn taxonomy() {
        let id = Uuid::new_v4();
        assert_eq!(BookingError::NotOwner(id).kind(), ErrorKind::Unauthorized);
        assert_eq!(BookingError::PastShow(id).kind(), ErrorKind::TemporalViolation);
        assert_eq!(BookingError::TooManySeats { requested: 7, max: 6 }.kind(), ErrorKind::InvalidInput);
        assert_eq!(BookingError::ShowNotFound(9).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            BookingError::from(InventoryError::OutOfRange(SeatCoordinate::new("Z", 1))).kind(),
            ErrorKind::InvalidInput
        );
    }
}
