use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::BookingError;
use crate::middleware::AuthUser;
use crate::models::{SeatCoordinate, ShowId};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(get_user_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", patch(cancel_booking))
}

/* ---------- BOOKINGS ---------- */

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SeatRequest {
    #[validate(length(min = 1, message = "row is required"))]
    pub row: String,
    #[validate(range(min = 1, message = "seat_number must be > 0"))]
    pub seat_number: u32,
}

impl From<SeatRequest> for SeatCoordinate {
    fn from(seat: SeatRequest) -> Self {
        SeatCoordinate::new(seat.row.trim().to_ascii_uppercase(), seat.seat_number)
    }
}

// POST /api/bookings
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(range(min = 1, message = "show_id must be > 0"))]
    pub show_id: ShowId,
    #[validate(length(min = 1, message = "at least one seat is required"), nested)]
    pub seats: Vec<SeatRequest>,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, BookingError> {
    req.validate()
        .map_err(|e| BookingError::InvalidInput(e.to_string()))?;

    let seats: Vec<SeatCoordinate> = req.seats.into_iter().map(Into::into).collect();
    let booking = state.engine.create_booking(user.user_id, req.show_id, seats).await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, BookingError> {
    let bookings = state.engine.bookings_for_user(user.user_id).await?;
    Ok(Json(bookings))
}

// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let booking = state.engine.get_booking(user.user_id, id).await?;
    Ok(Json(booking))
}

// PATCH /api/bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let booking = state.engine.cancel_booking(user.user_id, id).await?;
    Ok(Json(booking))
}
