use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use super::{BookingStore, IdentityProvider, ShowCatalog};
use crate::error::StoreError;
use crate::models::{
    BookedSeat, Booking, BookingId, PriceTable, ScreenGeometry, SeatCoordinate, Show, ShowId, User,
    UserId,
};

const REFERENCE_CONSTRAINT: &str = "bookings_reference_key";
const ACTIVE_SEAT_CONSTRAINT: &str = "booking_seats_active_seat_idx";

#[derive(Debug, FromRow)]
struct ShowRow {
    id: i64,
    title: String,
    rows: i32,
    seats_per_row: i32,
    base_price: i64,
    premium_price: Option<i64>,
    recliner_price: Option<i64>,
    starts_at: NaiveDateTime,
    is_active: bool,
}

impl TryFrom<ShowRow> for Show {
    type Error = StoreError;

    fn try_from(row: ShowRow) -> Result<Self, Self::Error> {
        let rows = u32::try_from(row.rows).map_err(|_| StoreError::Corrupt(format!("show {} rows", row.id)))?;
        let per_row = u32::try_from(row.seats_per_row)
            .map_err(|_| StoreError::Corrupt(format!("show {} seats_per_row", row.id)))?;
        let geometry = ScreenGeometry::new(rows, per_row)
            .map_err(|e| StoreError::Corrupt(format!("show {}: {}", row.id, e)))?;
        let prices = PriceTable::new(row.base_price, row.premium_price, row.recliner_price)
            .map_err(|e| StoreError::Corrupt(format!("show {}: {}", row.id, e)))?;

        Ok(Show {
            id: row.id,
            title: row.title,
            geometry,
            prices,
            starts_at: row.starts_at,
            is_active: row.is_active,
        })
    }
}

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShowCatalog for PgCatalog {
    async fn find_show(&self, id: ShowId) -> Result<Option<Show>, StoreError> {
        let row = sqlx::query_as::<_, ShowRow>(
            "SELECT id, title, rows, seats_per_row, base_price, premium_price, recliner_price, starts_at, is_active
             FROM shows
             WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Show::try_from).transpose()
    }

    async fn active_show_ids(&self) -> Result<Vec<ShowId>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM shows WHERE is_active = true AND starts_at > NOW() ORDER BY id"
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[derive(Debug, FromRow)]
struct BookingRow {
    id: Uuid,
    reference: String,
    user_id: i64,
    show_id: i64,
    total_amount: i64,
    show_starts_at: NaiveDateTime,
    status: String,
    payment_status: String,
    booked_at: NaiveDateTime,
}

#[derive(Debug, FromRow)]
struct SeatRow {
    booking_id: Uuid,
    row_label: String,
    seat_number: i32,
    tier: String,
    price: i64,
}

impl TryFrom<SeatRow> for BookedSeat {
    type Error = StoreError;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        Ok(BookedSeat {
            row: row.row_label,
            seat_number: u32::try_from(row.seat_number)
                .map_err(|_| StoreError::Corrupt(format!("seat number {}", row.seat_number)))?,
            tier: row.tier.parse().map_err(StoreError::Corrupt)?,
            price: row.price,
        })
    }
}

fn assemble(row: BookingRow, seats: Vec<BookedSeat>) -> Result<Booking, StoreError> {
    Ok(Booking {
        id: row.id,
        reference: row.reference,
        user_id: row.user_id,
        show_id: row.show_id,
        seats,
        total_amount: row.total_amount,
        show_starts_at: row.show_starts_at,
        status: row.status.parse().map_err(StoreError::Corrupt)?,
        payment_status: row.payment_status.parse().map_err(StoreError::Corrupt)?,
        booked_at: row.booked_at,
    })
}

// Нарушение уникальности превращаем в доменную ошибку
fn map_insert_error(err: sqlx::Error, reference: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            match db.constraint() {
                Some(REFERENCE_CONSTRAINT) => return StoreError::DuplicateReference(reference.to_string()),
                Some(ACTIVE_SEAT_CONSTRAINT) => return StoreError::SeatTaken,
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_seats(&self, booking_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<BookedSeat>>, StoreError> {
        let rows = sqlx::query_as::<_, SeatRow>(
            "SELECT booking_id, row_label, seat_number, tier, price
             FROM booking_seats
             WHERE booking_id = ANY($1)
             ORDER BY booking_id, position"
        )
        .bind(booking_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<Uuid, Vec<BookedSeat>> = HashMap::new();
        for row in rows {
            let booking_id = row.booking_id;
            map.entry(booking_id).or_default().push(BookedSeat::try_from(row)?);
        }
        Ok(map)
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO bookings
                (id, reference, user_id, show_id, total_amount, show_starts_at, status, payment_status, booked_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        )
        .bind(booking.id)
        .bind(&booking.reference)
        .bind(booking.user_id)
        .bind(booking.show_id)
        .bind(booking.total_amount)
        .bind(booking.show_starts_at)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.booked_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, &booking.reference))?;

        for (position, seat) in booking.seats.iter().enumerate() {
            sqlx::query(
                "INSERT INTO booking_seats
                    (booking_id, show_id, position, row_label, seat_number, tier, price, active)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, true)"
            )
            .bind(booking.id)
            .bind(booking.show_id)
            .bind(position as i32)
            .bind(&seat.row)
            .bind(seat.seat_number as i32)
            .bind(seat.tier.as_str())
            .bind(seat.price)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_insert_error(e, &booking.reference))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT id, reference, user_id, show_id, total_amount, show_starts_at, status, payment_status, booked_at
             FROM bookings
             WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let seats = self.load_seats(&[row.id]).await?.remove(&row.id).unwrap_or_default();
        assemble(row, seats).map(Some)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT id, reference, user_id, show_id, total_amount, show_starts_at, status, payment_status, booked_at
             FROM bookings
             WHERE user_id = $1
             ORDER BY booked_at DESC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut seats = self.load_seats(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let booked = seats.remove(&row.id).unwrap_or_default();
                assemble(row, booked)
            })
            .collect()
    }

    async fn mark_cancelled(&self, id: BookingId) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE bookings SET status = 'cancelled', payment_status = 'refunded'
             WHERE id = $1 AND status = 'confirmed'"
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE booking_seats SET active = false WHERE booking_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn occupied_seats(&self, show_id: ShowId) -> Result<Vec<SeatCoordinate>, StoreError> {
        let rows = sqlx::query_as::<_, (String, i32)>(
            "SELECT row_label, seat_number FROM booking_seats WHERE show_id = $1 AND active = true"
        )
        .bind(show_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(row, number)| {
                u32::try_from(number)
                    .map(|n| SeatCoordinate::new(row, n))
                    .map_err(|_| StoreError::Corrupt(format!("seat number {number}")))
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct PgIdentity {
    pool: PgPool,
}

impl PgIdentity {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for PgIdentity {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<UserId>, StoreError> {
        let Some(user) = User::find_active_by_email(email, &self.pool).await? else {
            return Ok(None);
        };

        // bcrypt нагружает CPU, не держим на нём воркер рантайма
        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || user.verify_password(&password).then_some(user.user_id))
            .await
            .map_err(|e| StoreError::Unavailable(format!("password check failed: {e}")))?;

        if verified.is_some() {
            sqlx::query("UPDATE users SET last_logged_in = NOW() WHERE email = $1")
                .bind(email)
                .execute(&self.pool)
                .await
                .ok();
        }
        Ok(verified)
    }
}
