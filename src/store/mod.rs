//! Границы с внешними системами: каталог сеансов, хранилище бронирований и
//! проверка пользователей. Есть реализация на PostgreSQL и в памяти.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Booking, BookingId, SeatCoordinate, Show, ShowId, UserId};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryBookingStore, InMemoryCatalog, InMemoryIdentity};
pub use postgres::{PgBookingStore, PgCatalog, PgIdentity};

/// Read-only source of show metadata.
#[async_trait]
pub trait ShowCatalog: Send + Sync {
    async fn find_show(&self, id: ShowId) -> Result<Option<Show>, StoreError>;

    async fn active_show_ids(&self) -> Result<Vec<ShowId>, StoreError>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist a new confirmed booking. Fails on a reused reference.
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError>;

    async fn find(&self, id: BookingId) -> Result<Option<Booking>, StoreError>;

    /// All bookings of `user_id`, most recent first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, StoreError>;

    /// Move a confirmed booking to cancelled/refunded. Returns `false` when the
    /// booking was not confirmed anymore, so only one caller wins the transition.
    async fn mark_cancelled(&self, id: BookingId) -> Result<bool, StoreError>;

    /// Seats held by confirmed bookings of `show_id`.
    async fn occupied_seats(&self, show_id: ShowId) -> Result<Vec<SeatCoordinate>, StoreError>;
}

/// Resolves login credentials to a user id.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<UserId>, StoreError>;
}
