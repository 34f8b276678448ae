use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{BookingStore, IdentityProvider, ShowCatalog};
use crate::error::StoreError;
use crate::models::{Booking, BookingId, BookingStatus, SeatCoordinate, Show, ShowId, UserId};

/// In-memory catalog for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    shows: Arc<RwLock<HashMap<ShowId, Show>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, show: Show) {
        self.shows.write().await.insert(show.id, show);
    }
}

#[async_trait]
impl ShowCatalog for InMemoryCatalog {
    async fn find_show(&self, id: ShowId) -> Result<Option<Show>, StoreError> {
        Ok(self.shows.read().await.get(&id).cloned())
    }

    async fn active_show_ids(&self) -> Result<Vec<ShowId>, StoreError> {
        let mut ids: Vec<ShowId> = self
            .shows
            .read()
            .await
            .values()
            .filter(|s| s.is_active)
            .map(|s| s.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut store = self.bookings.write().await;
        if store.values().any(|b| b.reference == booking.reference) {
            return Err(StoreError::DuplicateReference(booking.reference.clone()));
        }
        store.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, StoreError> {
        let mut list: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
        Ok(list)
    }

    async fn mark_cancelled(&self, id: BookingId) -> Result<bool, StoreError> {
        let mut store = self.bookings.write().await;
        match store.get_mut(&id) {
            Some(b) if b.status == BookingStatus::Confirmed => {
                b.mark_cancelled();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn occupied_seats(&self, show_id: ShowId) -> Result<Vec<SeatCoordinate>, StoreError> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.show_id == show_id && b.status == BookingStatus::Confirmed)
            .flat_map(Booking::coordinates)
            .collect())
    }
}

/// Plain-text credentials, only for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryIdentity {
    users: Arc<RwLock<HashMap<String, (String, UserId)>>>,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, email: &str, password: &str, user_id: UserId) {
        self.users
            .write()
            .await
            .insert(email.to_string(), (password.to_string(), user_id));
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<UserId>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .get(email)
            .filter(|(stored, _)| stored == password)
            .map(|(_, id)| *id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::generate_reference;
    use crate::models::{BookedSeat, SeatTier};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 5, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn booking(user: UserId, show: ShowId, booked_hour: u32, seat: u32) -> Booking {
        let seats = vec![BookedSeat { row: "D".into(), seat_number: seat, tier: SeatTier::Regular, price: 150 }];
        Booking::confirmed(generate_reference(), user, show, seats, at(22), at(booked_hour))
    }

    #[tokio::test]
    async fn lists_most_recent_first() {
        let store = InMemoryBookingStore::new();
        let early = booking(1, 1, 8, 1);
        let late = booking(1, 1, 12, 2);
        let other = booking(2, 1, 10, 3);
        for b in [&early, &late, &other] {
            store.insert(b).await.unwrap();
        }

        let ids: Vec<_> = store.list_for_user(1).await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![late.id, early.id]);
    }

    #[tokio::test]
    async fn cancel_transition_happens_once() {
        let store = InMemoryBookingStore::new();
        let b = booking(1, 1, 8, 1);
        store.insert(&b).await.unwrap();

        assert!(store.mark_cancelled(b.id).await.unwrap());
        assert!(!store.mark_cancelled(b.id).await.unwrap());
        assert!(store.occupied_seats(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_reused_reference() {
        let store = InMemoryBookingStore::new();
        let a = booking(1, 1, 8, 1);
        let mut b = booking(1, 1, 9, 2);
        b.reference = a.reference.clone();
        store.insert(&a).await.unwrap();
        assert!(matches!(store.insert(&b).await, Err(StoreError::DuplicateReference(_))));
    }

    #[tokio::test]
    async fn identity_checks_password() {
        let identity = InMemoryIdentity::new();
        identity.add_user("a@example.com", "secret", 42).await;
        assert_eq!(identity.authenticate("a@example.com", "secret").await.unwrap(), Some(42));
        assert_eq!(identity.authenticate("a@example.com", "wrong").await.unwrap(), None);
        assert_eq!(identity.authenticate("b@example.com", "secret").await.unwrap(), None);
    }
}
