//! booking.rs
//!
//! Оркестрация бронирования: проверка запроса, расчёт цен, атомарный резерв мест
//! в `ShowInventory` и сохранение брони. Если сохранить бронь не удалось,
//! места возвращаются в инвентарь.
//!
//! Инвентарь сеанса поднимается лениво из каталога и подтверждённых броней и
//! дальше живёт в памяти процесса как единственный источник истины по местам.

use chrono::{Duration as ChronoDuration, NaiveDateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::BookingConfig;
use crate::error::BookingError;
use crate::models::booking::generate_reference;
use crate::models::{BookedSeat, Booking, BookingId, SeatCoordinate, SeatTier, Show, ShowId, UserId};
use crate::services::inventory::{InventoryError, ShowInventory};
use crate::services::layout::{generate_layout, LayoutRow};
use crate::services::pricing::{price_for, PriceBreakdown};
use crate::store::{BookingStore, ShowCatalog};

const RELEASE_ATTEMPTS: u32 = 5;

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// Seat grid of a show together with counts and the resolved price table.
#[derive(Debug, Clone, Serialize)]
pub struct SeatMap {
    pub show_id: ShowId,
    pub total_seats: u32,
    pub available_seats: u32,
    pub seat_layout: Vec<LayoutRow>,
    pub prices: PriceBreakdown,
    /// Inventory version the map was built from.
    #[serde(skip)]
    pub version: u64,
}

pub struct BookingEngine {
    catalog: Arc<dyn ShowCatalog>,
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    policy: BookingConfig,
    inventories: RwLock<HashMap<ShowId, Arc<ShowInventory>>>,
}

impl BookingEngine {
    pub fn new(catalog: Arc<dyn ShowCatalog>, store: Arc<dyn BookingStore>, policy: BookingConfig) -> Self {
        Self::with_clock(catalog, store, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        catalog: Arc<dyn ShowCatalog>,
        store: Arc<dyn BookingStore>,
        policy: BookingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            store,
            clock,
            policy,
            inventories: RwLock::new(HashMap::new()),
        }
    }

    /// Active show or `ShowNotFound`.
    async fn active_show(&self, show_id: ShowId) -> Result<Show, BookingError> {
        match self.catalog.find_show(show_id).await? {
            Some(show) if show.is_active => Ok(show),
            _ => Err(BookingError::ShowNotFound(show_id)),
        }
    }

    /// Inventory of `show`, hydrated from confirmed bookings on first use.
    async fn inventory_for(&self, show: &Show) -> Result<Arc<ShowInventory>, BookingError> {
        if let Some(inventory) = self.inventories.read().await.get(&show.id) {
            return Ok(inventory.clone());
        }

        let occupied = self.store.occupied_seats(show.id).await?;
        let lock_timeout = Duration::from_millis(self.policy.lock_timeout_ms);
        let fresh = Arc::new(ShowInventory::new(show, occupied, lock_timeout));

        // Проигравший гонку за гидратацию отбрасывает свою копию
        let mut map = self.inventories.write().await;
        let inventory = map.entry(show.id).or_insert_with(|| {
            debug!(show_id = show.id, "seat inventory hydrated");
            fresh
        });
        Ok(inventory.clone())
    }

    fn check_request(&self, seats: &[SeatCoordinate]) -> Result<(), BookingError> {
        if seats.is_empty() {
            return Err(BookingError::InvalidInput("at least one seat must be selected".to_string()));
        }
        let max = self.policy.max_seats_per_booking;
        if seats.len() > max {
            return Err(BookingError::TooManySeats { requested: seats.len(), max });
        }
        let mut seen = HashSet::with_capacity(seats.len());
        if let Some(dup) = seats.iter().find(|s| !seen.insert(*s)) {
            return Err(BookingError::InvalidInput(format!("seat {dup} selected more than once")));
        }
        Ok(())
    }

    /// Reserve `seats` of `show_id` for `user_id` and record the booking.
    ///
    /// The inventory reserve is the only place two requests for the same seats
    /// are ordered: the loser gets `SeatConflict` and nothing is written.
    pub async fn create_booking(
        &self,
        user_id: UserId,
        show_id: ShowId,
        seats: Vec<SeatCoordinate>,
    ) -> Result<Booking, BookingError> {
        self.check_request(&seats)?;

        let show = self.active_show(show_id).await?;
        let inventory = self.inventory_for(&show).await?;
        inventory.validate(&seats)?;

        let rows = show.geometry.rows();
        let priced: Vec<BookedSeat> = seats
            .iter()
            .map(|seat| {
                let row_index = seat.row_index().unwrap_or_default();
                let tier = SeatTier::for_row(row_index, rows);
                BookedSeat {
                    row: seat.row.clone(),
                    seat_number: seat.seat_number,
                    tier,
                    price: price_for(tier, &show.prices),
                }
            })
            .collect();

        inventory.try_reserve(&seats).await.map_err(|e| {
            if let InventoryError::LockTimeout(_) = e {
                warn!(show_id, user_id, "inventory lock timed out");
            }
            BookingError::from(e)
        })?;

        let booking = Booking::confirmed(
            generate_reference(),
            user_id,
            show_id,
            priced,
            show.starts_at,
            self.clock.now(),
        );

        if let Err(e) = self.store.insert(&booking).await {
            error!(show_id, user_id, reference = %booking.reference, "failed to persist booking, rolling back seats: {}", e);
            self.release_seats(&inventory, &seats).await;
            return Err(e.into());
        }

        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            show_id,
            user_id,
            seats = seats.len(),
            total = booking.total_amount,
            "booking confirmed"
        );
        Ok(booking)
    }

    /// Cancel a confirmed booking owned by `user_id` and free its seats.
    pub async fn cancel_booking(&self, user_id: UserId, booking_id: BookingId) -> Result<Booking, BookingError> {
        let mut booking = self.owned_booking(user_id, booking_id).await?;

        if booking.is_cancelled() {
            return Err(BookingError::AlreadyCancelled(booking_id));
        }

        let cutoff = ChronoDuration::minutes(self.policy.cancellation_cutoff_minutes);
        if booking.show_starts_at - cutoff <= self.clock.now() {
            return Err(BookingError::PastShow(booking_id));
        }

        // Инвентарь поднимается до смены статуса: его чтение из хранилища
        // видит бронь подтверждённой, и места освобождает только эта отмена
        let inventory = match self.catalog.find_show(booking.show_id).await? {
            Some(show) => Some(self.inventory_for(&show).await?),
            None => {
                warn!(show_id = booking.show_id, booking_id = %booking_id, "show missing from catalog, no inventory to release");
                None
            }
        };

        // Сравнение-и-замена в хранилище: из параллельных отмен выигрывает одна
        if !self.store.mark_cancelled(booking_id).await? {
            return Err(BookingError::AlreadyCancelled(booking_id));
        }
        booking.mark_cancelled();

        if let Some(inventory) = inventory {
            self.release_seats(&inventory, &booking.coordinates()).await;
        }

        info!(booking_id = %booking.id, reference = %booking.reference, user_id, "booking cancelled");
        Ok(booking)
    }

    async fn release_seats(&self, inventory: &ShowInventory, seats: &[SeatCoordinate]) {
        for attempt in 1..=RELEASE_ATTEMPTS {
            match inventory.release(seats).await {
                Ok(_) => return,
                Err(e) => warn!(show_id = inventory.show_id(), attempt, "seat release failed: {}", e),
            }
        }
        error!(
            show_id = inventory.show_id(),
            seats = %crate::services::inventory::join_seats(seats),
            "giving up on seat release; seats stay held until the inventory is reloaded"
        );
    }

    async fn owned_booking(&self, user_id: UserId, booking_id: BookingId) -> Result<Booking, BookingError> {
        let booking = self
            .store
            .find(booking_id)
            .await?
            .ok_or(BookingError::NotFound(booking_id))?;
        if booking.user_id != user_id {
            return Err(BookingError::NotOwner(booking_id));
        }
        Ok(booking)
    }

    pub async fn get_booking(&self, user_id: UserId, booking_id: BookingId) -> Result<Booking, BookingError> {
        self.owned_booking(user_id, booking_id).await
    }

    /// Bookings of `user_id`, most recent first.
    pub async fn bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, BookingError> {
        Ok(self.store.list_for_user(user_id).await?)
    }

    pub async fn seat_map(&self, show_id: ShowId) -> Result<SeatMap, BookingError> {
        let show = self.active_show(show_id).await?;
        self.seat_map_for(&show).await
    }

    /// Show metadata plus its current seat map.
    pub async fn show_details(&self, show_id: ShowId) -> Result<(Show, SeatMap), BookingError> {
        let show = self.active_show(show_id).await?;
        let map = self.seat_map_for(&show).await?;
        Ok((show, map))
    }

    /// Current inventory version of an active show, read without the seat lock.
    pub async fn seat_map_version(&self, show_id: ShowId) -> Result<u64, BookingError> {
        let show = self.active_show(show_id).await?;
        Ok(self.inventory_for(&show).await?.version())
    }

    async fn seat_map_for(&self, show: &Show) -> Result<SeatMap, BookingError> {
        let inventory = self.inventory_for(show).await?;
        let snapshot = inventory.snapshot().await?;

        Ok(SeatMap {
            show_id: show.id,
            total_seats: snapshot.capacity,
            available_seats: snapshot.available,
            seat_layout: generate_layout(&show.geometry, &snapshot.occupied),
            prices: PriceBreakdown::resolve(&show.prices),
            version: snapshot.version,
        })
    }

    /// Hydrate inventories of all active shows. Returns how many were loaded.
    pub async fn warmup(&self) -> Result<usize, BookingError> {
        let ids = self.catalog.active_show_ids().await?;

        let results = join_all(ids.iter().map(|&id| async move {
            let show = self.active_show(id).await?;
            self.inventory_for(&show).await
        }))
        .await;

        let mut loaded = 0;
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(_) => loaded += 1,
                Err(e) => warn!(show_id = id, "inventory warmup failed: {}", e),
            }
        }
        info!("Warmed up {} of {} show inventories", loaded, ids.len());
        Ok(loaded)
    }
}
