//! inventory.rs
//!
//! Состояние мест одного сеанса. `ShowInventory` единственный владелец множества
//! занятых мест: изменить его можно только через `try_reserve` и `release`,
//! и обе операции выполняются под мьютексом сеанса от проверки до записи.
//!
//! Ожидание мьютекса ограничено `lock_timeout`; очередь tokio::sync::Mutex честная (FIFO).
//! `version` растёт на каждом изменении занятости и читается без мьютекса.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::models::{ScreenGeometry, SeatCoordinate, Show, ShowId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("seats already booked: {}", join_seats(.0))]
    Conflict(Vec<SeatCoordinate>),
    #[error("seat {0} is outside the screen")]
    OutOfRange(SeatCoordinate),
    #[error("seat {0} requested more than once")]
    Duplicate(SeatCoordinate),
    #[error("timed out waiting for the seat inventory of show {0}")]
    LockTimeout(ShowId),
}

pub(crate) fn join_seats(seats: &[SeatCoordinate]) -> String {
    seats.iter().map(SeatCoordinate::key).collect::<Vec<_>>().join(", ")
}

#[derive(Debug)]
struct Occupancy {
    occupied: HashSet<SeatCoordinate>,
    available: u32,
}

impl Occupancy {
    fn assert_consistent(&self, capacity: u32) {
        debug_assert_eq!(self.available as usize + self.occupied.len(), capacity as usize);
    }
}

/// Read-only copy of a show's occupancy at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub show_id: ShowId,
    pub capacity: u32,
    pub available: u32,
    pub occupied: HashSet<SeatCoordinate>,
    pub version: u64,
}

#[derive(Debug)]
pub struct ShowInventory {
    show_id: ShowId,
    geometry: ScreenGeometry,
    lock_timeout: Duration,
    version: AtomicU64,
    state: Mutex<Occupancy>,
}

impl ShowInventory {
    /// Build the inventory of `show` with `occupied` seats already taken.
    /// Seats outside the screen are dropped with a warning.
    pub fn new(show: &Show, occupied: impl IntoIterator<Item = SeatCoordinate>, lock_timeout: Duration) -> Self {
        let geometry = show.geometry;
        let mut set = HashSet::new();
        for seat in occupied {
            if geometry.contains(&seat) {
                set.insert(seat);
            } else {
                warn!(show_id = show.id, seat = %seat, "ignoring booked seat outside the screen");
            }
        }

        let available = geometry.capacity() - set.len() as u32;
        Self {
            show_id: show.id,
            geometry,
            lock_timeout,
            version: AtomicU64::new(0),
            state: Mutex::new(Occupancy { occupied: set, available }),
        }
    }

    pub fn show_id(&self) -> ShowId {
        self.show_id
    }

    /// Occupancy version; changes whenever a reserve or release changes the set.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> u32 {
        self.geometry.capacity()
    }

    async fn lock(&self) -> Result<MutexGuard<'_, Occupancy>, InventoryError> {
        tokio::time::timeout(self.lock_timeout, self.state.lock())
            .await
            .map_err(|_| InventoryError::LockTimeout(self.show_id))
    }

    /// Reject duplicates and seats outside the screen before touching the lock.
    pub fn validate(&self, seats: &[SeatCoordinate]) -> Result<(), InventoryError> {
        let mut seen = HashSet::with_capacity(seats.len());
        for seat in seats {
            if !self.geometry.contains(seat) {
                return Err(InventoryError::OutOfRange(seat.clone()));
            }
            if !seen.insert(seat) {
                return Err(InventoryError::Duplicate(seat.clone()));
            }
        }
        Ok(())
    }

    /// Take all of `seats` or none of them.
    ///
    /// On conflict the error lists exactly the requested seats that were
    /// already held; the occupancy is left untouched.
    pub async fn try_reserve(&self, seats: &[SeatCoordinate]) -> Result<(), InventoryError> {
        self.validate(seats)?;

        let mut state = self.lock().await?;

        let taken: Vec<SeatCoordinate> = seats
            .iter()
            .filter(|seat| state.occupied.contains(*seat))
            .cloned()
            .collect();
        if !taken.is_empty() {
            debug!(show_id = self.show_id, taken = %join_seats(&taken), "reservation conflict");
            return Err(InventoryError::Conflict(taken));
        }

        state.occupied.extend(seats.iter().cloned());
        state.available -= seats.len() as u32;
        state.assert_consistent(self.capacity());
        self.version.fetch_add(1, Ordering::AcqRel);

        debug!(show_id = self.show_id, reserved = seats.len(), available = state.available, "seats reserved");
        Ok(())
    }

    /// Free `seats`. Seats that are not held are skipped, so calling this twice
    /// is the same as calling it once. Returns how many seats were freed.
    pub async fn release(&self, seats: &[SeatCoordinate]) -> Result<u32, InventoryError> {
        let mut state = self.lock().await?;

        let mut removed = 0u32;
        for seat in seats {
            if state.occupied.remove(seat) {
                removed += 1;
            }
        }
        state.available += removed;
        state.assert_consistent(self.capacity());
        if removed > 0 {
            self.version.fetch_add(1, Ordering::AcqRel);
        }

        debug!(show_id = self.show_id, released = removed, available = state.available, "seats released");
        Ok(removed)
    }

    pub async fn snapshot(&self) -> Result<InventorySnapshot, InventoryError> {
        let state = self.lock().await?;
        Ok(InventorySnapshot {
            show_id: self.show_id,
            capacity: self.capacity(),
            available: state.available,
            occupied: state.occupied.clone(),
            version: self.version(),
        })
    }
}
