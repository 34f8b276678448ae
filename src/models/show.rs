use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::seat::SeatCoordinate;

pub type ShowId = i64;

/// Max rows a screen may have: one letter per row, A..Z.
pub const MAX_ROWS: u32 = 26;
pub const MAX_SEATS_PER_ROW: u32 = 200;

/// Upper bound for any price, keeps tier multipliers far from overflow.
pub const MAX_PRICE: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("screen must have between 1 and {MAX_ROWS} rows, got {0}")]
    Rows(u32),
    #[error("screen must have between 1 and {MAX_SEATS_PER_ROW} seats per row, got {0}")]
    SeatsPerRow(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{field} price must be between 0 and {MAX_PRICE}, got {value}")]
pub struct PriceError {
    pub field: &'static str,
    pub value: i64,
}

/// Seat grid of a screen. Valid by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenGeometry {
    rows: u32,
    seats_per_row: u32,
}

impl ScreenGeometry {
    pub fn new(rows: u32, seats_per_row: u32) -> Result<Self, GeometryError> {
        if rows == 0 || rows > MAX_ROWS {
            return Err(GeometryError::Rows(rows));
        }
        if seats_per_row == 0 || seats_per_row > MAX_SEATS_PER_ROW {
            return Err(GeometryError::SeatsPerRow(seats_per_row));
        }
        Ok(Self { rows, seats_per_row })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn seats_per_row(&self) -> u32 {
        self.seats_per_row
    }

    /// At most `MAX_ROWS * MAX_SEATS_PER_ROW`.
    pub fn capacity(&self) -> u32 {
        self.rows * self.seats_per_row
    }

    pub fn contains(&self, seat: &SeatCoordinate) -> bool {
        match seat.row_index() {
            Some(row) => row <= self.rows && (1..=self.seats_per_row).contains(&seat.seat_number),
            None => false,
        }
    }
}

impl<'de> Deserialize<'de> for ScreenGeometry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            rows: u32,
            seats_per_row: u32,
        }
        let raw = Raw::deserialize(deserializer)?;
        ScreenGeometry::new(raw.rows, raw.seats_per_row).map_err(serde::de::Error::custom)
    }
}

/// Base price with optional per-tier overrides, in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceTable {
    pub regular: i64,
    pub premium: Option<i64>,
    pub recliner: Option<i64>,
}

fn check_price(field: &'static str, value: i64) -> Result<i64, PriceError> {
    if (0..=MAX_PRICE).contains(&value) {
        Ok(value)
    } else {
        Err(PriceError { field, value })
    }
}

impl PriceTable {
    pub fn new(regular: i64, premium: Option<i64>, recliner: Option<i64>) -> Result<Self, PriceError> {
        Ok(Self {
            regular: check_price("regular", regular)?,
            premium: premium.map(|p| check_price("premium", p)).transpose()?,
            recliner: recliner.map(|p| check_price("recliner", p)).transpose()?,
        })
    }

    pub fn flat(regular: i64) -> Self {
        Self { regular, premium: None, recliner: None }
    }
}

impl<'de> Deserialize<'de> for PriceTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            regular: i64,
            premium: Option<i64>,
            recliner: Option<i64>,
        }
        let raw = Raw::deserialize(deserializer)?;
        PriceTable::new(raw.regular, raw.premium, raw.recliner).map_err(serde::de::Error::custom)
    }
}

/// Screening as supplied by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    pub id: ShowId,
    pub title: String,
    pub geometry: ScreenGeometry,
    pub prices: PriceTable,
    pub starts_at: NaiveDateTime,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_or_oversized_grid() {
        assert_eq!(ScreenGeometry::new(0, 10), Err(GeometryError::Rows(0)));
        assert_eq!(ScreenGeometry::new(27, 10), Err(GeometryError::Rows(27)));
        assert_eq!(ScreenGeometry::new(10, 0), Err(GeometryError::SeatsPerRow(0)));
        assert_eq!(
            ScreenGeometry::new(26, 200_000_000),
            Err(GeometryError::SeatsPerRow(200_000_000))
        );
    }

    #[test]
    fn largest_screen_capacity_fits() {
        let g = ScreenGeometry::new(MAX_ROWS, MAX_SEATS_PER_ROW).unwrap();
        assert_eq!(g.capacity(), 5200);
    }

    #[test]
    fn price_table_bounds() {
        assert!(PriceTable::new(150, Some(250), None).is_ok());
        assert_eq!(
            PriceTable::new(-1, None, None),
            Err(PriceError { field: "regular", value: -1 })
        );
        assert_eq!(
            PriceTable::new(100, None, Some(MAX_PRICE + 1)),
            Err(PriceError { field: "recliner", value: MAX_PRICE + 1 })
        );

        let bad: Result<PriceTable, _> = serde_json::from_str(r#"{"regular":-5,"premium":null,"recliner":null}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn contains_checks_both_axes() {
        let g = ScreenGeometry::new(10, 10).unwrap();
        assert_eq!(g.capacity(), 100);
        assert!(g.contains(&SeatCoordinate::new("A", 1)));
        assert!(g.contains(&SeatCoordinate::new("J", 10)));
        assert!(!g.contains(&SeatCoordinate::new("K", 1)));
        assert!(!g.contains(&SeatCoordinate::new("A", 0)));
        assert!(!g.contains(&SeatCoordinate::new("A", 11)));
    }

    #[test]
    fn deserialize_validates() {
        let bad: Result<ScreenGeometry, _> = serde_json::from_str(r#"{"rows":0,"seats_per_row":5}"#);
        assert!(bad.is_err());
    }
}
