use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pricing class of a seat. Never stored per seat: always derived from the row
/// position through [`SeatTier::for_row`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatTier {
    Regular,
    Premium,
    Recliner,
}

impl SeatTier {
    /// Rows 1..=3 are premium, the last two rows are recliners, everything
    /// else is regular. Premium wins on screens too short to separate them.
    pub fn for_row(row_index: u32, total_rows: u32) -> Self {
        if row_index <= 3 {
            SeatTier::Premium
        } else if row_index + 2 > total_rows {
            SeatTier::Recliner
        } else {
            SeatTier::Regular
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatTier::Regular => "regular",
            SeatTier::Premium => "premium",
            SeatTier::Recliner => "recliner",
        }
    }
}

impl FromStr for SeatTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(SeatTier::Regular),
            "premium" => Ok(SeatTier::Premium),
            "recliner" => Ok(SeatTier::Recliner),
            other => Err(format!("unknown seat tier: {other}")),
        }
    }
}

/// Physical seat in a screen: row letter plus 1-based seat number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatCoordinate {
    pub row: String,
    pub seat_number: u32,
}

impl SeatCoordinate {
    pub fn new(row: impl Into<String>, seat_number: u32) -> Self {
        Self { row: row.into(), seat_number }
    }

    /// Label for the 1-based row index: 1 -> "A", 2 -> "B", ...
    pub fn row_label(row_index: u32) -> String {
        debug_assert!((1..=26).contains(&row_index));
        char::from(b'A' + (row_index - 1) as u8).to_string()
    }

    /// 1-based row index of the label, `None` if it is not a single A-Z letter.
    pub fn row_index(&self) -> Option<u32> {
        match self.row.as_bytes() {
            [b] if b.is_ascii_uppercase() => Some(u32::from(b - b'A') + 1),
            _ => None,
        }
    }

    /// Identity key inside a show's occupancy set, e.g. "A1".
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SeatCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.seat_number)
    }
}

impl FromStr for SeatCoordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| format!("seat '{s}' has no seat number"))?;
        let (row, number) = s.split_at(split);
        if row.is_empty() {
            return Err(format!("seat '{s}' has no row label"));
        }
        let seat_number = number
            .parse::<u32>()
            .map_err(|_| format!("seat '{s}' has an invalid seat number"))?;
        Ok(SeatCoordinate::new(row, seat_number))
    }
}

/// Seat as stored on a booking: coordinate plus the tier and price resolved
/// at booking time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSeat {
    pub row: String,
    pub seat_number: u32,
    pub tier: SeatTier,
    pub price: i64,
}

impl BookedSeat {
    pub fn coordinate(&self) -> SeatCoordinate {
        SeatCoordinate::new(self.row.clone(), self.seat_number)
    }
}
