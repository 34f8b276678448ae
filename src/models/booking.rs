use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::seat::{BookedSeat, SeatCoordinate};
use super::show::ShowId;
use super::user::UserId;

pub type BookingId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(PaymentStatus::Completed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub reference: String,
    pub user_id: UserId,
    pub show_id: ShowId,
    pub seats: Vec<BookedSeat>,
    pub total_amount: i64,
    /// Copied from the show when the booking is made.
    pub show_starts_at: NaiveDateTime,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub booked_at: NaiveDateTime,
}

impl Booking {
    pub fn confirmed(
        reference: String,
        user_id: UserId,
        show_id: ShowId,
        seats: Vec<BookedSeat>,
        show_starts_at: NaiveDateTime,
        booked_at: NaiveDateTime,
    ) -> Self {
        let total_amount = seats.iter().map(|s| s.price).sum();
        Self {
            id: Uuid::new_v4(),
            reference,
            user_id,
            show_id,
            seats,
            total_amount,
            show_starts_at,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Completed,
            booked_at,
        }
    }

    pub fn coordinates(&self) -> Vec<SeatCoordinate> {
        self.seats.iter().map(BookedSeat::coordinate).collect()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// The only transition a booking has.
    pub fn mark_cancelled(&mut self) {
        self.status = BookingStatus::Cancelled;
        self.payment_status = PaymentStatus::Refunded;
    }
}

/// Booking references look like `MB` + 12 upper-case hex digits.
pub fn generate_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("MB{}", id[..12].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seat::SeatTier;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn total_is_sum_of_seat_prices() {
        let seats = vec![
            BookedSeat { row: "A".into(), seat_number: 1, tier: SeatTier::Premium, price: 225 },
            BookedSeat { row: "E".into(), seat_number: 4, tier: SeatTier::Regular, price: 150 },
        ];
        let booking = Booking::confirmed(generate_reference(), 1, 7, seats, at(20), at(10));
        assert_eq!(booking.total_amount, 375);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, PaymentStatus::Completed);
        assert_eq!(booking.coordinates(), vec![SeatCoordinate::new("A", 1), SeatCoordinate::new("E", 4)]);
    }

    #[test]
    fn cancel_sets_refunded() {
        let mut booking = Booking::confirmed(generate_reference(), 1, 7, vec![], at(20), at(10));
        booking.mark_cancelled();
        assert!(booking.is_cancelled());
        assert_eq!(booking.payment_status, PaymentStatus::Refunded);
    }

    #[test]
    fn references_are_ascii_and_distinct() {
        let a = generate_reference();
        let b = generate_reference();
        assert!(a.starts_with("MB"));
        assert_eq!(a.len(), 14);
        assert!(a.is_ascii());
        assert_ne!(a, b);
    }

    #[test]
    fn status_round_trip_through_text() {
        assert_eq!("cancelled".parse::<BookingStatus>(), Ok(BookingStatus::Cancelled));
        assert_eq!(PaymentStatus::Refunded.as_str(), "refunded");
        assert!("pending".parse::<BookingStatus>().is_err());
    }
}
