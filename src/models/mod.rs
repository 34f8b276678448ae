pub mod booking;
pub mod seat;
pub mod show;
pub mod user;

pub use booking::{Booking, BookingId, BookingStatus, PaymentStatus};
pub use seat::{BookedSeat, SeatCoordinate, SeatTier};
pub use show::{PriceError, PriceTable, ScreenGeometry, Show, ShowId};
pub use user::{User, UserId};
