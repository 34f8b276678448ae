pub mod booking;
pub mod inventory;
pub mod layout;
pub mod pricing;
