pub mod admin;
pub mod booking;
pub mod phone;
pub mod sync;
pub mod tickets;
