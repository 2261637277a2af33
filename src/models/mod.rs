pub mod user;
pub mod event;
pub mod seat;
pub mod booking;

pub use user::{User, UserAttributes};
pub use event::{Event, EventAttributes};
pub use seat::{SeatCategory, SeatLayout};
pub use booking::{Booking, BookingAttributes};
