pub mod booking;
pub mod hall;
pub mod movie;
pub mod seat;
pub mod show;

pub use booking::Booking;
pub use hall::{Hall, NewHall, RawSeatMap, RowLabel, SeatMap};
pub use movie::Movie;
pub use seat::{Seat, SeatId};
pub use show::{NewShow, Show};
