pub mod alternatives;
pub mod booking;
pub mod finder;
pub mod halls;
pub mod shows;
pub mod timeparse;
pub mod topology;

pub use booking::{BookingRequest, BookingService};
pub use halls::{HallRequest, HallService};
pub use shows::{ShowRequest, ShowService};
pub use topology::TopologyCache;
