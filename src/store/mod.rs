//! Storage contract for the allocator.
//!
//! The store is the only mutable shared resource. Everything that claims
//! seats goes through a [`SeatTransaction`]; the uniqueness of the
//! (show, seat) claim is what decides which concurrent booking wins.
//! Show scheduling goes through a [`ScheduleTransaction`], which holds the
//! hall so overlap checks and inserts cannot interleave.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{ClaimError, StoreError};
use crate::models::{Booking, Hall, Movie, NewHall, NewShow, SeatId, Show};

#[async_trait]
pub trait Store: Send + Sync {
    /* ---------- catalog ---------- */

    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>, StoreError>;

    async fn hall(&self, hall_id: i64) -> Result<Option<Hall>, StoreError>;

    async fn insert_hall(&self, hall: NewHall) -> Result<Hall, StoreError>;

    /// Returns `false` when no hall with that id exists.
    async fn update_hall(&self, hall: &Hall) -> Result<bool, StoreError>;

    /// Plain insert, no scheduling rules. Scheduling goes through
    /// [`begin_schedule`](Store::begin_schedule).
    async fn insert_show(&self, show: NewShow) -> Result<Show, StoreError>;

    /// Lock the hall's schedule until the returned transaction commits or is
    /// dropped. `None` when the hall does not exist.
    async fn begin_schedule(&self, hall_id: i64) -> Result<Option<Box<dyn ScheduleTransaction>>, StoreError>;

    /// First show (storage order) of `movie_id` in `hall_id` starting in `[from, to)`.
    async fn find_show(
        &self,
        movie_id: i64,
        hall_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Show>, StoreError>;

    /// Every show starting in `[from, to)` across all halls, in storage order.
    async fn shows_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Show>, StoreError>;

    /* ---------- seats and bookings ---------- */

    /// Seats held by committed bookings of the show.
    async fn booked_seats(&self, show_id: i64) -> Result<HashSet<SeatId>, StoreError>;

    /// Committed bookings of the show, oldest first, seats in booking order.
    async fn bookings_for_show(&self, show_id: i64) -> Result<Vec<Booking>, StoreError>;

    async fn begin(&self) -> Result<Box<dyn SeatTransaction>, StoreError>;
}

/// An open transaction against the store. Dropping it without calling
/// [`commit`](SeatTransaction::commit) rolls everything back.
#[async_trait]
pub trait SeatTransaction: Send {
    /// Seats claimed for the show as seen from inside this transaction.
    async fn booked_seats(&mut self, show_id: i64) -> Result<HashSet<SeatId>, StoreError>;

    /// Insert the (show, seat) reservation record. Fails with
    /// [`ClaimError::Duplicate`] when the seat is already claimed.
    async fn claim_seat(
        &mut self,
        show_id: i64,
        booking_id: Uuid,
        position: usize,
        seat: SeatId,
    ) -> Result<(), ClaimError>;

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Schedule changes for one locked hall. Dropping it without calling
/// [`commit`](ScheduleTransaction::commit) discards the staged shows.
#[async_trait]
pub trait ScheduleTransaction: Send {
    async fn movie(&mut self, movie_id: i64) -> Result<Option<Movie>, StoreError>;

    /// Shows of the locked hall, including ones staged in this transaction.
    async fn shows_in_hall(&mut self) -> Result<Vec<Show>, StoreError>;

    async fn insert_show(&mut self, show: NewShow) -> Result<Show, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
