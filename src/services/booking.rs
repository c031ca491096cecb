//! booking.rs
//!
//! Seat booking for a single show:
//! 1.  **Availability index**: the seats already held by committed bookings
//!     of a show, read straight from the store.
//! 2.  **Committer**: claims a block of seats inside one store transaction.
//!     The (show, seat) uniqueness of the claim records decides which of
//!     several concurrent requests wins; the loser gets `SeatAlreadyBooked`
//!     and nothing it tried to claim survives.
//! 3.  **CreateBooking**: resolve the show, find a block, commit it.

use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::finder::find_block;
use super::timeparse::{minute_window, parse_request_time};
use super::topology::TopologyCache;
use crate::config::BookingConfig;
use crate::error::{BookingError, ClaimError};
use crate::models::{Booking, Seat, SeatId, Show};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub movie_id: i64,
    pub hall_id: i64,
    pub time: String,
    pub num_seats: usize,
}

#[derive(Clone)]
pub struct BookingService {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) topology: Arc<TopologyCache>,
    commit_timeout: Duration,
    max_party_size: usize,
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>, topology: Arc<TopologyCache>, config: &BookingConfig) -> Self {
        Self {
            store,
            topology,
            commit_timeout: config.commit_timeout,
            max_party_size: config.max_party_size,
        }
    }

    /// Find the first free block of `num_seats` for the show at the requested
    /// time and book it. Does not retry on `SeatAlreadyBooked`.
    pub async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, BookingError> {
        self.check_party_size(request.num_seats)?;
        let time = parse_request_time(&request.time)?;
        let show = self
            .resolve_show(request.movie_id, request.hall_id, time)
            .await?
            .ok_or_else(|| BookingError::ShowNotFound {
                movie_id: request.movie_id,
                hall_id: request.hall_id,
                time: time.to_rfc3339(),
            })?;

        let block = self
            .find_free_block(&show, request.num_seats)
            .await?
            .ok_or_else(|| {
                info!(
                    "No block of {} seats left for show {}",
                    request.num_seats, show.id
                );
                BookingError::NoContiguousSeats
            })?;

        let seat_ids = block.iter().map(Seat::id).collect();
        self.commit(show.id, seat_ids).await
    }

    pub async fn bookings_for_show(&self, show_id: i64) -> Result<Vec<Booking>, BookingError> {
        Ok(self.store.bookings_for_show(show_id).await?)
    }

    /// Seats held by committed bookings of the show. May be stale by the time
    /// it is used; [`commit`](Self::commit) re-checks inside its transaction.
    pub async fn booked_seats(&self, show_id: i64) -> Result<HashSet<SeatId>, BookingError> {
        Ok(self.store.booked_seats(show_id).await?)
    }

    /// Claim `seats` for the show atomically, under the configured deadline.
    /// On timeout the transaction is dropped, which rolls it back.
    pub async fn commit(&self, show_id: i64, seats: Vec<SeatId>) -> Result<Booking, BookingError> {
        self.check_party_size(seats.len())?;
        match tokio::time::timeout(self.commit_timeout, self.commit_in_transaction(show_id, seats)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Booking commit for show {} timed out", show_id);
                Err(BookingError::CommitTimeout(self.commit_timeout))
            }
        }
    }

    async fn commit_in_transaction(&self, show_id: i64, seats: Vec<SeatId>) -> Result<Booking, BookingError> {
        let mut tx = self.store.begin().await?;

        // The finder worked on a snapshot; look again from inside the transaction
        let current = tx.booked_seats(show_id).await?;
        if let Some(seat) = seats.iter().find(|seat| current.contains(seat)) {
            warn!("Seat {} of show {} was taken before commit", seat, show_id);
            return Err(BookingError::SeatAlreadyBooked { seat: *seat });
        }

        let booking = Booking::new(show_id, seats);
        for (position, seat) in booking.seat_ids.iter().enumerate() {
            match tx.claim_seat(show_id, booking.id, position, *seat).await {
                Ok(()) => {}
                Err(ClaimError::Duplicate(seat)) => {
                    warn!("Lost seat {} of show {} to a concurrent booking", seat, show_id);
                    return Err(BookingError::SeatAlreadyBooked { seat });
                }
                Err(ClaimError::Store(e)) => return Err(e.into()),
            }
        }

        tx.insert_booking(&booking).await?;
        tx.commit().await?;

        info!(
            "Booking {} committed for show {}: {} seats",
            booking.id,
            show_id,
            booking.seat_ids.len()
        );
        Ok(booking)
    }

    pub(crate) async fn resolve_show(
        &self,
        movie_id: i64,
        hall_id: i64,
        time: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<Show>, BookingError> {
        let (from, to) = minute_window(time)?;
        Ok(self.store.find_show(movie_id, hall_id, from, to).await?)
    }

    /// Expanded topology of the hall, through the per-hall cache.
    pub(crate) async fn hall_seats(&self, hall_id: i64) -> Result<Arc<[Seat]>, BookingError> {
        let hall = self
            .store
            .hall(hall_id)
            .await?
            .ok_or(BookingError::HallNotFound(hall_id))?;
        Ok(self.topology.seats(&hall))
    }

    pub(crate) async fn find_free_block(&self, show: &Show, num_seats: usize) -> Result<Option<Vec<Seat>>, BookingError> {
        let seats = self.hall_seats(show.hall_id).await?;
        let booked = self.booked_seats(show.id).await?;
        Ok(find_block(&seats, &booked, num_seats))
    }

    pub(crate) fn check_party_size(&self, requested: usize) -> Result<(), BookingError> {
        if requested == 0 || requested > self.max_party_size {
            return Err(BookingError::InvalidSeatCount {
                requested,
                max: self.max_party_size,
            });
        }
        Ok(())
    }
}
