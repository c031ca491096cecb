use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{ScheduleTransaction, SeatTransaction, Store};
use crate::error::{ClaimError, StoreError};
use crate::models::{Booking, Hall, Movie, NewHall, NewShow, SeatId, Show};

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    movies: BTreeMap<i64, Movie>,
    halls: BTreeMap<i64, Hall>,
    shows: BTreeMap<i64, Show>,
    bookings: Vec<Booking>,
    // (show, seat) -> booking; the key is the uniqueness constraint
    claims: HashMap<(i64, SeatId), Uuid>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn new_show(&mut self, show: NewShow) -> Show {
        Show {
            id: self.next_id(),
            movie_id: show.movie_id,
            hall_id: show.hall_id,
            starts_at: show.starts_at,
            price: show.price,
        }
    }

    fn claimed_for(&self, show_id: i64) -> HashSet<SeatId> {
        self.claims
            .keys()
            .filter(|(show, _)| *show == show_id)
            .map(|(_, seat)| *seat)
            .collect()
    }
}

/// In-process store with the same transactional contract as [`PgStore`](super::PgStore).
///
/// A transaction holds the table lock from `begin` until commit or drop, so
/// readers see either the state before a booking or the state after it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Movies are owned by the catalog service; this is the in-memory stand-in.
    pub async fn insert_movie(&self, title: impl Into<String>, duration_minutes: i32) -> Movie {
        let mut tables = self.tables.lock().await;
        let movie = Movie {
            id: tables.next_id(),
            title: title.into(),
            duration_minutes,
        };
        tables.movies.insert(movie.id, movie.clone());
        movie
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>, StoreError> {
        Ok(self.tables.lock().await.movies.get(&movie_id).cloned())
    }

    async fn hall(&self, hall_id: i64) -> Result<Option<Hall>, StoreError> {
        Ok(self.tables.lock().await.halls.get(&hall_id).cloned())
    }

    async fn insert_hall(&self, hall: NewHall) -> Result<Hall, StoreError> {
        let mut tables = self.tables.lock().await;
        let hall = Hall {
            id: tables.next_id(),
            name: hall.name,
            theatre_id: hall.theatre_id,
            seat_map: hall.seat_map,
        };
        tables.halls.insert(hall.id, hall.clone());
        Ok(hall)
    }

    async fn update_hall(&self, hall: &Hall) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.halls.get_mut(&hall.id) {
            Some(existing) => {
                *existing = hall.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_show(&self, show: NewShow) -> Result<Show, StoreError> {
        let mut tables = self.tables.lock().await;
        let show = tables.new_show(show);
        tables.shows.insert(show.id, show.clone());
        Ok(show)
    }

    async fn begin_schedule(&self, hall_id: i64) -> Result<Option<Box<dyn ScheduleTransaction>>, StoreError> {
        let tables = self.tables.clone().lock_owned().await;
        if !tables.halls.contains_key(&hall_id) {
            return Ok(None);
        }
        Ok(Some(Box::new(MemorySchedule {
            tables,
            hall_id,
            staged: Vec::new(),
        })))
    }

    async fn find_show(
        &self,
        movie_id: i64,
        hall_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Show>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .shows
            .values()
            .find(|show| {
                show.movie_id == movie_id
                    && show.hall_id == hall_id
                    && show.starts_at >= from
                    && show.starts_at < to
            })
            .cloned())
    }

    async fn shows_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Show>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .shows
            .values()
            .filter(|show| show.starts_at >= from && show.starts_at < to)
            .cloned()
            .collect())
    }

    async fn booked_seats(&self, show_id: i64) -> Result<HashSet<SeatId>, StoreError> {
        Ok(self.tables.lock().await.claimed_for(show_id))
    }

    async fn bookings_for_show(&self, show_id: i64) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|booking| booking.show_id == show_id)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn SeatTransaction>, StoreError> {
        let tables = self.tables.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            tables,
            claims: Vec::new(),
            bookings: Vec::new(),
        }))
    }
}

struct MemoryTransaction {
    tables: OwnedMutexGuard<Tables>,
    claims: Vec<(i64, SeatId, Uuid)>,
    bookings: Vec<Booking>,
}

impl MemoryTransaction {
    fn is_claimed(&self, show_id: i64, seat: SeatId) -> bool {
        self.tables.claims.contains_key(&(show_id, seat))
            || self
                .claims
                .iter()
                .any(|(show, staged, _)| *show == show_id && *staged == seat)
    }
}

#[async_trait]
impl SeatTransaction for MemoryTransaction {
    async fn booked_seats(&mut self, show_id: i64) -> Result<HashSet<SeatId>, StoreError> {
        let mut seats = self.tables.claimed_for(show_id);
        seats.extend(
            self.claims
                .iter()
                .filter(|(show, _, _)| *show == show_id)
                .map(|(_, seat, _)| *seat),
        );
        Ok(seats)
    }

    async fn claim_seat(
        &mut self,
        show_id: i64,
        booking_id: Uuid,
        _position: usize,
        seat: SeatId,
    ) -> Result<(), ClaimError> {
        if self.is_claimed(show_id, seat) {
            return Err(ClaimError::Duplicate(seat));
        }
        self.claims.push((show_id, seat, booking_id));
        Ok(())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), StoreError> {
        self.bookings.push(booking.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction {
            mut tables,
            claims,
            bookings,
        } = *self;
        for (show_id, seat, booking_id) in claims {
            tables.claims.insert((show_id, seat), booking_id);
        }
        tables.bookings.extend(bookings);
        Ok(())
    }
}

struct MemorySchedule {
    tables: OwnedMutexGuard<Tables>,
    hall_id: i64,
    staged: Vec<Show>,
}

#[async_trait]
impl ScheduleTransaction for MemorySchedule {
    async fn movie(&mut self, movie_id: i64) -> Result<Option<Movie>, StoreError> {
        Ok(self.tables.movies.get(&movie_id).cloned())
    }

    async fn shows_in_hall(&mut self) -> Result<Vec<Show>, StoreError> {
        Ok(self
            .tables
            .shows
            .values()
            .chain(self.staged.iter())
            .filter(|show| show.hall_id == self.hall_id)
            .cloned()
            .collect())
    }

    async fn insert_show(&mut self, show: NewShow) -> Result<Show, StoreError> {
        let show = self.tables.new_show(show);
        self.staged.push(show.clone());
        Ok(show)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemorySchedule {
            mut tables, staged, ..
        } = *self;
        for show in staged {
            tables.shows.insert(show.id, show);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let store = MemoryStore::new();
        let booking = Booking::new(7, vec![SeatId::new(1, 1, 1)]);

        let mut tx = store.begin().await.unwrap();
        tx.claim_seat(7, booking.id, 0, SeatId::new(1, 1, 1)).await.unwrap();
        tx.insert_booking(&booking).await.unwrap();
        drop(tx);

        assert!(store.booked_seats(7).await.unwrap().is_empty());
        assert!(store.bookings_for_show(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_claim_is_rejected_inside_one_transaction() {
        let store = MemoryStore::new();
        let seat = SeatId::new(2, 1, 1);
        let mut tx = store.begin().await.unwrap();
        tx.claim_seat(1, Uuid::new_v4(), 0, seat).await.unwrap();
        let err = tx.claim_seat(1, Uuid::new_v4(), 1, seat).await.unwrap_err();
        assert!(matches!(err, ClaimError::Duplicate(s) if s == seat));
    }

    #[tokio::test]
    async fn dropped_schedule_discards_staged_shows() {
        let store = MemoryStore::new();
        assert!(store.begin_schedule(1).await.unwrap().is_none());

        let hall = store
            .insert_hall(NewHall {
                name: "Hall".into(),
                theatre_id: 1,
                seat_map: Default::default(),
            })
            .await
            .unwrap();
        let mut tx = store.begin_schedule(hall.id).await.unwrap().unwrap();
        tx.insert_show(NewShow {
            movie_id: 1,
            hall_id: hall.id,
            starts_at: Utc::now(),
            price: 0.0,
        })
        .await
        .unwrap();
        assert_eq!(tx.shows_in_hall().await.unwrap().len(), 1);
        drop(tx);

        let mut tx = store.begin_schedule(hall.id).await.unwrap().unwrap();
        assert!(tx.shows_in_hall().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn claims_are_scoped_per_show() {
        let store = MemoryStore::new();
        let seat = SeatId::new(1, 1, 1);
        for show_id in [1, 2] {
            let booking = Booking::new(show_id, vec![seat]);
            let mut tx = store.begin().await.unwrap();
            tx.claim_seat(show_id, booking.id, 0, seat).await.unwrap();
            tx.insert_booking(&booking).await.unwrap();
            tx.commit().await.unwrap();
        }
        assert!(store.booked_seats(1).await.unwrap().contains(&seat));
        assert!(store.booked_seats(2).await.unwrap().contains(&seat));
    }
}
