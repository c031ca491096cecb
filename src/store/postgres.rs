use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgExecutor, PgPool, Postgres, Transaction};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use super::{ScheduleTransaction, SeatTransaction, Store};
use crate::cache::CacheService;
use crate::config::DatabaseConfig;
use crate::error::{ClaimError, StoreError};
use crate::models::{Booking, Hall, Movie, NewHall, NewShow, SeatId, SeatMap, Show};

const SHOW_COLUMNS: &str = "id, movie_id, hall_id, starts_at, price::FLOAT8 AS price";

#[derive(FromRow)]
struct HallRow {
    id: i64,
    name: String,
    theatre_id: i64,
    seat_map: Json<SeatMap>,
    version: i64,
}

impl From<HallRow> for Hall {
    fn from(row: HallRow) -> Self {
        Hall {
            id: row.id,
            name: row.name,
            theatre_id: row.theatre_id,
            seat_map: row.seat_map.0,
        }
    }
}

async fn fetch_movie<'e>(executor: impl PgExecutor<'e>, movie_id: i64) -> Result<Option<Movie>, StoreError> {
    let movie = sqlx::query_as::<_, Movie>("SELECT id, title, duration_minutes FROM movies WHERE id = $1")
        .bind(movie_id)
        .fetch_optional(executor)
        .await?;
    Ok(movie)
}

async fn insert_show_row<'e>(executor: impl PgExecutor<'e>, show: NewShow) -> Result<Show, StoreError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO shows (movie_id, hall_id, starts_at, price)
         VALUES ($1, $2, $3, $4::FLOAT8::NUMERIC)
         RETURNING id",
    )
    .bind(show.movie_id)
    .bind(show.hall_id)
    .bind(show.starts_at)
    .bind(show.price)
    .fetch_one(executor)
    .await?;

    Ok(Show {
        id,
        movie_id: show.movie_id,
        hall_id: show.hall_id,
        starts_at: show.starts_at,
        price: show.price,
    })
}

fn seat_from_columns(row: i64, column: i64, number: i64) -> Result<SeatId, StoreError> {
    let part = |value: i64| {
        u32::try_from(value).map_err(|_| StoreError::Corrupt {
            table: "booked_seats",
            detail: format!("seat coordinate {} out of range", value),
        })
    };
    Ok(SeatId::new(part(row)?, part(column)?, part(number)?))
}

/// Postgres-backed store. Hall reads go through the Redis cache when one is
/// configured.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    cache: Option<CacheService>,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig, cache: Option<CacheService>) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;
        Ok(Self { pool, cache })
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Migrations completed");
        Ok(())
    }

    async fn load_hall(&self, hall_id: i64) -> Result<Option<(Hall, i64)>, StoreError> {
        let row = sqlx::query_as::<_, HallRow>(
            "SELECT id, name, theatre_id, seat_map, version FROM halls WHERE id = $1",
        )
        .bind(hall_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| {
            let version = row.version;
            (Hall::from(row), version)
        }))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>, StoreError> {
        fetch_movie(&self.pool, movie_id).await
    }

    async fn hall(&self, hall_id: i64) -> Result<Option<Hall>, StoreError> {
        if let Some(cache) = &self.cache {
            if let Some(hall) = cache.get_hall(hall_id).await {
                return Ok(Some(hall));
            }
        }

        let Some((hall, version)) = self.load_hall(hall_id).await? else {
            return Ok(None);
        };
        if let Some(cache) = &self.cache {
            cache.save_hall(&hall, version).await;
        }
        Ok(Some(hall))
    }

    async fn insert_hall(&self, hall: NewHall) -> Result<Hall, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO halls (name, theatre_id, seat_map)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(&hall.name)
        .bind(hall.theatre_id)
        .bind(Json(&hall.seat_map))
        .fetch_one(&self.pool)
        .await?;

        Ok(Hall {
            id,
            name: hall.name,
            theatre_id: hall.theatre_id,
            seat_map: hall.seat_map,
        })
    }

    async fn update_hall(&self, hall: &Hall) -> Result<bool, StoreError> {
        let version = sqlx::query_scalar::<_, i64>(
            "UPDATE halls SET name = $1, theatre_id = $2, seat_map = $3, version = version + 1
             WHERE id = $4
             RETURNING version",
        )
        .bind(&hall.name)
        .bind(hall.theatre_id)
        .bind(Json(&hall.seat_map))
        .bind(hall.id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(version) = version else {
            return Ok(false);
        };
        if let Some(cache) = &self.cache {
            cache.invalidate_hall(hall.id, version).await;
        }
        Ok(true)
    }

    async fn insert_show(&self, show: NewShow) -> Result<Show, StoreError> {
        insert_show_row(&self.pool, show).await
    }

    async fn begin_schedule(&self, hall_id: i64) -> Result<Option<Box<dyn ScheduleTransaction>>, StoreError> {
        let mut tx = self.pool.begin().await?;
        // Row lock on the hall serializes schedulers of the same hall
        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM halls WHERE id = $1 FOR UPDATE")
            .bind(hall_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }
        Ok(Some(Box::new(PgSchedule { tx, hall_id })))
    }

    async fn find_show(
        &self,
        movie_id: i64,
        hall_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Show>, StoreError> {
        let show = sqlx::query_as::<_, Show>(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows
             WHERE movie_id = $1 AND hall_id = $2 AND starts_at >= $3 AND starts_at < $4
             ORDER BY id
             LIMIT 1"
        ))
        .bind(movie_id)
        .bind(hall_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;
        Ok(show)
    }

    async fn shows_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Show>, StoreError> {
        let shows = sqlx::query_as::<_, Show>(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows
             WHERE starts_at >= $1 AND starts_at < $2
             ORDER BY id"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(shows)
    }

    async fn booked_seats(&self, show_id: i64) -> Result<HashSet<SeatId>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT seat_row, seat_column, seat_number FROM booked_seats WHERE show_id = $1",
        )
        .bind(show_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(row, column, number)| seat_from_columns(row, column, number))
            .collect()
    }

    async fn bookings_for_show(&self, show_id: i64) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, DateTime<Utc>, i64, i64, i64)>(
            r#"
            SELECT b.id, b.created_at, s.seat_row, s.seat_column, s.seat_number
            FROM bookings b
            JOIN booked_seats s ON s.booking_id = b.id
            WHERE b.show_id = $1
            ORDER BY b.created_at, b.id, s.position
            "#,
        )
        .bind(show_id)
        .fetch_all(&self.pool)
        .await?;

        // rows arrive grouped by booking, seats already in booking order
        let mut bookings: Vec<Booking> = Vec::new();
        for (id, created_at, row, column, number) in rows {
            let seat = seat_from_columns(row, column, number)?;
            match bookings.last_mut() {
                Some(last) if last.id == id => last.seat_ids.push(seat),
                _ => bookings.push(Booking {
                    id,
                    show_id,
                    seat_ids: vec![seat],
                    created_at,
                }),
            }
        }
        Ok(bookings)
    }

    async fn begin(&self) -> Result<Box<dyn SeatTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SeatTransaction for PgTransaction {
    async fn booked_seats(&mut self, show_id: i64) -> Result<HashSet<SeatId>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT seat_row, seat_column, seat_number FROM booked_seats WHERE show_id = $1",
        )
        .bind(show_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|(row, column, number)| seat_from_columns(row, column, number))
            .collect()
    }

    async fn claim_seat(
        &mut self,
        show_id: i64,
        booking_id: Uuid,
        position: usize,
        seat: SeatId,
    ) -> Result<(), ClaimError> {
        let position = i32::try_from(position).map_err(|_| StoreError::Corrupt {
            table: "booked_seats",
            detail: format!("seat position {} out of range", position),
        })?;

        let result = sqlx::query(
            "INSERT INTO booked_seats (show_id, seat_row, seat_column, seat_number, booking_id, position)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(show_id)
        .bind(i64::from(seat.row))
        .bind(i64::from(seat.column))
        .bind(i64::from(seat.number))
        .bind(booking_id)
        .bind(position)
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(ClaimError::Duplicate(seat))
            }
            Err(e) => Err(ClaimError::Store(e.into())),
        }
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO bookings (id, show_id, created_at) VALUES ($1, $2, $3)")
            .bind(booking.id)
            .bind(booking.show_id)
            .bind(booking.created_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

struct PgSchedule {
    tx: Transaction<'static, Postgres>,
    hall_id: i64,
}

#[async_trait]
impl ScheduleTransaction for PgSchedule {
    async fn movie(&mut self, movie_id: i64) -> Result<Option<Movie>, StoreError> {
        fetch_movie(&mut *self.tx, movie_id).await
    }

    async fn shows_in_hall(&mut self) -> Result<Vec<Show>, StoreError> {
        let shows = sqlx::query_as::<_, Show>(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows WHERE hall_id = $1 ORDER BY id"
        ))
        .bind(self.hall_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(shows)
    }

    async fn insert_show(&mut self, show: NewShow) -> Result<Show, StoreError> {
        insert_show_row(&mut *self.tx, show).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
