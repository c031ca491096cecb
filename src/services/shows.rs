use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::timeparse::{parse_request_time, shifted};
use crate::error::BookingError;
use crate::models::{NewShow, Show};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowRequest {
    pub movie_id: i64,
    pub hall_id: i64,
    pub starts_at: String,
    pub price: f64,
}

/// Show scheduling. Two shows in one hall may not overlap, where a show
/// occupies `[starts_at, starts_at + movie runtime)`.
#[derive(Clone)]
pub struct ShowService {
    store: Arc<dyn Store>,
}

impl ShowService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn schedule_show(&self, request: ShowRequest) -> Result<Show, BookingError> {
        let starts_at = parse_request_time(&request.starts_at)?;
        let movie = self
            .store
            .movie(request.movie_id)
            .await?
            .ok_or(BookingError::MovieNotFound(request.movie_id))?;
        let ends_at = shifted(starts_at, movie.runtime())?;

        // Held until commit or drop; concurrent schedulers of this hall wait here
        let mut tx = self
            .store
            .begin_schedule(request.hall_id)
            .await?
            .ok_or(BookingError::HallNotFound(request.hall_id))?;

        for existing in tx.shows_in_hall().await? {
            let Some(existing_movie) = tx.movie(existing.movie_id).await? else {
                warn!(
                    "Show {} refers to missing movie {}, ignoring it for overlap checks",
                    existing.id, existing.movie_id
                );
                continue;
            };
            let existing_end = existing
                .ends_at(existing_movie.runtime())
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            if starts_at < existing_end && ends_at > existing.starts_at {
                return Err(BookingError::ShowOverlap {
                    existing: existing.id,
                });
            }
        }

        let show = tx
            .insert_show(NewShow {
                movie_id: request.movie_id,
                hall_id: request.hall_id,
                starts_at,
                price: request.price,
            })
            .await?;
        tx.commit().await?;

        info!(
            "Scheduled show {} of movie {} in hall {} at {}",
            show.id, show.movie_id, show.hall_id, show.starts_at
        );
        Ok(show)
    }
}
