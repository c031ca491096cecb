//! Alternative Show Search.
//!
//! When the requested show cannot seat the party together, look at every
//! show starting on the same UTC calendar day, in any hall, and keep the
//! ones where a block of the same size is still free.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use super::booking::BookingService;
use super::timeparse::{parse_request_time, utc_day};
use crate::error::BookingError;
use crate::models::Show;

impl BookingService {
    /// String-time entry point used by the HTTP boundary.
    pub async fn find_alternative_shows(&self, time: &str, num_seats: usize) -> Result<Vec<Show>, BookingError> {
        self.check_party_size(num_seats)?;
        let reference = parse_request_time(time)?;
        self.alternatives_for(reference, num_seats).await
    }

    /// Shows on the day of `reference` that can still seat `num_seats`
    /// together, in the order the store lists them. No ranking.
    ///
    /// A candidate whose hall record is gone is skipped; any other storage
    /// failure aborts the search.
    pub async fn alternatives_for(&self, reference: DateTime<Utc>, num_seats: usize) -> Result<Vec<Show>, BookingError> {
        let (from, to) = utc_day(reference)?;
        let candidates = self.store.shows_starting_between(from, to).await?;

        let checks = join_all(
            candidates
                .iter()
                .map(|show| self.find_free_block(show, num_seats)),
        )
        .await;

        let mut alternatives = Vec::new();
        for (show, check) in candidates.iter().zip(checks) {
            match check {
                Ok(Some(_)) => alternatives.push(show.clone()),
                Ok(None) => {}
                Err(BookingError::HallNotFound(hall_id)) => {
                    warn!("Skipping show {}: hall {} not found", show.id, hall_id);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Alternative search for {} seats on {}: {} of {} shows qualify",
            num_seats,
            from.date_naive(),
            alternatives.len(),
            candidates.len()
        );
        Ok(alternatives)
    }
}
