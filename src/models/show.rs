use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: i64,
    pub movie_id: i64,
    pub hall_id: i64,
    pub starts_at: DateTime<Utc>,
    pub price: f64,
}

impl Show {
    /// `None` when the end falls past the last representable instant.
    pub fn ends_at(&self, runtime: Duration) -> Option<DateTime<Utc>> {
        self.starts_at.checked_add_signed(runtime)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewShow {
    pub movie_id: i64,
    pub hall_id: i64,
    pub starts_at: DateTime<Utc>,
    pub price: f64,
}
