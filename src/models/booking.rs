use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SeatId;

/// A committed reservation: an ordered set of seats bound to one show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub show_id: i64,
    pub seat_ids: Vec<SeatId>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(show_id: i64, seat_ids: Vec<SeatId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            show_id,
            seat_ids,
            created_at: Utc::now(),
        }
    }
}
