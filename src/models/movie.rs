use chrono::Duration;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub duration_minutes: i32,
}

impl Movie {
    pub fn runtime(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes.max(0)))
    }
}
