use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::topology::{validate_layout, TopologyCache};
use crate::error::BookingError;
use crate::models::{Hall, NewHall, RawSeatMap, Seat, SeatMap};
use crate::store::Store;

// Seat map is kept raw so a malformed row label surfaces as InvalidHallLayout
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HallRequest {
    pub name: String,
    pub theatre_id: i64,
    pub seat_map: RawSeatMap,
}

impl HallRequest {
    fn checked_seat_map(&self) -> Result<SeatMap, BookingError> {
        let seat_map = SeatMap::try_from(self.seat_map.clone())?;
        validate_layout(&seat_map)?;
        Ok(seat_map)
    }
}

/// Hall writes. Every write path validates the venue layout rules.
#[derive(Clone)]
pub struct HallService {
    store: Arc<dyn Store>,
    topology: Arc<TopologyCache>,
}

impl HallService {
    pub fn new(store: Arc<dyn Store>, topology: Arc<TopologyCache>) -> Self {
        Self { store, topology }
    }

    pub async fn create_hall(&self, request: HallRequest) -> Result<Hall, BookingError> {
        let seat_map = request.checked_seat_map()?;
        let hall = self
            .store
            .insert_hall(NewHall {
                name: request.name,
                theatre_id: request.theatre_id,
                seat_map,
            })
            .await?;
        info!(
            "Created hall {} with {} seats",
            hall.id,
            hall.seat_map.seat_count()
        );
        Ok(hall)
    }

    pub async fn update_hall(&self, hall_id: i64, request: HallRequest) -> Result<Hall, BookingError> {
        let seat_map = request.checked_seat_map()?;
        let hall = Hall {
            id: hall_id,
            name: request.name,
            theatre_id: request.theatre_id,
            seat_map,
        };
        if !self.store.update_hall(&hall).await? {
            return Err(BookingError::HallNotFound(hall_id));
        }
        self.topology.invalidate(hall_id);
        info!(
            "Updated hall {}, now {} seats",
            hall.id,
            hall.seat_map.seat_count()
        );
        Ok(hall)
    }

    pub async fn hall_seats(&self, hall_id: i64) -> Result<Vec<Seat>, BookingError> {
        let hall = self
            .store
            .hall(hall_id)
            .await?
            .ok_or(BookingError::HallNotFound(hall_id))?;
        Ok(self.topology.seats(&hall).to_vec())
    }
}
