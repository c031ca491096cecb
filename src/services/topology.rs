//! Hall Topology Expander.
//!
//! Turns a hall seat map into the concrete, ordered list of seats the
//! finder scans. Expansion is total over any stored seat map; the venue
//! rules are checked separately by [`validate_layout`] when a hall is
//! written.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::LayoutError;
use crate::models::{Hall, Seat, SeatMap};

pub const COLUMN_GROUPS_PER_ROW: usize = 3;
pub const MIN_SEATS_PER_GROUP: u32 = 2;
pub const MAX_SEATS_PER_GROUP: u32 = 200;
pub const MAX_ROWS: usize = 500;

/// Rows in ascending order, column groups in declaration order, seats 1..=count.
pub fn expand(hall_id: i64, seat_map: &SeatMap) -> Vec<Seat> {
    let mut seats = Vec::with_capacity(seat_map.seat_count());
    for (row, groups) in seat_map.rows() {
        for (index, count) in groups.iter().enumerate() {
            let column = index as u32 + 1;
            seats.extend((1..=*count).map(|number| Seat {
                hall_id,
                row: row.get(),
                column,
                number,
            }));
        }
    }
    seats
}

pub fn validate_layout(seat_map: &SeatMap) -> Result<(), LayoutError> {
    if seat_map.is_empty() {
        return Err(LayoutError::EmptyLayout);
    }
    if seat_map.row_count() > MAX_ROWS {
        return Err(LayoutError::TooManyRows {
            max: MAX_ROWS,
            found: seat_map.row_count(),
        });
    }
    for (row, groups) in seat_map.rows() {
        if groups.len() != COLUMN_GROUPS_PER_ROW {
            return Err(LayoutError::WrongColumnGroupCount {
                row: row.get(),
                expected: COLUMN_GROUPS_PER_ROW,
                found: groups.len(),
            });
        }
        if let Some((index, count)) = groups
            .iter()
            .enumerate()
            .find(|(_, count)| **count < MIN_SEATS_PER_GROUP)
        {
            return Err(LayoutError::ColumnGroupTooSmall {
                row: row.get(),
                column: index as u32 + 1,
                min: MIN_SEATS_PER_GROUP,
                found: *count,
            });
        }
        if let Some((index, count)) = groups
            .iter()
            .enumerate()
            .find(|(_, count)| **count > MAX_SEATS_PER_GROUP)
        {
            return Err(LayoutError::ColumnGroupTooLarge {
                row: row.get(),
                column: index as u32 + 1,
                max: MAX_SEATS_PER_GROUP,
                found: *count,
            });
        }
    }
    Ok(())
}

struct Expanded {
    seat_map: SeatMap,
    seats: Arc<[Seat]>,
}

/// Per-hall cache of expanded seat lists.
///
/// Entries remember the seat map they were built from, so a hall edited
/// behind this process's back is re-expanded on the next lookup.
#[derive(Default)]
pub struct TopologyCache {
    halls: DashMap<i64, Expanded>,
}

impl TopologyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seats(&self, hall: &Hall) -> Arc<[Seat]> {
        if let Some(entry) = self.halls.get(&hall.id) {
            if entry.seat_map == hall.seat_map {
                return entry.seats.clone();
            }
        }

        let seats: Arc<[Seat]> = expand(hall.id, &hall.seat_map).into();
        debug!("Expanded hall {} into {} seats", hall.id, seats.len());
        self.halls.insert(
            hall.id,
            Expanded {
                seat_map: hall.seat_map.clone(),
                seats: seats.clone(),
            },
        );
        seats
    }

    pub fn invalidate(&self, hall_id: i64) {
        self.halls.remove(&hall_id);
    }
}
