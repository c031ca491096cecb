use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Seat identity inside a hall: (row, column group, number), all 1-based.
///
/// The derived ordering is the allocator's canonical order: row, then
/// column group, then number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatId {
    pub row: u32,
    pub column: u32,
    pub number: u32,
}

impl SeatId {
    pub const fn new(row: u32, column: u32, number: u32) -> Self {
        Self { row, column, number }
    }

    /// Same row, same column group, and `other` directly follows `self`.
    pub fn is_followed_by(&self, other: &SeatId) -> bool {
        self.row == other.row
            && self.column == other.column
            && self.number.checked_add(1) == Some(other.number)
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.row, self.column, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed seat id {0:?}, expected row-column-number")]
pub struct ParseSeatIdError(pub String);

impl FromStr for SeatId {
    type Err = ParseSeatIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-').map(|p| p.parse::<u32>().ok().filter(|v| *v > 0));
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Some(row)), Some(Some(column)), Some(Some(number)), None) => {
                Ok(SeatId::new(row, column, number))
            }
            _ => Err(ParseSeatIdError(s.to_string())),
        }
    }
}

// Seat ids travel as "row-column-number" strings in JSON
impl Serialize for SeatId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeatId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A concrete seat of a hall, produced by expanding the hall's seat map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub hall_id: i64,
    pub row: u32,
    pub column: u32,
    pub number: u32,
}

impl Seat {
    pub fn id(&self) -> SeatId {
        SeatId::new(self.row, self.column, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_id_string_form() {
        let id = SeatId::new(12, 3, 7);
        assert_eq!(id.to_string(), "12-3-7");
        assert_eq!("12-3-7".parse::<SeatId>(), Ok(id));
    }

    #[test]
    fn seat_id_rejects_garbage() {
        for raw in ["", "1-2", "1-2-3-4", "a-1-1", "0-1-1", "1--1"] {
            assert!(raw.parse::<SeatId>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn adjacency_stays_inside_column_group() {
        let a = SeatId::new(1, 1, 2);
        assert!(a.is_followed_by(&SeatId::new(1, 1, 3)));
        assert!(!a.is_followed_by(&SeatId::new(1, 2, 3)));
        assert!(!a.is_followed_by(&SeatId::new(2, 1, 3)));
        assert!(!a.is_followed_by(&SeatId::new(1, 1, 4)));
    }
}
