use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

use crate::error::LayoutError;

/// Row label of a seat map. Serialized as text ("1", "2", ...), but always a
/// positive integer once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowLabel(NonZeroU32);

impl RowLabel {
    pub fn new(row: u32) -> Option<Self> {
        NonZeroU32::new(row).map(RowLabel)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn parse(label: &str) -> Result<Self, LayoutError> {
        label
            .trim()
            .parse::<NonZeroU32>()
            .map(RowLabel)
            .map_err(|_| LayoutError::InvalidRowLabel {
                label: label.to_string(),
            })
    }
}

impl fmt::Display for RowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw seat map as it arrives over the wire or sits in storage.
pub type RawSeatMap = BTreeMap<String, Vec<u32>>;

/// Row label -> ordered column-group seat counts, ordered by row.
///
/// Building one only checks the row labels. The venue rules (three column
/// groups, at least two seats each) are enforced by
/// [`validate_layout`](crate::services::topology::validate_layout) when a hall
/// is created or updated, so maps already in storage always load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSeatMap", into = "RawSeatMap")]
pub struct SeatMap(BTreeMap<RowLabel, Vec<u32>>);

impl SeatMap {
    pub fn rows(&self) -> impl Iterator<Item = (RowLabel, &[u32])> + '_ {
        self.0.iter().map(|(label, groups)| (*label, groups.as_slice()))
    }

    pub fn row_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn seat_count(&self) -> usize {
        self.0
            .values()
            .flat_map(|groups| groups.iter())
            .map(|count| *count as usize)
            .sum()
    }
}

impl TryFrom<RawSeatMap> for SeatMap {
    type Error = LayoutError;

    fn try_from(raw: RawSeatMap) -> Result<Self, Self::Error> {
        let mut rows = BTreeMap::new();
        for (label, groups) in raw {
            let row = RowLabel::parse(&label)?;
            // "1" and "01" name the same row
            if rows.insert(row, groups).is_some() {
                return Err(LayoutError::DuplicateRowLabel {
                    label,
                    row: row.get(),
                });
            }
        }
        Ok(SeatMap(rows))
    }
}

impl From<SeatMap> for RawSeatMap {
    fn from(map: SeatMap) -> Self {
        map.0
            .into_iter()
            .map(|(row, groups)| (row.to_string(), groups))
            .collect()
    }
}

impl FromIterator<(RowLabel, Vec<u32>)> for SeatMap {
    fn from_iter<I: IntoIterator<Item = (RowLabel, Vec<u32>)>>(iter: I) -> Self {
        SeatMap(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hall {
    pub id: i64,
    pub name: String,
    pub theatre_id: i64,
    pub seat_map: SeatMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHall {
    pub name: String,
    pub theatre_id: i64,
    pub seat_map: SeatMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[(&str, &[u32])]) -> RawSeatMap {
        rows.iter()
            .map(|(label, groups)| (label.to_string(), groups.to_vec()))
            .collect()
    }

    #[test]
    fn rows_are_ordered_numerically() {
        let map = SeatMap::try_from(raw(&[("10", &[2, 2, 2]), ("2", &[3, 3, 3])])).unwrap();
        let labels: Vec<u32> = map.rows().map(|(row, _)| row.get()).collect();
        assert_eq!(labels, vec![2, 10]);
        assert_eq!(map.seat_count(), 15);
    }

    #[test]
    fn malformed_row_label_is_an_error() {
        for bad in ["A", "0", "-1", ""] {
            let err = SeatMap::try_from(raw(&[(bad, &[2, 2, 2])])).unwrap_err();
            assert_eq!(
                err,
                LayoutError::InvalidRowLabel {
                    label: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn equivalent_labels_collide() {
        let err = SeatMap::try_from(raw(&[("01", &[2, 2, 2]), ("1", &[2, 2, 2])])).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateRowLabel { row: 1, .. }));
    }

    #[test]
    fn json_round_trip_keeps_text_labels() {
        let map = SeatMap::try_from(raw(&[("1", &[2, 3, 2])])).unwrap();
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({ "1": [2, 3, 2] }));
        let back: SeatMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, map);
    }
}
