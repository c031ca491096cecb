//! Contiguous Block Finder.
//!
//! First-fit search for `n` adjacent free seats. Two seats are adjacent when
//! they share a row and a column group and their numbers differ by one, so a
//! run never crosses a column-group boundary.

use std::collections::{BTreeMap, HashSet};

use crate::models::{Seat, SeatId};

/// Returns the lexicographically smallest block of `n` adjacent seats not in
/// `booked`, ordered by (row, column group, number). `None` when no row has
/// such a block or `n` is zero.
///
/// `seats` may arrive in any order. One pass per row after grouping.
pub fn find_block(seats: &[Seat], booked: &HashSet<SeatId>, n: usize) -> Option<Vec<Seat>> {
    if n == 0 {
        return None;
    }

    let mut rows: BTreeMap<u32, Vec<&Seat>> = BTreeMap::new();
    for seat in seats {
        rows.entry(seat.row).or_default().push(seat);
    }

    for row in rows.values_mut() {
        row.sort_by_key(|seat| (seat.column, seat.number));

        let mut block: Vec<&Seat> = Vec::with_capacity(n.min(row.len()));
        for seat in row.iter() {
            if booked.contains(&seat.id()) {
                block.clear();
                continue;
            }
            if let Some(last) = block.last() {
                if !last.id().is_followed_by(&seat.id()) {
                    block.clear();
                }
            }
            block.push(seat);
            if block.len() == n {
                return Some(block.into_iter().copied().collect());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RowLabel, SeatMap};
    use crate::services::topology::expand;

    fn hall(rows: &[(u32, &[u32])]) -> Vec<Seat> {
        let map: SeatMap = rows
            .iter()
            .map(|(row, groups)| (RowLabel::new(*row).unwrap(), groups.to_vec()))
            .collect();
        expand(1, &map)
    }

    fn ids(block: &[Seat]) -> Vec<SeatId> {
        block.iter().map(Seat::id).collect()
    }

    fn booked(seats: &[(u32, u32, u32)]) -> HashSet<SeatId> {
        seats.iter().map(|(r, c, n)| SeatId::new(*r, *c, *n)).collect()
    }

    #[test]
    fn empty_hall_takes_first_seats() {
        let seats = hall(&[(1, &[2, 2, 2])]);
        let block = find_block(&seats, &HashSet::new(), 2).unwrap();
        assert_eq!(ids(&block), vec![SeatId::new(1, 1, 1), SeatId::new(1, 1, 2)]);
    }

    #[test]
    fn skips_booked_group() {
        let seats = hall(&[(1, &[2, 2, 2])]);
        let block = find_block(&seats, &booked(&[(1, 1, 1), (1, 1, 2)]), 2).unwrap();
        assert_eq!(ids(&block), vec![SeatId::new(1, 2, 1), SeatId::new(1, 2, 2)]);
    }

    #[test]
    fn groups_never_merge() {
        let seats = hall(&[(1, &[2, 2, 2])]);
        let taken = booked(&[(1, 1, 1), (1, 1, 2), (1, 2, 1), (1, 2, 2)]);
        assert!(find_block(&seats, &taken, 3).is_none());
        // free seats straddling a group boundary are not a run either
        assert!(find_block(&seats, &booked(&[(1, 1, 1), (1, 3, 2)]), 3).is_none());
    }

    #[test]
    fn restarts_after_a_booked_seat() {
        let seats = hall(&[(1, &[5, 2, 2])]);
        let block = find_block(&seats, &booked(&[(1, 1, 2)]), 3).unwrap();
        assert_eq!(
            ids(&block),
            vec![SeatId::new(1, 1, 3), SeatId::new(1, 1, 4), SeatId::new(1, 1, 5)]
        );
    }

    #[test]
    fn falls_through_to_later_rows() {
        let seats = hall(&[(2, &[4, 2, 2]), (1, &[2, 2, 2])]);
        let block = find_block(&seats, &HashSet::new(), 4).unwrap();
        assert_eq!(block[0].id(), SeatId::new(2, 1, 1));
        assert_eq!(block.len(), 4);
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut seats = hall(&[(1, &[3, 3, 3]), (2, &[3, 3, 3])]);
        seats.reverse();
        let block = find_block(&seats, &booked(&[(1, 1, 1)]), 2).unwrap();
        assert_eq!(ids(&block), vec![SeatId::new(1, 1, 2), SeatId::new(1, 1, 3)]);
    }

    #[test]
    fn zero_or_oversized_requests_find_nothing() {
        let seats = hall(&[(1, &[2, 2, 2])]);
        assert!(find_block(&seats, &HashSet::new(), 0).is_none());
        assert!(find_block(&seats, &HashSet::new(), 3).is_none());
        assert!(find_block(&[], &HashSet::new(), 1).is_none());
        assert!(find_block(&seats, &HashSet::new(), usize::MAX).is_none());
    }
}
