//! Property tests for topology expansion and the first-fit block finder.
//!
//! Run with: cargo test --test allocation_properties

use proptest::prelude::*;
use std::collections::HashSet;

use seat_allocator::models::{RowLabel, Seat, SeatId, SeatMap};
use seat_allocator::services::finder::find_block;
use seat_allocator::services::topology::{expand, validate_layout};

// Layouts that satisfy the venue rules: 3 groups, 2..=6 seats each
fn valid_seat_map() -> impl Strategy<Value = SeatMap> {
    prop::collection::btree_map(1u32..40, prop::collection::vec(2u32..=6, 3), 1..6).prop_map(|rows| {
        rows.into_iter()
            .map(|(row, groups)| (RowLabel::new(row).unwrap(), groups))
            .collect()
    })
}

fn hall_with_bookings() -> impl Strategy<Value = (Vec<Seat>, HashSet<SeatId>)> {
    valid_seat_map().prop_flat_map(|map| {
        let seats = expand(1, &map);
        let len = seats.len();
        (Just(seats), prop::collection::vec(any::<bool>(), len))
    })
    .prop_map(|(seats, taken)| {
        let booked = seats
            .iter()
            .zip(taken)
            .filter(|(_, taken)| *taken)
            .map(|(seat, _)| seat.id())
            .collect();
        (seats, booked)
    })
}

// Every valid block, identified by its first seat, by brute force
fn all_blocks(seats: &[Seat], booked: &HashSet<SeatId>, n: usize) -> Vec<SeatId> {
    let mut ids: Vec<SeatId> = seats.iter().map(Seat::id).collect();
    ids.sort();
    ids.windows(n)
        .filter(|window| window.iter().all(|id| !booked.contains(id)))
        .filter(|window| window.windows(2).all(|pair| pair[0].is_followed_by(&pair[1])))
        .map(|window| window[0])
        .collect()
}

proptest! {
    #[test]
    fn expansion_counts_every_seat_once(map in valid_seat_map()) {
        prop_assert!(validate_layout(&map).is_ok());

        let seats = expand(3, &map);
        prop_assert_eq!(seats.len(), map.seat_count());

        let unique: HashSet<SeatId> = seats.iter().map(Seat::id).collect();
        prop_assert_eq!(unique.len(), seats.len());
        prop_assert!(seats.iter().all(|seat| seat.hall_id == 3));
    }

    #[test]
    fn expansion_is_deterministic(map in valid_seat_map()) {
        let reparsed: SeatMap = serde_json::from_value(serde_json::to_value(&map).unwrap()).unwrap();
        prop_assert_eq!(expand(1, &map), expand(1, &map));
        prop_assert_eq!(expand(1, &map), expand(1, &reparsed));
    }

    #[test]
    fn finder_returns_the_first_free_adjacent_block(
        (seats, booked) in hall_with_bookings(),
        n in 1usize..7,
    ) {
        let expected = all_blocks(&seats, &booked, n).into_iter().min();

        match find_block(&seats, &booked, n) {
            Some(block) => {
                prop_assert_eq!(block.len(), n);
                prop_assert!(block.iter().all(|seat| !booked.contains(&seat.id())));
                prop_assert!(block.windows(2).all(|pair| pair[0].id().is_followed_by(&pair[1].id())));
                prop_assert_eq!(Some(block[0].id()), expected);
            }
            None => prop_assert_eq!(expected, None),
        }
    }

    #[test]
    fn finder_never_spans_column_groups(
        (seats, booked) in hall_with_bookings(),
        n in 1usize..7,
    ) {
        if let Some(block) = find_block(&seats, &booked, n) {
            let first = block[0];
            prop_assert!(block.iter().all(|seat| seat.row == first.row && seat.column == first.column));
        }
    }
}
