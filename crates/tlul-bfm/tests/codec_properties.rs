//! Property checks for lane packing and mask legality.

#![allow(clippy::pedantic, clippy::nursery)]

use log as _;
use proptest::prelude::*;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use tlul_bfm::{
    get_byte, is_contiguous_mask, is_legal_mask, lane_mask, pack_lanes, set_byte, unpack_lanes,
    validate_transfer_mask,
};

/// Every legal mask of a `lanes`-lane bus, built from the definition.
fn legal_masks(lanes: u32) -> Vec<u64> {
    let mut masks = vec![0, lane_mask(lanes)];
    let mut run = 1;
    while run < lanes {
        let mut offset = 0;
        while offset + run <= lanes {
            masks.push(lane_mask(run) << offset);
            offset += run;
        }
        run *= 2;
    }
    masks.sort_unstable();
    masks.dedup();
    masks
}

#[test]
fn eight_lane_legality_matches_enumeration() {
    let legal = legal_masks(8);
    for mask in 0..=0x1FF_u64 {
        assert_eq!(
            is_legal_mask(mask, 8),
            legal.contains(&mask),
            "mask {mask:#x}"
        );
    }
    // 0, 0xFF, eight singles, four pairs, two quads
    assert_eq!(legal.len(), 16);
}

#[test]
fn sixteen_lane_legality_matches_enumeration() {
    let legal = legal_masks(16);
    let accepted: Vec<u64> = (0..=0xFFFF_u64)
        .filter(|mask| is_legal_mask(*mask, 16))
        .collect();
    assert_eq!(accepted, legal);
}

#[test]
fn transfer_masks_need_matching_popcount_and_legal_shape() {
    let mut accepted = 0;
    for size_log2 in 0..=3_u8 {
        for mask in 0..=0xFF_u64 {
            let expected = mask.count_ones() == 1 << size_log2 && is_legal_mask(mask, 8);
            assert_eq!(
                validate_transfer_mask(mask, size_log2, 8).is_ok(),
                expected,
                "size_log2 {size_log2}, mask {mask:#04x}"
            );
            accepted += usize::from(expected);
        }
    }
    // eight bytes, four halves, two words, one double word
    assert_eq!(accepted, 15);
}

#[test]
fn non_power_of_two_bus_accepts_full_mask() {
    assert!(is_legal_mask(0b111, 3));
    assert!(!is_legal_mask(0b011 << 1, 3));
    assert!(is_legal_mask(0b010, 3));
}

proptest! {
    #[test]
    fn legal_masks_are_contiguous(mask in any::<u64>()) {
        if is_legal_mask(mask, 64) {
            prop_assert!(is_contiguous_mask(mask, 64));
        }
    }

    #[test]
    fn masks_beyond_the_bus_are_never_legal(mask in any::<u64>(), lanes in 1_u32..64) {
        if mask >> lanes != 0 {
            prop_assert!(!is_legal_mask(mask, lanes));
            prop_assert!(!is_contiguous_mask(mask, lanes));
        }
    }

    #[test]
    fn set_byte_is_idempotent(word in any::<u64>(), lane in 0_u32..8, byte in any::<u8>()) {
        let once = set_byte(word, lane, byte);
        prop_assert_eq!(set_byte(once, lane, byte), once);
        prop_assert_eq!(get_byte(once, lane), byte);
    }

    #[test]
    fn unpack_recovers_packed_lanes(mask in any::<u8>(), seed in any::<u64>()) {
        let mask = u64::from(mask);
        let payload: Vec<u8> = seed.to_le_bytes()[..mask.count_ones() as usize].to_vec();
        let word: u64 = pack_lanes(mask, &payload);
        prop_assert_eq!(unpack_lanes(word, mask), payload);
        prop_assert_eq!(unpack_lanes(word, !mask & 0xFF), vec![0; 8 - mask.count_ones() as usize]);
    }
}
