//! Byte-enable mask legality.
//!
//! A legal mask selects a naturally aligned, power-of-two sized, contiguous
//! run of lanes: `n` low zero bits, then `k` one bits, then zeros, with `k` a
//! power of two and `n` a multiple of `k`. The all-zero and all-ones masks
//! are legal as well.

use thiserror::Error;

use crate::codec::lane_mask;
use crate::fault::PreconditionViolation;

/// Reason a mask was rejected by [`classify_mask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MaskError {
    /// Bits are set at or above the lane count of the data bus.
    #[error("mask selects lanes beyond the {width}-lane bus")]
    OutOfRange {
        /// Lane count of the bus.
        width: u32,
    },
    /// The selected lanes do not form one contiguous run.
    #[error("mask lanes are not contiguous")]
    NotContiguous,
    /// The contiguous run length is not a power of two.
    #[error("mask run of {run} lanes is not a power of two")]
    NotPowerOfTwo {
        /// Number of contiguous selected lanes.
        run: u32,
    },
    /// The run does not start at a multiple of its own length.
    #[error("mask run of {run} lanes starts at lane {offset}, not naturally aligned")]
    Misaligned {
        /// First selected lane.
        offset: u32,
        /// Number of contiguous selected lanes.
        run: u32,
    },
}

/// Classifies `mask` against a `width_bits`-lane bus.
///
/// # Errors
///
/// Returns the first [`MaskError`] that makes `mask` illegal.
pub const fn classify_mask(mask: u64, width_bits: u32) -> Result<(), MaskError> {
    let full = lane_mask(width_bits);
    if mask & !full != 0 {
        return Err(MaskError::OutOfRange { width: width_bits });
    }
    if mask == 0 || mask == full {
        return Ok(());
    }

    let offset = mask.trailing_zeros();
    let run = (mask >> offset).trailing_ones();
    // `run < 64` here: the all-ones 64-lane mask was accepted above.
    if mask >> offset >> run != 0 {
        return Err(MaskError::NotContiguous);
    }
    if !run.is_power_of_two() {
        return Err(MaskError::NotPowerOfTwo { run });
    }
    if offset % run != 0 {
        return Err(MaskError::Misaligned { offset, run });
    }
    Ok(())
}

/// Returns `true` when `mask` is a legal byte-enable for a `width_bits`-lane bus.
#[must_use]
pub const fn is_legal_mask(mask: u64, width_bits: u32) -> bool {
    classify_mask(mask, width_bits).is_ok()
}

/// Returns `true` when the set bits of `mask` form a single run.
///
/// Zero and all-ones masks count as contiguous; alignment and run length are
/// not considered.
#[must_use]
pub const fn is_contiguous_mask(mask: u64, width_bits: u32) -> bool {
    let full = lane_mask(width_bits);
    if mask & !full != 0 {
        return false;
    }
    if mask == 0 || mask == full {
        return true;
    }
    let offset = mask.trailing_zeros();
    let run = (mask >> offset).trailing_ones();
    mask >> offset >> run == 0
}

/// Number of bytes moved by a `2^size_log2` transfer, if it is representable.
#[must_use]
pub const fn transfer_bytes(size_log2: u8) -> Option<u32> {
    1_u32.checked_shl(size_log2 as u32)
}

/// Validates a mask for a `2^size_log2`-byte transfer on a `width_bits`-lane bus.
///
/// The mask must select exactly `2^size_log2` lanes and must be legal.
///
/// # Errors
///
/// Returns [`PreconditionViolation::MaskSizeMismatch`] when the lane count
/// disagrees with the size and [`PreconditionViolation::IllegalMask`] when
/// the mask shape is illegal.
pub const fn validate_transfer_mask(
    mask: u64,
    size_log2: u8,
    width_bits: u32,
) -> Result<(), PreconditionViolation> {
    let selected = mask.count_ones();
    let size_matches = match transfer_bytes(size_log2) {
        Some(bytes) => bytes == selected,
        None => false,
    };
    if !size_matches {
        return Err(PreconditionViolation::MaskSizeMismatch {
            mask,
            size_log2,
            selected,
        });
    }
    match classify_mask(mask, width_bits) {
        Ok(()) => Ok(()),
        Err(reason) => Err(PreconditionViolation::IllegalMask { mask, reason }),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        classify_mask, is_contiguous_mask, is_legal_mask, transfer_bytes, validate_transfer_mask,
        MaskError,
    };
    use crate::fault::PreconditionViolation;

    #[rstest]
    #[case(0x00)]
    #[case(0xFF)]
    #[case(0x0F)]
    #[case(0xF0)]
    #[case(0x03)]
    #[case(0x0C)]
    #[case(0x30)]
    #[case(0xC0)]
    #[case(0x01)]
    #[case(0x02)]
    #[case(0x04)]
    #[case(0x08)]
    #[case(0x10)]
    #[case(0x20)]
    #[case(0x40)]
    #[case(0x80)]
    fn legal_eight_lane_masks(#[case] mask: u64) {
        assert!(is_legal_mask(mask, 8), "{mask:#04x} should be legal");
    }

    #[rstest]
    #[case(0x05, MaskError::NotContiguous)]
    #[case(0x0B, MaskError::NotContiguous)]
    #[case(0x33, MaskError::NotContiguous)]
    #[case(0x06, MaskError::Misaligned { offset: 1, run: 2 })]
    #[case(0x66, MaskError::NotContiguous)]
    #[case(0x3C, MaskError::Misaligned { offset: 2, run: 4 })]
    #[case(0x07, MaskError::NotPowerOfTwo { run: 3 })]
    #[case(0x7E, MaskError::NotPowerOfTwo { run: 6 })]
    #[case(0x7F, MaskError::NotPowerOfTwo { run: 7 })]
    #[case(0x1FF, MaskError::OutOfRange { width: 8 })]
    fn illegal_eight_lane_masks(#[case] mask: u64, #[case] reason: MaskError) {
        assert_eq!(classify_mask(mask, 8), Err(reason));
        assert!(!is_legal_mask(mask, 8));
    }

    #[test]
    fn sixty_four_lane_extremes_are_legal() {
        assert!(is_legal_mask(u64::MAX, 64));
        assert!(is_legal_mask(0xFFFF_FFFF_0000_0000, 64));
        assert!(is_legal_mask(1 << 63, 64));
        assert!(!is_legal_mask(0x7FFF_FFFF_FFFF_FFFF, 64));
    }

    #[test]
    fn contiguity_ignores_alignment_and_run_length() {
        assert!(is_contiguous_mask(0x00, 8));
        assert!(is_contiguous_mask(0xFF, 8));
        assert!(is_contiguous_mask(0x0E, 8));
        assert!(is_contiguous_mask(0x7E, 8));
        assert!(!is_contiguous_mask(0x05, 8));
        assert!(!is_contiguous_mask(0x100, 8));
    }

    #[test]
    fn transfer_bytes_rejects_unrepresentable_sizes() {
        assert_eq!(transfer_bytes(0), Some(1));
        assert_eq!(transfer_bytes(3), Some(8));
        assert_eq!(transfer_bytes(31), Some(1 << 31));
        assert_eq!(transfer_bytes(32), None);
        assert_eq!(transfer_bytes(u8::MAX), None);
    }

    #[test]
    fn transfer_mask_checks_popcount_before_shape() {
        assert_eq!(validate_transfer_mask(0xFF, 3, 8), Ok(()));
        assert_eq!(validate_transfer_mask(0x30, 1, 8), Ok(()));
        assert_eq!(
            validate_transfer_mask(0x0F, 3, 8),
            Err(PreconditionViolation::MaskSizeMismatch {
                mask: 0x0F,
                size_log2: 3,
                selected: 4,
            })
        );
        assert_eq!(
            validate_transfer_mask(0x3C, 2, 8),
            Err(PreconditionViolation::IllegalMask {
                mask: 0x3C,
                reason: MaskError::Misaligned { offset: 2, run: 4 },
            })
        );
        assert!(matches!(
            validate_transfer_mask(0, 0, 8),
            Err(PreconditionViolation::MaskSizeMismatch { selected: 0, .. })
        ));
    }
}
