//! Bit and byte-lane access over packed bus words.
//!
//! A bus word is a fixed-width unsigned integer whose byte `n` is lane `n`
//! of the data channel (bits `[8n, 8n + 8)`). Lane and bit indices must be
//! within the word; out-of-range indices are a caller bug, exactly like
//! indexing past a hardware signal's declared width.

use std::fmt;

/// Packed unsigned word carried on a data channel.
pub trait BusWord: Copy + Default + Eq + fmt::Debug + fmt::LowerHex {
    /// Width of the word in bits.
    const BITS: u32;
    /// Number of byte lanes in the word.
    const BYTES: u32 = Self::BITS / 8;

    /// Returns bit `n` (0 is the least significant bit).
    fn bit(self, n: u32) -> bool;

    /// Returns the word with bit `n` replaced by `bit`.
    #[must_use]
    fn with_bit(self, n: u32, bit: bool) -> Self;

    /// Returns byte lane `n`.
    fn byte(self, n: u32) -> u8;

    /// Returns the word with byte lane `n` replaced by `byte`.
    #[must_use]
    fn with_byte(self, n: u32, byte: u8) -> Self;

    /// Widens the word for width-agnostic consumers such as waveform dumps.
    fn to_u128(self) -> u128;
}

macro_rules! impl_bus_word {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BusWord for $ty {
                const BITS: u32 = <$ty>::BITS;

                #[inline]
                fn bit(self, n: u32) -> bool {
                    (self >> n) & 1 == 1
                }

                #[inline]
                fn with_bit(self, n: u32, bit: bool) -> Self {
                    (self & !(1 << n)) | (<$ty>::from(bit) << n)
                }

                #[inline]
                #[allow(clippy::cast_possible_truncation)]
                fn byte(self, n: u32) -> u8 {
                    (self >> (n * 8)) as u8
                }

                #[inline]
                fn with_byte(self, n: u32, byte: u8) -> Self {
                    let shift = n * 8;
                    (self & !(0xFF << shift)) | (<$ty>::from(byte) << shift)
                }

                #[inline]
                fn to_u128(self) -> u128 {
                    u128::from(self)
                }
            }
        )*
    };
}

impl_bus_word!(u8, u16, u32, u64, u128);

/// Returns bit `n` of `word`.
#[must_use]
pub fn get_bit<T: BusWord>(word: T, n: u32) -> bool {
    word.bit(n)
}

/// Returns `word` with bit `n` replaced; all other bits unchanged.
#[must_use]
pub fn set_bit<T: BusWord>(word: T, n: u32, bit: bool) -> T {
    word.with_bit(n, bit)
}

/// Returns byte lane `n` of `word`.
#[must_use]
pub fn get_byte<T: BusWord>(word: T, n: u32) -> u8 {
    word.byte(n)
}

/// Returns `word` with byte lane `n` replaced; all other lanes unchanged.
#[must_use]
pub fn set_byte<T: BusWord>(word: T, n: u32, byte: u8) -> T {
    word.with_byte(n, byte)
}

/// All-ones byte-enable mask covering `lanes` lanes.
#[must_use]
pub const fn lane_mask(lanes: u32) -> u64 {
    if lanes >= u64::BITS {
        u64::MAX
    } else {
        (1 << lanes) - 1
    }
}

/// Packs `payload` into the lanes selected by `mask`.
///
/// Payload bytes are consumed in ascending lane order, one per set mask bit.
/// Lanes not selected by `mask` are zero. Surplus payload bytes are ignored
/// and missing ones leave their lane zero; callers validate lengths first.
#[must_use]
pub fn pack_lanes<T: BusWord>(mask: u64, payload: &[u8]) -> T {
    let mut bytes = payload.iter().copied();
    let mut word = T::default();
    for lane in (0..T::BYTES).filter(|lane| mask_selects(mask, *lane)) {
        match bytes.next() {
            Some(byte) => word = set_byte(word, lane, byte),
            None => break,
        }
    }
    word
}

/// Collects the bytes of the lanes selected by `mask` in ascending lane order.
#[must_use]
pub fn unpack_lanes<T: BusWord>(word: T, mask: u64) -> Vec<u8> {
    (0..T::BYTES)
        .filter(|lane| mask_selects(mask, *lane))
        .map(|lane| get_byte(word, lane))
        .collect()
}

const fn mask_selects(mask: u64, lane: u32) -> bool {
    lane < u64::BITS && (mask >> lane) & 1 == 1
}
