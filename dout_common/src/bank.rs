//! Bit-packed per-channel output image.
//!
//! Bit N corresponds to channel N. Used for the electrical output image and
//! the SPI shift-register frame.

use crate::consts::BANK_WORDS;

/// One bit per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OutputBank {
    words: [u64; BANK_WORDS],
}

impl OutputBank {
    pub const fn new() -> Self {
        Self {
            words: [0; BANK_WORDS],
        }
    }

    #[inline]
    pub fn get(&self, channel: u8) -> bool {
        extract_bit(&self.words, channel)
    }

    #[inline]
    pub fn set(&mut self, channel: u8, value: bool) {
        set_bit(&mut self.words, channel, value);
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }
}

/// Extract a single bit from a bank. Out-of-range bits read as `false`.
#[inline]
pub fn extract_bit(bank: &[u64; BANK_WORDS], bit: u8) -> bool {
    let word = (bit / 64) as usize;
    let offset = bit % 64;
    if word < BANK_WORDS {
        (bank[word] >> offset) & 1 != 0
    } else {
        false
    }
}

/// Set a single bit in a bank. Out-of-range bits are ignored.
#[inline]
pub fn set_bit(bank: &mut [u64; BANK_WORDS], bit: u8, value: bool) {
    let word = (bit / 64) as usize;
    let offset = bit % 64;
    if word < BANK_WORDS {
        if value {
            bank[word] |= 1u64 << offset;
        } else {
            bank[word] &= !(1u64 << offset);
        }
    }
}
