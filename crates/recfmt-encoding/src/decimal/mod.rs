//! Packed-decimal (BCD) support with caller-configured sign nibbles.
//!
//! Fixed-length files written on different platforms disagree on the sign
//! nibble: mainframe data uses 0xC/0xD, while files produced for ASCII
//! systems commonly use 0x3/0x7. The codec never guesses; every call takes
//! a [`PackSettings`].

mod packed;

pub use packed::{digit_capacity, pack_digits, unpack_decimal, unpack_digits, PackSettings};

/// Sign recovered from (or written to) the last nibble of a packed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Positive value.
    Positive,
    /// Negative value.
    Negative,
}

impl Sign {
    /// The sign nibble this sign is written with under `settings`.
    pub fn to_nibble(self, settings: &PackSettings) -> u8 {
        match self {
            Sign::Positive => settings.positive_sign(),
            Sign::Negative => settings.negative_sign(),
        }
    }

    /// Whether the sign is negative.
    pub fn is_negative(self) -> bool {
        self == Sign::Negative
    }
}
