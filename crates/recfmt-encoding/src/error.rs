//! Error types for encoding and packed-decimal operations.

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while encoding or decoding field data.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum EncodingError {
    /// Charset label not recognized.
    #[error("unknown charset: {name}")]
    #[diagnostic(
        code(encoding::unknown_charset),
        help("use an IBM code page name (IBM-037, IBM-1047) or a WHATWG encoding label (sjis, UTF-8, ...)")
    )]
    UnknownCharset {
        /// The label that failed to resolve.
        name: String,
    },

    /// Character cannot be represented in the target charset.
    #[error("character {ch:?} cannot be encoded in {charset}")]
    #[diagnostic(code(encoding::unmappable))]
    Unmappable {
        /// Offending character.
        ch: char,
        /// Target charset name.
        charset: String,
    },

    /// Sign nibble matches neither the positive nor the negative setting.
    #[error("invalid sign nibble 0x{nibble:X} (positive=0x{positive:X}, negative=0x{negative:X})")]
    #[diagnostic(code(encoding::invalid_sign_nibble))]
    InvalidSignNibble {
        /// Nibble found in the data.
        nibble: u8,
        /// Configured positive nibble.
        positive: u8,
        /// Configured negative nibble.
        negative: u8,
    },

    /// A digit nibble is outside 0-9.
    #[error("invalid digit nibble 0x{nibble:X} at nibble position {position}")]
    #[diagnostic(code(encoding::invalid_digit_nibble))]
    InvalidDigitNibble {
        /// Nibble found in the data.
        nibble: u8,
        /// Zero-based nibble index within the field.
        position: usize,
    },

    /// A digit string contains something other than ASCII digits.
    #[error("invalid digit character '{ch}'")]
    #[diagnostic(code(encoding::invalid_digit))]
    InvalidDigit {
        /// Offending character.
        ch: char,
    },

    /// The value needs more digit nibbles than the field provides.
    #[error("value requires {digits} digits but only {capacity} available")]
    #[diagnostic(code(encoding::overflow))]
    Overflow {
        /// Digits required.
        digits: usize,
        /// Digit nibbles available.
        capacity: usize,
    },

    /// Pack settings are unusable.
    #[error("invalid pack settings: {message}")]
    #[diagnostic(code(encoding::invalid_pack_settings))]
    InvalidPackSettings {
        /// Description of the problem.
        message: String,
    },

    /// Generic conversion failure.
    #[error("conversion failed: {message}")]
    #[diagnostic(code(encoding::conversion_failed))]
    ConversionFailed {
        /// Description of the failure.
        message: String,
    },
}
