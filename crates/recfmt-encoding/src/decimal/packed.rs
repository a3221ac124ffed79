//! Packed decimal (BCD) encoding and decoding.
//!
//! Packed decimal stores two decimal digits per byte, with the rightmost
//! nibble holding the sign.
//!
//! # Format
//!
//! A field of `L` bytes holds `2·L − 1` digit nibbles followed by one sign
//! nibble, most significant digit first:
//!
//! - +87654321 in 5 bytes, sign nibbles 3/7: `08 76 54 32 13`
//! - -87654321 in 5 bytes, sign nibbles C/D: `08 76 54 32 1D`
//!
//! Digits are always right-aligned and padded with zero nibbles, so every
//! nibble of the field is accounted for by a digit or by the sign.

use rust_decimal::Decimal;

use super::Sign;
use crate::error::EncodingError;
use crate::Result;

/// Nibble configuration of a packed-decimal field.
///
/// Only the low four bits of the pack byte are kept. The fill nibble is
/// never written, so pack bytes `0x03`, `0x30` and `0xF0` all produce
/// identical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackSettings {
    pack_nibble: u8,
    positive_sign: u8,
    negative_sign: u8,
}

impl PackSettings {
    /// Build settings from a pack byte and the two sign nibbles.
    ///
    /// # Errors
    /// Returns `EncodingError::InvalidPackSettings` if a sign nibble is
    /// above 0xF or both sign nibbles are equal.
    pub fn new(pack_byte: u8, positive_sign: u8, negative_sign: u8) -> Result<Self> {
        for (label, nibble) in [("positive", positive_sign), ("negative", negative_sign)] {
            if nibble > 0x0F {
                return Err(EncodingError::InvalidPackSettings {
                    message: format!("{label} sign nibble must be 0x0-0xF, but was 0x{nibble:X}"),
                });
            }
        }
        if positive_sign == negative_sign {
            return Err(EncodingError::InvalidPackSettings {
                message: format!(
                    "positive and negative sign nibbles must differ, but both were 0x{positive_sign:X}"
                ),
            });
        }
        Ok(Self {
            pack_nibble: pack_byte & 0x0F,
            positive_sign,
            negative_sign,
        })
    }

    /// Conventional settings for ASCII-compatible files (pack byte 0x30,
    /// signs 0x3 / 0x7).
    pub fn ascii() -> Self {
        Self {
            pack_nibble: 0x0,
            positive_sign: 0x3,
            negative_sign: 0x7,
        }
    }

    /// Conventional settings for EBCDIC files (pack byte 0xF0, signs
    /// 0xC / 0xD).
    pub fn ebcdic() -> Self {
        Self {
            pack_nibble: 0x0,
            positive_sign: 0xC,
            negative_sign: 0xD,
        }
    }

    /// Replace the pack byte, keeping its low nibble.
    pub fn with_pack_byte(mut self, pack_byte: u8) -> Self {
        self.pack_nibble = pack_byte & 0x0F;
        self
    }

    /// Fill digit taken from the pack byte.
    ///
    /// Because digits are zero-padded to the full `2·L − 1` nibbles, no
    /// nibble position is ever left for this fill; it is kept so that
    /// layouts carrying a pack byte round-trip their configuration.
    pub fn pack_nibble(&self) -> u8 {
        self.pack_nibble
    }

    /// Sign nibble written for non-negative values.
    pub fn positive_sign(&self) -> u8 {
        self.positive_sign
    }

    /// Sign nibble written for negative values.
    pub fn negative_sign(&self) -> u8 {
        self.negative_sign
    }

    /// Classify a sign nibble.
    ///
    /// # Errors
    /// Returns `EncodingError::InvalidSignNibble` unless `nibble` equals one
    /// of the configured sign nibbles.
    pub fn sign_of(&self, nibble: u8) -> Result<Sign> {
        if nibble == self.positive_sign {
            Ok(Sign::Positive)
        } else if nibble == self.negative_sign {
            Ok(Sign::Negative)
        } else {
            Err(EncodingError::InvalidSignNibble {
                nibble,
                positive: self.positive_sign,
                negative: self.negative_sign,
            })
        }
    }
}

impl Default for PackSettings {
    fn default() -> Self {
        Self::ascii()
    }
}

/// Number of digit nibbles a packed field of `byte_len` bytes can hold.
pub fn digit_capacity(byte_len: usize) -> usize {
    (byte_len * 2).saturating_sub(1)
}

/// Pack a string of ASCII digits into exactly `byte_len` bytes.
///
/// # Errors
/// Returns an error if `digits` contains a non-digit or needs more than
/// [`digit_capacity`] nibbles.
pub fn pack_digits(
    digits: &str,
    sign: Sign,
    byte_len: usize,
    settings: &PackSettings,
) -> Result<Vec<u8>> {
    if byte_len == 0 {
        return Err(EncodingError::ConversionFailed {
            message: "packed decimal field length must be at least 1 byte".to_string(),
        });
    }
    let capacity = digit_capacity(byte_len);
    if digits.len() > capacity {
        return Err(EncodingError::Overflow {
            digits: digits.len(),
            capacity,
        });
    }

    // Right-align the digits behind zero nibbles, then append the sign.
    let mut nibbles = vec![0u8; capacity - digits.len()];
    for ch in digits.chars() {
        let digit = ch
            .to_digit(10)
            .ok_or(EncodingError::InvalidDigit { ch })?;
        nibbles.push(digit as u8);
    }
    nibbles.push(sign.to_nibble(settings));

    Ok(nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect())
}

/// Unpack a packed field into its digit string and sign.
///
/// Leading zeros are stripped, keeping at least one digit.
///
/// # Errors
/// Returns an error for an empty slice, an unknown sign nibble or a digit
/// nibble above 9.
pub fn unpack_digits(bytes: &[u8], settings: &PackSettings) -> Result<(String, Sign)> {
    let Some(&last) = bytes.last() else {
        return Err(EncodingError::ConversionFailed {
            message: "empty packed decimal".to_string(),
        });
    };
    let sign = settings.sign_of(last & 0x0F)?;

    let mut digits = String::with_capacity(bytes.len() * 2);
    let nibbles = bytes
        .iter()
        .flat_map(|&b| [b >> 4, b & 0x0F])
        .take(digit_capacity(bytes.len()));
    for (position, nibble) in nibbles.enumerate() {
        if nibble > 9 {
            return Err(EncodingError::InvalidDigitNibble { nibble, position });
        }
        if nibble == 0 && digits.is_empty() {
            continue;
        }
        digits.push(char::from(b'0' + nibble));
    }
    if digits.is_empty() {
        digits.push('0');
    }

    Ok((digits, sign))
}

/// Decode a packed field into a decimal with `scale` implied fraction
/// digits, together with the sign nibble it carried.
///
/// # Errors
/// Returns an error if the bytes are not valid packed decimal or the value
/// exceeds the range of `Decimal`.
pub fn unpack_decimal(bytes: &[u8], scale: u32, settings: &PackSettings) -> Result<(Decimal, Sign)> {
    let (digits, sign) = unpack_digits(bytes, settings)?;
    let mut unscaled: i128 = digits.parse().map_err(|e| EncodingError::ConversionFailed {
        message: format!("packed value {digits} is out of range: {e}"),
    })?;
    if sign.is_negative() {
        unscaled = -unscaled;
    }
    let value = Decimal::try_from_i128_with_scale(unscaled, scale).map_err(|e| {
        EncodingError::ConversionFailed {
            message: format!("packed value {digits} with scale {scale} is out of range: {e}"),
        }
    })?;
    Ok((value, sign))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_settings_keep_low_nibble() {
        let a = PackSettings::new(0x30, 4, 7).unwrap();
        let b = PackSettings::new(0xF0, 4, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(PackSettings::new(0x03, 3, 7).unwrap().pack_nibble(), 0x3);
    }

    #[test]
    fn test_settings_rejects_bad_nibbles() {
        assert!(PackSettings::new(0x30, 0x10, 7).is_err());
        assert!(PackSettings::new(0x30, 7, 7).is_err());
    }

    #[test]
    fn test_digit_capacity() {
        assert_eq!(digit_capacity(1), 1);
        assert_eq!(digit_capacity(5), 9);
        assert_eq!(digit_capacity(10), 19);
    }

    #[test]
    fn test_pack_ascii_signs() {
        let settings = PackSettings::new(0x03, 3, 7).unwrap();
        assert_eq!(
            pack_digits("87654321", Sign::Positive, 5, &settings).unwrap(),
            vec![0x08, 0x76, 0x54, 0x32, 0x13]
        );
        assert_eq!(
            pack_digits("87654321", Sign::Negative, 5, &settings).unwrap(),
            vec![0x08, 0x76, 0x54, 0x32, 0x17]
        );
    }

    #[test]
    fn test_pack_ebcdic_signs() {
        let settings = PackSettings::ebcdic();
        assert_eq!(
            pack_digits("87654321", Sign::Positive, 5, &settings).unwrap(),
            vec![0x08, 0x76, 0x54, 0x32, 0x1C]
        );
    }

    #[test]
    fn test_pack_fills_capacity() {
        let settings = PackSettings::new(0x30, 4, 7).unwrap();
        assert_eq!(
            pack_digits("999999999999999999", Sign::Positive, 10, &settings).unwrap(),
            vec![0x09, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x94]
        );
    }

    #[test]
    fn test_pack_overflow() {
        let err = pack_digits("1234567890", Sign::Positive, 5, &PackSettings::ascii()).unwrap_err();
        assert_eq!(
            err,
            EncodingError::Overflow {
                digits: 10,
                capacity: 9
            }
        );
    }

    #[test]
    fn test_pack_rejects_non_digit() {
        let err = pack_digits("12a", Sign::Positive, 3, &PackSettings::ascii()).unwrap_err();
        assert_eq!(err, EncodingError::InvalidDigit { ch: 'a' });
    }

    #[test]
    fn test_unpack_positive_and_negative() {
        let settings = PackSettings::ascii();
        let (digits, sign) = unpack_digits(&[0x08, 0x76, 0x54, 0x32, 0x13], &settings).unwrap();
        assert_eq!(digits, "87654321");
        assert_eq!(sign, Sign::Positive);

        let (_, sign) = unpack_digits(&[0x08, 0x76, 0x54, 0x32, 0x17], &settings).unwrap();
        assert_eq!(sign, Sign::Negative);
    }

    #[test]
    fn test_unpack_invalid_sign() {
        let err = unpack_digits(&[0x08, 0x76, 0x54, 0x32, 0x16], &PackSettings::ascii()).unwrap_err();
        assert_eq!(
            err,
            EncodingError::InvalidSignNibble {
                nibble: 0x6,
                positive: 0x3,
                negative: 0x7
            }
        );
    }

    #[test]
    fn test_unpack_invalid_digit() {
        let err = unpack_digits(&[0x0A, 0x13], &PackSettings::ascii()).unwrap_err();
        assert_eq!(
            err,
            EncodingError::InvalidDigitNibble {
                nibble: 0xA,
                position: 1
            }
        );
    }

    #[test]
    fn test_unpack_zero() {
        let (digits, _) = unpack_digits(&[0x00, 0x0C], &PackSettings::ebcdic()).unwrap();
        assert_eq!(digits, "0");
    }

    #[test]
    fn test_unpack_empty() {
        assert!(unpack_digits(&[], &PackSettings::ascii()).is_err());
    }

    #[test]
    fn test_decimal_with_scale() {
        let settings = PackSettings::ebcdic();
        let packed = pack_digits("12345", Sign::Negative, 3, &settings).unwrap();
        assert_eq!(packed, vec![0x12, 0x34, 0x5D]);
        let (value, sign) = unpack_decimal(&packed, 2, &settings).unwrap();
        assert_eq!(value, dec("-123.45"));
        assert_eq!(sign, Sign::Negative);
    }

    #[test]
    fn test_fill_nibble_is_never_written() {
        let plain = PackSettings::ascii();
        for pack_byte in [0x03, 0x30, 0xF0] {
            let settings = plain.with_pack_byte(pack_byte);
            assert_eq!(
                pack_digits("123", Sign::Positive, 3, &settings).unwrap(),
                pack_digits("123", Sign::Positive, 3, &plain).unwrap()
            );
        }
    }

    #[test]
    fn test_unpack_out_of_decimal_range() {
        // 29 nines exceed the 96-bit mantissa.
        let mut bytes = vec![0x99; 15];
        bytes[14] = 0x93;
        assert!(unpack_decimal(&bytes, 0, &PackSettings::ascii()).is_err());
    }
}
