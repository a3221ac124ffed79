//! Caller-side converter settings.

use recfmt_encoding::{Charset, PackSettings};

use super::Param;
use crate::error::SyntaxError;

/// Layout directive naming the positive sign nibble.
pub const POSITIVE_SIGN_DIRECTIVE: &str = "positive-pack-sign-nibble";
/// Layout directive naming the negative sign nibble.
pub const NEGATIVE_SIGN_DIRECTIVE: &str = "negative-pack-sign-nibble";
/// Layout directive naming the pack byte.
pub const PACK_NIBBLE_DIRECTIVE: &str = "pack-nibble";

/// Settings applied to every converter of a formatter before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertorSetting {
    pack: PackSettings,
}

impl ConvertorSetting {
    /// Conventional settings for a file in `charset`: C/D sign nibbles for
    /// EBCDIC, 3/7 otherwise.
    pub fn for_charset(charset: Charset) -> Self {
        let pack = if charset.is_ebcdic() {
            PackSettings::ebcdic()
        } else {
            PackSettings::ascii()
        };
        Self { pack }
    }

    /// Replace the pack settings.
    pub fn with_pack_settings(mut self, pack: PackSettings) -> Self {
        self.pack = pack;
        self
    }

    /// Pack settings for packed-decimal converters.
    pub fn pack_settings(&self) -> &PackSettings {
        &self.pack
    }

    /// Apply the pack directives of a layout. Directives that are absent
    /// keep the current value.
    ///
    /// `lookup` returns the raw directive value: a hexadecimal string
    /// (`"C"`, `"30"`) or an integer literal (`0x30`, `7`).
    pub fn apply_directives<'a>(
        mut self,
        lookup: impl Fn(&str) -> Option<&'a Param>,
    ) -> Result<Self, SyntaxError> {
        let positive = lookup(POSITIVE_SIGN_DIRECTIVE)
            .map(|v| parse_nibble(POSITIVE_SIGN_DIRECTIVE, v))
            .transpose()?
            .unwrap_or(self.pack.positive_sign());
        let negative = lookup(NEGATIVE_SIGN_DIRECTIVE)
            .map(|v| parse_nibble(NEGATIVE_SIGN_DIRECTIVE, v))
            .transpose()?
            .unwrap_or(self.pack.negative_sign());
        let pack_byte = lookup(PACK_NIBBLE_DIRECTIVE)
            .map(|v| parse_byte(PACK_NIBBLE_DIRECTIVE, v))
            .transpose()?
            .unwrap_or(self.pack.pack_nibble());

        self.pack = PackSettings::new(pack_byte, positive, negative)
            .map_err(|e| SyntaxError::new(format!("invalid pack settings were specified. {e}.")))?;
        Ok(self)
    }
}

/// Read a directive value as a byte. Strings are hexadecimal (`"C"`,
/// `"30"`, `"0x30"`); integers are taken as is.
fn parse_byte(directive: &str, raw: &Param) -> Result<u8, SyntaxError> {
    let invalid = || {
        SyntaxError::new(format!(
            "invalid directive value was specified. {directive} must be a hexadecimal byte, but was [{raw}]."
        ))
    };
    match raw {
        Param::Text(text) => {
            let trimmed = text.trim();
            let digits = trimmed
                .strip_prefix("0x")
                .or_else(|| trimmed.strip_prefix("0X"))
                .unwrap_or(trimmed);
            u8::from_str_radix(digits, 16).map_err(|_| invalid())
        }
        Param::Integer(n) => u8::try_from(*n).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn parse_nibble(directive: &str, raw: &Param) -> Result<u8, SyntaxError> {
    let value = parse_byte(directive, raw)?;
    if value > 0x0F {
        return Err(SyntaxError::new(format!(
            "invalid directive value was specified. {directive} must be 0-F, but was [{raw}]."
        )));
    }
    Ok(value)
}
