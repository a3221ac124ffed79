//! Packed-decimal converters (`SP` signed, `P` unsigned).

use recfmt_encoding::{digit_capacity, pack_digits, unpack_decimal, EncodingError, PackSettings, Sign};
use tracing::trace;

use super::{check_length, check_param_count, integer_param, positive_param, require_params, with_field};
use super::{ConvertorSetting, DataType, FieldSize, Param};
use crate::error::{InvalidDataFormat, SyntaxError};
use crate::field::FieldDefinition;
use crate::value::Value;

/// Largest number of significant digits accepted on write, whatever the
/// field length.
pub const MAX_DIGITS: usize = 18;

/// Largest scale a field may declare.
pub const MAX_SCALE: u32 = 28;

/// Signed packed decimal (`SP`).
pub type SignedPackedDecimal = PackedDecimalType<true>;

/// Unsigned packed decimal (`P`).
pub type PackedDecimal = PackedDecimalType<false>;

/// Packed-decimal converter, signed or unsigned.
///
/// Sign nibbles come from [`PackSettings`] and are never inferred from the
/// field charset; the factory resolves them before binding.
#[derive(Debug, Clone)]
pub struct PackedDecimalType<const SIGNED: bool> {
    size: usize,
    scale: u32,
    settings: PackSettings,
    field_name: String,
    default_value: Option<Value>,
}

/// Sign and unscaled digits of a value about to be packed.
struct Unscaled {
    negative: bool,
    digits: String,
    scale: u32,
}

impl<const SIGNED: bool> PackedDecimalType<SIGNED> {
    /// Converter name used in messages.
    pub const NAME: &'static str = if SIGNED {
        "SignedPackedDecimal"
    } else {
        "PackedDecimal"
    };

    /// Create an unbound converter with ASCII sign nibbles.
    pub fn new() -> Self {
        Self {
            size: 0,
            scale: 0,
            settings: PackSettings::default(),
            field_name: String::new(),
            default_value: None,
        }
    }

    /// Replace the nibble configuration.
    pub fn set_pack_settings(&mut self, settings: PackSettings) {
        self.settings = settings;
    }

    /// Replace the pack byte. Only its low nibble is kept.
    pub fn set_pack_nibble(&mut self, pack_byte: u8) {
        self.settings = self.settings.with_pack_byte(pack_byte);
    }

    /// Replace the sign nibbles.
    pub fn set_sign_nibbles(&mut self, positive: u8, negative: u8) -> Result<(), SyntaxError> {
        self.settings = PackSettings::new(self.settings.pack_nibble(), positive, negative)
            .map_err(|e| {
                SyntaxError::new(format!(
                    "invalid parameter was specified. {e}. convertor=[{}].",
                    Self::NAME
                ))
            })?;
        Ok(())
    }

    /// Nibble configuration in effect.
    pub fn pack_settings(&self) -> &PackSettings {
        &self.settings
    }

    /// Scale of the bound field.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    fn data_error(&self, message: String) -> InvalidDataFormat {
        with_field(InvalidDataFormat::new(message), &self.field_name)
    }

    fn check_scale(scale: i64) -> Result<u32, SyntaxError> {
        u32::try_from(scale)
            .ok()
            .filter(|s| *s <= MAX_SCALE)
            .ok_or_else(|| {
                SyntaxError::new(format!(
                    "invalid parameter was specified. 2nd parameter must be 0 or more and {MAX_SCALE} or less, but was [{scale}]. convertor=[{}].",
                    Self::NAME
                ))
            })
    }

    /// Split a textual decimal into sign and unscaled digits.
    fn parse_text(&self, text: &str) -> Result<Unscaled, InvalidDataFormat> {
        let invalid = || {
            self.data_error(format!(
                "invalid parameter format was specified. parameter must be a decimal number. parameter=[{text}]."
            ))
        };
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty()
            || !all_digits(int_part)
            || (body.contains('.') && frac_part.is_empty())
            || !all_digits(frac_part)
        {
            return Err(invalid());
        }
        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        Ok(Unscaled {
            negative,
            digits: strip_leading_zeros(&format!("{int_part}{frac_part}")),
            scale,
        })
    }

    fn unscaled_of(&self, value: &Value) -> Result<Option<(Unscaled, String)>, InvalidDataFormat> {
        match value {
            Value::Null => Ok(None),
            Value::Text(s) if s.is_empty() => Ok(None),
            Value::Text(s) => Ok(Some((self.parse_text(s)?, s.clone()))),
            Value::Decimal(d) => Ok(Some((
                Unscaled {
                    negative: d.is_sign_negative() && !d.is_zero(),
                    digits: d.mantissa().unsigned_abs().to_string(),
                    scale: d.scale(),
                },
                d.to_string(),
            ))),
        }
    }

    fn encode(&self, unscaled: Unscaled, original: &str) -> Result<Vec<u8>, InvalidDataFormat> {
        let Unscaled {
            negative,
            mut digits,
            mut scale,
        } = unscaled;

        // A scaled field only accepts fraction digits it can hold. Trailing
        // zeros beyond the scale carry no value and are dropped.
        if self.scale > 0 && scale > self.scale {
            while scale > self.scale && digits.len() > 1 && digits.ends_with('0') {
                digits.pop();
                scale -= 1;
            }
            if digits == "0" {
                scale = self.scale;
            }
            if scale > self.scale {
                trace!(field = %self.field_name, scale, field_scale = self.scale, "rejected fraction digits");
                return Err(self.data_error(format!(
                    "invalid parameter was specified. the number of fraction digits must be {} or less, but was '{scale}'. parameter=[{original}].",
                    self.scale
                )));
            }
        }

        if digits != "0" && self.scale > scale {
            digits.extend(std::iter::repeat('0').take((self.scale - scale) as usize));
        }
        let negative = negative && digits != "0";

        if digits.len() > MAX_DIGITS {
            trace!(field = %self.field_name, digits = digits.len(), "rejected value over digit cap");
            let message = if scale == 0 && self.scale == 0 {
                format!(
                    "invalid parameter was specified. the number of parameter digits must be {MAX_DIGITS} or less, but was '{}'. parameter=[{original}].",
                    digits.len()
                )
            } else {
                let sign = if negative { "-" } else { "" };
                format!(
                    "invalid parameter was specified. the number of unscaled parameter digits must be {MAX_DIGITS} or less, but was '{}'. unscaled parameter=[{sign}{digits}], original parameter=[{original}].",
                    digits.len()
                )
            };
            return Err(self.data_error(message));
        }

        if digits.len() > digit_capacity(self.size) {
            return Err(self.data_error(format!(
                "invalid parameter was specified. too large data. field size = '{}' data size = '{}'. data: {original}.",
                self.size,
                digits.len() / 2 + 1
            )));
        }

        if negative && !SIGNED {
            return Err(self.data_error(format!(
                "invalid parameter was specified. negative value is not allowed for unsigned packed decimal. parameter=[{original}]."
            )));
        }

        let sign = if negative { Sign::Negative } else { Sign::Positive };
        pack_digits(&digits, sign, self.size, &self.settings)
            .map_err(|e| self.data_error(format!("invalid parameter was specified. {e}. parameter=[{original}].")))
    }
}

fn strip_leading_zeros(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl<const SIGNED: bool> Default for PackedDecimalType<SIGNED> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIGNED: bool> DataType for PackedDecimalType<SIGNED> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, params: Option<&[Param]>) -> Result<FieldSize, SyntaxError> {
        let params = require_params(params, Self::NAME)?;
        check_param_count(params, 2, Self::NAME)?;
        let length = positive_param(params, 0, Self::NAME)?;
        let scale = match integer_param(params, 1, Self::NAME)? {
            Some(scale) => Self::check_scale(scale)?,
            None => 0,
        };
        self.size = length;
        self.scale = scale;
        Ok(FieldSize { length, scale })
    }

    fn configure(&mut self, setting: &ConvertorSetting) {
        self.settings = *setting.pack_settings();
    }

    fn init(
        &mut self,
        field: &FieldDefinition,
        length: usize,
        scale: u32,
    ) -> Result<(), SyntaxError> {
        check_length(length, Self::NAME)?;
        self.scale = Self::check_scale(i64::from(scale))?;
        self.size = length;
        self.field_name = field.name.clone();
        self.default_value = field.default_value.clone();
        Ok(())
    }

    fn convert_on_read(&self, bytes: &[u8]) -> Result<Value, InvalidDataFormat> {
        let (value, sign) = unpack_decimal(bytes, self.scale, &self.settings).map_err(|e| {
            trace!(field = %self.field_name, data = %hex(bytes), error = %e, "rejected packed bytes");
            let message = match e {
                EncodingError::InvalidSignNibble { .. } | EncodingError::InvalidDigitNibble { .. } => {
                    format!("invalid pack bits was specified. {e}. data=[{}].", hex(bytes))
                }
                other => format!("invalid data was specified. {other}. data=[{}].", hex(bytes)),
            };
            self.data_error(message)
        })?;
        if sign.is_negative() && !SIGNED {
            return Err(self.data_error(format!(
                "invalid pack bits was specified. negative sign nibble is not allowed for unsigned packed decimal. data=[{}].",
                hex(bytes)
            )));
        }
        Ok(Value::Decimal(value))
    }

    fn convert_on_write(&self, value: &Value) -> Result<Vec<u8>, InvalidDataFormat> {
        let resolved = match self.unscaled_of(value)? {
            Some(found) => Some(found),
            None => match &self.default_value {
                Some(default) => self.unscaled_of(default)?,
                None => None,
            },
        };
        let (unscaled, original) = resolved.unwrap_or_else(|| {
            (
                Unscaled {
                    negative: false,
                    digits: "0".to_string(),
                    scale: 0,
                },
                "0".to_string(),
            )
        });
        self.encode(unscaled, &original)
    }

    fn size(&self) -> usize {
        self.size
    }
}
