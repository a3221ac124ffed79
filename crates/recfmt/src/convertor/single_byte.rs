//! Single-byte character string converter (`X`).

use recfmt_encoding::Charset;
use tracing::trace;

use super::{check_length, check_param_count, positive_param, require_params, with_field};
use super::{DataType, FieldSize, Param};
use crate::error::{InvalidDataFormat, SyntaxError};
use crate::field::{FieldDefinition, Padding};
use crate::value::Value;

/// String field whose characters are one byte each in the field charset.
///
/// Values are right-padded with the pad byte (a space in the field charset
/// unless `pad(...)` says otherwise). Reading returns the decoded bytes
/// as-is; trailing padding is not stripped.
#[derive(Debug, Clone)]
pub struct SingleByteCharacterString {
    size: usize,
    field_name: String,
    encoding: Charset,
    pad_byte: u8,
    default_value: Option<Value>,
}

impl SingleByteCharacterString {
    /// Converter name used in messages.
    pub const NAME: &'static str = "SingleByteCharacterString";

    /// Create an unbound converter.
    pub fn new() -> Self {
        Self {
            size: 0,
            field_name: String::new(),
            encoding: Charset::default(),
            pad_byte: b' ',
            default_value: None,
        }
    }

    /// The pad byte in effect.
    pub fn pad_byte(&self) -> u8 {
        self.pad_byte
    }

    fn resolve_pad_byte(field: &FieldDefinition) -> Result<u8, SyntaxError> {
        match &field.padding {
            Some(Padding::Byte(b)) => Ok(*b),
            Some(Padding::Text(pad)) => {
                let bytes = field.encoding.encode(pad).map_err(|e| {
                    SyntaxError::new(format!(
                        "invalid parameter was specified. padding string cannot be encoded. {e}. convertor=[{}].",
                        Self::NAME
                    ))
                })?;
                if bytes.len() != 1 {
                    return Err(SyntaxError::new(format!(
                        "invalid parameter was specified. the length of padding string must be 1. but specified one was {} byte long.",
                        bytes.len()
                    )));
                }
                Ok(bytes[0])
            }
            None => Ok(match field.encoding.encode(" ") {
                Ok(bytes) if bytes.len() == 1 => bytes[0],
                _ => b' ',
            }),
        }
    }

    fn text_of(&self, value: &Value) -> String {
        let value = match &self.default_value {
            Some(default) if value.is_null_or_empty() => default,
            _ => value,
        };
        match value {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Decimal(d) => d.to_string(),
        }
    }
}

impl Default for SingleByteCharacterString {
    fn default() -> Self {
        Self::new()
    }
}

impl DataType for SingleByteCharacterString {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn initialize(&mut self, params: Option<&[Param]>) -> Result<FieldSize, SyntaxError> {
        let params = require_params(params, Self::NAME)?;
        check_param_count(params, 1, Self::NAME)?;
        let length = positive_param(params, 0, Self::NAME)?;
        self.size = length;
        Ok(FieldSize { length, scale: 0 })
    }

    fn init(
        &mut self,
        field: &FieldDefinition,
        length: usize,
        _scale: u32,
    ) -> Result<(), SyntaxError> {
        check_length(length, Self::NAME)?;
        self.pad_byte = Self::resolve_pad_byte(field)?;
        self.size = length;
        self.field_name = field.name.clone();
        self.encoding = field.encoding;
        self.default_value = field.default_value.clone();
        Ok(())
    }

    fn convert_on_read(&self, bytes: &[u8]) -> Result<Value, InvalidDataFormat> {
        Ok(Value::Text(self.encoding.decode(bytes).into_owned()))
    }

    fn convert_on_write(&self, value: &Value) -> Result<Vec<u8>, InvalidDataFormat> {
        let text = self.text_of(value);
        let encoded = self.encoding.encode(&text).map_err(|e| {
            with_field(
                InvalidDataFormat::new(format!("invalid character was specified. {e}. data: {text}.")),
                &self.field_name,
            )
        })?;

        if encoded.len() > self.size {
            trace!(
                field = %self.field_name,
                field_size = self.size,
                data_size = encoded.len(),
                "rejected oversized value"
            );
            return Err(with_field(
                InvalidDataFormat::new(format!(
                    "too large data. field size = '{}' data size = '{}'. data: {text}.",
                    self.size,
                    encoded.len()
                )),
                &self.field_name,
            ));
        }

        let mut bytes = encoded.into_owned();
        bytes.resize(self.size, self.pad_byte);
        Ok(bytes)
    }

    fn size(&self) -> usize {
        self.size
    }
}
