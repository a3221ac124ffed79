//! Field-type converters.
//!
//! A converter maps the bytes of one field to a typed [`Value`] and back.
//! Every converter goes through the same life cycle:
//!
//! 1. [`DataType::initialize`] receives the raw parameter tokens written in
//!    the layout file (`X(10)`, `SP(10, 2)`) and resolves the field size.
//! 2. [`DataType::configure`] receives caller-side settings such as the
//!    packed-decimal sign nibbles.
//! 3. [`DataType::init`] binds the converter to its field definition.
//! 4. [`DataType::convert_on_read`] / [`DataType::convert_on_write`] are
//!    then called once per record.
//!
//! Converters are bound to exactly one field and keep no per-record state.

mod packed;
mod registry;
mod setting;
mod single_byte;

use std::fmt;

use rust_decimal::Decimal;

use crate::error::{InvalidDataFormat, SyntaxError};
use crate::field::FieldDefinition;
use crate::value::Value;

pub use packed::{PackedDecimal, PackedDecimalType, SignedPackedDecimal};
pub use registry::{ConvertorRegistry, DataTypeConstructor};
pub use setting::{
    ConvertorSetting, NEGATIVE_SIGN_DIRECTIVE, PACK_NIBBLE_DIRECTIVE, POSITIVE_SIGN_DIRECTIVE,
};
pub use single_byte::SingleByteCharacterString;

/// One parameter token of a layout type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Integer literal (`10`, `0x20`).
    Integer(i64),
    /// Non-integer numeric literal (`1.5`).
    Decimal(Decimal),
    /// String literal (`"a"`).
    Text(String),
    /// Absent value (programmatic callers only).
    Null,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Integer(n) => write!(f, "{n}"),
            Param::Decimal(d) => write!(f, "{d}"),
            Param::Text(s) => f.write_str(s),
            Param::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for Param {
    fn from(n: i64) -> Self {
        Param::Integer(n)
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Text(s.to_string())
    }
}

/// Field size resolved from the layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSize {
    /// Byte length.
    pub length: usize,
    /// Implied fraction digits.
    pub scale: u32,
}

/// A bidirectional mapping between a field's bytes and its typed value.
pub trait DataType: fmt::Debug + Send + Sync {
    /// Converter name used in messages (e.g. `SingleByteCharacterString`).
    fn name(&self) -> &'static str;

    /// Validate the layout parameter tokens and resolve the field size.
    ///
    /// `None` stands for a missing parameter sequence.
    fn initialize(&mut self, params: Option<&[Param]>) -> Result<FieldSize, SyntaxError>;

    /// Apply caller-side settings. Converters that have none ignore them.
    fn configure(&mut self, _setting: &ConvertorSetting) {}

    /// Bind the converter to its field.
    fn init(
        &mut self,
        field: &FieldDefinition,
        length: usize,
        scale: u32,
    ) -> Result<(), SyntaxError>;

    /// Convert the field's bytes to a value.
    fn convert_on_read(&self, bytes: &[u8]) -> Result<Value, InvalidDataFormat>;

    /// Convert a value to exactly [`size`](DataType::size) bytes.
    fn convert_on_write(&self, value: &Value) -> Result<Vec<u8>, InvalidDataFormat>;

    /// Byte length of the bound field.
    fn size(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Parameter checks shared by the converters
// ---------------------------------------------------------------------------

fn ordinal(index: usize) -> String {
    let n = index + 1;
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn join(params: &[Param]) -> String {
    params
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Require a non-empty parameter sequence whose first token is not null.
pub(crate) fn require_params<'a>(
    params: Option<&'a [Param]>,
    convertor: &str,
) -> Result<&'a [Param], SyntaxError> {
    let params = params.ok_or_else(|| {
        SyntaxError::new(format!(
            "initialize parameter was null. parameter must be specified. convertor=[{convertor}]."
        ))
    })?;
    match params.first() {
        None => Err(SyntaxError::new(format!(
            "parameter was not specified. parameter must be specified. convertor=[{convertor}]."
        ))),
        Some(Param::Null) => Err(SyntaxError::new(format!(
            "1st parameter was null. parameter=[{}]. convertor=[{convertor}].",
            join(params)
        ))),
        Some(_) => Ok(params),
    }
}

/// Reject sequences longer than `max`.
pub(crate) fn check_param_count(
    params: &[Param],
    max: usize,
    convertor: &str,
) -> Result<(), SyntaxError> {
    if params.len() > max {
        return Err(SyntaxError::new(format!(
            "invalid parameter count was specified. parameter count must be at most {max}, but was [{}]. parameter=[{}]. convertor=[{convertor}].",
            params.len(),
            join(params)
        )));
    }
    Ok(())
}

/// The integer at `index`, or `None` if the sequence is shorter.
pub(crate) fn integer_param(
    params: &[Param],
    index: usize,
    convertor: &str,
) -> Result<Option<i64>, SyntaxError> {
    match params.get(index) {
        None => Ok(None),
        Some(Param::Integer(n)) => Ok(Some(*n)),
        Some(Param::Null) => Err(SyntaxError::new(format!(
            "{} parameter was null. parameter=[{}]. convertor=[{convertor}].",
            ordinal(index),
            join(params)
        ))),
        Some(other) => Err(SyntaxError::new(format!(
            "invalid parameter type was specified. {} parameter must be an integer. parameter=[{other}]. convertor=[{convertor}].",
            ordinal(index)
        ))),
    }
}

/// The positive integer at `index`.
pub(crate) fn positive_param(
    params: &[Param],
    index: usize,
    convertor: &str,
) -> Result<usize, SyntaxError> {
    let value = integer_param(params, index, convertor)?.ok_or_else(|| {
        SyntaxError::new(format!(
            "{} parameter was not specified. convertor=[{convertor}].",
            ordinal(index)
        ))
    })?;
    usize::try_from(value)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            SyntaxError::new(format!(
                "invalid parameter was specified. {} parameter must be positive number, but was [{value}]. convertor=[{convertor}].",
                ordinal(index)
            ))
        })
}

/// Reject a zero field length at bind time.
pub(crate) fn check_length(length: usize, convertor: &str) -> Result<(), SyntaxError> {
    if length == 0 {
        return Err(SyntaxError::new(format!(
            "invalid parameter was specified. field length must be positive number, but was [0]. convertor=[{convertor}]."
        )));
    }
    Ok(())
}

/// Attach the field name to an error when the converter knows it.
pub(crate) fn with_field(err: InvalidDataFormat, field_name: &str) -> InvalidDataFormat {
    if field_name.is_empty() {
        err
    } else {
        err.with_field_name(field_name)
    }
}
