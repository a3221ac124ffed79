//! Field definitions of a fixed-length record.

use recfmt_encoding::Charset;

use crate::value::Value;

/// Padding declared for a field with `pad(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Padding {
    /// A pad character, encoded in the field's charset when the converter
    /// is bound.
    Text(String),
    /// A raw pad byte, e.g. `pad(0x00)`.
    Byte(u8),
}

/// Immutable description of one field.
///
/// Built during layout compilation with the `with_*` methods and never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Field name.
    pub name: String,
    /// Start position within the record (1-based).
    pub position: usize,
    /// Field length in bytes.
    pub length: usize,
    /// Implied fraction digits (decimal converters only).
    pub scale: u32,
    /// Charset for character data.
    pub encoding: Charset,
    /// Value written when the record has none.
    pub default_value: Option<Value>,
    /// Pad declared in the layout.
    pub padding: Option<Padding>,
    /// Filler fields are written but not returned on read.
    pub filler: bool,
}

impl FieldDefinition {
    /// Create a definition with the given name and defaults for the rest
    /// (position 1, no length, scale 0, UTF-8).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: 1,
            length: 0,
            scale: 0,
            encoding: Charset::default(),
            default_value: None,
            padding: None,
            filler: false,
        }
    }

    /// Set the start position.
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Set the byte length.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Set the scale.
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the charset.
    pub fn with_encoding(mut self, encoding: Charset) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the padding.
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Mark the field as filler.
    pub fn as_filler(mut self) -> Self {
        self.filler = true;
        self
    }

    /// Zero-based byte range of the field within the record.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.position.saturating_sub(1);
        start..start + self.length
    }

    /// Resolve the value to write: an explicit value that is neither null
    /// nor empty wins, then the field default, then the value as given.
    pub fn resolve<'a>(&'a self, value: Option<&'a Value>) -> &'a Value {
        const NULL: &Value = &Value::Null;
        match (value, &self.default_value) {
            (Some(v), _) if !v.is_null_or_empty() => v,
            (_, Some(default)) => default,
            (Some(v), None) => v,
            (None, None) => NULL,
        }
    }
}
