//! Binding a parsed layout to converter instances.

use std::sync::Arc;

use recfmt_encoding::{Charset, PackSettings};
use rust_decimal::Decimal;
use tracing::debug;

use super::{FieldSpec, LayoutDefinition};
use crate::convertor::{ConvertorRegistry, ConvertorSetting, DataType, Param};
use crate::error::SyntaxError;
use crate::field::{FieldDefinition, Padding};
use crate::value::Value;

/// A field definition with its own converter instance.
#[derive(Debug)]
pub struct BoundField {
    definition: FieldDefinition,
    convertor: Box<dyn DataType>,
}

impl BoundField {
    /// The field definition.
    pub fn definition(&self) -> &FieldDefinition {
        &self.definition
    }

    /// The bound converter.
    pub fn convertor(&self) -> &dyn DataType {
        self.convertor.as_ref()
    }
}

/// A layout whose fields are bound to converters, ready for record I/O.
///
/// Built fresh for every formatter; the parsed [`LayoutDefinition`] it
/// comes from may be shared.
#[derive(Debug)]
pub struct CompiledLayout {
    definition: Arc<LayoutDefinition>,
    charset: Charset,
    setting: ConvertorSetting,
    separator: Vec<u8>,
    fields: Vec<BoundField>,
}

impl CompiledLayout {
    /// Bind every field of `definition`.
    ///
    /// `default_charset` applies when the layout has no `text-encoding`.
    /// `pack_defaults` replaces the charset-derived sign nibbles; layout
    /// directives override both.
    pub fn bind(
        definition: Arc<LayoutDefinition>,
        registry: &ConvertorRegistry,
        default_charset: Charset,
        pack_defaults: Option<PackSettings>,
    ) -> Result<Self, SyntaxError> {
        let located = |e: SyntaxError| match &definition.file_path {
            Some(path) => e.with_file_path(path),
            None => e,
        };

        let charset = match &definition.text_encoding {
            Some(name) => resolve_charset(name).map_err(located)?,
            None => default_charset,
        };

        let mut setting = ConvertorSetting::for_charset(charset);
        if let Some(pack) = pack_defaults {
            setting = setting.with_pack_settings(pack);
        }
        let setting = setting
            .apply_directives(|name| definition.directive(name))
            .map_err(located)?;

        let separator = match &definition.record_separator {
            Some(sep) => charset
                .encode(sep)
                .map(|bytes| bytes.into_owned())
                .map_err(|e| {
                    located(SyntaxError::new(format!(
                        "invalid record-separator was specified. {e}."
                    )))
                })?,
            None => Vec::new(),
        };

        let mut fields = Vec::with_capacity(definition.fields.len());
        let mut next_position = 1;
        for spec in &definition.fields {
            let field = bind_field(spec, registry, charset, &setting, next_position)
                .map_err(|e| located(e.with_line(spec.line)))?;
            next_position += field.definition.length;
            fields.push(field);
        }

        let total = next_position - 1;
        if total != definition.record_length {
            return Err(located(SyntaxError::new(format!(
                "invalid record length was specified. the sum of field lengths [{total}] must be equal to record-length [{}]. record type=[{}].",
                definition.record_length, definition.record_type
            ))));
        }

        debug!(
            record_type = %definition.record_type,
            record_length = definition.record_length,
            charset = %charset,
            fields = fields.len(),
            "bound layout"
        );

        Ok(Self {
            definition,
            charset,
            setting,
            separator,
            fields,
        })
    }

    /// The parsed layout.
    pub fn definition(&self) -> &Arc<LayoutDefinition> {
        &self.definition
    }

    /// Bytes per record, separator excluded.
    pub fn record_length(&self) -> usize {
        self.definition.record_length
    }

    /// Layout charset.
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Converter settings applied to every field.
    pub fn setting(&self) -> &ConvertorSetting {
        &self.setting
    }

    /// Encoded record separator; empty when the layout declares none.
    pub fn separator(&self) -> &[u8] {
        &self.separator
    }

    /// Bound fields in record order.
    pub fn fields(&self) -> &[BoundField] {
        &self.fields
    }
}

fn resolve_charset(name: &str) -> Result<Charset, SyntaxError> {
    Charset::for_name(name).map_err(|e| {
        SyntaxError::new(format!(
            "invalid encoding was specified. {e}. encoding=[{name}]."
        ))
    })
}

fn bind_field(
    spec: &FieldSpec,
    registry: &ConvertorRegistry,
    layout_charset: Charset,
    setting: &ConvertorSetting,
    expected_position: usize,
) -> Result<BoundField, SyntaxError> {
    if spec.position != expected_position {
        return Err(SyntaxError::new(format!(
            "invalid field position was specified. field=[{}], position=[{}], expected position=[{expected_position}].",
            spec.name, spec.position
        )));
    }

    let mut convertor = registry.create(&spec.type_name).ok_or_else(|| {
        SyntaxError::new(format!(
            "invalid data type was specified. data type=[{}].",
            spec.type_name
        ))
    })?;
    convertor.configure(setting);
    let size = convertor.initialize(Some(spec.params.as_slice()))?;

    let encoding = match &spec.encoding {
        Some(name) => resolve_charset(name)?,
        None => layout_charset,
    };

    let mut definition = FieldDefinition::new(spec.name.clone())
        .with_position(spec.position)
        .with_length(size.length)
        .with_scale(size.scale)
        .with_encoding(encoding);
    if let Some(default) = spec.default_value.as_ref().and_then(default_value) {
        definition = definition.with_default(default);
    }
    if let Some(pad) = &spec.padding {
        definition = definition.with_padding(padding(pad)?);
    }
    if spec.filler {
        definition = definition.as_filler();
    }

    convertor.init(&definition, size.length, size.scale)?;
    Ok(BoundField {
        definition,
        convertor,
    })
}

fn default_value(literal: &Param) -> Option<Value> {
    match literal {
        Param::Text(s) => Some(Value::Text(s.clone())),
        Param::Integer(n) => Some(Value::Decimal(Decimal::from(*n))),
        Param::Decimal(d) => Some(Value::Decimal(*d)),
        Param::Null => None,
    }
}

fn padding(literal: &Param) -> Result<Padding, SyntaxError> {
    match literal {
        Param::Text(s) => Ok(Padding::Text(s.clone())),
        Param::Integer(n) => u8::try_from(*n).map(Padding::Byte).map_err(|_| {
            SyntaxError::new(format!(
                "invalid parameter was specified. pad byte must be 0 or more and 255 or less, but was [{n}]."
            ))
        }),
        other => Err(SyntaxError::new(format!(
            "invalid parameter was specified. pad must be a string or a byte value, but was [{other}]."
        ))),
    }
}
