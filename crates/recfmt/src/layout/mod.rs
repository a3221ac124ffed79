//! Layout definition files.
//!
//! A layout file declares the file-level directives followed by one record
//! type and its fields:
//!
//! ```text
//! file-type:      "Fixed"
//! text-encoding:  "sjis"
//! record-length:  10
//!
//! [Default]
//! 1    name     X(10)   "abc"  pad(" ")
//! ```
//!
//! Parsing only checks the grammar. Field sizes are resolved by the
//! converters when the layout is bound (see [`CompiledLayout`]).

mod compiled;
pub mod parser;
pub mod scanner;
pub mod token;

use std::path::PathBuf;

use crate::convertor::Param;

pub use compiled::{BoundField, CompiledLayout};
pub use parser::{parse_layout, parse_layout_file};

/// The only supported `file-type`.
pub const FIXED_FILE_TYPE: &str = "Fixed";

/// A file-level `name: value` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Directive name.
    pub name: String,
    /// Raw value token.
    pub value: Param,
    /// 1-based line number.
    pub line: usize,
}

/// One field line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Declared 1-based start position.
    pub position: usize,
    /// Field name.
    pub name: String,
    /// `?name` fields are written but not returned on read.
    pub filler: bool,
    /// Converter name (`X`, `SP`, ...).
    pub type_name: String,
    /// Converter parameter tokens.
    pub params: Vec<Param>,
    /// Default value literal.
    pub default_value: Option<Param>,
    /// `pad(...)` argument.
    pub padding: Option<Param>,
    /// `encoding(...)` argument.
    pub encoding: Option<String>,
    /// 1-based line number.
    pub line: usize,
}

/// Parsed, unbound layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDefinition {
    /// File the layout was read from.
    pub file_path: Option<PathBuf>,
    /// Directives in declaration order.
    pub directives: Vec<Directive>,
    /// `text-encoding` directive.
    pub text_encoding: Option<String>,
    /// `record-length` directive.
    pub record_length: usize,
    /// `record-separator` directive.
    pub record_separator: Option<String>,
    /// Record type name.
    pub record_type: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl LayoutDefinition {
    /// Raw value of a directive.
    pub fn directive(&self, name: &str) -> Option<&Param> {
        self.directives
            .iter()
            .find(|d| d.name == name)
            .map(|d| &d.value)
    }
}
