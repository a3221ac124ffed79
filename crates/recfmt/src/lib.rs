//! # recfmt: Fixed-Length Record Formatter
//!
//! Reads and writes fixed-length record files described by a layout
//! definition file, converting each field between bytes and [`Value`]s.
//!
//! ## Modules
//!
//! - **layout**: layout file scanner and parser, and binding of parsed
//!   layouts to converter instances
//! - **convertor**: field data types: `X` single-byte strings, `SP`/`P`
//!   packed decimals, and the registry that maps names to them
//! - **formatter**: record reading and writing over byte streams
//! - **factory**: formatter creation with a shared layout cache
//! - **config** / **tracing_setup**: YAML configuration and logging
//!
//! ## Layout files
//!
//! ```text
//! file-type:        "Fixed"
//! text-encoding:    "sjis"
//! record-length:    15
//! record-separator: "\r\n"
//!
//! [Default]
//! 1   name     X(10)   "abc"   # default value
//! 11  amount   SP(5, 2)
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod convertor;
pub mod error;
pub mod factory;
pub mod field;
pub mod formatter;
pub mod layout;
pub mod tracing_setup;
pub mod value;

pub use config::{ConfigError, RecfmtConfig};
pub use convertor::{
    ConvertorRegistry, ConvertorSetting, DataType, FieldSize, PackedDecimal, Param,
    SignedPackedDecimal, SingleByteCharacterString,
};
pub use error::{FormatError, InvalidDataFormat, Result, SyntaxError};
pub use factory::FormatterFactory;
pub use field::{FieldDefinition, Padding};
pub use formatter::FixedLengthFormatter;
pub use layout::{CompiledLayout, LayoutDefinition};
pub use tracing_setup::{init_tracing, init_tracing_with_config, LogFormat, TracingConfig};
pub use value::{DataRecord, Value};

pub use recfmt_encoding::{Charset, PackSettings};
