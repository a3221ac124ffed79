//! Character sets and packed decimal for fixed-length record files.
//!
//! This crate provides the byte-level encodings the `recfmt` converters
//! are built on.
//!
//! # Features
//!
//! - **Charset handle**: EBCDIC code pages (CP037, CP1047) and every
//!   WHATWG encoding (Shift_JIS / Windows-31J, UTF-8, ...)
//! - **Packed Decimal**: BCD encoding with configurable sign nibbles
//!
//! # Example
//!
//! ```rust
//! use recfmt_encoding::{pack_digits, unpack_decimal, Charset, PackSettings, Sign};
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//!
//! let cp1047 = Charset::for_name("IBM-1047").unwrap();
//! let ebcdic = cp1047.encode("HELLO").unwrap();
//! assert_eq!(cp1047.decode(&ebcdic), "HELLO");
//!
//! let packed = pack_digits("87654321", Sign::Negative, 5, &PackSettings::ebcdic()).unwrap();
//! assert_eq!(packed, vec![0x08, 0x76, 0x54, 0x32, 0x1D]);
//! let (unpacked, _sign) = unpack_decimal(&packed, 0, &PackSettings::ebcdic()).unwrap();
//! assert_eq!(unpacked, Decimal::from_str("-87654321").unwrap());
//! ```

pub mod charset;
pub mod decimal;
pub mod ebcdic;
pub mod error;

// Re-export commonly used types at crate root
pub use charset::Charset;
pub use decimal::{
    digit_capacity, pack_digits, unpack_decimal, unpack_digits, PackSettings, Sign,
};
pub use ebcdic::{CodePage, CP037, CP1047};
pub use error::EncodingError;

/// Result type for encoding operations.
pub type Result<T> = std::result::Result<T, EncodingError>;
