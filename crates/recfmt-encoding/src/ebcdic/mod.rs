//! EBCDIC encoding support for IBM mainframe code pages.
//!
//! Provides EBCDIC-to-Latin-1 and Latin-1-to-EBCDIC conversion for the
//! code pages fixed-length data files are most commonly written in.
//!
//! # Supported Code Pages
//!
//! - **CP037** (US/Canada)
//! - **CP1047** (Latin-1 / Open Systems)
//!
//! Use [`CodePage::by_name`] for runtime lookup.

mod tables;

pub use tables::{CodePage, CP037, CP1047};

use crate::error::EncodingError;
use crate::Result;

/// Names accepted for each built-in code page, compared case-insensitively.
static ALIASES: &[(&str, &CodePage)] = &[
    ("IBM-1047", &CP1047),
    ("IBM1047", &CP1047),
    ("CP1047", &CP1047),
    ("EBCDIC-1047", &CP1047),
    ("IBM-037", &CP037),
    ("IBM037", &CP037),
    ("CP037", &CP037),
    ("EBCDIC-037", &CP037),
    ("IBM-37", &CP037),
];

impl CodePage {
    /// Decode EBCDIC bytes to a UTF-8 string.
    ///
    /// Every byte has a Latin-1 counterpart, so decoding never fails.
    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|&b| char::from(self.ebcdic_to_ascii[b as usize]))
            .collect()
    }

    /// Encode a UTF-8 string to EBCDIC bytes.
    ///
    /// # Errors
    /// Returns `EncodingError::Unmappable` if the string contains
    /// characters outside the Latin-1 range.
    pub fn encode(&self, s: &str) -> Result<Vec<u8>> {
        let mut result = Vec::with_capacity(s.len());
        for ch in s.chars() {
            if ch as u32 > 0xFF {
                return Err(EncodingError::Unmappable {
                    ch,
                    charset: self.name.to_string(),
                });
            }
            result.push(self.ascii_to_ebcdic[ch as usize]);
        }
        Ok(result)
    }

    /// Look up a code page by name ("CP037", "IBM-1047", "IBM1047", ...).
    ///
    /// # Errors
    /// Returns `EncodingError::UnknownCharset` if the name is not recognized.
    pub fn by_name(name: &str) -> Result<&'static CodePage> {
        let trimmed = name.trim();
        ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
            .map(|(_, page)| *page)
            .ok_or_else(|| EncodingError::UnknownCharset {
                name: name.to_string(),
            })
    }
}
