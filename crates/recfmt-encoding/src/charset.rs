//! Character-set handle used by string fields.
//!
//! A [`Charset`] resolves either to one of the built-in EBCDIC code pages or
//! to an [`encoding_rs::Encoding`] (Shift_JIS / Windows-31J, UTF-8, the
//! Windows single-byte pages, ...).

use std::borrow::Cow;
use std::fmt;

use encoding_rs::Encoding;

use crate::ebcdic::CodePage;
use crate::error::EncodingError;
use crate::Result;

/// Opaque handle naming the character set of a field.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// An IBM EBCDIC code page.
    Ebcdic(&'static CodePage),
    /// A WHATWG encoding provided by `encoding_rs`.
    Standard(&'static Encoding),
}

impl Charset {
    /// UTF-8.
    pub fn utf_8() -> Self {
        Charset::Standard(encoding_rs::UTF_8)
    }

    /// Shift_JIS (Windows-31J flavour, as `sjis` / `MS932` resolve).
    pub fn shift_jis() -> Self {
        Charset::Standard(encoding_rs::SHIFT_JIS)
    }

    /// Resolve a charset label.
    ///
    /// IBM code page names are checked first; everything else is looked up
    /// as a WHATWG label, so `sjis`, `MS932` and `windows-31j` all resolve to
    /// Shift_JIS.
    ///
    /// # Errors
    /// Returns `EncodingError::UnknownCharset` for unrecognized labels.
    pub fn for_name(name: &str) -> Result<Self> {
        if let Ok(page) = CodePage::by_name(name) {
            return Ok(Charset::Ebcdic(page));
        }
        Encoding::for_label(name.trim().as_bytes())
            .map(Charset::Standard)
            .ok_or_else(|| EncodingError::UnknownCharset {
                name: name.to_string(),
            })
    }

    /// Canonical name of the charset.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Ebcdic(page) => page.name,
            Charset::Standard(encoding) => encoding.name(),
        }
    }

    /// Whether this is an EBCDIC code page.
    pub fn is_ebcdic(&self) -> bool {
        matches!(self, Charset::Ebcdic(_))
    }

    /// Encode a string.
    ///
    /// # Errors
    /// Returns `EncodingError::Unmappable` for the first character the
    /// charset cannot represent.
    pub fn encode<'a>(&self, s: &'a str) -> Result<Cow<'a, [u8]>> {
        match self {
            Charset::Ebcdic(page) => page.encode(s).map(Cow::Owned),
            Charset::Standard(encoding) => {
                let (bytes, used, had_errors) = encoding.encode(s);
                if used != *encoding {
                    // encoding_rs only decodes UTF-16; it encodes those as UTF-8.
                    return Err(EncodingError::ConversionFailed {
                        message: format!("{} is a decode-only charset", encoding.name()),
                    });
                }
                if had_errors {
                    let ch = first_unmappable(*encoding, s).unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Err(EncodingError::Unmappable {
                        ch,
                        charset: encoding.name().to_string(),
                    });
                }
                Ok(bytes)
            }
        }
    }

    /// Decode bytes, replacing malformed sequences with U+FFFD.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            Charset::Ebcdic(page) => Cow::Owned(page.decode(bytes)),
            Charset::Standard(encoding) => encoding.decode_without_bom_handling(bytes).0,
        }
    }
}

fn first_unmappable(encoding: &'static Encoding, s: &str) -> Option<char> {
    let mut buf = [0u8; 4];
    s.chars()
        .find(|ch| encoding.encode(ch.encode_utf8(&mut buf)).2)
}

impl Default for Charset {
    fn default() -> Self {
        Charset::utf_8()
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.name()).finish()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sjis_labels() {
        for label in ["sjis", "MS932", "windows-31j", "Shift_JIS"] {
            assert_eq!(Charset::for_name(label).unwrap(), Charset::shift_jis(), "{label}");
        }
    }

    #[test]
    fn test_ebcdic_labels() {
        let cs = Charset::for_name("IBM1047").unwrap();
        assert!(cs.is_ebcdic());
        assert_eq!(cs.name(), "IBM-1047");
    }

    #[test]
    fn test_unknown_label() {
        assert!(matches!(
            Charset::for_name("no-such-charset"),
            Err(EncodingError::UnknownCharset { .. })
        ));
    }

    #[test]
    fn test_full_width_space_is_two_bytes_in_sjis() {
        let bytes = Charset::shift_jis().encode("\u{3000}").unwrap();
        assert_eq!(bytes.as_ref(), &[0x81, 0x40]);
    }

    #[test]
    fn test_unmappable_in_sjis() {
        let err = Charset::shift_jis().encode("ab\u{1F600}").unwrap_err();
        assert!(matches!(err, EncodingError::Unmappable { ch: '\u{1F600}', .. }));
    }

    #[test]
    fn test_decode_ascii_in_sjis() {
        assert_eq!(Charset::shift_jis().decode(b"0123456789"), "0123456789");
        assert_eq!(Charset::shift_jis().decode(b""), "");
    }

    #[test]
    fn test_decode_ebcdic() {
        let cs = Charset::for_name("IBM-1047").unwrap();
        assert_eq!(cs.decode(&[0xC1, 0xC2, 0x40]), "AB ");
    }
}
