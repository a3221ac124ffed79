//! Fixed-length record formatter.
//!
//! A formatter reads or writes records of one layout. It is created by a
//! [`FormatterFactory`], bound to a byte source or sink, and initialized
//! before use:
//!
//! ```no_run
//! use recfmt::{DataRecord, FormatterFactory};
//!
//! # fn main() -> recfmt::Result<()> {
//! let mut formatter = FormatterFactory::global().create_formatter("layout/format.fmt");
//! formatter
//!     .set_output_stream(std::fs::File::create("out.dat")?)
//!     .initialize()?;
//! formatter.write_record(&DataRecord::new().with("name", "abc"))?;
//! formatter.close()?;
//! # Ok(())
//! # }
//! ```

use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{FormatError, InvalidDataFormat, Result};
use crate::factory::FormatterFactory;
use crate::layout::CompiledLayout;
use crate::value::DataRecord;

type Input = BufReader<Box<dyn Read + Send>>;
type Output = BufWriter<Box<dyn Write + Send>>;

/// Reads and writes fixed-length records.
pub struct FixedLengthFormatter {
    factory: FormatterFactory,
    layout_path: PathBuf,
    layout: Option<CompiledLayout>,
    input: Option<Input>,
    output: Option<Output>,
    records_read: u64,
    records_written: u64,
}

impl std::fmt::Debug for FixedLengthFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedLengthFormatter")
            .field("layout_path", &self.layout_path)
            .field("initialized", &self.layout.is_some())
            .field("input", &self.input.is_some())
            .field("output", &self.output.is_some())
            .field("records_read", &self.records_read)
            .field("records_written", &self.records_written)
            .finish()
    }
}

impl FixedLengthFormatter {
    pub(crate) fn new(factory: FormatterFactory, layout_path: PathBuf) -> Self {
        Self {
            factory,
            layout_path,
            layout: None,
            input: None,
            output: None,
            records_read: 0,
            records_written: 0,
        }
    }

    /// Bind the byte source records are read from.
    pub fn set_input_stream(&mut self, input: impl Read + Send + 'static) -> &mut Self {
        self.input = Some(BufReader::new(Box::new(input)));
        self
    }

    /// Bind the byte sink records are written to.
    pub fn set_output_stream(&mut self, output: impl Write + Send + 'static) -> &mut Self {
        self.output = Some(BufWriter::new(Box::new(output)));
        self
    }

    /// Compile the layout and bind its converters.
    ///
    /// # Errors
    /// Returns [`FormatError::Syntax`] if the layout is invalid.
    pub fn initialize(&mut self) -> Result<&mut Self> {
        let layout = self.factory.compile(&self.layout_path)?;
        debug!(
            path = %self.layout_path.display(),
            record_length = layout.record_length(),
            "formatter initialized"
        );
        self.layout = Some(layout);
        Ok(self)
    }

    /// Layout file this formatter was created for.
    pub fn layout_path(&self) -> &Path {
        &self.layout_path
    }

    /// The compiled layout, once initialized.
    pub fn layout(&self) -> Option<&CompiledLayout> {
        self.layout.as_ref()
    }

    /// Whether more input remains.
    pub fn has_next(&mut self) -> Result<bool> {
        let input = self
            .input
            .as_mut()
            .ok_or(FormatError::StreamNotSet { direction: "input" })?;
        Ok(!input.fill_buf()?.is_empty())
    }

    /// Read the next record. Returns `None` at a clean end of input.
    ///
    /// Filler fields are decoded but not returned.
    ///
    /// # Errors
    /// Returns [`FormatError::InvalidData`] for a short record, a missing
    /// separator or field bytes a converter rejects.
    pub fn read_record(&mut self) -> Result<Option<DataRecord>> {
        let layout = self.layout.as_ref().ok_or(FormatError::NotInitialized)?;
        let input = self
            .input
            .as_mut()
            .ok_or(FormatError::StreamNotSet { direction: "input" })?;
        let record_number = self.records_read + 1;

        let mut buf = vec![0u8; layout.record_length()];
        let n = read_full(input, &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        if n < buf.len() {
            return Err(InvalidDataFormat::new(format!(
                "invalid data record found. the length of the record was shorter than record-length. record-length=[{}], actual length=[{n}].",
                buf.len()
            ))
            .with_record_number(record_number)
            .into());
        }

        let separator = layout.separator();
        if !separator.is_empty() {
            let mut sep = vec![0u8; separator.len()];
            let m = read_full(input, &mut sep)?;
            if m < sep.len() || sep != separator {
                return Err(InvalidDataFormat::new(format!(
                    "invalid record separator was found. expected=[{}], actual=[{}].",
                    hex(separator),
                    hex(&sep[..m])
                ))
                .with_record_number(record_number)
                .into());
            }
        }

        let mut record = DataRecord::new();
        for field in layout.fields() {
            let definition = field.definition();
            let value = field
                .convertor()
                .convert_on_read(&buf[definition.range()])
                .map_err(|e| {
                    e.with_field_name(definition.name.as_str())
                        .with_record_number(record_number)
                })?;
            if !definition.filler {
                record.put(definition.name.clone(), value);
            }
        }

        self.records_read = record_number;
        Ok(Some(record))
    }

    /// Write one record. Each field takes the record's value, else the
    /// field default, else `Null`.
    ///
    /// Nothing is written unless every field converts.
    pub fn write_record(&mut self, record: &DataRecord) -> Result<()> {
        let layout = self.layout.as_ref().ok_or(FormatError::NotInitialized)?;
        let output = self
            .output
            .as_mut()
            .ok_or(FormatError::StreamNotSet { direction: "output" })?;
        let record_number = self.records_written + 1;

        let mut buf = Vec::with_capacity(layout.record_length() + layout.separator().len());
        for field in layout.fields() {
            let definition = field.definition();
            let value = definition.resolve(record.get(&definition.name));
            let bytes = field.convertor().convert_on_write(value).map_err(|e| {
                e.with_field_name(definition.name.as_str())
                    .with_record_number(record_number)
            })?;
            if bytes.len() != definition.length {
                return Err(InvalidDataFormat::new(format!(
                    "converted data length did not match the field length. field length=[{}], data length=[{}].",
                    definition.length,
                    bytes.len()
                ))
                .with_field_name(definition.name.as_str())
                .with_record_number(record_number)
                .into());
            }
            buf.extend_from_slice(&bytes);
        }
        buf.extend_from_slice(layout.separator());

        output.write_all(&buf)?;
        self.records_written = record_number;
        Ok(())
    }

    /// Flush and release the streams.
    pub fn close(&mut self) -> Result<()> {
        self.input = None;
        let flushed = match self.output.take() {
            Some(mut output) => output.flush(),
            None => Ok(()),
        };
        info!(
            path = %self.layout_path.display(),
            records_read = self.records_read,
            records_written = self.records_written,
            "formatter closed"
        );
        Ok(flushed?)
    }
}

/// Read until `buf` is full or the input ends. Returns the bytes read.
fn read_full(input: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Sink whose contents stay inspectable after the formatter takes it.
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedSink {
        fn bytes(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    fn formatter(layout: &str) -> (tempfile::TempDir, FixedLengthFormatter) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("format.fmt");
        std::fs::write(&path, layout).unwrap();
        let factory = FormatterFactory::new();
        factory.set_cache_layout_file_definition(false);
        let formatter = factory.create_formatter(&path);
        (dir, formatter)
    }

    const LAYOUT: &str = "file-type: \"Fixed\"\ntext-encoding: \"sjis\"\nrecord-length: 8\nrecord-separator: \"\\n\"\n[R]\n1 name X(4)\n5 amount SP(3)\n8 ?filler X(1)\n";

    #[test]
    fn test_read_before_initialize() {
        let (_dir, mut formatter) = formatter(LAYOUT);
        formatter.set_input_stream(Cursor::new(Vec::new()));
        assert!(matches!(formatter.read_record(), Err(FormatError::NotInitialized)));
    }

    #[test]
    fn test_stream_not_set() {
        let (_dir, mut formatter) = formatter(LAYOUT);
        formatter.initialize().unwrap();
        assert!(matches!(
            formatter.read_record(),
            Err(FormatError::StreamNotSet { direction: "input" })
        ));
        assert!(matches!(
            formatter.write_record(&DataRecord::new()),
            Err(FormatError::StreamNotSet { direction: "output" })
        ));
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, mut writer) = formatter(LAYOUT);
        let sink = SharedSink::default();
        writer.set_output_stream(sink.clone()).initialize().unwrap();
        writer
            .write_record(&DataRecord::new().with("name", "ab").with("amount", "-123"))
            .unwrap();
        writer.write_record(&DataRecord::new()).unwrap();
        writer.close().unwrap();

        let bytes = sink.bytes();
        assert_eq!(
            bytes,
            vec![b'a', b'b', b' ', b' ', 0x00, 0x12, 0x37, b' ', b'\n', b' ', b' ', b' ', b' ', 0x00, 0x00, 0x03, b' ', b'\n']
        );

        let mut reader = writer;
        reader.set_input_stream(Cursor::new(bytes));
        let first = reader.read_record().unwrap().unwrap();
        assert_eq!(first.get_text("name"), Some("ab  "));
        assert_eq!(first.get_decimal("amount"), Some(Decimal::from(-123i64)));
        assert!(!first.contains("filler"));
        assert!(reader.has_next().unwrap());
        let second = reader.read_record().unwrap().unwrap();
        assert_eq!(second.get_decimal("amount"), Some(Decimal::ZERO));
        assert!(!reader.has_next().unwrap());
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn test_short_record() {
        let (_dir, mut formatter) = formatter(LAYOUT);
        formatter
            .set_input_stream(Cursor::new(b"abc".to_vec()))
            .initialize()
            .unwrap();
        match formatter.read_record() {
            Err(FormatError::InvalidData(e)) => {
                assert!(e.message().starts_with("invalid data record found."));
                assert_eq!(e.record_number(), Some(1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_separator() {
        let (_dir, mut formatter) = formatter(LAYOUT);
        let mut data = vec![b'a', b'b', b'c', b'd', 0x00, 0x00, 0x03, b' '];
        data.push(b'X');
        formatter.set_input_stream(Cursor::new(data)).initialize().unwrap();
        match formatter.read_record() {
            Err(FormatError::InvalidData(e)) => {
                assert!(e.message().starts_with("invalid record separator was found."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_read_error_carries_field_and_record() {
        let (_dir, mut formatter) = formatter(LAYOUT);
        let data = vec![
            b'a', b'b', b'c', b'd', 0x00, 0x00, 0x03, b' ', b'\n', // record 1
            b'a', b'b', b'c', b'd', 0x00, 0x00, 0x06, b' ', b'\n', // bad sign
        ];
        formatter.set_input_stream(Cursor::new(data)).initialize().unwrap();
        formatter.read_record().unwrap();
        match formatter.read_record() {
            Err(FormatError::InvalidData(e)) => {
                assert!(e.message().starts_with("invalid pack bits was specified."));
                assert_eq!(e.field_name(), Some("amount"));
                assert_eq!(e.record_number(), Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_failed_write_writes_nothing() {
        let (_dir, mut formatter) = formatter(LAYOUT);
        let sink = SharedSink::default();
        formatter.set_output_stream(sink.clone()).initialize().unwrap();
        let err = formatter
            .write_record(&DataRecord::new().with("name", "ab").with("amount", "12345678"))
            .unwrap_err();
        assert!(matches!(err, FormatError::InvalidData(_)));
        formatter.close().unwrap();
        assert!(sink.bytes().is_empty());
    }
}
