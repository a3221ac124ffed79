//! End-to-end record I/O against files on disk.

use std::fs::File;

use recfmt::{DataRecord, FormatError, FormatterFactory, Value};
use rust_decimal::Decimal;

const LAYOUT: &str = r#"
file-type:        "Fixed"
text-encoding:    "IBM-1047"
record-length:    16
record-separator: "\n"

[Customer]
1   id        X(4)
5   name      X(6)    "NONAME"
11  balance   SP(4, 2)
15 ?reserved  X(2)    pad(0x00)
"#;

fn setup() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customer.fmt");
    std::fs::write(&path, LAYOUT).unwrap();
    (dir, path)
}

#[test]
fn test_file_round_trip() {
    let (dir, layout) = setup();
    let data = dir.path().join("customer.dat");
    let factory = FormatterFactory::new();

    let mut writer = factory.create_formatter(&layout);
    writer
        .set_output_stream(File::create(&data).unwrap())
        .initialize()
        .unwrap();
    writer
        .write_record(
            &DataRecord::new()
                .with("id", "0001")
                .with("name", "ALICE")
                .with("balance", Decimal::new(12345, 2)),
        )
        .unwrap();
    writer
        .write_record(
            &DataRecord::new()
                .with("id", "0002")
                .with("balance", "-0.5"),
        )
        .unwrap();
    writer.close().unwrap();

    let bytes = std::fs::read(&data).unwrap();
    assert_eq!(bytes.len(), 2 * 17);
    // "0001" in IBM-1047
    assert_eq!(&bytes[0..4], &[0xF0, 0xF0, 0xF0, 0xF1]);
    // 123.45 packed with the EBCDIC positive sign
    assert_eq!(&bytes[10..14], &[0x00, 0x12, 0x34, 0x5C]);
    assert_eq!(&bytes[14..16], &[0x00, 0x00]);
    // newline in IBM-1047
    assert_eq!(bytes[16], 0x15);

    let mut reader = factory.create_formatter(&layout);
    reader
        .set_input_stream(File::open(&data).unwrap())
        .initialize()
        .unwrap();

    let first = reader.read_record().unwrap().unwrap();
    assert_eq!(first.get_text("id"), Some("0001"));
    assert_eq!(first.get_text("name"), Some("ALICE "));
    assert_eq!(first.get_decimal("balance"), Some(Decimal::new(12345, 2)));
    assert!(!first.contains("reserved"));
    assert_eq!(first.len(), 3);

    let second = reader.read_record().unwrap().unwrap();
    assert_eq!(second.get_text("name"), Some("NONAME"));
    assert_eq!(second.get_decimal("balance"), Some(Decimal::new(-50, 2)));

    assert!(reader.read_record().unwrap().is_none());
    reader.close().unwrap();
}

#[test]
fn test_records_serialize_as_json() {
    let record = DataRecord::new()
        .with("id", "0001")
        .with("balance", Decimal::new(12345, 2))
        .with("note", Value::Null);
    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(json, r#"{"id":"0001","balance":"123.45","note":null}"#);
}

#[test]
fn test_formatters_share_cached_layout() {
    let (_dir, layout) = setup();
    let factory = FormatterFactory::new();

    let mut first = factory.create_formatter(&layout);
    first.initialize().unwrap();
    let mut second = factory.create_formatter(&layout);
    second.initialize().unwrap();

    assert_eq!(factory.cached_layouts().len(), 1);
    let a = first.layout().unwrap();
    let b = second.layout().unwrap();
    assert!(std::sync::Arc::ptr_eq(a.definition(), b.definition()));
}

#[test]
fn test_read_without_initialize() {
    let (_dir, layout) = setup();
    let mut formatter = FormatterFactory::new().create_formatter(&layout);
    formatter.set_input_stream(std::io::empty());
    assert!(matches!(formatter.read_record(), Err(FormatError::NotInitialized)));
}

#[test]
fn test_missing_layout_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut formatter = FormatterFactory::new().create_formatter(dir.path().join("missing.fmt"));
    match formatter.initialize() {
        Err(FormatError::Syntax(e)) => {
            assert!(e.message().starts_with("layout file could not be read."));
            assert!(e.file_path().unwrap().ends_with("missing.fmt"));
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}
