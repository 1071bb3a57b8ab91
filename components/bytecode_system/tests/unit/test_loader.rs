//! Tests for Program::load validation

use bytecode_system::{
    crc16, ImageBuilder, LoadOptions, Opcode, Program, HEADER_SIZE, PROGHEADER_CRC,
};
use core_types::{EType, ProgsError};

fn sample() -> ImageBuilder {
    let mut b = ImageBuilder::new();
    b.set_crc(PROGHEADER_CRC);
    b.global("time", EType::Float);
    b.field("health", EType::Float);
    b.begin_function("main", &[]);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();
    b
}

fn put_i32(bytes: &mut [u8], at: usize, value: i32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

#[test]
fn test_load_sample() {
    let bytes = sample().to_bytes();
    let program = Program::load(&bytes, &LoadOptions::with_crc(PROGHEADER_CRC)).unwrap();
    assert_eq!(program.entity_fields, 1);
    assert!(program.find_global("time").is_some());
    assert_eq!(program.find_field("health").unwrap().ofs, 0);
    assert_eq!(program.header.crc, PROGHEADER_CRC as i32);
}

#[test]
fn test_reserialization_is_identical() {
    let bytes = sample().to_bytes();
    let program = Program::load(&bytes, &LoadOptions::default()).unwrap();
    assert_eq!(program.to_bytes(), bytes);
}

#[test]
fn test_wrong_version() {
    let mut bytes = sample().to_bytes();
    put_i32(&mut bytes, 0, 7);
    let err = Program::load(&bytes, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, ProgsError::Format(msg) if msg.contains("version 7")));
}

#[test]
fn test_checksum_mismatch() {
    let bytes = sample().to_bytes();
    let err = Program::load(&bytes, &LoadOptions::with_crc(1234)).unwrap_err();
    assert_eq!(
        err,
        ProgsError::ChecksumMismatch {
            expected: 1234,
            found: PROGHEADER_CRC as i32
        }
    );
}

#[test]
fn test_no_expected_crc_skips_check() {
    let mut b = sample();
    b.set_crc(1);
    assert!(Program::load(&b.to_bytes(), &LoadOptions::default()).is_ok());
}

#[test]
fn test_declarations_checksum() {
    let text = b"entity self; float time;";
    assert_eq!(
        LoadOptions::with_declarations(text).expected_crc,
        Some(crc16(text))
    );
}

#[test]
fn test_table_past_end_of_file() {
    let mut bytes = sample().to_bytes();
    // globals lump count lives at header int 13
    put_i32(&mut bytes, 13 * 4, 100_000);
    let err = Program::load(&bytes, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, ProgsError::TableBounds { table: "globals", .. }));
}

#[test]
fn test_truncated_header() {
    let bytes = sample().to_bytes();
    let err = Program::load(&bytes[..HEADER_SIZE - 1], &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, ProgsError::Format(_)));
}

#[test]
fn test_function_entry_out_of_range() {
    let mut b = sample();
    let f = b.begin_function("broken", &[]);
    b.emit(Opcode::Done, 0, 0, 0);
    let mut program = b.build().unwrap();
    program.functions[f.index].first_statement = 10_000;
    let err = Program::load(&program.to_bytes(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, ProgsError::TableBounds { table: "statements", .. }));
}

#[test]
fn test_field_beyond_entity_size() {
    let mut program = sample().build().unwrap();
    program.fielddefs[0].ofs = 5;
    let err = Program::load(&program.to_bytes(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, ProgsError::TableBounds { table: "fielddefs", .. }));
}

#[test]
fn test_options_deserialize() {
    let options: LoadOptions = serde_json::from_str(r#"{"expected_crc": 5927}"#).unwrap();
    assert_eq!(options, LoadOptions::with_crc(PROGHEADER_CRC));
}
