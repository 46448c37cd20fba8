//! Tests for IndexRecord
//!
//! These tests verify:
//! - Fixed-width slot encoding and tag padding
//! - Type tag validation
//! - Decoding of damaged slots
//! - Slot/offset arithmetic

use atlasrec::format::{offset_slot, slot_offset, validate_type_tag, HEADER_LEN, RECORD_LEN};
use atlasrec::{AtlasError, IndexRecord, Key, RecordState};

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_layout() {
    let record = IndexRecord::new(RecordState::Ok, 120, 35, Key::new(3), "Person").unwrap();
    let encoded = record.encode();

    assert_eq!(encoded.len(), IndexRecord::ENCODED_LEN);
    assert_eq!(encoded.len(), 67);
    assert_eq!(&encoded[..35], b"0,0000000120,0000000035,0000000003,");
    assert_eq!(&encoded[35..41], b"Person");
    assert!(encoded[41..65].iter().all(|b| *b == b' '));
    assert_eq!(&encoded[65..], b"\r\n");
}

#[test]
fn test_decode_trims_tag_padding() {
    let record = IndexRecord::new(RecordState::Tail, 0, 2, Key::new(1), "A").unwrap();
    let decoded = IndexRecord::decode(&record.encode()).unwrap();

    assert_eq!(decoded.type_tag, "A");
    assert_eq!(decoded, record);
}

#[test]
fn test_every_state_survives_encoding() {
    let states = [
        RecordState::Ok,
        RecordState::Head,
        RecordState::Linked,
        RecordState::Tail,
        RecordState::Deleted,
        RecordState::Copied,
    ];

    for (digit, state) in states.into_iter().enumerate() {
        let record = IndexRecord::new(state, 1, 2, Key::new(3), "Rec").unwrap();
        let encoded = record.encode();
        assert_eq!(encoded[0], b'0' + digit as u8);
        assert_eq!(IndexRecord::decode(&encoded).unwrap().state, state);
    }
}

#[test]
fn test_full_width_tag() {
    let tag = "T".repeat(30);
    let record = IndexRecord::new(RecordState::Ok, 0, 2, Key::new(1), &tag).unwrap();
    let decoded = IndexRecord::decode(&record.encode()).unwrap();
    assert_eq!(decoded.type_tag, tag);
}

#[test]
fn test_with_state_keeps_fields() {
    let record = IndexRecord::new(RecordState::Ok, 10, 20, Key::new(5), "Rec").unwrap();
    let deleted = record.with_state(RecordState::Deleted);

    assert_eq!(deleted.state, RecordState::Deleted);
    assert_eq!(deleted.offset, 10);
    assert_eq!(deleted.length, 20);
    assert_eq!(deleted.key, Key::new(5));
    assert_eq!(deleted.type_tag, "Rec");
}

// =============================================================================
// Type Tag Validation Tests
// =============================================================================

#[test]
fn test_tag_too_long() {
    let tag = "T".repeat(31);
    assert!(matches!(
        validate_type_tag(&tag),
        Err(AtlasError::InvalidTypeTag(_))
    ));
    assert!(IndexRecord::new(RecordState::Ok, 0, 2, Key::new(1), &tag).is_err());
}

#[test]
fn test_tag_empty() {
    assert!(matches!(
        validate_type_tag(""),
        Err(AtlasError::InvalidTypeTag(_))
    ));
}

#[test]
fn test_tag_with_space_or_non_ascii() {
    assert!(validate_type_tag("My Type").is_err());
    assert!(validate_type_tag("Café").is_err());
    assert!(validate_type_tag("Line\r\n").is_err());
    assert!(validate_type_tag("my::Type<u8>").is_ok());
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_decode_unknown_state() {
    let mut bytes = IndexRecord::new(RecordState::Ok, 0, 2, Key::new(1), "Rec")
        .unwrap()
        .encode();
    bytes[0] = b'9';
    assert!(matches!(
        IndexRecord::decode(&bytes),
        Err(AtlasError::MalformedLayout(_))
    ));
}

#[test]
fn test_decode_short_buffer() {
    let bytes = IndexRecord::new(RecordState::Ok, 0, 2, Key::new(1), "Rec")
        .unwrap()
        .encode();
    assert!(matches!(
        IndexRecord::decode(&bytes[..66]),
        Err(AtlasError::MalformedLayout(_))
    ));
}

#[test]
fn test_decode_zeroed_slot() {
    let bytes = [0u8; 67];
    assert!(matches!(
        IndexRecord::decode(&bytes),
        Err(AtlasError::MalformedLayout(_))
    ));
}

#[test]
fn test_decode_bad_separator() {
    let mut bytes = IndexRecord::new(RecordState::Ok, 0, 2, Key::new(1), "Rec")
        .unwrap()
        .encode();
    bytes[23] = b'.';
    assert!(IndexRecord::decode(&bytes).is_err());
}

// =============================================================================
// Slot Arithmetic Tests
// =============================================================================

#[test]
fn test_slot_offsets() {
    assert_eq!(slot_offset(1), HEADER_LEN);
    assert_eq!(slot_offset(2), HEADER_LEN + RECORD_LEN);
    assert_eq!(slot_offset(10), 46 + 9 * 67);
}

#[test]
fn test_offset_slot_inverse() {
    for slot in 1..100 {
        assert_eq!(offset_slot(slot_offset(slot)), Some(slot));
    }
}

#[test]
fn test_offset_slot_rejects_unaligned() {
    assert_eq!(offset_slot(0), None);
    assert_eq!(offset_slot(HEADER_LEN - 1), None);
    assert_eq!(offset_slot(HEADER_LEN + 1), None);
    assert_eq!(offset_slot(HEADER_LEN + RECORD_LEN - 1), None);
}
