// crates/record-feed-core/tests/record_model.rs
// ============================================================================
// Module: Record Model Tests
// Description: Validate record value types and JSON shape.
// Purpose: Ensure malformed ids, names, and timestamps are rejected.
// Dependencies: record-feed-core, serde_json, time
// ============================================================================

//! ## Overview
//! Unit-level checks for [`RecordId`], [`RecordName`], [`InsertTime`], and the
//! serialized [`Record`] shape served over HTTP.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use record_feed_core::InsertTime;
use record_feed_core::Record;
use record_feed_core::RecordError;
use record_feed_core::RecordId;
use record_feed_core::RecordName;
use serde_json::json;
use time::Date;
use time::Month;
use time::PrimitiveDateTime;
use time::Time;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn datetime(day: u8, nanosecond: u32) -> PrimitiveDateTime {
    let date = Date::from_calendar_date(2024, Month::March, day).unwrap();
    let time = Time::from_hms_nano(7, 8, 9, nanosecond).unwrap();
    PrimitiveDateTime::new(date, time)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn record_id_rejects_non_positive_values() {
    assert!(RecordId::from_raw(0).is_none());
    assert!(RecordId::from_raw(-4).is_none());
    assert_eq!(RecordId::try_from(0_i64), Err(RecordError::InvalidId(0)));
    assert_eq!(RecordId::from_raw(7).map(RecordId::get), Some(7));
}

#[test]
fn record_name_accepts_uppercase_and_digits() {
    let name = RecordName::new("AB12CD34EF").unwrap();
    assert_eq!(name.as_str(), "AB12CD34EF");
}

#[test]
fn record_name_rejects_wrong_length() {
    let err = RecordName::new("ABC").unwrap_err();
    assert!(err.to_string().contains("expected 10 characters, got 3"));
    assert!(RecordName::new("ABCDEFGHIJK").is_err());
}

#[test]
fn record_name_rejects_characters_outside_alphabet() {
    assert!(RecordName::new("abcdefghij").is_err());
    assert!(RecordName::new("ABCDE-GHIJ").is_err());
    assert!(RecordName::new("ABCDE GHIJ").is_err());
}

#[test]
fn insert_time_truncates_to_microseconds() {
    let time = InsertTime::from_datetime(datetime(5, 123_456_789));
    assert_eq!(time.format().unwrap(), "2024-03-05 07:08:09.123456");
    assert_eq!(InsertTime::parse(&time.format().unwrap()).unwrap(), time);
}

#[test]
fn insert_time_renders_identically_for_storage_display_and_json() {
    let boundaries = [
        InsertTime::from_datetime(PrimitiveDateTime::new(
            Date::from_calendar_date(1, Month::January, 1).unwrap(),
            Time::MIDNIGHT,
        )),
        InsertTime::from_datetime(PrimitiveDateTime::new(
            Date::from_calendar_date(9999, Month::December, 31).unwrap(),
            Time::from_hms_micro(23, 59, 59, 999_999).unwrap(),
        )),
    ];
    for time in boundaries {
        let stored = time.format().unwrap();
        assert_eq!(stored.len(), "YYYY-MM-DD HH:MM:SS.ffffff".len());
        assert_eq!(time.to_string(), stored);
        assert_eq!(serde_json::to_value(time).unwrap(), json!(stored));
        assert_eq!(InsertTime::parse(&stored).unwrap(), time);
    }
}

#[test]
fn insert_time_parses_whole_second_text() {
    let time = InsertTime::parse("2024-03-05 07:08:09").unwrap();
    assert_eq!(time.to_string(), "2024-03-05 07:08:09.000000");
}

#[test]
fn insert_time_rejects_garbage() {
    let err = InsertTime::parse("yesterday").unwrap_err();
    assert!(matches!(err, RecordError::InvalidInsertTime(_)));
}

#[test]
fn insert_time_now_is_non_decreasing() {
    let first = InsertTime::now();
    let second = InsertTime::now();
    assert!(first <= second);
}

#[test]
fn record_serializes_with_http_field_names() {
    let record = Record {
        id: RecordId::from_raw(1).unwrap(),
        name: RecordName::new("ZZZZZ00000").unwrap(),
        insert_time: InsertTime::from_datetime(datetime(2, 6_000)),
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(
        value,
        json!({
            "ID": 1,
            "Name": "ZZZZZ00000",
            "InsertTime": "2024-03-02 07:08:09.000006",
        })
    );
}

#[test]
fn record_deserialization_validates_fields() {
    let payload = json!({"ID": 0, "Name": "ZZZZZ00000", "InsertTime": "2024-01-02 03:04:05"});
    assert!(serde_json::from_value::<Record>(payload).is_err());
    let payload = json!({"ID": 3, "Name": "short", "InsertTime": "2024-01-02 03:04:05"});
    assert!(serde_json::from_value::<Record>(payload).is_err());
}
