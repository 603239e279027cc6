// crates/bankws-client/src/request_id/tests.rs
// ============================================================================
// Module: Request Id Tests
// Description: Unit tests for the daily counter and its stores.
// Purpose: Pin the id format, the daily reset and persistence across generators.
// Dependencies: bankws-client, tempfile, time
// ============================================================================

//! ## Overview
//! Drives generators over memory and file stores with explicit dates.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use time::Date;
use time::Month;

use super::JsonFileStore;
use super::MAX_DAILY_REQUESTS;
use super::MemoryStore;
use super::RequestIdError;
use super::RequestIdGenerator;
use super::RequestIdState;
use super::RequestIdStore;

/// Calendar date in March 2024.
fn march(day: u8) -> Date {
    Date::from_calendar_date(2024, Month::March, day).unwrap()
}

#[test]
fn ids_count_up_within_a_day() {
    let generator = RequestIdGenerator::in_memory();
    assert_eq!(generator.next_id(march(1)).unwrap(), "2024030100001");
    assert_eq!(generator.next_id(march(1)).unwrap(), "2024030100002");
}

#[test]
fn counter_resets_on_a_new_day() {
    let generator = RequestIdGenerator::in_memory();
    generator.next_id(march(1)).unwrap();
    generator.next_id(march(1)).unwrap();
    assert_eq!(generator.next_id(march(2)).unwrap(), "2024030200001");
}

#[test]
fn exhausted_day_fails() {
    let store = MemoryStore::new();
    store
        .save(&RequestIdState {
            day: "20240301".to_string(),
            counter: MAX_DAILY_REQUESTS,
        })
        .unwrap();
    let generator = RequestIdGenerator::new(Box::new(store));
    assert_eq!(
        generator.next_id(march(1)),
        Err(RequestIdError::Exhausted("20240301".to_string()))
    );
    assert_eq!(generator.next_id(march(2)).unwrap(), "2024030200001");
}

#[test]
fn file_store_survives_generators() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("ids.json");
    let first = RequestIdGenerator::new(Box::new(JsonFileStore::new(&path)));
    assert_eq!(first.next_id(march(5)).unwrap(), "2024030500001");
    drop(first);
    let second = RequestIdGenerator::new(Box::new(JsonFileStore::new(&path)));
    assert_eq!(second.next_id(march(5)).unwrap(), "2024030500002");
    let stored = JsonFileStore::new(&path).load().unwrap().unwrap();
    assert_eq!(stored.counter, 2);
}

#[test]
fn corrupt_file_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ids.json");
    std::fs::write(&path, b"not json").unwrap();
    let generator = RequestIdGenerator::new(Box::new(JsonFileStore::new(&path)));
    assert!(matches!(generator.next_id(march(1)), Err(RequestIdError::Corrupt(_))));
}
