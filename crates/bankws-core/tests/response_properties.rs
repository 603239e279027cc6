// crates/bankws-core/tests/response_properties.rs
// ============================================================================
// Module: ApplicationResponse Property Tests
// Description: Property checks for facets and round trips.
// Purpose: Ensure length facets hold for arbitrary text and valid models survive a round trip.
// Dependencies: bankws-core, proptest
// ============================================================================

//! ## Overview
//! Length facets are exact: every bounded string accepts lengths inside its
//! range and rejects lengths outside it, whatever the characters. Spaces
//! count like any other character and survive a round trip.

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
#![allow(dead_code, reason = "Common module may have unused helpers.")]

mod common;

use bankws_core::ApplicationResponse;
use bankws_core::ResponseError;
use proptest::prelude::*;

use crate::common::sample_response;

proptest! {
    #[test]
    fn customer_id_facet_matches_length(customer_id in "[a-zA-Z0-9äöå]{0,24}") {
        let mut response = sample_response(&["1"]);
        response.customer_id = customer_id.clone();
        let length = customer_id.chars().count();
        let result = response.to_xml();
        if (1..=16).contains(&length) {
            let xml = result.unwrap();
            prop_assert_eq!(ApplicationResponse::from_xml(&xml).unwrap(), response);
        } else {
            prop_assert!(matches!(result, Err(ResponseError::Schema(_))));
        }
    }

    #[test]
    fn response_text_facet_matches_length(text in "[ -~]{0,100}") {
        let mut response = sample_response(&[]);
        response.response_text = text.clone();
        let result = response.to_xml();
        prop_assert_eq!(result.is_ok(), (1..=80).contains(&text.chars().count()));
        if let Ok(xml) = result {
            let parsed = ApplicationResponse::from_xml(&xml).unwrap();
            prop_assert_eq!(parsed.response_text, text);
        }
    }

    #[test]
    fn descriptor_lists_round_trip(count in 1usize..8, content in proptest::collection::vec(any::<u8>(), 0..64)) {
        let references: Vec<String> = (0..count).map(|index| format!("{}", 1000 + index)).collect();
        let borrowed: Vec<&str> = references.iter().map(String::as_str).collect();
        let mut response = sample_response(&borrowed);
        if !content.is_empty() {
            response.content = Some(content);
        }
        let xml = response.to_xml().unwrap();
        prop_assert_eq!(ApplicationResponse::from_xml(&xml).unwrap(), response);
    }

    #[test]
    fn arbitrary_text_never_panics(input in ".{0,256}") {
        let _ = ApplicationResponse::from_xml(&input);
        let _ = bankws_core::TransactionList::parse(&input);
    }
}

#[test]
fn boundary_lengths_for_customer_id() {
    for (length, valid) in [(0, false), (1, true), (16, true), (17, false)] {
        let mut response = sample_response(&[]);
        response.customer_id = "7".repeat(length);
        assert_eq!(response.to_xml().is_ok(), valid, "length {length}");
    }
}

#[test]
fn whitespace_counts_toward_customer_id_length() {
    let mut response = sample_response(&[]);
    response.customer_id = "1234567890123456 ".to_string();
    assert!(matches!(response.to_xml(), Err(ResponseError::Schema(_))));

    let xml = sample_response(&[]).to_xml().unwrap().replace(
        "<CustomerId>1000000001</CustomerId>",
        "<CustomerId>1234567890123456 </CustomerId>",
    );
    assert!(matches!(ApplicationResponse::from_xml(&xml), Err(ResponseError::Schema(_))));

    response.customer_id = " ".to_string();
    let xml = response.to_xml().unwrap();
    assert_eq!(ApplicationResponse::from_xml(&xml).unwrap().customer_id, " ");
}
