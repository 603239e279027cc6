// crates/bankws-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for bounded reads and JSON report builders.
// Purpose: Keep CLI input limits and report shapes stable.
// Dependencies: bankws-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Exercises `read_bytes_with_limit` and the report builders behind the
//! `inspect`, `account`, `statement`, `notification` and certificate commands.
//!
//! Security posture: CLI inputs are untrusted; size limits must fail closed.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use bankws_core::AccountNumber;
use bankws_core::ApplicationResponse;
use bankws_core::CertApplicationResponse;
use bankws_core::DebitCreditNotification;
use bankws_core::ServiceCertificate;
use bankws_core::TransactionList;
use bankws_core::XsDateTime;
use bankws_core::statement::TransactionMarker;
use tempfile::TempDir;

use super::account_summary;
use super::certificate_summary;
use super::marker_label;
use super::notification_summary;
use super::pem_file_name;
use super::read_bytes_with_limit;
use super::read_text;
use super::response_summary;
use super::statement_summary;
use super::write_pem_files;

// ============================================================================
// SECTION: Bounded Reads
// ============================================================================

#[test]
fn read_within_limit_returns_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("small.bin");
    fs::write(&path, b"12345").unwrap();
    assert_eq!(read_bytes_with_limit(&path, 5).unwrap(), b"12345");
}

#[test]
fn read_over_limit_fails_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("large.bin");
    fs::write(&path, b"123456").unwrap();
    let err = read_bytes_with_limit(&path, 5).unwrap_err();
    assert!(err.message.contains("exceeds 5 bytes"));
}

#[test]
fn read_missing_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.xml");
    let err = read_bytes_with_limit(&path, 10).unwrap_err();
    assert!(err.message.contains("absent.xml"));
}

#[test]
fn read_text_rejects_invalid_utf8() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("binary.txt");
    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
    let err = read_text(&path, 16).unwrap_err();
    assert!(err.message.contains("not utf-8"));
}

// ============================================================================
// SECTION: Reports
// ============================================================================

#[test]
fn account_summary_lists_both_forms() {
    let account = AccountNumber::parse("123456-785").unwrap();
    let summary = account_summary(&account);
    assert_eq!(summary["machine_format"], "12345600000785");
    assert_eq!(summary["iban"], "FI2112345600000785");
}

#[test]
fn response_summary_flags_inconsistent_packing() {
    let mut response = ApplicationResponse::new(
        "1000000001",
        XsDateTime::parse("2024-03-01T10:00:01+02:00").unwrap(),
        "00",
        "OK.",
    );
    response.encrypted = Some(true);
    response.content = Some(vec![1, 2, 3]);
    let summary = response_summary(&response);
    assert_eq!(summary["accepted"], true);
    assert_eq!(summary["content_bytes"], 3);
    assert_eq!(summary["consistency_issues"][0], "encrypted content without encryption method");
    assert!(summary["signature"].is_null());
}

#[test]
fn statement_summary_reports_balance() {
    let line = "T40050240331+000000000000500000-000000000000001234";
    let list = TransactionList::parse(line).unwrap();
    let summary = statement_summary(&list);
    assert_eq!(summary["balance"]["balance"], "5000.00");
    assert_eq!(summary["balance"]["available"], "-12.34");
    assert_eq!(summary["transactions"].as_array().unwrap().len(), 0);
    assert!(summary["account"].is_null());
}

#[test]
fn marker_labels_keep_unknown_codes() {
    assert_eq!(marker_label(TransactionMarker::Withdrawal), "withdrawal");
    assert_eq!(marker_label(TransactionMarker::Unknown('9')), "unknown:9");
}

#[test]
fn notification_summary_nets_entries() {
    let xml = "<Document xmlns=\"urn:iso:std:iso:20022:tech:xsd:camt.054.001.02\">\
        <BkToCstmrDbtCdtNtfctn><GrpHdr><MsgId>M-1</MsgId><CreDtTm>2024-03-01T18:00:00</CreDtTm></GrpHdr>\
        <Ntfctn><Id>N-1</Id>\
        <Ntry><Amt Ccy=\"EUR\">10.00</Amt><CdtDbtInd>CRDT</CdtDbtInd></Ntry>\
        <Ntry><Amt Ccy=\"EUR\">2.50</Amt><CdtDbtInd>DBIT</CdtDbtInd></Ntry>\
        </Ntfctn></BkToCstmrDbtCdtNtfctn></Document>";
    let notification = DebitCreditNotification::from_xml(xml).unwrap();
    let summary = notification_summary(&notification);
    assert_eq!(summary["message_id"], "M-1");
    assert_eq!(summary["notifications"][0]["net_amount"], "7.50");
    assert_eq!(summary["notifications"][0]["entries"][1]["direction"], "debit");
}

// ============================================================================
// SECTION: Certificates
// ============================================================================

fn certificate_response(name: &str) -> CertApplicationResponse {
    let mut response = CertApplicationResponse::new(
        "1000000001",
        XsDateTime::parse("2024-03-01T10:00:01+02:00").unwrap(),
        "00",
        "OK",
    );
    response.certificates.push(ServiceCertificate {
        name: name.to_string(),
        certificate: b"cert".to_vec(),
        format: Some("X509v3".to_string()),
    });
    response
}

#[test]
fn certificate_summary_lists_fingerprints() {
    let summary = certificate_summary(&certificate_response("signing"));
    assert_eq!(summary["accepted"], true);
    assert_eq!(summary["certificates"][0]["der_bytes"], 4);
    assert_eq!(
        summary["certificates"][0]["sha256"],
        "06298432e8066b29e2223bcc23aa9504b56ae508fabf3435508869b9c3190e22"
    );
}

#[test]
fn pem_files_are_named_after_certificates() {
    let dir = TempDir::new().unwrap();
    write_pem_files(&certificate_response("signing"), dir.path()).unwrap();
    let pem = fs::read_to_string(dir.path().join("signing.pem")).unwrap();
    assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
}

#[test]
fn certificate_names_cannot_escape_the_directory() {
    for name in ["../signing", "", ".hidden", "a/b"] {
        assert!(pem_file_name(name).is_err(), "{name}");
    }
    assert_eq!(pem_file_name("OKOYFIHH_2024").unwrap(), "OKOYFIHH_2024.pem");
}
