// crates/bankws-core/src/response/tests.rs
// ============================================================================
// Module: ApplicationResponse Tests
// Description: Unit tests for the validating response model.
// Purpose: Pin round trips, opaque subtrees, content decoding and consistency checks.
// Dependencies: bankws-core
// ============================================================================

//! ## Overview
//! Parses, serializes and re-parses responses; checks that invalid documents
//! never reach the model.

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

use super::ApplicationResponse;
use super::ConsistencyIssue;
use super::FileStatus;
use super::ResponseError;
use super::salvage_content;
use crate::content::ContentError;
use crate::content::gzip;
use crate::schema::ViolationKind;
use crate::xs::XsDateTime;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Signed response with a file list.
const SIGNED_LIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ApplicationResponse xmlns="http://bxd.fi/xmldata/">
  <CustomerId>1000000001</CustomerId>
  <Timestamp>2024-03-01T10:15:30.250+02:00</Timestamp>
  <ResponseCode>00</ResponseCode>
  <ResponseText>OK.</ResponseText>
  <ExecutionSerial>exec-1</ExecutionSerial>
  <AmountTotal>1250.5</AmountTotal>
  <TransactionCount>2</TransactionCount>
  <FileDescriptors>
    <FileDescriptor>
      <FileReference>100001</FileReference>
      <TargetId>target</TargetId>
      <UserFilename>payments.xml</UserFilename>
      <FileType>TITO</FileType>
      <FileTimestamp>2024-03-01T09:00:00</FileTimestamp>
      <Status>NEW</Status>
      <FeedbackFileAttributes>
        <FeedbackFileReference>200001</FeedbackFileReference>
        <FeedbackFileType>pain.002.001.02</FeedbackFileType>
        <FeedbackFileDate>2024-03-01+02:00</FeedbackFileDate>
        <FileActionHistory>
          <FileAction>
            <ActionCode>RCV</ActionCode>
            <ActionTimestamp>2024-03-01T09:00:01Z</ActionTimestamp>
          </FileAction>
        </FileActionHistory>
      </FeedbackFileAttributes>
    </FileDescriptor>
    <FileDescriptor>
      <FileReference>100002</FileReference>
      <TargetId>target</TargetId>
      <FileType>KTL</FileType>
      <FileTimestamp>2024-03-01T09:30:00Z</FileTimestamp>
      <Status>DLD</Status>
    </FileDescriptor>
  </FileDescriptors>
  <ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
    <ds:SignedInfo>
      <ds:CanonicalizationMethod Algorithm="http://www.w3.org/TR/2001/REC-xml-c14n-20010315"/>
      <ds:SignatureMethod Algorithm="http://www.w3.org/2000/09/xmldsig#rsa-sha1"/>
      <ds:Reference URI="">
        <ds:DigestMethod Algorithm="http://www.w3.org/2000/09/xmldsig#sha1"/>
        <ds:DigestValue>ZGlnZXN0</ds:DigestValue>
      </ds:Reference>
    </ds:SignedInfo>
    <ds:SignatureValue>c2lnbmF0dXJl</ds:SignatureValue>
    <ds:KeyInfo>
      <ds:X509Data>
        <ds:X509Certificate>Y2VydA==</ds:X509Certificate>
      </ds:X509Data>
    </ds:KeyInfo>
  </ds:Signature>
</ApplicationResponse>"#;

/// Fixed timestamp for built responses.
fn timestamp() -> XsDateTime {
    XsDateTime::parse("2024-03-01T10:00:00Z").unwrap()
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn parses_signed_file_list() {
    let response = ApplicationResponse::from_xml(SIGNED_LIST).unwrap();
    assert!(response.is_accepted());
    assert_eq!(response.customer_id, "1000000001");
    assert_eq!(response.timestamp.as_str(), "2024-03-01T10:15:30.250+02:00");
    assert_eq!(response.amount_total, Some(1250.5));
    assert_eq!(response.transaction_count, Some(2));
    assert_eq!(response.file_descriptors.len(), 2);
    let first = &response.file_descriptors[0];
    assert_eq!(first.status_kind(), Some(FileStatus::New));
    let feedback = first.feedback.as_ref().unwrap();
    assert_eq!(feedback.date.as_ref().map(|date| date.as_str()), Some("2024-03-01+02:00"));
    assert_eq!(feedback.action_history[0].action_code, "RCV");
    assert_eq!(response.file_descriptors[1].status_kind(), Some(FileStatus::Downloaded));
    assert!(response.user_file_types.is_empty());
}

#[test]
fn signature_summary_is_extracted() {
    let response = ApplicationResponse::from_xml(SIGNED_LIST).unwrap();
    let info = response.signature_info().unwrap().unwrap();
    assert_eq!(info.signature_value, b"signature");
    assert_eq!(info.document_reference().unwrap().digest_value, b"digest");
    assert_eq!(
        info.certificate_fingerprint().as_deref(),
        Some("06298432e8066b29e2223bcc23aa9504b56ae508fabf3435508869b9c3190e22")
    );
}

#[test]
fn round_trip_preserves_every_field() {
    let parsed = ApplicationResponse::from_xml(SIGNED_LIST).unwrap();
    let written = parsed.to_xml().unwrap();
    let reparsed = ApplicationResponse::from_xml(&written).unwrap();
    assert_eq!(reparsed, parsed);
    assert_eq!(reparsed.signature, parsed.signature);
}

#[test]
fn invalid_document_carries_full_report() {
    let xml = SIGNED_LIST
        .replace("<CustomerId>1000000001</CustomerId>", "<CustomerId>12345678901234567</CustomerId>")
        .replace("<Status>DLD</Status>", "");
    let Err(ResponseError::Schema(report)) = ApplicationResponse::from_xml(&xml) else {
        panic!("expected schema failure");
    };
    assert_eq!(report.violations().len(), 2);
    assert!(matches!(report.violations()[0].kind, ViolationKind::TooLong { .. }));
    assert_eq!(
        report.violations()[1].path,
        "ApplicationResponse/FileDescriptors/FileDescriptor[2]"
    );
}

#[test]
fn malformed_xml_is_an_xml_error() {
    assert!(matches!(ApplicationResponse::from_xml("<ApplicationResponse>"), Err(ResponseError::Xml(_))));
}

// ============================================================================
// SECTION: Serialization
// ============================================================================

#[test]
fn serialization_refuses_invalid_models() {
    let response = ApplicationResponse::new("x".repeat(17), timestamp(), "00", "OK");
    assert!(matches!(response.to_xml(), Err(ResponseError::Schema(_))));
    let response = ApplicationResponse::new("1", timestamp(), "00", "");
    assert!(matches!(response.to_xml(), Err(ResponseError::Schema(_))));
}

#[test]
fn minimal_response_round_trips() {
    let response = ApplicationResponse::new("1", timestamp(), "00", "OK");
    let xml = response.to_xml().unwrap();
    assert!(!xml.contains("FileDescriptors"));
    assert_eq!(ApplicationResponse::from_xml(&xml).unwrap(), response);
}

// ============================================================================
// SECTION: Content
// ============================================================================

#[test]
fn gzip_content_decodes_to_text() {
    let mut response = ApplicationResponse::new("1", timestamp(), "00", "OK");
    response.compressed = Some(true);
    response.compression_method = Some("RFC1952".to_string());
    response.content = Some(gzip(b"statement lines").unwrap());
    let reparsed = ApplicationResponse::from_xml(&response.to_xml().unwrap()).unwrap();
    assert_eq!(reparsed.content_text().unwrap().as_deref(), Some("statement lines"));
    assert!(reparsed.consistency_issues().is_empty());
}

#[test]
fn encrypted_content_is_not_decoded() {
    let mut response = ApplicationResponse::new("1", timestamp(), "00", "OK");
    response.encrypted = Some(true);
    response.encryption_method = Some("DES".to_string());
    response.content = Some(b"opaque".to_vec());
    assert!(matches!(response.decoded_content(), Err(ContentError::Encrypted { .. })));
}

#[test]
fn missing_content_decodes_to_none() {
    let response = ApplicationResponse::new("1", timestamp(), "00", "OK");
    assert_eq!(response.content_text().unwrap(), None);
}

// ============================================================================
// SECTION: Consistency
// ============================================================================

#[test]
fn encrypted_without_method_is_flagged() {
    let mut response = ApplicationResponse::new("1", timestamp(), "00", "OK");
    response.encrypted = Some(true);
    assert_eq!(response.consistency_issues(), vec![ConsistencyIssue::EncryptedWithoutMethod]);
    assert!(response.to_xml().is_ok());
}

#[test]
fn method_without_flag_is_flagged() {
    let mut response = ApplicationResponse::new("1", timestamp(), "00", "OK");
    response.encryption_method = Some("DES".to_string());
    response.compressed = Some(false);
    response.compression_method = Some("RFC1952".to_string());
    assert_eq!(
        response.consistency_issues(),
        vec![
            ConsistencyIssue::EncryptionMethodWithoutFlag,
            ConsistencyIssue::CompressionMethodWithoutFlag
        ]
    );
}

#[test]
fn unknown_compression_method_is_flagged() {
    let mut response = ApplicationResponse::new("1", timestamp(), "00", "OK");
    response.compressed = Some(true);
    response.compression_method = Some("LZW".to_string());
    assert_eq!(
        response.consistency_issues(),
        vec![ConsistencyIssue::UnsupportedCompressionMethod("LZW".to_string())]
    );
    response.compression_method = None;
    assert_eq!(response.consistency_issues(), vec![ConsistencyIssue::CompressedWithoutMethod]);
}

// ============================================================================
// SECTION: Salvage
// ============================================================================

#[test]
fn salvage_reads_content_of_rejected_document() {
    let content = crate::xs::format_base64(&gzip(b"schema error at line 3").unwrap());
    let xml = format!(
        r#"<ApplicationResponse xmlns="http://bxd.fi/xmldata/">
            <CustomerId>1</CustomerId>
            <ResponseCode>12</ResponseCode>
            <Compressed>true</Compressed>
            <Content>{content}</Content>
        </ApplicationResponse>"#
    );
    assert!(ApplicationResponse::from_xml(&xml).is_err());
    assert_eq!(salvage_content(&xml).as_deref(), Some(&b"schema error at line 3"[..]));
    assert_eq!(salvage_content("not xml"), None);
}
