// crates/bankws-core/src/cert/tests.rs
// ============================================================================
// Module: Certificate Service Message Tests
// Description: Unit tests for enrollment requests and certificate responses.
// Purpose: Pin element order, transfer key checks and response mapping.
// Dependencies: bankws-core
// ============================================================================

//! ## Overview
//! Builds each request form, reads hand-written responses and checks that
//! malformed or ambiguous responses fail closed.

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

use super::CertApplicationRequest;
use super::CertApplicationResponse;
use super::CertError;
use super::ServiceCertificate;
use crate::request::Environment;
use crate::request::RequestContext;
use crate::schema::CERT_XMLDATA_NS;
use crate::xml::XmlElement;
use crate::xs::XsDateTime;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const TRANSFER_KEY: &str = "1234567890123452";

fn context() -> RequestContext {
    RequestContext {
        customer_id: "1000000000".to_string(),
        environment: Environment::Test,
        timestamp: XsDateTime::parse("2024-03-01T10:00:00+02:00").unwrap(),
        software_id: "bankws 0.1.0".to_string(),
    }
}

fn response_xml(certificates: &str) -> String {
    format!(
        "<CertApplicationResponse xmlns=\"{CERT_XMLDATA_NS}\">\
         <CustomerId>1000000000</CustomerId>\
         <Timestamp>2024-03-01T10:00:01+02:00</Timestamp>\
         <ResponseCode>00</ResponseCode>\
         <ResponseText>OK</ResponseText>\
         {certificates}\
         </CertApplicationResponse>"
    )
}

// ============================================================================
// SECTION: Requests
// ============================================================================

#[test]
fn enrollment_request_follows_schema_order() {
    let request =
        CertApplicationRequest::with_transfer_key(&context(), vec![0x30, 0x82], TRANSFER_KEY)
            .unwrap();
    let xml = request.to_xml().unwrap();
    let root = XmlElement::parse(&xml).unwrap();
    assert_eq!(root.namespace.as_deref(), Some(CERT_XMLDATA_NS));
    let names: Vec<&str> = root.children.iter().map(|child| child.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "CustomerId",
            "Timestamp",
            "Environment",
            "SoftwareId",
            "Command",
            "Service",
            "Content",
            "TransferKey"
        ]
    );
    assert_eq!(root.child_text("Command"), Some("GetCertificate"));
    assert_eq!(root.child_text("Service"), Some("MATU"));
    assert_eq!(root.child_text("Content"), Some("MII="));
}

#[test]
fn transfer_key_must_pass_the_check_digit() {
    let err = CertApplicationRequest::with_transfer_key(&context(), vec![1], "1234567890123456")
        .unwrap_err();
    assert_eq!(err, CertError::InvalidTransferKey);
    let short = CertApplicationRequest::with_transfer_key(&context(), vec![1], "12345");
    assert_eq!(short.unwrap_err(), CertError::InvalidTransferKey);
}

#[test]
fn empty_signing_request_is_rejected() {
    let err = CertApplicationRequest::with_serial_number(&context(), Vec::new(), "0123").unwrap_err();
    assert_eq!(err, CertError::EmptySigningRequest);
}

#[test]
fn service_certificate_query_has_no_content() {
    let request = CertApplicationRequest::service_certificates(&context());
    let xml = request.to_xml().unwrap();
    assert!(xml.contains("<Command>GetServiceCertificates</Command>"));
    assert!(!xml.contains("<Content>"));
}

// ============================================================================
// SECTION: Responses
// ============================================================================

#[test]
fn response_maps_certificates_in_order() {
    let xml = response_xml(
        "<Certificates>\
         <Certificate><Name>signing</Name><Certificate>AQID</Certificate>\
         <CertificateFormat>X509v3</CertificateFormat></Certificate>\
         <Certificate><Name>encryption</Name><Certificate>BAU=</Certificate></Certificate>\
         </Certificates>",
    );
    let response = CertApplicationResponse::from_xml(&xml).unwrap();
    assert!(response.is_accepted());
    assert_eq!(response.certificates.len(), 2);
    assert_eq!(response.certificates[0].certificate, vec![1, 2, 3]);
    assert_eq!(response.certificates[0].format.as_deref(), Some("X509v3"));
    assert_eq!(response.certificates[1].name, "encryption");
    let again = CertApplicationResponse::from_xml(&response.to_xml().unwrap()).unwrap();
    assert_eq!(again, response);
}

#[test]
fn duplicate_certificate_names_fail_closed() {
    let xml = response_xml(
        "<Certificates>\
         <Certificate><Name>signing</Name><Certificate>AQID</Certificate></Certificate>\
         <Certificate><Name>signing</Name><Certificate>BAU=</Certificate></Certificate>\
         </Certificates>",
    );
    let err = CertApplicationResponse::from_xml(&xml).unwrap_err();
    assert_eq!(err, CertError::DuplicateCertificate("signing".to_string()));
}

#[test]
fn file_service_namespace_is_rejected() {
    let xml = response_xml("").replace(CERT_XMLDATA_NS, "http://bxd.fi/xmldata/");
    assert!(matches!(CertApplicationResponse::from_xml(&xml), Err(CertError::Schema(_))));
}

#[test]
fn rejection_code_is_not_accepted() {
    let xml = response_xml("").replace("<ResponseCode>00<", "<ResponseCode>30<");
    let response = CertApplicationResponse::from_xml(&xml).unwrap();
    assert!(!response.is_accepted());
    assert!(response.certificates.is_empty());
}

#[test]
fn pem_wraps_at_sixty_four_columns() {
    let certificate = ServiceCertificate {
        name: "signing".to_string(),
        certificate: vec![0xab; 60],
        format: None,
    };
    let pem = certificate.to_pem();
    let lines: Vec<&str> = pem.lines().collect();
    assert_eq!(lines[0], "-----BEGIN CERTIFICATE-----");
    assert_eq!(lines[1].len(), 64);
    assert_eq!(lines[2].len(), 16);
    assert_eq!(lines[3], "-----END CERTIFICATE-----");
    assert_eq!(certificate.fingerprint().len(), 64);
}
