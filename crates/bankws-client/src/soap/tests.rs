// crates/bankws-client/src/soap/tests.rs
// ============================================================================
// Module: SOAP Envelope Tests
// Description: Unit tests for envelope building and parsing.
// Purpose: Pin element names, namespaces and fault handling.
// Dependencies: bankws-client, bankws-core
// ============================================================================

//! ## Overview
//! Builds request envelopes and parses hand-written answers.

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

use bankws_core::XmlElement;
use bankws_core::XsDateTime;
use bankws_core::schema::CERT_XMLDATA_NS;
use bankws_core::xs;

use super::CERTIFICATE_SERVICE_NS;
use super::CORPORATE_FILE_SERVICE_NS;
use super::MODEL_NS;
use super::Operation;
use super::RequestHeader;
use super::SOAP_ENV_NS;
use super::SoapError;
use super::build_envelope;
use super::parse_envelope;

/// Fixed request header.
fn header() -> RequestHeader {
    RequestHeader {
        sender_id: "1000000001".to_string(),
        request_id: "2024030100001".to_string(),
        timestamp: XsDateTime::parse("2024-03-01T10:00:00+02:00").unwrap(),
        language: "FI".to_string(),
        user_agent: "bankws 0.1.0".to_string(),
        receiver_id: "OKOYFIHH".to_string(),
    }
}

/// Answer envelope with the given body payload.
fn answer(payload: &str) -> String {
    format!(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
             <soapenv:Header/>
             <soapenv:Body>{payload}</soapenv:Body>
           </soapenv:Envelope>"#
    )
}

#[test]
fn request_envelope_carries_header_and_payload() {
    let xml = build_envelope(Operation::DownloadFileList, &header(), b"<ApplicationRequest/>").unwrap();
    let root = XmlElement::parse(&xml).unwrap();
    assert!(root.is(SOAP_ENV_NS, "Envelope"));
    let call = root.path(&["Body", "downloadFileListin"]).unwrap();
    assert!(call.is(CORPORATE_FILE_SERVICE_NS, "downloadFileListin"));
    let request_header = call.child("RequestHeader").unwrap();
    assert!(request_header.is(MODEL_NS, "RequestHeader"));
    assert_eq!(request_header.child_text("SenderId"), Some("1000000001"));
    assert_eq!(request_header.child_text("RequestId"), Some("2024030100001"));
    assert_eq!(request_header.child_text("Language"), Some("FI"));
    assert_eq!(request_header.child_text("ReceiverId"), Some("OKOYFIHH"));
    let payload = call.child_text("ApplicationRequest").unwrap();
    assert_eq!(xs::parse_base64(payload).unwrap(), b"<ApplicationRequest/>");
}

#[test]
fn answer_is_unwrapped() {
    let encoded = xs::format_base64(b"<ApplicationResponse/>");
    let xml = answer(&format!(
        r#"<cor:uploadFileout xmlns:cor="http://bxd.fi/CorporateFileService" xmlns:mod="http://model.bxd.fi">
             <mod:ResponseHeader>
               <mod:SenderId>OKOYFIHH</mod:SenderId>
               <mod:RequestId>2024030100001</mod:RequestId>
               <mod:Timestamp>2024-03-01T10:00:01+02:00</mod:Timestamp>
               <mod:ResponseCode>00</mod:ResponseCode>
               <mod:ResponseText>OK</mod:ResponseText>
               <mod:ReceiverId>1000000001</mod:ReceiverId>
             </mod:ResponseHeader>
             <mod:ApplicationResponse>{encoded}</mod:ApplicationResponse>
           </cor:uploadFileout>"#
    ));
    let response = parse_envelope(Operation::UploadFile, &xml).unwrap();
    assert_eq!(response.header.response_code, "00");
    assert_eq!(response.header.request_id, "2024030100001");
    assert_eq!(response.application_response, b"<ApplicationResponse/>");
}

#[test]
fn fault_is_reported() {
    let xml = answer(
        "<soapenv:Fault><faultcode>soapenv:Server</faultcode>\
         <faultstring>Signature verification failed</faultstring></soapenv:Fault>",
    );
    let Err(SoapError::Fault(fault)) = parse_envelope(Operation::DownloadFile, &xml) else {
        panic!("expected fault");
    };
    assert_eq!(fault.code, "soapenv:Server");
    assert_eq!(fault.message, "Signature verification failed");
}

#[test]
fn mismatched_or_broken_answers_fail() {
    let xml = answer("<downloadFileout><ResponseHeader><ResponseCode>00</ResponseCode></ResponseHeader></downloadFileout>");
    assert_eq!(
        parse_envelope(Operation::UploadFile, &xml),
        Err(SoapError::UnexpectedOperation("downloadFileout".to_string()))
    );
    let xml = answer("<uploadFileout><ResponseHeader/></uploadFileout>");
    assert_eq!(parse_envelope(Operation::UploadFile, &xml), Err(SoapError::Missing("ResponseCode")));
    let xml = answer(
        "<uploadFileout><ResponseHeader><ResponseCode>00</ResponseCode></ResponseHeader>\
         <ApplicationResponse>***</ApplicationResponse></uploadFileout>",
    );
    assert_eq!(parse_envelope(Operation::UploadFile, &xml), Err(SoapError::Base64));
    assert!(matches!(parse_envelope(Operation::UploadFile, "<html/>"), Err(SoapError::NotEnvelope(_))));
}

#[test]
fn certificate_envelope_uses_the_certificate_namespaces() {
    let xml = build_envelope(Operation::GetCertificate, &header(), b"<CertApplicationRequest/>").unwrap();
    let root = XmlElement::parse(&xml).unwrap();
    let call = root.path(&["Body", "getCertificatein"]).unwrap();
    assert!(call.is(CERTIFICATE_SERVICE_NS, "getCertificatein"));
    let request_header = call.child("CertificateRequestHeader").unwrap();
    assert!(request_header.is(CERT_XMLDATA_NS, "CertificateRequestHeader"));
    let names: Vec<&str> = request_header.children.iter().map(|child| child.name.as_str()).collect();
    assert_eq!(names, ["SenderId", "RequestId", "Timestamp"]);
    assert!(call.child("ApplicationRequest").unwrap().is(CERT_XMLDATA_NS, "ApplicationRequest"));
}

#[test]
fn certificate_answer_header_is_read() {
    let encoded = xs::format_base64(b"<CertApplicationResponse/>");
    let xml = answer(&format!(
        r#"<opc:getServiceCertificatesout xmlns:opc="http://mlp.op.fi/OPCertificateService"
             xmlns:x="http://op.fi/mlp/xmldata/">
             <x:CertificateResponseHeader><x:ResponseCode>00</x:ResponseCode>
             <x:ResponseText>OK</x:ResponseText></x:CertificateResponseHeader>
             <x:ApplicationResponse>{encoded}</x:ApplicationResponse>
           </opc:getServiceCertificatesout>"#
    ));
    let response = parse_envelope(Operation::GetServiceCertificates, &xml).unwrap();
    assert_eq!(response.header.response_code, "00");
    assert_eq!(response.application_response, b"<CertApplicationResponse/>");
    assert!(Operation::GetServiceCertificates.is_certificate_service());
    assert!(!Operation::UploadFile.is_certificate_service());
}
