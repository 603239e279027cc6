// crates/bankws-client/src/soap.rs
// ============================================================================
// Module: SOAP Envelope
// Description: SOAP 1.1 framing of the corporate file service operations.
// Purpose: Wrap ApplicationRequests for sending and unwrap ApplicationResponses.
// Dependencies: bankws-core, thiserror
// ============================================================================

//! ## Overview
//! Every call posts one envelope whose body holds the operation element
//! (`uploadFilein`, `downloadFilein`, `downloadFileListin`) with a
//! `RequestHeader` and the base64 `ApplicationRequest`. The bank answers
//! with the matching `...out` element carrying a `ResponseHeader` and the
//! base64 `ApplicationResponse`, or with a SOAP fault. The certificate
//! service (`getCertificate`, `getServiceCertificates`) uses the same
//! framing with its own namespaces and a `CertificateRequestHeader` that
//! carries only the sender, request id and timestamp.
//!
//! Security posture: response envelopes are untrusted and parsed under the
//! core XML size and depth limits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use bankws_core::XmlElement;
use bankws_core::XmlError;
use bankws_core::XsDateTime;
use bankws_core::schema::CERT_XMLDATA_NS;
use bankws_core::xs;
use thiserror::Error;

// ============================================================================
// SECTION: Namespaces
// ============================================================================

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// Namespace of the operation elements.
pub const CORPORATE_FILE_SERVICE_NS: &str = "http://bxd.fi/CorporateFileService";
/// Namespace of the SOAP-level headers and payload elements.
pub const MODEL_NS: &str = "http://model.bxd.fi";
/// Namespace of the certificate service operation elements.
pub const CERTIFICATE_SERVICE_NS: &str = "http://mlp.op.fi/OPCertificateService";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fault returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    /// `faultcode` value.
    pub code: String,
    /// `faultstring` value.
    pub message: String,
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Envelope framing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoapError {
    /// Envelope is not well-formed.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// Root is not a SOAP envelope or has no body.
    #[error("not a soap envelope: {0}")]
    NotEnvelope(String),
    /// Service answered with a fault.
    #[error("soap fault {0}")]
    Fault(SoapFault),
    /// Body holds a different operation than expected.
    #[error("unexpected soap operation: {0}")]
    UnexpectedOperation(String),
    /// A required element is missing.
    #[error("missing soap element: {0}")]
    Missing(&'static str),
    /// `ApplicationResponse` is not valid base64.
    #[error("application response is not base64")]
    Base64,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `uploadFile`.
    UploadFile,
    /// `downloadFile`.
    DownloadFile,
    /// `downloadFileList`.
    DownloadFileList,
    /// `getCertificate` on the certificate service.
    GetCertificate,
    /// `getServiceCertificates` on the certificate service.
    GetServiceCertificates,
}

impl Operation {
    /// Operation name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UploadFile => "uploadFile",
            Self::DownloadFile => "downloadFile",
            Self::DownloadFileList => "downloadFileList",
            Self::GetCertificate => "getCertificate",
            Self::GetServiceCertificates => "getServiceCertificates",
        }
    }

    /// Returns true for operations of the certificate service.
    #[must_use]
    pub const fn is_certificate_service(self) -> bool {
        matches!(self, Self::GetCertificate | Self::GetServiceCertificates)
    }

    /// Namespace of the operation element.
    #[must_use]
    pub const fn service_namespace(self) -> &'static str {
        if self.is_certificate_service() {
            CERTIFICATE_SERVICE_NS
        } else {
            CORPORATE_FILE_SERVICE_NS
        }
    }

    /// Namespace of the header and payload elements.
    #[must_use]
    pub const fn payload_namespace(self) -> &'static str {
        if self.is_certificate_service() {
            CERT_XMLDATA_NS
        } else {
            MODEL_NS
        }
    }

    /// Request body element.
    #[must_use]
    pub const fn input_element(self) -> &'static str {
        match self {
            Self::UploadFile => "uploadFilein",
            Self::DownloadFile => "downloadFilein",
            Self::DownloadFileList => "downloadFileListin",
            Self::GetCertificate => "getCertificatein",
            Self::GetServiceCertificates => "getServiceCertificatesin",
        }
    }

    /// Response body element.
    #[must_use]
    pub const fn output_element(self) -> &'static str {
        match self {
            Self::UploadFile => "uploadFileout",
            Self::DownloadFile => "downloadFileout",
            Self::DownloadFileList => "downloadFileListout",
            Self::GetCertificate => "getCertificateout",
            Self::GetServiceCertificates => "getServiceCertificatesout",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SECTION: Headers
// ============================================================================

/// SOAP-level request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    /// Customer id assigned by the bank.
    pub sender_id: String,
    /// Unique request id.
    pub request_id: String,
    /// Send time.
    pub timestamp: XsDateTime,
    /// Response language code.
    pub language: String,
    /// Client software name.
    pub user_agent: String,
    /// Bank BIC.
    pub receiver_id: String,
}

impl RequestHeader {
    /// Builds the header element for `operation`.
    fn to_element(&self, operation: Operation) -> XmlElement {
        let name = if operation.is_certificate_service() {
            "CertificateRequestHeader"
        } else {
            "RequestHeader"
        };
        let mut header = XmlElement::new(Some(operation.payload_namespace()), name);
        header.push_leaf("SenderId", self.sender_id.as_str());
        header.push_leaf("RequestId", self.request_id.as_str());
        header.push_leaf("Timestamp", self.timestamp.as_str());
        if operation.is_certificate_service() {
            return header;
        }
        header.push_leaf("Language", self.language.as_str());
        header.push_leaf("UserAgent", self.user_agent.as_str());
        header.push_leaf("ReceiverId", self.receiver_id.as_str());
        header
    }
}

/// SOAP-level response header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Bank identifier.
    pub sender_id: String,
    /// Echoed request id.
    pub request_id: String,
    /// Response time as sent.
    pub timestamp: String,
    /// Outcome code, `00` on success.
    pub response_code: String,
    /// Outcome text.
    pub response_text: String,
    /// Customer id.
    pub receiver_id: String,
}

impl ResponseHeader {
    /// Reads the header element; only `ResponseCode` is required.
    fn from_element(element: &XmlElement) -> Result<Self, SoapError> {
        let text = |name: &str| element.child_text(name).unwrap_or_default().to_string();
        let response_code =
            element.child_text("ResponseCode").ok_or(SoapError::Missing("ResponseCode"))?;
        Ok(Self {
            sender_id: text("SenderId"),
            request_id: text("RequestId"),
            timestamp: text("Timestamp"),
            response_code: response_code.trim().to_string(),
            response_text: text("ResponseText"),
            receiver_id: text("ReceiverId"),
        })
    }
}

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Decoded service answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapResponse {
    /// SOAP-level header.
    pub header: ResponseHeader,
    /// Decoded `ApplicationResponse` document bytes; empty when absent.
    pub application_response: Vec<u8>,
}

/// Builds the request envelope for `operation`.
///
/// # Errors
///
/// Returns [`SoapError::Xml`] when serialization fails.
pub fn build_envelope(
    operation: Operation,
    header: &RequestHeader,
    application_request: &[u8],
) -> Result<String, SoapError> {
    let mut call = XmlElement::new(Some(operation.service_namespace()), operation.input_element());
    call.push(header.to_element(operation));
    call.push(
        XmlElement::new(Some(operation.payload_namespace()), "ApplicationRequest")
            .with_text(xs::format_base64(application_request)),
    );
    let mut body = XmlElement::new(Some(SOAP_ENV_NS), "Body");
    body.push(call);
    let mut envelope = XmlElement::new(Some(SOAP_ENV_NS), "Envelope");
    envelope.push(XmlElement::new(Some(SOAP_ENV_NS), "Header"));
    envelope.push(body);
    Ok(envelope.to_document()?)
}

/// Parses the answer to `operation`.
///
/// # Errors
///
/// Returns [`SoapError::Fault`] for faults and other [`SoapError`] variants
/// for malformed envelopes.
pub fn parse_envelope(operation: Operation, xml: &str) -> Result<SoapResponse, SoapError> {
    let root = XmlElement::parse(xml)?;
    if !root.is(SOAP_ENV_NS, "Envelope") {
        return Err(SoapError::NotEnvelope(root.name));
    }
    let body = root
        .children
        .iter()
        .find(|child| child.is(SOAP_ENV_NS, "Body"))
        .ok_or_else(|| SoapError::NotEnvelope("missing Body".to_string()))?;
    let payload = body.children.first().ok_or(SoapError::Missing("body payload"))?;
    if payload.is(SOAP_ENV_NS, "Fault") {
        return Err(SoapError::Fault(SoapFault {
            code: payload.child_text("faultcode").unwrap_or_default().to_string(),
            message: payload.child_text("faultstring").unwrap_or_default().to_string(),
        }));
    }
    if payload.name != operation.output_element() {
        return Err(SoapError::UnexpectedOperation(payload.name.clone()));
    }
    let header = payload
        .child("ResponseHeader")
        .or_else(|| payload.child("CertificateResponseHeader"))
        .ok_or(SoapError::Missing("ResponseHeader"))?;
    let header = ResponseHeader::from_element(header)?;
    let application_response = match payload.child("ApplicationResponse") {
        Some(node) => xs::parse_base64(&node.text).ok_or(SoapError::Base64)?,
        None => Vec::new(),
    };
    Ok(SoapResponse {
        header,
        application_response,
    })
}

#[cfg(test)]
mod tests;
