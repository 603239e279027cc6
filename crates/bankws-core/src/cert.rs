// crates/bankws-core/src/cert.rs
// ============================================================================
// Module: Certificate Service Messages
// Description: CertApplicationRequest and CertApplicationResponse models.
// Purpose: Enroll for a signing certificate and fetch the bank's certificates.
// Dependencies: sha2, thiserror
// ============================================================================

//! ## Overview
//! The certificate service uses its own xmldata namespace
//! ([`CERT_XMLDATA_NS`]) but the same validation machinery as the file
//! service. A [`CertApplicationRequest`] carries either a PKCS#10 request
//! authorised by a one-time transfer key, a renewal by serial number, or a
//! plain query for the bank's service certificates.
//!
//! Security posture: responses are untrusted; they are validated before any
//! field is mapped and certificate names must be unique.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::account::luhn_valid;
use crate::fields;
use crate::fields::FieldError;
use crate::request::Environment;
use crate::request::RequestContext;
use crate::response::RESPONSE_CODE_OK;
use crate::schema::CERT_APPLICATION_REQUEST;
use crate::schema::CERT_APPLICATION_RESPONSE;
use crate::schema::CERT_XMLDATA_NS;
use crate::schema::DSIG_NS;
use crate::schema::ValidationReport;
use crate::schema::validate_document;
use crate::signature::SignatureError;
use crate::signature::SignatureInfo;
use crate::signature::hex_encode;
use crate::xml::XmlElement;
use crate::xml::XmlError;
use crate::xs;
use crate::xs::XsDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service code of the payment traffic certificate.
pub const CERT_SERVICE_MATU: &str = "MATU";

/// Number of digits in a transfer key.
const TRANSFER_KEY_DIGITS: usize = 16;

/// Base64 characters per PEM line.
const PEM_LINE: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Certificate service message failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertError {
    /// Document is not well-formed XML.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// Document violates the schema.
    #[error("schema validation failed: {0}")]
    Schema(ValidationReport),
    /// A validated field could not be mapped.
    #[error(transparent)]
    Field(#[from] FieldError),
    /// Transfer key is not 16 digits passing the Luhn check.
    #[error("transfer key must be 16 digits with a valid check digit")]
    InvalidTransferKey,
    /// Signing request is empty.
    #[error("certificate signing request is empty")]
    EmptySigningRequest,
    /// Two certificates share a name.
    #[error("duplicate certificate {0}")]
    DuplicateCertificate(String),
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Certificate service command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertCommand {
    /// Issue a certificate for a signing request.
    GetCertificate,
    /// Return the bank's own certificates.
    GetServiceCertificates,
}

impl CertCommand {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetCertificate => "GetCertificate",
            Self::GetServiceCertificates => "GetServiceCertificates",
        }
    }
}

// ============================================================================
// SECTION: CertApplicationRequest
// ============================================================================

/// The xmldata request sent to the certificate service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertApplicationRequest {
    /// Customer identifier.
    pub customer_id: String,
    /// Creation time.
    pub timestamp: XsDateTime,
    /// Target environment.
    pub environment: Environment,
    /// Identifier of the sending software.
    pub software_id: String,
    /// Command name.
    pub command: CertCommand,
    /// Certificate service code.
    pub service: String,
    /// DER-encoded PKCS#10 signing request.
    pub content: Option<Vec<u8>>,
    /// One-time transfer key authorising the first enrollment.
    pub transfer_key: Option<String>,
    /// Serial number of the certificate being renewed.
    pub serial_number: Option<String>,
    /// Enveloped signature, set by a signer.
    pub signature: Option<XmlElement>,
}

impl CertApplicationRequest {
    /// Creates a request with no payload.
    fn new(context: &RequestContext, command: CertCommand) -> Self {
        Self {
            customer_id: context.customer_id.clone(),
            timestamp: context.timestamp.clone(),
            environment: context.environment,
            software_id: context.software_id.clone(),
            command,
            service: CERT_SERVICE_MATU.to_string(),
            content: None,
            transfer_key: None,
            serial_number: None,
            signature: None,
        }
    }

    /// Builds a first enrollment authorised by a transfer key.
    ///
    /// # Errors
    ///
    /// Returns [`CertError::InvalidTransferKey`] for a malformed key and
    /// [`CertError::EmptySigningRequest`] for an empty request.
    pub fn with_transfer_key(
        context: &RequestContext,
        signing_request: Vec<u8>,
        transfer_key: &str,
    ) -> Result<Self, CertError> {
        if signing_request.is_empty() {
            return Err(CertError::EmptySigningRequest);
        }
        let key = transfer_key.trim();
        if key.len() != TRANSFER_KEY_DIGITS || !luhn_valid(key) {
            return Err(CertError::InvalidTransferKey);
        }
        let mut request = Self::new(context, CertCommand::GetCertificate);
        request.content = Some(signing_request);
        request.transfer_key = Some(key.to_string());
        Ok(request)
    }

    /// Builds a renewal of the certificate with the given serial number.
    ///
    /// The bank expects renewals signed with the current certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CertError::EmptySigningRequest`] for an empty request.
    pub fn with_serial_number(
        context: &RequestContext,
        signing_request: Vec<u8>,
        serial_number: impl Into<String>,
    ) -> Result<Self, CertError> {
        if signing_request.is_empty() {
            return Err(CertError::EmptySigningRequest);
        }
        let mut request = Self::new(context, CertCommand::GetCertificate);
        request.content = Some(signing_request);
        request.serial_number = Some(serial_number.into());
        Ok(request)
    }

    /// Builds a query for the bank's service certificates.
    #[must_use]
    pub fn service_certificates(context: &RequestContext) -> Self {
        Self::new(context, CertCommand::GetServiceCertificates)
    }

    /// Builds the element tree in schema order.
    #[must_use]
    pub fn to_element(&self) -> XmlElement {
        let mut root = XmlElement::new(Some(CERT_XMLDATA_NS), "CertApplicationRequest");
        root.push_leaf("CustomerId", self.customer_id.as_str());
        root.push_leaf("Timestamp", self.timestamp.as_str());
        root.push_leaf("Environment", self.environment.as_str());
        root.push_leaf("SoftwareId", self.software_id.as_str());
        root.push_leaf("Command", self.command.as_str());
        root.push_leaf("Service", self.service.as_str());
        if let Some(content) = &self.content {
            root.push_leaf("Content", xs::format_base64(content));
        }
        root.push_optional_leaf("TransferKey", self.transfer_key.as_deref());
        root.push_optional_leaf("SerialNumber", self.serial_number.as_deref());
        if let Some(signature) = &self.signature {
            root.push(signature.clone());
        }
        root
    }

    /// Serializes the request after validating the produced tree.
    ///
    /// # Errors
    ///
    /// Returns [`CertError::Schema`] when a field breaks a schema facet.
    pub fn to_xml(&self) -> Result<String, CertError> {
        let root = self.to_element();
        let report = validate_document(&root, &CERT_APPLICATION_REQUEST);
        if !report.is_valid() {
            return Err(CertError::Schema(report));
        }
        Ok(root.to_document()?)
    }
}

// ============================================================================
// SECTION: CertApplicationResponse
// ============================================================================

/// One certificate returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCertificate {
    /// Certificate name, for example the subject or usage.
    pub name: String,
    /// DER-encoded certificate.
    pub certificate: Vec<u8>,
    /// Declared format, usually `X509v3`.
    pub format: Option<String>,
}

impl ServiceCertificate {
    /// Returns the lowercase hex SHA-256 fingerprint of the certificate.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex_encode(&Sha256::digest(&self.certificate))
    }

    /// Encodes the certificate as PEM.
    #[must_use]
    pub fn to_pem(&self) -> String {
        let encoded = xs::format_base64(&self.certificate);
        let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
        for line in encoded.as_bytes().chunks(PEM_LINE) {
            pem.extend(line.iter().map(|byte| char::from(*byte)));
            pem.push('\n');
        }
        pem.push_str("-----END CERTIFICATE-----\n");
        pem
    }
}

/// The certificate service's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertApplicationResponse {
    /// Customer identifier.
    pub customer_id: String,
    /// Creation time.
    pub timestamp: XsDateTime,
    /// Outcome code; `00` means accepted.
    pub response_code: String,
    /// Outcome text.
    pub response_text: String,
    /// Issued or published certificates in document order.
    pub certificates: Vec<ServiceCertificate>,
    /// Opaque enveloped signature.
    pub signature: Option<XmlElement>,
}

impl CertApplicationResponse {
    /// Creates a response holding only the mandatory fields.
    #[must_use]
    pub fn new(
        customer_id: impl Into<String>,
        timestamp: XsDateTime,
        response_code: impl Into<String>,
        response_text: impl Into<String>,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            timestamp,
            response_code: response_code.into(),
            response_text: response_text.into(),
            certificates: Vec::new(),
            signature: None,
        }
    }

    /// Parses and validates a document.
    ///
    /// # Errors
    ///
    /// Returns [`CertError`] for malformed or invalid documents and for
    /// duplicate certificate names.
    pub fn from_xml(xml: &str) -> Result<Self, CertError> {
        let root = XmlElement::parse(xml)?;
        let report = validate_document(&root, &CERT_APPLICATION_RESPONSE);
        if !report.is_valid() {
            return Err(CertError::Schema(report));
        }
        let mut certificates = Vec::new();
        let mut names = BTreeSet::new();
        if let Some(container) = root.child("Certificates") {
            for node in container.children_named("Certificate") {
                let certificate = ServiceCertificate {
                    name: fields::required_text(node, "Name")?,
                    certificate: fields::optional_base64(node, "Certificate")?
                        .ok_or_else(|| FieldError::new("Certificate", "missing"))?,
                    format: fields::optional_text(node, "CertificateFormat"),
                };
                if !names.insert(certificate.name.clone()) {
                    return Err(CertError::DuplicateCertificate(certificate.name));
                }
                certificates.push(certificate);
            }
        }
        Ok(Self {
            customer_id: fields::required_text(&root, "CustomerId")?,
            timestamp: fields::required_date_time(&root, "Timestamp")?,
            response_code: fields::required_text(&root, "ResponseCode")?.trim().to_string(),
            response_text: fields::required_text(&root, "ResponseText")?,
            certificates,
            signature: root.children.iter().find(|child| child.is(DSIG_NS, "Signature")).cloned(),
        })
    }

    /// Builds the element tree in schema order.
    #[must_use]
    pub fn to_element(&self) -> XmlElement {
        let mut root = XmlElement::new(Some(CERT_XMLDATA_NS), "CertApplicationResponse");
        root.push_leaf("CustomerId", self.customer_id.as_str());
        root.push_leaf("Timestamp", self.timestamp.as_str());
        root.push_leaf("ResponseCode", self.response_code.as_str());
        root.push_leaf("ResponseText", self.response_text.as_str());
        if !self.certificates.is_empty() {
            let mut container = XmlElement::new(Some(CERT_XMLDATA_NS), "Certificates");
            for certificate in &self.certificates {
                let mut node = XmlElement::new(Some(CERT_XMLDATA_NS), "Certificate");
                node.push_leaf("Name", certificate.name.as_str());
                node.push_leaf("Certificate", xs::format_base64(&certificate.certificate));
                node.push_optional_leaf("CertificateFormat", certificate.format.as_deref());
                container.push(node);
            }
            root.push(container);
        }
        if let Some(signature) = &self.signature {
            root.push(signature.clone());
        }
        root
    }

    /// Serializes the response after validating the produced tree.
    ///
    /// # Errors
    ///
    /// Returns [`CertError::Schema`] when a field breaks a schema facet.
    pub fn to_xml(&self) -> Result<String, CertError> {
        let root = self.to_element();
        let report = validate_document(&root, &CERT_APPLICATION_RESPONSE);
        if !report.is_valid() {
            return Err(CertError::Schema(report));
        }
        Ok(root.to_document()?)
    }

    /// Returns true when the service accepted the request.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.response_code == RESPONSE_CODE_OK
    }

    /// Returns the structural signature summary, if signed.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the signature element is malformed.
    pub fn signature_info(&self) -> Result<Option<SignatureInfo>, SignatureError> {
        self.signature.as_ref().map(SignatureInfo::from_element).transpose()
    }
}

#[cfg(test)]
mod tests;
