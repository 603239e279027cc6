// crates/bankws-core/src/signature.rs
// ============================================================================
// Module: XML-DSig Summary
// Description: Structural extraction of enveloped XML signatures.
// Purpose: Expose digests, signature value and signer certificate to verifiers.
// Dependencies: sha2, thiserror
// ============================================================================

//! ## Overview
//! [`SignatureInfo`] reads the parts of a `ds:Signature` element that a
//! verifier needs. It performs no cryptography: canonicalization, digest
//! recomputation and RSA checks belong to a verifier implementation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::schema::DSIG_NS;
use crate::xml::XmlElement;
use crate::xs;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Signature structure failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Element is not a `ds:Signature`.
    #[error("element is not an xml-dsig signature")]
    NotSignature,
    /// Required signature part is missing.
    #[error("signature is missing {0}")]
    Missing(&'static str),
    /// A base64 field could not be decoded.
    #[error("signature field {0} is not valid base64")]
    Base64(&'static str),
}

// ============================================================================
// SECTION: Signature Info
// ============================================================================

/// One signed reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureReference {
    /// Reference URI (`""` for the enveloping document).
    pub uri: String,
    /// Digest algorithm URI.
    pub digest_method: Option<String>,
    /// Decoded digest value.
    pub digest_value: Vec<u8>,
}

/// Structural view of an XML-DSig signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    /// Canonicalization algorithm URI.
    pub canonicalization_method: Option<String>,
    /// Signature algorithm URI.
    pub signature_method: Option<String>,
    /// Signed references in document order.
    pub references: Vec<SignatureReference>,
    /// Decoded signature value.
    pub signature_value: Vec<u8>,
    /// DER-encoded signer certificate from `KeyInfo`, when present.
    pub certificate: Option<Vec<u8>>,
}

impl SignatureInfo {
    /// Extracts signature parts from a `ds:Signature` element.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when required parts are missing or undecodable.
    pub fn from_element(element: &XmlElement) -> Result<Self, SignatureError> {
        if !element.is(DSIG_NS, "Signature") {
            return Err(SignatureError::NotSignature);
        }
        let signed_info =
            element.child("SignedInfo").ok_or(SignatureError::Missing("SignedInfo"))?;
        let mut references = Vec::new();
        for reference in signed_info.children_named("Reference") {
            let digest = reference
                .child_text("DigestValue")
                .ok_or(SignatureError::Missing("DigestValue"))?;
            references.push(SignatureReference {
                uri: reference.attribute("URI").unwrap_or_default().to_string(),
                digest_method: algorithm(reference.child("DigestMethod")),
                digest_value: xs::parse_base64(digest)
                    .ok_or(SignatureError::Base64("DigestValue"))?,
            });
        }
        if references.is_empty() {
            return Err(SignatureError::Missing("Reference"));
        }
        let value =
            element.child_text("SignatureValue").ok_or(SignatureError::Missing("SignatureValue"))?;
        let signature_value =
            xs::parse_base64(value).ok_or(SignatureError::Base64("SignatureValue"))?;
        let certificate = match element.path(&["KeyInfo", "X509Data", "X509Certificate"]) {
            Some(node) => Some(
                xs::parse_base64(&node.text).ok_or(SignatureError::Base64("X509Certificate"))?,
            ),
            None => None,
        };
        Ok(Self {
            canonicalization_method: algorithm(signed_info.child("CanonicalizationMethod")),
            signature_method: algorithm(signed_info.child("SignatureMethod")),
            references,
            signature_value,
            certificate,
        })
    }

    /// Returns the lowercase hex SHA-256 fingerprint of the signer certificate.
    #[must_use]
    pub fn certificate_fingerprint(&self) -> Option<String> {
        self.certificate.as_ref().map(|der| hex_encode(&Sha256::digest(der)))
    }

    /// Returns the reference covering the whole document, if any.
    #[must_use]
    pub fn document_reference(&self) -> Option<&SignatureReference> {
        self.references.iter().find(|reference| reference.uri.is_empty())
    }
}

/// Reads the `Algorithm` attribute of an optional element.
fn algorithm(element: Option<&XmlElement>) -> Option<String> {
    element.and_then(|node| node.attribute("Algorithm")).map(str::to_string)
}

/// Encodes bytes as lowercase hex.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}
