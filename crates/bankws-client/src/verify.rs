// crates/bankws-client/src/verify.rs
// ============================================================================
// Module: Response Verification
// Description: Structural checks on the signature of application responses.
// Purpose: Refuse responses whose signature is malformed or from an unpinned signer.
// Dependencies: bankws-core, thiserror
// ============================================================================

//! ## Overview
//! [`ResponseVerifier`] is the seam where the service decides whether a
//! parsed `ApplicationResponse` or `CertApplicationResponse` may be used. [`StructuralVerifier`] checks
//! the shape of the XML-DSig element: it must decode, reference the whole
//! document and, when fingerprints are pinned, carry a pinned certificate.
//! It does not recompute digests or check the signature value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bankws_config::VerificationConfig;
use bankws_core::ApplicationResponse;
use bankws_core::CertApplicationResponse;
use bankws_core::SignatureError;
use bankws_core::SignatureInfo;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Response carries no signature but one is required.
    #[error("response is not signed")]
    Unsigned,
    /// Signature element is malformed.
    #[error(transparent)]
    Malformed(#[from] SignatureError),
    /// No reference covers the whole document.
    #[error("signature does not cover the document")]
    DocumentNotReferenced,
    /// Signature carries no certificate while fingerprints are pinned.
    #[error("signature carries no certificate")]
    MissingCertificate,
    /// Certificate fingerprint is not pinned.
    #[error("untrusted signer certificate {0}")]
    UntrustedCertificate(String),
}

// ============================================================================
// SECTION: Verifiers
// ============================================================================

/// Decides whether a response may be used.
pub trait ResponseVerifier: Send + Sync {
    /// Verifies the response.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] when the response must be refused.
    fn verify(&self, response: &ApplicationResponse) -> Result<(), VerificationError>;

    /// Verifies a certificate service response.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] when the response must be refused.
    fn verify_certificate_response(
        &self,
        response: &CertApplicationResponse,
    ) -> Result<(), VerificationError>;
}

/// Shape checks with optional signer pinning.
#[derive(Debug, Clone, Default)]
pub struct StructuralVerifier {
    /// Refuse unsigned responses.
    require_signature: bool,
    /// Lowercase hex SHA-256 fingerprints of accepted signer certificates.
    trusted_fingerprints: Vec<String>,
}

impl StructuralVerifier {
    /// Accepts unsigned responses and any well-formed signature.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses unsigned responses.
    #[must_use]
    pub const fn require_signature(mut self) -> Self {
        self.require_signature = true;
        self
    }

    /// Builds the verifier described by the `[verification]` section.
    #[must_use]
    pub fn from_config(config: &VerificationConfig) -> Self {
        let mut verifier = Self::new();
        if config.require_signature {
            verifier = verifier.require_signature();
        }
        config
            .trusted_fingerprints
            .iter()
            .fold(verifier, |verifier, fingerprint| verifier.trust_fingerprint(fingerprint))
    }

    /// Pins a signer certificate by its SHA-256 fingerprint.
    #[must_use]
    pub fn trust_fingerprint(mut self, fingerprint: &str) -> Self {
        let normalized: String = fingerprint
            .chars()
            .filter(char::is_ascii_hexdigit)
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        self.trusted_fingerprints.push(normalized);
        self
    }
}

impl StructuralVerifier {
    /// Applies the policy to an optional signature summary.
    fn check(&self, signature: Option<SignatureInfo>) -> Result<(), VerificationError> {
        let Some(info) = signature else {
            if self.require_signature {
                return Err(VerificationError::Unsigned);
            }
            return Ok(());
        };
        if info.document_reference().is_none() {
            return Err(VerificationError::DocumentNotReferenced);
        }
        if self.trusted_fingerprints.is_empty() {
            return Ok(());
        }
        let fingerprint =
            info.certificate_fingerprint().ok_or(VerificationError::MissingCertificate)?;
        if self.trusted_fingerprints.contains(&fingerprint) {
            Ok(())
        } else {
            Err(VerificationError::UntrustedCertificate(fingerprint))
        }
    }
}

impl ResponseVerifier for StructuralVerifier {
    fn verify(&self, response: &ApplicationResponse) -> Result<(), VerificationError> {
        self.check(response.signature_info()?)
    }

    fn verify_certificate_response(
        &self,
        response: &CertApplicationResponse,
    ) -> Result<(), VerificationError> {
        self.check(response.signature_info()?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use bankws_config::VerificationConfig;
    use bankws_core::ApplicationResponse;
    use bankws_core::CertApplicationResponse;
    use bankws_core::XmlElement;
    use bankws_core::XsDateTime;

    use super::ResponseVerifier;
    use super::StructuralVerifier;
    use super::VerificationError;

    /// Fingerprint of the certificate bytes `cert`.
    const CERT_FINGERPRINT: &str =
        "06298432e8066b29e2223bcc23aa9504b56ae508fabf3435508869b9c3190e22";

    /// Signature over `uri` with certificate bytes `cert`.
    fn signature(uri: &str) -> XmlElement {
        XmlElement::parse(&format!(
            r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
                 <ds:SignedInfo><ds:Reference URI="{uri}"><ds:DigestValue>ZGlnZXN0</ds:DigestValue></ds:Reference></ds:SignedInfo>
                 <ds:SignatureValue>c2lnbmF0dXJl</ds:SignatureValue>
                 <ds:KeyInfo><ds:X509Data><ds:X509Certificate>Y2VydA==</ds:X509Certificate></ds:X509Data></ds:KeyInfo>
               </ds:Signature>"#
        ))
        .unwrap()
    }

    /// Response signed over `uri` with certificate bytes `cert`.
    fn signed(uri: &str) -> ApplicationResponse {
        let mut response = unsigned();
        response.signature = Some(signature(uri));
        response
    }

    /// Minimal unsigned response.
    fn unsigned() -> ApplicationResponse {
        ApplicationResponse::new("1", XsDateTime::parse("2024-03-01T10:00:00Z").unwrap(), "00", "OK")
    }

    #[test]
    fn unsigned_responses_pass_unless_required() {
        assert_eq!(StructuralVerifier::new().verify(&unsigned()), Ok(()));
        assert_eq!(
            StructuralVerifier::new().require_signature().verify(&unsigned()),
            Err(VerificationError::Unsigned)
        );
    }

    #[test]
    fn signature_must_cover_document() {
        assert_eq!(StructuralVerifier::new().verify(&signed("")), Ok(()));
        assert_eq!(
            StructuralVerifier::new().verify(&signed("#part")),
            Err(VerificationError::DocumentNotReferenced)
        );
    }

    #[test]
    fn pinned_fingerprints_are_enforced() {
        let pinned = StructuralVerifier::new().trust_fingerprint(&CERT_FINGERPRINT.to_uppercase());
        assert_eq!(pinned.verify(&signed("")), Ok(()));
        let other = StructuralVerifier::new().trust_fingerprint("00");
        assert_eq!(
            other.verify(&signed("")),
            Err(VerificationError::UntrustedCertificate(CERT_FINGERPRINT.to_string()))
        );
    }

    #[test]
    fn config_builds_the_same_policy() {
        let config = VerificationConfig {
            require_signature: true,
            trusted_fingerprints: vec![CERT_FINGERPRINT.to_uppercase()],
        };
        let verifier = StructuralVerifier::from_config(&config);
        assert_eq!(verifier.verify(&unsigned()), Err(VerificationError::Unsigned));
        assert_eq!(verifier.verify(&signed("")), Ok(()));
        let lenient = StructuralVerifier::from_config(&VerificationConfig::default());
        assert_eq!(lenient.verify(&unsigned()), Ok(()));
    }

    #[test]
    fn certificate_responses_follow_the_same_policy() {
        let timestamp = XsDateTime::parse("2024-03-01T10:00:00Z").unwrap();
        let mut response = CertApplicationResponse::new("1", timestamp, "00", "OK");
        let strict = StructuralVerifier::new().require_signature();
        assert_eq!(
            strict.verify_certificate_response(&response),
            Err(VerificationError::Unsigned)
        );
        response.signature = Some(signature(""));
        assert_eq!(strict.verify_certificate_response(&response), Ok(()));
    }
}
