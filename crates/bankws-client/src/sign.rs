// crates/bankws-client/src/sign.rs
// ============================================================================
// Module: Request Signing
// Description: Seam for attaching an enveloped signature to outgoing requests.
// Purpose: Let deployments plug in their XML-DSig implementation and key material.
// Dependencies: bankws-core, thiserror
// ============================================================================

//! ## Overview
//! The bank requires each `ApplicationRequest` to carry an enveloped
//! XML-DSig signature made with the customer's signing certificate.
//! [`RequestSigner`] receives the finished request and sets its
//! `signature` element; the service signs after building the request and
//! before the schema check and serialization, so a signer cannot produce a
//! document that escapes validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bankws_core::ApplicationRequest;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Signing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// Key material is missing or unusable.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),
    /// Signature could not be produced.
    #[error("signing failed: {0}")]
    Failed(String),
}

// ============================================================================
// SECTION: Signer
// ============================================================================

/// Attaches an enveloped signature to requests.
pub trait RequestSigner: Send + Sync {
    /// Signs the request by setting `request.signature`.
    ///
    /// # Errors
    ///
    /// Returns [`SignError`] when the request cannot be signed.
    fn sign(&self, request: &mut ApplicationRequest) -> Result<(), SignError>;
}
