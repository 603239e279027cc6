// crates/bankws-core/src/lib.rs
// ============================================================================
// Module: Bank Web Services Core
// Description: Message models and validation for the Finnish corporate file service.
// Purpose: Build, validate and read ApplicationRequest/ApplicationResponse documents.
// Dependencies: base64, bigdecimal, flate2, quick-xml, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! The core crate holds everything that does not touch the network: the
//! `ApplicationResponse` and `ApplicationRequest` xmldata models with their
//! schema validation, content packing, signature summaries, Finnish account
//! numbers, the fixed-width transaction list, SEPA payment documents,
//! camt.054 notifications and the certificate service messages.
//! Invariants:
//! - Responses are validated against [`schema::APPLICATION_RESPONSE`] before
//!   any field is mapped.
//! - Serialization validates the produced tree, so an invalid model never
//!   leaves the crate as XML.
//!
//! Security posture: response documents come from the network and are
//! untrusted; parsing enforces size and depth limits.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod account;
pub mod camt;
pub mod cert;
pub mod content;
pub mod fields;
pub mod request;
pub mod response;
pub mod schema;
pub mod sepa;
pub mod signature;
pub mod statement;
pub mod xml;
pub mod xs;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use account::AccountError;
pub use account::AccountNumber;
pub use camt::CamtError;
pub use camt::DebitCreditNotification;
pub use cert::CertApplicationRequest;
pub use cert::CertApplicationResponse;
pub use cert::CertError;
pub use cert::ServiceCertificate;
pub use content::ContentError;
pub use content::ContentPacking;
pub use fields::FieldError;
pub use request::ApplicationRequest;
pub use request::Command;
pub use request::Environment;
pub use request::FileListFilter;
pub use request::FileListStatus;
pub use request::RequestContext;
pub use request::RequestError;
pub use request::UploadFile;
pub use response::ApplicationResponse;
pub use response::ConsistencyIssue;
pub use response::FileDescriptor;
pub use response::FileStatus;
pub use response::ResponseError;
pub use schema::ValidationReport;
pub use schema::Violation;
pub use schema::ViolationKind;
pub use sepa::PaymentInitiation;
pub use sepa::PaymentStatusReport;
pub use sepa::SepaError;
pub use signature::SignatureError;
pub use signature::SignatureInfo;
pub use statement::StatementError;
pub use statement::TransactionList;
pub use xml::XmlElement;
pub use xml::XmlError;
pub use xs::XsDate;
pub use xs::XsDateTime;
pub use xs::XsError;
