// crates/bankws-client/src/lib.rs
// ============================================================================
// Module: Bank Web Services Client
// Description: SOAP client for the Finnish corporate file service.
// Purpose: Run WebService operations against a bank over HTTPS.
// Dependencies: bankws-config, bankws-core, reqwest, serde_json, sha2, time
// ============================================================================

//! ## Overview
//! [`WebService`] is the entry point. It composes a [`Bank`], a
//! [`Transport`], a [`RequestIdGenerator`], a [`Clock`], a
//! [`ResponseVerifier`], an optional [`RequestSigner`] and an
//! [`ExchangeLog`]; every part is replaceable,
//! which is how the tests run against a local HTTP server.
//!
//! Security posture: the bank endpoint is reached over TLS with the
//! customer's client certificate; answers are validated before use.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bank;
pub mod clock;
pub mod log;
pub mod request_id;
pub mod service;
pub mod sign;
pub mod soap;
pub mod transport;
pub mod verify;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bank::Bank;
pub use clock::Clock;
pub use clock::FixedClock;
pub use clock::SystemClock;
pub use log::ExchangeLog;
pub use log::ExchangeOutcome;
pub use log::ExchangeRecord;
pub use log::JsonLineLog;
pub use log::LogError;
pub use log::NullLog;
pub use request_id::JsonFileStore;
pub use request_id::MemoryStore;
pub use request_id::RequestIdError;
pub use request_id::RequestIdGenerator;
pub use request_id::RequestIdStore;
pub use service::WebService;
pub use service::WsError;
pub use sign::RequestSigner;
pub use sign::SignError;
pub use soap::SoapError;
pub use soap::SoapFault;
pub use transport::HttpExchange;
pub use transport::HttpTransport;
pub use transport::HttpTransportConfig;
pub use transport::Transport;
pub use transport::TransportError;
pub use verify::ResponseVerifier;
pub use verify::StructuralVerifier;
pub use verify::VerificationError;
