// crates/bankws-client/src/transport.rs
// ============================================================================
// Module: HTTP Transport
// Description: Blocking HTTPS transport for SOAP envelopes.
// Purpose: Post envelopes with the customer's client certificate and read bounded answers.
// Dependencies: reqwest, url, thiserror
// ============================================================================

//! ## Overview
//! [`HttpTransport`] posts one envelope per call and returns the status and
//! body. The bank reports data errors as SOAP answers with status 500, so
//! both 200 and 500 are passed on; every other status fails.
//! Invariants:
//! - Redirects are rejected.
//! - Answers larger than the configured cap are rejected.
//! - Cleartext `http://` endpoints are refused unless explicitly allowed.
//!
//! Security posture: the endpoint is authenticated through TLS; the answer
//! body is untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use bankws_config::BankWsConfig;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::tls::Certificate;
use reqwest::tls::Identity;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Statuses whose body is handed to the SOAP layer.
pub const ACCEPTED_STATUSES: [u16; 2] = [200, 500];
/// Content type of SOAP 1.1 requests.
pub const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Endpoint URL does not parse.
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    /// Endpoint scheme is not allowed.
    #[error("unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),
    /// Client certificate or CA bundle could not be loaded.
    #[error("tls setup failed: {0}")]
    Tls(String),
    /// Request or body read failed.
    #[error("http error: {0}")]
    Http(String),
    /// Status other than 200 or 500.
    #[error("service returned http status {0}")]
    Status(u16),
    /// Server redirected the request.
    #[error("redirected from {from} to {to}")]
    Redirected {
        /// Requested URL.
        from: String,
        /// Final URL.
        to: String,
    },
    /// Answer exceeds the byte cap.
    #[error("response exceeds {max_bytes} bytes")]
    TooLarge {
        /// Configured cap.
        max_bytes: usize,
    },
    /// Body is shorter than its declared length.
    #[error("response truncated")]
    Truncated,
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Answer of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpExchange {
    /// HTTP status, 200 or 500.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

/// Posts SOAP envelopes.
pub trait Transport: Send + Sync {
    /// Posts `envelope` to `url` and returns the answer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the exchange fails or the status is not accepted.
    fn post(&self, url: &str, envelope: &[u8]) -> Result<HttpExchange, TransportError>;
}

/// Settings of [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Whole-request timeout.
    pub timeout_ms: u64,
    /// Response byte cap.
    pub max_response_bytes: usize,
    /// PEM file with client certificate and private key.
    pub client_identity: Option<PathBuf>,
    /// PEM bundle of extra trusted CAs.
    pub ca_bundle: Option<PathBuf>,
    /// Permits `http://` endpoints (local test servers).
    pub allow_http: bool,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_response_bytes: 16 * 1024 * 1024,
            client_identity: None,
            ca_bundle: None,
            allow_http: false,
            user_agent: concat!("bankws/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpTransportConfig {
    /// Takes TLS and transport limits from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &BankWsConfig) -> Self {
        Self {
            timeout_ms: config.transport.timeout_ms,
            max_response_bytes: config.transport.max_response_bytes,
            client_identity: config.tls.client_identity.clone(),
            ca_bundle: config.tls.ca_bundle.clone(),
            allow_http: false,
            user_agent: config.client.software_id.clone(),
        }
    }
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client.
    client: Client,
    /// Limits and scheme policy.
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Builds the client, loading the identity and CA bundle when configured.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Tls`] when a PEM file is unreadable or invalid
    /// and [`TransportError::Http`] when the client cannot be built.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone());
        if let Some(path) = &config.client_identity {
            let pem = fs::read(path)
                .map_err(|err| TransportError::Tls(format!("{}: {err}", path.display())))?;
            let identity =
                Identity::from_pem(&pem).map_err(|err| TransportError::Tls(err.to_string()))?;
            builder = builder.identity(identity);
        }
        if let Some(path) = &config.ca_bundle {
            let pem = fs::read(path)
                .map_err(|err| TransportError::Tls(format!("{}: {err}", path.display())))?;
            let certificates = Certificate::from_pem_bundle(&pem)
                .map_err(|err| TransportError::Tls(err.to_string()))?;
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }
        let client = builder.build().map_err(|err| TransportError::Http(err.to_string()))?;
        Ok(Self {
            client,
            config,
        })
    }

    /// Checks the endpoint scheme.
    fn endpoint(&self, url: &str) -> Result<Url, TransportError> {
        let url = Url::parse(url).map_err(|err| TransportError::InvalidUrl(err.to_string()))?;
        match url.scheme() {
            "https" => Ok(url),
            "http" if self.config.allow_http => Ok(url),
            scheme => Err(TransportError::UnsupportedScheme(scheme.to_string())),
        }
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, envelope: &[u8]) -> Result<HttpExchange, TransportError> {
        let url = self.endpoint(url)?;
        let mut response = self
            .client
            .post(url.as_str())
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", "\"\"")
            .body(envelope.to_vec())
            .send()
            .map_err(|err| TransportError::Http(err.to_string()))?;
        if response.url() != &url {
            return Err(TransportError::Redirected {
                from: url.to_string(),
                to: response.url().to_string(),
            });
        }
        let status = response.status().as_u16();
        if !ACCEPTED_STATUSES.contains(&status) {
            return Err(TransportError::Status(status));
        }
        let body = read_limited(&mut response, self.config.max_response_bytes)?;
        Ok(HttpExchange {
            status,
            body,
        })
    }
}

/// Reads the body while enforcing the byte cap and the declared length.
fn read_limited(
    response: &mut reqwest::blocking::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, TransportError> {
    let declared = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes).map_err(|_| TransportError::TooLarge {
        max_bytes,
    })?;
    if declared.is_some_and(|length| length > max_bytes_u64) {
        return Err(TransportError::TooLarge {
            max_bytes,
        });
    }
    let mut body = Vec::new();
    response
        .take(max_bytes_u64.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|err| TransportError::Http(err.to_string()))?;
    if body.len() > max_bytes {
        return Err(TransportError::TooLarge {
            max_bytes,
        });
    }
    if let Some(declared) = declared
        && u64::try_from(body.len()).is_ok_and(|read| read < declared)
    {
        return Err(TransportError::Truncated);
    }
    Ok(body)
}
