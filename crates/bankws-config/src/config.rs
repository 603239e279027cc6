// crates/bankws-config/src/config.rs
// ============================================================================
// Module: Bankws Configuration
// Description: Configuration loading and validation for the bankws client.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: bankws-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults except the customer identifier, so a minimal
//! file names the customer and the bank preset.
//! Security posture: config inputs are untrusted; the TLS identity path is
//! validated but never read here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use bankws_core::request::Environment;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "bankws.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "BANKWS_CONFIG";
/// Maximum size of the config file in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of a full path.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum customer identifier length accepted by the bank.
pub(crate) const MAX_CUSTOMER_ID_LENGTH: usize = 16;
/// Maximum software identifier and target folder length.
pub(crate) const MAX_SOFTWARE_ID_LENGTH: usize = 80;
/// Default request timeout in milliseconds.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Maximum request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 300_000;
/// Default cap on response body size.
pub(crate) const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;
/// Hard cap on response body size.
pub(crate) const MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Default target folder for uploads.
pub(crate) const DEFAULT_TARGET_ID: &str = "target";
/// Default request id store path.
pub(crate) const DEFAULT_REQUEST_ID_PATH: &str = "bankws-request-ids.json";
/// Largest UTC offset in hours.
pub(crate) const MAX_OFFSET_HOURS: i32 = 14;
/// Hex digits in a SHA-256 fingerprint.
pub(crate) const FINGERPRINT_HEX_LENGTH: usize = 64;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Bankws client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankWsConfig {
    /// Customer identity and request defaults.
    pub client: ClientConfig,
    /// Bank endpoint selection.
    #[serde(default)]
    pub bank: BankConfig,
    /// TLS client identity and trust anchors.
    #[serde(default)]
    pub tls: TlsConfig,
    /// HTTP transport limits.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Request id persistence.
    #[serde(default)]
    pub request_ids: RequestIdConfig,
    /// Exchange log destination.
    #[serde(default)]
    pub log: LogConfig,
    /// Response signature policy.
    #[serde(default)]
    pub verification: VerificationConfig,
}

impl BankWsConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.client.validate()?;
        self.bank.validate()?;
        self.tls.validate()?;
        self.transport.validate()?;
        self.request_ids.validate()?;
        self.log.validate()?;
        self.verification.validate()
    }
}

/// Customer identity and request defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Customer identifier assigned by the bank.
    pub customer_id: String,
    /// Bank environment requests target.
    #[serde(default)]
    pub environment: Environment,
    /// Identifier of the sending software.
    #[serde(default = "default_software_id")]
    pub software_id: String,
    /// Language of the bank's response texts.
    #[serde(default)]
    pub language: Language,
    /// Default target folder for uploads.
    #[serde(default = "default_target_id")]
    pub target_id: String,
    /// UTC offset (`+HH:MM`) used when the platform cannot report the local
    /// offset; UTC when absent.
    #[serde(default)]
    pub fallback_utc_offset: Option<String>,
}

impl ClientConfig {
    /// Validates identity fields against the bank's length limits.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_text("client.customer_id", &self.customer_id, MAX_CUSTOMER_ID_LENGTH)?;
        validate_text("client.software_id", &self.software_id, MAX_SOFTWARE_ID_LENGTH)?;
        validate_text("client.target_id", &self.target_id, MAX_SOFTWARE_ID_LENGTH)?;
        self.fallback_offset_seconds().map(|_| ())
    }

    /// Returns the fallback UTC offset in seconds east of UTC.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the offset is not `+HH:MM` or
    /// `-HH:MM` within fourteen hours.
    pub fn fallback_offset_seconds(&self) -> Result<Option<i32>, ConfigError> {
        self.fallback_utc_offset.as_deref().map(parse_utc_offset).transpose()
    }
}

/// Language of the bank's response texts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Finnish.
    #[default]
    Fi,
    /// English.
    En,
    /// Swedish.
    Sv,
}

impl Language {
    /// Returns the header code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Fi => "FI",
            Self::En => "EN",
            Self::Sv => "SV",
        }
    }
}

/// Known bank presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BankPreset {
    /// Osuuspankki.
    Op,
}

/// Bank endpoint selection: a preset or explicit endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankConfig {
    /// Named preset; explicit fields are ignored when set.
    #[serde(default)]
    pub preset: Option<BankPreset>,
    /// Bank BIC for custom endpoints.
    #[serde(default)]
    pub bic: Option<String>,
    /// Production endpoint for custom banks.
    #[serde(default)]
    pub url: Option<String>,
    /// Test endpoint for custom banks.
    #[serde(default)]
    pub test_url: Option<String>,
    /// Production certificate service endpoint for custom banks.
    #[serde(default)]
    pub cert_url: Option<String>,
    /// Test certificate service endpoint for custom banks.
    #[serde(default)]
    pub cert_test_url: Option<String>,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            preset: Some(BankPreset::Op),
            bic: None,
            url: None,
            test_url: None,
            cert_url: None,
            cert_test_url: None,
        }
    }
}

impl BankConfig {
    /// Requires a preset or a complete custom endpoint set.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.preset.is_some() {
            return Ok(());
        }
        let (Some(bic), Some(url), Some(test_url)) = (&self.bic, &self.url, &self.test_url) else {
            return Err(ConfigError::Invalid(
                "bank requires a preset or bic, url and test_url".to_string(),
            ));
        };
        if !(8..=11).contains(&bic.trim().len()) {
            return Err(ConfigError::Invalid("bank.bic must have 8 or 11 characters".to_string()));
        }
        validate_https_url("bank.url", url)?;
        validate_https_url("bank.test_url", test_url)?;
        match (&self.cert_url, &self.cert_test_url) {
            (None, None) => Ok(()),
            (Some(cert_url), Some(cert_test_url)) => {
                validate_https_url("bank.cert_url", cert_url)?;
                validate_https_url("bank.cert_test_url", cert_test_url)
            }
            _ => Err(ConfigError::Invalid(
                "bank.cert_url and bank.cert_test_url must be set together".to_string(),
            )),
        }
    }
}

/// TLS client identity and trust anchors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    /// PEM file holding the client certificate and private key.
    #[serde(default)]
    pub client_identity: Option<PathBuf>,
    /// PEM bundle of additional trusted bank CAs.
    #[serde(default)]
    pub ca_bundle: Option<PathBuf>,
}

impl TlsConfig {
    /// Validates configured paths.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.client_identity {
            validate_path_string("tls.client_identity", &path.to_string_lossy())?;
        }
        if let Some(path) = &self.ca_bundle {
            validate_path_string("tls.ca_bundle", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

/// HTTP transport limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum accepted response body size.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl TransportConfig {
    /// Validates limits against hard caps.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "transport.timeout_ms must be between 1 and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_RESPONSE_BYTES {
            return Err(ConfigError::Invalid(format!(
                "transport.max_response_bytes must be between 1 and {MAX_RESPONSE_BYTES}"
            )));
        }
        Ok(())
    }
}

/// Request id store kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestIdStoreKind {
    /// Counter kept in memory for the process lifetime.
    Memory,
    /// Counter persisted to a JSON file.
    #[default]
    File,
}

/// Request id persistence.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestIdConfig {
    /// Store kind.
    #[serde(default)]
    pub store: RequestIdStoreKind,
    /// JSON file for the file store.
    #[serde(default = "default_request_id_path")]
    pub path: PathBuf,
}

impl Default for RequestIdConfig {
    fn default() -> Self {
        Self {
            store: RequestIdStoreKind::default(),
            path: default_request_id_path(),
        }
    }
}

impl RequestIdConfig {
    /// Validates the store path when it is used.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.store == RequestIdStoreKind::File {
            validate_path_string("request_ids.path", &self.path.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exchange log destination.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// JSON-lines file appended per exchange; no log when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LogConfig {
    /// Validates the log path.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("log.path", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Response signature policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    /// Refuse unsigned responses.
    #[serde(default)]
    pub require_signature: bool,
    /// SHA-256 fingerprints of accepted signer certificates, hex with
    /// optional colons.
    #[serde(default)]
    pub trusted_fingerprints: Vec<String>,
}

impl VerificationConfig {
    /// Requires well-formed fingerprints, and a signature whenever signers are pinned.
    fn validate(&self) -> Result<(), ConfigError> {
        for fingerprint in &self.trusted_fingerprints {
            let digits: String = fingerprint.chars().filter(|ch| *ch != ':').collect();
            if digits.len() != FINGERPRINT_HEX_LENGTH
                || !digits.chars().all(|ch| ch.is_ascii_hexdigit())
            {
                return Err(ConfigError::Invalid(format!(
                    "verification.trusted_fingerprints entry {fingerprint} is not a sha-256 fingerprint"
                )));
            }
        }
        if !self.trusted_fingerprints.is_empty() && !self.require_signature {
            return Err(ConfigError::Invalid(
                "verification.trusted_fingerprints requires require_signature = true".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from argument, environment or default name.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a non-empty text field with a character limit.
fn validate_text(field: &str, value: &str, max: usize) -> Result<(), ConfigError> {
    let length = value.trim().chars().count();
    if length == 0 {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.chars().count() > max {
        return Err(ConfigError::Invalid(format!("{field} exceeds {max} characters")));
    }
    Ok(())
}

/// Requires an absolute `https` URL.
fn validate_https_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|err| ConfigError::Invalid(format!("{field}: {err}")))?;
    if url.scheme() != "https" {
        return Err(ConfigError::Invalid(format!("{field} must use https")));
    }
    Ok(())
}

/// Parses `+HH:MM` or `-HH:MM` into seconds east of UTC.
fn parse_utc_offset(value: &str) -> Result<i32, ConfigError> {
    let invalid = || {
        ConfigError::Invalid(format!("client.fallback_utc_offset {value} must look like +02:00"))
    };
    let bytes = value.as_bytes();
    if bytes.len() != 6 || bytes[3] != b':' || !value.is_ascii() {
        return Err(invalid());
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(invalid()),
    };
    let hours: i32 = value[1..3].parse().map_err(|_| invalid())?;
    let minutes: i32 = value[4..6].parse().map_err(|_| invalid())?;
    if hours > MAX_OFFSET_HOURS || minutes >= 60 || (hours == MAX_OFFSET_HOURS && minutes > 0) {
        return Err(invalid());
    }
    Ok(sign * (hours * 3600 + minutes * 60))
}

/// Default software identifier.
pub(crate) fn default_software_id() -> String {
    format!("bankws {}", env!("CARGO_PKG_VERSION"))
}

/// Default upload folder.
pub(crate) fn default_target_id() -> String {
    DEFAULT_TARGET_ID.to_string()
}

/// Default request timeout.
pub(crate) const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default response cap.
pub(crate) const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

/// Default request id store path.
pub(crate) fn default_request_id_path() -> PathBuf {
    PathBuf::from(DEFAULT_REQUEST_ID_PATH)
}
