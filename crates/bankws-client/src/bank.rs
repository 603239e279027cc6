// crates/bankws-client/src/bank.rs
// ============================================================================
// Module: Bank Descriptors
// Description: BIC, WebService and certificate service endpoints of a bank.
// Purpose: Select the endpoint for an environment and the receiver id of requests.
// Dependencies: bankws-config, bankws-core
// ============================================================================

//! ## Overview
//! A [`Bank`] names the receiver (`ReceiverId` is the BIC), the two
//! WebService endpoints and, when the bank enrolls certificates over the
//! web, the two certificate service endpoints. [`Bank::osuuspankki`] is the built-in preset;
//! [`Bank::from_config`] resolves the configured preset or custom endpoints.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bankws_config::BankConfig;
use bankws_config::BankPreset;
use bankws_core::Environment;

// ============================================================================
// SECTION: Presets
// ============================================================================

/// Osuuspankki BIC.
pub const OP_BIC: &str = "OKOYFIHH";
/// Osuuspankki production WebService endpoint.
pub const OP_URL: &str = "https://wsk.op.fi/services/CorporateFileService";
/// Osuuspankki customer test WebService endpoint.
pub const OP_TEST_URL: &str = "https://wsk.asiakastesti.op.fi/services/CorporateFileService";
/// Osuuspankki production certificate service endpoint.
pub const OP_CERT_URL: &str = "https://wsk.op.fi/services/OPCertificateService";
/// Osuuspankki customer test certificate service endpoint.
pub const OP_CERT_TEST_URL: &str = "https://wsk.asiakastesti.op.fi/services/OPCertificateService";

// ============================================================================
// SECTION: Bank
// ============================================================================

/// WebService endpoints of one bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    /// Bank BIC, sent as `ReceiverId`.
    pub bic: String,
    /// Production endpoint.
    pub url: String,
    /// Customer test endpoint.
    pub test_url: String,
    /// Production certificate service endpoint.
    pub cert_url: Option<String>,
    /// Customer test certificate service endpoint.
    pub cert_test_url: Option<String>,
}

impl Bank {
    /// Creates a bank descriptor from explicit values.
    #[must_use]
    pub fn new(bic: impl Into<String>, url: impl Into<String>, test_url: impl Into<String>) -> Self {
        Self {
            bic: bic.into(),
            url: url.into(),
            test_url: test_url.into(),
            cert_url: None,
            cert_test_url: None,
        }
    }

    /// Adds the certificate service endpoints.
    #[must_use]
    pub fn with_certificate_service(
        mut self,
        cert_url: impl Into<String>,
        cert_test_url: impl Into<String>,
    ) -> Self {
        self.cert_url = Some(cert_url.into());
        self.cert_test_url = Some(cert_test_url.into());
        self
    }

    /// Osuuspankki preset.
    #[must_use]
    pub fn osuuspankki() -> Self {
        Self::new(OP_BIC, OP_URL, OP_TEST_URL).with_certificate_service(OP_CERT_URL, OP_CERT_TEST_URL)
    }

    /// Resolves the configured bank. Presets win over explicit fields.
    ///
    /// Returns `None` when neither a preset nor a complete endpoint set is present;
    /// a validated configuration always resolves.
    #[must_use]
    pub fn from_config(config: &BankConfig) -> Option<Self> {
        match config.preset {
            Some(BankPreset::Op) => Some(Self::osuuspankki()),
            None => {
                let bank = Self::new(
                    config.bic.as_deref()?.trim(),
                    config.url.as_deref()?,
                    config.test_url.as_deref()?,
                );
                Some(match (&config.cert_url, &config.cert_test_url) {
                    (Some(cert_url), Some(cert_test_url)) => {
                        bank.with_certificate_service(cert_url.as_str(), cert_test_url.as_str())
                    }
                    _ => bank,
                })
            }
        }
    }

    /// Endpoint for the environment.
    #[must_use]
    pub fn endpoint(&self, environment: Environment) -> &str {
        match environment {
            Environment::Test => &self.test_url,
            Environment::Production => &self.url,
        }
    }

    /// Certificate service endpoint for the environment, when the bank has one.
    #[must_use]
    pub fn certificate_endpoint(&self, environment: Environment) -> Option<&str> {
        match environment {
            Environment::Test => self.cert_test_url.as_deref(),
            Environment::Production => self.cert_url.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use bankws_config::BankConfig;
    use bankws_core::Environment;

    use super::Bank;
    use super::OP_BIC;

    #[test]
    fn preset_resolves_to_osuuspankki() {
        let bank = Bank::from_config(&BankConfig::default()).unwrap();
        assert_eq!(bank.bic, OP_BIC);
        assert!(bank.endpoint(Environment::Test).contains("asiakastesti"));
        assert!(!bank.endpoint(Environment::Production).contains("asiakastesti"));
        let cert = bank.certificate_endpoint(Environment::Test).unwrap();
        assert!(cert.contains("asiakastesti") && cert.ends_with("OPCertificateService"));
    }

    #[test]
    fn custom_bank_needs_every_field() {
        let mut config = BankConfig {
            preset: None,
            bic: Some(" NDEAFIHH ".to_string()),
            url: Some("https://bank.example/ws".to_string()),
            test_url: None,
            cert_url: None,
            cert_test_url: None,
        };
        assert_eq!(Bank::from_config(&config), None);
        config.test_url = Some("https://test.bank.example/ws".to_string());
        let bank = Bank::from_config(&config).unwrap();
        assert_eq!(bank.bic, "NDEAFIHH");
        assert_eq!(bank.endpoint(Environment::Test), "https://test.bank.example/ws");
        assert_eq!(bank.certificate_endpoint(Environment::Test), None);
        config.cert_url = Some("https://bank.example/cert".to_string());
        config.cert_test_url = Some("https://test.bank.example/cert".to_string());
        let bank = Bank::from_config(&config).unwrap();
        assert_eq!(
            bank.certificate_endpoint(Environment::Production),
            Some("https://bank.example/cert")
        );
    }
}
