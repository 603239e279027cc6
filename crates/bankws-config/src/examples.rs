// crates/bankws-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical `bankws.toml` example. The output is static and must always
//! pass [`crate::BankWsConfig::from_toml`].

/// Returns a canonical example `bankws.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[client]
customer_id = "1000000001"
environment = "test"
software_id = "bankws example"
language = "fi"
target_id = "target"
# fallback_utc_offset = "+02:00"

[bank]
preset = "op"
# bic = "OKOYFIHH"
# url = "https://wsk.op.fi/services/CorporateFileService"
# test_url = "https://wsk.asiakastesti.op.fi/services/CorporateFileService"
# cert_url = "https://wsk.op.fi/services/OPCertificateService"
# cert_test_url = "https://wsk.asiakastesti.op.fi/services/OPCertificateService"

[tls]
client_identity = "certs/client.pem"
# ca_bundle = "certs/bank-ca.pem"

[transport]
timeout_ms = 30000
max_response_bytes = 16777216

[request_ids]
store = "file"
path = "bankws-request-ids.json"

[log]
path = "bankws-exchange.jsonl"

[verification]
require_signature = true
# trusted_fingerprints = ["<sha-256 of the bank signing certificate>"]
"#,
    )
}
