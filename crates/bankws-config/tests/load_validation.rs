//! Config load validation tests for bankws-config.
// crates/bankws-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use bankws_config::BankWsConfig;
use bankws_config::ConfigError;
use bankws_config::config_toml_example;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<BankWsConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(BankWsConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        BankWsConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    assert_invalid(BankWsConfig::load(Some(Path::new("does-not-exist/bankws.toml"))), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&vec![b'#'; 1_048_577]).map_err(|err| err.to_string())?;
    assert_invalid(BankWsConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(BankWsConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_invalid_toml() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(b"[client\ncustomer_id = 1").map_err(|err| err.to_string())?;
    assert_invalid(BankWsConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_accepts_canonical_example() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(config_toml_example().as_bytes()).map_err(|err| err.to_string())?;
    let config = BankWsConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.client.customer_id != "1000000001" {
        return Err(format!("unexpected customer id {}", config.client.customer_id));
    }
    Ok(())
}
