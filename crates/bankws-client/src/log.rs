// crates/bankws-client/src/log.rs
// ============================================================================
// Module: Exchange Log
// Description: Structured JSON-lines record of every WebService exchange.
// Purpose: Keep an audit trail of requests, outcomes and consistency warnings.
// Dependencies: serde, serde_json, sha2
// ============================================================================

//! ## Overview
//! The service reports each finished exchange as an [`ExchangeRecord`] to an
//! [`ExchangeLog`]. [`JsonLineLog`] writes one JSON object per line to any
//! writer; [`NullLog`] discards records.
//! Invariants:
//! - Records never contain payload bytes, only sizes and a SHA-256 hash.
//!
//! Security posture: logs may leave the host; content stays out of them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Outcome of one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeOutcome {
    /// Bank accepted the request.
    Accepted,
    /// Bank rejected the request or the response was unusable.
    Rejected,
    /// No usable answer arrived.
    Failed,
}

/// One logged exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeRecord {
    /// Milliseconds since the Unix epoch.
    pub unix_millis: i64,
    /// Operation name.
    pub operation: String,
    /// Request id sent.
    pub request_id: String,
    /// Outcome.
    pub outcome: ExchangeOutcome,
    /// HTTP status, when an answer arrived.
    pub http_status: Option<u16>,
    /// SOAP-level or application response code.
    pub response_code: Option<String>,
    /// Matching response text.
    pub response_text: Option<String>,
    /// Envelope bytes sent.
    pub request_bytes: usize,
    /// Application response bytes received.
    pub response_bytes: usize,
    /// Hex SHA-256 of the application response.
    pub response_sha256: Option<String>,
    /// Consistency warnings raised by the response.
    pub warnings: Vec<String>,
    /// Failure message.
    pub error: Option<String>,
}

/// Returns the lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|byte| format!("{byte:02x}")).collect()
}

// ============================================================================
// SECTION: Logs
// ============================================================================

/// Exchange log failures.
#[derive(Debug, Error)]
pub enum LogError {
    /// Writer failed.
    #[error("exchange log write failed: {0}")]
    Write(String),
}

/// Receives exchange records.
pub trait ExchangeLog: Send + Sync {
    /// Records one exchange.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] when the record cannot be written.
    fn record(&self, record: &ExchangeRecord) -> Result<(), LogError>;
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl ExchangeLog for NullLog {
    fn record(&self, _record: &ExchangeRecord) -> Result<(), LogError> {
        Ok(())
    }
}

/// Writes records as JSON lines.
#[derive(Debug)]
pub struct JsonLineLog<W> {
    /// Destination writer.
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLineLog<W> {
    /// Creates a log writing to `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> ExchangeLog for JsonLineLog<W> {
    fn record(&self, record: &ExchangeRecord) -> Result<(), LogError> {
        let mut guard =
            self.writer.lock().map_err(|_| LogError::Write("log mutex poisoned".to_string()))?;
        serde_json::to_writer(&mut *guard, record)
            .map_err(|err| LogError::Write(err.to_string()))?;
        guard.write_all(b"\n").map_err(|err| LogError::Write(err.to_string()))?;
        guard.flush().map_err(|err| LogError::Write(err.to_string()))?;
        drop(guard);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use serde_json::Value;

    use super::ExchangeLog;
    use super::ExchangeOutcome;
    use super::ExchangeRecord;
    use super::JsonLineLog;
    use super::sha256_hex;

    /// Record for an accepted upload.
    fn record() -> ExchangeRecord {
        ExchangeRecord {
            unix_millis: 1_709_280_000_000,
            operation: "uploadFile".to_string(),
            request_id: "2024030100001".to_string(),
            outcome: ExchangeOutcome::Accepted,
            http_status: Some(200),
            response_code: Some("00".to_string()),
            response_text: Some("OK".to_string()),
            request_bytes: 512,
            response_bytes: 3,
            response_sha256: Some(sha256_hex(b"abc")),
            warnings: vec!["compressed content without compression method".to_string()],
            error: None,
        }
    }

    #[test]
    fn records_are_json_lines() {
        let log = JsonLineLog::new(Vec::new());
        log.record(&record()).unwrap();
        log.record(&record()).unwrap();
        let bytes = log.writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["outcome"], "accepted");
        assert_eq!(value["request_id"], "2024030100001");
        assert_eq!(
            value["response_sha256"],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(value["error"], Value::Null);
    }
}
