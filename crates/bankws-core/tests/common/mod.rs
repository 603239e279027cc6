// crates/bankws-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: Shared response builders for core integration tests.
// Purpose: Keep sample documents consistent across test files.
// Dependencies: bankws-core
// ============================================================================

//! ## Overview
//! Fixture helpers for `ApplicationResponse` integration tests.

use bankws_core::ApplicationResponse;
use bankws_core::XsDateTime;
use bankws_core::response::FileDescriptor;

/// Fixed response timestamp.
pub fn sample_timestamp() -> XsDateTime {
    XsDateTime::parse("2024-03-01T10:00:00+02:00").unwrap()
}

/// File descriptor with mandatory fields only.
pub fn sample_descriptor(reference: &str) -> FileDescriptor {
    FileDescriptor {
        file_reference: reference.to_string(),
        target_id: "target".to_string(),
        service_id: None,
        service_id_owner_name: None,
        user_filename: None,
        parent_file_reference: None,
        file_type: "TITO".to_string(),
        file_timestamp: sample_timestamp(),
        status: "NEW".to_string(),
        sub_status: None,
        feedback: None,
    }
}

/// Accepted response listing the given references.
pub fn sample_response(references: &[&str]) -> ApplicationResponse {
    let mut response = ApplicationResponse::new("1000000001", sample_timestamp(), "00", "OK.");
    response.file_descriptors = references.iter().map(|reference| sample_descriptor(reference)).collect();
    response
}
