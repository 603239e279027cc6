// crates/bankws-config/src/lib.rs
// ============================================================================
// Module: Bankws Config Library
// Description: Canonical config model and validation for the bankws client.
// Purpose: Single source of truth for bankws.toml semantics.
// Dependencies: bankws-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `bankws-config` defines the configuration model shared by the client
//! library and the CLI. It provides strict, fail-closed validation and a
//! canonical example file.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
