// crates/bankws-core/src/content.rs
// ============================================================================
// Module: Payload Content Codec
// Description: Compression handling for ApplicationRequest/Response content.
// Purpose: Turn the Content element into usable bytes and back.
// Dependencies: flate2, thiserror
// ============================================================================

//! ## Overview
//! Payloads travel base64 encoded inside `Content`; the response flags say
//! whether they are additionally compressed or encrypted. Only RFC 1952
//! (gzip) compression is understood. A compressed payload without a method
//! is treated as gzip. Encrypted payloads are refused.
//!
//! Invariants:
//! - Decompressed output is capped at [`MAX_DECOMPRESSED_BYTES`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::io::Write;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Compression method name for gzip.
pub const GZIP_METHOD: &str = "RFC1952";

/// Maximum decompressed payload size.
pub const MAX_DECOMPRESSED_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Content decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// Payload is encrypted and cannot be decoded here.
    #[error("content is encrypted ({method})")]
    Encrypted {
        /// Declared encryption method, or `unspecified`.
        method: String,
    },
    /// Declared compression method is not supported.
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(String),
    /// Gzip stream is corrupt.
    #[error("decompression failed: {0}")]
    Decompress(String),
    /// Gzip encoding failed.
    #[error("compression failed: {0}")]
    Compress(String),
    /// Decompressed payload is larger than [`MAX_DECOMPRESSED_BYTES`].
    #[error("decompressed content exceeds {limit} bytes")]
    TooLarge {
        /// Configured limit.
        limit: usize,
    },
    /// Payload is not valid UTF-8 text.
    #[error("content is not utf-8 text")]
    NotUtf8,
}

// ============================================================================
// SECTION: Codec
// ============================================================================

/// Flags from the message describing how `Content` was packed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentPacking<'a> {
    /// `Encrypted` flag.
    pub encrypted: Option<bool>,
    /// `EncryptionMethod`.
    pub encryption_method: Option<&'a str>,
    /// `Compressed` flag.
    pub compressed: Option<bool>,
    /// `CompressionMethod`.
    pub compression_method: Option<&'a str>,
}

impl ContentPacking<'_> {
    /// Unpacks raw content according to the flags.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] for encrypted content, unknown compression or
    /// corrupt/oversized gzip streams.
    pub fn unpack(&self, content: &[u8]) -> Result<Vec<u8>, ContentError> {
        if self.encrypted == Some(true) {
            return Err(ContentError::Encrypted {
                method: self.encryption_method.unwrap_or("unspecified").to_string(),
            });
        }
        if self.compressed != Some(true) {
            return Ok(content.to_vec());
        }
        match self.compression_method {
            None => gunzip(content),
            Some(method) if method.trim().eq_ignore_ascii_case(GZIP_METHOD) => gunzip(content),
            Some(method) => Err(ContentError::UnsupportedCompression(method.to_string())),
        }
    }
}

/// Decompresses a gzip stream.
///
/// # Errors
///
/// Returns [`ContentError::Decompress`] for corrupt input and
/// [`ContentError::TooLarge`] past [`MAX_DECOMPRESSED_BYTES`].
pub fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, ContentError> {
    let decoder = GzDecoder::new(bytes);
    let limit = u64::try_from(MAX_DECOMPRESSED_BYTES)
        .map_err(|_| ContentError::Decompress("limit overflow".to_string()))?;
    let mut limited = decoder.take(limit.saturating_add(1));
    let mut output = Vec::new();
    limited.read_to_end(&mut output).map_err(|err| ContentError::Decompress(err.to_string()))?;
    if output.len() > MAX_DECOMPRESSED_BYTES {
        return Err(ContentError::TooLarge {
            limit: MAX_DECOMPRESSED_BYTES,
        });
    }
    Ok(output)
}

/// Compresses bytes as a gzip stream.
///
/// # Errors
///
/// Returns [`ContentError::Compress`] when the encoder fails.
pub fn gzip(bytes: &[u8]) -> Result<Vec<u8>, ContentError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(|err| ContentError::Compress(err.to_string()))?;
    encoder.finish().map_err(|err| ContentError::Compress(err.to_string()))
}

/// Interprets unpacked content as UTF-8 text.
///
/// # Errors
///
/// Returns [`ContentError::NotUtf8`] when the bytes are not UTF-8.
pub fn into_text(bytes: Vec<u8>) -> Result<String, ContentError> {
    String::from_utf8(bytes).map_err(|_| ContentError::NotUtf8)
}
