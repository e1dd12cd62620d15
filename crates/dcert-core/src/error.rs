//! # Error Types
//!
//! Errors raised while building, parsing, or canonicalizing certificate data.
//! All of them describe a data or logic problem, never a transient failure,
//! so callers must not retry them.

use thiserror::Error;

/// Top-level error type for the data model.
#[derive(Error, Debug)]
pub enum DcertError {
    /// Canonical serialization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A payload field required for signing is missing, empty, or mistyped.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A transport record could not be parsed as a signed certificate.
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    /// A timestamp is not a UTC RFC 3339 instant.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A certificate identifier is empty, too long, or contains
    /// non-printable characters.
    #[error("invalid certificate identifier: {0}")]
    InvalidIdentifier(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values have no single canonical JSON rendering.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
