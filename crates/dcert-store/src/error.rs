//! Store error taxonomy.

use dcert_core::{CertificateId, Timestamp};
use thiserror::Error;

/// Errors returned by [`CertificateStore`](crate::CertificateStore)
/// implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No certificate with this identifier exists.
    #[error("certificate {0} not found")]
    NotFound(CertificateId),

    /// The revocation compare-and-set lost: the certificate was already
    /// revoked. Carries the first revocation's data.
    #[error("certificate {certificate_id} was already revoked at {revoked_at}: {reason}")]
    AlreadyRevoked {
        certificate_id: CertificateId,
        reason: String,
        revoked_at: Timestamp,
    },

    /// A certificate with this identifier already exists.
    #[error("certificate {0} already exists")]
    Duplicate(CertificateId),

    /// The backing store could not be reached or rejected the query.
    /// Callers may retry.
    #[error("certificate store unavailable: {0}")]
    StoreUnavailable(String),

    /// Persisted data violates a record invariant.
    #[error("corrupt certificate record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::StoreUnavailable(format!("migration failed: {e}"))
    }
}
