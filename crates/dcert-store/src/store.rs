//! # Store Contract
//!
//! The persistence interface every certificate backend implements. The same
//! `get_by_id` serves the issuer's dashboard and the public verification
//! path; nothing is filtered out for either caller.
//!
//! ## Atomicity
//!
//! `update_revocation` is a compare-and-set on `(id, revoked = false)`. Of
//! any number of concurrent calls for one certificate, exactly one succeeds;
//! every other call observes `AlreadyRevoked` carrying the winner's reason
//! and timestamp.

use async_trait::async_trait;
use dcert_core::{CertificateId, IssuerId, Timestamp, TimestampProof};

use crate::error::StoreError;
use crate::record::CertificateRecord;

#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Insert a newly issued certificate.
    ///
    /// # Errors
    ///
    /// `Duplicate` if the identifier is already present.
    async fn create(&self, record: CertificateRecord) -> Result<(), StoreError>;

    /// Fetch one certificate, or `None` if it does not exist.
    async fn get_by_id(&self, id: &CertificateId) -> Result<Option<CertificateRecord>, StoreError>;

    /// All certificates issued by `issuer_id`, newest issue date first.
    async fn list_by_issuer(&self, issuer_id: &IssuerId)
        -> Result<Vec<CertificateRecord>, StoreError>;

    /// Mark a certificate revoked if, and only if, it is not revoked yet.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown identifier; `AlreadyRevoked` if another
    /// revocation got there first.
    async fn update_revocation(
        &self,
        id: &CertificateId,
        reason: &str,
        revoked_at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Record an anchoring proof on an existing certificate, replacing any
    /// earlier proof.
    async fn attach_timestamp_proof(
        &self,
        id: &CertificateId,
        proof: TimestampProof,
    ) -> Result<(), StoreError>;

    /// Administrative removal.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown identifier.
    async fn delete(&self, id: &CertificateId) -> Result<(), StoreError>;
}
