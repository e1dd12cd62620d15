//! # Revocation Registry
//!
//! Store-backed authority on whether a certificate has been revoked.
//!
//! `revoke` first runs the guarded state transition on the current record,
//! which rejects blank reasons and already revoked certificates without
//! touching the store. It then persists through the store's atomic
//! compare-and-set. If a concurrent revocation wins between the two steps,
//! the loser sees `AlreadyRevoked` with the winner's data.

use std::sync::Arc;

use dcert_core::{CertificateId, Timestamp};
use dcert_state::{RevocationError, RevocationRecord};
use dcert_store::{CertificateStore, StoreError};

use crate::error::CertifyError;

#[derive(Debug)]
pub struct RevocationRegistry<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for RevocationRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CertificateStore + ?Sized> RevocationRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current revocation state. Unknown identifiers are implicitly active.
    pub async fn status(&self, id: &CertificateId) -> Result<RevocationRecord, CertifyError> {
        match self.store.get_by_id(id).await? {
            Some(record) => Ok(record.revocation()?),
            None => Ok(RevocationRecord::active(id.clone())),
        }
    }

    pub async fn is_revoked(&self, id: &CertificateId) -> Result<bool, CertifyError> {
        Ok(self.status(id).await?.is_revoked())
    }

    /// Revoke a certificate.
    ///
    /// # Errors
    ///
    /// - `Revocation(ReasonRequired)` for a blank reason.
    /// - `Revocation(AlreadyRevoked)` if the certificate is already revoked,
    ///   including when a concurrent call won the race.
    /// - `Store(NotFound)` for an unknown identifier.
    pub async fn revoke(
        &self,
        id: &CertificateId,
        reason: &str,
        at: Timestamp,
    ) -> Result<RevocationRecord, CertifyError> {
        let record = self
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut revocation = record.revocation()?;
        revocation.revoke(reason, at)?;
        let stored_reason = revocation.reason.as_deref().unwrap_or(reason);

        let outcome = self.store.update_revocation(id, stored_reason, at).await;
        match outcome {
            Ok(()) => {
                tracing::info!(certificate_id = %id, reason = stored_reason, "certificate revoked");
                Ok(revocation)
            }
            Err(StoreError::AlreadyRevoked {
                certificate_id,
                reason,
                revoked_at,
            }) => {
                tracing::warn!(certificate_id = %id, "revocation lost to a concurrent revoke");
                Err(RevocationError::AlreadyRevoked {
                    certificate_id,
                    reason,
                    revoked_at,
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
