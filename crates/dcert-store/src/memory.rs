//! # In-Memory Store
//!
//! Thread-safe map from certificate identifier to record, behind a
//! `parking_lot::RwLock`. Every mutation that has to validate current state
//! does so under one write lock via [`InMemoryCertificateStore::try_update`],
//! so there is no window between the check and the write.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use dcert_core::{CertificateId, IssuerId, Timestamp, TimestampProof};

use crate::error::StoreError;
use crate::record::CertificateRecord;
use crate::store::CertificateStore;

/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCertificateStore {
    data: Arc<RwLock<HashMap<CertificateId, CertificateRecord>>>,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Atomically read-validate-update a record.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's result.
    fn try_update<R>(
        &self,
        id: &CertificateId,
        f: impl FnOnce(&mut CertificateRecord) -> Result<R, StoreError>,
    ) -> Option<Result<R, StoreError>> {
        self.data.write().get_mut(id).map(f)
    }
}

#[async_trait]
impl CertificateStore for InMemoryCertificateStore {
    async fn create(&self, record: CertificateRecord) -> Result<(), StoreError> {
        let mut guard = self.data.write();
        if guard.contains_key(record.id()) {
            return Err(StoreError::Duplicate(record.id().clone()));
        }
        tracing::debug!(certificate_id = %record.id(), issuer_id = %record.issuer_id, "certificate stored");
        guard.insert(record.id().clone(), record);
        Ok(())
    }

    async fn get_by_id(&self, id: &CertificateId) -> Result<Option<CertificateRecord>, StoreError> {
        Ok(self.data.read().get(id).cloned())
    }

    async fn list_by_issuer(
        &self,
        issuer_id: &IssuerId,
    ) -> Result<Vec<CertificateRecord>, StoreError> {
        let mut records: Vec<CertificateRecord> = self
            .data
            .read()
            .values()
            .filter(|r| r.issuer_id == *issuer_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.certificate
                .payload
                .issue_date
                .cmp(&a.certificate.payload.issue_date)
                .then_with(|| b.id().cmp(a.id()))
        });
        Ok(records)
    }

    async fn update_revocation(
        &self,
        id: &CertificateId,
        reason: &str,
        revoked_at: Timestamp,
    ) -> Result<(), StoreError> {
        self.try_update(id, |record| {
            let cert = &mut record.certificate;
            if cert.revoked {
                return Err(StoreError::AlreadyRevoked {
                    certificate_id: id.clone(),
                    reason: cert.revoked_reason.clone().unwrap_or_default(),
                    revoked_at: cert.revoked_at.unwrap_or(revoked_at),
                });
            }
            cert.revoked = true;
            cert.revoked_reason = Some(reason.to_string());
            cert.revoked_at = Some(revoked_at);
            Ok(())
        })
        .unwrap_or_else(|| Err(StoreError::NotFound(id.clone())))
    }

    async fn attach_timestamp_proof(
        &self,
        id: &CertificateId,
        proof: TimestampProof,
    ) -> Result<(), StoreError> {
        self.try_update(id, |record| {
            record.certificate.timestamp_proof = Some(proof);
            Ok(())
        })
        .unwrap_or_else(|| Err(StoreError::NotFound(id.clone())))
    }

    async fn delete(&self, id: &CertificateId) -> Result<(), StoreError> {
        match self.data.write().remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcert_core::{CertificateFields, SignedCertificate};

    fn record(id: &str, issuer: IssuerId, date: &str) -> CertificateRecord {
        let payload = CertificateFields::new("Ada Lovelace", "Bitcoin Fundamentals")
            .into_payload(CertificateId::parse(id).unwrap(), Timestamp::parse(date).unwrap());
        CertificateRecord::new(issuer, SignedCertificate::new(payload, "sig".into(), "pk".into()))
    }

    fn cid(s: &str) -> CertificateId {
        CertificateId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn create_and_get() {
        let store = InMemoryCertificateStore::new();
        let rec = record("CERT-1", IssuerId::new(), "2025-01-01T00:00:00Z");
        store.create(rec.clone()).await.unwrap();
        assert_eq!(store.get_by_id(&cid("CERT-1")).await.unwrap(), Some(rec));
        assert_eq!(store.get_by_id(&cid("CERT-404")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let store = InMemoryCertificateStore::new();
        let issuer = IssuerId::new();
        store.create(record("CERT-1", issuer, "2025-01-01T00:00:00Z")).await.unwrap();
        assert!(matches!(
            store.create(record("CERT-1", issuer, "2025-01-02T00:00:00Z")).await,
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn list_by_issuer_filters_and_orders_newest_first() {
        let store = InMemoryCertificateStore::new();
        let mine = IssuerId::new();
        let theirs = IssuerId::new();
        store.create(record("CERT-A", mine, "2025-01-01T00:00:00Z")).await.unwrap();
        store.create(record("CERT-B", mine, "2025-03-01T00:00:00Z")).await.unwrap();
        store.create(record("CERT-C", theirs, "2025-02-01T00:00:00Z")).await.unwrap();

        let ids: Vec<String> = store
            .list_by_issuer(&mine)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["CERT-B", "CERT-A"]);
    }

    #[tokio::test]
    async fn revocation_is_compare_and_set() {
        let store = InMemoryCertificateStore::new();
        store
            .create(record("CERT-1", IssuerId::new(), "2025-01-01T00:00:00Z"))
            .await
            .unwrap();
        let first_at = Timestamp::parse("2025-04-01T00:00:00Z").unwrap();
        store.update_revocation(&cid("CERT-1"), "first", first_at).await.unwrap();

        match store.update_revocation(&cid("CERT-1"), "second", Timestamp::now()).await {
            Err(StoreError::AlreadyRevoked { reason, revoked_at, .. }) => {
                assert_eq!(reason, "first");
                assert_eq!(revoked_at, first_at);
            }
            other => panic!("expected AlreadyRevoked, got {other:?}"),
        }

        let cert = store.get_by_id(&cid("CERT-1")).await.unwrap().unwrap().certificate;
        assert!(cert.revoked);
        assert_eq!(cert.revoked_reason.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn revoking_unknown_id_is_not_found() {
        let store = InMemoryCertificateStore::new();
        assert!(matches!(
            store.update_revocation(&cid("CERT-404"), "r", Timestamp::now()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn attach_proof_and_delete() {
        let store = InMemoryCertificateStore::new();
        store
            .create(record("CERT-1", IssuerId::new(), "2025-01-01T00:00:00Z"))
            .await
            .unwrap();
        let proof = TimestampProof {
            hash: "ab".repeat(32),
            timestamp: Timestamp::now(),
            proof: "e30=".into(),
            transaction_id: None,
            block_height: None,
        };
        store.attach_timestamp_proof(&cid("CERT-1"), proof.clone()).await.unwrap();
        let stored = store.get_by_id(&cid("CERT-1")).await.unwrap().unwrap();
        assert_eq!(stored.certificate.timestamp_proof, Some(proof.clone()));

        store.delete(&cid("CERT-1")).await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.delete(&cid("CERT-1")).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.attach_timestamp_proof(&cid("CERT-1"), proof).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
