//! # Certificate Services
//!
//! Entry points that compose the signer, verifier, registry, store and
//! anchor calendar.
//!
//! ## Verification
//!
//! A certificate is authentic only if its signature verifies **and** it is
//! not revoked. The registry is authoritative for revocation; a record that
//! itself declares `revoked: true` is also reported revoked, since an issuer
//! would never hand that out as a live credential. Verdict precedence is
//!
//! ```text
//! Malformed > Inauthentic > Revoked > Authentic
//! ```
//!
//! Negative outcomes are values. Only store failures are returned as errors.

use std::sync::Arc;

use serde::Serialize;

use dcert_core::{CertificateFields, CertificateId, IssuerId, SignedCertificate, Timestamp};
use dcert_crypto::KeyPair;
use dcert_state::RevocationRecord;
use dcert_store::{CertificateRecord, CertificateStore, StoreError};

use crate::anchor::{subject_hash, AnchorCalendar};
use crate::error::CertifyError;
use crate::registry::RevocationRegistry;
use crate::signer::CertificateSigner;
use crate::verifier::{verify, VerificationResult};

/// Final answer to "is this certificate good?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Authentic,
    Revoked {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        revoked_at: Option<Timestamp>,
    },
    Inauthentic,
    Malformed {
        reason: String,
    },
}

impl Verdict {
    pub fn is_authentic(&self) -> bool {
        matches!(self, Self::Authentic)
    }

    /// One-line message for people. The three failure kinds never share
    /// wording.
    pub fn message(&self) -> String {
        match self {
            Self::Authentic => "Certificate is authentic and in force.".to_string(),
            Self::Revoked { reason, revoked_at } => match revoked_at {
                Some(at) => format!("Certificate was revoked by its issuer on {at}: {reason}"),
                None => format!("Certificate was revoked by its issuer: {reason}"),
            },
            Self::Inauthentic => {
                "Certificate is NOT authentic: the signature does not match its contents."
                    .to_string()
            }
            Self::Malformed { reason } => format!("Certificate could not be read: {reason}"),
        }
    }
}

/// Everything learned while verifying one certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// `None` when the input could not be parsed far enough to find one.
    pub certificate_id: Option<CertificateId>,
    pub result: VerificationResult,
    /// Registry state; looked up only for certificates whose signature
    /// verified.
    pub revocation: Option<RevocationRecord>,
    #[serde(flatten)]
    pub verdict: Verdict,
}

impl VerificationReport {
    fn malformed(certificate_id: Option<CertificateId>, reason: String) -> Self {
        Self {
            certificate_id,
            result: VerificationResult::MalformedCertificate {
                reason: reason.clone(),
            },
            revocation: None,
            verdict: Verdict::Malformed { reason },
        }
    }
}

/// Combines offline signature checks with the revocation registry.
pub struct VerificationService<S: ?Sized> {
    store: Arc<S>,
    registry: RevocationRegistry<S>,
}

impl<S: CertificateStore + ?Sized> VerificationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            registry: RevocationRegistry::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn registry(&self) -> &RevocationRegistry<S> {
        &self.registry
    }

    /// Verify a certificate supplied as transport JSON, e.g. an uploaded
    /// file.
    pub async fn verify_uploaded(&self, input: &str) -> Result<VerificationReport, CertifyError> {
        match SignedCertificate::from_json(input) {
            Ok(cert) => self.verify_certificate(&cert).await,
            Err(e) => {
                tracing::debug!(error = %e, "uploaded certificate is malformed");
                Ok(VerificationReport::malformed(None, e.to_string()))
            }
        }
    }

    /// Verify the stored copy of a certificate.
    ///
    /// # Errors
    ///
    /// `Store(NotFound)` if no certificate has this identifier.
    pub async fn verify_by_id(&self, id: &CertificateId) -> Result<VerificationReport, CertifyError> {
        let record = self
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.verify_certificate(&record.certificate).await
    }

    async fn verify_certificate(
        &self,
        cert: &SignedCertificate,
    ) -> Result<VerificationReport, CertifyError> {
        let id = cert.id().clone();
        let result = verify(cert);
        let report = match result {
            VerificationResult::MalformedCertificate { reason } => {
                VerificationReport::malformed(Some(id), reason)
            }
            VerificationResult::SignatureMismatch => VerificationReport {
                certificate_id: Some(id),
                result: VerificationResult::SignatureMismatch,
                revocation: None,
                verdict: Verdict::Inauthentic,
            },
            VerificationResult::Valid => {
                let revocation = self.registry.status(&id).await?;
                let verdict = revocation_verdict(&revocation, cert);
                VerificationReport {
                    certificate_id: Some(id),
                    result: VerificationResult::Valid,
                    revocation: Some(revocation),
                    verdict,
                }
            }
        };
        tracing::info!(
            certificate_id = ?report.certificate_id,
            verdict = ?report.verdict,
            "certificate verified"
        );
        Ok(report)
    }
}

fn revocation_verdict(registry: &RevocationRecord, cert: &SignedCertificate) -> Verdict {
    if registry.is_revoked() {
        return Verdict::Revoked {
            reason: registry.reason.clone().unwrap_or_default(),
            revoked_at: registry.revoked_at,
        };
    }
    if cert.revoked {
        return Verdict::Revoked {
            reason: cert.revoked_reason.clone().unwrap_or_default(),
            revoked_at: cert.revoked_at,
        };
    }
    Verdict::Authentic
}

/// Signs, persists and optionally anchors new certificates.
pub struct IssuanceService<S: ?Sized> {
    store: Arc<S>,
    calendar: Option<Arc<dyn AnchorCalendar>>,
}

impl<S: CertificateStore + ?Sized> IssuanceService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            calendar: None,
        }
    }

    /// Anchor every issued certificate with `calendar`.
    pub fn with_calendar(mut self, calendar: Arc<dyn AnchorCalendar>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Sign a certificate and record it under `issuer_id`.
    ///
    /// Nothing is persisted unless signing completed. Anchoring is best
    /// effort: a calendar failure is logged and the certificate is returned
    /// without a proof.
    pub async fn issue(
        &self,
        fields: CertificateFields,
        keys: &KeyPair,
        issuer_id: IssuerId,
    ) -> Result<SignedCertificate, CertifyError> {
        let cert = CertificateSigner::issue(fields, keys.private(), keys.public())?;
        self.record(cert, issuer_id).await
    }

    /// Persist an already signed certificate and anchor it.
    ///
    /// Only a failed `create` is an error. Once the record exists, any
    /// anchoring failure is logged and the certificate is returned without
    /// a proof.
    pub async fn record(
        &self,
        mut cert: SignedCertificate,
        issuer_id: IssuerId,
    ) -> Result<SignedCertificate, CertifyError> {
        self.store
            .create(CertificateRecord::new(issuer_id, cert.clone()))
            .await?;

        if let Some(calendar) = &self.calendar {
            let submitted = match subject_hash(&cert) {
                Ok(digest) => calendar.submit(&digest).await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match submitted {
                Ok(proof) => match self
                    .store
                    .attach_timestamp_proof(cert.id(), proof.clone())
                    .await
                {
                    Ok(()) => cert.timestamp_proof = Some(proof),
                    Err(e) => {
                        tracing::warn!(certificate_id = %cert.id(), error = %e, "storing timestamp proof failed");
                    }
                },
                Err(e) => {
                    tracing::warn!(certificate_id = %cert.id(), error = %e, "anchoring failed");
                }
            }
        }
        Ok(cert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{bind_proof, LocalCalendar};
    use dcert_store::InMemoryCertificateStore;

    fn fields() -> CertificateFields {
        CertificateFields::new("Ada Lovelace", "Bitcoin Fundamentals")
            .with_issuer("Bitcoin Dada", "Dada Devs")
    }

    #[test]
    fn verdict_messages_are_distinct() {
        let messages = [
            Verdict::Authentic.message(),
            Verdict::Revoked {
                reason: "r".into(),
                revoked_at: None,
            }
            .message(),
            Verdict::Inauthentic.message(),
            Verdict::Malformed { reason: "r".into() }.message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[tokio::test]
    async fn issuance_persists_and_anchors() {
        let store = Arc::new(InMemoryCertificateStore::new());
        let service = IssuanceService::new(Arc::clone(&store))
            .with_calendar(Arc::new(LocalCalendar::default()));
        let keys = KeyPair::generate().unwrap();
        let issuer = IssuerId::new();

        let cert = service.issue(fields(), &keys, issuer).await.unwrap();
        let proof = cert.timestamp_proof.clone().unwrap();
        assert!(bind_proof(&subject_hash(&cert).unwrap(), &proof));

        let stored = store.get_by_id(cert.id()).await.unwrap().unwrap();
        assert_eq!(stored.issuer_id, issuer);
        assert_eq!(stored.certificate, cert);
    }

    /// Delegates to an in-memory store but cannot attach proofs.
    struct ProoflessStore(InMemoryCertificateStore);

    #[async_trait::async_trait]
    impl CertificateStore for ProoflessStore {
        async fn create(&self, record: CertificateRecord) -> Result<(), StoreError> {
            self.0.create(record).await
        }

        async fn get_by_id(
            &self,
            id: &CertificateId,
        ) -> Result<Option<CertificateRecord>, StoreError> {
            self.0.get_by_id(id).await
        }

        async fn list_by_issuer(
            &self,
            issuer_id: &IssuerId,
        ) -> Result<Vec<CertificateRecord>, StoreError> {
            self.0.list_by_issuer(issuer_id).await
        }

        async fn update_revocation(
            &self,
            id: &CertificateId,
            reason: &str,
            revoked_at: Timestamp,
        ) -> Result<(), StoreError> {
            self.0.update_revocation(id, reason, revoked_at).await
        }

        async fn attach_timestamp_proof(
            &self,
            _id: &CertificateId,
            _proof: dcert_core::TimestampProof,
        ) -> Result<(), StoreError> {
            Err(StoreError::StoreUnavailable("connection reset".into()))
        }

        async fn delete(&self, id: &CertificateId) -> Result<(), StoreError> {
            self.0.delete(id).await
        }
    }

    #[tokio::test]
    async fn failed_proof_attach_still_returns_stored_certificate() {
        let store = Arc::new(ProoflessStore(InMemoryCertificateStore::new()));
        let service = IssuanceService::new(Arc::clone(&store))
            .with_calendar(Arc::new(LocalCalendar::default()));
        let keys = KeyPair::generate().unwrap();
        let issuer = IssuerId::new();

        let cert = service.issue(fields(), &keys, issuer).await.unwrap();
        assert!(cert.timestamp_proof.is_none());

        let stored = store.get_by_id(cert.id()).await.unwrap().unwrap();
        assert_eq!(stored.certificate, cert);
        assert_eq!(store.list_by_issuer(&issuer).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn verify_by_id_reports_revocation() {
        let store = Arc::new(InMemoryCertificateStore::new());
        let keys = KeyPair::generate().unwrap();
        let cert = IssuanceService::new(Arc::clone(&store))
            .issue(fields(), &keys, IssuerId::new())
            .await
            .unwrap();
        let verifier = VerificationService::new(store);

        let report = verifier.verify_by_id(cert.id()).await.unwrap();
        assert_eq!(report.verdict, Verdict::Authentic);

        verifier
            .registry()
            .revoke(cert.id(), "duplicate enrollment", Timestamp::now())
            .await
            .unwrap();
        let report = verifier.verify_by_id(cert.id()).await.unwrap();
        assert!(matches!(
            report.verdict,
            Verdict::Revoked { ref reason, .. } if reason == "duplicate enrollment"
        ));
        assert_eq!(report.result, VerificationResult::Valid);
    }

    #[tokio::test]
    async fn verify_by_unknown_id_is_not_found() {
        let verifier = VerificationService::new(Arc::new(InMemoryCertificateStore::new()));
        let id = CertificateId::generate();
        assert!(matches!(
            verifier.verify_by_id(&id).await,
            Err(CertifyError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn self_declared_revocation_is_honoured() {
        let keys = KeyPair::generate().unwrap();
        let mut cert = CertificateSigner::issue(fields(), keys.private(), keys.public()).unwrap();
        cert.revoked = true;
        cert.revoked_reason = Some("withdrawn".into());
        let verifier = VerificationService::new(Arc::new(InMemoryCertificateStore::new()));

        let report = verifier
            .verify_uploaded(&cert.to_json_pretty().unwrap())
            .await
            .unwrap();
        assert!(matches!(report.verdict, Verdict::Revoked { ref reason, .. } if reason == "withdrawn"));
    }

    #[tokio::test]
    async fn report_serializes_flat_verdict() {
        let verifier = VerificationService::new(Arc::new(InMemoryCertificateStore::new()));
        let report = verifier.verify_uploaded("not json").await.unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"], "malformed");
        assert!(json["certificateId"].is_null());
        assert_eq!(json["result"]["status"], "malformed_certificate");
    }
}
