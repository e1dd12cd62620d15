//! # Persisted Certificate Record
//!
//! A [`SignedCertificate`] plus the columns only the store knows about: the
//! issuing account and the insertion time. The certificate's own `revoked*`
//! and `timestamp_proof` fields hold the mutable state.

use dcert_core::{CertificateId, IssuerId, SignedCertificate, Timestamp};
use dcert_state::RevocationRecord;

use crate::error::StoreError;

/// One row of the certificate store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    pub issuer_id: IssuerId,
    pub certificate: SignedCertificate,
    pub created_at: Timestamp,
}

impl CertificateRecord {
    pub fn new(issuer_id: IssuerId, certificate: SignedCertificate) -> Self {
        Self {
            issuer_id,
            certificate,
            created_at: Timestamp::now(),
        }
    }

    pub fn id(&self) -> &CertificateId {
        self.certificate.id()
    }

    /// Revocation state as recorded on the certificate.
    ///
    /// # Errors
    ///
    /// `Corrupt` if the record is flagged revoked without a non-blank reason
    /// and a timestamp.
    pub fn revocation(&self) -> Result<RevocationRecord, StoreError> {
        let cert = &self.certificate;
        if !cert.revoked {
            return Ok(RevocationRecord::active(cert.id().clone()));
        }
        match (&cert.revoked_reason, cert.revoked_at) {
            (Some(reason), Some(at)) => RevocationRecord::revoked(cert.id().clone(), reason, at)
                .map_err(|e| StoreError::Corrupt(e.to_string())),
            _ => Err(StoreError::Corrupt(format!(
                "certificate {} is revoked without reason or timestamp",
                cert.id()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcert_core::{CertificateFields, CertificateId};

    fn record() -> CertificateRecord {
        let payload = CertificateFields::new("Ada", "Course").into_payload(
            CertificateId::parse("CERT-REC-1").unwrap(),
            Timestamp::parse("2025-01-01T00:00:00Z").unwrap(),
        );
        CertificateRecord::new(
            IssuerId::new(),
            SignedCertificate::new(payload, "sig".into(), "pk".into()),
        )
    }

    #[test]
    fn fresh_record_is_active() {
        assert!(!record().revocation().unwrap().is_revoked());
    }

    #[test]
    fn revoked_record_carries_reason() {
        let mut rec = record();
        rec.certificate.revoked = true;
        rec.certificate.revoked_reason = Some("duplicate enrollment".into());
        rec.certificate.revoked_at = Some(Timestamp::now());
        let revocation = rec.revocation().unwrap();
        assert!(revocation.is_revoked());
        assert_eq!(revocation.reason.as_deref(), Some("duplicate enrollment"));
    }

    #[test]
    fn revoked_flag_without_reason_is_corrupt() {
        let mut rec = record();
        rec.certificate.revoked = true;
        assert!(matches!(rec.revocation(), Err(StoreError::Corrupt(_))));
    }
}
