//! # Certificate Signer
//!
//! Turns caller-supplied [`CertificateFields`] into a [`SignedCertificate`]:
//! fresh identifier, canonical payload, Ed25519 signature, embedded public
//! key. Keys are explicit arguments on every call.

use dcert_core::{CertificateFields, CertificateId, SignedCertificate, Timestamp};
use dcert_crypto::{export_public, sign, CryptoError, PrivateKey, PublicKey};

use crate::error::CertifyError;

/// Stateless issuer of signed certificates.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateSigner;

impl CertificateSigner {
    /// Issue a certificate dated now.
    pub fn issue(
        fields: CertificateFields,
        private: &PrivateKey,
        public: &PublicKey,
    ) -> Result<SignedCertificate, CertifyError> {
        Self::issue_at(fields, Timestamp::now(), private, public)
    }

    /// Issue a certificate with an explicit issuance instant.
    ///
    /// # Errors
    ///
    /// - `SigningFailed` if `public` is not the public half of `private`, or
    ///   the provider refuses to sign.
    /// - `MalformedPayload` if a required field is blank.
    pub fn issue_at(
        fields: CertificateFields,
        issue_date: Timestamp,
        private: &PrivateKey,
        public: &PublicKey,
    ) -> Result<SignedCertificate, CertifyError> {
        if !private.matches(public) {
            return Err(CryptoError::SigningFailed(
                "public key does not belong to the signing key".into(),
            )
            .into());
        }

        let payload = fields.into_payload(CertificateId::generate(), issue_date);
        let canonical = payload.canonicalize()?;
        let signature = sign(private, &canonical)?;
        let public_key = export_public(public)?;

        tracing::info!(
            certificate_id = %payload.id,
            key = %public.fingerprint(),
            "certificate issued"
        );
        Ok(SignedCertificate::new(payload, signature.to_base64(), public_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcert_core::DcertError;
    use dcert_crypto::{import_public, KeyPair};

    fn fields() -> CertificateFields {
        CertificateFields::new("Ada Lovelace", "Bitcoin Fundamentals")
            .with_issuer("Bitcoin Dada", "Dada Devs")
    }

    #[test]
    fn issued_certificate_embeds_supplied_key() {
        let kp = KeyPair::generate().unwrap();
        let cert = CertificateSigner::issue(fields(), kp.private(), kp.public()).unwrap();
        assert_eq!(import_public(&cert.public_key).unwrap(), *kp.public());
        assert!(cert.id().as_str().starts_with("CERT-"));
        assert!(!cert.revoked);
        assert!(cert.timestamp_proof.is_none());
    }

    #[test]
    fn each_issue_gets_a_fresh_id() {
        let kp = KeyPair::generate().unwrap();
        let a = CertificateSigner::issue(fields(), kp.private(), kp.public()).unwrap();
        let b = CertificateSigner::issue(fields(), kp.private(), kp.public()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn explicit_issue_date_is_used() {
        let kp = KeyPair::generate().unwrap();
        let at = Timestamp::parse("2025-03-08T09:15:27Z").unwrap();
        let cert = CertificateSigner::issue_at(fields(), at, kp.private(), kp.public()).unwrap();
        assert_eq!(cert.payload.issue_date, at);
    }

    #[test]
    fn mismatched_public_key_is_refused() {
        let k1 = KeyPair::generate().unwrap();
        let k2 = KeyPair::generate().unwrap();
        assert!(matches!(
            CertificateSigner::issue(fields(), k1.private(), k2.public()),
            Err(CertifyError::Crypto(CryptoError::SigningFailed(_)))
        ));
    }

    #[test]
    fn blank_recipient_is_malformed() {
        let kp = KeyPair::generate().unwrap();
        let result =
            CertificateSigner::issue(CertificateFields::new("  ", "Course"), kp.private(), kp.public());
        assert!(matches!(
            result,
            Err(CertifyError::Core(DcertError::MalformedPayload(_)))
        ));
    }
}
