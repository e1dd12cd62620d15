//! # Certificate Verifier
//!
//! Offline signature check. Everything needed is inside the certificate:
//! the payload is re-canonicalized, the embedded public key imported and the
//! signature checked with strict Ed25519 verification.
//!
//! Revocation is not consulted here; see
//! [`VerificationService`](crate::VerificationService).

use serde::Serialize;

use dcert_core::SignedCertificate;
use dcert_crypto::{import_public, verify as verify_signature, CryptoError, Signature};

/// Outcome of a signature check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationResult {
    /// The signature covers the payload and was made by the embedded key.
    Valid,
    /// The certificate is well formed but the signature does not verify.
    SignatureMismatch,
    /// Required data is missing or unreadable.
    MalformedCertificate { reason: String },
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    fn malformed(reason: impl std::fmt::Display) -> Self {
        Self::MalformedCertificate {
            reason: reason.to_string(),
        }
    }
}

/// Check a certificate's signature against its embedded public key.
pub fn verify(cert: &SignedCertificate) -> VerificationResult {
    let canonical = match cert.payload.canonicalize() {
        Ok(c) => c,
        Err(e) => return VerificationResult::malformed(e),
    };
    let public = match import_public(&cert.public_key) {
        Ok(k) => k,
        Err(e) => return VerificationResult::malformed(e),
    };
    let signature = match Signature::from_base64(&cert.signature) {
        Ok(s) => s,
        Err(e) => return VerificationResult::malformed(e),
    };

    match verify_signature(&public, &canonical, &signature) {
        Ok(()) => VerificationResult::Valid,
        Err(CryptoError::SignatureMismatch) => {
            tracing::debug!(certificate_id = %cert.id(), "signature mismatch");
            VerificationResult::SignatureMismatch
        }
        Err(e) => VerificationResult::malformed(e),
    }
}

/// Parse the transport format and check the signature.
///
/// Unparsable input, including a missing `signature` or `publicKey`, is
/// `MalformedCertificate`, never `Valid`.
pub fn verify_transport(input: &str) -> VerificationResult {
    match SignedCertificate::from_json(input) {
        Ok(cert) => verify(&cert),
        Err(e) => VerificationResult::malformed(e),
    }
}
