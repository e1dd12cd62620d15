//! # Error Types
//!
//! `CertifyError` wraps the error of every layer below it. Negative
//! verification outcomes are not errors; see
//! [`VerificationResult`](crate::VerificationResult) and
//! [`Verdict`](crate::Verdict).

use dcert_core::DcertError;
use dcert_crypto::CryptoError;
use dcert_state::RevocationError;
use dcert_store::StoreError;
use thiserror::Error;

use crate::anchor::AnchorError;

#[derive(Error, Debug)]
pub enum CertifyError {
    #[error(transparent)]
    Core(#[from] DcertError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Revocation(#[from] RevocationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Anchor(#[from] AnchorError),

    /// A batch worker task panicked or was cancelled.
    #[error("issuance task failed: {0}")]
    TaskFailed(String),
}
