//! # Error Types
//!
//! Key encoding and signature failures. A signature that does not verify is
//! reported as [`CryptoError::SignatureMismatch`]; higher layers turn it into
//! a verification outcome rather than an error.

use thiserror::Error;

use crate::keys::KeyKind;

/// Error in key handling, signing, or verification.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key text is not a readable envelope or does not hold a valid key.
    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    /// A key of one kind was supplied where the other kind was expected.
    #[error("expected a {expected} key, found a {found} key")]
    KeyKindMismatch { expected: KeyKind, found: KeyKind },

    /// The operating system RNG could not supply key material.
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// The signing provider rejected the request.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The signature does not verify under the given public key.
    #[error("signature does not match the payload and public key")]
    SignatureMismatch,

    /// The signature text is not base64 or has the wrong length.
    #[error("invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),
}
