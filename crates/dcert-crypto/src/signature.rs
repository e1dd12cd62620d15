//! # Signing and Verification
//!
//! Signatures are always taken over [`CanonicalBytes`], never raw bytes, so
//! no caller can sign an ad-hoc serialization. Verification uses
//! `verify_strict`, which rejects small-order public keys and non-canonical
//! signature encodings.
//!
//! Signatures travel as standard base64 of the 64 raw signature bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use dcert_core::CanonicalBytes;
use ed25519_dalek::Signer;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;
use crate::keys::{PrivateKey, PublicKey};

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// An Ed25519 signature.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Transport encoding.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse the transport encoding. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// `InvalidSignatureEncoding` if the text is not base64 or does not
    /// decode to exactly 64 bytes.
    pub fn from_base64(text: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| CryptoError::InvalidSignatureEncoding(e.to_string()))?;
        let arr: [u8; SIGNATURE_LEN] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidSignatureEncoding(format!(
                "signature must be {SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.iter().take(4).map(|b| format!("{b:02x}")).collect();
        write!(f, "Signature({prefix}...)")
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_base64(&text).map_err(serde::de::Error::custom)
    }
}

/// Sign canonical bytes.
///
/// # Errors
///
/// `SigningFailed` if the provider refuses the operation.
pub fn sign(key: &PrivateKey, data: &CanonicalBytes) -> Result<Signature, CryptoError> {
    let sig = key
        .signing_key
        .try_sign(data.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    Ok(Signature(sig.to_bytes()))
}

/// Verify a signature over canonical bytes.
///
/// # Errors
///
/// `SignatureMismatch` if the signature was not produced over `data` by the
/// private half of `key`.
pub fn verify(
    key: &PublicKey,
    data: &CanonicalBytes,
    signature: &Signature,
) -> Result<(), CryptoError> {
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    key.verifying_key
        .verify_strict(data.as_bytes(), &sig)
        .map_err(|_| CryptoError::SignatureMismatch)
}
