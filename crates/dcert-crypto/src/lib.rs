//! # dcert-crypto: Keys and Signatures
//!
//! - **Keys**: Ed25519 key generation, PKCS#8 / SPKI text envelopes, kind
//!   detection on import, SPKI fingerprints for logging.
//! - **Signatures**: signing and strict verification over `CanonicalBytes`
//!   (the only accepted message type), base64 transport encoding.
//!
//! Ed25519 gives roughly 128-bit security with SHA-512 as its internal hash
//! and deterministic signatures, so signing needs no RNG at all.
//!
//! ## Crate Policy
//!
//! - Depends only on `dcert-core` internally.
//! - No mocking of cryptographic operations in tests; all tests use real
//!   keys and real signatures.
//! - Key material never appears in `Debug` output or logs.

pub mod error;
pub mod keys;
pub mod signature;

pub use error::CryptoError;
pub use keys::{
    export_private, export_public, import_private, import_public, KeyKind, KeyPair, PrivateKey,
    PublicKey,
};
pub use signature::{sign, verify, Signature};
