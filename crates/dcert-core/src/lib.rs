//! # dcert-core: Certificate Data Model
//!
//! The leaf crate of the workspace. It owns everything that decides which
//! bytes get signed:
//!
//! - **`CanonicalBytes`**: RFC 8785 canonical JSON; the only input accepted
//!   by signing, verification and hashing functions anywhere in the
//!   workspace.
//! - **`Timestamp`**: UTC-only, seconds precision, fixed `Z` rendering.
//! - **`CertificateId`**: time-ordered, random, human-displayable
//!   identifiers.
//! - **`CertificatePayload` / `SignedCertificate`**: the signed field set
//!   and the transport record.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dcert-*` crates.
//! - No `unsafe`, no `.unwrap()` outside tests.

pub mod canonical;
pub mod certificate;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use certificate::{
    CertificateFields, CertificatePayload, SignedCertificate, TimestampProof, PAYLOAD_FIELDS,
    PAYLOAD_VERSION,
};
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, DcertError};
pub use identity::{new_id, CertificateId, IssuerId};
pub use temporal::Timestamp;
