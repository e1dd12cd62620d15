//! # dcert-certify: Issuance and Verification
//!
//! Composes the data model, key handling, revocation state machine and
//! certificate store into the operations an issuer and a verifier run:
//!
//! - **Signing** ([`CertificateSigner`]): fields in, signed certificate out.
//! - **Bulk issuance** ([`issue_batch`]): concurrent signing with per-item
//!   failure isolation.
//! - **Verification** ([`verify`], [`verify_transport`]): offline signature
//!   checks that never consult a server.
//! - **Revocation** ([`RevocationRegistry`]): store-backed, first revocation
//!   wins.
//! - **Anchoring** ([`subject_hash`], [`bind_proof`], [`AnchorCalendar`]):
//!   binding certificates to an external timestamp.
//! - **Services** ([`VerificationService`], [`IssuanceService`]): the
//!   combined flows used by the CLI.
//!
//! ## Crate Policy
//!
//! - Keys are always explicit arguments. Nothing here reads key material
//!   from the environment or the filesystem.
//! - Negative verification outcomes are values, not errors.

pub mod anchor;
pub mod batch;
pub mod error;
pub mod registry;
pub mod service;
pub mod signer;
pub mod verifier;

pub use anchor::{
    bind_proof, describe_proof, explorer_url, subject_hash, AnchorCalendar, AnchorError,
    Attestation, LocalCalendar, ProofBlob, DEFAULT_CALENDARS,
};
pub use batch::{issue_batch, BatchItem, BatchReport, BulkRequest};
pub use error::CertifyError;
pub use registry::RevocationRegistry;
pub use service::{IssuanceService, VerificationReport, VerificationService, Verdict};
pub use signer::CertificateSigner;
pub use verifier::{verify, verify_transport, VerificationResult};
