//! # Timestamp Anchoring
//!
//! Binds a certificate to an external timestamping service through a
//! SHA-256 subject hash.
//!
//! ## Subject hash
//!
//! The anchored subject is the JCS canonical form of exactly
//!
//! ```text
//! { id, recipientName, courseName, issueDate, signature }
//! ```
//!
//! Including the signature ties the anchor to one specific signed
//! certificate. Issuer fields, logo, public key and all revocation or proof
//! metadata are outside the subject, so revoking a certificate or attaching
//! a proof never changes its hash.
//!
//! ## Calendars
//!
//! [`AnchorCalendar`] is the interface to the external service. The
//! [`LocalCalendar`] shipped here mints pending proofs locally for
//! development; it provides no external finality at all.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use dcert_core::{
    sha256_digest, CanonicalBytes, CertificateId, ContentDigest, DcertError, SignedCertificate,
    Timestamp, TimestampProof,
};

/// Public calendars a pending proof points at.
pub const DEFAULT_CALENDARS: [&str; 2] = [
    "https://alice.btc.calendar.opentimestamps.org",
    "https://bob.btc.calendar.opentimestamps.org",
];

const EXPLORER_TX_URL: &str = "https://mempool.space/tx/";

/// Errors from anchoring operations.
#[derive(Error, Debug)]
pub enum AnchorError {
    /// The calendar refused the submission.
    #[error("anchor rejected: {0}")]
    Rejected(String),

    /// The opaque proof blob could not be decoded.
    #[error("malformed timestamp proof: {0}")]
    MalformedProof(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnchorSubject<'a> {
    id: &'a CertificateId,
    recipient_name: &'a str,
    course_name: &'a str,
    issue_date: Timestamp,
    signature: &'a str,
}

/// Compute the anchoring subject hash of a certificate.
pub fn subject_hash(cert: &SignedCertificate) -> Result<ContentDigest, DcertError> {
    let subject = AnchorSubject {
        id: &cert.payload.id,
        recipient_name: &cert.payload.recipient_name,
        course_name: &cert.payload.course_name,
        issue_date: cert.payload.issue_date,
        signature: &cert.signature,
    };
    Ok(sha256_digest(&CanonicalBytes::new(&subject)?))
}

/// True iff `proof` was issued for `digest`.
///
/// The comparison is constant-time. A stored hash that is not 64 hex
/// characters never matches.
pub fn bind_proof(digest: &ContentDigest, proof: &TimestampProof) -> bool {
    match ContentDigest::from_hex(&proof.hash) {
        Ok(stored) => digest.as_bytes()[..].ct_eq(&stored.as_bytes()[..]).into(),
        Err(_) => false,
    }
}

/// Block explorer page for an anchoring transaction.
pub fn explorer_url(txid: &str) -> String {
    format!("{EXPLORER_TX_URL}{txid}")
}

/// Multi-line human-readable summary of a proof.
pub fn describe_proof(proof: &TimestampProof) -> String {
    let mut out = format!("Timestamp: {}\nHash: {}\n", proof.timestamp, proof.hash);
    if let Some(height) = proof.block_height {
        out.push_str(&format!("Block Height: {height}\n"));
    }
    if let Some(txid) = &proof.transaction_id {
        out.push_str(&format!("Transaction: {txid}\nExplorer: {}\n", explorer_url(txid)));
    }
    out
}

/// An external timestamping service.
#[async_trait]
pub trait AnchorCalendar: Send + Sync {
    /// Submit a subject hash. The returned proof is usually still pending.
    async fn submit(&self, digest: &ContentDigest) -> Result<TimestampProof, AnchorError>;

    /// Ask the service to complete a pending proof. Returns the proof
    /// unchanged if it is not complete yet.
    async fn upgrade(&self, proof: &TimestampProof) -> Result<TimestampProof, AnchorError>;
}

/// Decoded form of the opaque proof blob minted by [`LocalCalendar`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBlob {
    pub version: u32,
    pub file_hash: String,
    pub timestamp: Timestamp,
    pub attestations: Vec<Attestation>,
}

impl ProofBlob {
    /// Decode a base64 proof blob.
    pub fn decode(proof: &str) -> Result<Self, AnchorError> {
        let bytes = STANDARD
            .decode(proof.trim())
            .map_err(|e| AnchorError::MalformedProof(format!("not base64: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| AnchorError::MalformedProof(e.to_string()))
    }

    fn encode(&self) -> Result<String, AnchorError> {
        let json =
            serde_json::to_vec(self).map_err(|e| AnchorError::MalformedProof(e.to_string()))?;
        Ok(STANDARD.encode(json))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attestation {
    Pending { url: String },
    Bitcoin { block_height: u64 },
}

/// Development calendar. Proofs are minted locally and upgraded to a
/// simulated block on demand.
#[derive(Debug)]
pub struct LocalCalendar {
    calendars: Vec<String>,
    next_block: AtomicU64,
}

impl Default for LocalCalendar {
    fn default() -> Self {
        Self::new(DEFAULT_CALENDARS.iter().map(|s| s.to_string()).collect(), 840_000)
    }
}

impl LocalCalendar {
    pub fn new(calendars: Vec<String>, first_block: u64) -> Self {
        Self {
            calendars,
            next_block: AtomicU64::new(first_block),
        }
    }

    /// True iff the proof's own hash and the hash recorded inside its blob
    /// both match `digest`.
    pub fn verify(&self, proof: &TimestampProof, digest: &ContentDigest) -> bool {
        if !bind_proof(digest, proof) {
            return false;
        }
        match ProofBlob::decode(&proof.proof) {
            Ok(blob) => blob.file_hash == digest.to_hex(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl AnchorCalendar for LocalCalendar {
    async fn submit(&self, digest: &ContentDigest) -> Result<TimestampProof, AnchorError> {
        if self.calendars.is_empty() {
            return Err(AnchorError::Rejected("no calendars configured".into()));
        }
        let timestamp = Timestamp::now();
        let blob = ProofBlob {
            version: 1,
            file_hash: digest.to_hex(),
            timestamp,
            attestations: self
                .calendars
                .iter()
                .map(|url| Attestation::Pending { url: url.clone() })
                .collect(),
        };
        tracing::debug!(hash = %digest, "timestamp proof submitted");
        Ok(TimestampProof {
            hash: digest.to_hex(),
            timestamp,
            proof: blob.encode()?,
            transaction_id: None,
            block_height: None,
        })
    }

    async fn upgrade(&self, proof: &TimestampProof) -> Result<TimestampProof, AnchorError> {
        let mut blob = ProofBlob::decode(&proof.proof)?;
        if proof.block_height.is_some() {
            return Ok(proof.clone());
        }
        let block_height = self.next_block.fetch_add(1, Ordering::SeqCst);
        blob.attestations = vec![Attestation::Bitcoin { block_height }];

        let txid = CanonicalBytes::new(&serde_json::json!({
            "blockHeight": block_height,
            "fileHash": blob.file_hash,
        }))
        .map(|cb| sha256_digest(&cb).to_hex())
        .map_err(|e| AnchorError::MalformedProof(e.to_string()))?;

        tracing::debug!(hash = %proof.hash, block_height, "timestamp proof upgraded");
        Ok(TimestampProof {
            hash: proof.hash.clone(),
            timestamp: proof.timestamp,
            proof: blob.encode()?,
            transaction_id: Some(txid),
            block_height: Some(block_height),
        })
    }
}
