//! # Revocation Lifecycle
//!
//! A certificate is created implicitly `Active`. The only transition is
//! `Active → Revoked`, which records a reason and an instant. `Revoked` is
//! terminal: a second revocation is rejected and leaves the first reason and
//! timestamp untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dcert_core::{CertificateId, Timestamp};

// ─── Revocation Status ───────────────────────────────────────────────

/// Revocation state of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevocationStatus {
    /// Certificate is in force.
    Active,
    /// Certificate has been withdrawn by its issuer (terminal).
    Revoked,
}

impl RevocationStatus {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }
}

impl std::fmt::Display for RevocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Revoked => "REVOKED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Rejected revocation transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevocationError {
    /// The certificate is already in the terminal `Revoked` state.
    #[error("certificate {certificate_id} was already revoked at {revoked_at}: {reason}")]
    AlreadyRevoked {
        certificate_id: CertificateId,
        /// Reason recorded by the first revocation.
        reason: String,
        /// Instant recorded by the first revocation.
        revoked_at: Timestamp,
    },

    /// A revocation must state why.
    #[error("revocation of certificate {certificate_id} requires a non-empty reason")]
    ReasonRequired { certificate_id: CertificateId },
}

// ─── Revocation Record ───────────────────────────────────────────────

/// Revocation state of one certificate.
///
/// # Invariants
///
/// - `status == Revoked` iff `reason` and `revoked_at` are both `Some`.
/// - `reason`, when present, is non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRecord {
    pub certificate_id: CertificateId,
    pub status: RevocationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<Timestamp>,
}

impl RevocationRecord {
    /// The implicit state of every newly issued certificate.
    pub fn active(certificate_id: CertificateId) -> Self {
        Self {
            certificate_id,
            status: RevocationStatus::Active,
            reason: None,
            revoked_at: None,
        }
    }

    /// Rebuild an already revoked record, e.g. from persisted columns.
    ///
    /// Goes through the guarded transition, so the invariants hold for the
    /// result.
    pub fn revoked(
        certificate_id: CertificateId,
        reason: &str,
        revoked_at: Timestamp,
    ) -> Result<Self, RevocationError> {
        let mut record = Self::active(certificate_id);
        record.revoke(reason, revoked_at)?;
        Ok(record)
    }

    /// Revoke the certificate (ACTIVE → REVOKED).
    ///
    /// The reason is stored trimmed.
    ///
    /// # Errors
    ///
    /// - `AlreadyRevoked` if the record is terminal; nothing is changed.
    /// - `ReasonRequired` if `reason` is empty or whitespace.
    pub fn revoke(&mut self, reason: &str, at: Timestamp) -> Result<(), RevocationError> {
        self.require_active()?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(RevocationError::ReasonRequired {
                certificate_id: self.certificate_id.clone(),
            });
        }
        self.status = RevocationStatus::Revoked;
        self.reason = Some(reason.to_string());
        self.revoked_at = Some(at);
        Ok(())
    }

    pub fn is_revoked(&self) -> bool {
        self.status.is_terminal()
    }

    fn require_active(&self) -> Result<(), RevocationError> {
        match self.status {
            RevocationStatus::Active => Ok(()),
            RevocationStatus::Revoked => Err(RevocationError::AlreadyRevoked {
                certificate_id: self.certificate_id.clone(),
                reason: self.reason.clone().unwrap_or_default(),
                revoked_at: self.revoked_at.unwrap_or_else(Timestamp::now),
            }),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
