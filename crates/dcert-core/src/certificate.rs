//! # Certificate Data Model
//!
//! - [`CertificateFields`]: what a caller supplies to issue a certificate.
//! - [`CertificatePayload`]: exactly the fields the signature covers.
//! - [`SignedCertificate`]: the transport record; payload plus signature,
//!   embedded public key, and unsigned metadata.
//! - [`TimestampProof`]: an external anchoring attestation.
//!
//! ## Payload contract
//!
//! The signed field set is [`PAYLOAD_FIELDS`], version [`PAYLOAD_VERSION`].
//! Adding or removing a field changes every canonical form and invalidates
//! every signature issued before the change. Signature, public key,
//! revocation data and timestamp proofs are deliberately absent from
//! `CertificatePayload`, so they can never leak into the signed bytes.

use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalBytes;
use crate::error::DcertError;
use crate::identity::CertificateId;
use crate::temporal::Timestamp;

/// Version of the signed field set.
pub const PAYLOAD_VERSION: u32 = 1;

/// Transport names of the signed fields, in canonical (sorted) order.
pub const PAYLOAD_FIELDS: [&str; 7] = [
    "courseName",
    "id",
    "issueDate",
    "issuerName",
    "issuerOrganization",
    "logoUrl",
    "recipientName",
];

/// Caller-supplied facts for a new certificate. The identifier and issuance
/// instant are assigned by the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFields {
    pub recipient_name: String,
    pub course_name: String,
    #[serde(default)]
    pub issuer_name: String,
    #[serde(default)]
    pub issuer_organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl CertificateFields {
    pub fn new(recipient_name: impl Into<String>, course_name: impl Into<String>) -> Self {
        Self {
            recipient_name: recipient_name.into(),
            course_name: course_name.into(),
            issuer_name: String::new(),
            issuer_organization: String::new(),
            logo_url: None,
        }
    }

    pub fn with_issuer(
        mut self,
        issuer_name: impl Into<String>,
        issuer_organization: impl Into<String>,
    ) -> Self {
        self.issuer_name = issuer_name.into();
        self.issuer_organization = issuer_organization.into();
        self
    }

    /// Attach a logo URL. Blank values are dropped.
    pub fn with_logo(mut self, logo_url: impl Into<String>) -> Self {
        let url = logo_url.into();
        self.logo_url = if url.trim().is_empty() { None } else { Some(url) };
        self
    }

    /// Bind the fields to an identifier and issuance instant.
    pub fn into_payload(self, id: CertificateId, issue_date: Timestamp) -> CertificatePayload {
        CertificatePayload {
            id,
            recipient_name: self.recipient_name,
            course_name: self.course_name,
            issue_date,
            issuer_name: self.issuer_name,
            issuer_organization: self.issuer_organization,
            logo_url: self.logo_url,
        }
    }
}

/// The signed content of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePayload {
    pub id: CertificateId,
    pub recipient_name: String,
    pub course_name: String,
    pub issue_date: Timestamp,
    pub issuer_name: String,
    pub issuer_organization: String,
    /// Omitted from the canonical form when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl CertificatePayload {
    /// Parse a payload from untyped JSON.
    ///
    /// # Errors
    ///
    /// `MalformedPayload` if a signed field is missing or has the wrong type,
    /// or if a required text field is blank.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, DcertError> {
        let payload: Self = serde_json::from_value(value)
            .map_err(|e| DcertError::MalformedPayload(e.to_string()))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Check the field constraints the type system cannot express.
    pub fn validate(&self) -> Result<(), DcertError> {
        if self.recipient_name.trim().is_empty() {
            return Err(DcertError::MalformedPayload("recipientName is empty".into()));
        }
        if self.course_name.trim().is_empty() {
            return Err(DcertError::MalformedPayload("courseName is empty".into()));
        }
        if matches!(&self.logo_url, Some(url) if url.trim().is_empty()) {
            return Err(DcertError::MalformedPayload(
                "logoUrl is present but empty".into(),
            ));
        }
        Ok(())
    }

    /// The byte string that is signed and verified.
    ///
    /// Deterministic: independent of construction order, host locale and
    /// timezone.
    pub fn canonicalize(&self) -> Result<CanonicalBytes, DcertError> {
        self.validate()?;
        Ok(CanonicalBytes::new(self)?)
    }
}

/// An external attestation binding a subject hash to a point in time.
///
/// Opaque to this crate apart from `hash`, which must equal the recomputed
/// anchor digest of the certificate it claims to cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampProof {
    /// Lowercase hex SHA-256 of the anchored subject.
    pub hash: String,
    /// Instant asserted by the anchoring service.
    pub timestamp: Timestamp,
    /// Service-specific proof blob (base64).
    pub proof: String,
    #[serde(default, alias = "txid", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
}

/// The transport record: a flat, self-describing JSON object holding every
/// payload field plus everything needed to verify it offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedCertificate {
    #[serde(flatten)]
    pub payload: CertificatePayload,
    /// Base64 of the raw signature bytes.
    pub signature: String,
    /// Text envelope of the signer's public key.
    pub public_key: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub revoked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_proof: Option<TimestampProof>,
}

impl SignedCertificate {
    /// Assemble a freshly signed certificate with no metadata.
    pub fn new(payload: CertificatePayload, signature: String, public_key: String) -> Self {
        Self {
            payload,
            signature,
            public_key,
            revoked: false,
            revoked_at: None,
            revoked_reason: None,
            timestamp_proof: None,
        }
    }

    pub fn id(&self) -> &CertificateId {
        &self.payload.id
    }

    /// Parse the transport format.
    ///
    /// # Errors
    ///
    /// `MalformedCertificate` for invalid JSON, a missing field (including
    /// `signature` and `publicKey`), a mistyped field, or a blank required
    /// text field.
    pub fn from_json(input: &str) -> Result<Self, DcertError> {
        let cert: Self = serde_json::from_str(input)
            .map_err(|e| DcertError::MalformedCertificate(e.to_string()))?;
        cert.payload
            .validate()
            .map_err(|e| DcertError::MalformedCertificate(e.to_string()))?;
        if cert.signature.trim().is_empty() {
            return Err(DcertError::MalformedCertificate("signature is empty".into()));
        }
        if cert.public_key.trim().is_empty() {
            return Err(DcertError::MalformedCertificate("publicKey is empty".into()));
        }
        Ok(cert)
    }

    /// Render the transport format as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, DcertError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DcertError::MalformedCertificate(e.to_string()))
    }
}
