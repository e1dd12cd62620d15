//! # Identifiers
//!
//! `CertificateId` names a certificate; `IssuerId` names the administrative
//! account that issued it. Distinct newtypes keep the two namespaces apart.
//!
//! ## Generated certificate identifiers
//!
//! `CERT-` followed by the 32 uppercase hex digits of a UUIDv7. The leading
//! 48 bits are the issuance time in Unix milliseconds, so identifiers sort by
//! issuance and can be dated when debugging; the remaining bits are random,
//! so they cannot be enumerated. Identifiers are lookup keys, not a security
//! boundary.
//!
//! Identifiers minted elsewhere (for example `CERT-1700000000000-K3J9X2QLM`)
//! parse as opaque values.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::{Uuid, Version};

use crate::error::DcertError;

/// Longest accepted identifier, in bytes.
pub const MAX_ID_LEN: usize = 128;

/// Globally unique, immutable certificate identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CertificateId(String);

impl CertificateId {
    /// Prefix carried by generated identifiers.
    pub const PREFIX: &'static str = "CERT-";

    /// Mint a fresh identifier.
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    fn from_uuid(uuid: Uuid) -> Self {
        Self(format!("{}{}", Self::PREFIX, uuid.simple().to_string().to_uppercase()))
    }

    /// Validate an identifier received from outside.
    ///
    /// # Errors
    ///
    /// `InvalidIdentifier` if empty, longer than [`MAX_ID_LEN`], or containing
    /// whitespace or non-printable / non-ASCII characters.
    pub fn parse(s: &str) -> Result<Self, DcertError> {
        if s.is_empty() {
            return Err(DcertError::InvalidIdentifier("identifier is empty".into()));
        }
        if s.len() > MAX_ID_LEN {
            return Err(DcertError::InvalidIdentifier(format!(
                "identifier exceeds {MAX_ID_LEN} bytes"
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(DcertError::InvalidIdentifier(format!(
                "identifier {s:?} contains whitespace or non-printable characters"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Issuance time embedded in a generated identifier, in Unix
    /// milliseconds. `None` for identifiers not minted by [`generate`].
    ///
    /// [`generate`]: CertificateId::generate
    pub fn issued_at_millis(&self) -> Option<u64> {
        let hex = self.0.strip_prefix(Self::PREFIX)?;
        if hex.len() != 32 {
            return None;
        }
        let uuid = Uuid::parse_str(hex).ok()?;
        if uuid.get_version() != Some(Version::SortRand) {
            return None;
        }
        let (secs, nanos) = uuid.get_timestamp()?.to_unix();
        Some(secs * 1000 + u64::from(nanos) / 1_000_000)
    }
}

/// Mint a fresh certificate identifier.
pub fn new_id() -> CertificateId {
    CertificateId::generate()
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CertificateId {
    type Err = DcertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CertificateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CertificateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of the issuing account. Used as the `list_by_issuer` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuerId(pub Uuid);

impl IssuerId {
    /// Generate a random issuer identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for IssuerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IssuerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IssuerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_have_expected_shape() {
        let id = CertificateId::generate();
        let s = id.as_str();
        assert!(s.starts_with("CERT-"));
        assert_eq!(s.len(), 5 + 32);
        assert!(s[5..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn fifty_thousand_ids_are_distinct() {
        let ids: HashSet<CertificateId> = (0..50_000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 50_000);
    }

    #[test]
    fn generated_ids_embed_issuance_time() {
        let before = chrono::Utc::now().timestamp_millis() as u64;
        let id = CertificateId::generate();
        let after = chrono::Utc::now().timestamp_millis() as u64;
        let millis = id.issued_at_millis().expect("generated id carries a timestamp");
        assert!(millis >= before && millis <= after);
    }

    #[test]
    fn ids_from_different_milliseconds_sort_by_time() {
        let first = CertificateId::generate();
        std::thread::sleep(std::time::Duration::from_millis(3));
        let second = CertificateId::generate();
        assert!(first < second);
    }

    #[test]
    fn legacy_ids_parse_but_carry_no_time() {
        let id = CertificateId::parse("CERT-1700000000000-K3J9X2QLM").unwrap();
        assert_eq!(id.issued_at_millis(), None);
    }

    #[test]
    fn invalid_ids_rejected() {
        assert!(CertificateId::parse("").is_err());
        assert!(CertificateId::parse("CERT 1").is_err());
        assert!(CertificateId::parse("CERT-\n1").is_err());
        assert!(CertificateId::parse(&"A".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn serde_is_plain_string() {
        let id = CertificateId::parse("CERT-ABC").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"CERT-ABC\"");
        let back: CertificateId = serde_json::from_str("\"CERT-ABC\"").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<CertificateId>("\"\"").is_err());
    }

    #[test]
    fn issuer_id_parses_uuid() {
        let issuer = IssuerId::new();
        let parsed: IssuerId = issuer.to_string().parse().unwrap();
        assert_eq!(parsed, issuer);
    }
}
