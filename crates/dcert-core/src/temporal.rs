//! # UTC Timestamps
//!
//! `Timestamp` is a UTC instant truncated to whole seconds. It always
//! renders as `YYYY-MM-DDTHH:MM:SSZ`, which is the only datetime form that
//! ever enters a canonical payload. A localized or offset rendering of the
//! same instant would produce different signed bytes.
//!
//! Parsing is strict by default: only the exact canonical rendering is
//! accepted, so no two accepted strings name the same instant. The lenient
//! parser converts any RFC 3339 offset, truncates sub-seconds and exists for
//! ingesting external data that is not part of a signed payload.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DcertError;

/// A UTC-only timestamp with seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a `YYYY-MM-DDTHH:MM:SSZ` string.
    ///
    /// # Errors
    ///
    /// `InvalidTimestamp` if the string is not RFC 3339, carries any
    /// explicit offset (including `+00:00`), or has fractional seconds.
    pub fn parse(s: &str) -> Result<Self, DcertError> {
        if !s.ends_with('Z') {
            return Err(DcertError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let ts = Self::parse_lenient(s)?;
        if ts.to_iso8601() != s {
            return Err(DcertError::InvalidTimestamp(format!(
                "timestamp must be YYYY-MM-DDTHH:MM:SSZ without fractional seconds, got: {s:?}"
            )));
        }
        Ok(ts)
    }

    /// Parse an RFC 3339 string with any offset, converting to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, DcertError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            DcertError::InvalidTimestamp(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// From Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, DcertError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| DcertError::InvalidTimestamp(format!("invalid Unix timestamp: {secs}")))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
