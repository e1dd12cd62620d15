//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only byte representation that is ever signed,
//! verified, or hashed. It is produced by RFC 8785 (JSON Canonicalization
//! Scheme) serialization: object keys sorted, compact separators, UTF-8
//! output, no insignificant whitespace.
//!
//! ## Security Invariant
//!
//! The inner buffer is private and the only constructor is
//! [`CanonicalBytes::new`]. Signing and digest functions accept
//! `&CanonicalBytes` rather than `&[u8]`, so no code path can sign or hash
//! an ad-hoc serialization whose byte layout depends on struct field order,
//! map insertion order, or formatter settings.
//!
//! ## Coercion Rules
//!
//! 1. `null`, booleans, strings and integers pass through unchanged.
//! 2. Floats are rejected: JCS number rendering for non-integers is a
//!    portability hazard, and no certificate field is fractional.
//! 3. Objects and arrays are recursed.
//!
//! Timestamps reach this layer already rendered by
//! [`Timestamp`](crate::Timestamp) as `YYYY-MM-DDTHH:MM:SSZ`, so the host
//! locale and timezone never influence the output.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - Keys are sorted, separators are compact (RFC 8785).
/// - No float values are present.
/// - The same logical value always yields the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// non-integer number, `CanonicalizationError::SerializationFailed` if
    /// serde cannot render the value as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let coerced = coerce_json_value(value)?;
        let s = serde_jcs::to_string(&coerced)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn coerce_json_value(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(value)
        }
        Value::Object(map) => {
            let mut coerced = serde_json::Map::new();
            for (k, v) in map {
                coerced.insert(k, coerce_json_value(v)?);
            }
            Ok(Value::Object(coerced))
        }
        Value::Array(arr) => {
            let coerced: Result<Vec<_>, _> = arr.into_iter().map(coerce_json_value).collect();
            Ok(Value::Array(coerced?))
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value_no_floats() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,40}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,10}", inner, 0..8)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn canonicalization_is_deterministic(value in json_value_no_floats()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        #[test]
        fn canonical_output_is_valid_json(value in json_value_no_floats()) {
            let cb = CanonicalBytes::new(&value).unwrap();
            let parsed: Result<Value, _> = serde_json::from_slice(cb.as_bytes());
            prop_assert!(parsed.is_ok());
        }

        #[test]
        fn insertion_order_does_not_matter(
            entries in prop::collection::btree_map("[a-z]{1,8}", "[a-z]{0,8}", 1..8)
        ) {
            let forward: serde_json::Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            let reversed: serde_json::Map<String, Value> = entries
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            let a = CanonicalBytes::new(&Value::Object(forward)).unwrap();
            let b = CanonicalBytes::new(&Value::Object(reversed)).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }
    }
}
