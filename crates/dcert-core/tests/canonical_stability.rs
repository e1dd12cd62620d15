//! # Canonical Form Stability
//!
//! The signed bytes of a certificate must depend only on its logical
//! content. These tests feed the same payload through differently ordered
//! JSON documents, different construction paths and different timestamp
//! renderings and require byte-identical output.

use dcert_core::{sha256_hex, CertificateFields, CertificateId, CertificatePayload, Timestamp};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn payload_entries(
    recipient: &str,
    course: &str,
    issuer: &str,
    org: &str,
) -> Vec<(&'static str, Value)> {
    vec![
        ("id", Value::from("CERT-STABLE-1")),
        ("recipientName", Value::from(recipient)),
        ("courseName", Value::from(course)),
        ("issueDate", Value::from("2025-03-08T09:15:27Z")),
        ("issuerName", Value::from(issuer)),
        ("issuerOrganization", Value::from(org)),
    ]
}

fn object_from(entries: &[(&'static str, Value)]) -> Value {
    let mut map = Map::new();
    for (k, v) in entries {
        map.insert((*k).to_string(), v.clone());
    }
    Value::Object(map)
}

#[test]
fn typed_and_untyped_construction_agree() {
    let typed = CertificateFields::new("Ada Lovelace", "Bitcoin Fundamentals")
        .with_issuer("Bitcoin Dada", "Dada Devs")
        .into_payload(
            CertificateId::parse("CERT-STABLE-1").unwrap(),
            Timestamp::parse("2025-03-08T09:15:27Z").unwrap(),
        );
    let untyped = CertificatePayload::from_json_value(object_from(&payload_entries(
        "Ada Lovelace",
        "Bitcoin Fundamentals",
        "Bitcoin Dada",
        "Dada Devs",
    )))
    .unwrap();

    assert_eq!(
        typed.canonicalize().unwrap(),
        untyped.canonicalize().unwrap()
    );
}

#[test]
fn subsecond_precision_does_not_reach_signed_bytes() {
    let mut entries = payload_entries("Ada", "Course", "", "");
    let plain = CertificatePayload::from_json_value(object_from(&entries)).unwrap();
    entries[3].1 = Value::from("2025-03-08T09:15:27.999Z");
    let with_millis = CertificatePayload::from_json_value(object_from(&entries)).unwrap();

    assert_eq!(
        sha256_hex(&plain.canonicalize().unwrap()),
        sha256_hex(&with_millis.canonicalize().unwrap())
    );
}

#[test]
fn non_ascii_names_are_emitted_verbatim() {
    let payload = CertificatePayload::from_json_value(object_from(&payload_entries(
        "Chiamaka Ọkọnkwọ",
        "Lightning Basics",
        "",
        "",
    )))
    .unwrap();
    let bytes = payload.canonicalize().unwrap();
    let text = std::str::from_utf8(bytes.as_bytes()).unwrap();
    assert!(text.contains("Chiamaka Ọkọnkwọ"));
}

proptest! {
    #[test]
    fn field_order_never_changes_signed_bytes(
        recipient in "[A-Za-z][A-Za-z .'-]{0,40}",
        course in "[A-Za-z0-9][A-Za-z0-9 :&-]{0,40}",
        issuer in "[A-Za-z ]{0,20}",
        org in "[A-Za-z ]{0,20}",
        rotation in 0usize..6,
        reverse in any::<bool>(),
    ) {
        let entries = payload_entries(&recipient, &course, &issuer, &org);
        let mut shuffled = entries.clone();
        shuffled.rotate_left(rotation);
        if reverse {
            shuffled.reverse();
        }

        let a = CertificatePayload::from_json_value(object_from(&entries)).unwrap();
        let b = CertificatePayload::from_json_value(object_from(&shuffled)).unwrap();
        prop_assert_eq!(a.canonicalize().unwrap(), b.canonicalize().unwrap());
    }

    #[test]
    fn distinct_recipients_give_distinct_bytes(
        a in "[A-Za-z]{1,20}",
        b in "[A-Za-z]{1,20}",
    ) {
        prop_assume!(a != b);
        let pa = CertificatePayload::from_json_value(object_from(&payload_entries(&a, "C", "", ""))).unwrap();
        let pb = CertificatePayload::from_json_value(object_from(&payload_entries(&b, "C", "", ""))).unwrap();
        prop_assert_ne!(pa.canonicalize().unwrap(), pb.canonicalize().unwrap());
    }
}
