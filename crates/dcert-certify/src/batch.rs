//! # Bulk Issuance
//!
//! Fans a list of certificate requests out to one blocking task each and
//! collects a per-item result. A failing item never aborts the others, and
//! every result is attributed to its input index, so the order in which
//! tasks finish does not matter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dcert_core::{CertificateFields, DcertError, SignedCertificate};
use dcert_crypto::KeyPair;

use crate::error::CertifyError;
use crate::signer::CertificateSigner;

/// Shared course and issuer details plus a list of recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub course_name: String,
    #[serde(default)]
    pub issuer_name: String,
    #[serde(default)]
    pub issuer_organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub recipients: Vec<String>,
}

impl BulkRequest {
    /// One `CertificateFields` per non-blank recipient name, in input order.
    ///
    /// # Errors
    ///
    /// `MalformedPayload` if the course name is blank or no recipient name
    /// is left after dropping blanks.
    pub fn expand(&self) -> Result<Vec<CertificateFields>, DcertError> {
        if self.course_name.trim().is_empty() {
            return Err(DcertError::MalformedPayload("courseName is empty".into()));
        }
        let fields: Vec<CertificateFields> = self
            .recipients
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| {
                let f = CertificateFields::new(name, self.course_name.trim())
                    .with_issuer(self.issuer_name.clone(), self.issuer_organization.clone());
                match &self.logo_url {
                    Some(url) => f.with_logo(url.clone()),
                    None => f,
                }
            })
            .collect();
        if fields.is_empty() {
            return Err(DcertError::MalformedPayload(
                "at least one recipient name is required".into(),
            ));
        }
        Ok(fields)
    }
}

/// Outcome of one batch entry.
#[derive(Debug)]
pub struct BatchItem {
    /// Position in the input list.
    pub index: usize,
    pub recipient_name: String,
    pub result: Result<SignedCertificate, CertifyError>,
}

/// Per-item outcomes of a batch, ordered by input index.
#[derive(Debug, Default)]
pub struct BatchReport {
    items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<BatchItem> {
        self.items
    }

    pub fn issued(&self) -> impl Iterator<Item = &SignedCertificate> {
        self.items.iter().filter_map(|item| item.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter().filter(|item| item.result.is_err())
    }

    pub fn issued_count(&self) -> usize {
        self.issued().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Sign every entry concurrently with the same key pair.
///
/// Must be called from within a Tokio runtime.
pub async fn issue_batch(items: Vec<CertificateFields>, keys: Arc<KeyPair>) -> BatchReport {
    let total = items.len();
    let mut handles = Vec::with_capacity(total);
    for fields in items {
        let keys = Arc::clone(&keys);
        let recipient_name = fields.recipient_name.clone();
        let handle = tokio::task::spawn_blocking(move || {
            CertificateSigner::issue(fields, keys.private(), keys.public())
        });
        handles.push((recipient_name, handle));
    }

    let mut report = BatchReport {
        items: Vec::with_capacity(total),
    };
    for (index, (recipient_name, handle)) in handles.into_iter().enumerate() {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(CertifyError::TaskFailed(e.to_string())),
        };
        if let Err(e) = &result {
            tracing::warn!(index, recipient = %recipient_name, error = %e, "batch item failed");
        }
        report.items.push(BatchItem {
            index,
            recipient_name,
            result,
        });
    }

    tracing::info!(
        total,
        issued = report.issued_count(),
        failed = report.failed_count(),
        "batch issuance finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(recipients: &[&str]) -> BulkRequest {
        BulkRequest {
            course_name: "Bitcoin Fundamentals".into(),
            issuer_name: "Bitcoin Dada".into(),
            issuer_organization: "Dada Devs".into(),
            logo_url: None,
            recipients: recipients.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn expand_skips_blank_names() {
        let fields = request(&["Ada", "", "  ", " Grace "]).expand().unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.recipient_name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Grace"]);
        assert!(fields.iter().all(|f| f.issuer_organization == "Dada Devs"));
    }

    #[test]
    fn expand_requires_course_and_recipient() {
        assert!(request(&["", " "]).expand().is_err());
        let mut no_course = request(&["Ada"]);
        no_course.course_name = " ".into();
        assert!(no_course.expand().is_err());
    }

    #[test]
    fn bulk_request_parses_camel_case() {
        let req: BulkRequest = serde_json::from_str(
            r#"{"courseName":"Lightning","recipients":["Ada","Grace"],"logoUrl":"https://x/l.png"}"#,
        )
        .unwrap();
        assert_eq!(req.recipients.len(), 2);
        assert_eq!(req.issuer_name, "");
        assert_eq!(req.expand().unwrap()[0].logo_url.as_deref(), Some("https://x/l.png"));
    }

    #[tokio::test]
    async fn failures_are_isolated_and_attributed() {
        let keys = Arc::new(KeyPair::generate().unwrap());
        let items = vec![
            CertificateFields::new("Ada", "Course"),
            CertificateFields::new("", "Course"),
            CertificateFields::new("Grace", "Course"),
            CertificateFields::new("Hedy", ""),
            CertificateFields::new("Katherine", "Course"),
        ];
        let report = issue_batch(items, keys).await;

        assert_eq!(report.len(), 5);
        assert_eq!(report.issued_count(), 3);
        let failed: Vec<usize> = report.failed().map(|i| i.index).collect();
        assert_eq!(failed, vec![1, 3]);
        for item in report.items() {
            if let Ok(cert) = &item.result {
                assert_eq!(cert.payload.recipient_name, item.recipient_name);
            }
        }
    }

    #[tokio::test]
    async fn empty_batch_is_empty_report() {
        let keys = Arc::new(KeyPair::generate().unwrap());
        let report = issue_batch(Vec::new(), keys).await;
        assert!(report.is_empty());
    }
}
