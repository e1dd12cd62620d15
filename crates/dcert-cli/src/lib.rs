//! # dcert-cli: Certificate Command-Line Interface
//!
//! Provides the `dcert` binary for issuers and verifiers.
//!
//! ## Subcommands
//!
//! - `dcert keygen`: Generate an Ed25519 issuer key pair (PEM files).
//! - `dcert issue` / `dcert bulk-issue`: Sign certificates, optionally
//!   persisting and anchoring them.
//! - `dcert verify`: Check a certificate file or a stored certificate.
//! - `dcert hash` / `dcert check-proof`: Timestamp anchoring helpers.
//! - `dcert revoke` / `dcert status` / `dcert list`: Registry operations
//!   (require `DATABASE_URL`).
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; certificate logic lives in
//!   `dcert-certify`.
//! - Handlers return an exit code: 0 for success or an authentic
//!   certificate, 1 for a negative outcome. Errors also exit with 1.
//! - Machine-readable output goes to stdout, logs go to stderr.

pub mod config;
pub mod issue;
pub mod keygen;
pub mod proof;
pub mod registry;
pub mod verify;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use serde::Serialize;

use dcert_core::{CertificateId, IssuerId, SignedCertificate};
use dcert_crypto::{import_private, KeyPair};
use dcert_store::{init_pool, CertificateStore, InMemoryCertificateStore, PgCertificateStore};

use crate::config::CliConfig;

/// Shared state handed to every subcommand.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub config: CliConfig,
}

impl Context {
    pub fn new(config: CliConfig) -> Self {
        Self { config }
    }

    /// Connect to Postgres and run pending migrations.
    pub async fn open_store(&self) -> Result<Arc<PgCertificateStore>> {
        let Some(url) = self.config.database_url.as_deref() else {
            bail!("this command needs a certificate store: set DATABASE_URL or pass --database-url");
        };
        let pool = init_pool(url, self.config.db_max_connections)
            .await
            .context("failed to open certificate store")?;
        Ok(Arc::new(PgCertificateStore::new(pool)))
    }

    /// Postgres when `persist` is set, otherwise a throwaway in-memory store.
    pub async fn store_for(&self, persist: bool) -> Result<Arc<dyn CertificateStore>> {
        let store: Arc<dyn CertificateStore> = if persist {
            self.open_store().await?
        } else {
            Arc::new(InMemoryCertificateStore::new())
        };
        Ok(store)
    }

    /// The configured issuer account.
    pub fn issuer_id(&self) -> Result<IssuerId> {
        self.config
            .issuer_id
            .context("DCERT_ISSUER_ID must be set for commands that record certificates")
    }
}

/// Parse a certificate identifier argument.
pub fn parse_certificate_id(s: &str) -> Result<CertificateId, String> {
    CertificateId::parse(s.trim()).map_err(|e| e.to_string())
}

/// Read the issuer key pair from a PEM private key file.
pub fn load_keys(path: &Path) -> Result<KeyPair> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read private key: {}", path.display()))?;
    let private = import_private(&text)
        .with_context(|| format!("invalid private key: {}", path.display()))?;
    Ok(KeyPair::from_private(private))
}

/// Read and parse a certificate file in the transport format.
pub fn load_certificate(path: &Path) -> Result<SignedCertificate> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read certificate: {}", path.display()))?;
    SignedCertificate::from_json(&text)
        .with_context(|| format!("invalid certificate: {}", path.display()))
}

/// Write pretty JSON to `path`, or to stdout when no path is given.
pub fn write_json(path: Option<&Path>, value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    match path {
        Some(path) => std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcert_core::CertificateFields;
    use dcert_certify::CertificateSigner;
    use dcert_crypto::export_private;

    #[test]
    fn certificate_id_argument_is_trimmed_and_validated() {
        assert_eq!(
            parse_certificate_id(" CERT-ABC ").unwrap().as_str(),
            "CERT-ABC"
        );
        assert!(parse_certificate_id("CERT A").is_err());
    }

    #[test]
    fn keys_and_certificates_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let keys = KeyPair::generate().unwrap();
        let key_path = dir.path().join("issuer.key");
        std::fs::write(&key_path, export_private(keys.private()).unwrap().as_bytes()).unwrap();
        assert_eq!(load_keys(&key_path).unwrap().public(), keys.public());

        let cert = CertificateSigner::issue(
            CertificateFields::new("Ada Lovelace", "Bitcoin Fundamentals"),
            keys.private(),
            keys.public(),
        )
        .unwrap();
        let cert_path = dir.path().join("cert.json");
        write_json(Some(&cert_path), &cert).unwrap();
        assert_eq!(load_certificate(&cert_path).unwrap(), cert);
    }

    #[test]
    fn missing_files_are_reported_with_path() {
        let err = load_certificate(Path::new("/nonexistent/cert.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/cert.json"));
    }

    #[tokio::test]
    async fn store_commands_need_database_url() {
        let ctx = Context::default();
        let err = ctx.open_store().await.unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
        assert!(ctx.store_for(false).await.is_ok());
        assert!(ctx.issuer_id().is_err());
    }
}
