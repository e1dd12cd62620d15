//! # Verify Subcommand
//!
//! Checks a certificate file, or a stored certificate by identifier.
//!
//! File verification is fully offline unless a store is configured, in
//! which case the revocation registry is consulted as well. Exits with 0
//! only for an authentic certificate.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use dcert_certify::{VerificationReport, VerificationService};
use dcert_core::CertificateId;

use crate::{parse_certificate_id, write_json, Context};

/// Arguments for `dcert verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Certificate file in transport JSON.
    #[arg(value_name = "FILE", required_unless_present = "id", conflicts_with = "id")]
    pub file: Option<PathBuf>,

    /// Verify the stored certificate with this identifier.
    #[arg(long, value_parser = parse_certificate_id)]
    pub id: Option<CertificateId>,

    /// Do not consult the revocation registry even if a store is configured.
    #[arg(long)]
    pub offline: bool,

    /// Print the full report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `dcert verify`.
pub async fn run_verify(args: &VerifyArgs, ctx: &Context) -> Result<u8> {
    let use_store = args.id.is_some() || (!args.offline && ctx.config.database_url.is_some());
    let store = ctx.store_for(use_store).await?;
    let service = VerificationService::new(store);

    let report = match (&args.id, &args.file) {
        (Some(id), _) => service.verify_by_id(id).await?,
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read certificate: {}", path.display()))?;
            if !use_store {
                tracing::warn!("no store configured; revocation registry not consulted");
            }
            service.verify_uploaded(&text).await?
        }
        (None, None) => anyhow::bail!("pass a certificate file or --id"),
    };

    if args.json {
        write_json(None, &report)?;
    } else {
        print_report(&report);
    }
    Ok(if report.verdict.is_authentic() { 0 } else { 1 })
}

fn print_report(report: &VerificationReport) {
    if let Some(id) = &report.certificate_id {
        println!("Certificate: {id}");
    }
    println!("{}", report.verdict.message());
}
