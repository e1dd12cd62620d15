//! # Issue and Bulk-Issue Subcommands
//!
//! Sign certificates with the issuer's private key and write them as
//! transport JSON. With `--persist` they are also recorded in the store
//! under `DCERT_ISSUER_ID`. With `--anchor` each certificate gets a pending
//! timestamp proof from the local calendar.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;

use dcert_certify::{issue_batch, BulkRequest, IssuanceService, LocalCalendar};
use dcert_core::{CertificateFields, IssuerId};
use dcert_store::CertificateStore;

use crate::{load_keys, write_json, Context};

/// Arguments for `dcert issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Path to the issuer's PEM private key.
    #[arg(long)]
    pub key: PathBuf,

    /// Recipient full name.
    #[arg(long)]
    pub recipient: String,

    /// Course or achievement name.
    #[arg(long)]
    pub course: String,

    /// Issuer display name (default: DCERT_ISSUER_NAME).
    #[arg(long)]
    pub issuer_name: Option<String>,

    /// Issuer organization (default: DCERT_ISSUER_ORG).
    #[arg(long)]
    pub issuer_org: Option<String>,

    /// Logo image URL.
    #[arg(long)]
    pub logo_url: Option<String>,

    /// Output file. Prints to stdout when omitted.
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Record the certificate in the store.
    #[arg(long)]
    pub persist: bool,

    /// Attach a timestamp proof.
    #[arg(long)]
    pub anchor: bool,
}

/// Arguments for `dcert bulk-issue`.
#[derive(Args, Debug)]
pub struct BulkIssueArgs {
    /// Path to the issuer's PEM private key.
    #[arg(long)]
    pub key: PathBuf,

    /// JSON file with `courseName`, issuer fields and a `recipients` list.
    #[arg(long)]
    pub request: PathBuf,

    /// Directory receiving one `<id>.json` per issued certificate.
    #[arg(long, short, default_value = ".")]
    pub out_dir: PathBuf,

    /// Record the certificates in the store.
    #[arg(long)]
    pub persist: bool,

    /// Attach a timestamp proof to each certificate.
    #[arg(long)]
    pub anchor: bool,
}

async fn issuance_service(
    ctx: &Context,
    persist: bool,
    anchor: bool,
) -> Result<(IssuanceService<dyn CertificateStore>, IssuerId)> {
    let store = ctx.store_for(persist).await?;
    let issuer_id = if persist {
        ctx.issuer_id()?
    } else {
        ctx.config.issuer_id.unwrap_or_default()
    };
    let mut service = IssuanceService::new(store);
    if anchor {
        service = service.with_calendar(Arc::new(LocalCalendar::default()));
    }
    Ok((service, issuer_id))
}

fn or_config(flag: &Option<String>, config: &Option<String>) -> String {
    flag.clone().or_else(|| config.clone()).unwrap_or_default()
}

/// Execute `dcert issue`.
pub async fn run_issue(args: &IssueArgs, ctx: &Context) -> Result<u8> {
    let keys = load_keys(&args.key)?;
    let mut fields = CertificateFields::new(args.recipient.trim(), args.course.trim()).with_issuer(
        or_config(&args.issuer_name, &ctx.config.issuer_name),
        or_config(&args.issuer_org, &ctx.config.issuer_organization),
    );
    if let Some(url) = &args.logo_url {
        fields = fields.with_logo(url.clone());
    }

    let (service, issuer_id) = issuance_service(ctx, args.persist, args.anchor).await?;
    let cert = service.issue(fields, &keys, issuer_id).await?;

    write_json(args.out.as_deref(), &cert)?;
    if let Some(out) = &args.out {
        println!("OK: issued {} -> {}", cert.id(), out.display());
    }
    Ok(0)
}

/// Execute `dcert bulk-issue`.
///
/// Exits with 1 if any entry failed; the others are still written.
pub async fn run_bulk_issue(args: &BulkIssueArgs, ctx: &Context) -> Result<u8> {
    let keys = Arc::new(load_keys(&args.key)?);
    let text = std::fs::read_to_string(&args.request)
        .with_context(|| format!("failed to read request: {}", args.request.display()))?;
    let mut request: BulkRequest = serde_json::from_str(&text)
        .with_context(|| format!("invalid bulk request: {}", args.request.display()))?;
    if request.issuer_name.trim().is_empty() {
        request.issuer_name = ctx.config.issuer_name.clone().unwrap_or_default();
    }
    if request.issuer_organization.trim().is_empty() {
        request.issuer_organization = ctx.config.issuer_organization.clone().unwrap_or_default();
    }
    let fields = request.expand()?;

    std::fs::create_dir_all(&args.out_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            args.out_dir.display()
        )
    })?;
    let (service, issuer_id) = issuance_service(ctx, args.persist, args.anchor).await?;

    let report = issue_batch(fields, keys).await;
    let (mut issued, mut failures) = (0usize, 0usize);
    for item in report.into_items() {
        let outcome = match item.result {
            Ok(cert) => service
                .record(cert, issuer_id)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|cert| {
                    let path = args.out_dir.join(format!("{}.json", cert.id()));
                    write_json(Some(&path), &cert).map(|()| path)
                }),
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok(path) => {
                issued += 1;
                println!(
                    "OK    #{} {} -> {}",
                    item.index,
                    item.recipient_name,
                    path.display()
                );
            }
            Err(e) => {
                failures += 1;
                println!("FAIL  #{} {}: {e:#}", item.index, item.recipient_name);
            }
        }
    }

    println!("{issued} issued, {failures} failed");
    Ok(u8::from(failures > 0))
}
