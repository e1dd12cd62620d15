//! # Revoke, Status and List Subcommands
//!
//! Registry operations against the Postgres store. All three need
//! `DATABASE_URL`.

use anyhow::{bail, Result};
use clap::Args;

use dcert_certify::{CertifyError, RevocationRegistry};
use dcert_core::{CertificateId, IssuerId, Timestamp};
use dcert_state::RevocationError;
use dcert_store::{CertificateRecord, CertificateStore};

use crate::{parse_certificate_id, write_json, Context};

/// Arguments for `dcert revoke`.
#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Identifier of the certificate to revoke.
    #[arg(value_parser = parse_certificate_id)]
    pub id: CertificateId,

    /// Reason recorded with the revocation.
    #[arg(long)]
    pub reason: String,
}

/// Arguments for `dcert status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[arg(value_parser = parse_certificate_id)]
    pub id: CertificateId,

    /// Print the revocation record as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `dcert list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Issuer account to list (default: DCERT_ISSUER_ID).
    #[arg(long)]
    pub issuer_id: Option<IssuerId>,

    /// Print the certificates as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `dcert revoke`. Exits with 1 if the certificate was already
/// revoked; the original reason is kept.
pub async fn run_revoke(args: &RevokeArgs, ctx: &Context) -> Result<u8> {
    let registry = RevocationRegistry::new(ctx.open_store().await?);
    match registry.revoke(&args.id, &args.reason, Timestamp::now()).await {
        Ok(record) => {
            println!(
                "OK: revoked {} at {}",
                args.id,
                record.revoked_at.map(|t| t.to_string()).unwrap_or_default()
            );
            Ok(0)
        }
        Err(CertifyError::Revocation(RevocationError::AlreadyRevoked {
            reason, revoked_at, ..
        })) => {
            println!("{} was already revoked on {revoked_at}: {reason}", args.id);
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

/// Execute `dcert status`.
pub async fn run_status(args: &StatusArgs, ctx: &Context) -> Result<u8> {
    let store = ctx.open_store().await?;
    if store.get_by_id(&args.id).await?.is_none() {
        bail!("certificate {} not found", args.id);
    }
    let status = RevocationRegistry::new(store).status(&args.id).await?;

    if args.json {
        write_json(None, &status)?;
    } else if status.is_revoked() {
        println!(
            "{}: REVOKED ({})",
            args.id,
            status.reason.as_deref().unwrap_or_default()
        );
    } else {
        println!("{}: ACTIVE", args.id);
    }
    Ok(0)
}

/// Execute `dcert list`. Newest first.
pub async fn run_list(args: &ListArgs, ctx: &Context) -> Result<u8> {
    let issuer_id = match args.issuer_id {
        Some(id) => id,
        None => ctx.issuer_id()?,
    };
    let store = ctx.open_store().await?;
    let records = store.list_by_issuer(&issuer_id).await?;

    if args.json {
        let certificates: Vec<_> = records.iter().map(|r| &r.certificate).collect();
        write_json(None, &certificates)?;
    } else {
        for record in &records {
            println!("{}", summary_line(record));
        }
        println!("{} certificate(s)", records.len());
    }
    Ok(0)
}

fn summary_line(record: &CertificateRecord) -> String {
    let cert = &record.certificate;
    let state = if cert.revoked { "REVOKED" } else { "ACTIVE" };
    format!(
        "{}  {}  {:<7}  {} / {}",
        cert.id(),
        cert.payload.issue_date,
        state,
        cert.payload.recipient_name,
        cert.payload.course_name
    )
}
