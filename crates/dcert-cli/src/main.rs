//! # dcert CLI entry point
//!
//! Parses command-line arguments, loads configuration from the environment
//! and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dcert_cli::config::CliConfig;
use dcert_cli::issue::{run_bulk_issue, run_issue, BulkIssueArgs, IssueArgs};
use dcert_cli::keygen::{run_keygen, KeygenArgs};
use dcert_cli::proof::{run_check_proof, run_hash, CheckProofArgs, HashArgs};
use dcert_cli::registry::{run_list, run_revoke, run_status, ListArgs, RevokeArgs, StatusArgs};
use dcert_cli::verify::{run_verify, VerifyArgs};
use dcert_cli::Context;

/// dcert: tamper-evident digital certificates.
///
/// Issues Ed25519-signed certificates, verifies them offline, and manages
/// revocation and timestamp anchoring.
#[derive(Parser, Debug)]
#[command(name = "dcert", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Postgres connection string (overrides DATABASE_URL).
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 issuer key pair.
    Keygen(KeygenArgs),

    /// Issue one certificate.
    Issue(IssueArgs),

    /// Issue certificates for a list of recipients.
    BulkIssue(BulkIssueArgs),

    /// Verify a certificate file or a stored certificate.
    Verify(VerifyArgs),

    /// Print the timestamp subject hash of a certificate.
    Hash(HashArgs),

    /// Check that a certificate's timestamp proof belongs to it.
    CheckProof(CheckProofArgs),

    /// Revoke a stored certificate.
    Revoke(RevokeArgs),

    /// Show the revocation status of a stored certificate.
    Status(StatusArgs),

    /// List an issuer's certificates, newest first.
    List(ListArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = match CliConfig::from_env() {
        Ok(config) => config.with_database_url(cli.database_url.clone()),
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(1);
        }
    };
    tracing::debug!(?config, "dcert CLI starting");
    let ctx = Context::new(config);

    let result = match &cli.command {
        Commands::Keygen(args) => run_keygen(args),
        Commands::Issue(args) => run_issue(args, &ctx).await,
        Commands::BulkIssue(args) => run_bulk_issue(args, &ctx).await,
        Commands::Verify(args) => run_verify(args, &ctx).await,
        Commands::Hash(args) => run_hash(args),
        Commands::CheckProof(args) => run_check_proof(args),
        Commands::Revoke(args) => run_revoke(args, &ctx).await,
        Commands::Status(args) => run_status(args, &ctx).await,
        Commands::List(args) => run_list(args, &ctx).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_issue() {
        let cli = Cli::try_parse_from([
            "dcert",
            "issue",
            "--key",
            "issuer.key",
            "--recipient",
            "Ada Lovelace",
            "--course",
            "Bitcoin Fundamentals",
            "--anchor",
        ])
        .unwrap();
        let Commands::Issue(args) = cli.command else {
            panic!("expected issue");
        };
        assert_eq!(args.key, PathBuf::from("issuer.key"));
        assert_eq!(args.recipient, "Ada Lovelace");
        assert!(args.anchor);
        assert!(!args.persist);
        assert!(args.out.is_none());
    }

    #[test]
    fn parse_kebab_case_subcommands() {
        let cli = Cli::try_parse_from([
            "dcert",
            "bulk-issue",
            "--key",
            "k",
            "--request",
            "r.json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::BulkIssue(_)));

        let cli = Cli::try_parse_from(["dcert", "check-proof", "cert.json"]).unwrap();
        assert!(matches!(cli.command, Commands::CheckProof(_)));
    }

    #[test]
    fn verify_takes_file_or_id_but_not_both() {
        let cli = Cli::try_parse_from(["dcert", "verify", "cert.json"]).unwrap();
        let Commands::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.file, Some(PathBuf::from("cert.json")));

        let cli = Cli::try_parse_from(["dcert", "verify", "--id", "CERT-ABC"]).unwrap();
        let Commands::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.id.unwrap().as_str(), "CERT-ABC");

        assert!(Cli::try_parse_from(["dcert", "verify"]).is_err());
        assert!(Cli::try_parse_from(["dcert", "verify", "cert.json", "--id", "CERT-ABC"]).is_err());
        assert!(Cli::try_parse_from(["dcert", "verify", "--id", "has space"]).is_err());
    }

    #[test]
    fn revoke_requires_reason() {
        assert!(Cli::try_parse_from(["dcert", "revoke", "CERT-ABC"]).is_err());
        let cli = Cli::try_parse_from([
            "dcert",
            "revoke",
            "CERT-ABC",
            "--reason",
            "duplicate enrollment",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Revoke(_)));
    }

    #[test]
    fn global_flags() {
        let cli = Cli::try_parse_from([
            "dcert",
            "status",
            "CERT-ABC",
            "-vv",
            "--log-json",
            "--database-url",
            "postgres://localhost/dcert",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert_eq!(cli.database_url.as_deref(), Some("postgres://localhost/dcert"));
    }
}
