//! # Keygen Subcommand
//!
//! Generates an Ed25519 issuer key pair and writes both halves as PEM:
//! `<prefix>.key` (PKCS#8 private key) and `<prefix>.pub` (SPKI public key).

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use dcert_crypto::{export_private, export_public, KeyPair};

/// Arguments for `dcert keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Output directory for the key files.
    #[arg(long, short, default_value = ".")]
    pub out_dir: PathBuf,

    /// Prefix for the key filenames.
    #[arg(long, default_value = "dcert")]
    pub prefix: String,

    /// Overwrite existing key files.
    #[arg(long)]
    pub force: bool,
}

/// Execute `dcert keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    std::fs::create_dir_all(&args.out_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            args.out_dir.display()
        )
    })?;

    let key_path = args.out_dir.join(format!("{}.key", args.prefix));
    let pub_path = args.out_dir.join(format!("{}.pub", args.prefix));
    if !args.force {
        for path in [&key_path, &pub_path] {
            if path.exists() {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                );
            }
        }
    }

    let keys = KeyPair::generate()?;
    let private_pem = export_private(keys.private())?;
    let public_pem = export_public(keys.public())?;

    write_private(&key_path, private_pem.as_bytes())?;
    std::fs::write(&pub_path, &public_pem)
        .with_context(|| format!("failed to write public key: {}", pub_path.display()))?;

    tracing::info!(key = %keys.public().fingerprint(), "generated issuer key pair");
    println!("OK: generated Ed25519 key pair");
    println!("  Private key: {}", key_path.display());
    println!("  Public key:  {}", pub_path.display());
    println!("  Fingerprint: {}", keys.public().fingerprint());
    Ok(0)
}

/// Create the private key file readable by the owner only.
fn write_private(path: &Path, pem: &[u8]) -> Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create private key: {}", path.display()))?;
    // `mode` only applies on creation; an overwritten file keeps its old bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict private key: {}", path.display()))?;
    }
    file.write_all(pem)
        .with_context(|| format!("failed to write private key: {}", path.display()))
}
