//! # Hash and Check-Proof Subcommands
//!
//! `hash` prints the subject hash a timestamp calendar would be given for a
//! certificate. `check-proof` confirms that the proof embedded in a
//! certificate was issued for that certificate and describes it.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use dcert_certify::{bind_proof, describe_proof, subject_hash, Attestation, ProofBlob};

use crate::load_certificate;

/// Arguments for `dcert hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Certificate file in transport JSON.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for `dcert check-proof`.
#[derive(Args, Debug)]
pub struct CheckProofArgs {
    /// Certificate file carrying a `timestampProof`.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute `dcert hash`.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let cert = load_certificate(&args.file)?;
    println!("{}", subject_hash(&cert)?.to_hex());
    Ok(0)
}

/// Execute `dcert check-proof`. Exits with 1 if the proof belongs to a
/// different subject.
pub fn run_check_proof(args: &CheckProofArgs) -> Result<u8> {
    let cert = load_certificate(&args.file)?;
    let Some(proof) = &cert.timestamp_proof else {
        bail!("certificate {} carries no timestamp proof", cert.id());
    };
    let digest = subject_hash(&cert)?;

    print!("{}", describe_proof(proof));
    match ProofBlob::decode(&proof.proof) {
        Ok(blob) => {
            for attestation in &blob.attestations {
                match attestation {
                    Attestation::Pending { url } => println!("Pending: {url}"),
                    Attestation::Bitcoin { block_height } => {
                        println!("Bitcoin attestation at block {block_height}")
                    }
                }
            }
        }
        Err(e) => tracing::debug!(error = %e, "proof blob is not in the local calendar format"),
    }

    if bind_proof(&digest, proof) {
        println!("OK: proof is bound to certificate {}", cert.id());
        Ok(0)
    } else {
        println!(
            "MISMATCH: proof was issued for {}, certificate hashes to {}",
            proof.hash,
            digest.to_hex()
        );
        Ok(1)
    }
}
