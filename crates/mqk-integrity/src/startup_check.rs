//! Startup integrity check (§6.6): the on-disk program IDL/artifact this
//! core builds transactions against must hash to a known-good value before
//! the process will accept LIVE or DRY_RUN traffic. Protects against a
//! silently swapped or corrupted artifact on a redeployed host.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub fn sha256_hex(path: impl AsRef<Path>) -> Result<String> {
    let bytes = fs::read(path.as_ref()).with_context(|| format!("read artifact: {:?}", path.as_ref()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Verify `artifact_path` hashes to `expected_sha256_hex`. Fails closed: any
/// IO error or mismatch is an `Err`, never a silent pass.
pub fn verify_startup_integrity(artifact_path: impl AsRef<Path>, expected_sha256_hex: &str) -> Result<()> {
    let actual = sha256_hex(artifact_path.as_ref())?;
    if !actual.eq_ignore_ascii_case(expected_sha256_hex) {
        bail!(
            "INTEGRITY_CHECK_FAILED: {:?} hashes to {}, expected {}",
            artifact_path.as_ref(),
            actual,
            expected_sha256_hex,
        );
    }
    Ok(())
}
