//! Per-job cache directory resolution.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::PipelineError;

/// Map a (source, target DSN) pair to its cache directory under `root`.
///
/// The directory name is `sha256(sha256(source) ++ sha256(target_raw))` in
/// hex, so it is stable across restarts, bounded in length, and free of
/// path separators.
pub fn resolve(root: &Path, source: &str, target_raw: &str) -> PathBuf {
    let combined = format!("{}{}", sha256_hex(source), sha256_hex(target_raw));
    root.join(sha256_hex(&combined))
}

/// Create the cache directory if it does not exist yet.
pub fn ensure(dir: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{digest:x}")
}
