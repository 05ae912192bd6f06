//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Remove a directory and all its contents, if it exists.
///
/// Returns whether anything was removed.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(path)
        .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    Ok(true)
}

/// Canonicalize a path, but don't fail if it doesn't exist yet.
/// Returns the path as-is if canonicalization fails.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Refuse to delete `dir` when doing so would also delete `protected`.
pub fn ensure_not_ancestor(dir: &Path, protected: &Path) -> Result<()> {
    let dir = normalize_path(dir);
    if normalize_path(protected).starts_with(&dir) {
        bail!(
            "refusing to remove `{}`: it contains `{}`",
            dir.display(),
            protected.display()
        );
    }
    Ok(())
}
