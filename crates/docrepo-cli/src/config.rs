//! Store location resolution.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

/// Resolve the store root.
///
/// An explicit `--store` (or `DOCREPO_STORE`, which clap folds into the
/// same flag) wins; otherwise `<data dir>/store` is used.
pub fn store_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let root = match explicit {
        Some(path) => path,
        None => ProjectDirs::from("", "", "docrepo")
            .context("Could not determine data directory")?
            .data_dir()
            .join("store"),
    };
    debug!(root = %root.display(), "Using store root");
    Ok(root)
}
