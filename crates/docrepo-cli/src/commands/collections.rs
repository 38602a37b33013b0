//! Collections command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use docrepo_file::FileStore;

use super::open_repository;
use crate::output;

#[derive(Args, Debug)]
pub struct CollectionsArgs {}

pub async fn run(_args: CollectionsArgs, root: &Path) -> Result<()> {
    let names = FileStore::new(root)
        .collections()
        .context("Failed to read collections")?;

    if names.is_empty() {
        output::notice("No collections found.");
        return Ok(());
    }

    for name in names {
        let count = open_repository(root, name.as_str())?
            .list_all(None)
            .await
            .with_context(|| format!("Failed to count documents in '{}'", name))?
            .len();
        output::field(name.as_str(), &count.to_string());
    }

    Ok(())
}
