//! Get command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use super::{open_repository, parse_id};
use crate::output;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Collection name
    pub collection: String,

    /// Document id
    pub id: String,
}

pub async fn run(args: GetArgs, root: &Path) -> Result<()> {
    let repo = open_repository(root, &args.collection)?;
    let id = parse_id(&args.id)?;

    let doc = repo
        .get_by_id(&id)
        .await
        .context("Failed to get document")?
        .with_context(|| format!("Document {}/{} not found", repo.collection(), id))?;

    output::json_pretty(&doc)?;

    Ok(())
}
