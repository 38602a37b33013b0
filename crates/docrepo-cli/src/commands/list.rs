//! List command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use super::open_repository;
use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Collection name
    pub collection: String,

    /// Maximum number of documents to return
    #[arg(long)]
    pub limit: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: ListArgs, root: &Path) -> Result<()> {
    let repo = open_repository(root, &args.collection)?;

    let docs = repo
        .list_all(args.limit)
        .await
        .context("Failed to list documents")?;

    if docs.is_empty() {
        output::notice("No documents found.");
        return Ok(());
    }

    output::json_lines(&docs, args.pretty)
}
