//! Create command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use docrepo_core::Model;

use super::{BodyArgs, open_repository, parse_id};
use crate::output;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Collection name
    pub collection: String,

    #[command(flatten)]
    pub body: BodyArgs,

    /// Use this id instead of allocating one
    #[arg(long)]
    pub id: Option<String>,
}

pub async fn run(args: CreateArgs, root: &Path) -> Result<()> {
    let repo = open_repository(root, &args.collection)?;

    let mut doc = args.body.read()?;
    if let Some(id) = &args.id {
        doc = doc.with_id(parse_id(id)?);
    }

    let created = repo.create(doc).await.context("Failed to create document")?;
    let id = created.id().context("Created document has no id")?;

    println!("{}", id);
    output::success(&format!("Created {}/{}", repo.collection(), id));

    Ok(())
}
