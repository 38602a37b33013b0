//! Update command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use super::{BodyArgs, open_repository, parse_id};
use crate::output;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Collection name
    pub collection: String,

    /// Document id
    pub id: String,

    #[command(flatten)]
    pub body: BodyArgs,

    /// Replace the whole document instead of merging the given fields
    #[arg(long)]
    pub replace: bool,
}

pub async fn run(args: UpdateArgs, root: &Path) -> Result<()> {
    let repo = open_repository(root, &args.collection)?;
    let id = parse_id(&args.id)?;
    let changes = args.body.read()?;

    let next = if args.replace {
        changes
    } else {
        let mut current = repo
            .get_by_id(&id)
            .await
            .context("Failed to get document")?
            .with_context(|| format!("Document {}/{} not found", repo.collection(), id))?;
        current.merge(changes);
        current
    };

    let updated = repo
        .update(&id, next)
        .await
        .with_context(|| format!("Failed to update {}/{}", repo.collection(), id))?;

    output::json_pretty(&updated)?;
    output::success(&format!("Updated {}/{}", repo.collection(), id));

    Ok(())
}
