//! Delete command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use super::{open_repository, parse_id};
use crate::output;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Collection name
    pub collection: String,

    /// Document id
    pub id: String,
}

pub async fn run(args: DeleteArgs, root: &Path) -> Result<()> {
    let repo = open_repository(root, &args.collection)?;
    let id = parse_id(&args.id)?;

    let existed = repo.delete(&id).await.context("Failed to delete document")?;
    if existed {
        output::success(&format!("Deleted {}/{}", repo.collection(), id));
    } else {
        output::notice(&format!("No document {}/{}", repo.collection(), id));
    }

    Ok(())
}
