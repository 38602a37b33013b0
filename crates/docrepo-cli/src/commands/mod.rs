//! Subcommand implementations.

mod collections;
mod create;
mod delete;
mod find;
mod get;
mod list;
mod update;

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use docrepo_core::{Document, DocumentId, DynamicDocument, Repository};
use docrepo_file::FileStore;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a document in a collection
    Create(create::CreateArgs),

    /// Fetch a single document
    Get(get::GetArgs),

    /// Merge fields into an existing document
    Update(update::UpdateArgs),

    /// Delete a document
    Delete(delete::DeleteArgs),

    /// List documents in a collection
    List(list::ListArgs),

    /// Find documents matching filters
    Find(find::FindArgs),

    /// List collections and their document counts
    Collections(collections::CollectionsArgs),
}

pub async fn handle(cmd: Commands, root: &Path) -> Result<()> {
    match cmd {
        Commands::Create(args) => create::run(args, root).await,
        Commands::Get(args) => get::run(args, root).await,
        Commands::Update(args) => update::run(args, root).await,
        Commands::Delete(args) => delete::run(args, root).await,
        Commands::List(args) => list::run(args, root).await,
        Commands::Find(args) => find::run(args, root).await,
        Commands::Collections(args) => collections::run(args, root).await,
    }
}

/// Document body given either inline or as a file.
#[derive(Args, Debug)]
pub struct BodyArgs {
    /// Inline JSON object
    #[arg(conflicts_with = "json")]
    pub data: Option<String>,

    /// JSON file with document data (use - for stdin)
    #[arg(long)]
    pub json: Option<String>,
}

impl BodyArgs {
    /// Read the body as a schemaless document.
    pub fn read(&self) -> Result<DynamicDocument> {
        let raw = match (&self.data, &self.json) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) if path == "-" => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read from stdin")?;
                buf
            }
            (None, Some(path)) => {
                std::fs::read_to_string(path).context("Failed to read JSON file")?
            }
            (None, None) => anyhow::bail!("Provide document data inline or with --json"),
        };

        let value: serde_json::Value = serde_json::from_str(&raw).context("Invalid JSON")?;
        let body = Document::new(value).context("Document must be a JSON object")?;
        DynamicDocument::new(body).context("Invalid document")
    }
}

type FileRepository = Repository<DynamicDocument, FileStore>;

fn open_repository(root: &Path, collection: &str) -> Result<FileRepository> {
    Repository::new(Arc::new(FileStore::new(root)), collection)
        .with_context(|| format!("Invalid collection name '{}'", collection))
}

fn parse_id(id: &str) -> Result<DocumentId> {
    DocumentId::new(id).with_context(|| format!("Invalid document id '{}'", id))
}
