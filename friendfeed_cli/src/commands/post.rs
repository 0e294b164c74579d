use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use friendfeed_lib::{Client, NewEntry};

use super::entry::print_entry;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct PostArgs {
    /// Entry text
    pub body: String,

    /// Feed to post to; repeat for several. Defaults to your own feed.
    #[arg(long)]
    pub to: Vec<String>,

    /// Link the entry points to
    #[arg(long)]
    pub link: Option<String>,

    /// First comment
    #[arg(long)]
    pub comment: Option<String>,

    /// Image URL to attach; repeat for several
    #[arg(long)]
    pub image: Vec<String>,

    /// Local file to upload with the entry; repeat for several
    #[arg(long)]
    pub upload: Vec<PathBuf>,
}

impl PostArgs {
    fn new_entry(&self) -> NewEntry {
        let mut entry = NewEntry::new(self.body.as_str());
        for feed in &self.to {
            entry = entry.to(feed.as_str());
        }
        if let Some(link) = &self.link {
            entry = entry.link(link.as_str());
        }
        if let Some(comment) = &self.comment {
            entry = entry.comment(comment.as_str());
        }
        entry.images(self.image.iter().map(|url| serde_json::Value::from(url.as_str())))
    }
}

pub async fn run(args: &PostArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let mut entry = args.new_entry();
    for path in &args.upload {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        entry = entry.upload(file_name, bytes);
    }

    let created = client.add_entry(entry).await?;
    eprintln!("Posted {}", created.id.as_deref().unwrap_or("entry"));
    print_entry(&created, format)
}
