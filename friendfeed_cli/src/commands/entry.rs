use anyhow::Result;
use clap::Args;
use friendfeed_lib::types::Entry;
use friendfeed_lib::{ApiQuery, Client};

use crate::output::{print_comments, print_entries, print_json, OutputFormat};

#[derive(Args)]
pub struct EntryArgs {
    /// Entry id, e.g. e/0123abcd...
    pub id: String,

    /// Comments to return: a number, or "auto"
    #[arg(long)]
    pub maxcomments: Option<String>,
}

pub async fn run(args: &EntryArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let query = match &args.maxcomments {
        Some(maxcomments) => ApiQuery::new().with_maxcomments(maxcomments),
        None => ApiQuery::new(),
    };
    let entry = client.get_entry(args.id.as_str(), Some(&query)).await?;
    print_entry(&entry, format)
}

/// Prints an entry followed by its comments.
pub fn print_entry(entry: &Entry, format: &OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(entry);
    }
    print_entries(std::slice::from_ref(entry), format)?;
    if let Some(url) = &entry.url {
        println!("{}", url);
    }
    if !entry.comments.is_empty() {
        println!();
        print_comments(&entry.comments, format);
    }
    Ok(())
}
