use anyhow::{bail, Result};
use clap::Args;
use friendfeed_lib::Client;

use super::entry::print_entry;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct ShortArgs {
    /// An ff.im short id, or an entry id with --create
    pub id: String,

    /// Create a short URL for the entry instead of resolving one
    #[arg(long)]
    pub create: bool,
}

pub async fn run(args: &ShortArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    if !args.create {
        let entry = client.decode_short(&args.id, None).await?;
        return print_entry(&entry, format);
    }

    let entry = client.encode_short(&args.id, None).await?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "short_id": entry.short_id,
            "short_url": entry.short_url,
        })),
        _ => match &entry.short_url {
            Some(url) => {
                println!("{}", url);
                Ok(())
            }
            None => bail!("the server did not return a short URL for {}", args.id),
        },
    }
}
