use anyhow::Result;
use friendfeed_lib::Client;

use crate::output::{print_feeds, OutputFormat};

pub async fn run(client: &Client, format: &OutputFormat) -> Result<()> {
    let feed = client.validate().await?;
    print_feeds(&[feed], format)
}
