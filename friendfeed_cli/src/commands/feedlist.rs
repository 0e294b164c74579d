use anyhow::Result;
use friendfeed_lib::Client;

use crate::output::{print_feeds, print_json, OutputFormat};

pub async fn run(client: &Client, format: &OutputFormat) -> Result<()> {
    let list = client.get_feedlist().await?;

    if let OutputFormat::Json = format {
        return print_json(&list);
    }

    if !list.sections.is_empty() {
        for section in &list.sections {
            println!("\n{}", section.name.as_deref().unwrap_or("(unnamed)"));
            print_feeds(&section.feeds, format)?;
        }
        return Ok(());
    }

    for (title, feeds) in [
        ("Main", &list.main),
        ("Lists", &list.lists),
        ("Groups", &list.groups),
        ("Searches", &list.searches),
    ] {
        if !feeds.is_empty() {
            println!("\n{}", title);
            print_feeds(feeds, format)?;
        }
    }
    Ok(())
}
