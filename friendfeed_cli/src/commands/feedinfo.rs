use anyhow::Result;
use clap::Args;
use friendfeed_lib::Client;

use crate::output::{print_feeds, print_json, print_services, OutputFormat};

#[derive(Args)]
pub struct FeedinfoArgs {
    /// Feed id, or path segments such as `list favorites`
    #[arg(required = true, num_args = 1..)]
    pub id: Vec<String>,
}

pub async fn run(args: &FeedinfoArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let feed = client.get_feedinfo(args.id.clone()).await?;

    if let OutputFormat::Json = format {
        return print_json(&feed);
    }

    print_feeds(std::slice::from_ref(&feed), format)?;
    if let Some(description) = &feed.description {
        println!("\n{}", description);
    }
    for (title, feeds) in [
        ("Subscriptions", &feed.subscriptions),
        ("Subscribers", &feed.subscribers),
        ("Admins", &feed.admins),
        ("Feeds", &feed.feeds),
    ] {
        if !feeds.is_empty() {
            println!("\n{} ({})", title, feeds.len());
            print_feeds(feeds, format)?;
        }
    }
    if !feed.services.is_empty() {
        println!("\nServices ({})", feed.services.len());
        print_services(&feed.services, format);
    }
    Ok(())
}
