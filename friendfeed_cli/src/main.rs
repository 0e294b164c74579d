mod commands;
mod output;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use friendfeed_lib::friendfeed_api::{BasicAuth, API_URI};
use friendfeed_lib::{Client, OAuthAuth, OAuthToken};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "friendfeed")]
#[command(about = "Read and post to FriendFeed from the command line")]
struct Cli {
    /// Output format: table, markdown or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Base URL of the official API
    #[arg(long, env = "FRIENDFEED_API_URL", default_value = API_URI, global = true)]
    api_url: String,

    #[command(flatten)]
    credentials: Credentials,

    #[command(subcommand)]
    command: Commands,
}

/// Either a nickname with its remote key, or OAuth consumer and access tokens.
#[derive(Args)]
struct Credentials {
    #[arg(long, env = "FRIENDFEED_USERNAME", global = true)]
    username: Option<String>,

    /// Remote key from https://friendfeed.com/account/api
    #[arg(long, env = "FRIENDFEED_REMOTE_KEY", global = true, hide_env_values = true)]
    remote_key: Option<String>,

    #[arg(long, env = "FRIENDFEED_CONSUMER_KEY", global = true)]
    consumer_key: Option<String>,

    #[arg(long, env = "FRIENDFEED_CONSUMER_SECRET", global = true, hide_env_values = true)]
    consumer_secret: Option<String>,

    #[arg(long, env = "FRIENDFEED_ACCESS_TOKEN", global = true)]
    access_token: Option<String>,

    #[arg(long, env = "FRIENDFEED_ACCESS_SECRET", global = true, hide_env_values = true)]
    access_secret: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the configured credentials
    Validate,
    /// Show a feed's entries
    Feed(commands::feed::FeedArgs),
    /// Show a feed's description, subscriptions and services
    Feedinfo(commands::feedinfo::FeedinfoArgs),
    /// Show the feed lists in the side bar
    Feedlist,
    /// Show one entry with its comments
    Entry(commands::entry::EntryArgs),
    /// Resolve an ff.im short id, or create one for an entry
    Short(commands::short::ShortArgs),
    /// Post an entry
    Post(commands::post::PostArgs),
    /// Exchange a username and password for an OAuth access token
    Token(commands::token::TokenArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("friendfeed=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "markdown" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    if let Commands::Token(args) = &cli.command {
        let consumer = consumer_token(&cli.credentials)?;
        return commands::token::run(args, consumer, &format).await;
    }

    let client = connect(&cli.api_url, &cli.credentials).await?;

    match &cli.command {
        Commands::Validate => commands::validate::run(&client, &format).await?,
        Commands::Feed(args) => commands::feed::run(args, &client, &format).await?,
        Commands::Feedinfo(args) => commands::feedinfo::run(args, &client, &format).await?,
        Commands::Feedlist => commands::feedlist::run(&client, &format).await?,
        Commands::Entry(args) => commands::entry::run(args, &client, &format).await?,
        Commands::Short(args) => commands::short::run(args, &client, &format).await?,
        Commands::Post(args) => commands::post::run(args, &client, &format).await?,
        Commands::Token(_) => unreachable!("handled above"),
    }

    Ok(())
}

/// Builds a client and logs in with whichever credentials are configured.
/// Without any, requests go out anonymously.
async fn connect(api_url: &str, credentials: &Credentials) -> Result<Client> {
    let client = Client::with_base_url(api_url)?;
    if let (Some(access_token), Some(access_secret)) =
        (&credentials.access_token, &credentials.access_secret)
    {
        let access = OAuthToken::new(access_token.as_str(), access_secret.as_str())?;
        let auth = OAuthAuth::new(consumer_token(credentials)?)?.with_access_token(access);
        client.login(auth).await?;
    } else if let (Some(username), Some(remote_key)) =
        (&credentials.username, &credentials.remote_key)
    {
        client.login(BasicAuth::new(username.as_str(), remote_key.as_str())?).await?;
    }
    Ok(client)
}

fn consumer_token(credentials: &Credentials) -> Result<OAuthToken> {
    match (&credentials.consumer_key, &credentials.consumer_secret) {
        (Some(key), Some(secret)) => Ok(OAuthToken::new(key.as_str(), secret.as_str())?),
        _ => bail!("set FRIENDFEED_CONSUMER_KEY and FRIENDFEED_CONSUMER_SECRET to use OAuth"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feed_with_segments_and_paging() {
        let cli = Cli::try_parse_from([
            "friendfeed", "--output", "json", "feed", "bret", "friends", "--num", "5",
        ])
        .unwrap();
        assert_eq!(cli.output, "json");
        match cli.command {
            Commands::Feed(args) => {
                assert_eq!(args.id, vec!["bret", "friends"]);
                assert_eq!(args.num, Some(5));
            }
            _ => panic!("expected the feed command"),
        }
    }

    #[test]
    fn parses_post_with_images() {
        let cli = Cli::try_parse_from([
            "friendfeed",
            "post",
            "hello world",
            "--to",
            "friends",
            "--image",
            "http://i.example/1.png",
            "--image",
            "http://i.example/2.png",
        ])
        .unwrap();
        match cli.command {
            Commands::Post(args) => {
                assert_eq!(args.body, "hello world");
                assert_eq!(args.to, vec!["friends"]);
                assert_eq!(args.image.len(), 2);
            }
            _ => panic!("expected the post command"),
        }
    }

    #[test]
    fn consumer_token_is_required_for_oauth() {
        let credentials = Credentials {
            username: None,
            remote_key: None,
            consumer_key: Some("key".into()),
            consumer_secret: None,
            access_token: None,
            access_secret: None,
        };
        assert!(consumer_token(&credentials).is_err());
    }
}
