use anyhow::Result;
use clap::Args;
use friendfeed_lib::{OAuthAuth, OAuthToken};

use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct TokenArgs {
    /// Account nickname or email
    pub login: String,

    /// Account password
    #[arg(long, env = "FRIENDFEED_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: &TokenArgs, consumer: OAuthToken, format: &OutputFormat) -> Result<()> {
    let auth = OAuthAuth::new(consumer)?;
    let token = auth.get_ia_access_token(&args.login, &args.password).await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "key": token.key(),
            "secret": token.secret(),
        })),
        _ => {
            println!("FRIENDFEED_ACCESS_TOKEN={}", token.key());
            println!("FRIENDFEED_ACCESS_SECRET={}", token.secret());
            Ok(())
        }
    }
}
