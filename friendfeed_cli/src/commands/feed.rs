use anyhow::Result;
use clap::Args;
use friendfeed_lib::{ApiQuery, Client};

use crate::output::{print_entries, print_json, OutputFormat};

#[derive(Args)]
pub struct FeedArgs {
    /// Feed id, or path segments such as `bret friends` or `list favorites`
    #[arg(required = true, num_args = 1..)]
    pub id: Vec<String>,

    /// Index of the first entry to return
    #[arg(long)]
    pub start: Option<u32>,

    /// Number of entries to return
    #[arg(long)]
    pub num: Option<u32>,

    /// Comments per entry: a number, or "auto"
    #[arg(long)]
    pub maxcomments: Option<String>,

    /// Likes per entry: a number, or "auto"
    #[arg(long)]
    pub maxlikes: Option<String>,

    /// Include hidden entries
    #[arg(long)]
    pub hidden: bool,

    /// Return unformatted bodies
    #[arg(long)]
    pub raw: bool,
}

impl FeedArgs {
    fn query(&self) -> ApiQuery {
        let mut query = ApiQuery::new();
        if let Some(start) = self.start {
            query = query.with_start(start);
        }
        if let Some(num) = self.num {
            query = query.with_num(num);
        }
        if let Some(maxcomments) = &self.maxcomments {
            query = query.with_maxcomments(maxcomments);
        }
        if let Some(maxlikes) = &self.maxlikes {
            query = query.with_maxlikes(maxlikes);
        }
        if self.hidden {
            query = query.with_hidden(true);
        }
        if self.raw {
            query = query.with_raw(true);
        }
        query
    }
}

pub async fn run(args: &FeedArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let query = args.query();
    let feed = client.get_feed(args.id.clone(), Some(&query)).await?;

    match format {
        OutputFormat::Json => print_json(&feed),
        _ => {
            if let Some(name) = &feed.name {
                println!("{}", name);
            }
            print_entries(&feed.entries, format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> FeedArgs {
        FeedArgs {
            id: vec!["bret".into()],
            start: None,
            num: None,
            maxcomments: None,
            maxlikes: None,
            hidden: false,
            raw: false,
        }
    }

    #[test]
    fn empty_query_without_options() {
        assert!(args().query().is_empty());
    }

    #[test]
    fn query_carries_paging_and_flags() {
        let args = FeedArgs {
            start: Some(30),
            num: Some(10),
            maxcomments: Some("auto".into()),
            hidden: true,
            ..args()
        };
        let query = args.query();
        let params: Vec<(&str, &str)> = query
            .params()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert!(params.contains(&("start", "30")));
        assert!(params.contains(&("num", "10")));
        assert!(params.contains(&("maxcomments", "auto")));
        assert!(params.contains(&("hidden", "1")));
        assert!(!params.iter().any(|(k, _)| *k == "raw"));
    }
}
