use anyhow::Result;
use chrono::{DateTime, Utc};
use friendfeed_lib::types::{Comment, Entry, Feed, Service};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Markdown,
}

const BODY_WIDTH: usize = 60;

#[derive(Tabled, Serialize)]
struct EntryRow {
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "From")]
    #[serde(rename = "From")]
    from: String,
    #[tabled(rename = "Body")]
    #[serde(rename = "Body")]
    body: String,
    #[tabled(rename = "Comments")]
    #[serde(rename = "Comments")]
    comments: usize,
    #[tabled(rename = "Likes")]
    #[serde(rename = "Likes")]
    likes: usize,
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Tabled, Serialize)]
struct FeedRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "Type")]
    kind: String,
    #[tabled(rename = "Private")]
    #[serde(rename = "Private")]
    private: String,
}

#[derive(Tabled, Serialize)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    #[serde(rename = "Service")]
    id: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Username")]
    #[serde(rename = "Username")]
    username: String,
    #[tabled(rename = "Profile")]
    #[serde(rename = "Profile")]
    profile: String,
}

#[derive(Tabled, Serialize)]
struct CommentRow {
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "From")]
    #[serde(rename = "From")]
    from: String,
    #[tabled(rename = "Body")]
    #[serde(rename = "Body")]
    body: String,
}

fn format_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn feed_name(feed: Option<&Feed>) -> String {
    feed.and_then(|f| f.name.clone().or_else(|| f.id.clone()))
        .unwrap_or_default()
}

/// Shortens `s` to at most `max` characters, marking the cut with "...".
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn build_entry_rows(entries: &[Entry]) -> Vec<EntryRow> {
    entries
        .iter()
        .map(|e| EntryRow {
            date: format_date(e.date.as_ref()),
            from: feed_name(e.from.as_ref()),
            body: truncate(e.body.as_deref().unwrap_or(""), BODY_WIDTH),
            comments: e.comments.len(),
            likes: e.likes.len(),
            id: e.id.clone().unwrap_or_default(),
        })
        .collect()
}

fn build_feed_rows(feeds: &[Feed]) -> Vec<FeedRow> {
    feeds
        .iter()
        .map(|f| FeedRow {
            id: f.id.clone().unwrap_or_default(),
            name: f.name.clone().unwrap_or_default(),
            kind: f.kind.as_ref().map(|k| k.to_string()).unwrap_or_default(),
            private: if f.private { "yes" } else { "no" }.to_string(),
        })
        .collect()
}

fn build_service_rows(services: &[Service]) -> Vec<ServiceRow> {
    services
        .iter()
        .map(|s| ServiceRow {
            id: s.id.clone().unwrap_or_default(),
            name: s.name.clone().unwrap_or_default(),
            username: s.username.clone().unwrap_or_default(),
            profile: s.profile.as_ref().map(|u| u.to_string()).unwrap_or_default(),
        })
        .collect()
}

fn build_comment_rows(comments: &[Comment]) -> Vec<CommentRow> {
    comments
        .iter()
        .map(|c| CommentRow {
            date: format_date(c.date.as_ref()),
            from: feed_name(c.from.as_ref()),
            body: truncate(c.body.as_deref().unwrap_or(""), BODY_WIDTH),
        })
        .collect()
}

fn render<T: Tabled>(rows: Vec<T>, format: &OutputFormat) -> String {
    let mut table = Table::new(rows);
    if let OutputFormat::Markdown = format {
        table.with(Style::markdown());
    }
    table.to_string()
}

pub fn print_entries(entries: &[Entry], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&entries),
        _ => {
            println!("{}", render(build_entry_rows(entries), format));
            Ok(())
        }
    }
}

pub fn print_feeds(feeds: &[Feed], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&feeds),
        _ => {
            println!("{}", render(build_feed_rows(feeds), format));
            Ok(())
        }
    }
}

pub fn print_services(services: &[Service], format: &OutputFormat) {
    println!("{}", render(build_service_rows(services), format));
}

pub fn print_comments(comments: &[Comment], format: &OutputFormat) {
    println!("{}", render(build_comment_rows(comments), format));
}

pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use friendfeed_lib::friendfeed_api::Object;
    use friendfeed_lib::types::Record;

    fn sample_feed() -> Feed {
        let json = serde_json::json!({
            "id": "bret",
            "name": "Bret Taylor",
            "type": "user",
            "private": false,
            "entries": [{
                "id": "e/0123abcd",
                "date": "2009-06-05T21:03:17Z",
                "body": "Testing the new API, with a body long enough that the table has to cut it short",
                "from": {"id": "bret", "name": "Bret Taylor", "type": "user"},
                "comments": [{
                    "id": "c/1",
                    "date": "2009-06-05T21:10:00Z",
                    "body": "Nice",
                    "from": {"id": "paul", "name": "Paul Buchheit", "type": "user"}
                }],
                "likes": [{"date": "2009-06-05T21:11:00Z", "from": {"id": "jim", "name": "Jim Norris"}}]
            }],
            "services": [{
                "id": "twitter",
                "name": "Twitter",
                "username": "btaylor",
                "profile": "http://twitter.com/btaylor"
            }]
        });
        Feed::from_object(Object::from_json(json, None).unwrap())
    }

    #[test]
    fn truncate_respects_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn entry_rows_from_feed() {
        let feed = sample_feed();
        let rows = build_entry_rows(&feed.entries);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2009-06-05 21:03");
        assert_eq!(rows[0].from, "Bret Taylor");
        assert_eq!(rows[0].comments, 1);
        assert_eq!(rows[0].likes, 1);
        assert_eq!(rows[0].id, "e/0123abcd");
        assert_eq!(rows[0].body.chars().count(), BODY_WIDTH);
        assert!(rows[0].body.ends_with("..."));
    }

    #[test]
    fn feed_rows_show_type_and_privacy() {
        let rows = build_feed_rows(&[sample_feed()]);
        assert_eq!(rows[0].id, "bret");
        assert_eq!(rows[0].kind, "user");
        assert_eq!(rows[0].private, "no");
    }

    #[test]
    fn service_and_comment_rows() {
        let feed = sample_feed();
        let services = build_service_rows(&feed.services);
        assert_eq!(services[0].id, "twitter");
        assert_eq!(services[0].profile, "http://twitter.com/btaylor");

        let comments = build_comment_rows(&feed.entries[0].comments);
        assert_eq!(comments[0].from, "Paul Buchheit");
        assert_eq!(comments[0].body, "Nice");
    }

    #[test]
    fn markdown_uses_pipes() {
        let rows = build_feed_rows(&[sample_feed()]);
        let rendered = render(rows, &OutputFormat::Markdown);
        assert!(rendered.starts_with("| ID"));
        assert!(rendered.contains("| bret"));
    }

    #[test]
    fn json_rows_use_display_names() {
        let rows = build_feed_rows(&[sample_feed()]);
        let value = serde_json::to_value(&rows).unwrap();
        assert_eq!(value[0]["Name"], "Bret Taylor");
        assert_eq!(value[0]["Type"], "user");
    }
}
