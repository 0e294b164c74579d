//! Entry-related types returned by the API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use url::Url;

use super::feed::Feed;
use super::record::{Fields, Record};
use crate::key::normalize;
use crate::object::{DataType, Value};

/// A single post in a feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// Unique entry identifier (e.g. "e/0123abcd...").
    pub id: Option<String>,

    /// Permalink.
    pub url: Option<Url>,

    /// When the entry was published.
    pub date: Option<DateTime<Utc>>,

    /// HTML body.
    pub body: Option<String>,

    /// The feed that posted the entry.
    pub from: Option<Feed>,

    /// The feeds the entry was posted to.
    pub to: Vec<Feed>,

    pub comments: Vec<Comment>,

    pub likes: Vec<Like>,

    pub thumbnails: Vec<Thumbnail>,

    pub files: Vec<File>,

    /// The service or application the entry came through.
    pub via: Option<Via>,

    /// Location, passed through as sent.
    pub geo: Option<Value>,

    pub commands: Vec<String>,

    /// `ff.im` short id, present when requested.
    pub short_id: Option<String>,

    pub short_url: Option<Url>,

    /// Why a friend-of-friend entry shows up in the feed.
    pub fof: Option<Fof>,

    /// HTML sentence explaining `fof`.
    pub fof_html: Option<String>,

    /// Set on the response to a create call.
    pub created: bool,

    /// Set on the response to an edit call.
    pub updated: bool,

    pub extra: BTreeMap<String, Value>,
}

impl Record for Entry {
    const TAG: DataType = DataType::Entry;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            id: f.take_string("id"),
            url: f.take_uri("url"),
            date: f.take_time("date"),
            body: f.take_string("body"),
            from: f.take_record("from"),
            to: f.take_records("to"),
            comments: f.take_records("comments"),
            likes: f.take_records("likes"),
            thumbnails: f.take_records("thumbnails"),
            files: f.take_records("files"),
            via: f.take_record("via"),
            geo: f.take_value("geo"),
            commands: f.take_strings("commands"),
            short_id: f.take_string("short_id"),
            short_url: f.take_uri("short_url"),
            fof: f.take_record("fof"),
            fof_html: f.take_string("fof_html"),
            created: f.take_flag("created"),
            updated: f.take_flag("updated"),
            extra: f.into_extra(),
        }
    }
}

/// A comment on an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: Option<String>,

    pub date: Option<DateTime<Utc>>,

    pub body: Option<String>,

    pub from: Option<Feed>,

    pub via: Option<Via>,

    pub commands: Vec<String>,

    /// Stands in for comments collapsed by `maxcomments`.
    pub placeholder: bool,

    /// Number of collapsed comments, on placeholders only.
    pub num: Option<i64>,

    pub created: bool,

    pub updated: bool,

    pub extra: BTreeMap<String, Value>,
}

impl Record for Comment {
    const TAG: DataType = DataType::Comment;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            id: f.take_string("id"),
            date: f.take_time("date"),
            body: f.take_string("body"),
            from: f.take_record("from"),
            via: f.take_record("via"),
            commands: f.take_strings("commands"),
            placeholder: f.take_flag("placeholder"),
            num: f.take_i64("num"),
            created: f.take_flag("created"),
            updated: f.take_flag("updated"),
            extra: f.into_extra(),
        }
    }
}

/// A like on an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Like {
    pub date: Option<DateTime<Utc>>,

    pub from: Option<Feed>,

    pub created: bool,

    pub updated: bool,

    pub extra: BTreeMap<String, Value>,
}

impl Record for Like {
    const TAG: DataType = DataType::Like;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            date: f.take_time("date"),
            from: f.take_record("from"),
            created: f.take_flag("created"),
            updated: f.take_flag("updated"),
            extra: f.into_extra(),
        }
    }
}

/// An image attached to an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    /// The thumbnail image itself.
    pub url: Option<Url>,

    /// Where the thumbnail links to.
    pub link: Option<Url>,

    pub width: Option<i64>,

    pub height: Option<i64>,

    /// Embeddable player markup for videos.
    pub player: Option<String>,

    pub extra: BTreeMap<String, Value>,
}

impl Record for Thumbnail {
    const TAG: DataType = DataType::Thumbnail;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            url: f.take_uri("url"),
            link: f.take_uri("link"),
            width: f.take_i64("width"),
            height: f.take_i64("height"),
            player: f.take_string("player"),
            extra: f.into_extra(),
        }
    }
}

/// A file attached to an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct File {
    pub url: Option<Url>,

    /// MIME type.
    #[serde(rename = "type")]
    pub mime_type: Option<String>,

    pub name: Option<String>,

    pub icon: Option<Url>,

    /// Size in bytes.
    pub size: Option<i64>,

    pub extra: BTreeMap<String, Value>,
}

impl Record for File {
    const TAG: DataType = DataType::File;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            url: f.take_uri("url"),
            mime_type: f.take_string("type"),
            name: f.take_string("name"),
            icon: f.take_uri("icon"),
            size: f.take_i64("size"),
            extra: f.into_extra(),
        }
    }
}

/// Where an entry or comment was posted from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Via {
    pub name: Option<String>,

    pub url: Option<Url>,

    pub extra: BTreeMap<String, Value>,
}

impl Record for Via {
    const TAG: DataType = DataType::Via;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            name: f.take_string("name"),
            url: f.take_uri("url"),
            extra: f.into_extra(),
        }
    }
}

/// Friend-of-friend annotation on an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fof {
    #[serde(rename = "type")]
    pub kind: Option<FofType>,

    /// The friend whose activity surfaced the entry.
    pub from: Option<Feed>,

    pub extra: BTreeMap<String, Value>,
}

impl Record for Fof {
    const TAG: DataType = DataType::FoF;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            kind: f.take_string("type").map(|t| FofType::from_token(&t)),
            from: f.take_record("from"),
            extra: f.into_extra(),
        }
    }
}

/// Why a friend-of-friend entry is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FofType {
    Comment,
    Like,
    Other(String),
}

impl FofType {
    pub fn from_token(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "comment" => FofType::Comment,
            "like" => FofType::Like,
            other => FofType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FofType::Comment => "comment",
            FofType::Like => "like",
            FofType::Other(other) => other,
        }
    }
}

impl std::fmt::Display for FofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for FofType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::object::Object;

    fn entry(json: serde_json::Value) -> Entry {
        Entry::from_object(Object::from_json(json, None).unwrap())
    }

    #[test]
    fn canned_entry() {
        let entry = entry(json!({
            "id": "e1",
            "from": {"id": "u1", "nickname": "alice"},
            "date": "2024-01-01T00:00:00Z",
            "created": true
        }));
        assert_eq!(entry.id.as_deref(), Some("e1"));
        assert!(entry.url.is_none());
        let from = entry.from.as_ref().unwrap();
        assert_eq!(from.nickname(), Some("alice"));
        assert_eq!(entry.date, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert!(entry.created);
        assert!(!entry.updated);
        assert!(entry.extra.is_empty());
    }

    #[test]
    fn nested_collections() {
        let entry = entry(json!({
            "id": "e2",
            "url": "http://friendfeed.com/alice/e2",
            "shortUrl": "http://ff.im/abc",
            "to": [{"id": "alice"}, {"id": "friends-of-alice", "type": "group"}],
            "comments": [
                {"id": "c1", "date": "2010-01-01T10:00:00Z", "body": "hi", "from": {"id": "bob"}},
                {"placeholder": true, "num": 4}
            ],
            "likes": [{"date": "2010-01-01T11:00:00Z", "from": {"id": "carol"}}],
            "thumbnails": [{"url": "http://i.example.com/t.jpg", "link": "http://example.com/", "width": 75, "height": 50}],
            "files": [{"url": "http://example.com/a.pdf", "type": "application/pdf", "name": "a.pdf", "size": 1024}],
            "via": {"name": "Bookmarklet", "url": "http://friendfeed.com/share/bookmarklet"},
            "fof": {"type": "like", "from": {"id": "dave"}},
            "geo": {"lat": 37.4, "long": -122.1}
        }));

        assert_eq!(entry.short_url.as_ref().map(Url::as_str), Some("http://ff.im/abc"));
        assert!(entry.to[1].is_group());
        assert_eq!(entry.comments[0].from.as_ref().unwrap().id.as_deref(), Some("bob"));
        assert!(entry.comments[1].placeholder);
        assert_eq!(entry.comments[1].num, Some(4));
        assert_eq!(entry.likes[0].from.as_ref().unwrap().id.as_deref(), Some("carol"));
        assert_eq!(entry.thumbnails[0].width, Some(75));
        assert_eq!(entry.files[0].mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(entry.via.as_ref().unwrap().name.as_deref(), Some("Bookmarklet"));
        let fof = entry.fof.as_ref().unwrap();
        assert_eq!(fof.kind, Some(FofType::Like));
        assert_eq!(fof.from.as_ref().unwrap().id.as_deref(), Some("dave"));
        assert!(entry.geo.is_some());
    }

    #[test]
    fn unparseable_date_is_kept_as_extra() {
        let comment = Comment::from_object(
            Object::from_json(json!({"date": "yesterday"}), None).unwrap(),
        );
        assert!(comment.date.is_none());
        assert_eq!(comment.extra.get("date").and_then(Value::as_str), Some("yesterday"));
    }
}
