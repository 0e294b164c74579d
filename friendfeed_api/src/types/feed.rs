//! Feed-related types returned by the API.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use url::Url;

use super::entry::Entry;
use super::record::{Fields, Record};
use crate::key::normalize;
use crate::object::{DataType, Value};

/// A feed: a user, a group, or one of the special feeds (home, lists, searches).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feed {
    /// Unique feed identifier, usually the nickname (e.g. "bret").
    pub id: Option<String>,

    /// Display name.
    pub name: Option<String>,

    pub description: Option<String>,

    /// What kind of feed this is.
    #[serde(rename = "type")]
    pub kind: Option<FeedType>,

    /// Whether the feed is only visible to subscribers.
    pub private: bool,

    /// Actions the authenticated user may take on this feed.
    pub commands: Vec<String>,

    /// Entries, present on `feed/<id>` responses.
    pub entries: Vec<Entry>,

    pub subscriptions: Vec<Feed>,

    pub subscribers: Vec<Feed>,

    pub admins: Vec<Feed>,

    pub feeds: Vec<Feed>,

    /// Services imported into the feed, present on `feedinfo` responses.
    pub services: Vec<Service>,

    /// The realtime polling cursor, when the request asked for one.
    pub realtime: Option<Value>,

    /// Fields not covered above, keyed by canonical name.
    pub extra: BTreeMap<String, Value>,
}

impl Record for Feed {
    const TAG: DataType = DataType::Feed;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            id: f.take_string("id"),
            name: f.take_string("name"),
            description: f.take_string("description"),
            kind: f.take_string("type").map(|t| FeedType::from_token(&t)),
            private: f.take_flag("private"),
            commands: f.take_strings("commands"),
            entries: f.take_records("entries"),
            subscriptions: f.take_records("subscriptions"),
            subscribers: f.take_records("subscribers"),
            admins: f.take_records("admins"),
            feeds: f.take_records("feeds"),
            services: f.take_records("services"),
            realtime: f.take_value("realtime"),
            extra: f.into_extra(),
        }
    }
}

impl Feed {
    pub fn is_user(&self) -> bool {
        self.kind == Some(FeedType::User)
    }

    pub fn is_group(&self) -> bool {
        self.kind == Some(FeedType::Group)
    }

    pub fn is_special(&self) -> bool {
        self.kind == Some(FeedType::Special)
    }

    /// Looks up the `nickname` the API sends on profile-shaped feeds.
    pub fn nickname(&self) -> Option<&str> {
        self.extra.get("nickname").and_then(Value::as_str)
    }
}

/// Feed kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedType {
    User,
    Group,
    Special,
    /// A kind this crate does not know yet, normalized.
    Other(String),
}

impl FeedType {
    pub fn from_token(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "user" => FeedType::User,
            "group" => FeedType::Group,
            "special" => FeedType::Special,
            other => FeedType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FeedType::User => "user",
            FeedType::Group => "group",
            FeedType::Special => "special",
            FeedType::Other(other) => other,
        }
    }
}

impl std::fmt::Display for FeedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for FeedType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A service imported into a feed (Twitter, a blog, Flickr, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    /// Service identifier, e.g. "twitter" or "blog".
    pub id: Option<String>,

    pub name: Option<String>,

    /// The service's home page.
    pub url: Option<Url>,

    pub icon: Option<Url>,

    /// The user's profile on the service.
    pub profile: Option<Url>,

    pub username: Option<String>,

    pub extra: BTreeMap<String, Value>,
}

impl Record for Service {
    const TAG: DataType = DataType::Service;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            id: f.take_string("id"),
            name: f.take_string("name"),
            url: f.take_uri("url"),
            icon: f.take_uri("icon"),
            profile: f.take_uri("profile"),
            username: f.take_string("username"),
            extra: f.into_extra(),
        }
    }
}

impl Service {
    /// True when the service id normalizes to `token` (e.g. `"google_reader"`).
    pub fn is(&self, token: &str) -> bool {
        self.id.as_deref().map(normalize).as_deref() == Some(normalize(token).as_str())
    }
}

/// The feeds in the authenticated user's side bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedList {
    pub main: Vec<Feed>,

    pub lists: Vec<Feed>,

    pub groups: Vec<Feed>,

    pub searches: Vec<Feed>,

    pub sections: Vec<Section>,

    pub extra: BTreeMap<String, Value>,
}

impl Record for FeedList {
    const TAG: DataType = DataType::FeedList;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            main: f.take_records("main"),
            lists: f.take_records("lists"),
            groups: f.take_records("groups"),
            searches: f.take_records("searches"),
            sections: f.take_records("sections"),
            extra: f.into_extra(),
        }
    }
}

/// One named section of a [`FeedList`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: Option<String>,

    /// Section identifier, e.g. "lists" or "groups".
    pub id: Option<String>,

    pub feeds: Vec<Feed>,

    pub extra: BTreeMap<String, Value>,
}

impl Record for Section {
    const TAG: DataType = DataType::Section;

    fn from_fields(mut f: Fields) -> Self {
        Self {
            name: f.take_string("name"),
            id: f.take_string("id"),
            feeds: f.take_records("feeds"),
            extra: f.into_extra(),
        }
    }
}
