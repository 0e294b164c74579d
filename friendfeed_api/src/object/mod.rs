//! Dynamic result objects.
//!
//! The API answers with loosely shaped JSON. [`Object`] holds such a payload
//! with canonical keys, and once stamped with a [`DataType`] it carries the
//! derived representations (timestamps, URIs, predicates) that the typed
//! records in [`crate::types`] are built from.

mod tag;
mod value;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use url::Url;

use crate::client::{Client, ClientRef};
use crate::key::normalize;

pub use self::tag::DataType;
pub(crate) use self::tag::Rule;
pub use self::value::Value;

/// A JSON mapping with canonical keys and an optional data type tag.
#[derive(Clone, Default)]
pub struct Object {
    fields: BTreeMap<String, Value>,
    tag: Option<DataType>,
    predicates: BTreeMap<String, bool>,
    client: Option<ClientRef>,
}

impl Object {
    /// Builds an object from a raw JSON mapping.
    ///
    /// Keys are normalized at every depth, nested mappings become nested
    /// objects sharing the same client association, and every field holding a
    /// boolean gets a predicate right away.
    pub fn create(raw: serde_json::Map<String, serde_json::Value>, client: Option<ClientRef>) -> Self {
        let mut fields = BTreeMap::new();
        let mut booleans = Vec::new();
        for (key, value) in raw {
            let key = normalize(&key);
            let value = Value::from_json(value, client.as_ref());
            if matches!(value, Value::Bool(_)) {
                booleans.push(key.clone());
            }
            fields.insert(key, value);
        }
        let mut object = Self {
            fields,
            tag: None,
            predicates: BTreeMap::new(),
            client,
        };
        object.parse_as_boolean(booleans.iter().map(String::as_str));
        object
    }

    /// Builds an object from any JSON value, failing unless it is a mapping.
    pub fn from_json(json: serde_json::Value, client: Option<ClientRef>) -> Option<Self> {
        match json {
            serde_json::Value::Object(map) => Some(Self::create(map, client)),
            _ => None,
        }
    }

    /// Returns the value stored under `key`, if any. The key is normalized
    /// first, so wire spellings work too.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self.fields.get(key) {
            Some(value) => Some(value),
            None => self.fields.get(&normalize(key)),
        }
    }

    /// The `id` field as a string.
    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn tag(&self) -> Option<DataType> {
        self.tag
    }

    /// Looks up a derived predicate. `"created"` and `"created?"` are the same.
    pub fn predicate(&self, name: &str) -> Option<bool> {
        let name = name.strip_suffix('?').unwrap_or(name);
        self.predicates.get(name).copied()
    }

    pub fn predicates(&self) -> impl Iterator<Item = (&str, bool)> {
        self.predicates.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// True iff the payload carries a non-null `error_code`.
    pub fn is_error(&self) -> bool {
        matches!(self.fields.get("error_code"), Some(v) if !v.is_null())
    }

    /// The client this object was fetched with, if it is still alive.
    pub fn client(&self) -> Option<Client> {
        self.client.as_ref().and_then(ClientRef::upgrade)
    }

    /// Stamps `tag` and runs its derivations, consuming and returning the object.
    pub fn with_tag(mut self, tag: DataType) -> Self {
        self.apply_tag(tag);
        self
    }

    /// Stamps `tag` and runs its derivations in place.
    ///
    /// Derivations never redo work: an existing predicate is kept, and values
    /// already parsed into timestamps or URIs are left alone, so tagging twice
    /// is the same as tagging once.
    pub fn apply_tag(&mut self, tag: DataType) {
        self.tag = Some(tag);
        for rule in tag.rules() {
            match *rule {
                Rule::Boolean(keys) => self.parse_as_boolean(keys.iter().copied()),
                Rule::Enum(keys) => self.parse_as_enum(keys),
                Rule::Time(keys) => self.parse_as_time(keys),
                Rule::Uri(keys) => self.parse_as_uri(keys),
                Rule::Nested(tag, keys) => self.parse_as(tag, keys),
                Rule::ArrayOf(tag, keys) => self.parse_as_array_of(tag, keys),
            }
        }
    }

    /// Serializes the fields back into a JSON mapping.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<String, Value>, BTreeMap<String, bool>) {
        (self.fields, self.predicates)
    }

    fn parse_as_boolean<'a>(&mut self, keys: impl Iterator<Item = &'a str>) {
        for key in keys {
            let Some(value) = self.fields.get(key) else {
                continue;
            };
            if self.predicates.contains_key(key) {
                continue;
            }
            let truthy = value.is_truthy();
            self.predicates.insert(key.to_string(), truthy);
        }
    }

    fn parse_as_enum(&mut self, keys: &[&str]) {
        for key in keys {
            let token = match self.fields.get(*key) {
                Some(Value::String(s)) => normalize(s),
                Some(Value::Number(n)) => n.to_string(),
                _ => continue,
            };
            if token.is_empty() || self.predicates.contains_key(&token) {
                continue;
            }
            self.predicates.insert(token, true);
        }
    }

    fn parse_as_time(&mut self, keys: &[&str]) {
        for key in keys {
            let raw = match self.fields.get(*key) {
                Some(Value::String(raw)) => raw.clone(),
                _ => continue,
            };
            match parse_time(&raw) {
                Some(time) => {
                    self.fields.insert(key.to_string(), Value::Time(time));
                }
                None => tracing::warn!("Unparseable timestamp in field {}: {:?}", key, raw),
            }
        }
    }

    fn parse_as_uri(&mut self, keys: &[&str]) {
        for key in keys {
            let raw = match self.fields.get(*key) {
                Some(Value::String(raw)) => raw.clone(),
                _ => continue,
            };
            match Url::parse(&raw) {
                Ok(uri) => {
                    self.fields.insert(key.to_string(), Value::Uri(uri));
                }
                Err(e) => tracing::warn!("Unparseable URI in field {}: {:?} ({})", key, raw, e),
            }
        }
    }

    fn parse_as(&mut self, tag: DataType, keys: &[&str]) {
        for key in keys {
            if let Some(Value::Object(object)) = self.fields.get_mut(*key) {
                object.apply_tag(tag);
            }
        }
    }

    fn parse_as_array_of(&mut self, tag: DataType, keys: &[&str]) {
        for key in keys {
            if let Some(Value::Array(elements)) = self.fields.get_mut(*key) {
                for element in elements.iter_mut() {
                    if let Value::Object(object) = element {
                        object.apply_tag(tag);
                    }
                }
            }
        }
    }
}

/// Parses the timestamp formats the API is known to send.
fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }
    if let Ok(time) = DateTime::parse_from_rfc2822(raw) {
        return Some(time.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.tag == other.tag && self.predicates == other.predicates
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.tag {
            Some(tag) => format!("Object[{}]", tag),
            None => "Object".to_string(),
        };
        let mut s = f.debug_struct(&name);
        for (key, value) in &self.fields {
            s.field(key, value);
        }
        if !self.predicates.is_empty() {
            s.field("predicates", &self.predicates);
        }
        s.finish()
    }
}

impl serde::Serialize for Object {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn object(json: serde_json::Value) -> Object {
        Object::from_json(json, None).unwrap()
    }

    #[test]
    fn keys_are_normalized_recursively() {
        let obj = object(json!({
            "shortUrl": "http://ff.im/x",
            "from": {"profileUrl": "http://friendfeed.com/alice"},
            "thumbnails": [{"playerHtml": "<embed>"}]
        }));
        assert!(obj.contains("short_url"));
        let from = obj.field("from").and_then(Value::as_object).unwrap();
        assert!(from.contains("profile_url"));
        let thumbs = obj.field("thumbnails").and_then(Value::as_array).unwrap();
        assert!(thumbs[0].as_object().unwrap().contains("player_html"));
    }

    #[test]
    fn field_lookup_accepts_wire_spelling() {
        let obj = object(json!({"shortUrl": "x"}));
        assert_eq!(obj.field("shortUrl"), obj.field("short_url"));
        assert!(obj.field("missing").is_none());
    }

    #[test]
    fn booleans_get_predicates_on_creation() {
        let obj = object(json!({"hidden": false, "name": "x"}));
        assert_eq!(obj.predicate("hidden?"), Some(false));
        assert_eq!(obj.predicate("name"), None);
    }

    #[test]
    fn untagged_round_trip() {
        let raw = json!({
            "id": "e1",
            "num": 3,
            "ratio": 0.5,
            "flag": true,
            "nothing": null,
            "nested": {"a": [1, "two", {"b": false}]}
        });
        let obj = object(raw.clone());
        assert_eq!(obj.to_json(), raw);
        let again = object(obj.to_json());
        assert_eq!(again, obj);
    }

    #[test]
    fn error_code_detection() {
        assert!(object(json!({"errorCode": "unauthorized"})).is_error());
        assert!(!object(json!({"errorCode": null})).is_error());
        assert!(!object(json!({"id": "x"})).is_error());
    }

    #[test]
    fn entry_scenario() {
        let entry = object(json!({
            "id": "e1",
            "from": {"id": "u1", "nickname": "alice"},
            "date": "2024-01-01T00:00:00Z",
            "created": true
        }))
        .with_tag(DataType::Entry);

        assert_eq!(entry.tag(), Some(DataType::Entry));
        assert_eq!(entry.id(), Some("e1"));
        assert!(entry.field("url").is_none());
        let from = entry.field("from").and_then(Value::as_object).unwrap();
        assert_eq!(from.tag(), Some(DataType::Feed));
        assert_eq!(from.field("nickname").and_then(Value::as_str), Some("alice"));
        assert_eq!(
            entry.field("date").and_then(Value::as_time),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(entry.predicate("created?"), Some(true));
    }

    #[test]
    fn uris_are_parsed() {
        let entry = object(json!({"url": "http://example.com/a", "shortUrl": "not a uri"}))
            .with_tag(DataType::Entry);
        assert_eq!(
            entry.field("url").and_then(Value::as_uri).map(Url::as_str),
            Some("http://example.com/a")
        );
        assert_eq!(entry.field("short_url").and_then(Value::as_str), Some("not a uri"));
    }

    #[test]
    fn enum_predicate_uses_normalized_value() {
        let feed = object(json!({"id": "g", "type": "group"})).with_tag(DataType::Feed);
        assert_eq!(feed.predicate("group?"), Some(true));
        assert_eq!(feed.predicate("user?"), None);

        let service = object(json!({"id": "googleReader"})).with_tag(DataType::Service);
        assert_eq!(service.predicate("google_reader"), Some(true));
    }

    #[test]
    fn tagging_is_idempotent() {
        let raw = json!({
            "id": "f",
            "type": "user",
            "private": 0,
            "entries": [{
                "date": "2010-05-01T12:30:00Z",
                "url": "http://example.com/",
                "comments": [{"date": "2010-05-01T12:31:00Z", "placeholder": true}],
                "likes": [{"date": "2010-05-01T12:32:00Z", "from": {"id": "bob"}}],
                "fof": {"type": "like", "from": {"id": "carol"}}
            }],
            "services": [{"id": "twitter", "url": "http://twitter.com/x"}]
        });
        let once = object(raw.clone()).with_tag(DataType::Feed);
        let twice = object(raw).with_tag(DataType::Feed).with_tag(DataType::Feed);
        assert_eq!(once, twice);
        assert_eq!(once.predicate("private"), Some(true));

        let entry = once.field("entries").and_then(Value::as_array).unwrap()[0]
            .as_object()
            .unwrap();
        let fof = entry.field("fof").and_then(Value::as_object).unwrap();
        assert_eq!(fof.tag(), Some(DataType::FoF));
        assert_eq!(fof.predicate("like"), Some(true));
        let fof_from = fof.field("from").and_then(Value::as_object).unwrap();
        assert_eq!(fof_from.tag(), Some(DataType::Feed));
    }

    #[test]
    fn boolean_predicate_is_derived_once() {
        let mut comment = object(json!({"created": true}));
        comment.apply_tag(DataType::Comment);
        comment.fields.insert("created".into(), Value::Bool(false));
        comment.apply_tag(DataType::Comment);
        assert_eq!(comment.predicate("created"), Some(true));
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let like = object(json!({"date": "2009-12-31 23:59:59"})).with_tag(DataType::Like);
        assert_eq!(
            like.field("date").and_then(Value::as_time),
            Some(Utc.with_ymd_and_hms(2009, 12, 31, 23, 59, 59).unwrap())
        );
    }

    #[test]
    fn debug_shows_tag() {
        let via = object(json!({"name": "web"})).with_tag(DataType::Via);
        assert!(format!("{:?}", via).starts_with("Object[Via]"));
    }
}
