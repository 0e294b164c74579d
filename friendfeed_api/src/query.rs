//! Request path composition: resource identifiers and query parameters.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything but unreserved characters and the list separator gets escaped.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b',');

/// Optional parameters appended to a read request, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiQuery {
    params: Vec<(String, String)>,
}

impl ApiQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a raw parameter, replacing an earlier value for the same key.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Sets a list parameter; the API expects the values comma-joined.
    pub fn with_list<I, S>(self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.with(key, joined)
    }

    /// Index of the first entry to return.
    pub fn with_start(self, start: u32) -> Self {
        self.with("start", start)
    }

    /// Number of entries to return.
    pub fn with_num(self, num: u32) -> Self {
        self.with("num", num)
    }

    /// Comments per entry; 0 returns none, and "auto" lets the server decide.
    pub fn with_maxcomments(self, maxcomments: impl ToString) -> Self {
        self.with("maxcomments", maxcomments)
    }

    pub fn with_maxlikes(self, maxlikes: impl ToString) -> Self {
        self.with("maxlikes", maxlikes)
    }

    /// Include entries the user has hidden.
    pub fn with_hidden(self, hidden: bool) -> Self {
        self.with("hidden", u8::from(hidden))
    }

    /// Friend-of-friend entries: "all" or "none".
    pub fn with_fof(self, fof: impl Into<String>) -> Self {
        self.with("fof", fof.into())
    }

    /// Ask for unformatted bodies instead of HTML.
    pub fn with_raw(self, raw: bool) -> Self {
        self.with("raw", u8::from(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Appends the parameters to a relative path as a query string. Keys and
    /// values are escaped independently.
    pub fn add_to_path(&self, path: &str) -> String {
        if self.params.is_empty() {
            return path.to_string();
        }
        let query = self
            .params
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_ESCAPE),
                    utf8_percent_encode(v, QUERY_ESCAPE)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", path, query)
    }
}

/// Appends `query`, if any, to `path`.
pub(crate) fn compose(path: &str, query: Option<&ApiQuery>) -> String {
    match query {
        Some(query) => query.add_to_path(path),
        None => path.to_string(),
    }
}

/// A resource identifier such as `bret`, `bret/friends` or
/// `list/favorites/summary/1`.
///
/// Built from a single string or from segments, which are joined with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn join<S: AsRef<str>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self(
            segments
                .into_iter()
                .map(|s| s.as_ref().to_string())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }
}

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourcePath {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourcePath {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for ResourcePath {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<&[&str]> for ResourcePath {
    fn from(segments: &[&str]) -> Self {
        Self::join(segments)
    }
}

impl<const N: usize> From<[&str; N]> for ResourcePath {
    fn from(segments: [&str; N]) -> Self {
        Self::join(segments)
    }
}

impl From<Vec<String>> for ResourcePath {
    fn from(segments: Vec<String>) -> Self {
        Self::join(segments)
    }
}

impl From<Vec<&str>> for ResourcePath {
    fn from(segments: Vec<&str>) -> Self {
        Self::join(segments)
    }
}
