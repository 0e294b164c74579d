//! Request-issuing strategies.
//!
//! A [`Client`](crate::Client) sends everything through one [`Auth`]. The
//! strategies differ only in what they attach to a request; all of them
//! resolve relative URIs against a base URI and hand back a [`Response`].

mod basic;
mod noauth;
mod oauth;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use url::Url;

use crate::Error;

pub use self::basic::BasicAuth;
pub use self::noauth::NoAuth;
pub use self::oauth::OAuthAuth;

/// Something that can issue GET and POST requests on the caller's behalf.
#[async_trait]
pub trait Auth: Send + Sync {
    /// Sets the URI that relative request URIs are resolved against.
    fn set_base_uri(&mut self, base_uri: Url);

    /// Performs a GET request.
    async fn get(&self, uri: &str, headers: Option<HeaderMap>) -> Result<Response, Error>;

    /// Performs a POST request.
    async fn post(
        &self,
        uri: &str,
        body: Option<Body>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, Error>;
}

/// A request body.
#[derive(Debug, Clone)]
pub enum Body {
    /// `application/x-www-form-urlencoded` parameters.
    Form(Vec<(String, String)>),
    /// A raw body string.
    Text(String),
    /// `multipart/form-data`, for uploads.
    Multipart(Vec<Part>),
}

impl Body {
    /// Builds a form body from anything that yields key/value pairs.
    pub fn form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Body::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub content: PartContent,
}

#[derive(Debug, Clone)]
pub enum PartContent {
    Text(String),
    File {
        file_name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl Part {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: PartContent::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content: PartContent::File {
                file_name: file_name.into(),
                mime_type: None,
                bytes,
            },
        }
    }
}

/// Uniform view of an HTTP response: status, headers, final URL and body.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Url,
    pub body: String,
}

impl Response {
    /// The media type without parameters, lowercased. Empty when absent.
    pub fn content_type(&self) -> String {
        media_type(&self.headers)
    }

    /// A parameter of the `Content-Type` header, such as `charset`.
    pub fn content_type_param(&self, name: &str) -> Option<String> {
        let header = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        header.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            (key.trim().eq_ignore_ascii_case(name)).then(|| value.trim().trim_matches('"').to_string())
        })
    }

    /// True for the JSON-ish types the API has been seen to answer with.
    pub fn is_json(&self) -> bool {
        is_json_type(&self.content_type())
    }

    pub fn is_html(&self) -> bool {
        is_html_type(&self.content_type())
    }
}

/// The `Content-Type` media type of `headers` without parameters, lowercased.
/// Empty when absent.
pub fn media_type(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Expects a media type as returned by [`media_type`].
pub fn is_json_type(media_type: &str) -> bool {
    matches!(
        media_type,
        "application/json" | "text/javascript" | "application/javascript" | "text/json"
    ) || media_type.ends_with("+json")
}

/// Expects a media type as returned by [`media_type`].
pub fn is_html_type(media_type: &str) -> bool {
    matches!(media_type, "text/html" | "application/xhtml+xml")
}

/// Resolves `uri` against `base` when there is one.
pub fn resolve(base: Option<&Url>, uri: &str) -> Result<Url, Error> {
    match base {
        Some(base) => Ok(base.join(uri)?),
        None => Ok(Url::parse(uri)?),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn response(content_type: &str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        Response {
            status: StatusCode::OK,
            headers,
            url: Url::parse("http://example.com/").unwrap(),
            body: String::new(),
        }
    }

    #[test]
    fn content_type_parsing() {
        let resp = response("text/javascript; charset=UTF-8");
        assert_eq!(resp.content_type(), "text/javascript");
        assert_eq!(resp.content_type_param("charset").as_deref(), Some("UTF-8"));
        assert!(resp.is_json());
        assert!(response("application/vnd.api+json").is_json());
        assert!(!response("text/plain").is_json());
        assert!(response("text/html;charset=utf-8").is_html());
    }

    #[test]
    fn xhtml_counts_as_html() {
        assert!(response("application/xhtml+xml; charset=utf-8").is_html());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("Application/XHTML+XML"));
        assert!(is_html_type(&media_type(&headers)));
        assert!(!is_html_type(&media_type(&HeaderMap::new())));
        assert!(!is_html_type("text/plain"));
    }

    #[test]
    fn relative_uris_resolve_against_base() {
        let base = Url::parse("http://friendfeed-api.com/v2/").unwrap();
        assert_eq!(
            resolve(Some(&base), "feed/bob?num=1").unwrap().as_str(),
            "http://friendfeed-api.com/v2/feed/bob?num=1"
        );
        assert_eq!(
            resolve(Some(&base), "https://friendfeed.com/a/x").unwrap().as_str(),
            "https://friendfeed.com/a/x"
        );
        assert!(resolve(None, "feed/bob").is_err());
    }
}
