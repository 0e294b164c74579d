//! Client for the official FriendFeed v2 API.

use std::sync::{Arc, Mutex, Weak};

use url::Url;

use crate::{
    auth::{Auth, Body, NoAuth, Response},
    new_entry::NewEntry,
    object::{DataType, Object},
    query::{compose, ApiQuery, ResourcePath},
    types::{Comment, Entry, Feed, FeedList, Record},
    Error,
};

/// Base URI of the official API.
pub const API_URI: &str = "http://friendfeed-api.com/v2/";

/// Client for the official API.
///
/// Cheap to clone; clones share the authentication strategy. Calls are
/// serialized, so at most one request per client is in flight. Objects
/// returned by the client keep a non-owning reference back to it.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    base_uri: Url,
    auth: tokio::sync::Mutex<Box<dyn Auth>>,
    nickname: Mutex<Option<String>>,
}

/// Non-owning handle to a [`Client`], carried by result objects.
#[derive(Clone)]
pub struct ClientRef(Weak<Inner>);

impl ClientRef {
    /// The client, unless it has been dropped.
    pub fn upgrade(&self) -> Option<Client> {
        self.0.upgrade().map(|inner| Client { inner })
    }
}

impl std::fmt::Debug for ClientRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClientRef")
    }
}

/// What [`Client::call_api`] got back.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A JSON object, tagged if a tag was requested.
    Object(Object),
    /// Any non-JSON body, returned as is.
    Text { content_type: String, body: String },
}

impl Payload {
    pub fn into_object(self) -> Result<Object, Error> {
        match self {
            Payload::Object(object) => Ok(object),
            Payload::Text { content_type, .. } => {
                tracing::error!("Expected a JSON object, got {}", content_type);
                Err(Error::UnexpectedContent {
                    content_type,
                    expected: "a JSON object",
                })
            }
        }
    }
}

impl Client {
    /// Creates an unauthenticated client pointing at the production API.
    pub fn new() -> Result<Self, Error> {
        Self::with_base_url(API_URI)
    }

    /// Creates an unauthenticated client with a custom base URL. Used for
    /// testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        let base_uri = base_uri(base_url)?;
        let mut auth = NoAuth::new()?;
        auth.set_base_uri(base_uri.clone());
        Ok(Self {
            inner: Arc::new(Inner {
                base_uri,
                auth: tokio::sync::Mutex::new(Box::new(auth)),
                nickname: Mutex::new(None),
            }),
        })
    }

    pub fn base_uri(&self) -> &Url {
        &self.inner.base_uri
    }

    /// The nickname confirmed by the last successful [`login`](Self::login).
    pub fn nickname(&self) -> Option<String> {
        self.inner
            .nickname
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn downgrade(&self) -> ClientRef {
        ClientRef(Arc::downgrade(&self.inner))
    }

    /// Switches to `auth` and validates the credentials.
    ///
    /// On failure the client goes back to unauthenticated requests. Rejected
    /// credentials surface as [`Error::LoginFailed`].
    pub async fn login<A: Auth + 'static>(&self, mut auth: A) -> Result<Feed, Error> {
        auth.set_base_uri(self.inner.base_uri.clone());
        *self.inner.auth.lock().await = Box::new(auth);

        match self.validate().await {
            Ok(feed) => {
                let nickname = feed.nickname().map(str::to_string).or_else(|| feed.id.clone());
                tracing::info!("Logged in as {}", nickname.as_deref().unwrap_or("?"));
                self.set_nickname(nickname);
                Ok(feed)
            }
            Err(e) => {
                tracing::error!("Login failed: {}", e);
                let mut fallback = NoAuth::new()?;
                fallback.set_base_uri(self.inner.base_uri.clone());
                *self.inner.auth.lock().await = Box::new(fallback);
                self.set_nickname(None);
                Err(match e {
                    Error::HttpStatus { status, .. } if status == 401 || status == 403 => {
                        Error::LoginFailed(format!("credentials rejected with status {}", status))
                    }
                    Error::Remote(code) if code == "unauthorized" || code == "forbidden" => {
                        Error::LoginFailed(code)
                    }
                    other => other,
                })
            }
        }
    }

    fn set_nickname(&self, nickname: Option<String>) {
        *self
            .inner
            .nickname
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = nickname;
    }

    /// Calls the API at `path`, relative to the base URI.
    ///
    /// Issues a POST when a body is given and a GET otherwise. JSON responses
    /// come back as an [`Object`] (tagged with `tag`, if given); anything else
    /// is returned as text.
    pub async fn call_api(
        &self,
        path: &str,
        body: Option<Body>,
        tag: Option<DataType>,
    ) -> Result<Payload, Error> {
        let resp = {
            let auth = self.inner.auth.lock().await;
            match body {
                Some(body) => auth.post(path, Some(body), None).await?,
                None => auth.get(path, None).await?,
            }
        };
        self.interpret(resp, tag)
    }

    fn interpret(&self, resp: Response, tag: Option<DataType>) -> Result<Payload, Error> {
        let status = resp.status;
        if resp.is_json() {
            match serde_json::from_str::<serde_json::Value>(&resp.body) {
                Ok(serde_json::Value::Object(map)) => {
                    let object = Object::create(map, Some(self.downgrade()));
                    if object.is_error() {
                        let code = match object.field("error_code") {
                            Some(code) => code
                                .as_str()
                                .map(str::to_string)
                                .unwrap_or_else(|| code.to_json().to_string()),
                            None => String::new(),
                        };
                        tracing::error!("API returned error {} with status {}", code, status);
                        return Err(Error::Remote(code));
                    }
                    if !status.is_success() {
                        return Err(status_error(status.as_u16(), &resp.body));
                    }
                    return Ok(Payload::Object(match tag {
                        Some(tag) => object.with_tag(tag),
                        None => object,
                    }));
                }
                Ok(_) if status.is_success() => {
                    tracing::error!("Expected a JSON object from {}", resp.url);
                    return Err(Error::UnexpectedContent {
                        content_type: resp.content_type(),
                        expected: "a JSON object",
                    });
                }
                Ok(_) => return Err(status_error(status.as_u16(), &resp.body)),
                Err(e) if status.is_success() => {
                    let snippet = truncate_body(&resp.body);
                    tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
                    return Err(Error::Json(e));
                }
                Err(_) => return Err(status_error(status.as_u16(), &resp.body)),
            }
        }
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &resp.body));
        }
        Ok(Payload::Text {
            content_type: resp.content_type(),
            body: resp.body,
        })
    }

    async fn get_record<T: Record>(&self, path: &str) -> Result<T, Error> {
        let object = self.call_api(path, None, Some(T::TAG)).await?.into_object()?;
        Ok(T::from_object(object))
    }

    async fn post_record<T: Record>(&self, path: &str, body: Body) -> Result<T, Error> {
        let object = self
            .call_api(path, Some(body), Some(T::TAG))
            .await?
            .into_object()?;
        Ok(T::from_object(object))
    }

    async fn post_object(&self, path: &str, params: &[(&str, &str)]) -> Result<Object, Error> {
        self.call_api(path, Some(Body::form(params.iter().copied())), None)
            .await?
            .into_object()
    }

    /// Validates the current credentials and returns the user's feed.
    pub async fn validate(&self) -> Result<Feed, Error> {
        self.get_record("validate").await
    }

    /// Fetches a feed. The id may be a single string or segments such as
    /// `["bret", "friends"]` or `["list", "favorites", "summary", "1"]`.
    pub async fn get_feed(
        &self,
        id: impl Into<ResourcePath>,
        query: Option<&ApiQuery>,
    ) -> Result<Feed, Error> {
        let path = format!("feed/{}", id.into());
        self.get_record(&compose(&path, query)).await
    }

    /// Fetches one entry, or several when the query carries a list of ids.
    pub async fn get_entry(
        &self,
        id: impl Into<ResourcePath>,
        query: Option<&ApiQuery>,
    ) -> Result<Entry, Error> {
        let path = format!("entry/{}", id.into());
        self.get_record(&compose(&path, query)).await
    }

    /// Fetches the entry an ff.im short id points to.
    pub async fn decode_short(
        &self,
        short_id: &str,
        query: Option<&ApiQuery>,
    ) -> Result<Entry, Error> {
        let path = format!("short/{}", short_id);
        self.get_record(&compose(&path, query)).await
    }

    /// Creates (or looks up) the short URL of an entry. The returned entry
    /// carries `short_id` and `short_url`.
    pub async fn encode_short(
        &self,
        entry_id: &str,
        query: Option<&ApiQuery>,
    ) -> Result<Entry, Error> {
        let mut params = vec![("entry".to_string(), entry_id.to_string())];
        if let Some(query) = query {
            params.extend(query.params().iter().cloned());
        }
        self.post_record("short", Body::Form(params)).await
    }

    /// Fetches the feed lists in the authenticated user's side bar.
    pub async fn get_feedlist(&self) -> Result<FeedList, Error> {
        self.get_record("feedlist").await
    }

    /// Fetches a feed's description, subscriptions, subscribers and services.
    pub async fn get_feedinfo(&self, id: impl Into<ResourcePath>) -> Result<Feed, Error> {
        self.get_record(&format!("feedinfo/{}", id.into())).await
    }

    /// Posts an entry. Attachments are checked before anything is sent.
    pub async fn add_entry(&self, entry: NewEntry) -> Result<Entry, Error> {
        let body = entry.into_body()?;
        self.post_record("entry", body).await
    }

    pub async fn add_comment(&self, entry_id: &str, body: &str) -> Result<Comment, Error> {
        self.post_record("comment", Body::form([("entry", entry_id), ("body", body)]))
            .await
    }

    pub async fn edit_comment(&self, comment_id: &str, body: &str) -> Result<Comment, Error> {
        self.post_record("comment", Body::form([("id", comment_id), ("body", body)]))
            .await
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<Object, Error> {
        self.post_object("comment/delete", &[("id", comment_id)]).await
    }

    pub async fn delete_entry(&self, entry_id: &str) -> Result<Object, Error> {
        self.post_object("entry/delete", &[("id", entry_id)]).await
    }

    pub async fn add_like(&self, entry_id: &str) -> Result<Object, Error> {
        self.post_object("like", &[("entry", entry_id)]).await
    }

    pub async fn delete_like(&self, entry_id: &str) -> Result<Object, Error> {
        self.post_object("like/delete", &[("entry", entry_id)]).await
    }

    pub async fn subscribe(&self, feed_id: &str) -> Result<Object, Error> {
        self.post_object("subscribe", &[("feed", feed_id)]).await
    }

    pub async fn unsubscribe(&self, feed_id: &str) -> Result<Object, Error> {
        self.post_object("unsubscribe", &[("feed", feed_id)]).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_uri", &self.inner.base_uri.as_str())
            .field("nickname", &self.nickname())
            .finish_non_exhaustive()
    }
}

/// Parses a base URL, making sure relative paths resolve below it.
fn base_uri(base_url: &str) -> Result<Url, Error> {
    let mut base = Url::parse(base_url).map_err(|e| {
        tracing::error!("Invalid base URL {}: {}", base_url, e);
        Error::Url(e)
    })?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn status_error(status: u16, body: &str) -> Error {
    let snippet = truncate_body(body);
    tracing::error!("Request failed with status {}: {}", status, snippet);
    Error::HttpStatus {
        status,
        body: snippet,
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_uri_gets_a_trailing_slash() {
        assert_eq!(
            base_uri("http://127.0.0.1:1234").unwrap().as_str(),
            "http://127.0.0.1:1234/"
        );
        assert_eq!(
            base_uri("http://127.0.0.1:1234/v2").unwrap().as_str(),
            "http://127.0.0.1:1234/v2/"
        );
        assert_eq!(base_uri(API_URI).unwrap().as_str(), API_URI);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(1500);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("...[truncated]"));
        assert!(truncated.len() <= 2000 + "...[truncated]".len());
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn client_refs_do_not_keep_the_client_alive() {
        let client = Client::new().unwrap();
        let weak = client.downgrade();
        assert!(weak.upgrade().is_some());
        drop(client);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn text_payload_is_not_an_object() {
        let payload = Payload::Text {
            content_type: "text/plain".into(),
            body: "ok".into(),
        };
        assert!(matches!(
            payload.into_object(),
            Err(Error::UnexpectedContent { .. })
        ));
    }
}
