//! Browser-session login and the site's internal POST endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use url::Url;

use friendfeed_api::auth::{is_html_type, media_type};
use friendfeed_api::user_agent::get_user_agent;
use friendfeed_api::{Auth, BasicAuth, Body, NoAuth, Response};

use crate::error::Error;
use crate::forms::{find_form_posting_to, parse_fragment};

/// Root of the web site.
pub const ROOT_URI: &str = "https://friendfeed.com/";

const LOGIN_PATH: &str = "/account/login?v=2";
const REMOTE_KEY_PATH: &str = "/account/api";
const SESSION_COOKIE: &str = "AT";

/// Logs in through the web site and keeps the browser session.
///
/// Official API calls go out with HTTP Basic credentials made of the username
/// and the remote key scraped from the account page. The session cookies are
/// kept for [`WebAuth::web_post`], which the unofficial operations use.
#[derive(Clone)]
pub struct WebAuth {
    basic: BasicAuth,
    session: Session,
}

#[derive(Clone)]
struct Session {
    http: reqwest::Client,
    jar: Arc<Jar>,
    root: Url,
}

impl WebAuth {
    /// Logs in to friendfeed.com.
    pub async fn login(username: &str, password: &str) -> Result<Self, Error> {
        Self::login_at(ROOT_URI, username, password).await
    }

    /// Logs in to a site rooted at `root`. Used for testing with wiremock.
    pub async fn login_at(root: &str, username: &str, password: &str) -> Result<Self, Error> {
        let session = Session::new(Url::parse(root)?)?;
        let login_uri = session.root.join(LOGIN_PATH)?;

        let page = session.get_html(&login_uri).await?;
        let form = {
            let document = Html::parse_document(&page);
            find_form_posting_to(&document, &login_uri)
        };
        let Some(form) = form else {
            tracing::error!("No login form at {}", login_uri);
            return Err(Error::FormNotFound(login_uri.to_string()));
        };

        let mut fields = form.fields;
        fields.set("email", username);
        fields.set("password", password);
        tracing::debug!("Submitting login form for {}", username);
        let resp = session
            .http
            .post(form.action)
            .form(&fields.into_pairs())
            .send()
            .await?;
        let page = checked_text(resp).await?;
        let rejected = {
            let document = Html::parse_document(&page);
            find_form_posting_to(&document, &login_uri).is_some()
        };
        if rejected {
            tracing::error!("Login form came back for {}", username);
            return Err(Error::LoginFailed);
        }

        let page = session.get_html(&session.root.join(REMOTE_KEY_PATH)?).await?;
        let remote_key = scrape_remote_key(&page)?;
        tracing::info!("Logged in to the web site as {}", username);

        let transport = NoAuth::with_http(session.http.clone());
        Ok(Self {
            basic: BasicAuth::with_transport(transport, username, remote_key),
            session,
        })
    }

    pub fn username(&self) -> &str {
        self.basic.username()
    }

    /// The key used as the Basic password for the official API.
    pub fn remote_key(&self) -> &str {
        self.basic.password()
    }

    pub fn root(&self) -> &Url {
        &self.session.root
    }

    /// The value of the session's `AT` cookie.
    pub fn session_token(&self) -> Option<String> {
        let header = self.session.jar.cookies(&self.session.root)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name == SESSION_COOKIE).then(|| value.to_string())
        })
    }

    /// Fetches a page of the site with the session cookies.
    pub async fn get_html(&self, uri: &str) -> Result<String, Error> {
        let url = self.session.root.join(uri)?;
        self.session.get_html(&url).await
    }

    /// Posts `params` to one of the site's internal endpoints.
    ///
    /// The session token goes along as `at`. An HTML answer carrying an error
    /// message, or a JSON answer with an `error` field, fails with that message.
    pub async fn web_post<K, V>(
        &self,
        uri: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<WebResponse, Error>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = self.with_token(params)?;
        let url = self.session.root.join(uri)?;
        tracing::debug!("POST {}", url);
        let resp = self.session.http.post(url).form(&pairs).send().await?;
        WebResponse::from_response(resp).await
    }

    /// Like [`web_post`](Self::web_post), with a file attached under `field`.
    pub async fn web_upload<K, V>(
        &self,
        uri: &str,
        params: impl IntoIterator<Item = (K, V)>,
        field: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<WebResponse, Error>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in self.with_token(params)? {
            form = form.text(name, value);
        }
        let file = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        form = form.part(field.to_string(), file);

        let url = self.session.root.join(uri)?;
        tracing::debug!("POST {} (multipart)", url);
        let resp = self.session.http.post(url).multipart(form).send().await?;
        WebResponse::from_response(resp).await
    }

    fn with_token<K, V>(
        &self,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Vec<(String, String)>, Error>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let token = self.session_token().ok_or(Error::MissingSessionCookie)?;
        let mut pairs = vec![("at".to_string(), token)];
        for (name, value) in params {
            let name = name.into();
            let value = value.into();
            match pairs.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => pairs.push((name, value)),
            }
        }
        Ok(pairs)
    }
}

impl std::fmt::Debug for WebAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebAuth")
            .field("username", &self.username())
            .field("root", &self.session.root.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Auth for WebAuth {
    fn set_base_uri(&mut self, base_uri: Url) {
        self.basic.set_base_uri(base_uri);
    }

    async fn get(
        &self,
        uri: &str,
        headers: Option<HeaderMap>,
    ) -> Result<Response, friendfeed_api::Error> {
        self.basic.get(uri, headers).await
    }

    async fn post(
        &self,
        uri: &str,
        body: Option<Body>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, friendfeed_api::Error> {
        self.basic.post(uri, body, headers).await
    }
}

impl Session {
    fn new(root: Url) -> Result<Self, Error> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(Duration::from_secs(30))
            .cookie_provider(jar.clone())
            .build()?;
        Ok(Self { http, jar, root })
    }

    async fn get_html(&self, url: &Url) -> Result<String, Error> {
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url.clone())
            .header("accept", "text/html,application/xhtml+xml")
            .send()
            .await?;
        checked_text(resp).await
    }
}

async fn checked_text(resp: reqwest::Response) -> Result<String, Error> {
    if !resp.status().is_success() {
        tracing::error!("Unexpected status {} from {}", resp.status(), resp.url());
        return Err(Error::HttpStatus {
            status: resp.status(),
            url: resp.url().to_string(),
        });
    }
    Ok(resp.text().await?)
}

/// The remote key sits in the second value cell of the account page's key table.
fn scrape_remote_key(page: &str) -> Result<String, Error> {
    let document = Html::parse_document(page);
    let selector = Selector::parse("table.remotekey td.value").expect("invalid selector");
    document
        .select(&selector)
        .nth(1)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            tracing::error!("No remote key on the account page");
            Error::FieldNotFound("remote key".into())
        })
}

/// What an internal endpoint answered with.
#[derive(Debug, Clone, PartialEq)]
pub enum WebResponse {
    /// A full HTML page.
    Html(String),
    /// A JSON document, often carrying an `html` fragment.
    Json(serde_json::Value),
}

impl WebResponse {
    async fn from_response(resp: reqwest::Response) -> Result<Self, Error> {
        let is_html = is_html_type(&media_type(resp.headers()));
        let body = checked_text(resp).await?;
        if is_html {
            Self::from_html(body)
        } else {
            Self::from_json(serde_json::from_str(&body)?)
        }
    }

    /// Fails with the text of the page's error message block, if it has one.
    pub fn from_html(page: String) -> Result<Self, Error> {
        let selector = Selector::parse("div#errormessage").expect("invalid selector");
        let message = {
            let document = Html::parse_document(&page);
            document
                .select(&selector)
                .map(|div| div.text().collect::<String>().trim().to_string())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        };
        if !message.is_empty() {
            tracing::error!("Site returned error: {}", message);
            return Err(Error::Remote(message));
        }
        Ok(WebResponse::Html(page))
    }

    /// Fails with the document's `error` field, if it has one.
    pub fn from_json(json: serde_json::Value) -> Result<Self, Error> {
        match json.get("error") {
            None | Some(serde_json::Value::Null) => Ok(WebResponse::Json(json)),
            Some(error) => {
                let message = error
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                tracing::error!("Site returned error: {}", message);
                Err(Error::Remote(message))
            }
        }
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        match self {
            WebResponse::Json(json) => Some(json),
            WebResponse::Html(_) => None,
        }
    }

    /// The HTML of the answer: the page itself, or the JSON `html` fragment.
    pub fn html(&self) -> Option<&str> {
        match self {
            WebResponse::Html(page) => Some(page),
            WebResponse::Json(json) => json.get("html").and_then(|v| v.as_str()),
        }
    }

    /// Parses [`html`](Self::html) into a document.
    pub fn document(&self) -> Option<Html> {
        match self {
            WebResponse::Html(page) => Some(Html::parse_document(page)),
            WebResponse::Json(_) => self.html().map(parse_fragment),
        }
    }
}
