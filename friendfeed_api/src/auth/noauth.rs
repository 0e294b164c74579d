use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use url::Url;

use super::{resolve, Auth, Body, PartContent, Response};
use crate::user_agent::get_user_agent;
use crate::Error;

/// Issues requests without any credentials.
///
/// Sends a browser-like user agent and uses a 30-second timeout. The other
/// strategies reuse its request mechanics.
#[derive(Clone)]
pub struct NoAuth {
    http: reqwest::Client,
    base_uri: Option<Url>,
}

impl NoAuth {
    pub fn new() -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::Http(e)
            })?;
        Ok(Self::with_http(http))
    }

    /// Wraps an already configured `reqwest::Client` (cookie store, proxy, ...).
    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            base_uri: None,
        }
    }

    pub fn base_uri(&self) -> Option<&Url> {
        self.base_uri.as_ref()
    }

    /// Resolves `uri` against the base URI.
    pub fn abs_uri(&self, uri: &str) -> Result<Url, Error> {
        resolve(self.base_uri.as_ref(), uri)
    }

    /// Sends one request to an absolute URI, optionally with basic credentials.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Body>,
        headers: Option<HeaderMap>,
        basic: Option<(&str, &str)>,
    ) -> Result<Response, Error> {
        tracing::debug!("{} {}", method, redact(&url));
        let mut req = self.http.request(method, url);
        if let Some(headers) = headers {
            req = req.headers(headers);
        }
        if let Some((username, password)) = basic {
            req = req.basic_auth(username, Some(password));
        }
        req = match body {
            None => req,
            Some(Body::Form(pairs)) => req.form(&pairs),
            Some(Body::Text(text)) => req.body(text),
            Some(Body::Multipart(parts)) => req.multipart(multipart_form(parts)?),
        };

        let resp = req.send().await.map_err(|e| {
            tracing::error!("Failed to send request: {}", e);
            Error::Http(e)
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let url = resp.url().clone();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::Http(e)
        })?;
        tracing::debug!("{} from {}", status, redact(&url));

        Ok(Response {
            status,
            headers,
            url,
            body,
        })
    }
}

#[async_trait]
impl Auth for NoAuth {
    fn set_base_uri(&mut self, base_uri: Url) {
        self.base_uri = Some(base_uri);
    }

    async fn get(&self, uri: &str, headers: Option<HeaderMap>) -> Result<Response, Error> {
        let url = self.abs_uri(uri)?;
        self.send(Method::GET, url, None, headers, None).await
    }

    async fn post(
        &self,
        uri: &str,
        body: Option<Body>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, Error> {
        let url = self.abs_uri(uri)?;
        self.send(Method::POST, url, body, headers, None).await
    }
}

fn multipart_form(parts: Vec<super::Part>) -> Result<reqwest::multipart::Form, Error> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part.content {
            PartContent::Text(value) => form.text(part.name, value),
            PartContent::File {
                file_name,
                mime_type,
                bytes,
            } => {
                let mut file = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                if let Some(mime_type) = mime_type {
                    file = file.mime_str(&mime_type)?;
                }
                form.part(part.name, file)
            }
        };
    }
    Ok(form)
}

/// Drops the query string, which may carry credentials or signatures.
fn redact(url: &Url) -> &str {
    &url[..url::Position::AfterPath]
}
