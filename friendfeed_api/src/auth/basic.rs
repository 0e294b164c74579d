use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use url::Url;

use super::{Auth, Body, NoAuth, Response};
use crate::Error;

/// Attaches HTTP Basic credentials to every request.
///
/// For the official API the password must be the user's remote key, not the
/// account password.
#[derive(Clone)]
pub struct BasicAuth {
    inner: NoAuth,
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, Error> {
        Ok(Self::with_transport(NoAuth::new()?, username, password))
    }

    /// Uses an existing [`NoAuth`] for transport.
    pub fn with_transport(
        inner: NoAuth,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Auth for BasicAuth {
    fn set_base_uri(&mut self, base_uri: Url) {
        self.inner.set_base_uri(base_uri);
    }

    async fn get(&self, uri: &str, headers: Option<HeaderMap>) -> Result<Response, Error> {
        let url = self.inner.abs_uri(uri)?;
        self.inner
            .send(
                Method::GET,
                url,
                None,
                headers,
                Some((&self.username, &self.password)),
            )
            .await
    }

    async fn post(
        &self,
        uri: &str,
        body: Option<Body>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, Error> {
        let url = self.inner.abs_uri(uri)?;
        self.inner
            .send(
                Method::POST,
                url,
                body,
                headers,
                Some((&self.username, &self.password)),
            )
            .await
    }
}
