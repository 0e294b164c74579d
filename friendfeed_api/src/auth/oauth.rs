use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

use super::{Auth, Body, NoAuth, Response};
use crate::oauth::{OAuthHelper, OAuthToken};
use crate::Error;

/// Signs every request with FriendFeed's installed-application OAuth.
///
/// Clones share the access token, so an application can keep one handle to
/// read back a freshly obtained token after handing another to a client.
#[derive(Clone)]
pub struct OAuthAuth {
    inner: NoAuth,
    helper: Arc<Mutex<OAuthHelper>>,
}

impl OAuthAuth {
    /// Creates a strategy for an application's consumer token. Requests stay
    /// unsigned until an access token is set or obtained.
    pub fn new(consumer_token: OAuthToken) -> Result<Self, Error> {
        Ok(Self::with_helper(NoAuth::new()?, OAuthHelper::new(consumer_token)))
    }

    pub fn with_helper(inner: NoAuth, helper: OAuthHelper) -> Self {
        Self {
            inner,
            helper: Arc::new(Mutex::new(helper)),
        }
    }

    /// Sets a previously stored access token.
    pub fn with_access_token(self, access_token: OAuthToken) -> Self {
        self.set_access_token(Some(access_token));
        self
    }

    pub fn access_token(&self) -> Option<OAuthToken> {
        self.helper().access_token().cloned()
    }

    pub fn set_access_token(&self, access_token: Option<OAuthToken>) {
        self.helper().set_access_token(access_token);
    }

    /// Exchanges a username and password for an access token and starts using it.
    ///
    /// Store the returned token rather than the password; the service revokes
    /// it when the user changes their password.
    pub async fn get_ia_access_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<OAuthToken, Error> {
        let uri = self.helper().ia_access_token_uri(username, password)?;
        let resp = self.inner.send(Method::GET, uri, None, None, None).await?;
        if resp.status == StatusCode::UNAUTHORIZED || resp.status == StatusCode::FORBIDDEN {
            tracing::error!("Access token request rejected with status {}", resp.status);
            return Err(Error::LoginFailed(format!(
                "token endpoint answered {}",
                resp.status
            )));
        }
        if !resp.status.is_success() {
            tracing::error!("Access token request failed with status {}", resp.status);
            return Err(Error::HttpStatus {
                status: resp.status.as_u16(),
                body: resp.body,
            });
        }
        let token = OAuthHelper::parse_token_response(&resp.body)?;
        self.set_access_token(Some(token.clone()));
        Ok(token)
    }

    fn helper(&self) -> MutexGuard<'_, OAuthHelper> {
        self.helper.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Auth for OAuthAuth {
    fn set_base_uri(&mut self, base_uri: Url) {
        self.inner.set_base_uri(base_uri);
    }

    async fn get(&self, uri: &str, headers: Option<HeaderMap>) -> Result<Response, Error> {
        let url = self.inner.abs_uri(uri)?;
        let signed = self.helper().sign(Method::GET, &url, None, headers)?;
        self.inner
            .send(signed.method, signed.uri, signed.body, signed.headers, None)
            .await
    }

    async fn post(
        &self,
        uri: &str,
        body: Option<Body>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, Error> {
        let url = self.inner.abs_uri(uri)?;
        let signed = self.helper().sign(Method::POST, &url, body, headers)?;
        self.inner
            .send(signed.method, signed.uri, signed.body, signed.headers, None)
            .await
    }
}
