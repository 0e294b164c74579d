//! FriendFeed's flavour of OAuth 1.0a.
//!
//! Only what the service's "installed application" scheme needs: an access
//! token is exchanged for a username and password in one signed GET, and
//! every later request carries a signed query string. The signing key is the
//! raw `consumer_secret&token_secret`, and the signature base string keeps the
//! request URI's own query, which is where FriendFeed departs from RFC 5849.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::HeaderMap;
use reqwest::Method;
use sha1::Sha1;
use url::{Position, Url};
use uuid::Uuid;

use crate::auth::Body;
use crate::Error;

/// Token endpoints live under this URI.
pub const OAUTH_BASE_URI: &str = "https://friendfeed.com/account/oauth/";

/// Everything but `[A-Za-z0-9-._~]` gets escaped.
const OAUTH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Request parameters, grouped by name. Repeated names keep every value.
pub type Params = BTreeMap<String, Vec<String>>;

/// A key/secret pair plus whatever else the token endpoint returned.
///
/// Consumer tokens (per application) and access tokens (per user) share this
/// type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthToken {
    key: String,
    secret: String,
    extra: BTreeMap<String, String>,
}

impl OAuthToken {
    /// Builds a token, refusing an empty key or secret.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Result<Self, Error> {
        let key = key.into();
        let secret = secret.into();
        if key.is_empty() {
            return Err(Error::Config("OAuth token key is empty".into()));
        }
        if secret.is_empty() {
            return Err(Error::Config(format!(
                "OAuth token {} has no secret",
                key
            )));
        }
        Ok(Self {
            key,
            secret,
            extra: BTreeMap::new(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Extra attributes returned alongside the token (e.g. `username`).
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// The pieces of an outgoing request, after signing.
#[derive(Debug)]
pub struct SignedRequest {
    pub method: Method,
    pub uri: Url,
    pub body: Option<Body>,
    pub headers: Option<HeaderMap>,
}

/// Signs requests with a consumer token and, once obtained, an access token.
#[derive(Debug, Clone)]
pub struct OAuthHelper {
    consumer: OAuthToken,
    access: Option<OAuthToken>,
    base_uri: String,
}

impl OAuthHelper {
    pub fn new(consumer: OAuthToken) -> Self {
        Self {
            consumer,
            access: None,
            base_uri: OAUTH_BASE_URI.to_string(),
        }
    }

    /// Points the token endpoints somewhere else. Used for testing with wiremock.
    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        self.base_uri = base_uri.to_string();
        self
    }

    pub fn consumer_token(&self) -> &OAuthToken {
        &self.consumer
    }

    pub fn access_token(&self) -> Option<&OAuthToken> {
        self.access.as_ref()
    }

    /// Installs a previously obtained access token, or clears it.
    pub fn set_access_token(&mut self, token: Option<OAuthToken>) {
        self.access = token;
    }

    /// Signed URI for exchanging `username` and `password` for an access token.
    pub fn ia_access_token_uri(&self, username: &str, password: &str) -> Result<Url, Error> {
        self.ia_access_token_uri_at(username, password, now(), &nonce())
    }

    /// [`Self::ia_access_token_uri`] with a fixed timestamp and nonce.
    pub fn ia_access_token_uri_at(
        &self,
        username: &str,
        password: &str,
        timestamp: i64,
        nonce: &str,
    ) -> Result<Url, Error> {
        let mut uri = Url::parse(&self.base_uri)?.join("ia_access_token")?;
        let mut params = Params::new();
        insert(&mut params, "oauth_consumer_key", self.consumer.key());
        insert(&mut params, "oauth_signature_method", "HMAC-SHA1");
        insert(&mut params, "oauth_timestamp", &timestamp.to_string());
        insert(&mut params, "oauth_nonce", nonce);
        insert(&mut params, "oauth_version", "1.0");
        insert(&mut params, "ff_username", username);
        insert(&mut params, "ff_password", password);
        let sig = signature("GET", &uri, &params, self.consumer.secret(), None)?;
        insert(&mut params, "oauth_signature", &sig);
        uri.set_query(Some(&escape_parameters(&params)));
        Ok(uri)
    }

    /// Parses a form-encoded token response into an [`OAuthToken`].
    pub fn parse_token_response(body: &str) -> Result<OAuthToken, Error> {
        let mut values: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
            values.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        let key = values.remove("oauth_token").ok_or_else(|| {
            Error::Config("token response is missing oauth_token".into())
        })?;
        let secret = values.remove("oauth_token_secret").ok_or_else(|| {
            Error::Config("token response is missing oauth_token_secret".into())
        })?;
        let mut token = OAuthToken::new(key, secret)?;
        token.extra = values;
        Ok(token)
    }

    /// Signs a request with a fresh timestamp and nonce.
    ///
    /// Without an access token the request passes through untouched, so
    /// anonymous calls can share the same pipeline.
    pub fn sign(
        &self,
        method: Method,
        uri: &Url,
        body: Option<Body>,
        headers: Option<HeaderMap>,
    ) -> Result<SignedRequest, Error> {
        self.sign_at(method, uri, body, headers, now(), &nonce())
    }

    /// [`Self::sign`] with a fixed timestamp and nonce.
    pub fn sign_at(
        &self,
        method: Method,
        uri: &Url,
        body: Option<Body>,
        headers: Option<HeaderMap>,
        timestamp: i64,
        nonce: &str,
    ) -> Result<SignedRequest, Error> {
        let Some(token) = &self.access else {
            return Ok(SignedRequest {
                method,
                uri: uri.clone(),
                body,
                headers,
            });
        };

        let mut params = Params::new();
        insert(&mut params, "oauth_consumer_key", self.consumer.key());
        insert(&mut params, "oauth_token", token.key());
        insert(&mut params, "oauth_signature_method", "HMAC-SHA1");
        insert(&mut params, "oauth_timestamp", &timestamp.to_string());
        insert(&mut params, "oauth_nonce", nonce);
        insert(&mut params, "oauth_version", "1.0");

        params.extend(group(
            uri.query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        ));
        if method == Method::POST || method == Method::PUT {
            if let Some(Body::Form(pairs)) = &body {
                params.extend(group(pairs.iter().cloned()));
            }
        }

        let sig = signature(
            method.as_str(),
            uri,
            &params,
            self.consumer.secret(),
            Some(token.secret()),
        )?;
        insert(&mut params, "oauth_signature", &sig);

        let mut signed = uri.clone();
        signed.set_query(Some(&escape_parameters(&params)));
        Ok(SignedRequest {
            method,
            uri: signed,
            body,
            headers,
        })
    }
}

/// Escapes a string the way OAuth wants it.
pub fn escape(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ESCAPE).to_string()
}

/// Flattens, sorts by (name, value), escapes and joins the parameters.
pub fn escape_parameters(params: &Params) -> String {
    let mut pairs: Vec<(&str, &str)> = params
        .iter()
        .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// The signature base string for a request.
pub fn base_string(method: &str, uri: &Url, params: &Params) -> String {
    [
        method.to_uppercase(),
        uri[..Position::AfterQuery].to_string(),
        escape_parameters(params),
    ]
    .iter()
    .map(|s| escape(s))
    .collect::<Vec<_>>()
    .join("&")
}

/// Base64 HMAC-SHA1 of the base string, keyed with `consumer_secret&token_secret`.
pub fn signature(
    method: &str,
    uri: &Url,
    params: &Params,
    consumer_secret: &str,
    token_secret: Option<&str>,
) -> Result<String, Error> {
    let key = format!("{}&{}", consumer_secret, token_secret.unwrap_or(""));
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| Error::Config(format!("unusable signing key: {}", e)))?;
    mac.update(base_string(method, uri, params).as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn insert(params: &mut Params, key: &str, value: &str) {
    params.insert(key.to_string(), vec![value.to_string()]);
}

fn group(pairs: impl Iterator<Item = (String, String)>) -> Params {
    let mut grouped = Params::new();
    for (k, v) in pairs {
        grouped.entry(k).or_default().push(v);
    }
    grouped
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn nonce() -> String {
    Uuid::new_v4().to_string()
}
