//! Error types for the unofficial API layer.

use reqwest::StatusCode;

/// Errors produced while logging in through the web site or calling its
/// internal endpoints. Failures of the official API are wrapped as [`Error::Api`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("API error: {0}")]
    Api(#[from] friendfeed_api::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    HttpStatus { status: StatusCode, url: String },
    /// The page had no form posting back to the expected URI.
    #[error("cannot locate a login form at {0}")]
    FormNotFound(String),
    /// An element expected on a page was missing.
    #[error("cannot locate {0}")]
    FieldNotFound(String),
    /// The login form came back after submitting credentials.
    #[error("login failed")]
    LoginFailed,
    /// The site rejected the request and said why.
    #[error("remote error: {0}")]
    Remote(String),
    #[error("no AT cookie in the session")]
    MissingSessionCookie,
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URI: {0}")]
    Url(#[from] url::ParseError),
}
