//! Error types for the API client.

/// Errors that can occur when making API requests or building them.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The transport failed (network error, timeout, TLS, ...).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API returned a non-success status without a recognizable error body.
    #[error("request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// A response body that should have been JSON was not.
    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),
    /// A URI could not be parsed or resolved against the base URI.
    #[error("invalid URI: {0}")]
    Url(#[from] url::ParseError),
    /// Credentials were rejected while logging in.
    #[error("login failed: {0}")]
    LoginFailed(String),
    /// An expected form or field was not found.
    #[error("cannot locate {0}")]
    NotFound(String),
    /// The server rejected the request and said why.
    #[error("remote error: {0}")]
    Remote(String),
    /// A write parameter has a shape the API does not accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The client was configured with unusable credentials.
    #[error("configuration error: {0}")]
    Config(String),
    /// The response had a content type the caller cannot use.
    #[error("unexpected content type {content_type:?}, expected {expected}")]
    UnexpectedContent {
        content_type: String,
        expected: &'static str,
    },
}
