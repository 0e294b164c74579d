pub mod auth;
mod client;
mod errors;
pub mod key;
mod new_entry;
pub mod oauth;
pub mod object;
mod query;
pub mod types;
pub mod user_agent;
pub use self::auth::{Auth, BasicAuth, Body, NoAuth, OAuthAuth, Part, Response};
pub use self::client::{Client, ClientRef, Payload, API_URI};
pub use self::errors::Error;
pub use self::new_entry::{Attachment, AttachmentKind, NewEntry};
pub use self::oauth::{OAuthHelper, OAuthToken};
pub use self::object::{DataType, Object, Value};
pub use self::query::{ApiQuery, ResourcePath};
