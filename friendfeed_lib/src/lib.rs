//! Unofficial FriendFeed API: web-site login and the operations only the
//! site's own dialogs offer.
//!
//! Wraps the `friendfeed_api` crate. A [`WebAuth`] logs in like a browser and
//! then authenticates official API calls with the scraped remote key, while
//! [`WebClient`] adds group, service and imaginary-friend management on top.

pub mod error;
pub mod forms;
pub mod unofficial;
pub mod web_auth;

pub use friendfeed_api;
pub use friendfeed_api::types;
pub use friendfeed_api::{ApiQuery, Client, NewEntry, OAuthAuth, OAuthToken, ResourcePath};

pub use error::Error;
pub use forms::FormFields;
pub use unofficial::{ImaginaryFriend, ImaginaryService, ServiceLink, WebClient};
pub use web_auth::{WebAuth, WebResponse};
