//! Canonical field names.
//!
//! Every key that comes off the wire is turned into `snake_case` once, at
//! ingestion, so the rest of the crate only ever sees one spelling.

use std::sync::LazyLock;

use regex::Regex;

static ACRONYM_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("invalid regex")
});

static CAMEL_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-z\d])([A-Z])").expect("invalid regex")
});

/// Converts an API field name into its canonical form.
///
/// `-` becomes `_`, an underscore is inserted after an uppercase run that is
/// followed by a capitalized word (`HTTPStatus` -> `HTTP_Status`), then at
/// every lowercase/digit-to-uppercase boundary, and finally the whole string
/// is lowercased. Applying it twice gives the same result as applying it once.
pub fn normalize(token: &str) -> String {
    let token = token.replace('-', "_");
    let token = ACRONYM_BOUNDARY.replace_all(&token, "${1}_${2}");
    let token = CAMEL_BOUNDARY.replace_all(&token, "${1}_${2}");
    token.to_lowercase()
}
