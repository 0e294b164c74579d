//! Parameters for posting an entry.

use serde_json::Value as Json;

use crate::auth::{Body, Part};
use crate::Error;

/// The kinds of media an entry can link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Audio,
    File,
}

impl AttachmentKind {
    fn prefix(self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Audio => "audio",
            AttachmentKind::File => "file",
        }
    }

    /// Name of the optional value that accompanies the URL.
    fn second(self) -> &'static str {
        match self {
            AttachmentKind::Image => "link",
            AttachmentKind::Audio => "title",
            AttachmentKind::File => "name",
        }
    }
}

/// One media reference: a URL plus, depending on the kind, the link an image
/// points to, an audio title, or a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub second: Option<String>,
}

impl Attachment {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            second: None,
        }
    }

    pub fn with_second(url: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            second: Some(second.into()),
        }
    }

    /// Accepts a URL string, a `[url, second]` pair, or a mapping with `url`
    /// and the kind's second key. Any other shape is rejected.
    pub fn from_json(kind: AttachmentKind, value: &Json) -> Result<Self, Error> {
        let shape_error = || {
            Error::InvalidArgument(format!(
                "{} attachment must be a URL, a [url, {}] pair or a mapping, got {}",
                kind.prefix(),
                kind.second(),
                value
            ))
        };
        match value {
            Json::String(url) => Ok(Self::new(url.clone())),
            Json::Array(pair) if pair.len() == 2 => {
                let url = pair[0].as_str().ok_or_else(shape_error)?;
                let second = match &pair[1] {
                    Json::Null => None,
                    Json::String(s) => Some(s.clone()),
                    _ => return Err(shape_error()),
                };
                Ok(Self {
                    url: url.to_string(),
                    second,
                })
            }
            Json::Object(map) => {
                let url = map.get("url").and_then(Json::as_str).ok_or_else(shape_error)?;
                let second = match map.get(kind.second()) {
                    None | Some(Json::Null) => None,
                    Some(Json::String(s)) => Some(s.clone()),
                    Some(_) => return Err(shape_error()),
                };
                Ok(Self {
                    url: url.to_string(),
                    second,
                })
            }
            _ => Err(shape_error()),
        }
    }
}

/// A new entry for [`Client::add_entry`](crate::Client::add_entry).
///
/// Attachments are kept as JSON values as handed in and only checked when
/// the request body is built, which happens before anything is sent.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    body: String,
    to: Vec<String>,
    link: Option<String>,
    comment: Option<String>,
    images: Vec<Json>,
    audio: Vec<Json>,
    files: Vec<Json>,
    uploads: Vec<Part>,
}

impl NewEntry {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    /// Posts to a feed other than the user's own. Repeatable.
    pub fn to(mut self, feed_id: impl Into<String>) -> Self {
        self.to.push(feed_id.into());
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// An initial comment posted along with the entry.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn image(mut self, image: impl Into<Json>) -> Self {
        self.images.push(image.into());
        self
    }

    pub fn images(mut self, images: impl IntoIterator<Item = Json>) -> Self {
        self.images.extend(images);
        self
    }

    pub fn audio(mut self, audio: impl Into<Json>) -> Self {
        self.audio.push(audio.into());
        self
    }

    pub fn file(mut self, file: impl Into<Json>) -> Self {
        self.files.push(file.into());
        self
    }

    pub fn files(mut self, files: impl IntoIterator<Item = Json>) -> Self {
        self.files.extend(files);
        self
    }

    /// Uploads a local file with the entry, which turns the request into a
    /// multipart post.
    pub fn upload(mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.uploads.push(Part::file("file", file_name, bytes));
        self
    }

    /// Checks every attachment and flattens the entry into form parameters.
    pub fn to_params(&self) -> Result<Vec<(String, String)>, Error> {
        let mut params = vec![("body".to_string(), self.body.clone())];
        if !self.to.is_empty() {
            params.push(("to".to_string(), self.to.join(",")));
        }
        if let Some(link) = &self.link {
            params.push(("link".to_string(), link.clone()));
        }
        if let Some(comment) = &self.comment {
            params.push(("comment".to_string(), comment.clone()));
        }
        for (kind, values) in [
            (AttachmentKind::Image, &self.images),
            (AttachmentKind::Audio, &self.audio),
            (AttachmentKind::File, &self.files),
        ] {
            for (n, value) in values.iter().enumerate() {
                let attachment = Attachment::from_json(kind, value)?;
                params.push((format!("{}{}_url", kind.prefix(), n), attachment.url));
                if let Some(second) = attachment.second {
                    params.push((format!("{}{}_{}", kind.prefix(), n, kind.second()), second));
                }
            }
        }
        Ok(params)
    }

    pub(crate) fn into_body(self) -> Result<Body, Error> {
        let params = self.to_params()?;
        if self.uploads.is_empty() {
            return Ok(Body::Form(params));
        }
        let mut parts: Vec<Part> = params.into_iter().map(|(k, v)| Part::text(k, v)).collect();
        parts.extend(self.uploads);
        Ok(Body::Multipart(parts))
    }
}
