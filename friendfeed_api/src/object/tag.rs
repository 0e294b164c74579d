//! Data type tags and the derivations each one triggers.

use std::fmt;

/// Label stamped on an [`Object`](super::Object) that says what kind of API
/// resource it represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Feed,
    Entry,
    Comment,
    Like,
    Thumbnail,
    File,
    Via,
    FoF,
    Service,
    FeedList,
    Section,
}

/// One declarative derivation applied to a set of fields.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Rule {
    /// Adds a `key?` predicate reporting the field's truthiness.
    Boolean(&'static [&'static str]),
    /// Adds a predicate named after the field's normalized value.
    Enum(&'static [&'static str]),
    /// Parses the field into a timestamp.
    Time(&'static [&'static str]),
    /// Parses the field into a URI.
    Uri(&'static [&'static str]),
    /// Tags a nested object.
    Nested(DataType, &'static [&'static str]),
    /// Tags every object in a nested sequence.
    ArrayOf(DataType, &'static [&'static str]),
}

impl DataType {
    /// Every tag, in declaration order.
    pub const ALL: [DataType; 11] = [
        DataType::Feed,
        DataType::Entry,
        DataType::Comment,
        DataType::Like,
        DataType::Thumbnail,
        DataType::File,
        DataType::Via,
        DataType::FoF,
        DataType::Service,
        DataType::FeedList,
        DataType::Section,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DataType::Feed => "Feed",
            DataType::Entry => "Entry",
            DataType::Comment => "Comment",
            DataType::Like => "Like",
            DataType::Thumbnail => "Thumbnail",
            DataType::File => "File",
            DataType::Via => "Via",
            DataType::FoF => "FoF",
            DataType::Service => "Service",
            DataType::FeedList => "FeedList",
            DataType::Section => "Section",
        }
    }

    pub(crate) fn rules(self) -> &'static [Rule] {
        use Rule::*;
        match self {
            DataType::Feed => &[
                Enum(&["type"]),
                Boolean(&["private"]),
                ArrayOf(DataType::Entry, &["entries"]),
                ArrayOf(
                    DataType::Feed,
                    &["subscriptions", "subscribers", "admins", "feeds"],
                ),
                ArrayOf(DataType::Service, &["services"]),
            ],
            DataType::Entry => &[
                Uri(&["url", "short_url"]),
                Time(&["date"]),
                Nested(DataType::Feed, &["from"]),
                ArrayOf(DataType::Feed, &["to"]),
                ArrayOf(DataType::Comment, &["comments"]),
                ArrayOf(DataType::Like, &["likes"]),
                ArrayOf(DataType::Thumbnail, &["thumbnails"]),
                ArrayOf(DataType::File, &["files"]),
                Nested(DataType::Via, &["via"]),
                Nested(DataType::FoF, &["fof"]),
                Boolean(&["created", "updated"]),
            ],
            DataType::Comment => &[
                Time(&["date"]),
                Nested(DataType::Feed, &["from"]),
                Nested(DataType::Via, &["via"]),
                Boolean(&["placeholder", "created", "updated"]),
            ],
            DataType::Thumbnail => &[Uri(&["url", "link"])],
            DataType::File => &[Uri(&["url", "icon"])],
            DataType::Like => &[
                Time(&["date"]),
                Nested(DataType::Feed, &["from"]),
                Boolean(&["created", "updated"]),
            ],
            DataType::Via => &[Uri(&["url"])],
            DataType::FoF => &[Enum(&["type"]), Nested(DataType::Feed, &["from"])],
            DataType::Service => &[Enum(&["id"]), Uri(&["url", "icon", "profile"])],
            DataType::FeedList => &[
                ArrayOf(DataType::Feed, &["main", "lists", "groups", "searches"]),
                ArrayOf(DataType::Section, &["sections"]),
            ],
            DataType::Section => &[Enum(&["id"]), ArrayOf(DataType::Feed, &["feeds"])],
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
