mod record;
pub use self::record::{Fields, Record};

mod feed;
pub use self::feed::{Feed, FeedList, FeedType, Section, Service};

mod entry;
pub use self::entry::{Comment, Entry, File, Fof, FofType, Like, Thumbnail, Via};
