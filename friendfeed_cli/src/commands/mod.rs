pub mod entry;
pub mod feed;
pub mod feedinfo;
pub mod feedlist;
pub mod post;
pub mod short;
pub mod token;
pub mod validate;
