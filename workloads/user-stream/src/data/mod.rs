//! Data models for the user pages.

mod feed;
mod profile;

pub use feed::*;
pub use profile::*;

/// Payload of any section on the user pages.
#[derive(Debug, Clone, PartialEq)]
pub enum PageData {
    Profile(UserProfile),
    Posts(Vec<Post>),
    Comments(Vec<Comment>),
}
