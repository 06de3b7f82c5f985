//! Profile, posts and comments streamed as they become ready.

use super::{boundary, mock_section, page_shell, PageDefinition, PageKind, PageOptions};
use crate::data::{mock_comments, mock_posts, PageData, UserProfile};
use crate::sections::render_spinner;
use suspense_sdk::suspense_streaming::PageStreamer;

/// Build the profile stream page.
///
/// The profile settles after one time unit, posts after two and
/// comments after three; each shows its own spinner until then.
pub fn profile_stream(options: &PageOptions) -> PageDefinition {
    let kind = PageKind::ProfileStream;
    let shell = page_shell(
        kind,
        "",
        &[
            "The server sends the page structure (HTML shell) immediately",
            "The profile finishes first and is sent to the client at once",
            "Posts follow as part of the same stream",
            "Comments arrive last and complete the page",
            "The client shows content progressively without waiting for all data",
        ],
    );

    let streamer = PageStreamer::new(kind.name(), shell)
        .with_boundary(boundary("profile", render_spinner("Loading profile...")))
        .with_boundary(boundary("posts", render_spinner("Loading posts...")))
        .with_boundary(boundary("comments", render_spinner("Loading comments...")));

    let specs = vec![
        mock_section(
            "profile",
            options.units(1),
            PageData::Profile(UserProfile::mock(options.user_id)),
            options,
        ),
        mock_section("posts", options.units(2), PageData::Posts(mock_posts()), options),
        mock_section(
            "comments",
            options.units(3),
            PageData::Comments(mock_comments()),
            options,
        ),
    ];

    PageDefinition {
        kind,
        streamer,
        specs,
    }
}
