//! Section renderers for the user pages.

mod feed;
mod loading;
mod profile;

pub use feed::*;
pub use loading::*;
pub use profile::*;

use suspense_sdk::suspense_core::{ProducerError, SectionId};
use suspense_sdk::suspense_streaming::escape_html;

use crate::data::PageData;

/// Render any section payload.
pub fn render_page_data(data: &PageData) -> String {
    match data {
        PageData::Profile(user) => render_profile(user),
        PageData::Posts(posts) => render_posts(posts),
        PageData::Comments(comments) => render_comments(comments),
    }
}

/// Error view with a retry control for one section.
pub fn render_error(id: &SectionId, err: &ProducerError) -> String {
    format!(
        r#"<div class="card card--error" role="alert">
    <h3>Failed to load</h3>
    <p class="error-message">{message}</p>
    <button type="button" class="btn-retry" data-retry-section="{id}">Retry</button>
</div>"#,
        message = escape_html(err.message()),
        id = escape_html(id.as_str())
    )
}
