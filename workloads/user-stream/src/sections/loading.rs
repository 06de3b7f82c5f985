//! Placeholders shown while sections are pending.

use suspense_sdk::suspense_streaming::escape_html;

/// Spinner with a loading message.
pub fn render_spinner(message: &str) -> String {
    format!(
        r#"<div class="loading"><div class="spinner"></div><span>{}</span></div>"#,
        escape_html(message)
    )
}

/// Skeleton card mimicking a profile and a short list.
pub fn render_skeleton() -> String {
    let rows: String = (0..3)
        .map(|_| {
            r#"<div class="skeleton-row"><div class="bar w-3-4"></div><div class="bar w-full"></div><div class="bar w-1-4"></div></div>"#
        })
        .collect();

    format!(
        r#"<div class="skeleton" aria-busy="true">
    <div class="skeleton-head"><div class="circle"></div><div class="bar w-24"></div></div>
    {}
</div>"#,
        rows
    )
}
