//! Post and comment list renderers.

use suspense_sdk::suspense_streaming::escape_html;

use crate::data::{Comment, Post};

/// Render a list of posts.
pub fn render_posts(posts: &[Post]) -> String {
    let items: String = posts.iter().map(render_post).collect();

    format!(
        r#"<div class="card posts">
    <h3>Posts</h3>
    {items}
</div>"#,
        items = items
    )
}

fn render_post(post: &Post) -> String {
    let date = match &post.date {
        Some(date) => format!(
            r#"<time datetime="{d}">{d}</time>"#,
            d = escape_html(date)
        ),
        None => String::new(),
    };

    format!(
        r#"<article class="post"><h4>{}</h4><p>{}</p>{}</article>"#,
        escape_html(&post.title),
        escape_html(&post.content),
        date
    )
}

/// Render a list of comments.
pub fn render_comments(comments: &[Comment]) -> String {
    let items: String = comments
        .iter()
        .map(|c| {
            format!(
                r#"<div class="comment"><p>{}</p><p class="comment-author">- {}</p></div>"#,
                escape_html(&c.text),
                escape_html(&c.author)
            )
        })
        .collect();

    format!(
        r#"<div class="card comments">
    <h3>Comments</h3>
    {items}
</div>"#,
        items = items
    )
}
