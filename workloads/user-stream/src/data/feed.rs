//! Posts and comments.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Characters of a post body kept in the feed preview.
pub const PREVIEW_CHARS: usize = 100;

/// A blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u32,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A comment left on the user's posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u32,
    pub text: String,
    pub author: String,
}

/// Post as returned by the placeholder API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPost {
    pub id: u32,
    pub title: String,
    pub body: String,
}

/// Mock posts for the profile stream.
pub fn mock_posts() -> Vec<Post> {
    [
        (1, "My first blog post", "This is the user's very first blog post..."),
        (2, "Tech notes", "Sharing a few things learned at work today..."),
        (3, "Study notes", "Notes on streaming rendering and suspense..."),
    ]
    .into_iter()
    .map(|(id, title, content)| Post {
        id,
        title: title.to_string(),
        content: content.to_string(),
        date: None,
    })
    .collect()
}

/// Mock comments for the profile stream.
pub fn mock_comments() -> Vec<Comment> {
    [
        (1, "Great write-up!", "Commenter 1"),
        (2, "Learned a lot, thanks", "Commenter 2"),
        (3, "Looking forward to more", "Commenter 3"),
    ]
    .into_iter()
    .map(|(id, text, author)| Comment {
        id,
        text: text.to_string(),
        author: author.to_string(),
    })
    .collect()
}

/// Shape API posts for the live feed.
///
/// Content is the first [`PREVIEW_CHARS`] characters of the body plus an
/// ellipsis; post `i` is dated `i` days before `today`.
pub fn feed_posts(posts: Vec<ApiPost>, today: NaiveDate) -> Vec<Post> {
    posts
        .into_iter()
        .enumerate()
        .map(|(index, post)| {
            let preview: String = post.body.chars().take(PREVIEW_CHARS).collect();
            let date = today
                .checked_sub_days(Days::new(index as u64))
                .unwrap_or(today);
            Post {
                id: post.id,
                title: post.title,
                content: format!("{}...", preview),
                date: Some(date.format("%Y-%m-%d").to_string()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_posts_truncate_and_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let posts = feed_posts(
            vec![
                ApiPost {
                    id: 1,
                    title: "first".into(),
                    body: "x".repeat(150),
                },
                ApiPost {
                    id: 2,
                    title: "second".into(),
                    body: "short".into(),
                },
            ],
            today,
        );

        assert_eq!(posts[0].content.chars().count(), PREVIEW_CHARS + 3);
        assert!(posts[0].content.ends_with("..."));
        assert_eq!(posts[0].date.as_deref(), Some("2024-03-01"));
        assert_eq!(posts[1].content, "short...");
        assert_eq!(posts[1].date.as_deref(), Some("2024-02-29"));
    }

    #[test]
    fn test_mock_records() {
        assert_eq!(mock_posts().len(), 3);
        assert_eq!(mock_comments()[2].author, "Commenter 3");
    }
}
