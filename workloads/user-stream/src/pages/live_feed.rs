//! Profile and posts fetched from the placeholder API.

use std::sync::Arc;

use anyhow::Context;
use suspense_sdk::suspense_core::ProducerError;
use suspense_sdk::suspense_data::{delayed, producer_fn, FetchClient, Producer};
use suspense_sdk::suspense_executor::SectionSpec;
use suspense_sdk::suspense_streaming::PageStreamer;

use super::{boundary, fail_first, page_shell, PageDefinition, PageKind, PageOptions};
use crate::data::{feed_posts, ApiPost, ApiUser, PageData};
use crate::sections::render_skeleton;

/// Build the live feed page.
///
/// The profile is fetched from `{api}/users/1` after
/// `live_profile_units` time units, posts from `{api}/posts?_limit=3`
/// after one. Both show a skeleton while pending.
pub fn live_feed(options: &PageOptions) -> PageDefinition {
    let kind = PageKind::LiveFeed;
    let shell = page_shell(
        kind,
        "",
        &[
            "Each async section is wrapped in its own boundary with a loading state",
            "Sections are streamed as soon as their data is ready",
            "Several sections load in parallel",
            "Every boundary loads and fails independently",
        ],
    );

    let mut client = FetchClient::new().with_base_url(options.api_base.as_str());
    if let Some(agent) = &options.user_agent {
        client = client.with_user_agent(agent.as_str());
    }

    let profile_client = client.clone();
    let profile: Arc<dyn Producer<PageData>> = Arc::new(producer_fn(move || {
        let client = profile_client.clone();
        async move {
            let user = client
                .get_json::<ApiUser>("/users/1")
                .await
                .context("Failed to fetch user data")?;
            Ok::<_, ProducerError>(PageData::Profile(user.into()))
        }
    }));

    let today = options.today;
    let posts: Arc<dyn Producer<PageData>> = Arc::new(producer_fn(move || {
        let client = client.clone();
        async move {
            let posts = client
                .get_json::<Vec<ApiPost>>("/posts?_limit=3")
                .await
                .context("Failed to fetch posts")?;
            Ok::<_, ProducerError>(PageData::Posts(feed_posts(posts, today)))
        }
    }));

    let streamer = PageStreamer::new(kind.name(), shell)
        .with_boundary(boundary("profile", render_skeleton()))
        .with_boundary(boundary("posts", render_skeleton()));

    let section = |id: &str, units: u32, producer: Arc<dyn Producer<PageData>>| {
        let producer = if options.fails(id) {
            Arc::new(fail_first(producer)) as Arc<dyn Producer<PageData>>
        } else {
            producer
        };
        SectionSpec::new(id, delayed(options.units(units), producer))
    };

    let specs = vec![
        section("profile", options.live_profile_units, profile),
        section("posts", 1, posts),
    ];

    PageDefinition {
        kind,
        streamer,
        specs,
    }
}
