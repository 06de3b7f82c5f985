//! Page definitions: shell, boundaries and section producers.

mod live_feed;
mod profile_stream;
mod user_switcher;

pub use live_feed::*;
pub use profile_stream::*;
pub use user_switcher::*;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use suspense_sdk::suspense_core::{CoordinatorError, ProducerError, SectionId};
use suspense_sdk::suspense_data::{delayed, producer_fn, ready_after, Producer, Scripted};
use suspense_sdk::suspense_executor::{SectionSpec, SessionHandle, StreamingFetchCoordinator};
use suspense_sdk::suspense_streaming::{escape_html, Boundary, HeadContent, PageStreamer, Shell};

use crate::data::PageData;
use crate::sections::{render_error, render_page_data};
use crate::{API_BASE, PAGE_STYLES};

/// Error message of an injected section failure.
pub const INJECTED_FAILURE: &str = "HTTP error! status: 500";

/// Errors building or driving a page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Unknown page '{0}' (expected one of: profile-stream, user-switcher, live-feed)")]
    UnknownPage(String),

    #[error("Page '{page}' has no section '{section}'")]
    UnknownSection { page: &'static str, section: String },

    #[error("User {0} is out of range (expected {min}-{max})", min = USER_IDS.start(), max = USER_IDS.end())]
    UserOutOfRange(u32),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

/// The demo pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// Profile, posts and comments with staggered latency.
    ProfileStream,
    /// One profile section, re-fetched whenever another user is selected.
    UserSwitcher,
    /// Profile and posts fetched from the placeholder API.
    LiveFeed,
}

impl PageKind {
    /// Every page, in listing order.
    pub const ALL: [PageKind; 3] = [Self::ProfileStream, Self::UserSwitcher, Self::LiveFeed];

    /// Route name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProfileStream => "profile-stream",
            Self::UserSwitcher => "user-switcher",
            Self::LiveFeed => "live-feed",
        }
    }

    /// Page title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::ProfileStream => "Server-side streaming demo",
            Self::UserSwitcher => "Suspense demo",
            Self::LiveFeed => "Suspense demo",
        }
    }

    /// One-line description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ProfileStream => "Profile, posts and comments resolve after 1, 2 and 3 time units",
            Self::UserSwitcher => "Select a user to fetch their profile into a fresh session",
            Self::LiveFeed => "A slow profile and fast posts fetched from the placeholder API",
        }
    }

    /// Section ids, in layout order.
    pub fn sections(&self) -> &'static [&'static str] {
        match self {
            Self::ProfileStream => &["profile", "posts", "comments"],
            Self::UserSwitcher => &["profile"],
            Self::LiveFeed => &["profile", "posts"],
        }
    }

    /// Build the page for `options`.
    pub fn build(&self, options: &PageOptions) -> Result<PageDefinition, PageError> {
        for section in &options.fail {
            if !self.sections().contains(&section.as_str()) {
                return Err(PageError::UnknownSection {
                    page: self.name(),
                    section: section.clone(),
                });
            }
        }

        match self {
            Self::ProfileStream => Ok(profile_stream(options)),
            Self::UserSwitcher => user_switcher(options),
            Self::LiveFeed => Ok(live_feed(options)),
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PageKind {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| PageError::UnknownPage(s.to_string()))
    }
}

/// Knobs shared by every page.
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Length of one latency unit.
    pub time_unit: Duration,
    /// User shown by the profile sections.
    pub user_id: u32,
    /// Sections whose first invocation fails with [`INJECTED_FAILURE`].
    pub fail: BTreeSet<String>,
    /// Base URL of the placeholder API.
    pub api_base: String,
    /// User agent for API requests.
    pub user_agent: Option<String>,
    /// Live feed profile latency, in time units.
    pub live_profile_units: u32,
    /// Date used for join dates and feed dates.
    pub today: NaiveDate,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            time_unit: Duration::from_secs(1),
            user_id: 1,
            fail: BTreeSet::new(),
            api_base: API_BASE.to_string(),
            user_agent: None,
            live_profile_units: 10,
            today: Local::now().date_naive(),
        }
    }
}

impl PageOptions {
    /// Set the latency unit.
    pub fn with_time_unit(mut self, unit: Duration) -> Self {
        self.time_unit = unit;
        self
    }

    /// Set the user.
    pub fn with_user(mut self, user_id: u32) -> Self {
        self.user_id = user_id;
        self
    }

    /// Make a section fail on its first invocation.
    pub fn with_failure(mut self, section: impl Into<String>) -> Self {
        self.fail.insert(section.into());
        self
    }

    /// Set the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the API user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the live feed profile latency.
    pub fn with_live_profile_units(mut self, units: u32) -> Self {
        self.live_profile_units = units;
        self
    }

    /// Fix the current date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// `n` latency units.
    pub fn units(&self, n: u32) -> Duration {
        self.time_unit * n
    }

    /// Whether `section` has an injected failure.
    pub fn fails(&self, section: &str) -> bool {
        self.fail.contains(section)
    }
}

/// A page ready to launch: its streamer plus one producer per section.
pub struct PageDefinition {
    kind: PageKind,
    streamer: PageStreamer<PageData>,
    specs: Vec<SectionSpec<PageData>>,
}

impl PageDefinition {
    /// Which page this is.
    pub fn kind(&self) -> PageKind {
        self.kind
    }

    /// Section ids, in layout order.
    pub fn section_ids(&self) -> Vec<SectionId> {
        self.specs.iter().map(|s| s.id().clone()).collect()
    }

    /// The page streamer.
    pub fn streamer(&self) -> &PageStreamer<PageData> {
        &self.streamer
    }

    /// Start a session: every section producer is launched immediately.
    pub fn launch(self, coordinator: &StreamingFetchCoordinator) -> Result<LaunchedPage, PageError> {
        let session = coordinator.start_session(self.specs)?;
        Ok(LaunchedPage {
            kind: self.kind,
            session,
            streamer: self.streamer,
        })
    }
}

impl fmt::Debug for PageDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageDefinition")
            .field("kind", &self.kind)
            .field("specs", &self.specs)
            .finish()
    }
}

/// A page whose session is running.
#[derive(Debug)]
pub struct LaunchedPage {
    pub kind: PageKind,
    pub session: SessionHandle<PageData>,
    pub streamer: PageStreamer<PageData>,
}

/// Boundary rendering any page payload, with the page error view.
fn boundary(id: &str, placeholder: String) -> Boundary<PageData> {
    Boundary::new(id, placeholder, render_page_data).with_error_view(render_error)
}

/// A mock section resolving with `data` after `delay`.
fn mock_section(
    id: &str,
    delay: Duration,
    data: PageData,
    options: &PageOptions,
) -> SectionSpec<PageData> {
    if options.fails(id) {
        SectionSpec::new(id, delayed(delay, Scripted::fail_then(INJECTED_FAILURE, data)))
    } else {
        SectionSpec::new(id, ready_after(delay, data))
    }
}

/// Wrap `inner` so its first invocation fails with [`INJECTED_FAILURE`].
fn fail_first(inner: Arc<dyn Producer<PageData>>) -> impl Producer<PageData> {
    let fired = Arc::new(AtomicBool::new(false));
    producer_fn(move || {
        let inner = Arc::clone(&inner);
        let first = !fired.swap(true, Ordering::SeqCst);
        async move {
            if first {
                return Err(ProducerError::new(INJECTED_FAILURE));
            }
            inner.produce().await
        }
    })
}

/// Shell shared by the pages: header, intro and the closing notes.
fn page_shell(kind: PageKind, intro: &str, notes: &[&str]) -> Shell {
    let notes: String = notes
        .iter()
        .map(|n| format!("<li>{}</li>", escape_html(n)))
        .collect();

    Shell::new(
        HeadContent::new(kind.title())
            .with_meta("viewport", "width=device-width, initial-scale=1")
            .with_style(PAGE_STYLES),
    )
    .with_body_start(format!(
        r#"<body>
<div class="page page--{name}">
    <h1>{title}</h1>
    {intro}
    <div class="sections">
"#,
        name = kind.name(),
        title = escape_html(kind.title()),
        intro = intro
    ))
    .with_body_end(format!(
        r#"    </div>
    <div class="notes">
        <h3>How it works</h3>
        <ul>{notes}</ul>
    </div>
</div>
</body>
</html>"#,
        notes = notes
    ))
}
