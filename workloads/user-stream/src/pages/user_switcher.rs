//! A profile section re-fetched for whichever user is selected.

use std::ops::RangeInclusive;
use std::sync::Arc;

use suspense_sdk::suspense_core::InvalidSectionError;
use suspense_sdk::suspense_executor::{SessionHandle, StreamingFetchCoordinator};
use suspense_sdk::suspense_streaming::PageStreamer;
use tracing::info;

use super::{
    boundary, mock_section, page_shell, LaunchedPage, PageDefinition, PageError, PageKind,
    PageOptions,
};
use crate::data::{PageData, UserProfile};
use crate::sections::render_spinner;

/// Users that can be selected.
pub const USER_IDS: RangeInclusive<u32> = 1..=5;

/// Which user is currently selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSelection {
    selected: u32,
}

impl UserSelection {
    /// Start with `user_id` selected.
    pub fn new(user_id: u32) -> Result<Self, PageError> {
        check_user(user_id)?;
        Ok(Self { selected: user_id })
    }

    /// The selected user.
    pub fn selected(&self) -> u32 {
        self.selected
    }

    /// Select `user_id`. Returns whether the selection changed.
    pub fn select(&mut self, user_id: u32) -> Result<bool, PageError> {
        check_user(user_id)?;
        if user_id == self.selected {
            return Ok(false);
        }
        self.selected = user_id;
        Ok(true)
    }
}

impl Default for UserSelection {
    fn default() -> Self {
        Self {
            selected: *USER_IDS.start(),
        }
    }
}

fn check_user(user_id: u32) -> Result<(), PageError> {
    if USER_IDS.contains(&user_id) {
        Ok(())
    } else {
        Err(PageError::UserOutOfRange(user_id))
    }
}

/// Build the user switcher page for `options.user_id`.
pub fn user_switcher(options: &PageOptions) -> Result<PageDefinition, PageError> {
    let selection = UserSelection::new(options.user_id)?;
    let kind = PageKind::UserSwitcher;

    let buttons: String = USER_IDS
        .map(|id| {
            let class = if id == selection.selected() {
                "user-button user-button--active"
            } else {
                "user-button"
            };
            format!(r#"<a class="{}" href="?user={}">User {}</a>"#, class, id, id)
        })
        .collect();
    let intro = format!(
        r#"<p class="intro">Pick a user below. Every switch starts a new fetch and the profile shows a loading state until it resolves.</p>
    <nav class="user-buttons">{}</nav>"#,
        buttons
    );

    let shell = page_shell(
        kind,
        &intro,
        &[
            "Pending sections show their fallback content",
            "Sections render automatically once their data arrives",
            "Failures are contained by the section's error view",
            "Retrying reloads only the failed section",
        ],
    );

    let streamer = PageStreamer::new(kind.name(), shell)
        .with_boundary(boundary("profile", render_spinner("Loading user data...")));

    let profile = UserProfile::mock(selection.selected())
        .with_join_date(options.today.format("%Y-%m-%d").to_string());
    let specs = vec![mock_section(
        "profile",
        options.units(1),
        PageData::Profile(profile),
        options,
    )];

    Ok(PageDefinition {
        kind,
        streamer,
        specs,
    })
}

/// Page controller owning the user selection and the live session.
///
/// Selecting another user launches a fresh session; the previous one is
/// dropped and whatever it still produces is ignored.
#[derive(Debug)]
pub struct UserSwitcher {
    coordinator: Arc<StreamingFetchCoordinator>,
    options: PageOptions,
    selection: UserSelection,
    page: LaunchedPage,
}

impl UserSwitcher {
    /// Launch the page for `options.user_id`.
    pub fn new(
        coordinator: Arc<StreamingFetchCoordinator>,
        options: PageOptions,
    ) -> Result<Self, PageError> {
        let selection = UserSelection::new(options.user_id)?;
        let page = user_switcher(&options)?.launch(&coordinator)?;
        Ok(Self {
            coordinator,
            options,
            selection,
            page,
        })
    }

    /// The selected user.
    pub fn selected(&self) -> u32 {
        self.selection.selected()
    }

    /// Session of the selected user.
    pub fn session(&self) -> &SessionHandle<PageData> {
        &self.page.session
    }

    /// The running page.
    pub fn page(&self) -> &LaunchedPage {
        &self.page
    }

    /// Switch to `user_id`. Returns whether a new session was started.
    pub fn select(&mut self, user_id: u32) -> Result<bool, PageError> {
        let mut selection = self.selection;
        if !selection.select(user_id)? {
            return Ok(false);
        }

        let options = self.options.clone().with_user(user_id);
        let page = user_switcher(&options)?.launch(&self.coordinator)?;
        info!(user = user_id, session = %page.session.id(), "user selected");

        self.selection = selection;
        self.options = options;
        self.page = page;
        Ok(true)
    }

    /// Re-fetch the profile of the selected user.
    pub fn retry(&self) -> Result<(), InvalidSectionError> {
        self.page.session.retry("profile")
    }
}
