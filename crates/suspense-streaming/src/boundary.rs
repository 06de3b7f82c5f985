//! Loading boundaries.

use std::fmt;
use std::sync::Arc;

use suspense_core::{ProducerError, SectionId, SectionStatus};
use suspense_executor::{Outcome, SectionState};

use crate::swap::escape_html;

/// Renders a section's data to HTML.
pub type ContentRenderer<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Renders a failed section to HTML.
pub type ErrorRenderer = Arc<dyn Fn(&SectionId, &ProducerError) -> String + Send + Sync>;

/// What a boundary currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryView {
    /// Section is pending.
    Placeholder(String),
    /// Section is ready.
    Content(String),
    /// Section failed.
    Error(String),
}

impl BoundaryView {
    /// The HTML to display.
    pub fn html(&self) -> &str {
        match self {
            Self::Placeholder(html) | Self::Content(html) | Self::Error(html) => html,
        }
    }

    /// The status this view corresponds to.
    pub fn status(&self) -> SectionStatus {
        match self {
            Self::Placeholder(_) => SectionStatus::Pending,
            Self::Content(_) => SectionStatus::Ready,
            Self::Error(_) => SectionStatus::Failed,
        }
    }
}

/// A loading boundary wrapped around one section.
pub struct Boundary<T> {
    id: SectionId,
    placeholder: String,
    render: ContentRenderer<T>,
    error_view: ErrorRenderer,
}

impl<T> Boundary<T> {
    /// Create a boundary with the default error view.
    pub fn new<F>(id: impl Into<SectionId>, placeholder: impl Into<String>, render: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            placeholder: placeholder.into(),
            render: Arc::new(render),
            error_view: Arc::new(default_error_view),
        }
    }

    /// Use a custom error view.
    pub fn with_error_view<F>(mut self, view: F) -> Self
    where
        F: Fn(&SectionId, &ProducerError) -> String + Send + Sync + 'static,
    {
        self.error_view = Arc::new(view);
        self
    }

    /// The section this boundary wraps.
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    /// Placeholder HTML shown while pending.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// View for the section's current state.
    pub fn present(&self, state: &SectionState<T>) -> BoundaryView {
        match state {
            SectionState::Pending => BoundaryView::Placeholder(self.placeholder.clone()),
            SectionState::Ready(data) => BoundaryView::Content((self.render)(&**data)),
            SectionState::Failed(err) => BoundaryView::Error((self.error_view)(&self.id, err)),
        }
    }

    /// View for a settled outcome.
    pub fn render_outcome(&self, outcome: &Outcome<T>) -> BoundaryView {
        match outcome {
            Outcome::Ready(data) => BoundaryView::Content((self.render)(&**data)),
            Outcome::Failed(err) => BoundaryView::Error((self.error_view)(&self.id, err)),
        }
    }
}

impl<T> Clone for Boundary<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            placeholder: self.placeholder.clone(),
            render: Arc::clone(&self.render),
            error_view: Arc::clone(&self.error_view),
        }
    }
}

impl<T> fmt::Debug for Boundary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Boundary")
            .field("id", &self.id)
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

/// Error message plus a retry control tagged with the section id.
pub fn default_error_view(id: &SectionId, err: &ProducerError) -> String {
    format!(
        r#"<div class="section-error" role="alert"><p>Error: {}</p><button type="button" data-retry-section="{}">Retry</button></div>"#,
        escape_html(err.message()),
        escape_html(id.as_str())
    )
}
