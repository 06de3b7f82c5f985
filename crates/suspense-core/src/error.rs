//! Error taxonomy shared across crates.

use crate::ids::SectionId;

/// An error produced by a section's producer.
///
/// Producer errors are contained at the section boundary: they become the
/// section's `Failed` payload and never propagate to siblings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProducerError {
    message: String,
}

impl ProducerError {
    /// Create a producer error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for ProducerError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{:#}", err))
    }
}

impl From<&str> for ProducerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ProducerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// A retry or status query referenced a section that is not in the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown section '{id}'")]
pub struct InvalidSectionError {
    /// The id that was not found.
    pub id: SectionId,
}

impl InvalidSectionError {
    /// Create an error for the given id.
    pub fn new(id: impl Into<SectionId>) -> Self {
        Self { id: id.into() }
    }
}

/// Error type for coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    InvalidSection(#[from] InvalidSectionError),

    #[error("Section '{0}' declared more than once")]
    DuplicateSection(SectionId),

    #[error("No async runtime available to run section producers")]
    NoRuntime,
}

/// Error type for the streaming sink.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Shell not sent before sections")]
    ShellNotSent,

    #[error("Shell already sent")]
    ShellAlreadySent,

    #[error("Stream already completed")]
    AlreadyCompleted,

    #[error("Transport error: {0}")]
    Transport(String),
}
