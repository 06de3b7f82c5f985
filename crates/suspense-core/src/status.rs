//! Section status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Observable status of a section.
///
/// A section starts `Pending` and moves to exactly one terminal status.
/// Only an explicit retry moves it back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    /// Producer has not settled yet.
    Pending,
    /// Producer resolved with data.
    Ready,
    /// Producer rejected with an error.
    Failed,
}

impl SectionStatus {
    /// Whether no further transition happens without a retry.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
