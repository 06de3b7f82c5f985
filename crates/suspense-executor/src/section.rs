//! Section specs, states and transitions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use suspense_core::{ProducerError, SectionId, SectionStatus, SessionId};
use suspense_data::Producer;

/// A section to register with a session: an id plus its producer.
pub struct SectionSpec<T> {
    pub(crate) id: SectionId,
    pub(crate) producer: Arc<dyn Producer<T>>,
}

impl<T> SectionSpec<T> {
    /// Create a section spec.
    pub fn new<P>(id: impl Into<SectionId>, producer: P) -> Self
    where
        P: Producer<T> + 'static,
    {
        Self {
            id: id.into(),
            producer: Arc::new(producer),
        }
    }

    /// The section id.
    pub fn id(&self) -> &SectionId {
        &self.id
    }
}

impl<T> fmt::Debug for SectionSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionSpec").field("id", &self.id).finish()
    }
}

/// Current state of a section, with its payload once settled.
#[derive(Debug)]
pub enum SectionState<T> {
    /// Producer has not settled yet.
    Pending,
    /// Producer resolved.
    Ready(Arc<T>),
    /// Producer rejected.
    Failed(ProducerError),
}

impl<T> SectionState<T> {
    /// The status tag.
    pub fn status(&self) -> SectionStatus {
        match self {
            Self::Pending => SectionStatus::Pending,
            Self::Ready(_) => SectionStatus::Ready,
            Self::Failed(_) => SectionStatus::Failed,
        }
    }

    /// Resolved data, if ready.
    pub fn data(&self) -> Option<&Arc<T>> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    /// Producer error, if failed.
    pub fn error(&self) -> Option<&ProducerError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> Clone for SectionState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Pending => Self::Pending,
            Self::Ready(data) => Self::Ready(Arc::clone(data)),
            Self::Failed(err) => Self::Failed(err.clone()),
        }
    }
}

/// Terminal result of one producer invocation.
#[derive(Debug)]
pub enum Outcome<T> {
    Ready(Arc<T>),
    Failed(ProducerError),
}

impl<T> Outcome<T> {
    /// The terminal status this outcome maps to.
    pub fn status(&self) -> SectionStatus {
        match self {
            Self::Ready(_) => SectionStatus::Ready,
            Self::Failed(_) => SectionStatus::Failed,
        }
    }

    pub(crate) fn to_state(&self) -> SectionState<T> {
        match self {
            Self::Ready(data) => SectionState::Ready(Arc::clone(data)),
            Self::Failed(err) => SectionState::Failed(err.clone()),
        }
    }
}

impl<T> Clone for Outcome<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready(data) => Self::Ready(Arc::clone(data)),
            Self::Failed(err) => Self::Failed(err.clone()),
        }
    }
}

impl<T> From<Result<T, ProducerError>> for Outcome<T> {
    fn from(result: Result<T, ProducerError>) -> Self {
        match result {
            Ok(data) => Self::Ready(Arc::new(data)),
            Err(err) => Self::Failed(err),
        }
    }
}

/// A section leaving `Pending`.
#[derive(Debug)]
pub struct Transition<T> {
    /// Session the section belongs to.
    pub session: SessionId,
    /// The section that settled.
    pub section: SectionId,
    /// 1 for the first invocation, incremented by every retry.
    pub attempt: u32,
    /// What the producer settled with.
    pub outcome: Outcome<T>,
    /// Time from invocation to settlement.
    pub elapsed: Duration,
    /// Position in the session's delivery order, starting at 0.
    pub sequence: u64,
}

impl<T> Transition<T> {
    /// The terminal status reached.
    pub fn status(&self) -> SectionStatus {
        self.outcome.status()
    }
}

impl<T> Clone for Transition<T> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            section: self.section.clone(),
            attempt: self.attempt,
            outcome: self.outcome.clone(),
            elapsed: self.elapsed,
            sequence: self.sequence,
        }
    }
}
