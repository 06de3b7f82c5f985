//! The streaming fetch coordinator.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use suspense_core::{
    CoordinatorError, InvalidSectionError, SectionId, SectionStatus, SessionId,
};
use tokio::runtime::Handle;
use tracing::info;

use crate::section::{SectionSpec, Transition};
use crate::session::{SessionHandle, SessionShared, SubscriptionId};

/// Launches independent sections and surfaces each completion on its own.
///
/// Every producer is spawned when the session starts, so a slow section
/// never gates a fast one. Failures stay inside the section that produced
/// them; retries are manual.
#[derive(Debug)]
pub struct StreamingFetchCoordinator {
    runtime: Handle,
    sessions_started: AtomicU64,
}

impl StreamingFetchCoordinator {
    /// Create a coordinator on the current tokio runtime.
    pub fn new() -> Result<Self, CoordinatorError> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|_| CoordinatorError::NoRuntime)
    }

    /// Create a coordinator that spawns producers on `runtime`.
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            sessions_started: AtomicU64::new(0),
        }
    }

    /// Start a session and invoke every producer concurrently.
    ///
    /// Returns as soon as the producers are spawned; none of them is
    /// awaited. Section ids must be unique within the session.
    pub fn start_session<T>(
        &self,
        sections: impl IntoIterator<Item = SectionSpec<T>>,
    ) -> Result<SessionHandle<T>, CoordinatorError>
    where
        T: Send + Sync + 'static,
    {
        let mut seen = HashSet::new();
        let mut registered = Vec::new();
        for spec in sections {
            if !seen.insert(spec.id.clone()) {
                return Err(CoordinatorError::DuplicateSection(spec.id));
            }
            registered.push((spec.id, spec.producer));
        }

        let id = SessionId::generate();
        info!(session = %id, sections = registered.len(), "session started");

        let shared = Arc::new(SessionShared::new(id, self.runtime.clone(), registered));
        shared.launch_all();
        self.sessions_started.fetch_add(1, Ordering::Relaxed);

        Ok(SessionHandle::new(shared))
    }

    /// Current status of a section. Never blocks.
    pub fn get_status<T>(
        &self,
        handle: &SessionHandle<T>,
        id: impl Into<SectionId>,
    ) -> Result<SectionStatus, InvalidSectionError>
    where
        T: Send + Sync + 'static,
    {
        handle.status(id)
    }

    /// Register a callback invoked once per transition.
    pub fn subscribe<T, F>(&self, handle: &SessionHandle<T>, callback: F) -> SubscriptionId
    where
        T: Send + Sync + 'static,
        F: Fn(&Transition<T>) + Send + Sync + 'static,
    {
        handle.subscribe(callback)
    }

    /// Re-invoke one section's producer, resetting it to `Pending`.
    pub fn retry<T>(
        &self,
        handle: &SessionHandle<T>,
        id: impl Into<SectionId>,
    ) -> Result<(), InvalidSectionError>
    where
        T: Send + Sync + 'static,
    {
        handle.retry(id)
    }

    /// Number of sessions started by this coordinator.
    pub fn sessions_started(&self) -> u64 {
        self.sessions_started.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use suspense_data::ready_after;

    use super::*;

    #[test]
    fn test_new_outside_runtime_fails() {
        assert!(matches!(
            StreamingFetchCoordinator::new(),
            Err(CoordinatorError::NoRuntime)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_section_rejected() {
        let coordinator = StreamingFetchCoordinator::new().unwrap();
        let result = coordinator.start_session(vec![
            SectionSpec::new("profile", ready_after(Duration::from_secs(1), 1u8)),
            SectionSpec::new("profile", ready_after(Duration::from_secs(2), 2u8)),
        ]);
        match result {
            Err(CoordinatorError::DuplicateSection(id)) => assert_eq!(id.as_str(), "profile"),
            other => panic!("expected duplicate section error, got {:?}", other),
        }
        assert_eq!(coordinator.sessions_started(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_session_is_complete() {
        let coordinator = StreamingFetchCoordinator::new().unwrap();
        let session = coordinator
            .start_session(Vec::<SectionSpec<u8>>::new())
            .unwrap();
        assert!(session.is_complete());
        session.settled().await;
        assert!(session.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_statuses_follow_declaration_order() {
        let coordinator = StreamingFetchCoordinator::new().unwrap();
        let session = coordinator
            .start_session(vec![
                SectionSpec::new("b", ready_after(Duration::from_secs(2), 2u8)),
                SectionSpec::new("a", ready_after(Duration::from_secs(1), 1u8)),
            ])
            .unwrap();

        let ids: Vec<String> = session
            .section_ids()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(session
            .statuses()
            .iter()
            .all(|(_, status)| *status == SectionStatus::Pending));
        assert_eq!(coordinator.get_status(&session, "a").unwrap(), SectionStatus::Pending);
    }
}
