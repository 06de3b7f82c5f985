//! Streaming a session as a progressively rendered page.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};
use std::sync::Arc;

use futures::{Sink, StreamExt};
use suspense_core::{LifecycleObserver, LifecyclePhase, SectionId, SectionStatus, StreamError};
use suspense_executor::{SectionState, SessionHandle};
use suspense_observability::{MetricsCollector, SessionMetrics};
use tracing::{debug, info, warn};

use crate::boundary::Boundary;
use crate::shell::Shell;
use crate::sink::StreamingSink;
use crate::swap::{placeholder_slot, resolved_chunk};

/// Result of streaming one page.
#[derive(Debug, Clone)]
pub struct PageReport {
    /// Timing metrics for the page.
    pub metrics: SessionMetrics,
    /// Sections in the order their resolved chunks were streamed.
    pub streamed: Vec<SectionId>,
}

/// Renders a session into a shell plus one swap chunk per transition.
pub struct PageStreamer<T> {
    name: String,
    shell: Shell,
    boundaries: Vec<Boundary<T>>,
    observer: Option<Arc<dyn LifecycleObserver>>,
}

impl<T> PageStreamer<T>
where
    T: Send + Sync + 'static,
{
    /// Create a page streamer. The swap runtime is added to the shell.
    pub fn new(name: impl Into<String>, shell: Shell) -> Self {
        Self {
            name: name.into(),
            shell: shell.with_swap_runtime(),
            boundaries: Vec::new(),
            observer: None,
        }
    }

    /// Add a boundary. Slots are laid out in the order boundaries are added.
    pub fn with_boundary(mut self, boundary: Boundary<T>) -> Self {
        self.boundaries.push(boundary);
        self
    }

    /// Notify an observer of lifecycle phases.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Page name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered boundaries.
    pub fn boundaries(&self) -> &[Boundary<T>] {
        &self.boundaries
    }

    /// The shell with a placeholder slot for every boundary in `session`.
    pub fn render_shell(&self, session: &SessionHandle<T>) -> String {
        let boundaries: Vec<_> = self.active_boundaries(session).collect();
        self.shell_with_slots(&boundaries)
    }

    /// Stream the page: shell first, then each section as it settles.
    ///
    /// Returns once every boundary's section has streamed the result of its
    /// latest attempt. Results superseded by a retry are never streamed. A
    /// section retried while the page is still streaming is streamed again
    /// and replaces its previous content.
    pub async fn stream<S>(
        &self,
        session: &SessionHandle<T>,
        sink: &mut StreamingSink<S>,
    ) -> Result<PageReport, StreamError>
    where
        S: Sink<Vec<u8>> + Unpin,
        S::Error: Display,
    {
        match self.run(session, sink).await {
            Ok(report) => Ok(report),
            Err(err) => {
                warn!(session = %session.id(), page = %self.name, error = %err, "page stream failed");
                self.notify(LifecyclePhase::Error(err.to_string()), sink);
                Err(err)
            }
        }
    }

    async fn run<S>(
        &self,
        session: &SessionHandle<T>,
        sink: &mut StreamingSink<S>,
    ) -> Result<PageReport, StreamError>
    where
        S: Sink<Vec<u8>> + Unpin,
        S::Error: Display,
    {
        let mut metrics = MetricsCollector::new(session.id().clone());
        metrics.set_page(self.name.as_str());

        let boundaries: Vec<&Boundary<T>> = self.active_boundaries(session).collect();
        let active: HashMap<&SectionId, &Boundary<T>> =
            boundaries.iter().map(|b| (b.id(), *b)).collect();
        let mut waiting: HashSet<&SectionId> = active.keys().copied().collect();
        let mut attempts: HashMap<SectionId, u32> = HashMap::new();
        let mut streamed = Vec::new();

        // Subscribing before the shell goes out loses nothing: the stream
        // replays what has already settled.
        let mut transitions = session.transitions();

        self.notify(LifecyclePhase::Start, sink);
        for boundary in &boundaries {
            metrics.record_section_start(boundary.id().as_str());
        }
        sink.send_shell(&self.shell_with_slots(&boundaries)).await?;
        metrics.record_shell_sent();
        self.notify(LifecyclePhase::ShellSent, sink);
        info!(session = %session.id(), page = %self.name, sections = active.len(), "shell sent");

        while !waiting.is_empty() {
            let Some(transition) = transitions.next().await else {
                break;
            };
            let Some(boundary) = active.get(&transition.section) else {
                debug!(section = %transition.section, "no boundary for section, skipping");
                continue;
            };

            // A retry issued since this transition makes it stale: the
            // section is pending again and its placeholder stays up.
            let current = session.attempts(&transition.section).unwrap_or(transition.attempt);
            if transition.attempt < current {
                debug!(
                    section = %transition.section,
                    attempt = transition.attempt,
                    current,
                    "skipping superseded transition"
                );
                continue;
            }

            let seen = attempts.entry(transition.section.clone()).or_insert(1);
            while *seen < transition.attempt {
                metrics.record_retry(transition.section.as_str());
                *seen += 1;
            }

            let view = boundary.render_outcome(&transition.outcome);
            let chunk = resolved_chunk(&transition.section, view.status(), view.html());
            sink.send_section(transition.section.as_str(), &chunk).await?;
            metrics.record_section_sent(
                transition.section.as_str(),
                Some(chunk.len()),
                transition.status() == SectionStatus::Failed,
            );
            self.notify(LifecyclePhase::SectionSent(transition.section.to_string()), sink);
            debug!(
                section = %transition.section,
                status = %transition.status(),
                attempt = transition.attempt,
                "section streamed"
            );

            waiting.remove(&transition.section);
            streamed.push(transition.section.clone());
        }

        sink.send_raw(self.shell.render_closing().into_bytes()).await?;
        sink.complete().await?;
        self.notify(LifecyclePhase::Completion, sink);

        let metrics = metrics.finalize();
        info!(
            session = %session.id(),
            page = %self.name,
            sections = streamed.len(),
            bytes = sink.bytes_sent(),
            "page streamed"
        );

        Ok(PageReport { metrics, streamed })
    }

    fn shell_with_slots(&self, boundaries: &[&Boundary<T>]) -> String {
        let mut html = self.shell.render_opening();
        for boundary in boundaries {
            let view = boundary.present(&SectionState::Pending);
            html.push_str(&placeholder_slot(boundary.id(), view.html()));
            html.push('\n');
        }
        html
    }

    fn active_boundaries<'a>(
        &'a self,
        session: &'a SessionHandle<T>,
    ) -> impl Iterator<Item = &'a Boundary<T>> + 'a {
        self.boundaries.iter().filter(move |b| {
            let known = session.contains(b.id());
            if !known {
                warn!(section = %b.id(), page = %self.name, "boundary has no section in session");
            }
            known
        })
    }

    fn notify<S>(&self, phase: LifecyclePhase, sink: &StreamingSink<S>)
    where
        S: Sink<Vec<u8>> + Unpin,
        S::Error: Display,
    {
        if let Some(observer) = &self.observer {
            observer.on_phase(phase, sink.timing().elapsed());
        }
    }
}

impl<T> fmt::Debug for PageStreamer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageStreamer")
            .field("name", &self.name)
            .field("boundaries", &self.boundaries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use suspense_core::TimingContext;
    use suspense_data::{delayed, ready_after, Scripted};
    use suspense_executor::{SectionSpec, StreamingFetchCoordinator};

    use super::*;
    use crate::shell::HeadContent;

    const UNIT: Duration = Duration::from_secs(1);

    #[derive(Default)]
    struct Phases(Mutex<Vec<LifecyclePhase>>);

    impl LifecycleObserver for Phases {
        fn on_phase(&self, phase: LifecyclePhase, _elapsed: Duration) {
            self.0.lock().unwrap().push(phase);
        }
    }

    fn streamer() -> PageStreamer<String> {
        let boundary = |id: &str| {
            Boundary::new(id, format!("<p>Loading {}...</p>", id), |s: &String| {
                format!("<p>{}</p>", s)
            })
        };
        PageStreamer::new("profile-stream", Shell::new(HeadContent::new("Profile")))
            .with_boundary(boundary("profile"))
            .with_boundary(boundary("posts"))
            .with_boundary(boundary("comments"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_streams_sections_in_settle_order() {
        let coordinator = StreamingFetchCoordinator::new().unwrap();
        let session = coordinator
            .start_session(vec![
                SectionSpec::new("comments", ready_after(UNIT * 3, "c".to_string())),
                SectionSpec::new("profile", ready_after(UNIT, "p".to_string())),
                SectionSpec::new("posts", ready_after(UNIT * 2, "q".to_string())),
            ])
            .unwrap();

        let phases = Arc::new(Phases::default());
        let page = streamer().with_observer(phases.clone());
        let mut sink = StreamingSink::new(Vec::new(), TimingContext::new());
        let report = page.stream(&session, &mut sink).await.unwrap();

        assert_eq!(
            report.streamed,
            vec![
                SectionId::from("profile"),
                SectionId::from("posts"),
                SectionId::from("comments")
            ]
        );
        assert_eq!(report.metrics.sections.len(), 3);
        assert_eq!(report.metrics.page.as_deref(), Some("profile-stream"));

        let html = String::from_utf8(sink.into_inner().concat()).unwrap();
        let first_template = html.find("<template").unwrap();
        for id in ["profile", "posts", "comments"] {
            let slot = html.find(&format!(r#"id="sb-{}""#, id)).unwrap();
            assert!(slot < first_template, "placeholder for {} after content", id);
        }
        assert!(html.find("sr-profile").unwrap() < html.find("sr-posts").unwrap());
        assert!(html.find("sr-posts").unwrap() < html.find("sr-comments").unwrap());
        assert!(html.ends_with("</html>"));

        let phases = phases.0.lock().unwrap().clone();
        assert_eq!(phases.first(), Some(&LifecyclePhase::Start));
        assert_eq!(phases[1], LifecyclePhase::ShellSent);
        assert_eq!(phases.last(), Some(&LifecyclePhase::Completion));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_section_streams_error_view() {
        let coordinator = StreamingFetchCoordinator::new().unwrap();
        let session = coordinator
            .start_session(vec![
                SectionSpec::new("profile", ready_after(UNIT, "p".to_string())),
                SectionSpec::new(
                    "posts",
                    delayed(UNIT * 2, Scripted::fail_then("HTTP error! status: 500", "q".to_string())),
                ),
                SectionSpec::new("comments", ready_after(UNIT * 3, "c".to_string())),
            ])
            .unwrap();

        let mut sink = StreamingSink::new(Vec::new(), TimingContext::new());
        let report = streamer().stream(&session, &mut sink).await.unwrap();

        assert!(report.metrics.sections["posts"].failed);
        assert!(!report.metrics.sections["comments"].failed);
        assert_eq!(session.status("posts").unwrap(), SectionStatus::Failed);

        let html = String::from_utf8(sink.into_inner().concat()).unwrap();
        assert!(html.contains(r#"<template id="sr-posts" data-status="failed">"#));
        assert!(html.contains("Error: HTTP error! status: 500"));
        assert!(html.contains("<p>c</p>"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sections_settled_before_streaming_are_replayed() {
        let coordinator = StreamingFetchCoordinator::new().unwrap();
        let session = coordinator
            .start_session(vec![
                SectionSpec::new("profile", ready_after(UNIT, "p".to_string())),
                SectionSpec::new("posts", ready_after(UNIT, "q".to_string())),
                SectionSpec::new("comments", ready_after(UNIT, "c".to_string())),
            ])
            .unwrap();
        session.settled().await;

        let mut sink = StreamingSink::new(Vec::new(), TimingContext::new());
        let report = streamer().stream(&session, &mut sink).await.unwrap();
        assert_eq!(report.streamed.len(), 3);

        let html = String::from_utf8(sink.into_inner().concat()).unwrap();
        assert!(html.find("Loading posts").unwrap() < html.find("<template").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_boundary_without_section_is_skipped() {
        let coordinator = StreamingFetchCoordinator::new().unwrap();
        let session = coordinator
            .start_session(vec![SectionSpec::new("profile", ready_after(UNIT, "p".to_string()))])
            .unwrap();

        let mut sink = StreamingSink::new(Vec::new(), TimingContext::new());
        let report = streamer().stream(&session, &mut sink).await.unwrap();
        assert_eq!(report.streamed, vec![SectionId::from("profile")]);

        let html = String::from_utf8(sink.into_inner().concat()).unwrap();
        assert!(!html.contains("sb-posts"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_while_streaming_is_streamed_again() {
        let coordinator = StreamingFetchCoordinator::new().unwrap();
        let session = coordinator
            .start_session(vec![
                SectionSpec::new(
                    "profile",
                    delayed(UNIT, Scripted::fail_then("HTTP error! status: 500", "p".to_string())),
                ),
                SectionSpec::new("posts", ready_after(UNIT * 5, "q".to_string())),
                SectionSpec::new("comments", ready_after(UNIT * 5, "c".to_string())),
            ])
            .unwrap();

        let retrier = session.clone();
        tokio::spawn(async move {
            tokio::time::sleep(UNIT * 2).await;
            retrier.retry("profile").unwrap();
        });

        let mut sink = StreamingSink::new(Vec::new(), TimingContext::new());
        let report = streamer().stream(&session, &mut sink).await.unwrap();

        let profile_chunks = report
            .streamed
            .iter()
            .filter(|id| id.as_str() == "profile")
            .count();
        assert_eq!(profile_chunks, 2);
        assert_eq!(report.metrics.retries, 1);
        assert_eq!(report.metrics.sections["profile"].attempts, 2);
        assert!(!report.metrics.sections["profile"].failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_failure_is_not_streamed_after_retry() {
        let coordinator = StreamingFetchCoordinator::new().unwrap();
        let session = coordinator
            .start_session(vec![
                SectionSpec::new("profile", ready_after(UNIT, "p".to_string())),
                SectionSpec::new(
                    "posts",
                    delayed(UNIT, Scripted::fail_then("HTTP error! status: 500", "q".to_string())),
                ),
            ])
            .unwrap();
        session.settled().await;
        assert_eq!(session.status("posts").unwrap(), SectionStatus::Failed);

        session.retry("posts").unwrap();
        let mut sink = StreamingSink::new(Vec::new(), TimingContext::new());
        let report = streamer().stream(&session, &mut sink).await.unwrap();

        assert_eq!(session.status("posts").unwrap(), SectionStatus::Ready);
        assert_eq!(
            report.streamed,
            vec![SectionId::from("profile"), SectionId::from("posts")]
        );
        assert_eq!(report.metrics.sections["posts"].attempts, 2);
        assert!(!report.metrics.sections["posts"].failed);

        let html = String::from_utf8(sink.into_inner().concat()).unwrap();
        assert!(!html.contains("Error: HTTP error! status: 500"));
        assert!(html.contains("<p>q</p>"));
    }
}
