//! Shell-first streaming sink.

use std::fmt::Display;

use futures::{Sink, SinkExt};
use suspense_core::{LifecyclePhase, StreamError, TimingContext};

use crate::flush::{FlushController, FlushPolicy};

/// State of the streaming sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    /// Initial state, shell not yet sent.
    Initial,
    /// Shell has been sent, sections can be streamed.
    ShellSent,
    /// Response has been completed.
    Completed,
}

/// Sink that enforces the shell-first pattern.
///
/// Generic over any `Sink<Vec<u8>>`: a channel feeding an HTTP body,
/// a `Vec` in tests, or a writer adapter in the CLI.
pub struct StreamingSink<S>
where
    S: Sink<Vec<u8>> + Unpin,
    S::Error: Display,
{
    inner: S,
    state: SinkState,
    timing: TimingContext,
    flush: FlushController,
    sections_sent: Vec<String>,
    bytes_sent: usize,
}

impl<S> StreamingSink<S>
where
    S: Sink<Vec<u8>> + Unpin,
    S::Error: Display,
{
    /// Create a new streaming sink.
    pub fn new(sink: S, timing: TimingContext) -> Self {
        Self {
            inner: sink,
            state: SinkState::Initial,
            timing,
            flush: FlushController::default(),
            sections_sent: Vec::new(),
            bytes_sent: 0,
        }
    }

    /// Use a specific flush controller.
    pub fn with_flush(mut self, flush: FlushController) -> Self {
        self.flush = flush;
        self
    }

    /// Use a flush policy with no buffer limit.
    pub fn with_policy(self, policy: FlushPolicy) -> Self {
        self.with_flush(FlushController::new(policy))
    }

    /// Send the shell HTML. Must be called before any sections.
    pub async fn send_shell(&mut self, html: &str) -> Result<(), StreamError> {
        match self.state {
            SinkState::Initial => {}
            SinkState::ShellSent => return Err(StreamError::ShellAlreadySent),
            SinkState::Completed => return Err(StreamError::AlreadyCompleted),
        }

        self.write(html.as_bytes().to_vec()).await?;
        if self.flush.policy().flush_after_shell() {
            self.flush().await?;
        }
        self.timing.mark_shell_sent();
        self.state = SinkState::ShellSent;

        Ok(())
    }

    /// Send a named section. Shell must be sent first.
    ///
    /// Sections can be sent in any order, and the same section may be
    /// sent again after a retry.
    pub async fn send_section(&mut self, name: &str, html: &str) -> Result<(), StreamError> {
        self.ensure_open()?;

        self.timing.mark_section_start(name);
        self.write(html.as_bytes().to_vec()).await?;
        if self.flush.policy().flush_after_section() {
            self.flush().await?;
        }
        self.timing.mark_section_sent(name);
        self.sections_sent.push(name.to_string());

        Ok(())
    }

    /// Send raw bytes. Shell must be sent first.
    pub async fn send_raw(&mut self, bytes: Vec<u8>) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.write(bytes).await
    }

    /// Flush buffered bytes to the underlying sink.
    pub async fn flush(&mut self) -> Result<(), StreamError> {
        self.inner
            .flush()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;
        self.flush.reset();
        Ok(())
    }

    /// Complete the response: flush and close the underlying sink.
    pub async fn complete(&mut self) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.inner
            .close()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;
        self.flush.reset();
        self.state = SinkState::Completed;
        self.timing.mark_complete();
        Ok(())
    }

    /// Get the list of sections sent, in order.
    pub fn sections_sent(&self) -> &[String] {
        &self.sections_sent
    }

    /// Total bytes written so far.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// Get the current lifecycle phase.
    pub fn phase(&self) -> LifecyclePhase {
        match self.state {
            SinkState::Initial => LifecyclePhase::Start,
            SinkState::ShellSent => match self.sections_sent.last() {
                Some(name) => LifecyclePhase::SectionSent(name.clone()),
                None => LifecyclePhase::ShellSent,
            },
            SinkState::Completed => LifecyclePhase::Completion,
        }
    }

    /// Get timing context reference.
    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }

    /// Get mutable access to the underlying sink for advanced use.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the sink and return the inner value.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        match self.state {
            SinkState::Initial => Err(StreamError::ShellNotSent),
            SinkState::ShellSent => Ok(()),
            SinkState::Completed => Err(StreamError::AlreadyCompleted),
        }
    }

    async fn write(&mut self, bytes: Vec<u8>) -> Result<(), StreamError> {
        let len = bytes.len();
        self.inner
            .feed(bytes)
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;
        self.bytes_sent += len;
        self.flush.add_bytes(len);
        if self.flush.should_flush() {
            self.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collected(sink: StreamingSink<Vec<Vec<u8>>>) -> String {
        String::from_utf8(sink.into_inner().concat()).unwrap()
    }

    #[tokio::test]
    async fn test_section_before_shell_is_rejected() {
        let mut sink = StreamingSink::new(Vec::new(), TimingContext::new());
        let err = sink.send_section("profile", "<p></p>").await.unwrap_err();
        assert!(matches!(err, StreamError::ShellNotSent));
        assert_eq!(sink.phase(), LifecyclePhase::Start);
    }

    #[tokio::test]
    async fn test_shell_then_sections_then_complete() {
        let mut sink = StreamingSink::new(Vec::new(), TimingContext::new());
        sink.send_shell("<html>").await.unwrap();
        assert_eq!(sink.phase(), LifecyclePhase::ShellSent);
        assert!(matches!(
            sink.send_shell("<html>").await,
            Err(StreamError::ShellAlreadySent)
        ));

        sink.send_section("profile", "<p>1</p>").await.unwrap();
        sink.send_section("posts", "<p>2</p>").await.unwrap();
        assert_eq!(sink.phase(), LifecyclePhase::SectionSent("posts".into()));
        sink.send_raw(b"</html>".to_vec()).await.unwrap();
        sink.complete().await.unwrap();

        assert_eq!(sink.phase(), LifecyclePhase::Completion);
        assert!(matches!(
            sink.send_raw(Vec::new()).await,
            Err(StreamError::AlreadyCompleted)
        ));
        assert_eq!(sink.sections_sent(), &["profile".to_string(), "posts".to_string()]);
        assert!(sink.timing().time_to_shell().is_some());
        assert!(sink.timing().section_timing("posts").is_some());
        assert_eq!(sink.bytes_sent(), 29);
        assert_eq!(collected(sink), "<html><p>1</p><p>2</p></html>");
    }

    #[tokio::test]
    async fn test_closed_transport_reports_error() {
        let (tx, rx) = futures::channel::mpsc::unbounded::<Vec<u8>>();
        drop(rx);
        let mut sink = StreamingSink::new(tx, TimingContext::new());
        let err = sink.send_shell("<html>").await.unwrap_err();
        assert!(matches!(err, StreamError::Transport(_)));
    }
}
