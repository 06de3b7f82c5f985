//! Session lifecycle tracking.
//!
//! Timings are taken from tokio's clock, the same clock the coordinator
//! measures section latency with, so they stay comparable under paused
//! time.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Lifecycle phases of one streamed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Session created, producers launched.
    Start,
    /// Shell HTML (with every placeholder) has been flushed.
    ShellSent,
    /// A named section has been streamed.
    SectionSent(String),
    /// Every section reached a terminal status.
    Completion,
    /// The transport failed.
    Error(String),
}

#[derive(Debug, Clone, Copy)]
struct SectionMarks {
    start: Instant,
    sent: Option<Instant>,
}

/// When the shell, each section and the end of the stream went out.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    shell_sent: Option<Instant>,
    first_section_sent: Option<Instant>,
    completed: Option<Instant>,
    sections: HashMap<String, SectionMarks>,
}

impl TimingContext {
    /// Start timing now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            shell_sent: None,
            first_section_sent: None,
            completed: None,
            sections: HashMap::new(),
        }
    }

    pub fn mark_shell_sent(&mut self) {
        self.shell_sent = Some(Instant::now());
    }

    /// A section started streaming. A resend after a retry restarts its timing.
    pub fn mark_section_start(&mut self, section: &str) {
        self.sections.insert(
            section.to_string(),
            SectionMarks {
                start: Instant::now(),
                sent: None,
            },
        );
    }

    pub fn mark_section_sent(&mut self, section: &str) {
        let now = Instant::now();
        self.sections
            .entry(section.to_string())
            .or_insert(SectionMarks {
                start: now,
                sent: None,
            })
            .sent = Some(now);
        self.first_section_sent.get_or_insert(now);
    }

    pub fn mark_complete(&mut self) {
        self.completed = Some(Instant::now());
    }

    /// Time since timing started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn time_to_shell(&self) -> Option<Duration> {
        self.shell_sent.map(|t| t - self.start)
    }

    pub fn time_to_first_section(&self) -> Option<Duration> {
        self.first_section_sent.map(|t| t - self.start)
    }

    /// Time until the stream was closed.
    pub fn time_to_complete(&self) -> Option<Duration> {
        self.completed.map(|t| t - self.start)
    }

    /// Latest timing for a section, once it has been sent.
    pub fn section_timing(&self, section: &str) -> Option<SectionTiming> {
        let marks = self.sections.get(section)?;
        let sent = marks.sent?;

        Some(SectionTiming {
            name: section.to_string(),
            start: marks.start - self.start,
            sent: sent - self.start,
            duration: sent - marks.start,
        })
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Timing of one section, relative to the start of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTiming {
    pub name: String,
    pub start: Duration,
    pub sent: Duration,
    /// Time spent writing the section.
    pub duration: Duration,
}

/// Receives lifecycle phases as a page streams.
pub trait LifecycleObserver: Send + Sync {
    /// `elapsed` is measured from the start of the stream.
    fn on_phase(&self, phase: LifecyclePhase, elapsed: Duration);
}
