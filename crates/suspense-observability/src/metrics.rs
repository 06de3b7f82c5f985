//! Per-session timing metrics.
//!
//! Measured on tokio's clock, like section latencies.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use suspense_core::SessionId;
use tokio::time::Instant;

/// Metrics for one streamed page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Session ID for correlation.
    pub session_id: String,
    /// Page name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Time to shell flush (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_shell_us: Option<u64>,
    /// Time to first streamed section (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_first_section_us: Option<u64>,
    /// Time until every section was streamed (microseconds).
    pub time_to_full_page_us: u64,
    /// Section timings.
    pub sections: HashMap<String, SectionMetrics>,
    /// Number of manual retries.
    pub retries: u32,
}

/// Metrics for a single section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionMetrics {
    /// Section name.
    pub name: String,
    /// Time from session start to the section's placeholder going out (microseconds).
    pub start_us: u64,
    /// Time from session start to the resolved chunk going out (microseconds).
    pub sent_us: u64,
    /// Time the section spent pending (microseconds).
    pub duration_us: u64,
    /// Bytes sent for the resolved chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    /// Whether the error view was streamed.
    pub failed: bool,
    /// Producer invocations, retries included.
    pub attempts: u32,
}

/// Collector for session metrics.
#[derive(Debug)]
pub struct MetricsCollector {
    session_id: SessionId,
    page: Option<String>,
    start: Instant,
    shell_sent: Option<Instant>,
    first_section_sent: Option<Instant>,
    sections: HashMap<String, SectionMetricsBuilder>,
    retries: u32,
}

#[derive(Debug)]
struct SectionMetricsBuilder {
    start: Instant,
    sent: Option<Instant>,
    bytes: Option<usize>,
    failed: bool,
    attempts: u32,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            page: None,
            start: Instant::now(),
            shell_sent: None,
            first_section_sent: None,
            sections: HashMap::new(),
            retries: 0,
        }
    }

    /// Set page name.
    pub fn set_page(&mut self, page: impl Into<String>) {
        self.page = Some(page.into());
    }

    /// Record shell sent.
    pub fn record_shell_sent(&mut self) {
        self.shell_sent = Some(Instant::now());
    }

    /// Record a section going pending.
    pub fn record_section_start(&mut self, name: &str) {
        self.sections.insert(
            name.to_string(),
            SectionMetricsBuilder {
                start: Instant::now(),
                sent: None,
                bytes: None,
                failed: false,
                attempts: 1,
            },
        );
    }

    /// Record a section's resolved chunk being sent.
    pub fn record_section_sent(&mut self, name: &str, bytes: Option<usize>, failed: bool) {
        let now = Instant::now();

        if self.first_section_sent.is_none() {
            self.first_section_sent = Some(now);
        }

        let section = self
            .sections
            .entry(name.to_string())
            .or_insert_with(|| SectionMetricsBuilder {
                start: now,
                sent: None,
                bytes: None,
                failed: false,
                attempts: 1,
            });
        section.sent = Some(now);
        section.bytes = bytes;
        section.failed = failed;
    }

    /// Record a manual retry of a section.
    pub fn record_retry(&mut self, name: &str) {
        self.retries += 1;
        if let Some(section) = self.sections.get_mut(name) {
            section.attempts += 1;
        }
    }

    /// Finalize and return the metrics.
    pub fn finalize(self) -> SessionMetrics {
        let now = Instant::now();
        let start = self.start;
        let micros = |d: Duration| d.as_micros() as u64;

        let sections = self
            .sections
            .into_iter()
            .map(|(name, builder)| {
                let sent = builder.sent.unwrap_or(now);
                let metrics = SectionMetrics {
                    name: name.clone(),
                    start_us: micros(builder.start.duration_since(start)),
                    sent_us: micros(sent.duration_since(start)),
                    duration_us: micros(sent.duration_since(builder.start)),
                    bytes: builder.bytes,
                    failed: builder.failed,
                    attempts: builder.attempts,
                };
                (name, metrics)
            })
            .collect();

        SessionMetrics {
            session_id: self.session_id.to_string(),
            page: self.page,
            time_to_shell_us: self.shell_sent.map(|t| micros(t.duration_since(start))),
            time_to_first_section_us: self
                .first_section_sent
                .map(|t| micros(t.duration_since(start))),
            time_to_full_page_us: micros(now.duration_since(start)),
            sections,
            retries: self.retries,
        }
    }

    /// Get total elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl SessionMetrics {
    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as JSON (pretty printed).
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Sections ordered by the time their resolved chunk went out.
    pub fn sections_by_sent(&self) -> Vec<&SectionMetrics> {
        let mut sections: Vec<_> = self.sections.values().collect();
        sections.sort_by_key(|s| (s.sent_us, s.name.clone()));
        sections
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let ms = |us: u64| us as f64 / 1000.0;
        let mut lines = Vec::new();

        match &self.page {
            Some(page) => lines.push(format!("Session: {} ({})", self.session_id, page)),
            None => lines.push(format!("Session: {}", self.session_id)),
        }

        if let Some(tts) = self.time_to_shell_us {
            lines.push(format!("  Time to shell: {:.2}ms", ms(tts)));
        }
        if let Some(ttfs) = self.time_to_first_section_us {
            lines.push(format!("  Time to first section: {:.2}ms", ms(ttfs)));
        }
        lines.push(format!(
            "  Time to full page: {:.2}ms",
            ms(self.time_to_full_page_us)
        ));

        if !self.sections.is_empty() {
            lines.push("  Sections:".to_string());
            for section in self.sections_by_sent() {
                let mut flags = String::new();
                if section.failed {
                    flags.push_str(" [failed]");
                }
                if section.attempts > 1 {
                    flags.push_str(&format!(" [attempts: {}]", section.attempts));
                }
                lines.push(format!(
                    "    {}: {:.2}ms{}",
                    section.name,
                    ms(section.duration_us),
                    flags
                ));
            }
        }

        if self.retries > 0 {
            lines.push(format!("  Retries: {}", self.retries));
        }

        lines.join("\n")
    }
}
