//! Explicit flush control - no implicit buffering.

/// Flush policy for streaming responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Flush immediately after shell is sent.
    AfterShell,
    /// Flush after each section is sent.
    #[default]
    AfterEachSection,
    /// Manual flush control only.
    Manual,
}

impl FlushPolicy {
    /// Check if should flush after shell.
    pub fn flush_after_shell(&self) -> bool {
        matches!(self, Self::AfterShell | Self::AfterEachSection)
    }

    /// Check if should flush after section.
    pub fn flush_after_section(&self) -> bool {
        matches!(self, Self::AfterEachSection)
    }

    /// Config name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AfterShell => "after-shell",
            Self::AfterEachSection => "after-each-section",
            Self::Manual => "manual",
        }
    }
}

impl std::str::FromStr for FlushPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "after-shell" => Ok(Self::AfterShell),
            "after-each-section" => Ok(Self::AfterEachSection),
            "manual" => Ok(Self::Manual),
            other => Err(format!(
                "Unknown flush policy '{}' (expected after-shell, after-each-section or manual)",
                other
            )),
        }
    }
}

/// Controller for managing flush behavior.
#[derive(Debug)]
pub struct FlushController {
    policy: FlushPolicy,
    pending_bytes: usize,
    /// Bytes buffered before a forced flush (0 = never forced).
    max_buffer: usize,
}

impl FlushController {
    /// Create a new flush controller with given policy.
    pub fn new(policy: FlushPolicy) -> Self {
        Self {
            policy,
            pending_bytes: 0,
            max_buffer: 0,
        }
    }

    /// Set maximum buffer size before auto-flush.
    pub fn with_max_buffer(mut self, bytes: usize) -> Self {
        self.max_buffer = bytes;
        self
    }

    /// Record bytes added to buffer.
    pub fn add_bytes(&mut self, count: usize) {
        self.pending_bytes += count;
    }

    /// Check if the buffer limit forces a flush.
    pub fn should_flush(&self) -> bool {
        self.max_buffer > 0 && self.pending_bytes >= self.max_buffer
    }

    /// Bytes written since the last flush.
    pub fn pending_bytes(&self) -> usize {
        self.pending_bytes
    }

    /// Reset pending byte count after flush.
    pub fn reset(&mut self) {
        self.pending_bytes = 0;
    }

    /// Get current policy.
    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }
}

impl Default for FlushController {
    fn default() -> Self {
        Self::new(FlushPolicy::default())
    }
}
