//! CLI configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use suspense_sdk::suspense_observability::{LogLevel, LoggingConfig};
use suspense_sdk::suspense_streaming::FlushPolicy;
use user_stream::{PageOptions, API_BASE};

/// Config file names searched from the working directory upward.
pub const CONFIG_NAMES: [&str; 3] = ["suspense.toml", ".suspense.toml", "suspense.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspenseConfig {
    /// Rendering configuration.
    #[serde(default)]
    pub render: RenderConfig,

    /// Data fetching configuration.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Logging configuration.
    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

impl Default for SuspenseConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            fetch: FetchConfig::default(),
            logging: default_logging(),
        }
    }
}

impl SuspenseConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Flush policy for streamed output.
    pub fn flush_policy(&self) -> Result<FlushPolicy> {
        self.render
            .flush
            .parse()
            .map_err(|e: String| anyhow!(e))
            .context("Invalid render.flush")
    }

    /// Page options derived from the config.
    pub fn page_options(&self) -> PageOptions {
        let mut options = PageOptions::default()
            .with_time_unit(Duration::from_millis(self.render.time_unit_ms))
            .with_api_base(self.fetch.api_base.as_str());
        if let Some(agent) = &self.fetch.user_agent {
            options = options.with_user_agent(agent.as_str());
        }
        options
    }

    /// Logging config with `-v` applied.
    pub fn logging_for(&self, verbose: u8) -> LoggingConfig {
        LoggingConfig {
            level: LogLevel::from_verbosity(self.logging.level, verbose),
            ..self.logging.clone()
        }
    }
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Length of one latency unit in milliseconds (default: 1000).
    #[serde(default = "default_time_unit_ms")]
    pub time_unit_ms: u64,

    /// Flush policy: after-shell, after-each-section or manual.
    #[serde(default = "default_flush")]
    pub flush: String,
}

fn default_time_unit_ms() -> u64 {
    1000
}

fn default_flush() -> String {
    FlushPolicy::default().as_str().to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            time_unit_ms: default_time_unit_ms(),
            flush: default_flush(),
        }
    }
}

/// Data fetching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL of the placeholder API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// User agent for API requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_api_base() -> String {
    API_BASE.to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_agent: None,
        }
    }
}

/// Logs stay quiet by default so spinners and streamed HTML are readable.
fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: LogLevel::Warn,
        ..LoggingConfig::default()
    }
}

/// Generate a default suspense.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# Suspense stream configuration

[render]
# Length of one latency unit; the profile stream resolves after 1, 2 and 3 units.
time_unit_ms = {time_unit_ms}
# after-shell | after-each-section | manual
flush = "{flush}"

[fetch]
api_base = "{api_base}"
# user_agent = "suspense-stream"

[logging]
# trace | debug | info | warn | error (RUST_LOG overrides)
level = "warn"
# human | json
format = "human"
"#,
        time_unit_ms = default_time_unit_ms(),
        flush = default_flush(),
        api_base = API_BASE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: SuspenseConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.render.time_unit_ms, 1000);
        assert_eq!(config.flush_policy().unwrap(), FlushPolicy::AfterEachSection);
        assert_eq!(config.fetch.api_base, API_BASE);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: SuspenseConfig = toml::from_str("[render]\ntime_unit_ms = 50\n").unwrap();
        assert_eq!(config.page_options().time_unit, Duration::from_millis(50));
        assert_eq!(config.render.flush, "after-each-section");
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_invalid_flush_policy() {
        let mut config = SuspenseConfig::default();
        config.render.flush = "eventually".into();
        let err = config.flush_policy().unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown flush policy 'eventually'"));
    }

    #[test]
    fn test_verbosity_raises_level() {
        let config = SuspenseConfig::default();
        assert_eq!(config.logging_for(0).level, LogLevel::Warn);
        assert_eq!(config.logging_for(2).level, LogLevel::Debug);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suspense.json");
        std::fs::write(&path, r#"{"fetch":{"api_base":"http://localhost:9000"}}"#).unwrap();
        let config = SuspenseConfig::load(&path).unwrap();
        assert_eq!(config.fetch.api_base, "http://localhost:9000");
    }
}
