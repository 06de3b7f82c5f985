//! CLI command implementations.

pub mod config;
pub mod pages;
pub mod render;
pub mod watch;

use clap::{Args, Subcommand};

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Page to render (see `suspense pages`).
    pub page: String,

    /// Write the HTML to a file instead of stdout.
    #[arg(short, long)]
    pub out: Option<String>,

    /// User shown by the profile sections.
    #[arg(short, long)]
    pub user: Option<u32>,

    /// Make a section's first fetch fail (repeatable).
    #[arg(long, value_name = "SECTION")]
    pub fail: Vec<String>,

    /// Override the latency unit in milliseconds.
    #[arg(long)]
    pub time_unit_ms: Option<u64>,
}

/// Arguments for the watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Page to watch (see `suspense pages`).
    pub page: String,

    /// User shown by the profile sections.
    #[arg(short, long)]
    pub user: Option<u32>,

    /// Make a section's first fetch fail (repeatable).
    #[arg(long, value_name = "SECTION")]
    pub fail: Vec<String>,

    /// Offer to retry each failed section.
    #[arg(short, long)]
    pub interactive: bool,

    /// Override the latency unit in milliseconds.
    #[arg(long)]
    pub time_unit_ms: Option<u64>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Get a config value.
    Get {
        /// Config key (dot-separated).
        key: String,
    },
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
