//! Suspense CLI - Render and watch streamed suspense pages.
//!
//! Commands:
//! - `suspense pages` - List the demo pages
//! - `suspense render` - Stream a page's HTML as its sections settle
//! - `suspense watch` - Follow each section's status live
//! - `suspense config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use suspense_sdk::suspense_observability::init_logging;

use commands::{ConfigArgs, RenderArgs, WatchArgs};

/// Suspense CLI - Stream pages whose sections resolve independently
#[derive(Parser)]
#[command(name = "suspense")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the demo pages and their sections
    Pages,

    /// Render a page as a progressive HTML stream
    Render(RenderArgs),

    /// Watch a page's sections settle
    Watch(WatchArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose > 0, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&ctx.config.logging_for(cli.verbose)) {
        ctx.output.warn(&format!("Logging disabled: {}", e));
    }

    // Execute command
    let result = match cli.command {
        Commands::Pages => commands::pages::run(&ctx).await,
        Commands::Render(args) => commands::render::run(args, &ctx).await,
        Commands::Watch(args) => commands::watch::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
