//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, SuspenseConfig, CONFIG_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Get { key } => get_config(&key, ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    // Render section
    ctx.output.info("[render]");
    ctx.output.kv("time_unit_ms", &ctx.config.render.time_unit_ms.to_string());
    ctx.output.kv("flush", &ctx.config.render.flush);

    // Fetch section
    ctx.output.info("[fetch]");
    ctx.output.kv("api_base", &ctx.config.fetch.api_base);
    if let Some(ref agent) = ctx.config.fetch.user_agent {
        ctx.output.kv("user_agent", agent);
    }

    // Logging section
    ctx.output.info("[logging]");
    ctx.output.kv("level", &ctx.config.logging.level.to_string());
    ctx.output.kv("format", &get_config_value(&ctx.config, "logging.format")?);

    Ok(())
}

async fn get_config(key: &str, ctx: &Context) -> Result<()> {
    let value = get_config_value(&ctx.config, key)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = check_config(&ctx.config);

    // Print results
    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Errors and warnings for a configuration.
fn check_config(config: &SuspenseConfig) -> (Vec<String>, Vec<String>) {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    // Check time unit
    if config.render.time_unit_ms == 0 {
        warnings.push("render.time_unit_ms is 0; every section resolves immediately".to_string());
    } else if config.render.time_unit_ms > 60_000 {
        warnings.push(format!(
            "render.time_unit_ms = {} makes the slowest section take over {} minutes",
            config.render.time_unit_ms,
            config.render.time_unit_ms * 10 / 60_000
        ));
    }

    // Check flush policy
    if let Err(e) = config.flush_policy() {
        errors.push(format!("{:#}", e));
    }

    // Check API base
    let api_base = &config.fetch.api_base;
    if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
        errors.push(format!("fetch.api_base '{}' must be an http(s) URL", api_base));
    }

    (errors, warnings)
}

fn get_config_value(config: &SuspenseConfig, key: &str) -> Result<String> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["render", "time_unit_ms"] => Ok(config.render.time_unit_ms.to_string()),
        ["render", "flush"] => Ok(config.render.flush.clone()),
        ["fetch", "api_base"] => Ok(config.fetch.api_base.clone()),
        ["fetch", "user_agent"] => Ok(config
            .fetch
            .user_agent
            .clone()
            .unwrap_or_else(|| "null".to_string())),
        ["logging", "level"] => Ok(config.logging.level.to_string()),
        ["logging", "format"] => Ok(serde_json::to_value(config.logging.format)?
            .as_str()
            .unwrap_or_default()
            .to_string()),
        ["logging", "ansi"] => Ok(config.logging.ansi.to_string()),
        _ => bail!("Unknown config key: {}", key),
    }
}
