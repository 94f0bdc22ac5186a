use crate::output::print_json;
use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use std::path::Path;
use uncookie_core::config::{Config, WarnLevel};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,

    /// Validate handlers and settings
    Validate,

    /// Restore the default handler list and settings
    Reset,

    /// Turn debug logging on or off
    Debug {
        #[arg(value_enum)]
        mode: DebugMode,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DebugMode {
    On,
    Off,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Reset => reset(root, json),
        ConfigSubcommand::Debug { mode } => set_debug(root, mode, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        print_json(&config)
    } else {
        print!("{}", serde_yaml::to_string(&config)?);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// reset / debug
// ---------------------------------------------------------------------------

fn reset(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::default();
    config.save(root).context("failed to save config")?;
    if json {
        print_json(&config)
    } else {
        println!(
            "Configuration reset to defaults ({} handler).",
            config.handlers.len()
        );
        Ok(())
    }
}

fn set_debug(root: &Path, mode: DebugMode, json: bool) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    config.debug = matches!(mode, DebugMode::On);
    config.save(root).context("failed to save config")?;
    if json {
        print_json(&serde_json::json!({ "debug": config.debug }))
    } else {
        println!(
            "Debug mode {}.",
            if config.debug { "enabled" } else { "disabled" }
        );
        Ok(())
    }
}
