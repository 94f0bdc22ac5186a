use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use uncookie_core::{config::Config, handler::Handler, schema};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum HandlerSubcommand {
    /// List handlers in run order
    List,

    /// Append a handler
    Add {
        /// Domain the handler targets (`*` for every page)
        name: String,
        /// Inline JSON schema, a URL, or @file
        schema: String,
    },

    /// Change a handler's name or schema
    Update {
        index: usize,
        #[arg(long)]
        name: Option<String>,
        /// Inline JSON schema, a URL, or @file
        #[arg(long)]
        schema: Option<String>,
    },

    /// Remove a handler
    Remove { index: usize },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: HandlerSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        HandlerSubcommand::List => list(root, json),
        HandlerSubcommand::Add { name, schema } => add(root, name, &schema, json),
        HandlerSubcommand::Update {
            index,
            name,
            schema,
        } => update(root, index, name, schema.as_deref(), json),
        HandlerSubcommand::Remove { index } => remove(root, index, json),
    }
}

fn read_schema_arg(arg: &str) -> anyhow::Result<String> {
    let raw = match arg.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("cannot read schema {path}"))?
        }
        None => arg.to_string(),
    };
    let schema = raw.trim();
    if schema.is_empty() {
        anyhow::bail!("handler schema must not be empty");
    }
    if !schema.starts_with("http") {
        serde_json::from_str::<serde_json::Value>(schema)
            .context("handler schema is not valid JSON")?;
    }
    Ok(schema.to_string())
}

fn checked_name(name: &str) -> anyhow::Result<String> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("handler name must not be empty");
    }
    Ok(name.to_string())
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    if json {
        return print_json(&config.handlers);
    }
    if config.handlers.is_empty() {
        println!("No handlers configured.");
        return Ok(());
    }
    let rows = config
        .handlers
        .iter()
        .enumerate()
        .map(|(i, h)| vec![i.to_string(), h.name.clone(), schema::preview(&h.schema)])
        .collect();
    print_table(&["#", "NAME", "SCHEMA"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// add / update / remove
// ---------------------------------------------------------------------------

fn add(root: &Path, name: String, schema_arg: &str, json: bool) -> anyhow::Result<()> {
    let handler = Handler::new(checked_name(&name)?, read_schema_arg(schema_arg)?);
    let mut config = Config::load(root).context("failed to load config")?;
    let index = config.add_handler(handler.clone());
    config.save(root).context("failed to save config")?;

    if json {
        print_json(&serde_json::json!({ "index": index, "handler": handler }))?;
    } else {
        println!("Added handler {index}: {}", handler.name);
    }
    Ok(())
}

fn update(
    root: &Path,
    index: usize,
    name: Option<String>,
    schema_arg: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    if name.is_none() && schema_arg.is_none() {
        anyhow::bail!("nothing to update: pass --name and/or --schema");
    }
    let name = name.as_deref().map(checked_name).transpose()?;
    let schema = schema_arg.map(read_schema_arg).transpose()?;

    let mut config = Config::load(root).context("failed to load config")?;
    let handler = config.update_handler(index, name, schema)?.clone();
    config.save(root).context("failed to save config")?;

    if json {
        print_json(&serde_json::json!({ "index": index, "handler": handler }))?;
    } else {
        println!("Updated handler {index}: {}", handler.name);
    }
    Ok(())
}

fn remove(root: &Path, index: usize, json: bool) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    let handler = config.remove_handler(index)?;
    config.save(root).context("failed to save config")?;

    if json {
        print_json(&serde_json::json!({ "removed": handler }))?;
    } else {
        println!("Removed handler {index}: {}", handler.name);
    }
    Ok(())
}
