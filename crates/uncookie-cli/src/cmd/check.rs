use crate::output::print_json;
use anyhow::Context;
use uncookie_core::schema::{self, ActionGroup};

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

pub fn run(schema_arg: &str, json: bool) -> anyhow::Result<()> {
    let text = match schema_arg.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("cannot read schema {path}"))?
        }
        None => schema_arg.to_string(),
    };

    let preview = schema::preview(&text);
    if text.trim().starts_with("http") {
        if json {
            print_json(&serde_json::json!({ "remote": true, "preview": preview }))?;
        } else {
            println!("{preview}");
            println!("Remote schemas are resolved at run time; use `uncookie fetch` to inspect.");
        }
        return Ok(());
    }

    serde_json::from_str::<serde_json::Value>(&text).context("schema is not valid JSON")?;
    let group = ActionGroup::detect_text(&text);
    let domains: Vec<&str> = match &group {
        ActionGroup::Flat(_) => Vec::new(),
        ActionGroup::Scoped(groups) => groups.iter().map(|(d, _)| d.as_str()).collect(),
        ActionGroup::Keyed(groups) => groups.iter().map(|(d, _)| d.as_str()).collect(),
    };

    if json {
        print_json(&serde_json::json!({
            "remote": false,
            "shape": group.shape(),
            "entries": group.len(),
            "domains": domains,
            "preview": preview,
        }))?;
    } else {
        println!("Shape:   {}", group.shape());
        println!("Entries: {}", group.len());
        if !domains.is_empty() {
            println!("Domains: {}", domains.join(", "));
        }
        println!("Preview: {preview}");
        if group.is_empty() {
            println!("warning: schema has no actions");
        }
    }
    Ok(())
}
