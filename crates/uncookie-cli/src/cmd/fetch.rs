use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use uncookie_core::{config::Config, loader::RemoteLoader};

pub fn run(root: &Path, url: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let loader = RemoteLoader::with_ttl(config.cache_ttl());

    let rt = tokio::runtime::Runtime::new()?;
    let content = rt
        .block_on(loader.resolve(url))
        .with_context(|| format!("failed to load {url}"))?;

    if json {
        print_json(&serde_json::json!({ "url": url, "content": content }))?;
    } else {
        println!("{content}");
    }
    Ok(())
}
