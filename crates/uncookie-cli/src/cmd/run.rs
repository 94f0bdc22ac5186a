use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use tokio::sync::mpsc;
use uncookie_core::{
    config::Config,
    counter::BadgeCounter,
    document::Document,
    dom::Page,
    message::Message,
    session::{PassReport, Session},
};

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn run(root: &Path, page_path: &Path, dump: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let yaml = std::fs::read_to_string(page_path)
        .with_context(|| format!("cannot read page {}", page_path.display()))?;
    let page = Page::from_yaml(&yaml).context("invalid page snapshot")?;

    tracing::debug!(
        handlers = config.handlers.len(),
        host = page.hostname(),
        "running session"
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = Session::from_config(page, tx, &config);

    let rt = tokio::runtime::Runtime::new()?;
    let reports = rt.block_on(session.trigger()).unwrap_or_default();
    let page = session.into_document();

    let mut counter = BadgeCounter::load(root).context("failed to load state")?;
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        counter.apply(&message);
        messages.push(message);
    }
    counter.save(root).context("failed to save state")?;

    if json {
        let mut value = serde_json::json!({
            "passes": reports,
            "messages": messages,
            "total_counter": counter.total_counter,
            "badge": counter.badge_text(),
        });
        if dump {
            value["page"] = serde_json::to_value(page.snapshot())?;
        }
        return print_json(&value);
    }

    print_reports(&reports, &messages);
    println!("Badge: {}", counter.badge_text());
    if dump {
        println!();
        print!("{}", page.to_yaml()?);
    }
    Ok(())
}

fn print_reports(reports: &[PassReport], messages: &[Message]) {
    if reports.is_empty() {
        println!("No handler applied to this page.");
        return;
    }
    let rows = reports
        .iter()
        .map(|r| {
            vec![
                r.handler.clone(),
                r.shape.to_string(),
                r.summary.executed.to_string(),
                r.summary.failed.to_string(),
                r.summary.elements.to_string(),
                r.summary.cookies.to_string(),
            ]
        })
        .collect();
    print_table(
        &["HANDLER", "SHAPE", "ACTIONS", "FAILED", "ELEMENTS", "COOKIES"],
        rows,
    );
    if messages.contains(&Message::ClearAllCookies) {
        println!("Requested a full cookie clear from the background context.");
    }
    if reports.iter().any(|r| r.summary.halted) {
        println!("Page reload requested; remaining actions skipped.");
    }
}
