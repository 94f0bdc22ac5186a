use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use uncookie_core::{counter::BadgeCounter, message::Message};

#[derive(Subcommand)]
pub enum CounterSubcommand {
    /// Show the running total and badge text
    Show,

    /// Reset the running total to zero
    Reset,
}

pub fn run(root: &Path, subcmd: CounterSubcommand, json: bool) -> anyhow::Result<()> {
    let mut counter = BadgeCounter::load(root).context("failed to load state")?;
    if let CounterSubcommand::Reset = subcmd {
        counter.apply(&Message::ResetCounter);
        counter.save(root).context("failed to save state")?;
    }

    if json {
        print_json(&serde_json::json!({
            "total_counter": counter.total_counter,
            "badge": counter.badge_text(),
        }))
    } else {
        println!("Total: {} (badge {})", counter.total_counter, counter.badge_text());
        Ok(())
    }
}
