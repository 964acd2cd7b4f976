//! Watch command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use futures_util::StreamExt;

use booth_core::{ChangeEvent, ChangeOp, RecordStore};

use crate::backend::CliBackend;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Output events as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(store: CliBackend, args: WatchArgs) -> Result<()> {
    let mut changes = store
        .subscribe()
        .await
        .context("Failed to start subscription")?;

    eprintln!("{}", "Watching for changes...".dimmed());
    eprintln!("{}", "Press Ctrl+C to stop.".dimmed());
    eprintln!();

    while let Some(result) = changes.next().await {
        match result {
            Ok(event) => handle_event(&event, args.json),
            Err(e) => {
                eprintln!("{} {}", "ERROR".red(), e);
            }
        }
    }

    Ok(())
}

fn handle_event(event: &ChangeEvent, json_output: bool) {
    if json_output {
        if let Ok(json) = serde_json::to_string(event) {
            println!("{}", json);
        }
        return;
    }

    let op = match event.op {
        ChangeOp::Insert => "INSERT".green(),
        ChangeOp::Update => "UPDATE".yellow(),
        ChangeOp::Delete => "DELETE".red(),
    };
    let record = &event.record;
    match event.op {
        ChangeOp::Delete => println!("{} {}", op, record.id.as_str().dimmed()),
        _ => println!(
            "{} {} {} ({} likes)",
            op,
            record.id.as_str().dimmed(),
            record.title,
            record.likes
        ),
    }
}
