//! List command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use booth_core::{Direction, ListOrder, RecordStore, SortKey};

use crate::backend::CliBackend;
use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Sort by: createdAt or likes
    #[arg(long, default_value = "createdAt")]
    pub sort: SortKey,

    /// Oldest or least liked first
    #[arg(long)]
    pub asc: bool,

    /// Output one JSON record per line
    #[arg(long)]
    pub json: bool,
}

pub async fn run(store: CliBackend, args: ListArgs) -> Result<()> {
    let direction = if args.asc {
        Direction::Asc
    } else {
        Direction::Desc
    };
    let records = store
        .list(ListOrder::new(args.sort, direction))
        .await
        .context("Failed to list booths")?;

    if records.is_empty() {
        eprintln!("{}", "No booths found.".dimmed());
        return Ok(());
    }

    for record in &records {
        if args.json {
            output::json(record)?;
        } else {
            output::booth_line(record, false);
        }
    }

    Ok(())
}
