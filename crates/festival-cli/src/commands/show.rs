//! Show command implementation.

use anyhow::{Context, Result};
use clap::Args;

use booth_core::RecordStore;

use crate::backend::CliBackend;
use crate::output;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Booth id
    pub id: String,

    /// Output the record as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(store: CliBackend, args: ShowArgs) -> Result<()> {
    let id = super::parse_id(&args.id)?;
    let record = store.get(&id).await.context("Failed to get booth")?;

    if args.json {
        output::json_pretty(&record)?;
    } else {
        output::booth_detail(&record);
    }

    Ok(())
}
