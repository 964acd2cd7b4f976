//! Like command implementation.

use anyhow::{Context, Result};
use clap::Args;

use booth_core::RecordStore;

use crate::backend::CliBackend;
use crate::output;

#[derive(Args, Debug)]
pub struct LikeArgs {
    /// Booth id
    pub id: String,
}

pub async fn run(store: CliBackend, args: LikeArgs) -> Result<()> {
    let id = super::parse_id(&args.id)?;
    let record = store
        .increment_likes(&id)
        .await
        .context("Failed to like booth")?;

    println!("{}", record.likes);
    output::success(&format!("Liked {} ({} likes)", record.title, record.likes));

    Ok(())
}
