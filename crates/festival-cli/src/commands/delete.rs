//! Delete command implementation.

use anyhow::{Context, Result};
use clap::Args;

use booth_core::RecordStore;

use crate::backend::CliBackend;
use crate::output;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Booth id
    pub id: String,
}

pub async fn run(store: CliBackend, args: DeleteArgs) -> Result<()> {
    let id = super::parse_id(&args.id)?;
    store.delete(&id).await.context("Failed to delete booth")?;

    output::success(&format!("Deleted booth: {}", id));

    Ok(())
}
