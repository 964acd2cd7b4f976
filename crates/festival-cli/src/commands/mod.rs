//! Subcommand implementations.

pub mod dashboard;
pub mod delete;
pub mod like;
pub mod list;
pub mod serve;
pub mod show;
pub mod upload;
pub mod watch;

use anyhow::{Context, Result};

use booth_core::BoothId;

use crate::backend::CliBackend;
use crate::cli::{Cli, Commands};

pub async fn handle(cli: Cli) -> Result<()> {
    let store = cli.store.as_deref();
    match cli.command {
        Commands::Serve(args) => serve::run(store, args).await,
        Commands::Upload(args) => upload::run(CliBackend::from_arg(store)?, args).await,
        Commands::List(args) => list::run(CliBackend::from_arg(store)?, args).await,
        Commands::Show(args) => show::run(CliBackend::from_arg(store)?, args).await,
        Commands::Like(args) => like::run(CliBackend::from_arg(store)?, args).await,
        Commands::Delete(args) => delete::run(CliBackend::from_arg(store)?, args).await,
        Commands::Watch(args) => watch::run(CliBackend::from_arg(store)?, args).await,
        Commands::Dashboard(args) => dashboard::run(CliBackend::from_arg(store)?, args).await,
    }
}

/// Parse a booth id argument.
pub(crate) fn parse_id(id: &str) -> Result<BoothId> {
    BoothId::new(id).context("Invalid booth id")
}
