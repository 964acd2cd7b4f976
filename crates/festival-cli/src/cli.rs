//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{dashboard, delete, like, list, serve, show, upload, watch};

/// Festival booth feed: upload, browse, like and serve booths.
#[derive(Parser, Debug)]
#[command(name = "festival")]
#[command(author, version = env!("FESTIVAL_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Store to use: file:///path, http(s)://host or memory:
    /// (defaults to a store in the user data directory)
    #[arg(long, env = "FESTIVAL_STORE", global = true)]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the store over HTTP
    Serve(serve::ServeArgs),

    /// Upload a new booth
    Upload(upload::UploadArgs),

    /// List booths
    List(list::ListArgs),

    /// Show a single booth
    Show(show::ShowArgs),

    /// Like a booth
    Like(like::LikeArgs),

    /// Delete a booth
    Delete(delete::DeleteArgs),

    /// Print change notifications as they happen
    Watch(watch::WatchArgs),

    /// Follow the live feed interactively
    Dashboard(dashboard::DashboardArgs),
}
