//! Dashboard command implementation.
//!
//! Runs a feed against the store and reads commands from stdin, one per
//! line:
//!
//! ```text
//! like <id>      like a booth
//! select <id>    show a booth's details
//! close          clear the selection
//! sort created|likes
//! refresh        reload the feed
//! list           print the feed
//! quit
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use booth_core::{FeedEvent, FeedSynchronizer, SortKey};

use crate::backend::CliBackend;
use crate::output;

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Initial sort: createdAt or likes
    #[arg(long, default_value = "createdAt")]
    pub sort: SortKey,
}

enum Command {
    Like(String),
    Select(String),
    Close,
    Sort(SortKey),
    Refresh,
    List,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let command = match (verb, arg) {
        ("like", Some(id)) => Command::Like(id.to_string()),
        ("select", Some(id)) => Command::Select(id.to_string()),
        ("close", None) => Command::Close,
        ("sort", Some(key)) => {
            Command::Sort(key.parse().map_err(|_| format!("Unknown sort key: {}", key))?)
        }
        ("refresh", None) => Command::Refresh,
        ("list", None) => Command::List,
        ("quit", None) | ("exit", None) => Command::Quit,
        _ => return Err(format!("Unknown command: {}", line.trim())),
    };
    Ok(Some(command))
}

pub async fn run(store: CliBackend, args: DashboardArgs) -> Result<()> {
    let mut feed = FeedSynchronizer::mount(Arc::new(store), args.sort)
        .await
        .context("Failed to open the feed")?;

    print_feed(&feed);
    print_notices(&mut feed);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => execute(&mut feed, command).await,
                    Ok(None) => {}
                    Err(message) => output::error(&message),
                }
            }
            Some(event) = feed.next_event(), if feed.is_live() => report(&feed, &event),
        }
        print_notices(&mut feed);
    }

    feed.unmount();
    Ok(())
}

async fn execute(feed: &mut FeedSynchronizer<CliBackend>, command: Command) {
    match command {
        Command::Like(id) => match super::parse_id(&id) {
            Ok(id) => {
                if !feed.like(&id) {
                    output::error(&format!("No booth {} in the feed", id));
                } else if let Some(record) = feed.state().find(&id) {
                    output::booth_line(record, feed.selected().is_some_and(|s| s.id == id));
                }
            }
            Err(e) => output::error(&format!("{:#}", e)),
        },
        Command::Select(id) => match super::parse_id(&id) {
            Ok(id) => match feed.select(&id) {
                Some(record) => output::booth_detail(record),
                None => output::error(&format!("No booth {} in the feed", id)),
            },
            Err(e) => output::error(&format!("{:#}", e)),
        },
        Command::Close => feed.clear_selection(),
        Command::Sort(sort) => {
            feed.set_sort(sort).await;
            print_feed(feed);
        }
        Command::Refresh => {
            feed.refresh().await;
            print_feed(feed);
        }
        Command::List => print_feed(feed),
        Command::Quit => {}
    }
}

fn report(feed: &FeedSynchronizer<CliBackend>, event: &FeedEvent) {
    match event {
        FeedEvent::Changed { op, id } => {
            let label = op.to_string().yellow();
            match feed.state().find(id) {
                Some(record) => {
                    print!("{} ", label);
                    output::booth_line(record, feed.selected().is_some_and(|s| &s.id == id));
                }
                None => println!("{} {}", label, id.as_str().dimmed()),
            }
        }
        FeedEvent::LikeConfirmed { id, likes } => {
            tracing::debug!(%id, likes, "Like confirmed");
        }
        FeedEvent::LikeFailed { .. } => {}
        FeedEvent::StreamError { message } => output::error(message),
        FeedEvent::StreamEnded => {
            eprintln!("{}", "Change stream ended; the feed is no longer live.".dimmed());
        }
    }
}

fn print_feed(feed: &FeedSynchronizer<CliBackend>) {
    let records = feed.records();
    eprintln!(
        "{}",
        format!("{} booths, sorted by {}", records.len(), feed.sort()).dimmed()
    );
    let selected = feed.selected().map(|s| s.id.clone());
    for record in records {
        output::booth_line(record, selected.as_ref() == Some(&record.id));
    }
}

fn print_notices(feed: &mut FeedSynchronizer<CliBackend>) {
    for notice in feed.take_notices() {
        output::notice(&notice);
    }
}
