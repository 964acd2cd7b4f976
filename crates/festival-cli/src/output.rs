//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use booth_core::{BoothRecord, Notice};

/// Print a success message.
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// One-line summary of a booth.
pub fn booth_line(record: &BoothRecord, selected: bool) {
    let marker = if selected { "▶".cyan() } else { " ".normal() };
    println!(
        "{} {:>4} {}  {}  {} {}",
        marker,
        record.likes,
        "♥".red(),
        record.title.bold(),
        record.author.dimmed(),
        format!("[{}]", record.id).dimmed()
    );
}

/// Every field of a booth.
pub fn booth_detail(record: &BoothRecord) {
    field("ID", record.id.as_str());
    field("Title", &record.title);
    field("Student", &record.author);
    field("Description", &record.description);
    field("Image", &record.image_url);
    field("Likes", &record.likes.to_string());
    field("Created", &record.created_at.to_rfc3339());
}

/// A toast from the feed.
pub fn notice(notice: &Notice) {
    if notice.is_error() {
        error(&notice.to_string());
    } else {
        eprintln!("{} {}", "●".blue(), notice);
    }
}
