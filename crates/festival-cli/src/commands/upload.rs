//! Upload command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use booth_core::{Error, ImageFile, UploadForm, image_content_type};

use crate::backend::CliBackend;
use crate::output;

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Image file for the booth
    pub image: PathBuf,

    /// Booth title
    #[arg(long)]
    pub title: String,

    /// Name of the student who made the booth
    #[arg(long, alias = "students-name")]
    pub author: String,

    /// What the booth offers
    #[arg(long)]
    pub description: String,

    /// Image content type (guessed from the extension by default)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Output the created record as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(store: CliBackend, args: UploadArgs) -> Result<()> {
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let file_name = args
        .image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = args.content_type.clone().unwrap_or_else(|| {
        args.image
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(image_content_type)
            .unwrap_or("application/octet-stream")
            .to_string()
    });

    let form = UploadForm {
        title: args.title,
        author: args.author,
        description: args.description,
        image: Some(ImageFile::new(file_name, content_type, bytes)),
    };

    let record = match store.upload_form(form).await {
        Ok(record) => record,
        Err(Error::Validation(errors)) => {
            for err in errors.errors() {
                output::error(&err.message);
            }
            anyhow::bail!("Booth form is invalid");
        }
        Err(Error::Protocol(err)) if !err.fields.is_empty() => {
            for field in &err.fields {
                output::error(&field.message);
            }
            anyhow::bail!("Booth form is invalid");
        }
        Err(e) => return Err(e).context("Failed to upload booth"),
    };

    if args.json {
        output::json_pretty(&record)?;
    } else {
        println!("{}", record.id);
    }
    output::success(&format!("Uploaded booth: {}", record.title));

    Ok(())
}
