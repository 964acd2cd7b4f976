//! Serve command implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;
use url::Url;

use booth_server::ServerConfig;
use booth_server::config::DEFAULT_MAX_UPLOAD_BYTES;

use crate::backend::{CliBackend, resolve_store};
use crate::output;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "FESTIVAL_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Externally visible base URL (used for image URLs)
    #[arg(long, env = "FESTIVAL_PUBLIC_URL")]
    pub public_url: Option<Url>,

    /// Allowed CORS origins: "*" or a comma-separated list
    #[arg(long, env = "FESTIVAL_CORS_ORIGINS")]
    pub cors_origins: Option<String>,

    /// Largest accepted request body in bytes
    #[arg(long, env = "FESTIVAL_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

pub async fn run(store: Option<&str>, args: ServeArgs) -> Result<()> {
    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    let config = ServerConfig {
        bind: listener.local_addr()?,
        public_url: args.public_url,
        cors_origins: args.cors_origins,
        max_upload_bytes: args.max_upload_bytes,
    };

    let url = resolve_store(store)?;
    let backend = match CliBackend::open(&url)? {
        CliBackend::File(file) => match config.storage_base() {
            Some(base) => CliBackend::File(file.with_public_base(base)),
            None => CliBackend::File(file),
        },
        CliBackend::Memory(memory) => match config.storage_base() {
            Some(base) => CliBackend::Memory(memory.with_public_base(base.as_str())),
            None => CliBackend::Memory(memory),
        },
        remote => remote,
    };

    output::success(&format!("Serving {} on http://{}", url, config.bind));

    booth_server::serve(listener, Arc::new(backend), config)
        .await
        .context("Server failed")
}
