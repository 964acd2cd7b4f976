//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};
use url::Url;

/// Default request body limit: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Resolved settings for one server instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,
    /// Externally visible base URL, used to build public blob URLs.
    pub public_url: Option<Url>,
    /// `*` or a comma-separated list of allowed origins. `None` disables CORS.
    pub cors_origins: Option<String>,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            public_url: None,
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Base URL for blobs served by this instance: `<public>/storage/`.
    ///
    /// Falls back to the bind address when no public URL is set.
    pub fn storage_base(&self) -> Option<Url> {
        let base = match &self.public_url {
            Some(url) => url.clone(),
            None => Url::parse(&format!("http://{}/", self.bind)).ok()?,
        };
        let path = format!("{}/storage/", base.path().trim_end_matches('/'));
        let mut url = base;
        url.set_path(&path);
        Some(url)
    }

    /// CORS layer for the configured origins, or `None` to leave CORS off.
    pub fn build_cors_layer(&self) -> Option<CorsLayer> {
        let allowed_origins = self
            .cors_origins
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;

        let mut cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE]);

        if allowed_origins == "*" {
            cors = cors.allow_origin(Any);
        } else {
            let origins: Vec<HeaderValue> = allowed_origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| HeaderValue::from_str(s).ok())
                .collect();

            if origins.is_empty() {
                return None;
            }

            cors = cors.allow_origin(origins);
        }

        Some(cors)
    }
}
