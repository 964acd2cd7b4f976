//! Store URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated store location.
///
/// Three kinds of store are addressable:
///
/// - `http://` / `https://`: a running `booth-server`. Plain HTTP is only
///   accepted for localhost.
/// - `file:///path/to/store`: a filesystem-backed store.
/// - `memory:`: a process-local in-memory store.
///
/// # Example
///
/// ```
/// use booth_core::StoreUrl;
///
/// let remote = StoreUrl::new("https://festival.example.com").unwrap();
/// assert_eq!(remote.api_url("api/festivals"),
///            "https://festival.example.com/api/festivals");
///
/// let local = StoreUrl::new("file:///tmp/festival").unwrap();
/// assert!(local.is_local());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreUrl(Url);

impl StoreUrl {
    /// Create a new store URL from a string, validating the format.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::StoreUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        let normalized = if url.path() == "/" {
            let mut u = url.clone();
            u.set_path("");
            u
        } else {
            url
        };

        Ok(Self(normalized))
    }

    /// Build a `file://` store URL from a directory path.
    pub fn from_directory(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let url = Url::from_directory_path(path).map_err(|_| InvalidInputError::StoreUrl {
            value: path.display().to_string(),
            reason: "must be an absolute directory path".to_string(),
        })?;
        Self::new(url.as_str())
    }

    /// Returns the URL for an API path under this store.
    pub fn api_url(&self, path: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    /// Returns the WebSocket URL for an API path under this store.
    pub fn ws_url(&self, path: &str) -> String {
        let http = self.api_url(path);
        if let Some(rest) = http.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = http.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            http
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Returns true for a filesystem-backed store.
    pub fn is_local(&self) -> bool {
        self.0.scheme() == "file"
    }

    /// Returns true for an HTTP(S) store.
    pub fn is_network(&self) -> bool {
        let scheme = self.0.scheme();
        scheme == "http" || scheme == "https"
    }

    /// Returns true for the in-memory store.
    pub fn is_memory(&self) -> bool {
        self.0.scheme() == "memory"
    }

    /// Returns the filesystem path for `file://` URLs.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.is_local() {
            self.0.to_file_path().ok()
        } else {
            None
        }
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        let invalid = |reason: &str| -> Error {
            InvalidInputError::StoreUrl {
                value: original.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        match url.scheme() {
            "memory" => Ok(()),
            "file" => {
                if url.path().is_empty() || url.path() == "/" {
                    return Err(invalid("file:// URL must have a path"));
                }
                Ok(())
            }
            "https" | "http" => {
                let Some(host) = url.host_str() else {
                    return Err(invalid("must have a host"));
                };

                let is_localhost =
                    host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "::1";

                if url.scheme() == "http" && !is_localhost {
                    return Err(invalid("must use HTTPS (HTTP allowed only for localhost)"));
                }
                Ok(())
            }
            _ => Err(invalid("scheme must be http, https, file or memory")),
        }
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StoreUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for StoreUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for StoreUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StoreUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let store = StoreUrl::new("https://festival.example.com").unwrap();
        assert!(store.is_network());
        assert!(!store.is_local());
    }

    #[test]
    fn localhost_http_allowed() {
        let store = StoreUrl::new("http://127.0.0.1:3000").unwrap();
        assert_eq!(
            store.api_url("/api/festivals"),
            "http://127.0.0.1:3000/api/festivals"
        );
        assert_eq!(
            store.ws_url("api/festivals/changes"),
            "ws://127.0.0.1:3000/api/festivals/changes"
        );
    }

    #[test]
    fn trailing_slash_normalized() {
        let store = StoreUrl::new("https://festival.example.com/").unwrap();
        assert_eq!(
            store.api_url("api/health"),
            "https://festival.example.com/api/health"
        );
        assert_eq!(
            store.ws_url("api/festivals/changes"),
            "wss://festival.example.com/api/festivals/changes"
        );
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(StoreUrl::new("http://festival.example.com").is_err());
    }

    #[test]
    fn invalid_scheme() {
        assert!(StoreUrl::new("ftp://festival.example.com").is_err());
        assert!(StoreUrl::new("not a url").is_err());
    }

    #[test]
    fn file_url_to_path() {
        #[cfg(unix)]
        {
            let store = StoreUrl::new("file:///tmp/festival").unwrap();
            assert!(store.is_local());
            assert_eq!(
                store.to_file_path().unwrap(),
                std::path::PathBuf::from("/tmp/festival")
            );
        }
    }

    #[test]
    fn memory_url() {
        let store = StoreUrl::new("memory:").unwrap();
        assert!(store.is_memory());
        assert!(store.to_file_path().is_none());
    }
}
