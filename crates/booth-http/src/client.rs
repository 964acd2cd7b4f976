//! JSON-over-HTTP client for the booth server API.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use booth_core::error::{Error, ErrorBody, InvalidInputError, ProtocolError, TransportError};
use booth_core::{Result, StoreUrl};

/// HTTP client bound to one server base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: StoreUrl,
}

pub(crate) fn map_reqwest(err: reqwest::Error) -> Error {
    if err.is_connect() || err.is_timeout() {
        Error::Transport(TransportError::Connection {
            message: err.to_string(),
        })
    } else if err.is_decode() {
        Error::InvalidInput(InvalidInputError::Json {
            message: err.to_string(),
        })
    } else {
        Error::Transport(TransportError::Http {
            message: err.to_string(),
        })
    }
}

impl ApiClient {
    /// Create a client for the server at `base`.
    pub fn new(base: StoreUrl) -> Result<Self> {
        if !base.is_network() {
            return Err(InvalidInputError::StoreUrl {
                value: base.to_string(),
                reason: "HTTP client needs an http(s) URL".to_string(),
            }
            .into());
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("booth-http/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(map_reqwest)?;

        Ok(Self { client, base })
    }

    pub fn base(&self) -> &StoreUrl {
        &self.base
    }

    /// URL for `segments` under the base, each segment percent-encoded.
    pub fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.base.as_url().clone();
        url.path_segments_mut()
            .map_err(|_| InvalidInputError::StoreUrl {
                value: self.base.to_string(),
                reason: "cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "API request");
        self.client.request(method, url)
    }

    /// GET and decode a JSON body.
    #[instrument(skip(self, query), fields(base = %self.base))]
    pub async fn get_json<Q, R>(&self, url: Url, query: &Q) -> Result<R>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, url)
            .query(query)
            .send()
            .await
            .map_err(map_reqwest)?;
        self.handle_response(response).await
    }

    /// Send a JSON body and decode the JSON response.
    #[instrument(skip(self, body), fields(base = %self.base))]
    pub async fn send_json<B, R>(&self, method: Method, url: Url, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest)?;
        self.handle_response(response).await
    }

    /// Send a request with no body and decode the JSON response.
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn send_empty<R: DeserializeOwned>(&self, method: Method, url: Url) -> Result<R> {
        let response = self
            .request(method, url)
            .send()
            .await
            .map_err(map_reqwest)?;
        self.handle_response(response).await
    }

    /// Send a request whose success response has no body.
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn send_no_content(&self, method: Method, url: Url) -> Result<()> {
        let response = self
            .request(method, url)
            .send()
            .await
            .map_err(map_reqwest)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Protocol(self.parse_error_response(response).await))
        }
    }

    /// PUT raw bytes with a content type and decode the JSON response.
    #[instrument(skip(self, bytes), fields(base = %self.base, size = bytes.len()))]
    pub async fn put_bytes<R: DeserializeOwned>(
        &self,
        url: Url,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<R> {
        let response = self
            .request(Method::PUT, url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(map_reqwest)?;
        self.handle_response(response).await
    }

    /// GET a raw body.
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn get_bytes(&self, url: Url) -> Result<Vec<u8>> {
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(map_reqwest)?;
        if !response.status().is_success() {
            return Err(Error::Protocol(self.parse_error_response(response).await));
        }
        let bytes = response.bytes().await.map_err(map_reqwest)?;
        Ok(bytes.to_vec())
    }

    /// POST a multipart form and decode the JSON response.
    #[instrument(skip(self, form), fields(base = %self.base))]
    pub async fn post_multipart<R: DeserializeOwned>(
        &self,
        url: Url,
        form: reqwest::multipart::Form,
    ) -> Result<R> {
        let response = self
            .request(Method::POST, url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest)?;
        self.handle_response(response).await
    }

    async fn handle_response<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "API response");

        if status.is_success() {
            response.json::<R>().await.map_err(map_reqwest)
        } else {
            Err(Error::Protocol(self.parse_error_response(response).await))
        }
    }

    async fn parse_error_response(&self, response: reqwest::Response) -> ProtocolError {
        let status = response.status().as_u16();

        match response.json::<ErrorBody>().await {
            Ok(body) => body.into_protocol_error(status),
            Err(_) => ProtocolError::new(status, None, None),
        }
    }
}
