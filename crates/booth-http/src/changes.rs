//! Change stream over the server's WebSocket endpoint.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{SinkExt, Stream, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};

use booth_core::error::{Error, TransportError};
use booth_core::{ChangeEvent, Result};

/// Change notifications from a remote booth server.
///
/// Dropping the stream closes the WebSocket.
pub struct HttpChanges {
    inner: Pin<Box<dyn Stream<Item = Result<ChangeEvent>> + Send>>,
}

impl HttpChanges {
    /// Connect to a change WebSocket at `ws_url`.
    ///
    /// Returns once the handshake has completed, so every change the server
    /// applies afterwards is delivered.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        info!(url = %ws_url, "Connecting to change stream");

        let (ws_stream, _) = connect_async(ws_url).await.map_err(|e| {
            Error::Transport(TransportError::Connection {
                message: e.to_string(),
            })
        })?;

        debug!("WebSocket connected, listening for changes");

        let stream = async_stream::stream! {
            let (mut write, mut read) = ws_stream.split();

            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        yield serde_json::from_str::<ChangeEvent>(&text).map_err(Error::json);
                    }
                    Ok(Message::Ping(data)) => {
                        trace!("Received ping");
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            warn!(error = %e, "Failed to send pong");
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        info!(?frame, "Change stream closed by server");
                        break;
                    }
                    Ok(Message::Binary(data)) => {
                        trace!(len = data.len(), "Ignoring binary message");
                    }
                    Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                    Err(e) => {
                        error!(error = %e, "WebSocket error");
                        yield Err(Error::Transport(TransportError::Connection {
                            message: e.to_string(),
                        }));
                        break;
                    }
                }
            }
        };

        Ok(Self {
            inner: Box::pin(stream),
        })
    }
}

impl Stream for HttpChanges {
    type Item = Result<ChangeEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
