//! Change notifications over WebSocket.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use booth_core::{ChangeStream, RecordStore, Subscription};

use crate::error::ApiError;
use crate::state::{AppState, Backend};

/// Upgrade to a WebSocket that carries one text frame per change.
///
/// The store subscription is taken before the upgrade completes, so a
/// client that has finished its handshake sees every later change.
pub async fn changes_handler<S: Backend>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
) -> Result<Response, ApiError> {
    let changes = state.store.subscribe().await?;
    Ok(ws.on_upgrade(move |socket| forward_changes(socket, changes)))
}

async fn forward_changes<C: ChangeStream>(socket: WebSocket, changes: C) {
    let connection_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = Subscription::new(changes);

    info!(connection_id = %connection_id, "Change stream connection established");

    loop {
        tokio::select! {
            change = subscription.next() => match change {
                Some(Ok(event)) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(connection_id = %connection_id, error = %e, "Failed to encode change");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!(connection_id = %connection_id, "Client went away");
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!(connection_id = %connection_id, error = %e, "Change stream error");
                }
                None => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    info!(connection_id = %connection_id, "Change stream closed by client");
                    break;
                }
                Some(Err(e)) => {
                    warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    subscription.unsubscribe();
    info!(connection_id = %connection_id, "Change stream connection terminated");
}
