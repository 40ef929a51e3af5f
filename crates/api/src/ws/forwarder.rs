//! Relays job events from the bus to every WebSocket client.

use std::sync::Arc;

use axum::extract::ws::Message;
use csvtx_events::{JobEvent, Subscription};

use crate::ws::WsManager;

/// Bus observer that serializes each [`JobEvent`] to a JSON text frame and
/// broadcasts it.
pub struct EventForwarder {
    ws_manager: Arc<WsManager>,
}

impl EventForwarder {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run until the bus closes.
    pub async fn run(self, mut subscription: Subscription) {
        while let Some(event) = subscription.next().await {
            match encode(&event) {
                Ok(message) => self.ws_manager.broadcast(message).await,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        job_id = event.job_id,
                        "Failed to encode job event"
                    );
                }
            }
        }
        tracing::info!("Event bus closed, WebSocket forwarder shutting down");
    }
}

fn encode(event: &JobEvent) -> serde_json::Result<Message> {
    Ok(Message::Text(serde_json::to_string(event)?.into()))
}
