//! WebSocket transport for the realtime channel.

use async_trait::async_trait;
use client_core::SimulationUpdateEvent;
use futures::{StreamExt, future};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::channel::{ChannelError, EventStream, RealtimeConnector};

/// Connects with `tokio-tungstenite` and decodes JSON text frames of the form
/// `{"type": "...", "payload": ...}`.
///
/// Binary and control frames are skipped; a close frame ends the stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl RealtimeConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<EventStream, ChannelError> {
        let (socket, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|err| ChannelError::Connect {
                url: url.to_string(),
                reason: err.to_string(),
            })?;

        tracing::debug!("WebSocket handshake with {} complete", url);

        let events = socket
            .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
            .filter_map(|frame| future::ready(decode_frame(frame)))
            .boxed();

        Ok(events)
    }
}

fn decode_frame(
    frame: Result<Message, WsError>,
) -> Option<Result<SimulationUpdateEvent, ChannelError>> {
    match frame {
        Ok(Message::Text(text)) => Some(
            serde_json::from_str(&text).map_err(|err| ChannelError::Decode(err.to_string())),
        ),
        Ok(_) => None,
        Err(err) => Some(Err(ChannelError::Transport(err.to_string()))),
    }
}
