//! Slack RTM listener - keeps the websocket alive and queues incoming events

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::application::errors::BotError;
use super::SlackClient;

const QUEUE_CAPACITY: usize = 64;

/// Events delivered to the main loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtmEvent {
    /// Websocket established and greeted by Slack
    Hello,
    Message { channel: String, text: String },
    /// Slack rejected the token
    InvalidAuth,
    /// The connection could not be re-established
    ConnectionLost(String),
}

/// Decoded RTM frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtmFrame {
    Event(RtmEvent),
    /// Server is about to close; reconnect
    Goodbye,
    Ignored,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

/// Parse a text frame from the RTM socket
pub fn parse_frame(text: &str) -> Result<RtmFrame, BotError> {
    let frame: RawFrame = serde_json::from_str(text)
        .map_err(|e| BotError::Parse(format!("invalid RTM frame: {}", e)))?;

    let frame = match frame.kind.as_deref() {
        Some("hello") => RtmFrame::Event(RtmEvent::Hello),
        Some("goodbye") => RtmFrame::Goodbye,
        Some("message") if frame.subtype.as_deref() != Some("bot_message") => {
            match (frame.channel, frame.text) {
                (Some(channel), Some(text)) => RtmFrame::Event(RtmEvent::Message { channel, text }),
                _ => RtmFrame::Ignored,
            }
        }
        Some("error") => {
            if let Some(error) = frame.error {
                tracing::warn!("RTM error {}: {}", error.code, error.msg);
            }
            RtmFrame::Ignored
        }
        _ => RtmFrame::Ignored,
    };
    Ok(frame)
}

enum SessionEnd {
    Reconnect,
    ReceiverClosed,
}

/// Owns the RTM websocket and feeds events into a queue
pub struct RtmListener {
    client: Arc<SlackClient>,
    ping_interval: Duration,
    reconnect_delay: Duration,
}

impl RtmListener {
    pub fn new(client: Arc<SlackClient>) -> Self {
        Self {
            client,
            ping_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(1),
        }
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval.max(Duration::from_secs(1));
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Start managing the connection in the background
    pub fn spawn(self) -> (mpsc::Receiver<RtmEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let handle = tokio::spawn(self.manage_connection(tx));
        (rx, handle)
    }

    async fn manage_connection(self, tx: mpsc::Sender<RtmEvent>) {
        loop {
            let connection = match self.client.rtm_connect().await {
                Ok(connection) => connection,
                Err(BotError::Auth(error)) => {
                    tracing::warn!("rtm.connect rejected token: {}", error);
                    let _ = tx.send(RtmEvent::InvalidAuth).await;
                    return;
                }
                Err(e) => {
                    let _ = tx.send(RtmEvent::ConnectionLost(e.to_string())).await;
                    return;
                }
            };

            tracing::debug!("Opening RTM socket (self: {:?})", connection.self_id);
            match self.run_session(&connection.url, &tx).await {
                Ok(SessionEnd::ReceiverClosed) => return,
                Ok(SessionEnd::Reconnect) => tracing::info!("RTM socket closed, reconnecting"),
                Err(e) => tracing::warn!("RTM session ended: {}", e),
            }

            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn run_session(&self, url: &str, tx: &mpsc::Sender<RtmEvent>) -> Result<SessionEnd, BotError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| BotError::Connection(e.to_string()))?;
        let (mut sink, mut source) = stream.split();

        let mut ping = tokio::time::interval(self.ping_interval);
        ping.tick().await;
        let mut next_id: u64 = 1;

        loop {
            tokio::select! {
                frame = source.next() => {
                    let Some(frame) = frame else {
                        return Ok(SessionEnd::Reconnect);
                    };
                    let frame = frame.map_err(|e| BotError::Connection(e.to_string()))?;
                    let text = match frame {
                        WsMessage::Text(text) => text,
                        WsMessage::Close(_) => return Ok(SessionEnd::Reconnect),
                        _ => continue,
                    };

                    match parse_frame(text.as_str()) {
                        Ok(RtmFrame::Event(event)) => {
                            if tx.send(event).await.is_err() {
                                return Ok(SessionEnd::ReceiverClosed);
                            }
                        }
                        Ok(RtmFrame::Goodbye) => return Ok(SessionEnd::Reconnect),
                        Ok(RtmFrame::Ignored) => {}
                        Err(e) => tracing::debug!("Skipping frame: {}", e),
                    }
                }
                _ = ping.tick() => {
                    let payload = json!({ "id": next_id, "type": "ping" }).to_string();
                    next_id += 1;
                    sink.send(WsMessage::Text(payload.into()))
                        .await
                        .map_err(|e| BotError::Connection(e.to_string()))?;
                }
            }
        }
    }
}
