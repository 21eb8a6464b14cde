//! NotificationDispatcher - Device Command-Channel Adapter
//!
//! ## Responsibilities
//!
//! - Open a one-shot command-channel session to an in-room device
//! - Issue exactly one Message Send command with a tagged payload
//! - Await the single response, close the session
//!
//! The session lives for one call. No pooling, no reuse: acceptable at
//! prototype volume, revisit under load.

use base64::Engine;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::booking_client::DeviceEndpoint;
use crate::entry_workflow::capabilities::CommandChannel;
use crate::error::{Error, Result};

/// Message-kind tag carried in front of every payload on the channel
pub const MESSAGE_TAG: &str = "711";

/// Message kind: greeting shown when someone enters the room
pub const GREETING_MESSAGE_ID: u32 = 1;

/// Message kind: follow-up sent after a "yes" choice from the device
pub const FOLLOW_UP_MESSAGE_ID: u32 = 2;

/// Request id used for the single command of a session
const COMMAND_ID: u64 = 1;

/// Greeting payload pushed to the in-room device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreetingMessage {
    pub message_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Follow-up payload answering a device choice
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpMessage {
    pub message_id: u32,
}

/// Response frame of the device command protocol
#[derive(Debug, Deserialize)]
struct CommandResponseFrame {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Prefix a payload with the message-kind tag
pub fn tag_payload(payload: &str) -> String {
    format!("{}:{}", MESSAGE_TAG, payload)
}

/// Build the single Message Send command of a session
fn build_command(tagged: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": COMMAND_ID,
        "method": "xCommand/Message/Send",
        "params": { "Text": tagged }
    })
}

/// Device command-channel dispatcher
pub struct Dispatcher;

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new() -> Self {
        Self
    }

    /// Send a raw text payload over a one-shot session
    pub async fn send_text(&self, endpoint: &DeviceEndpoint, message: &str) -> Result<Value> {
        let tagged = tag_payload(message);
        tracing::info!(
            device_ip = %endpoint.ip,
            message = %tagged,
            "Sending message to device"
        );
        self.run_session(endpoint, &tagged).await
    }

    /// Serialize a structured payload and send it over a one-shot session
    pub async fn send_json(&self, endpoint: &DeviceEndpoint, payload: &Value) -> Result<Value> {
        let encoded = serde_json::to_string(payload)?;
        self.send_text(endpoint, &encoded).await
    }

    /// Connect, issue one command, await its response, disconnect
    async fn run_session(&self, endpoint: &DeviceEndpoint, tagged: &str) -> Result<Value> {
        let url = format!("ws://{}/ws", endpoint.ip);
        let mut request = url
            .into_client_request()
            .map_err(|e| Error::Dispatch(format!("Bad device endpoint {}: {}", endpoint.ip, e)))?;

        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", endpoint.username, endpoint.password));
        let auth = format!("Basic {}", credentials)
            .parse()
            .map_err(|e| Error::Dispatch(format!("Bad credentials: {}", e)))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let (stream, _) = connect_async(request)
            .await
            .map_err(|e| Error::Dispatch(format!("Connect to {} failed: {}", endpoint.ip, e)))?;
        let (mut sink, mut source) = stream.split();

        let command = build_command(tagged);
        sink.send(Message::Text(command.to_string()))
            .await
            .map_err(|e| Error::Dispatch(format!("Command send failed: {}", e)))?;

        // One command per session, so the first matching frame ends it
        let mut response = None;
        while let Some(frame) = source.next().await {
            let frame =
                frame.map_err(|e| Error::Dispatch(format!("Command channel error: {}", e)))?;
            match frame {
                Message::Text(text) => {
                    let parsed: CommandResponseFrame = serde_json::from_str(&text)
                        .map_err(|e| Error::Dispatch(format!("Malformed response: {}", e)))?;
                    if parsed.id != Some(COMMAND_ID) {
                        continue;
                    }
                    if let Some(error) = parsed.error {
                        return Err(Error::Dispatch(format!("Device rejected command: {}", error)));
                    }
                    response = Some(parsed.result.unwrap_or(Value::Null));
                    break;
                }
                Message::Close(_) => break,
                _ => continue,
            }
        }

        let _ = sink.send(Message::Close(None)).await;

        response.ok_or_else(|| {
            Error::Dispatch("Session closed before the command response arrived".to_string())
        })
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommandChannel for Dispatcher {
    async fn send_json(&self, endpoint: &DeviceEndpoint, payload: &Value) -> Result<Value> {
        Dispatcher::send_json(self, endpoint, payload).await
    }
}
