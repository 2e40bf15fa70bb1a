//! Pusher wire format.
//!
//! Inbound frames are an outer JSON object whose `data` member is itself a
//! JSON document encoded as a string, so decoding takes two parse passes.
//! Outbound control frames carry `data` as a plain object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KickError, Result};

pub const SUBSCRIBE_EVENT: &str = "pusher:subscribe";
pub const UNSUBSCRIBE_EVENT: &str = "pusher:unsubscribe";

/// Outer frame as it arrives on the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// One successfully decoded frame.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// The outer frame, `data` still string-encoded.
    pub raw: Value,
    pub event: String,
    pub channel: Option<String>,
    /// The inner document parsed from `data`.
    pub payload: Value,
}

/// Decodes a single text frame.
///
/// # Errors
///
/// [`KickError::Protocol`] when the outer frame is not JSON, lacks a string
/// `event` or `data`, or when `data` does not hold valid JSON.
pub fn decode_frame(text: &str) -> Result<DecodedFrame> {
    let raw: Value = serde_json::from_str(text)
        .map_err(|e| KickError::Protocol(format!("malformed frame: {}", e)))?;

    let envelope: Envelope = serde_json::from_value(raw.clone())
        .map_err(|e| KickError::Protocol(format!("malformed envelope: {}", e)))?;

    let payload: Value = serde_json::from_str(&envelope.data).map_err(|e| {
        KickError::Protocol(format!(
            "malformed data for event {}: {}",
            envelope.event, e
        ))
    })?;

    Ok(DecodedFrame {
        raw,
        event: envelope.event,
        channel: envelope.channel,
        payload,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionData {
    pub auth: String,
    pub channel: String,
}

/// Subscription control frame sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlFrame {
    pub event: &'static str,
    pub data: SubscriptionData,
}

impl ControlFrame {
    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self::new(SUBSCRIBE_EVENT, topic.into())
    }

    pub fn unsubscribe(topic: impl Into<String>) -> Self {
        Self::new(UNSUBSCRIBE_EVENT, topic.into())
    }

    fn new(event: &'static str, channel: String) -> Self {
        Self {
            event,
            data: SubscriptionData {
                auth: String::new(),
                channel,
            },
        }
    }

    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
