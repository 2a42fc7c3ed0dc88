//! Transport seam and wire message model
//!
//! The session layer never opens sockets itself. A transport implementation
//! (WebSocket, TCP, an in-process mock) is handed in at build time behind the
//! [`Transport`] trait and delivers inbound traffic as [`TransportEvent`]s on
//! an mpsc channel. Framing, reconnection and backoff are the transport's
//! problem; this layer only sees whole messages.
//!
//! Wire messages are JSON objects with camelCase keys. Outbound requests carry
//! `sequenceId`; inbound messages are either replies (positive
//! `replySequenceId` plus `status`) or events (a `name`). Classification is
//! total: see [`WireMessage::classify`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientResult;

/// Action names understood by the server
pub mod actions {
    pub const AUTH: &str = "auth";
    pub const ANSWER: &str = "call.answer";
    pub const HANGUP: &str = "call.hangup";
    pub const HOLD: &str = "call.hold";
    pub const UNHOLD: &str = "call.unhold";
    pub const DTMF: &str = "call.dtmf";
    pub const TRANSFER: &str = "call.transfer";
    pub const MUTE: &str = "call.mute";
    pub const BRIDGE: &str = "call.bridge";
    pub const EAVESDROP: &str = "call.eavesdrop";
    pub const ROUTE_TO_USER: &str = "call.routeToUser";
}

/// Event names with dedicated inbound handling
pub mod event_names {
    /// First message of a session; carries connection metadata
    pub const GREETING: &str = "greeting";
    /// Call lifecycle transitions
    pub const CALL: &str = "call";
}

/// Reply status reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "FAIL")]
    Fail,
}

/// Outbound request frame: `{ sequenceId, action, payload }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFrame {
    /// Per-connection monotonically increasing correlation id
    pub sequence_id: u64,
    /// Server operation to invoke
    pub action: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

/// Raw inbound wire message before classification
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireMessage {
    /// Positive when this message answers an outbound request
    pub reply_sequence_id: Option<u64>,
    pub status: Option<ReplyStatus>,
    /// Event name when this message is server-initiated
    pub name: Option<String>,
    pub payload: Value,
    pub error: Option<Value>,
}

/// A classified inbound message
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// Answer to an outbound request, matched by sequence id
    Reply {
        sequence_id: u64,
        status: ReplyStatus,
        payload: Value,
        error: Option<Value>,
    },
    /// Server-initiated event, dispatched by name
    Event { name: String, payload: Value },
    /// Neither a reply reference nor an event name was present.
    /// An unhandled-event condition, not an error.
    Unclassified(WireMessage),
}

impl WireMessage {
    /// Classify this message exactly once. A positive `replySequenceId` wins
    /// over an event name; a missing status on a reply defaults to OK.
    pub fn classify(mut self) -> InboundMessage {
        match self.reply_sequence_id {
            Some(seq) if seq > 0 => InboundMessage::Reply {
                sequence_id: seq,
                status: self.status.unwrap_or(ReplyStatus::Ok),
                payload: self.payload,
                error: self.error,
            },
            _ => match self.name.take() {
                Some(name) => InboundMessage::Event {
                    name,
                    payload: self.payload,
                },
                None => InboundMessage::Unclassified(self),
            },
        }
    }
}

/// Notification delivered by the transport adapter
#[derive(Debug)]
pub enum TransportEvent {
    /// The underlying connection is open
    Opened,
    /// One inbound wire message, decoded JSON
    Message(Value),
    /// The underlying connection closed; no further messages will arrive
    Closed { reason: Option<String> },
}

/// Outbound half of the transport adapter.
///
/// Implementations must be cheap to call from multiple tasks; the session
/// layer serializes nothing around `send`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand one request frame to the wire
    async fn send(&self, frame: RequestFrame) -> ClientResult<()>;

    /// Close the underlying connection
    async fn close(&self) -> ClientResult<()>;
}
