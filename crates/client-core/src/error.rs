//! Error types for the client session layer
//!
//! Everything in this crate reports failures through [`ClientError`]. Errors
//! are scoped to a single connection: the worst outcome anywhere in the layer
//! is a rejected request future or a dropped call entry, never a process
//! failure.
//!
//! Two inbound conditions are deliberately *not* errors and never reach a
//! future: a reply whose sequence id has no pending entry (stale reply) and an
//! inbound event with no subscriber. Both are logged and dropped.

use thiserror::Error;

use crate::call::CallState;

/// Result type alias for client-core operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Error types for client session operations
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// Transport open/close/send failures
    #[error("Transport failed: {reason}")]
    TransportFailed { reason: String },

    /// Server answered a request with FAIL status. Carries the
    /// server-supplied error payload verbatim in `detail`.
    #[error("Request rejected by server: {reason}")]
    RequestRejected {
        reason: String,
        detail: serde_json::Value,
    },

    /// A control operation was refused locally before any request was sent
    #[error("Invalid call state for call {call_id}: current state is {current_state:?}")]
    InvalidCallState {
        call_id: String,
        current_state: CallState,
    },

    #[error("Call not found: {call_id}")]
    CallNotFound { call_id: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// Operation requires a running connection
    #[error("Not connected to server")]
    NotConnected,

    /// A configured request expiry elapsed before the reply arrived
    #[error("Request timed out after {duration_ms}ms")]
    RequestTimeout { duration_ms: u64 },

    /// A frame could not be encoded, or an inbound message was malformed
    #[error("Invalid message: {reason}")]
    InvalidMessage { reason: String },

    /// Failure reported by the external phone collaborator
    #[error("Phone device error: {reason}")]
    PhoneError { reason: String },

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl ClientError {
    /// Create a transport failure error
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        Self::TransportFailed {
            reason: reason.into(),
        }
    }

    /// Create a request-rejected error from a server error payload
    pub fn request_rejected(detail: serde_json::Value) -> Self {
        let reason = detail
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| detail.to_string());
        Self::RequestRejected { reason, detail }
    }

    /// Create an authentication failed error
    pub fn authentication_failed(reason: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid message error
    pub fn invalid_message(reason: impl Into<String>) -> Self {
        Self::InvalidMessage {
            reason: reason.into(),
        }
    }

    /// Create a phone collaborator error
    pub fn phone_error(reason: impl Into<String>) -> Self {
        Self::PhoneError {
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Group errors for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ClientError::TransportFailed { .. } | ClientError::NotConnected => "transport",
            ClientError::RequestRejected { .. } | ClientError::RequestTimeout { .. } => "request",
            ClientError::InvalidCallState { .. } | ClientError::CallNotFound { .. } => "call",
            ClientError::AuthenticationFailed { .. } => "auth",
            ClientError::InvalidMessage { .. } => "protocol",
            ClientError::PhoneError { .. } => "phone",
            ClientError::InvalidConfiguration { .. } => "config",
            ClientError::InternalError { .. } => "internal",
        }
    }

    /// Whether the operation may be retried by the caller on a fresh
    /// connection. Local policy violations and configuration problems are
    /// deterministic and will fail again.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::TransportFailed { .. }
            | ClientError::NotConnected
            | ClientError::RequestTimeout { .. }
            | ClientError::PhoneError { .. } => true,
            ClientError::RequestRejected { .. }
            | ClientError::InvalidCallState { .. }
            | ClientError::CallNotFound { .. }
            | ClientError::AuthenticationFailed { .. }
            | ClientError::InvalidMessage { .. }
            | ClientError::InvalidConfiguration { .. }
            | ClientError::InternalError { .. } => false,
        }
    }
}
