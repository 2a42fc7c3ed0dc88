//! Phone collaborator seam
//!
//! The SIP/WebRTC stack lives outside this crate. The session layer calls into
//! it through [`PhoneDevice`] (device registration, placing and answering the
//! media leg) and reacts to its [`PhoneEvent`]s (media sessions appearing,
//! stream handles changing). No media logic is owned here: stream handles are
//! opaque and only ever assigned from phone events.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;

/// Opaque handle to a media stream owned by the phone stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStreamHandle {
    /// Identifier meaningful to the phone stack only
    pub id: String,
}

impl MediaStreamHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Configuration for registering the device with its registrar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Registrar the device registers against
    pub server: String,
    pub username: String,
    pub password: Option<String>,
    /// Registration lifetime in seconds
    pub expires: u32,
}

impl DeviceConfig {
    pub fn new(server: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            username: username.into(),
            password: None,
            expires: 3600,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_expires(mut self, expires: u32) -> Self {
        self.expires = expires;
        self
    }
}

/// Request to originate a call through the phone stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceCallRequest {
    /// Number or name to dial
    pub destination: String,
    /// Application id scoping the new call, when known up front
    pub application_id: Option<String>,
    pub caller_id: Option<String>,
}

impl PlaceCallRequest {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            application_id: None,
            caller_id: None,
        }
    }
}

/// Options passed to the phone stack when answering the media leg
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnswerOptions {
    /// True when the answer was triggered by auto-answer policy rather
    /// than a user action
    pub auto_answered: bool,
}

/// Events emitted by the phone collaborator
#[derive(Debug, Clone)]
pub enum PhoneEvent {
    /// A media session appeared before the phone stack learned the call id.
    /// Correlated against calls through the media-session index.
    NewMediaSession {
        media_session_id: String,
        stream: MediaStreamHandle,
    },
    /// The local (captured) stream for a call changed; `None` clears it
    LocalStreamsChanged {
        call_id: String,
        stream: Option<MediaStreamHandle>,
    },
    /// The remote stream for a call changed; `None` clears it
    RemoteStreamsChanged {
        call_id: String,
        stream: Option<MediaStreamHandle>,
    },
}

/// Control surface of the external phone stack
#[async_trait]
pub trait PhoneDevice: Send + Sync {
    /// Register the device with its registrar
    async fn register_device(&self, config: &DeviceConfig) -> ClientResult<()>;

    /// Originate an outbound call
    async fn place_call(&self, request: PlaceCallRequest) -> ClientResult<()>;

    /// Accept the media leg of an inbound call
    async fn answer(&self, call_id: &str, options: AnswerOptions) -> ClientResult<()>;
}
