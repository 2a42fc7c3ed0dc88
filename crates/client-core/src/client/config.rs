//! Configuration for the session client

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::phone::DeviceConfig;

/// Credential presented during session authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub token: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

/// Configuration for the session client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Credential used by the bootstrap authentication step
    pub credential: Credential,
    /// User agent string reported to the server
    pub user_agent: String,
    /// Optional expiry applied to every issued request. `None` (the
    /// default) leaves an unanswered request pending indefinitely.
    pub request_timeout: Option<Duration>,
    /// Register the phone device after authentication succeeds
    pub register_phone: bool,
    /// Device registration parameters, required when `register_phone` is set
    pub device: Option<DeviceConfig>,
}

impl ClientConfig {
    /// Create a new client configuration with defaults
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            user_agent: concat!("trunkline-client-core/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: None,
            register_phone: false,
            device: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_device_registration(mut self, device: DeviceConfig) -> Self {
        self.register_phone = true;
        self.device = Some(device);
        self
    }
}
