//! Builder for assembling a [`ClientManager`] from its collaborators
//!
//! The transport and (optionally) the phone stack are constructed by the
//! embedding application and handed in here together with their event
//! receivers; the builder wires them to a manager without starting anything.
//! The session comes alive on [`ClientManager::connect`].

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::config::{ClientConfig, Credential};
use crate::client::manager::ClientManager;
use crate::error::{ClientError, ClientResult};
use crate::phone::{DeviceConfig, PhoneDevice, PhoneEvent};
use crate::transport::{Transport, TransportEvent};

/// Builder for [`ClientManager`]
///
/// # Examples
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use trunkline_client_core::{ClientBuilder, Credential};
/// # async fn example(
/// #     transport: Arc<dyn trunkline_client_core::Transport>,
/// #     events: tokio::sync::mpsc::Receiver<trunkline_client_core::TransportEvent>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let client = ClientBuilder::new()
///     .credential(Credential::new("agent1001", "s3cret"))
///     .transport(transport, events)
///     .build()?;
/// client.connect().await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    credential: Option<Credential>,
    user_agent: Option<String>,
    request_timeout: Option<std::time::Duration>,
    device: Option<DeviceConfig>,
    transport: Option<Arc<dyn Transport>>,
    transport_events: Option<mpsc::Receiver<TransportEvent>>,
    phone: Option<Arc<dyn PhoneDevice>>,
    phone_events: Option<mpsc::Receiver<PhoneEvent>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            credential: None,
            user_agent: None,
            request_timeout: None,
            device: None,
            transport: None,
            transport_events: None,
            phone: None,
            phone_events: None,
        }
    }

    /// Credential for bootstrap authentication (required)
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Expiry applied to every issued request; unset leaves unanswered
    /// requests pending indefinitely
    pub fn request_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Register the phone device with these parameters once authenticated
    pub fn register_device(mut self, device: DeviceConfig) -> Self {
        self.device = Some(device);
        self
    }

    /// Transport adapter plus the channel its inbound notifications arrive on
    /// (required)
    pub fn transport(
        mut self,
        transport: Arc<dyn Transport>,
        events: mpsc::Receiver<TransportEvent>,
    ) -> Self {
        self.transport = Some(transport);
        self.transport_events = Some(events);
        self
    }

    /// Phone collaborator plus the channel its events arrive on
    pub fn phone(
        mut self,
        phone: Arc<dyn PhoneDevice>,
        events: mpsc::Receiver<PhoneEvent>,
    ) -> Self {
        self.phone = Some(phone);
        self.phone_events = Some(events);
        self
    }

    /// Assemble the manager. Fails when a required collaborator is missing
    /// or device registration was requested without a phone collaborator.
    pub fn build(self) -> ClientResult<Arc<ClientManager>> {
        let credential = self.credential.ok_or_else(|| ClientError::InvalidConfiguration {
            field: "credential".into(),
            reason: "authentication credential is required".into(),
        })?;
        let transport = self.transport.ok_or_else(|| ClientError::InvalidConfiguration {
            field: "transport".into(),
            reason: "a transport adapter is required".into(),
        })?;
        let transport_events =
            self.transport_events
                .ok_or_else(|| ClientError::InvalidConfiguration {
                    field: "transport".into(),
                    reason: "a transport event receiver is required".into(),
                })?;
        if self.device.is_some() && self.phone.is_none() {
            return Err(ClientError::InvalidConfiguration {
                field: "device".into(),
                reason: "device registration requires a phone collaborator".into(),
            });
        }

        let mut config = ClientConfig::new(credential);
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }
        config.request_timeout = self.request_timeout;
        if let Some(device) = self.device {
            config = config.with_device_registration(device);
        }

        Ok(ClientManager::new(
            config,
            transport,
            transport_events,
            self.phone,
            self.phone_events,
        ))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
