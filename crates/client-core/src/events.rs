//! Event dispatch for session consumers
//!
//! A registry of named channels with ordered subscriber lists. Consumers
//! subscribe per channel and receive every payload published there,
//! synchronously and in registration order. There is no buffering: publishing
//! on a channel nobody subscribed to is silent, and subscriptions made before
//! the connection is ready register normally.
//!
//! Subscribing the same handler twice yields two live registrations and two
//! invocations per publish; each registration is addressed by its own
//! [`SubscriptionId`], so unsubscribing removes exactly one and removing an
//! unknown id is a no-op.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use uuid::Uuid;

use crate::call::{Call, CallEventKind, CallId};
use crate::error::ClientError;

/// Well-known channel names published by this layer
pub mod channels {
    /// Call lifecycle transitions, including creation and the terminal one
    pub const CALL: &str = "call";
    /// Session readiness changes
    pub const CONNECTION: &str = "connection";
    /// Non-fatal operational failures (e.g. phone registration)
    pub const ERROR: &str = "error";
}

/// Payload fanned out to channel subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A call transitioned; the entity is shared, not a copy
    CallUpdate {
        action: CallEventKind,
        call: Arc<Call>,
    },
    /// A server event with no dedicated handling, keyed by its name
    Message { name: String, payload: Value },
    /// The session became ready or stopped being ready
    ConnectionStateChanged {
        ready: bool,
        reason: Option<String>,
    },
    /// A non-fatal error worth surfacing to the application
    Error {
        error: ClientError,
        call_id: Option<CallId>,
    },
}

/// Subscriber callback. Invoked synchronously on the session's event task;
/// keep handlers short and move real work elsewhere.
pub type EventHandler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Handle identifying one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Channel-keyed fan-out registry
pub struct EventDispatcher {
    channels: RwLock<HashMap<String, Vec<(SubscriptionId, EventHandler)>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Add a handler to a channel. Duplicate handlers are retained and each
    /// invoked; every call returns a distinct id.
    pub fn subscribe(&self, channel: &str, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.channels
            .write()
            .unwrap()
            .entry(channel.to_owned())
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove one subscription. Returns false when the id is not registered
    /// on that channel (a no-op, not an error).
    pub fn unsubscribe(&self, channel: &str, id: SubscriptionId) -> bool {
        let mut channels = self.channels.write().unwrap();
        let Some(handlers) = channels.get_mut(channel) else {
            return false;
        };
        let Some(pos) = handlers.iter().position(|(sid, _)| *sid == id) else {
            return false;
        };
        handlers.remove(pos);
        if handlers.is_empty() {
            channels.remove(channel);
        }
        true
    }

    /// Invoke every current subscriber of `channel`, in registration order,
    /// and return how many were invoked. The subscriber list is snapshotted
    /// before the first invocation, so handlers may subscribe or unsubscribe
    /// freely; a panicking handler propagates and handlers after it in the
    /// order are not invoked.
    pub fn publish(&self, channel: &str, event: &SessionEvent) -> usize {
        let handlers: Vec<EventHandler> = {
            let channels = self.channels.read().unwrap();
            match channels.get(channel) {
                Some(list) => list.iter().map(|(_, h)| h.clone()).collect(),
                None => Vec::new(),
            }
        };
        for handler in &handlers {
            (handler.as_ref())(event);
        }
        handlers.len()
    }

    /// Total live subscriptions across all channels
    pub fn subscription_count(&self) -> usize {
        self.channels
            .read()
            .unwrap()
            .values()
            .map(Vec::len)
            .sum()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
