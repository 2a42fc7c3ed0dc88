//! Session manager: inbound routing, bootstrap and the public surface
//!
//! [`ClientManager`] owns the request correlator, the event dispatcher and
//! the call registry, and runs the single event-loop task that drains the
//! transport's inbound channel. One inbound message is processed to
//! completion before the next; there is no interleaving and therefore no
//! locking discipline beyond what the shared maps need for cross-task reads.
//!
//! The session becomes usable after the bootstrap: greeting received,
//! connection metadata captured, authentication accepted. `connect()` gates
//! on exactly that.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use crate::call::{Call, CallEvent};
use crate::client::config::ClientConfig;
use crate::client::correlator::RequestCorrelator;
use crate::client::registry::CallRegistry;
use crate::error::{ClientError, ClientResult};
use crate::events::{channels, EventDispatcher, SessionEvent, SubscriptionId};
use crate::phone::{PhoneDevice, PhoneEvent};
use crate::transport::{
    actions, event_names, InboundMessage, RequestFrame, Transport, TransportEvent, WireMessage,
};

/// Server and session identity captured from the greeting. Scoped to the
/// connection: populated when the greeting arrives, cleared at teardown.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionInfo {
    pub socket_instance_id: Option<String>,
    pub server_build: Option<String>,
    pub server_node: Option<String>,
    /// Server epoch seconds at greeting time
    pub server_time: Option<i64>,
    /// Opaque session descriptor, passed through to the application
    pub session: Option<Value>,
    /// Local wall-clock time the greeting was processed
    #[serde(skip)]
    pub established_at: Option<DateTime<Utc>>,
}

/// Aggregate snapshot of the session's current activity
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub is_running: bool,
    pub is_ready: bool,
    /// Calls created since connect
    pub total_calls: u64,
    /// Calls currently in the registry
    pub live_calls: usize,
    /// Requests awaiting a reply
    pub pending_requests: usize,
    /// Live event subscriptions across all channels
    pub subscriptions: usize,
}

/// The session client. Construct through [`crate::ClientBuilder`], then
/// [`connect`](Self::connect).
pub struct ClientManager {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    pub(crate) phone: Option<Arc<dyn PhoneDevice>>,
    correlator: RequestCorrelator,
    dispatcher: Arc<EventDispatcher>,
    pub(crate) registry: CallRegistry,
    connection: RwLock<Option<ConnectionInfo>>,
    running: AtomicBool,
    ready: AtomicBool,
    connect_waiter: Mutex<Option<oneshot::Sender<ClientResult<()>>>>,
    transport_events: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
    phone_events: Mutex<Option<mpsc::Receiver<PhoneEvent>>>,
}

impl std::fmt::Debug for ClientManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientManager")
            .field("running", &self.running.load(Ordering::Relaxed))
            .field("ready", &self.ready.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ClientManager {
    pub(crate) fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        transport_events: mpsc::Receiver<TransportEvent>,
        phone: Option<Arc<dyn PhoneDevice>>,
        phone_events: Option<mpsc::Receiver<PhoneEvent>>,
    ) -> Arc<Self> {
        let dispatcher = Arc::new(EventDispatcher::new());
        Arc::new(Self {
            config,
            transport,
            phone,
            correlator: RequestCorrelator::new(),
            registry: CallRegistry::new(dispatcher.clone()),
            dispatcher,
            connection: RwLock::new(None),
            running: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            connect_waiter: Mutex::new(None),
            transport_events: Mutex::new(Some(transport_events)),
            phone_events: Mutex::new(phone_events),
        })
    }

    // ===== LIFECYCLE =====

    /// Start the session and wait for it to become usable: the event loop
    /// is spawned, the server greeting captured and authentication run.
    /// Fails when the transport closes or the server rejects the credential
    /// before readiness.
    pub async fn connect(self: &Arc<Self>) -> ClientResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ClientError::internal_error(
                "connect called while session is already running",
            ));
        }
        let events = match self.transport_events.lock().unwrap().take() {
            Some(events) => events,
            None => {
                self.running.store(false, Ordering::SeqCst);
                return Err(ClientError::internal_error(
                    "transport event stream already consumed; build a new client to reconnect",
                ));
            }
        };

        let (tx, rx) = oneshot::channel();
        *self.connect_waiter.lock().unwrap() = Some(tx);

        if let Some(phone_events) = self.phone_events.lock().unwrap().take() {
            tokio::spawn(Self::phone_loop(self.clone(), phone_events));
        }
        tokio::spawn(Self::event_loop(self.clone(), events));

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(ClientError::transport_failed(
                "connection closed during handshake",
            )),
        }
    }

    /// Close the transport and tear the session down. Pending request
    /// futures fail, the registry empties, connection metadata clears.
    /// Idempotent.
    pub async fn disconnect(&self) -> ClientResult<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(err) = self.transport.close().await {
            tracing::warn!(error = %err, "transport close reported failure");
        }
        self.teardown(Some("disconnect requested".into()));
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// True once the bootstrap has completed on the current connection
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Connection metadata captured from the greeting, if the session has
    /// one. Session-scoped: `None` before the greeting and after teardown.
    pub fn connection_info(&self) -> Option<ConnectionInfo> {
        self.connection.read().unwrap().clone()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            is_running: self.is_running(),
            is_ready: self.is_ready(),
            total_calls: self.registry.total_created(),
            live_calls: self.registry.live_count(),
            pending_requests: self.correlator.pending_count(),
            subscriptions: self.dispatcher.subscription_count(),
        }
    }

    // ===== EVENT SUBSCRIPTIONS =====

    /// Subscribe a handler to a named event channel. Valid before the
    /// session is ready; duplicate subscriptions are retained and each
    /// invoked.
    pub fn subscribe<F>(&self, channel: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(channel, Arc::new(handler))
    }

    /// Remove one subscription; removing an unknown id is a no-op
    pub fn unsubscribe(&self, channel: &str, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(channel, id)
    }

    // ===== REQUESTS =====

    /// Issue one request and await its reply. The sequence id is allocated
    /// here; the future settles exactly once, when the matching reply
    /// arrives, the configured expiry elapses, or the session tears down.
    pub async fn issue_request(&self, action: &str, payload: Value) -> ClientResult<Value> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(ClientError::NotConnected);
        }
        let (sequence_id, reply) = self.correlator.register();
        let frame = RequestFrame {
            sequence_id,
            action: action.to_owned(),
            payload,
        };
        tracing::debug!(sequence_id, action, "issuing request");
        if let Err(err) = self.transport.send(frame).await {
            self.correlator.abandon(sequence_id);
            return Err(err);
        }

        match self.config.request_timeout {
            None => reply.await.unwrap_or_else(|_| {
                Err(ClientError::transport_failed("connection closed before reply"))
            }),
            Some(expiry) => match tokio::time::timeout(expiry, reply).await {
                Ok(settled) => settled.unwrap_or_else(|_| {
                    Err(ClientError::transport_failed("connection closed before reply"))
                }),
                Err(_) => {
                    self.correlator.abandon(sequence_id);
                    tracing::warn!(sequence_id, action, "request expired without reply");
                    Err(ClientError::RequestTimeout {
                        duration_ms: expiry.as_millis() as u64,
                    })
                }
            },
        }
    }

    /// Authenticate with the configured credential. Run automatically by
    /// the bootstrap; exposed for servers that demand re-authentication.
    pub async fn authenticate(&self) -> ClientResult<()> {
        let credential = &self.config.credential;
        let payload = json!({
            "username": credential.username,
            "token": credential.token,
            "userAgent": self.config.user_agent,
        });
        match self.issue_request(actions::AUTH, payload).await {
            Ok(_) => Ok(()),
            Err(ClientError::RequestRejected { reason, .. }) => {
                Err(ClientError::authentication_failed(reason))
            }
            Err(other) => Err(other),
        }
    }

    // ===== CALL LOOKUPS =====

    pub fn get_call(&self, call_id: &str) -> Option<Arc<Call>> {
        self.registry.get(call_id)
    }

    pub fn list_calls(&self) -> Vec<Arc<Call>> {
        self.registry.list()
    }

    /// Exact lookup by the media-session id recorded at call creation
    pub fn find_call_by_media_session(&self, media_session_id: &str) -> Option<Arc<Call>> {
        self.registry.find_by_media_session(media_session_id)
    }

    // ===== INBOUND PATH =====

    async fn event_loop(manager: Arc<Self>, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Opened => {
                    tracing::debug!("transport open, awaiting greeting");
                }
                TransportEvent::Message(raw) => manager.route(raw),
                TransportEvent::Closed { reason } => {
                    manager.teardown(reason);
                    return;
                }
            }
        }
        manager.teardown(Some("transport event stream ended".into()));
    }

    /// Classify and dispatch one inbound message. Total: every message
    /// lands in exactly one arm, and nothing is dropped without a log line.
    fn route(self: &Arc<Self>, raw: Value) {
        if !self.running.load(Ordering::SeqCst) {
            tracing::debug!("dropping inbound message after shutdown");
            return;
        }
        let message: WireMessage = match serde_json::from_value(raw) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed inbound message");
                return;
            }
        };
        match message.classify() {
            InboundMessage::Reply {
                sequence_id,
                status,
                payload,
                error,
            } => self.correlator.complete(sequence_id, status, payload, error),
            InboundMessage::Event { name, payload } => match name.as_str() {
                event_names::GREETING => self.handle_greeting(payload),
                event_names::CALL => match serde_json::from_value::<CallEvent>(payload) {
                    Ok(event) => self.registry.apply_call_event(event),
                    Err(err) => {
                        tracing::warn!(error = %err, "discarding malformed call event");
                    }
                },
                _ => {
                    let delivered = self.dispatcher.publish(
                        &name,
                        &SessionEvent::Message {
                            name: name.clone(),
                            payload,
                        },
                    );
                    if delivered == 0 {
                        tracing::warn!(event = %name, "unhandled event, no subscriber");
                    }
                }
            },
            InboundMessage::Unclassified(msg) => {
                tracing::warn!(?msg, "inbound message is neither reply nor event");
            }
        }
    }

    // ===== BOOTSTRAP =====

    fn handle_greeting(self: &Arc<Self>, payload: Value) {
        let mut info: ConnectionInfo = match serde_json::from_value(payload) {
            Ok(info) => info,
            Err(err) => {
                tracing::warn!(error = %err, "greeting metadata malformed, continuing without it");
                ConnectionInfo::default()
            }
        };
        info.established_at = Some(Utc::now());
        tracing::info!(
            node = info.server_node.as_deref().unwrap_or("unknown"),
            build = info.server_build.as_deref().unwrap_or("unknown"),
            "greeting received"
        );
        *self.connection.write().unwrap() = Some(info);

        // Authentication is a request/reply exchange; it must not run on
        // the event-loop task that delivers the reply.
        let manager = self.clone();
        tokio::spawn(async move {
            manager.bootstrap().await;
        });
    }

    async fn bootstrap(self: Arc<Self>) {
        match self.authenticate().await {
            Ok(()) => {
                self.ready.store(true, Ordering::SeqCst);
                if let Some(waiter) = self.connect_waiter.lock().unwrap().take() {
                    let _ = waiter.send(Ok(()));
                }
                self.dispatcher.publish(
                    channels::CONNECTION,
                    &SessionEvent::ConnectionStateChanged {
                        ready: true,
                        reason: None,
                    },
                );
                tracing::info!("session ready");
                self.register_phone().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "session bootstrap failed");
                if let Some(waiter) = self.connect_waiter.lock().unwrap().take() {
                    let _ = waiter.send(Err(err.clone()));
                }
                let _ = self.transport.close().await;
                self.teardown(Some(format!("bootstrap failed: {err}")));
            }
        }
    }

    /// Optional device registration after authentication. Failure here is
    /// reported, not fatal to the session.
    async fn register_phone(&self) {
        if !self.config.register_phone {
            return;
        }
        let Some(phone) = &self.phone else {
            tracing::warn!("device registration configured without a phone collaborator");
            return;
        };
        let Some(device) = &self.config.device else {
            tracing::warn!("device registration configured without device parameters");
            return;
        };
        match phone.register_device(device).await {
            Ok(()) => tracing::info!(server = %device.server, "phone device registered"),
            Err(err) => {
                tracing::warn!(error = %err, "phone registration failed, session continues");
                self.dispatcher.publish(
                    channels::ERROR,
                    &SessionEvent::Error {
                        error: err,
                        call_id: None,
                    },
                );
            }
        }
    }

    // ===== PHONE EVENTS =====

    async fn phone_loop(manager: Arc<Self>, mut events: mpsc::Receiver<PhoneEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                PhoneEvent::NewMediaSession {
                    media_session_id,
                    stream,
                } => match manager.registry.find_by_media_session(&media_session_id) {
                    Some(call) => {
                        tracing::debug!(
                            call_id = %call.id(),
                            media_session_id = %media_session_id,
                            "media session correlated to call"
                        );
                        call.set_remote_stream(Some(stream));
                    }
                    None => {
                        tracing::debug!(
                            media_session_id = %media_session_id,
                            "media session does not match a live call"
                        );
                    }
                },
                PhoneEvent::LocalStreamsChanged { call_id, stream } => {
                    manager.registry.attach_local_stream(&call_id, stream);
                }
                PhoneEvent::RemoteStreamsChanged { call_id, stream } => {
                    manager.registry.attach_remote_stream(&call_id, stream);
                }
            }
        }
    }

    // ===== TEARDOWN =====

    /// Tear the session down once: fail every pending request, drop the
    /// registry, clear connection metadata and settle an in-flight connect.
    fn teardown(&self, reason: Option<String>) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.ready.store(false, Ordering::SeqCst);
        let reason_text = reason
            .clone()
            .unwrap_or_else(|| "connection closed".to_string());

        self.correlator
            .fail_all(ClientError::transport_failed(reason_text.clone()));
        *self.connection.write().unwrap() = None;
        let dropped = self.registry.clear();
        if dropped > 0 {
            tracing::debug!(dropped, "dropped live calls at teardown");
        }
        if let Some(waiter) = self.connect_waiter.lock().unwrap().take() {
            let _ = waiter.send(Err(ClientError::transport_failed(reason_text.clone())));
        }
        self.dispatcher.publish(
            channels::CONNECTION,
            &SessionEvent::ConnectionStateChanged {
                ready: false,
                reason,
            },
        );
        tracing::info!(reason = %reason_text, "session closed");
    }
}
