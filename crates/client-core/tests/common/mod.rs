//! Shared harness for integration tests: a scripted transport, a recording
//! phone collaborator and helpers that drive the session handshake.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use trunkline_client_core::{
    actions, AnswerOptions, Call, ClientBuilder, ClientError, ClientManager, ClientResult,
    Credential, DeviceConfig, PhoneDevice, PhoneEvent, PlaceCallRequest, RequestFrame, Transport,
    TransportEvent,
};

/// Transport that records every outbound frame for inspection
pub struct MockTransport {
    frames: Mutex<Vec<RequestFrame>>,
    total_sent: AtomicUsize,
    closed: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(Vec::new()),
            total_sent: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Remove and return the first not-yet-consumed frame with this action
    pub fn take_frame(&self, action: &str) -> Option<RequestFrame> {
        let mut frames = self.frames.lock().unwrap();
        let pos = frames.iter().position(|frame| frame.action == action)?;
        Some(frames.remove(pos))
    }

    /// Frames handed to the wire since construction, consumed or not
    pub fn total_sent(&self) -> usize {
        self.total_sent.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, frame: RequestFrame) -> ClientResult<()> {
        self.total_sent.fetch_add(1, Ordering::SeqCst);
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }

    async fn close(&self) -> ClientResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Phone collaborator that records every interaction
#[derive(Default)]
pub struct MockPhone {
    pub registered: Mutex<Vec<DeviceConfig>>,
    pub answered: Mutex<Vec<(String, AnswerOptions)>>,
    pub placed: Mutex<Vec<PlaceCallRequest>>,
    fail_register: AtomicBool,
}

impl MockPhone {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_registration(&self) {
        self.fail_register.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PhoneDevice for MockPhone {
    async fn register_device(&self, config: &DeviceConfig) -> ClientResult<()> {
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(ClientError::phone_error("registrar unreachable"));
        }
        self.registered.lock().unwrap().push(config.clone());
        Ok(())
    }

    async fn place_call(&self, request: PlaceCallRequest) -> ClientResult<()> {
        self.placed.lock().unwrap().push(request);
        Ok(())
    }

    async fn answer(&self, call_id: &str, options: AnswerOptions) -> ClientResult<()> {
        self.answered
            .lock()
            .unwrap()
            .push((call_id.to_owned(), options));
        Ok(())
    }
}

/// One client wired to mock collaborators, with injection handles
pub struct TestSession {
    pub client: Arc<ClientManager>,
    pub transport: Arc<MockTransport>,
    pub phone: Arc<MockPhone>,
    pub inbound: mpsc::Sender<TransportEvent>,
    pub phone_events: mpsc::Sender<PhoneEvent>,
}

impl TestSession {
    pub fn build(configure: impl FnOnce(ClientBuilder) -> ClientBuilder) -> Self {
        let transport = MockTransport::new();
        let phone = MockPhone::new();
        let (inbound, transport_rx) = mpsc::channel(64);
        let (phone_events, phone_rx) = mpsc::channel(64);
        let builder = ClientBuilder::new()
            .credential(Credential::new("agent1001", "s3cret"))
            .transport(transport.clone(), transport_rx)
            .phone(phone.clone(), phone_rx);
        let client = configure(builder).build().expect("builder must assemble");
        Self {
            client,
            transport,
            phone,
            inbound,
            phone_events,
        }
    }

    pub async fn send(&self, message: Value) {
        self.inbound
            .send(TransportEvent::Message(message))
            .await
            .expect("event loop alive");
    }

    pub async fn send_event(&self, name: &str, payload: Value) {
        self.send(json!({"name": name, "payload": payload})).await;
    }

    pub async fn send_call_event(&self, id: &str, kind: &str, timestamp: i64, data: Value) {
        self.send_event(
            "call",
            json!({"id": id, "event": kind, "timestamp": timestamp, "data": data}),
        )
        .await;
    }

    pub async fn reply_ok(&self, sequence_id: u64, payload: Value) {
        self.send(json!({
            "replySequenceId": sequence_id,
            "status": "OK",
            "payload": payload,
        }))
        .await;
    }

    pub async fn reply_fail(&self, sequence_id: u64, error: Value) {
        self.send(json!({
            "replySequenceId": sequence_id,
            "status": "FAIL",
            "error": error,
        }))
        .await;
    }

    /// Round-trip barrier: everything injected before this call has been
    /// routed once it returns, because inbound messages process in order.
    pub async fn drain(&self) {
        let client = self.client.clone();
        let task = tokio::spawn(async move { client.issue_request("test.sync", json!({})).await });
        let frame = self.expect_frame("test.sync").await;
        self.reply_ok(frame.sequence_id, json!({})).await;
        task.await.expect("sync task").expect("sync reply");
    }

    /// Wait until a frame with this action is sent, consuming it
    pub async fn expect_frame(&self, action: &str) -> RequestFrame {
        for _ in 0..200 {
            if let Some(frame) = self.transport.take_frame(action) {
                return frame;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no {action} frame was sent within 1s");
    }

    pub fn spawn_connect(&self) -> tokio::task::JoinHandle<ClientResult<()>> {
        let client = self.client.clone();
        tokio::spawn(async move { client.connect().await })
    }

    /// Drive the full handshake: open, greeting, successful authentication
    pub async fn connect(&self) -> ClientResult<()> {
        let task = self.spawn_connect();
        self.inbound
            .send(TransportEvent::Opened)
            .await
            .expect("event loop alive");
        self.send_event("greeting", greeting_payload()).await;
        let auth = self.expect_frame(actions::AUTH).await;
        self.reply_ok(auth.sequence_id, json!({"authenticated": true}))
            .await;
        task.await.expect("connect task")
    }

    pub async fn wait_for_call(&self, call_id: &str) -> Arc<Call> {
        for _ in 0..200 {
            if let Some(call) = self.client.get_call(call_id) {
                return call;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("call {call_id} never appeared in the registry");
    }
}

pub fn greeting_payload() -> Value {
    json!({
        "socketInstanceId": "sock-1",
        "serverBuild": "3.14.0",
        "serverNode": "node-a",
        "serverTime": 1700000000,
        "session": {"agent": "agent1001"},
    })
}

/// Poll a condition until it holds or a second passes
pub async fn wait_until(description: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {description}");
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("trunkline_client_core=debug")
        .with_test_writer()
        .try_init();
}
