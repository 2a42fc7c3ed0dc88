//! Client-core: client-side telephony session layer
//!
//! This crate turns a single bidirectional message transport into a
//! request/response facility with multiplexed outstanding calls and a typed
//! event layer that tracks telephony call entities through their lifecycle.
//!
//! ## Layer separation
//! ```text
//! application/UI -> client-core -> {transport adapter, phone stack}
//! ```
//!
//! Client-core focuses on:
//! - Sequence-numbered request correlation over one connection
//! - Routing inbound messages to reply futures or named event channels
//! - The per-call state machine and its capability predicates
//! - Session bootstrap (greeting, authentication, device registration)
//!
//! Socket handling, framing, reconnection and all media logic live in the
//! external collaborators behind the [`Transport`] and [`PhoneDevice`]
//! traits. Nothing here survives the connection: no persistence, no retry,
//! no reconnect.

pub mod call;
pub mod client;
pub mod error;
pub mod events;
pub mod phone;
pub mod transport;

// Public API exports
pub use call::{
    causes, Call, CallDirection, CallEvent, CallEventKind, CallId, CallSnapshot, CallState,
    EndpointInfo, QueueInfo, QueueKind,
};
pub use client::{
    Client, ClientBuilder, ClientConfig, ClientManager, ConnectionInfo, Credential, SessionStats,
};
pub use error::{ClientError, ClientResult};
pub use events::{channels, EventDispatcher, EventHandler, SessionEvent, SubscriptionId};
pub use phone::{
    AnswerOptions, DeviceConfig, MediaStreamHandle, PhoneDevice, PhoneEvent, PlaceCallRequest,
};
pub use transport::{
    actions, event_names, InboundMessage, ReplyStatus, RequestFrame, Transport, TransportEvent,
    WireMessage,
};

/// Client-core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
