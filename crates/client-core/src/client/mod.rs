//! Session client implementation
//!
//! The client module is organized into several sub-modules:
//!
//! - **`manager`** - The [`ClientManager`] that owns the session: inbound
//!   routing, bootstrap, public surface
//! - **`correlator`** - Sequence-numbered request/reply matching
//! - **`registry`** - The live-call index and lifecycle application
//! - **`calls`** - Call control operations (answer, hangup, hold, ...)
//! - **`config`** / **`builder`** - Configuration and assembly
//!
//! # Basic flow
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use trunkline_client_core::{ClientBuilder, Credential, SessionEvent, channels};
//! # async fn example(
//! #     transport: Arc<dyn trunkline_client_core::Transport>,
//! #     events: tokio::sync::mpsc::Receiver<trunkline_client_core::TransportEvent>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::new()
//!     .credential(Credential::new("agent1001", "s3cret"))
//!     .transport(transport, events)
//!     .build()?;
//!
//! // Watch call lifecycle before connecting; early subscriptions are fine.
//! client.subscribe(channels::CALL, |event| {
//!     if let SessionEvent::CallUpdate { action, call } = event {
//!         println!("call {} -> {}", call.id(), action);
//!     }
//! });
//!
//! client.connect().await?;
//!
//! for call in client.list_calls() {
//!     if call.can_answer() {
//!         client.answer_call(call.id()).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod calls;
pub mod config;
pub mod correlator;
pub mod manager;
pub mod registry;


pub use builder::ClientBuilder;
pub use config::{ClientConfig, Credential};
pub use manager::{ClientManager, ConnectionInfo, SessionStats};

// Type alias for convenient use
pub type Client = ClientManager;
