//! Call registry
//!
//! In-memory index from call id to the live [`Call`] entity. The registry is
//! the single writer of call lifecycle state: every inbound call event lands
//! here, creates or mutates the entity, and is fanned out on the "call"
//! channel. Eviction on hangup removes only the index entry; holders of the
//! `Arc<Call>` keep a valid, terminal-state entity.
//!
//! A second exact index maps media-session ids to call ids, populated at call
//! creation, so a media session announced by the phone stack before it knows
//! the call id resolves in O(1).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::call::{Call, CallEvent, CallEventKind, CallId, CallState};
use crate::events::{channels, EventDispatcher, SessionEvent};
use crate::phone::MediaStreamHandle;

pub(crate) struct CallRegistry {
    calls: DashMap<CallId, Arc<Call>>,
    media_index: DashMap<String, CallId>,
    dispatcher: Arc<EventDispatcher>,
    /// Calls created since the session started (never decremented)
    total_created: AtomicU64,
}

impl CallRegistry {
    pub(crate) fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            calls: DashMap::new(),
            media_index: DashMap::new(),
            dispatcher,
            total_created: AtomicU64::new(0),
        }
    }

    /// Apply one lifecycle event: create on the ringing signal, mutate the
    /// existing entity otherwise, evict on the terminal transition, then
    /// notify "call" subscribers with the action and the (shared) entity.
    pub(crate) fn apply_call_event(&self, event: CallEvent) {
        let existing = self.calls.get(&event.id).map(|entry| entry.value().clone());
        let call = match existing {
            None => {
                if event.kind != CallEventKind::Ringing {
                    tracing::warn!(
                        call_id = %event.id,
                        event = %event.kind,
                        "dropping lifecycle event for unknown call"
                    );
                    return;
                }
                let call = Arc::new(Call::from_event(&event));
                if let Some(media_id) = call.media_session_id() {
                    self.media_index
                        .insert(media_id.to_owned(), event.id.clone());
                }
                self.calls.insert(event.id.clone(), call.clone());
                self.total_created.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    call_id = %event.id,
                    direction = ?call.direction(),
                    "call created"
                );
                call
            }
            Some(call) => {
                if !call.apply(&event) {
                    // Rejected transition (duplicate ringing included):
                    // nothing changed, nothing to fan out.
                    return;
                }
                if call.state() == CallState::Hangup {
                    self.evict(&event.id, &call);
                }
                call
            }
        };

        self.dispatcher.publish(
            channels::CALL,
            &SessionEvent::CallUpdate {
                action: event.kind,
                call,
            },
        );
    }

    fn evict(&self, id: &str, call: &Arc<Call>) {
        self.calls.remove(id);
        if let Some(media_id) = call.media_session_id() {
            self.media_index.remove(media_id);
        }
        tracing::info!(
            call_id = %id,
            cause = call.hangup_cause().as_deref().unwrap_or("unknown"),
            duration_secs = call.duration(),
            "call ended"
        );
    }

    pub(crate) fn get(&self, id: &str) -> Option<Arc<Call>> {
        self.calls.get(id).map(|entry| entry.value().clone())
    }

    pub(crate) fn list(&self) -> Vec<Arc<Call>> {
        self.calls
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Exact lookup by the media-session id recorded at call creation
    pub(crate) fn find_by_media_session(&self, media_session_id: &str) -> Option<Arc<Call>> {
        let call_id = self
            .media_index
            .get(media_session_id)
            .map(|entry| entry.value().clone())?;
        self.get(&call_id)
    }

    pub(crate) fn attach_local_stream(&self, call_id: &str, stream: Option<MediaStreamHandle>) {
        match self.get(call_id) {
            Some(call) => call.set_local_stream(stream),
            None => tracing::debug!(call_id, "local stream change for unknown call"),
        }
    }

    pub(crate) fn attach_remote_stream(&self, call_id: &str, stream: Option<MediaStreamHandle>) {
        match self.get(call_id) {
            Some(call) => call.set_remote_stream(stream),
            None => tracing::debug!(call_id, "remote stream change for unknown call"),
        }
    }

    pub(crate) fn live_count(&self) -> usize {
        self.calls.len()
    }

    pub(crate) fn total_created(&self) -> u64 {
        self.total_created.load(Ordering::Relaxed)
    }

    /// Drop every entry without fan-out; entities stay valid for holders.
    /// Used at session teardown, where calls do not outlive the connection.
    pub(crate) fn clear(&self) -> usize {
        let dropped = self.calls.len();
        self.calls.clear();
        self.media_index.clear();
        dropped
    }
}
