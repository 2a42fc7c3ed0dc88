//! Request correlation
//!
//! Every outbound request gets the connection's next sequence id and one
//! pending completion slot. When a reply arrives its `replySequenceId`
//! selects the slot; the slot settles exactly once and is removed in the
//! same step. A reply with no slot (late, unknown, or already timed out) is
//! dropped with a log line and no other observable effect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{ClientError, ClientResult};
use crate::transport::ReplyStatus;

type PendingSlot = oneshot::Sender<ClientResult<Value>>;

pub(crate) struct RequestCorrelator {
    /// Next sequence id to hand out; ids start at 1 and are never reused
    /// for the life of the connection.
    next_sequence: AtomicU64,
    pending: Mutex<HashMap<u64, PendingSlot>>,
}

impl RequestCorrelator {
    pub(crate) fn new() -> Self {
        Self {
            next_sequence: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate the next sequence id and its completion slot. The caller
    /// sends the frame and awaits the receiver.
    pub(crate) fn register(&self) -> (u64, oneshot::Receiver<ClientResult<Value>>) {
        let sequence_id = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        let previous = self.pending.lock().unwrap().insert(sequence_id, tx);
        debug_assert!(previous.is_none(), "sequence id reused");
        (sequence_id, rx)
    }

    /// Drop a registration whose frame never made it to the wire, or whose
    /// caller stopped waiting (request expiry). A reply arriving later is
    /// then stale.
    pub(crate) fn abandon(&self, sequence_id: u64) {
        self.pending.lock().unwrap().remove(&sequence_id);
    }

    /// Settle the pending request matching a reply. Stale replies are
    /// dropped here, logged only.
    pub(crate) fn complete(
        &self,
        sequence_id: u64,
        status: ReplyStatus,
        payload: Value,
        error: Option<Value>,
    ) {
        let slot = self.pending.lock().unwrap().remove(&sequence_id);
        let Some(slot) = slot else {
            tracing::debug!(sequence_id, "dropping stale reply with no pending request");
            return;
        };
        let outcome = match status {
            ReplyStatus::Ok => Ok(payload),
            ReplyStatus::Fail => Err(ClientError::request_rejected(
                error.unwrap_or(Value::Null),
            )),
        };
        if slot.send(outcome).is_err() {
            tracing::debug!(sequence_id, "reply arrived after caller stopped waiting");
        }
    }

    /// Reject every outstanding request, used at session teardown so no
    /// future is left permanently unsettled.
    pub(crate) fn fail_all(&self, error: ClientError) {
        let drained: Vec<(u64, PendingSlot)> =
            self.pending.lock().unwrap().drain().collect();
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "failing all pending requests");
        }
        for (_, slot) in drained {
            let _ = slot.send(Err(error.clone()));
        }
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}
