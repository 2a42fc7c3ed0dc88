//! Call entity and lifecycle state machine
//!
//! A [`Call`] tracks one telephony leg from the creation event to hangup.
//! Identity (call id, application id, direction, creation time) is fixed at
//! construction; everything else lives behind an interior lock and is mutated
//! in place by lifecycle events, so every holder of the `Arc<Call>` observes
//! the same entity. Eviction from the registry never invalidates the object:
//! a UI holding a call across hangup still reads the terminal fields.
//!
//! The permission predicates (`can_answer`, `can_hold`, ...) are pure
//! functions of the current attributes, recomputed on every read and never
//! cached.
//!
//! # State machine
//!
//! ```text
//! ringing ──► active ──► bridge ──► hold
//!    │          │  ▲        │        │
//!    │          │  └────────┼────────┘ (unhold)
//!    │          │           │
//!    └──────────┴───────────┴──► hangup (terminal)
//! ```
//!
//! `execute`, `dtmf`, `voice` and `silence` are annotations on the active
//! state: they mutate the application log, digit log and voice-activity flag
//! without changing the observed state.

use std::fmt;
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::phone::MediaStreamHandle;

/// Unique identifier for a call, assigned by the server
pub type CallId = String;

/// Hangup causes this layer selects locally when the caller does not
/// supply one
pub mod causes {
    pub const NORMAL_CLEARING: &str = "NORMAL_CLEARING";
    pub const USER_BUSY: &str = "USER_BUSY";
    pub const ORIGINATOR_CANCEL: &str = "ORIGINATOR_CANCEL";
}

/// Externally observed lifecycle state of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    /// Offered but not yet answered
    Ringing,
    /// Answered, media flowing
    Active,
    /// Parked on hold
    Hold,
    /// Joined to a counterpart leg
    Bridge,
    /// Terminal
    Hangup,
}

impl CallState {
    /// Check if the call has reached its terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Hangup)
    }
}

/// Direction of a call, from this client's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Inbound,
    Outbound,
}

/// One party's address as reported by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub number: Option<String>,
    pub name: Option<String>,
}

/// Queue discipline the call was delivered through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    Inbound,
    Outbound,
    /// Dialer-fed, agent connected after the fact
    Offline,
    /// Dialer-fed, agent confirms before dialing
    Preview,
    #[serde(other)]
    Other,
}

/// Queue membership descriptor attached to queue-delivered calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<QueueKind>,
}

/// Lifecycle action carried by a call event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallEventKind {
    Ringing,
    Active,
    Bridge,
    Hold,
    Unhold,
    Execute,
    Dtmf,
    Voice,
    Silence,
    Hangup,
}

impl CallEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallEventKind::Ringing => "ringing",
            CallEventKind::Active => "active",
            CallEventKind::Bridge => "bridge",
            CallEventKind::Hold => "hold",
            CallEventKind::Unhold => "unhold",
            CallEventKind::Execute => "execute",
            CallEventKind::Dtmf => "dtmf",
            CallEventKind::Voice => "voice",
            CallEventKind::Silence => "silence",
            CallEventKind::Hangup => "hangup",
        }
    }
}

impl fmt::Display for CallEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload fields a call event may carry. All optional; each event kind
/// reads only the fields it defines.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallEventData {
    pub direction: Option<CallDirection>,
    pub destination: Option<String>,
    pub from: Option<EndpointInfo>,
    pub to: Option<EndpointInfo>,
    pub queue: Option<QueueInfo>,
    pub parent_id: Option<CallId>,
    pub application_id: Option<String>,
    pub media_session_id: Option<String>,
    /// Counterpart leg, on bridge events
    pub bridged_id: Option<CallId>,
    /// Application name, on execute events
    pub application: Option<String>,
    /// Single digit, on dtmf events
    pub digit: Option<char>,
    /// Hangup cause, on hangup events
    pub cause: Option<String>,
    /// Protocol status code, on hangup events
    pub sip: Option<u16>,
}

/// One lifecycle event for a call, as decoded from the wire
#[derive(Debug, Clone, Deserialize)]
pub struct CallEvent {
    pub id: CallId,
    #[serde(rename = "event")]
    pub kind: CallEventKind,
    /// Server epoch seconds for the transition
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub data: CallEventData,
}

/// Mutable attribute block, guarded by the call's interior lock
#[derive(Debug, Clone)]
struct CallAttributes {
    state: CallState,
    from: EndpointInfo,
    to: EndpointInfo,
    destination: Option<String>,
    queue: Option<QueueInfo>,
    parent_id: Option<CallId>,
    bridged_id: Option<CallId>,
    answered_at: i64,
    bridged_at: i64,
    hangup_at: i64,
    muted: bool,
    voice_active: bool,
    digits: String,
    applications: Vec<String>,
    hangup_cause: Option<String>,
    hangup_status_code: Option<u16>,
    local_stream: Option<MediaStreamHandle>,
    remote_stream: Option<MediaStreamHandle>,
}

/// Point-in-time copy of a call's full attribute set, for UI consumption
#[derive(Debug, Clone, Serialize)]
pub struct CallSnapshot {
    pub id: CallId,
    pub application_id: String,
    pub direction: CallDirection,
    pub state: CallState,
    pub from: EndpointInfo,
    pub to: EndpointInfo,
    pub destination: Option<String>,
    pub queue: Option<QueueInfo>,
    pub parent_id: Option<CallId>,
    pub bridged_id: Option<CallId>,
    pub media_session_id: Option<String>,
    pub created_at: i64,
    pub answered_at: i64,
    pub bridged_at: i64,
    pub hangup_at: i64,
    pub muted: bool,
    pub voice_active: bool,
    pub digits: String,
    pub applications: Vec<String>,
    pub hangup_cause: Option<String>,
    pub hangup_status_code: Option<u16>,
    pub local_stream: Option<MediaStreamHandle>,
    pub remote_stream: Option<MediaStreamHandle>,
}

/// One telephony leg as tracked by this client
#[derive(Debug)]
pub struct Call {
    id: CallId,
    application_id: String,
    direction: CallDirection,
    created_at: i64,
    media_session_id: Option<String>,
    attrs: RwLock<CallAttributes>,
}

impl Call {
    /// Construct from the creation (ringing) event's full payload
    pub(crate) fn from_event(event: &CallEvent) -> Self {
        let data = &event.data;
        Self {
            id: event.id.clone(),
            application_id: data.application_id.clone().unwrap_or_default(),
            direction: data.direction.unwrap_or(CallDirection::Inbound),
            created_at: event.timestamp,
            media_session_id: data.media_session_id.clone(),
            attrs: RwLock::new(CallAttributes {
                state: CallState::Ringing,
                from: data.from.clone().unwrap_or_default(),
                to: data.to.clone().unwrap_or_default(),
                destination: data.destination.clone(),
                queue: data.queue.clone(),
                parent_id: data.parent_id.clone(),
                bridged_id: None,
                answered_at: 0,
                bridged_at: 0,
                hangup_at: 0,
                muted: false,
                voice_active: false,
                digits: String::new(),
                applications: Vec::new(),
                hangup_cause: None,
                hangup_status_code: None,
                local_stream: None,
                remote_stream: None,
            }),
        }
    }

    // ===== IDENTITY =====

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Application id scoping control requests for this call
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn direction(&self) -> CallDirection {
        self.direction
    }

    /// Epoch seconds of the creation event
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Media-session correlation id assigned at creation, if any
    pub fn media_session_id(&self) -> Option<&str> {
        self.media_session_id.as_deref()
    }

    // ===== ATTRIBUTE READS =====

    pub fn state(&self) -> CallState {
        self.attrs.read().unwrap().state
    }

    pub fn answered_at(&self) -> i64 {
        self.attrs.read().unwrap().answered_at
    }

    pub fn bridged_at(&self) -> i64 {
        self.attrs.read().unwrap().bridged_at
    }

    pub fn hangup_at(&self) -> i64 {
        self.attrs.read().unwrap().hangup_at
    }

    pub fn parent_id(&self) -> Option<CallId> {
        self.attrs.read().unwrap().parent_id.clone()
    }

    pub fn bridged_id(&self) -> Option<CallId> {
        self.attrs.read().unwrap().bridged_id.clone()
    }

    pub fn queue(&self) -> Option<QueueInfo> {
        self.attrs.read().unwrap().queue.clone()
    }

    pub fn is_muted(&self) -> bool {
        self.attrs.read().unwrap().muted
    }

    pub fn voice_active(&self) -> bool {
        self.attrs.read().unwrap().voice_active
    }

    /// DTMF digits received so far, in arrival order
    pub fn digits(&self) -> String {
        self.attrs.read().unwrap().digits.clone()
    }

    pub fn hangup_cause(&self) -> Option<String> {
        self.attrs.read().unwrap().hangup_cause.clone()
    }

    pub fn remote_stream(&self) -> Option<MediaStreamHandle> {
        self.attrs.read().unwrap().remote_stream.clone()
    }

    pub fn local_stream(&self) -> Option<MediaStreamHandle> {
        self.attrs.read().unwrap().local_stream.clone()
    }

    /// Full attribute copy under one lock acquisition
    pub fn snapshot(&self) -> CallSnapshot {
        let attrs = self.attrs.read().unwrap();
        CallSnapshot {
            id: self.id.clone(),
            application_id: self.application_id.clone(),
            direction: self.direction,
            state: attrs.state,
            from: attrs.from.clone(),
            to: attrs.to.clone(),
            destination: attrs.destination.clone(),
            queue: attrs.queue.clone(),
            parent_id: attrs.parent_id.clone(),
            bridged_id: attrs.bridged_id.clone(),
            media_session_id: self.media_session_id.clone(),
            created_at: self.created_at,
            answered_at: attrs.answered_at,
            bridged_at: attrs.bridged_at,
            hangup_at: attrs.hangup_at,
            muted: attrs.muted,
            voice_active: attrs.voice_active,
            digits: attrs.digits.clone(),
            applications: attrs.applications.clone(),
            hangup_cause: attrs.hangup_cause.clone(),
            hangup_status_code: attrs.hangup_status_code,
            local_stream: attrs.local_stream.clone(),
            remote_stream: attrs.remote_stream.clone(),
        }
    }

    // ===== DERIVED PREDICATES =====

    /// The call has not yet hung up
    pub fn is_live(&self) -> bool {
        self.hangup_at() == 0
    }

    pub fn can_hangup(&self) -> bool {
        self.is_live()
    }

    pub fn can_hold(&self) -> bool {
        let attrs = self.attrs.read().unwrap();
        attrs.hangup_at == 0 && matches!(attrs.state, CallState::Active | CallState::Bridge)
    }

    pub fn can_unhold(&self) -> bool {
        let attrs = self.attrs.read().unwrap();
        attrs.hangup_at == 0 && attrs.state == CallState::Hold
    }

    pub fn can_answer(&self) -> bool {
        let attrs = self.attrs.read().unwrap();
        attrs.hangup_at == 0 && attrs.answered_at == 0
    }

    pub fn can_send_dtmf(&self) -> bool {
        let attrs = self.attrs.read().unwrap();
        attrs.answered_at != 0 && attrs.hangup_at == 0
    }

    /// Queue half of the auto-answer predicate: the queue descriptor is
    /// present and its type is offline or preview. The UI-foreground
    /// conjunct is evaluated by the embedding application, not here.
    pub fn queue_wants_auto_answer(&self) -> bool {
        let attrs = self.attrs.read().unwrap();
        matches!(
            attrs.queue.as_ref().and_then(|q| q.kind),
            Some(QueueKind::Offline) | Some(QueueKind::Preview)
        )
    }

    /// Call duration in whole seconds, independent of answer: time since
    /// creation while live, creation-to-hangup once terminal.
    pub fn duration(&self) -> i64 {
        let hangup_at = self.hangup_at();
        let end = if hangup_at != 0 {
            hangup_at
        } else {
            Utc::now().timestamp()
        };
        end - self.created_at
    }

    // ===== TRANSITIONS =====

    /// Whether `kind` is a legal event for a call currently in `state`
    fn permits(state: CallState, kind: CallEventKind) -> bool {
        use CallEventKind as K;
        match state {
            CallState::Ringing => matches!(kind, K::Active | K::Hangup),
            CallState::Active => matches!(
                kind,
                K::Active
                    | K::Bridge
                    | K::Hold
                    | K::Execute
                    | K::Dtmf
                    | K::Voice
                    | K::Silence
                    | K::Hangup
            ),
            CallState::Hold => matches!(kind, K::Unhold | K::Hangup),
            CallState::Bridge => matches!(kind, K::Hold | K::Hangup),
            CallState::Hangup => false,
        }
    }

    /// Apply one lifecycle event. Returns false (mutating nothing) when the
    /// event is not legal from the current state; a duplicate ringing event
    /// for a live call lands here.
    pub(crate) fn apply(&self, event: &CallEvent) -> bool {
        let mut attrs = self.attrs.write().unwrap();
        if !Self::permits(attrs.state, event.kind) {
            tracing::warn!(
                call_id = %self.id,
                state = ?attrs.state,
                event = %event.kind,
                "ignoring call event not permitted from current state"
            );
            return false;
        }

        let ts = event.timestamp;
        match event.kind {
            CallEventKind::Ringing => unreachable!("no state permits ringing"),
            CallEventKind::Active => {
                attrs.state = CallState::Active;
                if attrs.answered_at == 0 {
                    attrs.answered_at = ts;
                }
                // An inbound leg is considered bridged to its parent the
                // moment it is answered.
                if self.direction == CallDirection::Inbound {
                    if attrs.bridged_at == 0 {
                        attrs.bridged_at = ts;
                    }
                    if attrs.bridged_id.is_none() {
                        attrs.bridged_id = attrs.parent_id.clone();
                    }
                }
            }
            CallEventKind::Bridge => {
                attrs.state = CallState::Bridge;
                if attrs.bridged_at == 0 {
                    attrs.bridged_at = ts;
                }
                if attrs.bridged_id.is_none() {
                    attrs.bridged_id = event.data.bridged_id.clone();
                }
                if let Some(resolved) = &event.data.to {
                    attrs.to = resolved.clone();
                }
            }
            CallEventKind::Hold => {
                attrs.state = CallState::Hold;
            }
            CallEventKind::Unhold => {
                attrs.state = CallState::Active;
            }
            CallEventKind::Execute => {
                if let Some(app) = &event.data.application {
                    attrs.applications.push(app.clone());
                }
            }
            CallEventKind::Dtmf => {
                if let Some(digit) = event.data.digit {
                    attrs.digits.push(digit);
                }
            }
            CallEventKind::Voice => {
                attrs.voice_active = true;
            }
            CallEventKind::Silence => {
                attrs.voice_active = false;
            }
            CallEventKind::Hangup => {
                attrs.state = CallState::Hangup;
                if attrs.hangup_at == 0 {
                    attrs.hangup_at = ts;
                }
                attrs.hangup_cause = event.data.cause.clone();
                attrs.hangup_status_code = event.data.sip;
                attrs.voice_active = false;
                attrs.remote_stream = None;
            }
        }
        true
    }

    // ===== COLLABORATOR-OWNED ATTRIBUTES =====

    pub(crate) fn set_muted(&self, muted: bool) {
        self.attrs.write().unwrap().muted = muted;
    }

    pub(crate) fn set_local_stream(&self, stream: Option<MediaStreamHandle>) {
        self.attrs.write().unwrap().local_stream = stream;
    }

    pub(crate) fn set_remote_stream(&self, stream: Option<MediaStreamHandle>) {
        self.attrs.write().unwrap().remote_stream = stream;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: &str, kind: &str, timestamp: i64, data: serde_json::Value) -> CallEvent {
        serde_json::from_value(json!({
            "id": id,
            "event": kind,
            "timestamp": timestamp,
            "data": data,
        }))
        .unwrap()
    }

    fn ringing_inbound(id: &str, ts: i64) -> CallEvent {
        event(
            id,
            "ringing",
            ts,
            json!({"direction": "inbound", "destination": "100", "from": {"number": "555"}}),
        )
    }

    #[test]
    fn creation_sets_identity_and_initial_state() {
        let call = Call::from_event(&ringing_inbound("c1", 1000));
        assert_eq!(call.id(), "c1");
        assert_eq!(call.direction(), CallDirection::Inbound);
        assert_eq!(call.state(), CallState::Ringing);
        assert_eq!(call.created_at(), 1000);
        assert_eq!(call.answered_at(), 0);
        assert!(call.can_answer());
        assert!(!call.can_hold());
        assert!(!call.can_send_dtmf());
    }

    #[test]
    fn answer_stamps_once_and_bridges_inbound() {
        let call = Call::from_event(&ringing_inbound("c1", 1000));
        assert!(call.apply(&event("c1", "active", 1005, json!({}))));
        assert_eq!(call.state(), CallState::Active);
        assert_eq!(call.answered_at(), 1005);
        // Inbound with no parent: bridged time set, no bridged id.
        assert_eq!(call.bridged_at(), 1005);
        assert_eq!(call.bridged_id(), None);

        // Repeated active events never restamp.
        assert!(call.apply(&event("c1", "active", 1007, json!({}))));
        assert_eq!(call.answered_at(), 1005);
        assert_eq!(call.bridged_at(), 1005);
    }

    #[test]
    fn answer_copies_parent_into_bridged_id() {
        let ev = event(
            "c2",
            "ringing",
            50,
            json!({"direction": "inbound", "parentId": "p9"}),
        );
        let call = Call::from_event(&ev);
        call.apply(&event("c2", "active", 60, json!({})));
        assert_eq!(call.bridged_id().as_deref(), Some("p9"));
    }

    #[test]
    fn outbound_answer_does_not_infer_bridge() {
        let ev = event("c3", "ringing", 10, json!({"direction": "outbound"}));
        let call = Call::from_event(&ev);
        call.apply(&event("c3", "active", 20, json!({})));
        assert_eq!(call.bridged_at(), 0);
    }

    #[test]
    fn bridge_records_counterpart_and_destination() {
        let call = Call::from_event(&event("c4", "ringing", 10, json!({"direction": "outbound"})));
        call.apply(&event("c4", "active", 20, json!({})));
        call.apply(&event(
            "c4",
            "bridge",
            25,
            json!({"bridgedId": "c9", "to": {"number": "200", "name": "Bob"}}),
        ));
        assert_eq!(call.state(), CallState::Bridge);
        assert_eq!(call.bridged_at(), 25);
        assert_eq!(call.bridged_id().as_deref(), Some("c9"));
        let snap = call.snapshot();
        assert_eq!(snap.to.number.as_deref(), Some("200"));
        assert!(call.can_hold());
    }

    #[test]
    fn hold_unhold_toggle_and_gate_predicates() {
        let call = Call::from_event(&ringing_inbound("c5", 0));
        call.apply(&event("c5", "active", 1, json!({})));
        assert!(call.can_hold());
        assert!(!call.can_unhold());

        call.apply(&event("c5", "hold", 2, json!({})));
        assert_eq!(call.state(), CallState::Hold);
        assert!(!call.can_hold());
        assert!(call.can_unhold());

        call.apply(&event("c5", "unhold", 3, json!({})));
        assert_eq!(call.state(), CallState::Active);
    }

    #[test]
    fn annotations_do_not_change_state() {
        let call = Call::from_event(&ringing_inbound("c6", 0));
        call.apply(&event("c6", "active", 1, json!({})));

        call.apply(&event("c6", "execute", 2, json!({"application": "playback"})));
        call.apply(&event("c6", "dtmf", 3, json!({"digit": "4"})));
        call.apply(&event("c6", "dtmf", 4, json!({"digit": "#"})));
        call.apply(&event("c6", "voice", 5, json!({})));
        assert_eq!(call.state(), CallState::Active);
        assert_eq!(call.digits(), "4#");
        assert_eq!(call.snapshot().applications, vec!["playback".to_string()]);
        assert!(call.voice_active());

        call.apply(&event("c6", "silence", 6, json!({})));
        assert!(!call.voice_active());
    }

    #[test]
    fn hangup_is_terminal_and_clears_remote_media() {
        let call = Call::from_event(&ringing_inbound("c7", 1000));
        call.apply(&event("c7", "active", 1005, json!({})));
        call.apply(&event("c7", "voice", 1006, json!({})));
        call.set_remote_stream(Some(MediaStreamHandle::new("ms-1")));

        call.apply(&event(
            "c7",
            "hangup",
            1010,
            json!({"cause": "NORMAL_CLEARING", "sip": 200}),
        ));
        assert_eq!(call.state(), CallState::Hangup);
        assert_eq!(call.hangup_at(), 1010);
        assert_eq!(call.hangup_cause().as_deref(), Some("NORMAL_CLEARING"));
        assert_eq!(call.snapshot().hangup_status_code, Some(200));
        assert!(!call.voice_active());
        assert_eq!(call.remote_stream(), None);
        assert_eq!(call.duration(), 10);

        assert!(!call.can_hangup());
        assert!(!call.can_hold());
        assert!(!call.can_answer());
        assert!(!call.can_send_dtmf());

        // Nothing is legal after hangup.
        assert!(!call.apply(&event("c7", "active", 1011, json!({}))));
        assert_eq!(call.answered_at(), 1005);
    }

    #[test]
    fn illegal_transitions_mutate_nothing() {
        let call = Call::from_event(&ringing_inbound("c8", 0));
        // dtmf before answer is not permitted from ringing
        assert!(!call.apply(&event("c8", "dtmf", 1, json!({"digit": "1"}))));
        assert_eq!(call.digits(), "");
        // hold before answer
        assert!(!call.apply(&event("c8", "hold", 2, json!({}))));
        assert_eq!(call.state(), CallState::Ringing);
    }

    #[test]
    fn dtmf_allowed_only_after_answer() {
        let call = Call::from_event(&ringing_inbound("c9", 0));
        assert!(!call.can_send_dtmf());
        call.apply(&event("c9", "active", 1, json!({})));
        assert!(call.can_send_dtmf());
    }

    #[test]
    fn auto_answer_predicate_tracks_queue_kind() {
        let preview = Call::from_event(&event(
            "q1",
            "ringing",
            0,
            json!({"queue": {"id": "42", "name": "sales", "type": "preview"}}),
        ));
        assert!(preview.queue_wants_auto_answer());

        let inbound = Call::from_event(&event(
            "q2",
            "ringing",
            0,
            json!({"queue": {"id": "43", "type": "inbound"}}),
        ));
        assert!(!inbound.queue_wants_auto_answer());

        let no_queue = Call::from_event(&ringing_inbound("q3", 0));
        assert!(!no_queue.queue_wants_auto_answer());
    }

    #[test]
    fn unknown_queue_kind_decodes_as_other() {
        let call = Call::from_event(&event(
            "q4",
            "ringing",
            0,
            json!({"queue": {"type": "progressive"}}),
        ));
        assert_eq!(call.queue().and_then(|q| q.kind), Some(QueueKind::Other));
        assert!(!call.queue_wants_auto_answer());
    }

    #[test]
    fn duration_of_live_call_counts_from_creation() {
        let now = Utc::now().timestamp();
        let call = Call::from_event(&ringing_inbound("d1", now - 30));
        let measured = call.duration();
        assert!((29..=32).contains(&measured), "duration was {}", measured);
    }
}
